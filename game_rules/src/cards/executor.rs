//! Applies writer-produced function calls to the blackboard.
//!
//! A batch is parsed and checked in full before anything is applied, so
//! a bad call leaves the state untouched. Unknown function names are
//! skipped, which keeps older engines working with newer content.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::FunctionCall;
use crate::condition::Condition;
use crate::config::GameConfig;
use crate::error::RulesError;
use crate::events::{
    ConditionEvent, Event, EventInfo, EventPhase, PhaseEvent, ProgressEvent, TimedEvent,
};
use crate::mechanics::DAYS_PER_SEASON;
use crate::world_state::{GameDate, GlobalBlackboard};

/// What a batch of calls changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResult {
    /// Net change per stat, after clamping.
    pub stat_changes: BTreeMap<String, i32>,
    pub tags_added: Vec<String>,
    pub tags_removed: Vec<String>,
    pub events_started: Vec<String>,
    pub events_removed: Vec<String>,
    /// `(event_id, phase_name)` for every completed phase.
    pub phases_completed: Vec<(String, String)>,
    pub days_advanced: u32,
    /// Names of calls that were not recognised.
    pub ignored_calls: Vec<String>,
}

impl ExecuteResult {
    fn merge(&mut self, other: ExecuteResult) {
        for (stat, delta) in other.stat_changes {
            *self.stat_changes.entry(stat).or_default() += delta;
        }
        self.tags_added.extend(other.tags_added);
        self.tags_removed.extend(other.tags_removed);
        self.events_started.extend(other.events_started);
        self.events_removed.extend(other.events_removed);
        self.phases_completed.extend(other.phases_completed);
        self.days_advanced += other.days_advanced;
        self.ignored_calls.extend(other.ignored_calls);
    }

    pub fn is_empty(&self) -> bool {
        *self == ExecuteResult::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventKind {
    Phase,
    Progress,
    Timed,
    Condition,
}

impl EventKind {
    fn of(event: &Event) -> Self {
        match event {
            Event::Phase(_) => EventKind::Phase,
            Event::Progress(_) => EventKind::Progress,
            Event::Timed(_) => EventKind::Timed,
            Event::Condition(_) => EventKind::Condition,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            EventKind::Phase => "phase",
            EventKind::Progress => "progress",
            EventKind::Timed => "timed",
            EventKind::Condition => "condition",
        }
    }
}

#[derive(Debug, Clone)]
enum Action {
    UpdateStat(Vec<(String, i64)>),
    AddTag(String),
    RemoveTag(String),
    AddEvent(Box<Event>),
    RemoveEvent(String),
    AdvanceEvent(String),
    UpdateEventProgress { event_id: String, delta: i64 },
    ChangeEventDeadline { event_id: String, deadline: GameDate },
    SetNpcEnabled { npc_id: String, enabled: bool },
    AdvanceTime(u32),
    Ignored(String),
}

/// Executes function calls against one blackboard.
pub struct ActionExecutor<'a> {
    board: &'a mut GlobalBlackboard,
    config: &'a GameConfig,
    depth: usize,
}

impl<'a> ActionExecutor<'a> {
    pub fn new(board: &'a mut GlobalBlackboard, config: &'a GameConfig) -> Self {
        Self {
            board,
            config,
            depth: 0,
        }
    }

    pub fn execute(&mut self, calls: &[FunctionCall]) -> Result<ExecuteResult, RulesError> {
        let actions = self.parse_all(calls)?;
        let mut result = ExecuteResult::default();
        for action in actions {
            self.apply(action, &mut result);
        }
        Ok(result)
    }

    fn parse_all(&self, calls: &[FunctionCall]) -> Result<Vec<Action>, RulesError> {
        // Events visible to later calls in the batch.
        let mut events: BTreeMap<String, EventKind> = self
            .board
            .events()
            .iter()
            .map(|(id, e)| (id.clone(), EventKind::of(e)))
            .collect();

        let mut actions = Vec::with_capacity(calls.len());
        for call in calls {
            let action = self.parse(call, &events)?;
            match &action {
                Action::AddEvent(event) => {
                    events.insert(event.id().to_string(), EventKind::of(event));
                }
                Action::RemoveEvent(id) => {
                    events.remove(id);
                }
                _ => {}
            }
            actions.push(action);
        }
        Ok(actions)
    }

    fn parse(
        &self,
        call: &FunctionCall,
        events: &BTreeMap<String, EventKind>,
    ) -> Result<Action, RulesError> {
        let name = call.name.as_str();
        let action = match name {
            "update_stat" => Action::UpdateStat(self.parse_stat_deltas(call)?),
            "add_tag" => {
                let tag = non_empty_str(call, "tag_id")?;
                if self.config.strict_tags && self.board.tag_def(&tag).is_none() {
                    return Err(RulesError::UnknownTag(tag));
                }
                Action::AddTag(tag)
            }
            "remove_tag" => Action::RemoveTag(non_empty_str(call, "tag_id")?),
            "add_event" => Action::AddEvent(Box::new(parse_event(call)?)),
            "remove_event" => Action::RemoveEvent(known_event(call, events, None)?),
            "advance_event" => {
                Action::AdvanceEvent(known_event(call, events, Some(EventKind::Phase))?)
            }
            "update_event_progress" => Action::UpdateEventProgress {
                event_id: known_event(call, events, Some(EventKind::Progress))?,
                delta: int_param(call, "delta")?,
            },
            "change_event_deadline" => Action::ChangeEventDeadline {
                event_id: known_event(call, events, Some(EventKind::Timed))?,
                deadline: date_param(call, "deadline")?,
            },
            "enable_npc" | "disable_npc" => Action::SetNpcEnabled {
                npc_id: non_empty_str(call, "npc_id")?,
                enabled: name == "enable_npc",
            },
            "advance_time" => {
                let days = int_param(call, "days")?;
                if !(1..=i64::from(DAYS_PER_SEASON)).contains(&days) {
                    return Err(RulesError::invalid(
                        name,
                        "days",
                        format!("must be between 1 and {}", DAYS_PER_SEASON),
                    ));
                }
                Action::AdvanceTime(days as u32)
            }
            _ => Action::Ignored(name.to_string()),
        };
        Ok(action)
    }

    /// Accepts `{stat_id, delta}` (or `change`) and the map form
    /// `{stat: delta, ...}`.
    fn parse_stat_deltas(&self, call: &FunctionCall) -> Result<Vec<(String, i64)>, RulesError> {
        let pairs: Vec<(String, i64)> = if call.params.contains_key("stat_id") {
            let stat = non_empty_str(call, "stat_id")?;
            let delta = if call.params.contains_key("delta") {
                int_param(call, "delta")?
            } else if call.params.contains_key("change") {
                int_param(call, "change")?
            } else {
                return Err(RulesError::missing(&call.name, "delta"));
            };
            vec![(stat, delta)]
        } else {
            if call.params.is_empty() {
                return Err(RulesError::missing(&call.name, "stat_id"));
            }
            call.params
                .iter()
                .map(|(stat, value)| {
                    as_int(value)
                        .map(|delta| (stat.clone(), delta))
                        .ok_or_else(|| RulesError::invalid(&call.name, "delta", format!("'{}' is not a number", value)))
                })
                .collect::<Result<_, _>>()?
        };

        let max = self.config.max_stat_delta;
        for (stat, delta) in &pairs {
            if self.board.stat(stat).is_none() {
                return Err(RulesError::UnknownStat(stat.clone()));
            }
            if delta.unsigned_abs() > u64::from(max.unsigned_abs()) {
                return Err(RulesError::DeltaOutOfRange {
                    stat: stat.clone(),
                    delta: *delta,
                    max,
                });
            }
        }
        Ok(pairs)
    }

    fn apply(&mut self, action: Action, result: &mut ExecuteResult) {
        match action {
            Action::UpdateStat(pairs) => {
                for (stat, delta) in pairs {
                    // Existence was checked while parsing.
                    if let Ok(applied) = self.board.apply_stat_delta(&stat, delta) {
                        *result.stat_changes.entry(stat).or_default() += applied;
                    }
                }
            }
            Action::AddTag(tag) => {
                if self.board.add_tag(tag.clone()) {
                    result.tags_added.push(tag);
                }
            }
            Action::RemoveTag(tag) => {
                if self.board.remove_tag(&tag) {
                    result.tags_removed.push(tag);
                }
            }
            Action::AddEvent(event) => {
                let id = event.id().to_string();
                if self.board.insert_event(*event).is_some() {
                    tracing::debug!(event_id = %id, "replaced existing event");
                }
                result.events_started.push(id);
            }
            Action::RemoveEvent(id) => {
                if self.board.remove_event(&id).is_some() {
                    result.events_removed.push(id);
                }
            }
            Action::AdvanceEvent(id) => self.advance_event(&id, result),
            Action::UpdateEventProgress { event_id, delta } => {
                if let Some(Event::Progress(event)) = self.board.event_mut(&event_id) {
                    event.update_progress(delta);
                }
            }
            Action::ChangeEventDeadline { event_id, deadline } => {
                if let Some(Event::Timed(event)) = self.board.event_mut(&event_id) {
                    event.deadline = deadline;
                }
            }
            Action::SetNpcEnabled { npc_id, enabled } => {
                if !self.board.set_npc_enabled(&npc_id, enabled) {
                    tracing::debug!(npc_id = %npc_id, "ignoring unknown npc");
                }
            }
            Action::AdvanceTime(days) => {
                for _ in 0..days {
                    self.board.advance_day();
                }
                result.days_advanced += days;
            }
            Action::Ignored(name) => {
                tracing::debug!(call = %name, "ignoring unknown function call");
                result.ignored_calls.push(name);
            }
        }
    }

    fn advance_event(&mut self, id: &str, result: &mut ExecuteResult) {
        let Some(Event::Phase(event)) = self.board.event_mut(id) else {
            return;
        };
        let Some(phase) = event.advance_phase() else {
            return;
        };
        let hooks = event.info.on_phase_end_calls.clone();
        result.phases_completed.push((id.to_string(), phase.name));

        if hooks.is_empty() {
            return;
        }
        if self.depth >= self.config.max_call_depth {
            tracing::warn!(event_id = %id, depth = self.depth, "phase-end calls nested too deep, skipping");
            return;
        }

        let mut nested = ActionExecutor {
            board: &mut *self.board,
            config: self.config,
            depth: self.depth + 1,
        };
        match nested.execute(&hooks) {
            Ok(inner) => result.merge(inner),
            Err(e) => tracing::warn!(event_id = %id, error = %e, "phase-end calls failed"),
        }
    }
}

fn str_param<'c>(call: &'c FunctionCall, param: &'static str) -> Result<Option<&'c str>, RulesError> {
    match call.params.get(param) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(RulesError::invalid(
            &call.name,
            param,
            format!("expected a string, got {}", other),
        )),
    }
}

fn non_empty_str(call: &FunctionCall, param: &'static str) -> Result<String, RulesError> {
    let value = str_param(call, param)?.ok_or_else(|| RulesError::missing(&call.name, param))?;
    let value = value.trim();
    if value.is_empty() {
        return Err(RulesError::invalid(&call.name, param, "must not be empty"));
    }
    Ok(value.to_string())
}

/// Integers, integral floats and numeric strings are all accepted.
fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn int_param(call: &FunctionCall, param: &'static str) -> Result<i64, RulesError> {
    let value = call
        .params
        .get(param)
        .ok_or_else(|| RulesError::missing(&call.name, param))?;
    as_int(value)
        .ok_or_else(|| RulesError::invalid(&call.name, param, format!("'{}' is not an integer", value)))
}

/// `[day, season, year]` or `{"day", "season", "year"}`.
fn date_param(call: &FunctionCall, param: &'static str) -> Result<GameDate, RulesError> {
    let value = call
        .params
        .get(param)
        .ok_or_else(|| RulesError::missing(&call.name, param))?;
    let parts: Option<[i64; 3]> = match value {
        Value::Array(items) if items.len() == 3 => {
            match (as_int(&items[0]), as_int(&items[1]), as_int(&items[2])) {
                (Some(d), Some(s), Some(y)) => Some([d, s, y]),
                _ => None,
            }
        }
        Value::Object(map) => match (
            map.get("day").and_then(as_int),
            map.get("season").and_then(as_int),
            map.get("year").and_then(as_int),
        ) {
            (Some(d), Some(s), Some(y)) => Some([d, s, y]),
            _ => None,
        },
        _ => None,
    };

    let [day, season, year] = parts.ok_or_else(|| {
        RulesError::invalid(&call.name, param, "expected [day, season, year]")
    })?;
    let day = u32::try_from(day)
        .ok()
        .filter(|d| (1..=DAYS_PER_SEASON).contains(d));
    let season = u32::try_from(season).ok();
    let year = i32::try_from(year).ok();
    match (day, season, year) {
        (Some(day), Some(season), Some(year)) => Ok(GameDate::new(day, season, year)),
        _ => Err(RulesError::invalid(&call.name, param, "date out of range")),
    }
}

fn known_event(
    call: &FunctionCall,
    events: &BTreeMap<String, EventKind>,
    expected: Option<EventKind>,
) -> Result<String, RulesError> {
    let id = non_empty_str(call, "event_id")?;
    let kind = events
        .get(&id)
        .copied()
        .ok_or_else(|| RulesError::UnknownEvent(id.clone()))?;
    if let Some(expected) = expected {
        if kind != expected {
            return Err(RulesError::invalid(
                &call.name,
                "event_id",
                format!("'{}' is a {} event, expected {}", id, kind.as_str(), expected.as_str()),
            ));
        }
    }
    Ok(id)
}

fn calls_param(call: &FunctionCall, param: &'static str) -> Result<Vec<FunctionCall>, RulesError> {
    match call.params.get(param) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| RulesError::invalid(&call.name, param, e.to_string())),
    }
}

/// `dragon_hunt` becomes `Dragon Hunt`.
fn title_case(id: &str) -> String {
    id.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_event(call: &FunctionCall) -> Result<Event, RulesError> {
    let id = non_empty_str(call, "event_id")?;
    let info = EventInfo {
        name: str_param(call, "name")?
            .map(str::to_string)
            .unwrap_or_else(|| title_case(&id)),
        description: str_param(call, "description")?.unwrap_or_default().to_string(),
        icon: str_param(call, "icon")?
            .map(str::to_string)
            .unwrap_or_else(|| crate::events::DEFAULT_EVENT_ICON.to_string()),
        on_action_end_calls: calls_param(call, "on_action_end_calls")?,
        on_phase_end_calls: calls_param(call, "on_phase_end_calls")?,
        id,
    };

    let kind = str_param(call, "type")?.unwrap_or("phase");
    let event = match kind {
        "phase" => {
            let phases: Vec<EventPhase> = match call.params.get("phases") {
                None | Some(Value::Null) => Vec::new(),
                Some(value) => serde_json::from_value(value.clone())
                    .map_err(|e| RulesError::invalid(&call.name, "phases", e.to_string()))?,
            };
            Event::Phase(PhaseEvent {
                info,
                phases,
                current_phase: 0,
            })
        }
        "progress" => Event::Progress(ProgressEvent {
            info,
            target: int_param(call, "target")?,
            current: 0,
            progress_label: str_param(call, "progress_label")?.unwrap_or_default().to_string(),
        }),
        "timed" => Event::Timed(TimedEvent {
            info,
            deadline: date_param(call, "deadline")?,
        }),
        "condition" => {
            let source = str_param(call, "end_condition")?.unwrap_or_default();
            let condition = Condition::compile(source).map_err(|source| {
                RulesError::InvalidCondition {
                    owner: info.id.clone(),
                    source,
                }
            })?;
            Event::Condition(ConditionEvent {
                info,
                end_condition: Arc::new(condition),
            })
        }
        other => {
            return Err(RulesError::invalid(
                &call.name,
                "type",
                format!("unknown event type '{}'", other),
            ))
        }
    };
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(name: &str, params: Value) -> FunctionCall {
        FunctionCall {
            name: name.to_string(),
            params: params.as_object().cloned().unwrap_or_default(),
        }
    }

    fn board() -> GlobalBlackboard {
        let mut board = GlobalBlackboard::default();
        board.set_stat("gold", 50);
        board.set_stat("faith", 50);
        board.insert_npc(crate::entities::Npc::new("smith", "Old Brannoc"));
        board
    }

    #[test]
    fn test_update_stat_forms() {
        let mut board = board();
        let config = GameConfig::default();
        let result = ActionExecutor::new(&mut board, &config)
            .execute(&[
                call("update_stat", json!({"stat_id": "gold", "delta": 10})),
                call("update_stat", json!({"stat_id": "gold", "change": "-4"})),
                call("update_stat", json!({"faith": 7.0, "gold": 1})),
            ])
            .unwrap();

        assert_eq!(board.stat("gold"), Some(57));
        assert_eq!(board.stat("faith"), Some(57));
        assert_eq!(result.stat_changes.get("gold"), Some(&7));
        assert_eq!(result.stat_changes.get("faith"), Some(&7));
    }

    #[test]
    fn test_clamped_change_is_reported() {
        let mut board = board();
        board.set_stat("gold", 95);
        let config = GameConfig::default();
        let result = ActionExecutor::new(&mut board, &config)
            .execute(&[call("update_stat", json!({"stat_id": "gold", "delta": 20}))])
            .unwrap();
        assert_eq!(board.stat("gold"), Some(100));
        assert_eq!(result.stat_changes.get("gold"), Some(&5));
    }

    #[test]
    fn test_batch_is_all_or_nothing() {
        let mut board = board();
        let before = board.clone();
        let config = GameConfig::default();
        let mut executor = ActionExecutor::new(&mut board, &config);

        let err = executor
            .execute(&[
                call("add_tag", json!({"tag_id": "rebel"})),
                call("update_stat", json!({"stat_id": "gold", "delta": 51})),
            ])
            .unwrap_err();
        assert!(matches!(err, RulesError::DeltaOutOfRange { delta: 51, max: 50, .. }));

        let err = executor
            .execute(&[
                call("add_tag", json!({"tag_id": "rebel"})),
                call("update_stat", json!({"stat_id": "honor", "delta": 1})),
            ])
            .unwrap_err();
        assert!(matches!(err, RulesError::UnknownStat(ref s) if s == "honor"));

        let err = executor.execute(&[call("add_tag", json!({"tag_id": "  "}))]).unwrap_err();
        assert!(matches!(err, RulesError::InvalidParam { .. }));

        let err = executor.execute(&[call("update_stat", json!({"stat_id": "gold"}))]).unwrap_err();
        assert!(matches!(err, RulesError::MissingParam { param: "delta", .. }));

        assert_eq!(board, before);
    }

    #[test]
    fn test_extreme_delta_is_out_of_range() {
        let mut board = board();
        let before = board.clone();
        let config = GameConfig::default();

        for delta in [json!("-9223372036854775808"), json!(i64::MIN), json!(i64::MAX)] {
            let err = ActionExecutor::new(&mut board, &config)
                .execute(&[call("update_stat", json!({"stat_id": "gold", "delta": delta}))])
                .unwrap_err();
            assert!(matches!(err, RulesError::DeltaOutOfRange { max: 50, .. }));
        }

        let err = ActionExecutor::new(&mut board, &config)
            .execute(&[call("update_stat", json!({"gold": "-9223372036854775808"}))])
            .unwrap_err();
        assert!(matches!(err, RulesError::DeltaOutOfRange { delta: i64::MIN, .. }));
        assert_eq!(board, before);
    }

    #[test]
    fn test_strict_tags() {
        let mut board = board();
        let config = GameConfig {
            strict_tags: true,
            ..GameConfig::default()
        };
        let err = ActionExecutor::new(&mut board, &config)
            .execute(&[call("add_tag", json!({"tag_id": "rebel"}))])
            .unwrap_err();
        assert!(matches!(err, RulesError::UnknownTag(_)));
    }

    #[test]
    fn test_unknown_calls_are_ignored() {
        let mut board = board();
        let config = GameConfig::default();
        let result = ActionExecutor::new(&mut board, &config)
            .execute(&[
                call("summon_dragon", json!({"size": "large"})),
                call("add_tag", json!({"tag_id": "rebel"})),
            ])
            .unwrap();
        assert_eq!(result.ignored_calls, vec!["summon_dragon".to_string()]);
        assert!(board.has_tag("rebel"));
    }

    #[test]
    fn test_event_calls() {
        let mut board = board();
        let config = GameConfig::default();
        let mut executor = ActionExecutor::new(&mut board, &config);

        let result = executor
            .execute(&[
                call(
                    "add_event",
                    json!({
                        "type": "phase",
                        "event_id": "dragon_hunt",
                        "phases": [{"name": "Track"}, {"name": "Slay"}],
                        "on_phase_end_calls": [
                            {"name": "update_stat", "params": {"stat_id": "faith", "delta": 5}}
                        ]
                    }),
                ),
                call("advance_event", json!({"event_id": "dragon_hunt"})),
                call("add_event", json!({"type": "progress", "event_id": "tithe", "target": 3})),
                call("update_event_progress", json!({"event_id": "tithe", "delta": 2})),
                call("add_event", json!({"type": "timed", "event_id": "harvest", "deadline": [14, 1, 1]})),
                call("change_event_deadline", json!({"event_id": "harvest", "deadline": {"day": 20, "season": 1, "year": 1}})),
                call("add_event", json!({"type": "condition", "event_id": "feud", "end_condition": "'peace' in tags"})),
            ])
            .unwrap();

        assert_eq!(result.events_started.len(), 4);
        assert_eq!(
            result.phases_completed,
            vec![("dragon_hunt".to_string(), "Track".to_string())]
        );
        assert_eq!(result.stat_changes.get("faith"), Some(&5));

        let hunt = board.event("dragon_hunt").unwrap();
        assert_eq!(hunt.info().name, "Dragon Hunt");
        assert_eq!(hunt.progress_display(), "Phase 2/2: Slay");
        assert_eq!(board.event("tithe").unwrap().progress_display(), ": 2/3");
        match board.event("harvest").unwrap() {
            Event::Timed(t) => assert_eq!(t.deadline, GameDate::new(20, 1, 1)),
            other => panic!("expected timed event, got {:?}", other),
        }
        assert!(matches!(board.event("feud"), Some(Event::Condition(_))));
    }

    #[test]
    fn test_event_validation() {
        let mut board = board();
        let config = GameConfig::default();
        let mut executor = ActionExecutor::new(&mut board, &config);

        let err = executor
            .execute(&[call("add_event", json!({"type": "condition", "event_id": "feud", "end_condition": "tags >"}))])
            .unwrap_err();
        assert!(matches!(err, RulesError::InvalidCondition { ref owner, .. } if owner == "feud"));

        let err = executor
            .execute(&[call("advance_event", json!({"event_id": "nothing"}))])
            .unwrap_err();
        assert!(matches!(err, RulesError::UnknownEvent(_)));

        let err = executor
            .execute(&[
                call("add_event", json!({"type": "progress", "event_id": "tithe", "target": 3})),
                call("advance_event", json!({"event_id": "tithe"})),
            ])
            .unwrap_err();
        assert!(matches!(err, RulesError::InvalidParam { param: "event_id", .. }));

        let err = executor
            .execute(&[call("add_event", json!({"type": "festival", "event_id": "x"}))])
            .unwrap_err();
        assert!(matches!(err, RulesError::InvalidParam { param: "type", .. }));

        assert!(board.events().is_empty());
    }

    #[test]
    fn test_remove_event_in_same_batch() {
        let mut board = board();
        let config = GameConfig::default();
        let result = ActionExecutor::new(&mut board, &config)
            .execute(&[
                call("add_event", json!({"type": "progress", "event_id": "tithe", "target": 3})),
                call("remove_event", json!({"event_id": "tithe"})),
            ])
            .unwrap();
        assert_eq!(result.events_removed, vec!["tithe".to_string()]);
        assert!(board.events().is_empty());
    }

    #[test]
    fn test_phase_end_recursion_is_bounded() {
        let mut board = board();
        let config = GameConfig {
            max_call_depth: 2,
            ..GameConfig::default()
        };
        // Each completed phase advances the same event again.
        let add = call(
            "add_event",
            json!({
                "type": "phase",
                "event_id": "loop",
                "phases": [{"name": "1"}, {"name": "2"}, {"name": "3"}, {"name": "4"}, {"name": "5"}],
                "on_phase_end_calls": [{"name": "advance_event", "params": {"event_id": "loop"}}]
            }),
        );
        let result = ActionExecutor::new(&mut board, &config)
            .execute(&[add, call("advance_event", json!({"event_id": "loop"}))])
            .unwrap();
        assert_eq!(result.phases_completed.len(), 3);
    }

    #[test]
    fn test_npcs_and_time() {
        let mut board = board();
        let config = GameConfig::default();
        let mut executor = ActionExecutor::new(&mut board, &config);

        executor
            .execute(&[
                call("disable_npc", json!({"npc_id": "smith"})),
                call("enable_npc", json!({"npc_id": "nobody"})),
                call("advance_time", json!({"days": 3})),
            ])
            .unwrap();
        assert!(executor
            .execute(&[call("advance_time", json!({"days": 0}))])
            .is_err());

        assert!(!board.npc("smith").unwrap().enabled);
        assert_eq!(board.calendar().day, 4);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("dragon_hunt"), "Dragon Hunt");
        assert_eq!(title_case("feud"), "Feud");
    }
}
