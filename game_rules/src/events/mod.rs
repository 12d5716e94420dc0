//! Multi-day obligations tracked on the blackboard.
//!
//! Four variants share the same identity and hook fields. Phase and
//! progress events know when they are finished; timed and condition
//! events are finished by the engine, which compares the calendar or
//! evaluates the end condition at each week checkpoint.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cards::FunctionCall;
use crate::condition::{self, Condition, ConditionError};
use crate::world_state::GameDate;

pub const DEFAULT_EVENT_ICON: &str = "⚡";

fn default_icon() -> String {
    DEFAULT_EVENT_ICON.to_string()
}

/// Fields common to every event variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    /// Run at the end of every day while the event is active.
    #[serde(default)]
    pub on_action_end_calls: Vec<FunctionCall>,
    /// Run each time a phase completes.
    #[serde(default)]
    pub on_phase_end_calls: Vec<FunctionCall>,
}

impl EventInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            icon: default_icon(),
            on_action_end_calls: Vec::new(),
            on_phase_end_calls: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPhase {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseEvent {
    #[serde(flatten)]
    pub info: EventInfo,
    #[serde(default)]
    pub phases: Vec<EventPhase>,
    #[serde(default)]
    pub current_phase: usize,
}

impl PhaseEvent {
    pub fn is_finished(&self) -> bool {
        self.current_phase >= self.phases.len()
    }

    pub fn current(&self) -> Option<&EventPhase> {
        self.phases.get(self.current_phase)
    }

    /// Completes the current phase and returns it, or `None` once every
    /// phase is done.
    pub fn advance_phase(&mut self) -> Option<EventPhase> {
        let completed = self.phases.get(self.current_phase)?.clone();
        self.current_phase += 1;
        Some(completed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    #[serde(flatten)]
    pub info: EventInfo,
    #[serde(default)]
    pub target: i64,
    #[serde(default)]
    pub current: i64,
    #[serde(default)]
    pub progress_label: String,
}

impl ProgressEvent {
    pub fn is_finished(&self) -> bool {
        self.current >= self.target
    }

    pub fn update_progress(&mut self, delta: i64) {
        self.current = self.current.saturating_add(delta);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedEvent {
    #[serde(flatten)]
    pub info: EventInfo,
    pub deadline: GameDate,
}

impl TimedEvent {
    /// Reaching the deadline day counts as expired.
    pub fn is_expired(&self, today: GameDate) -> bool {
        today >= self.deadline
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionEvent {
    #[serde(flatten)]
    pub info: EventInfo,
    #[serde(with = "condition::shared", default = "condition::shared::always")]
    pub end_condition: Arc<Condition>,
}

impl ConditionEvent {
    /// Compiles the end condition up front; a syntax error rejects the event.
    pub fn new(info: EventInfo, end_condition: &str) -> Result<Self, ConditionError> {
        Ok(Self {
            info,
            end_condition: Arc::new(Condition::compile(end_condition)?),
        })
    }

    pub fn condition(&self) -> &Arc<Condition> {
        &self.end_condition
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Event {
    Phase(PhaseEvent),
    Progress(ProgressEvent),
    Timed(TimedEvent),
    Condition(ConditionEvent),
}

impl Event {
    pub fn info(&self) -> &EventInfo {
        match self {
            Event::Phase(e) => &e.info,
            Event::Progress(e) => &e.info,
            Event::Timed(e) => &e.info,
            Event::Condition(e) => &e.info,
        }
    }

    pub fn info_mut(&mut self) -> &mut EventInfo {
        match self {
            Event::Phase(e) => &mut e.info,
            Event::Progress(e) => &mut e.info,
            Event::Timed(e) => &mut e.info,
            Event::Condition(e) => &mut e.info,
        }
    }

    pub fn id(&self) -> &str {
        &self.info().id
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Event::Phase(_) => "phase",
            Event::Progress(_) => "progress",
            Event::Timed(_) => "timed",
            Event::Condition(_) => "condition",
        }
    }

    /// Self-determined completion. Timed and condition events always
    /// report `false` here.
    pub fn is_finished(&self) -> bool {
        match self {
            Event::Phase(e) => e.is_finished(),
            Event::Progress(e) => e.is_finished(),
            Event::Timed(_) | Event::Condition(_) => false,
        }
    }

    pub fn progress_display(&self) -> String {
        match self {
            Event::Phase(e) => match e.current() {
                Some(phase) => format!(
                    "Phase {}/{}: {}",
                    e.current_phase + 1,
                    e.phases.len(),
                    phase.name
                ),
                None => "Done".to_string(),
            },
            Event::Progress(e) if e.is_finished() => "Done".to_string(),
            Event::Progress(e) => format!("{}: {}/{}", e.progress_label, e.current, e.target),
            Event::Timed(e) => format!("Deadline: {}", e.deadline),
            Event::Condition(_) => "Active".to_string(),
        }
    }

    pub fn display(&self) -> EventDisplay {
        let info = self.info();
        EventDisplay {
            id: info.id.clone(),
            name: info.name.clone(),
            description: info.description.clone(),
            icon: info.icon.clone(),
            kind: self.kind().to_string(),
            progress: self.progress_display(),
        }
    }
}

/// Flattened view of an event for UIs and the writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDisplay {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub progress: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phases(names: &[&str]) -> Vec<EventPhase> {
        names
            .iter()
            .map(|n| EventPhase {
                name: n.to_string(),
                description: String::new(),
            })
            .collect()
    }

    #[test]
    fn test_phase_event_lifecycle() {
        let mut event = PhaseEvent {
            info: EventInfo::new("siege", "The Siege"),
            phases: phases(&["Walls", "Gates"]),
            current_phase: 0,
        };
        assert_eq!(Event::Phase(event.clone()).progress_display(), "Phase 1/2: Walls");

        assert_eq!(event.advance_phase().map(|p| p.name), Some("Walls".into()));
        assert_eq!(event.advance_phase().map(|p| p.name), Some("Gates".into()));
        assert!(event.is_finished());
        assert!(event.advance_phase().is_none());
        assert_eq!(Event::Phase(event).progress_display(), "Done");
    }

    #[test]
    fn test_empty_phase_event_is_finished() {
        let event = Event::Phase(PhaseEvent {
            info: EventInfo::new("nothing", "Nothing"),
            phases: Vec::new(),
            current_phase: 0,
        });
        assert!(event.is_finished());
    }

    #[test]
    fn test_progress_event() {
        let mut event = ProgressEvent {
            info: EventInfo::new("tithe", "Tithe"),
            target: 10,
            current: 0,
            progress_label: "Gold paid".into(),
        };
        event.update_progress(4);
        assert_eq!(Event::Progress(event.clone()).progress_display(), "Gold paid: 4/10");
        event.update_progress(6);
        assert!(event.is_finished());
        assert_eq!(Event::Progress(event).progress_display(), "Done");
    }

    #[test]
    fn test_timed_deadline_is_inclusive() {
        let event = TimedEvent {
            info: EventInfo::new("harvest", "Harvest"),
            deadline: GameDate::new(14, 2, 3),
        };
        assert!(!event.is_expired(GameDate::new(13, 2, 3)));
        assert!(event.is_expired(GameDate::new(14, 2, 3)));
        assert!(event.is_expired(GameDate::new(1, 0, 4)));
        assert!(!Event::Timed(event.clone()).is_finished());
        assert_eq!(Event::Timed(event).progress_display(), "Deadline: 14/2/3");
    }

    #[test]
    fn test_condition_event_rejects_bad_syntax() {
        let info = EventInfo::new("feud", "Blood Feud");
        assert!(ConditionEvent::new(info.clone(), "stats.honor >").is_err());

        let event = ConditionEvent::new(info, "'peace' in tags").unwrap();
        assert_eq!(event.condition().source(), "'peace' in tags");
        assert_eq!(Event::Condition(event).progress_display(), "Active");
    }

    #[test]
    fn test_tagged_serialization() {
        let event = Event::Condition(
            ConditionEvent::new(EventInfo::new("feud", "Blood Feud"), "stats.honor > 80").unwrap(),
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "condition");
        assert_eq!(json["id"], "feud");
        assert_eq!(json["end_condition"], "stats.honor > 80");

        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);

        let timed: Event = serde_json::from_str(
            r#"{"type": "timed", "id": "t", "name": "T", "deadline": [3, 1, 2]}"#,
        )
        .unwrap();
        assert_eq!(timed.info().icon, DEFAULT_EVENT_ICON);
        match timed {
            Event::Timed(t) => assert_eq!(t.deadline, GameDate::new(3, 1, 2)),
            other => panic!("expected timed event, got {:?}", other),
        }
    }
}
