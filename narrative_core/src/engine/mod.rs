//! # Game Engine
//!
//! Orchestrates one game: the blackboard, the plot graph, the week deck,
//! the immediate queue for structural cards, and the writer job queue.
//!
//! Cards flow like this:
//!
//! 1. The writer's batch goes through [`GameEngine::process_batch`]. Structural
//!    cards are parked on the blackboard, everything else enters the deck.
//! 2. [`GameEngine::draw_cards`] serves the immediate queue first, then the
//!    deck. Drawn cards sit on the table until resolved.
//! 3. [`GameEngine::resolve_card`] runs the chosen side's calls and queues
//!    follow-up cards right behind it.
//! 4. [`GameEngine::advance_week`] moves time, sweeps events and fires at
//!    most one plot node.

mod context;
mod tick;

pub use context::*;
pub use tick::*;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use crate::error::EngineError;
use crate::jobs::{CardGenJob, JobQueue};
use crate::persistence::{SavedGame, SAVE_VERSION};
use crate::story::{MacroDAG, PlotNode, VisualGraph};
use game_rules::{
    ActionExecutor, Card, CardDef, CardInfo, Condition, ConditionEvaluator, DayBoundary,
    DeathBoundary, DeathInfo, DeathLoop, Direction, Event, EventDisplay, ExecuteResult,
    FunctionCall, GameConfig, GameDate, GlobalBlackboard, InfoCard, Priority, StructuralSlot,
    WeightedDeque, WorldSchema, NARRATOR,
};

const WELCOME_CARD_ID: &str = "welcome_message";
const REBORN_CARD_PREFIX: &str = "reborn_";
const SEASON_CARD_PREFIX: &str = "season_";
const DEATH_CARD_PREFIX: &str = "death_";

/// What resolving one card did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveOutcome {
    pub card_id: String,
    pub direction: Direction,
    pub result: ExecuteResult,
    /// Follow-up cards queued to be drawn next.
    pub follow_ups: usize,
    pub death: Option<DeathInfo>,
}

/// What a single day advance did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayReport {
    pub date: GameDate,
    pub boundary: DayBoundary,
    pub death: Option<DeathInfo>,
    /// Failed event hooks, as `"<event id>: <error>"`.
    pub hook_errors: Vec<String>,
}

/// One game in progress.
#[derive(Debug, Clone)]
pub struct GameEngine {
    board: GlobalBlackboard,
    dag: MacroDAG,
    deck: WeightedDeque,
    immediate: VecDeque<Card>,
    shown: Vec<Card>,
    jobs: JobQueue,
    death_loop: DeathLoop,
    evaluator: ConditionEvaluator,
    config: GameConfig,
}

impl GameEngine {
    /// An empty world: no stats, no plot.
    pub fn new(config: GameConfig) -> Self {
        Self::from_parts(GlobalBlackboard::default(), MacroDAG::new(), config)
    }

    /// Builds a game from the world generator's output.
    pub fn from_schema(schema: &WorldSchema, config: GameConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let board = GlobalBlackboard::from_schema(schema, &config);
        let dag = MacroDAG::from_defs(&schema.plot_nodes)?;
        tracing::info!(
            world = %schema.world_name,
            stats = schema.stats.len(),
            plot_nodes = dag.len(),
            "game created"
        );
        Ok(Self::from_parts(board, dag, config))
    }

    pub(crate) fn from_parts(board: GlobalBlackboard, dag: MacroDAG, config: GameConfig) -> Self {
        Self {
            board,
            dag,
            deck: WeightedDeque::new(config.deck_capacity),
            immediate: VecDeque::new(),
            shown: Vec::new(),
            jobs: JobQueue::new(),
            death_loop: DeathLoop::from_config(&config),
            evaluator: ConditionEvaluator::new(config.condition_timeout()),
            config,
        }
    }

    // -- accessors -----------------------------------------------------

    pub fn state(&self) -> &GlobalBlackboard {
        &self.board
    }

    /// An owned copy of the blackboard.
    pub fn snapshot(&self) -> GlobalBlackboard {
        self.board.clone()
    }

    pub fn dag(&self) -> &MacroDAG {
        &self.dag
    }

    pub fn visual_graph(&self) -> VisualGraph {
        self.dag.visual_graph()
    }

    pub fn deck(&self) -> &WeightedDeque {
        &self.deck
    }

    pub fn immediate_cards(&self) -> impl Iterator<Item = &Card> {
        self.immediate.iter()
    }

    /// Cards drawn but not yet resolved.
    pub fn shown_cards(&self) -> &[Card] {
        &self.shown
    }

    pub fn jobs(&self) -> &JobQueue {
        &self.jobs
    }

    /// Hands every pending job to the writer.
    pub fn drain_jobs(&mut self) -> Vec<CardGenJob> {
        self.jobs.drain()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &ConditionEvaluator {
        &self.evaluator
    }

    // -- cards ---------------------------------------------------------

    /// Draws up to `n` cards, immediate queue first. Drawn cards stay on
    /// the table until resolved.
    pub fn draw_cards(&mut self, n: usize) -> Vec<Card> {
        let mut drawn = Vec::with_capacity(n);
        while drawn.len() < n {
            let next = match self.immediate.pop_front() {
                Some(card) => Some(card),
                None => self.deck.draw(),
            };
            match next {
                Some(card) => drawn.push(card),
                None => break,
            }
        }
        self.shown.extend(drawn.iter().cloned());
        drawn
    }

    /// Applies the player's choice on a card from the table.
    ///
    /// The chosen calls are validated as a batch before any is applied; on
    /// error nothing changes and the card stays on the table. Does not move
    /// the calendar.
    pub fn resolve_card(
        &mut self,
        card_id: &str,
        direction: &str,
    ) -> Result<ResolveOutcome, EngineError> {
        let direction: Direction = direction.parse()?;
        let index = self
            .shown
            .iter()
            .position(|c| c.id() == card_id)
            .ok_or_else(|| EngineError::CardNotFound(card_id.to_string()))?;

        let result = {
            let card = &self.shown[index];
            ActionExecutor::new(&mut self.board, &self.config).execute(card.calls(direction))?
        };

        let card = self.shown.remove(index);
        if !card.is_info() {
            self.board.record_appearance(card.character());
        }

        let follow_ups = card.follow_ups(direction);
        for follow_up in follow_ups.iter().rev() {
            let mut follow_up = follow_up.clone();
            follow_up.set_priority(Priority::Tree);
            self.immediate.push_front(follow_up);
        }
        self.enqueue_event_jobs(&result);

        tracing::debug!(
            card_id = %card_id,
            direction = %direction,
            follow_ups = follow_ups.len(),
            "card resolved"
        );

        let death = self.check_death();
        Ok(ResolveOutcome {
            card_id: card_id.to_string(),
            direction,
            result,
            follow_ups: follow_ups.len(),
            death,
        })
    }

    /// Validates writer output and puts it in the deck. Returns the cards
    /// evicted to make room.
    pub fn add_cards_from_defs(&mut self, defs: &[CardDef]) -> Vec<Card> {
        let cards: Vec<Card> = defs.iter().map(|d| d.validate(&self.board)).collect();
        self.deck.bulk_insert(cards)
    }

    /// Routes one writer batch.
    ///
    /// On the first day of a season, info cards named `welcome_message`,
    /// `reborn_*`, `season_*` and `death_*` are structural: the first three
    /// go to the front of the immediate queue, death cards are kept until
    /// the matching death. Everything else enters the deck.
    pub fn process_batch(&mut self, defs: &[CardDef]) -> Vec<Card> {
        let season_start = self.is_season_start();
        let mut deck_defs = Vec::with_capacity(defs.len());

        for def in defs {
            let structural = match (def, def.id()) {
                (CardDef::Info(_), Some(id)) if season_start => structural_slot(id),
                _ => None,
            };
            match structural {
                Some(Routing::Slot(slot)) => {
                    let card = def.validate(&self.board);
                    self.board.store_structural_card(slot, card);
                }
                Some(Routing::Death) => {
                    let card = def.validate(&self.board);
                    self.board.store_death_card(card.id().to_string(), card);
                }
                None => deck_defs.push(def.clone()),
            }
        }

        let evicted = self.add_cards_from_defs(&deck_defs);

        if season_start {
            // Pushed to the front in reverse, so welcome or reborn shows first.
            for slot in [
                StructuralSlot::SeasonStart,
                StructuralSlot::Reborn,
                StructuralSlot::Welcome,
            ] {
                if let Some(card) = self.board.take_structural_card(slot) {
                    self.immediate.push_front(card);
                }
            }
            self.board.set_first_day_after_death(false);
        }

        self.deck.reset_consumption();
        evicted
    }

    /// How many common cards the writer should produce this batch.
    pub fn common_count(&self) -> usize {
        self.config.deck_capacity.saturating_sub(self.jobs.len()).max(1)
    }

    pub fn is_season_start(&self) -> bool {
        self.board.calendar().day == 1
    }

    /// True when the writer should run: the deck is half spent or a plot
    /// or event-start job is waiting.
    pub fn needs_generation(&self) -> bool {
        self.deck.needs_generation() || self.jobs.has_high_priority()
    }

    // -- time ----------------------------------------------------------

    /// Advances one day and runs every active event's end-of-action hooks,
    /// in event ID order. A failing hook is logged and skipped.
    pub fn advance_day(&mut self) -> DayReport {
        let boundary = self.board.advance_day();

        let hooks: Vec<(String, Vec<FunctionCall>)> = self
            .board
            .events()
            .values()
            .filter(|e| !e.info().on_action_end_calls.is_empty())
            .map(|e| (e.id().to_string(), e.info().on_action_end_calls.clone()))
            .collect();
        let mut hook_errors = Vec::new();
        for (event_id, calls) in hooks {
            if let Err(message) = self.run_hook(&event_id, &calls) {
                hook_errors.push(message);
            }
        }

        let death = self.check_death();
        DayReport {
            date: self.board.today(),
            boundary,
            death,
            hook_errors,
        }
    }

    /// Runs hook calls, enqueueing writer jobs for the events they touch.
    fn run_hook(&mut self, owner: &str, calls: &[FunctionCall]) -> Result<(), String> {
        match ActionExecutor::new(&mut self.board, &self.config).execute(calls) {
            Ok(result) => {
                self.enqueue_event_jobs(&result);
                Ok(())
            }
            Err(error) => {
                tracing::warn!(owner = %owner, error = %error, "hook calls failed");
                Err(format!("{}: {}", owner, error))
            }
        }
    }

    fn enqueue_event_jobs(&mut self, result: &ExecuteResult) {
        for event_id in &result.events_started {
            if let Some(event) = self.board.event(event_id) {
                self.jobs.enqueue(CardGenJob::event_start(&event.display()));
            }
        }
        for (event_id, phase) in &result.phases_completed {
            self.jobs.enqueue(CardGenJob::event_phase(event_id, phase));
        }
    }

    // -- death ---------------------------------------------------------

    /// Checks for a lethal stat and, on death, queues the death card.
    pub fn check_death(&mut self) -> Option<DeathInfo> {
        let death = self.death_loop.check_death(&mut self.board)?;
        self.handle_death(&death);
        Some(death)
    }

    /// Queues the writer's card for this death, or a plain fallback when
    /// none was written.
    pub fn handle_death(&mut self, death: &DeathInfo) {
        let key = death.death_card_key();
        let card = match self.board.take_death_card(&key) {
            Some(card) => card,
            None => self.fallback_death_card(death),
        };
        self.immediate.push_back(card);
    }

    fn fallback_death_card(&self, death: &DeathInfo) -> Card {
        let stat_name = self.board.stat_name(&death.cause_stat);
        let description = match death.boundary {
            DeathBoundary::Min => format!(
                "Your {} has fallen to nothing. The world fades to black...",
                stat_name
            ),
            DeathBoundary::Max => format!(
                "Your {} has spiraled beyond control. Everything collapses...",
                stat_name
            ),
        };
        let mut info = CardInfo::new(
            format!("{}{}", DEATH_CARD_PREFIX, game_rules::generate_card_id()),
            "☠ Death",
        );
        info.description = description;
        info.character = NARRATOR.to_string();
        let mut card = Card::Info(InfoCard {
            info,
            next_cards: Vec::new(),
        });
        card.set_priority(Priority::Story);
        card
    }

    /// Starts the next life.
    ///
    /// Temp tags are dropped along with those the world marks temporary.
    /// Non-ending plot nodes are un-fired, and every card on the table, in
    /// the deck or waiting in a queue is discarded. Returns the karma tags.
    pub fn resurrect(&mut self, temp_tags: &BTreeSet<String>) -> BTreeSet<String> {
        let mut temp: BTreeSet<String> = temp_tags.clone();
        temp.extend(self.board.temp_tags());

        let karma = self.death_loop.resurrect(&mut self.board, &temp);
        let reset = self.dag.partial_reset();
        self.deck.clear();
        self.shown.clear();
        self.immediate.clear();
        self.board.clear_death_cards();
        self.board.set_first_day_after_death(true);

        tracing::debug!(reset_nodes = reset, "story reset for new life");
        karma
    }

    // -- story and events ---------------------------------------------

    /// Fires the first activatable plot node, ascending by ID, and runs its
    /// calls. Evaluates under the caller's borrow; sessions use the split
    /// week protocol instead so no lock is held during evaluation.
    pub fn check_plot_conditions(&mut self) -> Result<Option<PlotNode>, EngineError> {
        let ctx = Arc::new(self.board.condition_context());
        let mut first = None;
        for (id, _) in self.dag.activation_candidates() {
            match self.dag.check_condition(&id, &ctx, &self.evaluator) {
                Ok(true) => {
                    first = Some(id);
                    break;
                }
                Ok(false) => {}
                Err(error) => {
                    tracing::warn!(node_id = %id, error = %error, "plot condition not ready");
                }
            }
        }
        match first {
            Some(id) => self.fire_plot_node(&id).map(Some),
            None => Ok(None),
        }
    }

    pub(crate) fn fire_plot_node(&mut self, id: &str) -> Result<PlotNode, EngineError> {
        let node = self.dag.fire_node(id)?.clone();
        if let Err(error) = ActionExecutor::new(&mut self.board, &self.config).execute(&node.calls)
        {
            tracing::warn!(node_id = %id, error = %error, "plot node calls failed");
        }
        self.jobs.enqueue(CardGenJob::plot(&node));
        Ok(node)
    }

    /// Removes every event that has run its course: finished phase and
    /// progress events, timed events on or past their deadline, and
    /// condition events whose condition holds. Returns the removed IDs.
    pub fn check_events(&mut self) -> Vec<String> {
        let mut done = self.sweep_finished_events();
        let ctx = Arc::new(self.board.condition_context());
        let checks = self.condition_event_checks();
        for (id, condition) in checks {
            match self.evaluator.evaluate(&condition, &ctx) {
                Ok(true) => {
                    self.board.remove_event(&id);
                    done.push(id);
                }
                Ok(false) => {}
                Err(error) => {
                    tracing::warn!(event_id = %id, error = %error, "end condition not ready");
                }
            }
        }
        done
    }

    /// Removes finished phase, progress and expired timed events.
    pub(crate) fn sweep_finished_events(&mut self) -> Vec<String> {
        let today = self.board.today();
        let finished: Vec<String> = self
            .board
            .events()
            .values()
            .filter(|e| match e {
                Event::Timed(t) => t.is_expired(today),
                other => other.is_finished(),
            })
            .map(|e| e.id().to_string())
            .collect();
        for id in &finished {
            self.board.remove_event(id);
            tracing::debug!(event_id = %id, "event finished");
        }
        finished
    }

    pub(crate) fn condition_event_checks(
        &self,
    ) -> Vec<(String, Arc<Condition>)> {
        self.board
            .events()
            .values()
            .filter_map(|e| match e {
                Event::Condition(c) => {
                    Some((c.info.id.clone(), Arc::clone(c.condition())))
                }
                _ => None,
            })
            .collect()
    }

    pub fn check_ending(&self) -> Option<&PlotNode> {
        self.dag.check_ending()
    }

    pub fn events_for_display(&self) -> Vec<EventDisplay> {
        self.board.events().values().map(|e| e.display()).collect()
    }

    pub fn generation_context(&self) -> GenerationContext {
        GenerationContext::assemble(self)
    }

    // -- persistence ---------------------------------------------------

    pub fn save(&self) -> SavedGame {
        SavedGame {
            version: SAVE_VERSION,
            board: self.board.clone(),
            dag: self.dag.clone(),
            deck: self.deck.clone(),
            shown: self.shown.clone(),
            immediate: self.immediate.iter().cloned().collect(),
            jobs: self.jobs.clone(),
        }
    }

    /// Rebuilds an engine from a save. Tunables come from `config`; the
    /// saved deck keeps the capacity it was saved with.
    pub fn restore(saved: SavedGame, config: GameConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let mut engine = Self::from_parts(saved.board, saved.dag, config);
        engine.deck = saved.deck;
        engine.shown = saved.shown;
        engine.immediate = saved.immediate.into();
        engine.jobs = saved.jobs;
        Ok(engine)
    }
}

enum Routing {
    Slot(StructuralSlot),
    Death,
}

fn structural_slot(card_id: &str) -> Option<Routing> {
    if card_id == WELCOME_CARD_ID {
        Some(Routing::Slot(StructuralSlot::Welcome))
    } else if card_id.starts_with(REBORN_CARD_PREFIX) {
        Some(Routing::Slot(StructuralSlot::Reborn))
    } else if card_id.starts_with(SEASON_CARD_PREFIX) {
        Some(Routing::Slot(StructuralSlot::SeasonStart))
    } else if card_id.starts_with(DEATH_CARD_PREFIX) {
        Some(Routing::Death)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_rules::{ChoiceCardDef, InfoCardDef, Npc, RulesError};

    fn engine() -> GameEngine {
        let mut board = GlobalBlackboard::default();
        board.set_stat("health", 50);
        board.set_stat("wealth", 50);
        board.insert_npc(Npc::new("mira", "Mira"));
        GameEngine::from_parts(board, MacroDAG::new(), GameConfig::default())
    }

    fn choice(id: &str, source: &str) -> CardDef {
        CardDef::Choice(ChoiceCardDef {
            id: Some(id.to_string()),
            title: id.to_string(),
            source: source.to_string(),
            ..ChoiceCardDef::default()
        })
    }

    fn info(id: &str) -> CardDef {
        CardDef::Info(InfoCardDef {
            id: Some(id.to_string()),
            title: id.to_string(),
            ..InfoCardDef::default()
        })
    }

    #[test]
    fn test_immediate_cards_draw_first() {
        let mut engine = engine();
        engine.add_cards_from_defs(&[choice("market", "common"), choice("feud", "plot")]);
        let notice = info("notice").validate(engine.state());
        engine.immediate.push_back(notice);

        let drawn: Vec<String> = engine.draw_cards(3).iter().map(|c| c.id().to_string()).collect();
        assert_eq!(drawn, vec!["notice", "feud", "market"]);
        assert_eq!(engine.shown_cards().len(), 3);
    }

    #[test]
    fn test_resolve_applies_calls_and_queues_follow_ups() {
        let mut engine = engine();
        let def = CardDef::Choice(ChoiceCardDef {
            id: Some("tax".into()),
            character: "mira".into(),
            left_calls: vec![FunctionCall::new("update_stat")
                .with_param("stat_id", "wealth")
                .with_param("delta", -10)],
            tree_left: vec![info("receipt"), info("grumble")],
            ..ChoiceCardDef::default()
        });
        engine.add_cards_from_defs(&[def]);
        engine.draw_cards(1);

        let outcome = engine.resolve_card("tax", "left").unwrap();
        assert_eq!(outcome.result.stat_changes["wealth"], -10);
        assert_eq!(outcome.follow_ups, 2);
        assert!(engine.shown_cards().is_empty());
        assert_eq!(engine.state().npc("mira").unwrap().appearance_count, 1);

        let next: Vec<&Card> = engine.immediate_cards().collect();
        assert_eq!(next[0].id(), "receipt");
        assert_eq!(next[1].id(), "grumble");
        assert!(next.iter().all(|c| c.priority() == Priority::Tree));
    }

    #[test]
    fn test_resolve_rejects_bad_input() {
        let mut engine = engine();
        engine.add_cards_from_defs(&[choice("market", "common")]);
        engine.draw_cards(1);

        assert!(matches!(
            engine.resolve_card("market", "up"),
            Err(EngineError::Rules(RulesError::InvalidDirection(_)))
        ));
        assert!(matches!(
            engine.resolve_card("nowhere", "left"),
            Err(EngineError::CardNotFound(_))
        ));
        assert_eq!(engine.shown_cards().len(), 1);
    }

    #[test]
    fn test_failed_calls_leave_card_on_table() {
        let mut engine = engine();
        let def = CardDef::Choice(ChoiceCardDef {
            id: Some("gamble".into()),
            right_calls: vec![
                FunctionCall::new("update_stat")
                    .with_param("stat_id", "wealth")
                    .with_param("delta", 5),
                FunctionCall::new("update_stat")
                    .with_param("stat_id", "wealth")
                    .with_param("delta", 80),
            ],
            ..ChoiceCardDef::default()
        });
        engine.add_cards_from_defs(&[def]);
        engine.draw_cards(1);

        assert!(engine.resolve_card("gamble", "right").is_err());
        assert_eq!(engine.state().stat("wealth"), Some(50));
        assert_eq!(engine.shown_cards().len(), 1);
    }

    #[test]
    fn test_process_batch_routes_structural_cards() {
        let mut engine = engine();
        engine.process_batch(&[
            choice("market", "common"),
            info("season_spring_1"),
            info("welcome_message"),
            info("death_health_min"),
        ]);

        let queued: Vec<&str> = engine.immediate_cards().map(|c| c.id()).collect();
        assert_eq!(queued, vec!["welcome_message", "season_spring_1"]);
        assert_eq!(engine.deck().len(), 1);
        assert!(engine.state().death_card("death_health_min").is_some());
    }

    #[test]
    fn test_structural_ids_are_plain_cards_mid_season() {
        let mut engine = engine();
        engine.advance_day();
        engine.process_batch(&[info("welcome_message")]);

        assert_eq!(engine.immediate_cards().count(), 0);
        assert_eq!(engine.deck().len(), 1);
    }

    #[test]
    fn test_death_queues_written_card_or_fallback() {
        let mut engine = engine();
        engine.process_batch(&[info("death_health_min")]);
        engine.board.set_stat("health", 0);
        let death = engine.check_death().unwrap();
        assert_eq!(death.death_card_key(), "death_health_min");
        assert_eq!(engine.immediate_cards().last().unwrap().id(), "death_health_min");

        let mut engine = self::engine();
        engine.board.set_stat("wealth", 100);
        engine.check_death().unwrap();
        let card = engine.immediate_cards().last().unwrap();
        assert_eq!(card.info().title, "☠ Death");
        assert!(card.info().description.contains("spiraled beyond control"));
        assert_eq!(card.priority(), Priority::Story);
    }

    #[test]
    fn test_resurrect_clears_cards_and_marks_first_day() {
        let mut engine = engine();
        engine.add_cards_from_defs(&[choice("market", "common")]);
        engine.board.add_tag("brave");
        engine.board.set_stat("health", 0);
        engine.check_death();

        let karma = engine.resurrect(&BTreeSet::new());
        assert!(karma.contains("brave"));
        assert!(engine.deck().is_empty());
        assert_eq!(engine.immediate_cards().count(), 0);
        assert!(engine.state().is_alive());
        assert!(engine.state().is_first_day_after_death());
        assert_eq!(engine.state().stat("health"), Some(50));
    }

    #[test]
    fn test_common_count_reserves_room_for_jobs() {
        let mut engine = engine();
        assert_eq!(engine.common_count(), 7);
        for _ in 0..9 {
            engine.jobs.enqueue(CardGenJob::new(crate::jobs::JobKind::Chain));
        }
        assert_eq!(engine.common_count(), 1);
    }

    #[test]
    fn test_direct_checks_fire_and_sweep() {
        let mut engine = engine();
        engine
            .dag
            .add_node(PlotNode::new("omen", "An omen.", "stats.wealth >= 50").unwrap())
            .unwrap();
        let cond = game_rules::ConditionEvent::new(
            game_rules::EventInfo::new("rich", "Get Rich"),
            "stats.wealth >= 50",
        )
        .unwrap();
        engine.board.insert_event(Event::Condition(cond));

        let fired = engine.check_plot_conditions().unwrap();
        assert_eq!(fired.map(|n| n.id), Some("omen".to_string()));
        assert!(engine.check_plot_conditions().unwrap().is_none());
        assert_eq!(engine.check_events(), vec!["rich".to_string()]);
        assert!(engine.events_for_display().is_empty());
    }
}
