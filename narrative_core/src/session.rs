//! Lock-guarded games, one per session, and the registry that holds them.
//!
//! Reads share the engine lock; mutations take it exclusively. The weekly
//! tick never evaluates conditions while holding it.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::engine::{GameEngine, GenerationContext, ResolveOutcome, WeekReport};
use crate::error::EngineError;
use crate::jobs::CardGenJob;
use crate::persistence::SavedGame;
use crate::story::{MacroDAG, VisualGraph};
use game_rules::{Card, CardDef, GameConfig, GlobalBlackboard, WorldSchema};

#[derive(Debug)]
pub struct GameSession {
    id: Uuid,
    engine: RwLock<GameEngine>,
    /// Serializes weekly ticks, which drop the engine lock mid-way.
    tick_gate: Mutex<()>,
}

impl GameSession {
    pub fn new(engine: GameEngine) -> Self {
        Self {
            id: Uuid::new_v4(),
            engine: RwLock::new(engine),
            tick_gate: Mutex::new(()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, GameEngine>, EngineError> {
        self.engine.read().map_err(|_| EngineError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, GameEngine>, EngineError> {
        self.engine.write().map_err(|_| EngineError::LockPoisoned)
    }

    pub fn draw_cards(&self, n: usize) -> Result<Vec<Card>, EngineError> {
        Ok(self.write()?.draw_cards(n))
    }

    pub fn resolve_card(&self, card_id: &str, direction: &str) -> Result<ResolveOutcome, EngineError> {
        self.write()?.resolve_card(card_id, direction)
    }

    /// Runs the weekly tick without holding the engine lock while
    /// conditions are evaluated.
    pub fn advance_week(&self) -> Result<WeekReport, EngineError> {
        let _tick = self.tick_gate.lock().map_err(|_| EngineError::LockPoisoned)?;

        let (report, checks) = self.write()?.begin_week()?;
        let verdicts = checks.evaluate();
        self.write()?.finish_week(report, verdicts)
    }

    /// Waits for any weekly tick in progress, so a tick never straddles
    /// two lives.
    pub fn resurrect(&self, temp_tags: &BTreeSet<String>) -> Result<BTreeSet<String>, EngineError> {
        let _tick = self.tick_gate.lock().map_err(|_| EngineError::LockPoisoned)?;
        Ok(self.write()?.resurrect(temp_tags))
    }

    pub fn process_batch(&self, defs: &[CardDef]) -> Result<Vec<Card>, EngineError> {
        Ok(self.write()?.process_batch(defs))
    }

    pub fn drain_jobs(&self) -> Result<Vec<CardGenJob>, EngineError> {
        Ok(self.write()?.drain_jobs())
    }

    /// A copy of the blackboard.
    pub fn state(&self) -> Result<GlobalBlackboard, EngineError> {
        Ok(self.read()?.snapshot())
    }

    /// A copy of the plot graph.
    pub fn dag(&self) -> Result<MacroDAG, EngineError> {
        Ok(self.read()?.dag().clone())
    }

    pub fn visual_graph(&self) -> Result<VisualGraph, EngineError> {
        Ok(self.read()?.visual_graph())
    }

    pub fn generation_context(&self) -> Result<GenerationContext, EngineError> {
        Ok(self.read()?.generation_context())
    }

    pub fn save(&self) -> Result<SavedGame, EngineError> {
        Ok(SavedGame::capture(&*self.read()?))
    }

    /// Runs `f` with shared access to the engine.
    pub fn with_engine<R>(&self, f: impl FnOnce(&GameEngine) -> R) -> Result<R, EngineError> {
        Ok(f(&*self.read()?))
    }
}

/// All live sessions by ID.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Arc<GameSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new game from a world schema.
    pub fn create(
        &self,
        schema: &WorldSchema,
        config: GameConfig,
    ) -> Result<Arc<GameSession>, EngineError> {
        let engine = GameEngine::from_schema(schema, config)?;
        self.insert(engine)
    }

    /// Resumes a saved game under a fresh session ID.
    pub fn restore(
        &self,
        saved: SavedGame,
        config: GameConfig,
    ) -> Result<Arc<GameSession>, EngineError> {
        self.insert(saved.into_engine(config)?)
    }

    fn insert(&self, engine: GameEngine) -> Result<Arc<GameSession>, EngineError> {
        let session = Arc::new(GameSession::new(engine));
        self.sessions
            .write()
            .map_err(|_| EngineError::LockPoisoned)?
            .insert(session.id(), Arc::clone(&session));
        tracing::info!(session_id = %session.id(), "session created");
        Ok(session)
    }

    pub fn get(&self, id: Uuid) -> Result<Arc<GameSession>, EngineError> {
        self.sessions
            .read()
            .map_err(|_| EngineError::LockPoisoned)?
            .get(&id)
            .cloned()
            .ok_or(EngineError::GameNotFound(id))
    }

    pub fn remove(&self, id: Uuid) -> Result<Arc<GameSession>, EngineError> {
        let removed = self
            .sessions
            .write()
            .map_err(|_| EngineError::LockPoisoned)?
            .remove(&id)
            .ok_or(EngineError::GameNotFound(id))?;
        tracing::info!(session_id = %id, "session removed");
        Ok(removed)
    }

    pub fn list(&self) -> Result<Vec<Uuid>, EngineError> {
        let mut ids: Vec<Uuid> = self
            .sessions
            .read()
            .map_err(|_| EngineError::LockPoisoned)?
            .keys()
            .copied()
            .collect();
        ids.sort();
        Ok(ids)
    }
}
