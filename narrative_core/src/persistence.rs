//! Save files: the whole engine state as one JSON document.
//!
//! Plot and event conditions are stored as source text and recompiled on
//! load, so a save never carries anything executable.

use serde::{Deserialize, Serialize};

use crate::engine::GameEngine;
use crate::error::EngineError;
use crate::jobs::JobQueue;
use crate::story::MacroDAG;
use game_rules::{Card, GameConfig, GlobalBlackboard, WeightedDeque};

/// Bump when the layout changes incompatibly.
pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedGame {
    pub version: u32,
    pub board: GlobalBlackboard,
    pub dag: MacroDAG,
    pub deck: WeightedDeque,
    #[serde(default)]
    pub shown: Vec<Card>,
    #[serde(default)]
    pub immediate: Vec<Card>,
    #[serde(default)]
    pub jobs: JobQueue,
}

/// What a load menu shows for one save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveSummary {
    pub world_slug: String,
    pub world_name: String,
    pub elapsed_days: i64,
    pub life: u32,
}

impl SavedGame {
    pub fn capture(engine: &GameEngine) -> Self {
        engine.save()
    }

    pub fn into_engine(self, config: GameConfig) -> Result<GameEngine, EngineError> {
        GameEngine::restore(self, config)
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, EngineError> {
        let saved: SavedGame = serde_json::from_str(text)?;
        if saved.version > SAVE_VERSION {
            return Err(EngineError::UnsupportedSave(saved.version));
        }
        Ok(saved)
    }

    pub fn summary(&self) -> SaveSummary {
        SaveSummary {
            world_slug: world_slug(&self.board.world.name),
            world_name: self.board.world.name.clone(),
            elapsed_days: self.board.calendar().elapsed_days(),
            life: self.board.life(),
        }
    }
}

/// Lowercase file stem for a world: runs of anything but ASCII letters and
/// digits become one underscore.
pub fn world_slug(world_name: &str) -> String {
    let mut slug = String::with_capacity(world_name.len());
    let mut gap = false;
    for ch in world_name.chars() {
        if ch.is_ascii_alphanumeric() {
            if gap && !slug.is_empty() {
                slug.push('_');
            }
            slug.push(ch.to_ascii_lowercase());
            gap = false;
        } else {
            gap = true;
        }
    }
    if slug.is_empty() {
        "world".to_string()
    } else {
        slug
    }
}
