//! Errors surfaced by the engine and session layer.

use thiserror::Error;
use uuid::Uuid;

use crate::story::StoryError;
use game_rules::{ConfigError, RulesError};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Story(#[from] StoryError),

    #[error(transparent)]
    Rules(#[from] RulesError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("card '{0}' is not on the table")]
    CardNotFound(String),

    #[error("the player is dead; resurrect before continuing")]
    PlayerDead,

    #[error("game {0} not found")]
    GameNotFound(Uuid),

    #[error("session lock poisoned")]
    LockPoisoned,

    #[error("save format version {0} is newer than this build supports")]
    UnsupportedSave(u32),

    #[error("save data error: {0}")]
    Persistence(#[from] serde_json::Error),
}
