//! Engine configuration, loaded from TOML.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading a [`GameConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Tunables for one game session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Cards held by the weekly deck before common cards are evicted.
    pub deck_capacity: usize,

    /// Wall-clock budget for a single condition evaluation, in milliseconds.
    pub condition_timeout_ms: u64,

    /// Maximum number of tags carried into the next life.
    pub karma_cap: usize,

    /// Largest absolute delta a single `update_stat` call may apply.
    pub max_stat_delta: i32,

    /// Value every stat is reset to on resurrection.
    pub resurrection_stat: i32,

    /// Starting value for stats the world schema leaves unset.
    pub default_stat: i32,

    /// Reject tags that are not declared by the world schema.
    pub strict_tags: bool,

    /// How deep phase-end callbacks may trigger further callbacks.
    pub max_call_depth: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            deck_capacity: 7,
            condition_timeout_ms: 100,
            karma_cap: 10,
            max_stat_delta: 50,
            resurrection_stat: 50,
            default_stat: 50,
            strict_tags: false,
            max_call_depth: 4,
        }
    }
}

impl GameConfig {
    /// Parse a configuration from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn condition_timeout(&self) -> Duration {
        Duration::from_millis(self.condition_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deck_capacity == 0 {
            return Err(ConfigError::Invalid("deck_capacity must be at least 1".into()));
        }
        if self.condition_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "condition_timeout_ms must be at least 1".into(),
            ));
        }
        if !(1..=100).contains(&self.max_stat_delta) {
            return Err(ConfigError::Invalid(
                "max_stat_delta must be between 1 and 100".into(),
            ));
        }
        if !(1..=99).contains(&self.resurrection_stat) || !(1..=99).contains(&self.default_stat) {
            return Err(ConfigError::Invalid(
                "resurrection_stat and default_stat must be non-lethal (1..=99)".into(),
            ));
        }
        Ok(())
    }
}
