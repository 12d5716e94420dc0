//! # Game Rules
//!
//! The "World Bible" crate - game state, the rules that mutate it, and the
//! restricted condition language used by the story graph and events.
//! This crate is the single source of truth for game state and does not
//! contain any AI logic.

pub mod cards;
pub mod condition;
pub mod config;
pub mod death;
pub mod entities;
pub mod error;
pub mod events;
pub mod mechanics;
pub mod schema;
pub mod world_state;

pub use cards::*;
pub use condition::{Condition, ConditionContext, ConditionError, ConditionEvaluator};
pub use config::{ConfigError, GameConfig};
pub use death::*;
pub use entities::*;
pub use error::RulesError;
pub use events::*;
pub use mechanics::*;
pub use schema::*;
pub use world_state::*;
