//! # Narrative Core
//!
//! The orchestration layer of the card game. This crate drives the rules in
//! `game_rules` week by week, decides when story beats fire, and tells the
//! external card writer what to write next.
//!
//! ## Core Components
//!
//! - **story**: The plot graph (`MacroDAG`) and its read-only views
//! - **engine**: `GameEngine`, the per-game orchestrator and its weekly tick
//! - **jobs**: Card-generation requests queued for the writer
//! - **session**: Lock-guarded sessions and the registry that owns them
//! - **persistence**: JSON save files
//!
//! ## Design Philosophy
//!
//! - **Rules stay in `game_rules`**: this crate never mutates state except
//!   through the blackboard's accessors and the action executor
//! - **Untrusted conditions never block**: they are evaluated on a snapshot,
//!   with a time bound, outside the session lock
//! - **Deterministic order**: whenever several things qualify, the lowest ID wins

pub mod engine;
pub mod error;
pub mod jobs;
pub mod persistence;
pub mod session;
pub mod story;

pub use engine::*;
pub use error::EngineError;
pub use jobs::*;
pub use persistence::*;
pub use session::*;
pub use story::*;
