//! The plot graph: a DAG of story beats that fire once their
//! predecessors have fired and their condition holds.

mod dag;
mod view;

pub use dag::*;
pub use view::*;

use game_rules::ConditionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoryError {
    #[error("plot node '{0}' already exists")]
    DuplicateId(String),

    #[error("plot node '{0}' not found")]
    NodeNotFound(String),

    #[error("plot node '{node_id}' has an invalid condition: {source}")]
    InvalidCondition {
        node_id: String,
        #[source]
        source: ConditionError,
    },

    #[error("condition of plot node '{node_id}' could not be evaluated: {source}")]
    Condition {
        node_id: String,
        #[source]
        source: ConditionError,
    },
}

impl StoryError {
    /// True for evaluation failures, which callers treat as "not ready".
    pub fn is_evaluation_failure(&self) -> bool {
        matches!(self, StoryError::Condition { .. })
    }
}
