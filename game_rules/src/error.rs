//! Error taxonomy for rule validation.

use thiserror::Error;

use crate::condition::ConditionError;

/// Errors raised while validating or applying game rules.
///
/// Every variant is raised before the blackboard is touched, so a failed
/// call batch leaves the game state unchanged.
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("{call}: missing parameter '{param}'")]
    MissingParam { call: String, param: &'static str },

    #[error("{call}: invalid parameter '{param}': {reason}")]
    InvalidParam {
        call: String,
        param: &'static str,
        reason: String,
    },

    #[error("unknown stat: {0}")]
    UnknownStat(String),

    #[error("unknown tag: {0}")]
    UnknownTag(String),

    #[error("unknown event: {0}")]
    UnknownEvent(String),

    #[error("delta {delta} for stat '{stat}' is outside the allowed range of +/-{max}")]
    DeltaOutOfRange { stat: String, delta: i64, max: i32 },

    #[error("invalid direction: {0}")]
    InvalidDirection(String),

    #[error("invalid condition for '{owner}': {source}")]
    InvalidCondition {
        owner: String,
        #[source]
        source: ConditionError,
    },
}

impl RulesError {
    pub(crate) fn missing(call: &str, param: &'static str) -> Self {
        RulesError::MissingParam {
            call: call.to_string(),
            param,
        }
    }

    pub(crate) fn invalid(call: &str, param: &'static str, reason: impl Into<String>) -> Self {
        RulesError::InvalidParam {
            call: call.to_string(),
            param,
            reason: reason.into(),
        }
    }
}
