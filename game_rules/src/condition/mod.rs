//! Restricted boolean expression language used by plot nodes and
//! condition events.
//!
//! Expressions are compiled once, ahead of time, against a fixed set of
//! variables (`stats`, `tags`, `events`, `npcs`, `day`, `season`, `year`,
//! `elapsed_days`, `turn`, `life`, `is_alive`). Nothing outside that set
//! is reachable from a condition.

mod context;
mod eval;
mod evaluator;
mod lexer;
mod parser;

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use context::ConditionContext;
pub use evaluator::ConditionEvaluator;

/// Longest accepted condition source, in bytes.
pub const MAX_CONDITION_LEN: usize = 2048;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConditionError {
    #[error("syntax error at {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("condition is {len} bytes long, limit is {limit}")]
    TooLong { len: usize, limit: usize },

    #[error("condition nests deeper than {0} levels")]
    TooDeep(usize),

    #[error("evaluation failed: {0}")]
    Runtime(String),

    #[error("condition produced {0}, expected bool")]
    NotBoolean(String),

    #[error("evaluation did not finish within {0:?}")]
    Timeout(Duration),

    #[error("evaluation aborted: {0}")]
    Aborted(String),
}

impl ConditionError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ConditionError::Timeout(_))
    }
}

/// A compiled condition. Blank source compiles to "always true".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Condition {
    source: String,
    expr: Option<parser::Expr>,
}

impl Condition {
    pub fn compile(source: &str) -> Result<Self, ConditionError> {
        if source.len() > MAX_CONDITION_LEN {
            return Err(ConditionError::TooLong {
                len: source.len(),
                limit: MAX_CONDITION_LEN,
            });
        }
        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Ok(Self::always());
        }
        let tokens = lexer::tokenize(source)?;
        let expr = parser::parse(tokens, source.len())?;
        Ok(Self {
            source: source.to_string(),
            expr: Some(expr),
        })
    }

    /// The condition that holds in every state.
    pub fn always() -> Self {
        Self {
            source: String::new(),
            expr: None,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// True when evaluation needs no work at all.
    pub fn is_trivial(&self) -> bool {
        matches!(
            self.expr,
            None | Some(parser::Expr::Literal(parser::Literal::Bool(_)))
        )
    }

    /// Evaluates inline on the calling thread, with no time bound.
    pub fn evaluate(&self, ctx: &ConditionContext) -> Result<bool, ConditionError> {
        match &self.expr {
            None => Ok(true),
            Some(expr) => eval::evaluate(expr, ctx),
        }
    }
}

impl Default for Condition {
    fn default() -> Self {
        Self::always()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.expr.is_none() {
            f.write_str("<always>")
        } else {
            f.write_str(&self.source)
        }
    }
}

/// Serde adapter for `Arc<Condition>` fields: written as the source
/// string, recompiled when read back.
pub mod shared {
    use std::sync::Arc;

    use serde::{Deserialize, Deserializer, Serializer};

    use super::Condition;

    pub fn serialize<S: Serializer>(condition: &Arc<Condition>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(condition.source())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Arc<Condition>, D::Error> {
        let source = String::deserialize(deserializer)?;
        Condition::compile(&source)
            .map(Arc::new)
            .map_err(serde::de::Error::custom)
    }

    pub fn always() -> Arc<Condition> {
        Arc::new(Condition::always())
    }
}

impl TryFrom<String> for Condition {
    type Error = ConditionError;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        Condition::compile(&source)
    }
}

impl From<Condition> for String {
    fn from(condition: Condition) -> Self {
        condition.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_is_always_true() {
        let ctx = ConditionContext::default();
        for source in ["", "   ", "\n\t"] {
            let condition = Condition::compile(source).unwrap();
            assert!(condition.is_trivial());
            assert!(condition.evaluate(&ctx).unwrap());
        }
    }

    #[test]
    fn test_too_long() {
        let source = format!("day > 0{}", " ".repeat(MAX_CONDITION_LEN));
        assert!(matches!(
            Condition::compile(&source),
            Err(ConditionError::TooLong { .. })
        ));
    }

    #[test]
    fn test_serde_recompiles() {
        let condition = Condition::compile("stats.health > 10").unwrap();
        let json = serde_json::to_string(&condition).unwrap();
        assert_eq!(json, "\"stats.health > 10\"");

        let back: Condition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, condition);

        assert!(serde_json::from_str::<Condition>("\"stats.health >\"").is_err());
    }

    #[test]
    fn test_trivial_literals() {
        assert!(Condition::compile("True").unwrap().is_trivial());
        assert!(!Condition::compile("is_alive").unwrap().is_trivial());
    }
}
