use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::{Condition, ConditionContext, ConditionError};

/// Runs conditions with a wall-clock bound.
///
/// Each non-trivial evaluation runs on its own short-lived thread. When
/// the bound expires the caller gets [`ConditionError::Timeout`] and the
/// thread is left to finish on its own: its result is discarded and it
/// holds no locks, only the shared snapshot.
#[derive(Debug, Clone, Copy)]
pub struct ConditionEvaluator {
    timeout: Duration,
}

impl ConditionEvaluator {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(100);

    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn evaluate(
        &self,
        condition: &Arc<Condition>,
        ctx: &Arc<ConditionContext>,
    ) -> Result<bool, ConditionError> {
        if condition.is_trivial() {
            return condition.evaluate(ctx);
        }
        let condition = Arc::clone(condition);
        let ctx = Arc::clone(ctx);
        self.run(move || condition.evaluate(&ctx))
    }

    fn run<F>(&self, work: F) -> Result<bool, ConditionError>
    where
        F: FnOnce() -> Result<bool, ConditionError> + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(1);
        thread::Builder::new()
            .name("condition-eval".into())
            .spawn(move || {
                // The receiver is gone once the caller has timed out.
                let _ = tx.send(work());
            })
            .map_err(|e| ConditionError::Aborted(e.to_string()))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(ConditionError::Timeout(self.timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(ConditionError::Aborted(
                "evaluation thread panicked".into(),
            )),
        }
    }
}

impl Default for ConditionEvaluator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluates_within_bound() {
        let evaluator = ConditionEvaluator::default();
        let ctx = Arc::new(ConditionContext::default().with_stat("health", 5));

        let low = Arc::new(Condition::compile("stats.health < 10").unwrap());
        let high = Arc::new(Condition::compile("stats.health > 10").unwrap());
        assert!(evaluator.evaluate(&low, &ctx).unwrap());
        assert!(!evaluator.evaluate(&high, &ctx).unwrap());
    }

    #[test]
    fn test_errors_are_propagated() {
        let evaluator = ConditionEvaluator::default();
        let ctx = Arc::new(ConditionContext::default());
        let missing = Arc::new(Condition::compile("stats.health < 10").unwrap());
        assert!(matches!(
            evaluator.evaluate(&missing, &ctx),
            Err(ConditionError::Runtime(_))
        ));
    }

    #[test]
    fn test_timeout_is_distinct_from_false() {
        let evaluator = ConditionEvaluator::new(Duration::from_millis(20));
        let result = evaluator.run(|| {
            thread::sleep(Duration::from_millis(500));
            Ok(true)
        });
        let err = result.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err, ConditionError::Timeout(Duration::from_millis(20)));
    }

    #[test]
    fn test_panicking_work_is_aborted() {
        let evaluator = ConditionEvaluator::default();
        let result = evaluator.run(|| panic!("boom"));
        assert!(matches!(result, Err(ConditionError::Aborted(_))));
    }
}
