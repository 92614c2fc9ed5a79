//! Delay calculation and retryability predicates

use crate::types::{RetryPolicy, RetryStrategy};
use std::time::Duration;

/// Delay to wait after the given (1-indexed) failed attempt
///
/// ```rust
/// use retarget_core::retry::calculate_delay;
/// use retarget_core::types::RetryPolicy;
///
/// assert_eq!(calculate_delay(&RetryPolicy::default(), 1).as_millis(), 200);
/// ```
pub fn calculate_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    let attempt_index = attempt.saturating_sub(1);

    let delay_ms = match policy.strategy {
        RetryStrategy::None => 0,
        RetryStrategy::FixedDelay => policy.initial_delay_ms,
        RetryStrategy::ExponentialBackoff => {
            let multiplier = policy.backoff_multiplier.powf(attempt_index as f64);
            (policy.initial_delay_ms as f64 * multiplier) as u64
        }
    };

    Duration::from_millis(delay_ms.min(policy.max_delay_ms))
}

/// Decides whether an error is worth another attempt
pub trait RetryPredicate<E: ?Sized>: Send + Sync {
    fn should_retry(&self, error: &E) -> bool;
}

/// Every error is retryable
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRetry;

impl<E: ?Sized> RetryPredicate<E> for AlwaysRetry {
    fn should_retry(&self, _error: &E) -> bool {
        true
    }
}

/// No error is retryable
#[derive(Debug, Clone, Copy)]
pub struct NeverRetry;

impl<E: ?Sized> RetryPredicate<E> for NeverRetry {
    fn should_retry(&self, _error: &E) -> bool {
        false
    }
}

/// Predicate backed by a closure
pub struct ClosurePredicate<F> {
    predicate: F,
}

impl<F> ClosurePredicate<F> {
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<E, F> RetryPredicate<E> for ClosurePredicate<F>
where
    F: Fn(&E) -> bool + Send + Sync,
{
    fn should_retry(&self, error: &E) -> bool {
        (self.predicate)(error)
    }
}
