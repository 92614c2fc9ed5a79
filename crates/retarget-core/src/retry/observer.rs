//! Hooks for watching a retry loop

use std::fmt::Display;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Receives callbacks while [`SimpleRetryExecutor`](super::SimpleRetryExecutor) runs
///
/// Every method defaults to doing nothing.
pub trait RetryObserver: Send + Sync {
    /// An attempt (1-indexed) is about to run
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        let _ = (attempt, max_attempts);
    }

    /// An attempt failed with a retryable error and another one follows after `delay`
    fn on_attempt_failed(&self, attempt: u32, error: &dyn Display, delay: Duration) {
        let _ = (attempt, error, delay);
    }

    fn on_success(&self, attempt: u32, elapsed: Duration) {
        let _ = (attempt, elapsed);
    }

    /// The final allowed attempt failed
    fn on_exhausted(&self, attempts: u32, error: &dyn Display) {
        let _ = (attempts, error);
    }

    /// The predicate refused to retry this error
    fn on_rejected(&self, attempt: u32, error: &dyn Display) {
        let _ = (attempt, error);
    }

    /// Cancellation stopped the loop before the next attempt
    fn on_cancelled(&self, attempts: u32) {
        let _ = attempts;
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl RetryObserver for NoOpObserver {}

/// Logs retry events through `tracing`
///
/// Attempt starts and first-try successes log at DEBUG, retries and
/// cancellation at WARN, and giving up at ERROR.
#[derive(Debug, Clone)]
pub struct TracingObserver {
    operation: String,
}

impl TracingObserver {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
        }
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new("retry")
    }
}

impl RetryObserver for TracingObserver {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        tracing::debug!(operation = %self.operation, attempt, max_attempts, "starting attempt");
    }

    fn on_attempt_failed(&self, attempt: u32, error: &dyn Display, delay: Duration) {
        tracing::warn!(
            operation = %self.operation,
            attempt,
            error = %error,
            delay_ms = delay.as_millis() as u64,
            "attempt failed, will retry"
        );
    }

    fn on_success(&self, attempt: u32, elapsed: Duration) {
        if attempt > 1 {
            tracing::info!(
                operation = %self.operation,
                attempt,
                elapsed_ms = elapsed.as_millis() as u64,
                "succeeded after retry"
            );
        } else {
            tracing::debug!(operation = %self.operation, "succeeded on first attempt");
        }
    }

    fn on_exhausted(&self, attempts: u32, error: &dyn Display) {
        tracing::error!(operation = %self.operation, attempts, error = %error, "all attempts failed");
    }

    fn on_rejected(&self, attempt: u32, error: &dyn Display) {
        tracing::error!(operation = %self.operation, attempt, error = %error, "error is not retryable");
    }

    fn on_cancelled(&self, attempts: u32) {
        tracing::warn!(operation = %self.operation, attempts, "retry cancelled");
    }
}

/// Counts retry events; handy in tests
#[derive(Debug, Default)]
pub struct StatsObserver {
    attempt_starts: AtomicU32,
    failures: AtomicU32,
    successes: AtomicU32,
    exhaustions: AtomicU32,
    rejections: AtomicU32,
    cancellations: AtomicU32,
}

impl StatsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempt_starts(&self) -> u32 {
        self.attempt_starts.load(Ordering::SeqCst)
    }

    pub fn failures(&self) -> u32 {
        self.failures.load(Ordering::SeqCst)
    }

    pub fn successes(&self) -> u32 {
        self.successes.load(Ordering::SeqCst)
    }

    pub fn exhaustions(&self) -> u32 {
        self.exhaustions.load(Ordering::SeqCst)
    }

    pub fn rejections(&self) -> u32 {
        self.rejections.load(Ordering::SeqCst)
    }

    pub fn cancellations(&self) -> u32 {
        self.cancellations.load(Ordering::SeqCst)
    }
}

impl RetryObserver for StatsObserver {
    fn on_attempt_start(&self, _attempt: u32, _max_attempts: u32) {
        self.attempt_starts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_attempt_failed(&self, _attempt: u32, _error: &dyn Display, _delay: Duration) {
        self.failures.fetch_add(1, Ordering::SeqCst);
    }

    fn on_success(&self, _attempt: u32, _elapsed: Duration) {
        self.successes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_exhausted(&self, _attempts: u32, _error: &dyn Display) {
        self.exhaustions.fetch_add(1, Ordering::SeqCst);
    }

    fn on_rejected(&self, _attempt: u32, _error: &dyn Display) {
        self.rejections.fetch_add(1, Ordering::SeqCst);
    }

    fn on_cancelled(&self, _attempts: u32) {
        self.cancellations.fetch_add(1, Ordering::SeqCst);
    }
}

impl<T: RetryObserver + ?Sized> RetryObserver for Arc<T> {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        (**self).on_attempt_start(attempt, max_attempts)
    }

    fn on_attempt_failed(&self, attempt: u32, error: &dyn Display, delay: Duration) {
        (**self).on_attempt_failed(attempt, error, delay)
    }

    fn on_success(&self, attempt: u32, elapsed: Duration) {
        (**self).on_success(attempt, elapsed)
    }

    fn on_exhausted(&self, attempts: u32, error: &dyn Display) {
        (**self).on_exhausted(attempts, error)
    }

    fn on_rejected(&self, attempt: u32, error: &dyn Display) {
        (**self).on_rejected(attempt, error)
    }

    fn on_cancelled(&self, attempts: u32) {
        (**self).on_cancelled(attempts)
    }
}
