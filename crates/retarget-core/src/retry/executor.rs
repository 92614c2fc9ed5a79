//! The retry loop

use std::fmt::Display;
use std::future::Future;
use std::marker::PhantomData;
use std::time::Instant;

use crate::cancel::CancellationToken;
use crate::types::RetryPolicy;

use super::error::RetryError;
use super::observer::{NoOpObserver, RetryObserver};
use super::strategies::{calculate_delay, AlwaysRetry, RetryPredicate};

/// Runs an async operation until it succeeds, fails permanently, runs out of
/// attempts, or is cancelled
///
/// A policy with `max_attempts == 0` still runs the operation once.
pub struct SimpleRetryExecutor<E, P = AlwaysRetry, O = NoOpObserver> {
    policy: RetryPolicy,
    predicate: P,
    observer: O,
    cancel: Option<CancellationToken>,
    _phantom: PhantomData<fn() -> E>,
}

impl<E> SimpleRetryExecutor<E, AlwaysRetry, NoOpObserver> {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            predicate: AlwaysRetry,
            observer: NoOpObserver,
            cancel: None,
            _phantom: PhantomData,
        }
    }
}

impl<E, P, O> SimpleRetryExecutor<E, P, O> {
    pub fn with_predicate<P2>(self, predicate: P2) -> SimpleRetryExecutor<E, P2, O> {
        SimpleRetryExecutor {
            policy: self.policy,
            predicate,
            observer: self.observer,
            cancel: self.cancel,
            _phantom: PhantomData,
        }
    }

    pub fn with_observer<O2>(self, observer: O2) -> SimpleRetryExecutor<E, P, O2> {
        SimpleRetryExecutor {
            policy: self.policy,
            predicate: self.predicate,
            observer,
            cancel: self.cancel,
            _phantom: PhantomData,
        }
    }

    /// Check `token` before every attempt, including the first
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }
}

impl<E, P, O> SimpleRetryExecutor<E, P, O>
where
    E: Display,
    P: RetryPredicate<E>,
    O: RetryObserver,
{
    pub async fn execute<F, Fut, T>(&self, mut op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let start = Instant::now();
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error: Option<E> = None;
        let mut attempt = 0;

        loop {
            attempt += 1;

            if self.is_cancelled() {
                let attempts = attempt - 1;
                self.observer.on_cancelled(attempts);
                return Err(RetryError::Cancelled {
                    attempts,
                    last_error,
                });
            }

            self.observer.on_attempt_start(attempt, max_attempts);

            let err = match op().await {
                Ok(value) => {
                    self.observer.on_success(attempt, start.elapsed());
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !self.predicate.should_retry(&err) {
                self.observer.on_rejected(attempt, &err);
                return Err(RetryError::NonRetryable {
                    attempt,
                    source: err,
                });
            }

            if attempt == max_attempts {
                self.observer.on_exhausted(attempt, &err);
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    source: err,
                    total_duration: start.elapsed(),
                });
            }

            let delay = calculate_delay(&self.policy, attempt);
            self.observer.on_attempt_failed(attempt, &err, delay);
            last_error = Some(err);

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}
