//! Error returned when a retried operation does not succeed

use std::error::Error;
use std::fmt;
use std::time::Duration;

/// Why a retried operation gave up
///
/// Generic over `E`, the error type of the operation being retried.
#[derive(Debug)]
pub enum RetryError<E> {
    /// Every allowed attempt failed with a retryable error
    Exhausted {
        /// Number of attempts made
        attempts: u32,
        /// The error from the final attempt
        source: E,
        /// Wall time spent across all attempts and delays
        total_duration: Duration,
    },

    /// Cancellation was observed before the next attempt could start
    Cancelled {
        /// Attempts completed before cancellation
        attempts: u32,
        /// The error from the last completed attempt, if any
        last_error: Option<E>,
    },

    /// The predicate classified the error as permanent
    NonRetryable {
        /// Attempt that produced the error
        attempt: u32,
        /// The error itself
        source: E,
    },
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Exhausted {
                attempts,
                source,
                total_duration,
            } => write!(
                f,
                "gave up after {} attempts over {}ms: {}",
                attempts,
                total_duration.as_millis(),
                source
            ),
            RetryError::Cancelled {
                attempts,
                last_error: Some(err),
            } => write!(f, "cancelled after {} attempts: {}", attempts, err),
            RetryError::Cancelled { attempts, .. } => {
                write!(f, "cancelled after {} attempts", attempts)
            }
            RetryError::NonRetryable { source, .. } => write!(f, "{}", source),
        }
    }
}

impl<E: Error + 'static> Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source_ref().map(|e| e as &(dyn Error + 'static))
    }
}

impl<E> RetryError<E> {
    /// Number of attempts that actually ran
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. } | RetryError::Cancelled { attempts, .. } => {
                *attempts
            }
            RetryError::NonRetryable { attempt, .. } => *attempt,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RetryError::Cancelled { .. })
    }

    pub fn is_non_retryable(&self) -> bool {
        matches!(self, RetryError::NonRetryable { .. })
    }

    /// The underlying operation error, consuming this error
    pub fn into_source(self) -> Option<E> {
        match self {
            RetryError::Exhausted { source, .. } | RetryError::NonRetryable { source, .. } => {
                Some(source)
            }
            RetryError::Cancelled { last_error, .. } => last_error,
        }
    }

    pub fn source_ref(&self) -> Option<&E> {
        match self {
            RetryError::Exhausted { source, .. } | RetryError::NonRetryable { source, .. } => {
                Some(source)
            }
            RetryError::Cancelled { last_error, .. } => last_error.as_ref(),
        }
    }
}
