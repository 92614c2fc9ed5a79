//! Retry execution for project writes
//!
//! A write against a project backend may fail because the backend is briefly
//! busy. [`SimpleRetryExecutor`] re-runs such an operation according to a
//! [`RetryPolicy`](crate::types::RetryPolicy), consulting a [`RetryPredicate`]
//! to tell transient failures from permanent ones and a
//! [`CancellationToken`](crate::CancellationToken) before every attempt.
//!
//! ```rust,no_run
//! use retarget_core::retry::{RetryError, SimpleRetryExecutor, TracingObserver};
//! use retarget_core::types::RetryPolicy;
//!
//! async fn example() -> Result<(), RetryError<std::io::Error>> {
//!     SimpleRetryExecutor::new(RetryPolicy::default())
//!         .with_observer(TracingObserver::new("write"))
//!         .execute(|| async { Ok(()) })
//!         .await
//! }
//! ```

mod error;
mod executor;
mod observer;
mod strategies;

pub use error::RetryError;
pub use executor::SimpleRetryExecutor;
pub use observer::{NoOpObserver, RetryObserver, StatsObserver, TracingObserver};
pub use strategies::{calculate_delay, AlwaysRetry, ClosurePredicate, NeverRetry, RetryPredicate};
