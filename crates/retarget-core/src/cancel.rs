//! Cooperative cancellation signal.
//!
//! A token is created per unit of work (one discovery pass or one migration
//! batch). The caller keeps a clone and calls [`CancellationToken::cancel`];
//! the worker polls [`CancellationToken::is_cancelled`] at its checkpoints and
//! unwinds on its own. Nothing is ever interrupted mid-write.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag checked by workers between units of work.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
