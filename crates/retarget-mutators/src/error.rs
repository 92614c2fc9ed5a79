//! Error types for retarget-mutators

use retarget_core::retry::RetryPredicate;
use std::io::ErrorKind;
use thiserror::Error;

/// Result type alias using MutationError
pub type Result<T> = std::result::Result<T, MutationError>;

/// Why a project could not be read or written
#[derive(Error, Debug)]
pub enum MutationError {
    /// The backend is briefly unavailable; the same call may succeed later
    #[error("{message}")]
    Transient { message: String },

    /// The project has no target framework property
    #[error("{property} does not apply to {project}")]
    PropertyNotApplicable { project: String, property: String },

    /// The project file cannot be understood
    #[error("Malformed project {path}: {message}")]
    MalformedProject { path: String, message: String },

    /// The handle addresses a resource this backend cannot reach
    #[error("The {backend} backend cannot use handle {handle}")]
    UnsupportedHandle {
        backend: &'static str,
        handle: String,
    },

    /// The host session rejected the call
    #[error("Host session error: {0}")]
    Session(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MutationError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    pub fn not_applicable(project: impl Into<String>, property: impl Into<String>) -> Self {
        Self::PropertyNotApplicable {
            project: project.into(),
            property: property.into(),
        }
    }

    pub fn malformed(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedProject {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Worth retrying: explicit transient errors and contended I/O
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transient { .. } => true,
            Self::Io(e) => matches!(
                e.kind(),
                ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
            ),
            _ => false,
        }
    }
}

/// Retry predicate that only retries transient mutation errors
#[derive(Debug, Clone, Copy, Default)]
pub struct TransientOnly;

impl RetryPredicate<MutationError> for TransientOnly {
    fn should_retry(&self, error: &MutationError) -> bool {
        error.is_transient()
    }
}
