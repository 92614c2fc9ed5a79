//! Error types for retarget-projects

use thiserror::Error;

/// Result type alias using retarget-projects's Error type
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The solution manifest could not be read
    #[error("Cannot read solution {path}: {source}")]
    Discovery {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Discovery was cancelled; no partial result exists
    #[error("Discovery cancelled")]
    Cancelled,

    /// The catalog resource is missing or unreadable
    #[error("Framework catalog unavailable: {path}")]
    CatalogUnavailable { path: String },

    /// The catalog document does not have the expected shape
    #[error("Invalid framework catalog: {message}")]
    CatalogParse { message: String },

    /// A project path cannot be made absolute
    #[error("Invalid project path: {path}")]
    InvalidPath { path: String },

    /// Unknown sort or search field
    #[error("Unknown field: {field}. Valid fields: name, path, framework, selected, state")]
    UnknownField { field: String },
}

impl Error {
    pub fn discovery(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Discovery {
            path: path.into(),
            source,
        }
    }

    pub fn catalog_parse(message: impl Into<String>) -> Self {
        Self::CatalogParse {
            message: message.into(),
        }
    }

    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath { path: path.into() }
    }

    /// Check if this error is a cancellation signal rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
