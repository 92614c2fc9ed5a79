//! Error types for retarget-engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    /// A discovery or migration is already running on this engine
    #[error("A discovery or migration is already running")]
    Busy,

    /// The framework catalog is empty, so there is nothing to migrate to
    #[error("No frameworks available")]
    NoFrameworks,

    /// Discovery could not read its source
    #[error(transparent)]
    Discovery(#[from] retarget_projects::Error),

    /// The mutation backend failed outside of a per-project write
    #[error(transparent)]
    Mutator(#[from] retarget_mutators::MutationError),
}
