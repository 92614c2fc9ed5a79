//! # retarget-core
//!
//! Core library for the retarget CLI providing:
//! - Configuration types and the hierarchical loader (retarget.yaml)
//! - A cooperative cancellation token shared between callers and workers
//! - Retry execution engine with policy-based configuration

pub mod cancel;
pub mod config;
pub mod error;
pub mod retry;
pub mod types;
pub mod utils;

pub use cancel::CancellationToken;
pub use config::{Backend, ConfigLoader, MigratorConfig};
pub use error::{Error, Result};
pub use utils::get_home_dir;
