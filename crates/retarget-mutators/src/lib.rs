//! Project mutation backends
//!
//! A [`ProjectMutator`] reads and writes the target framework of a single
//! project. Two backends exist:
//!
//! - [`BuildEngineMutator`] evaluates project files on disk and rewrites them
//! - [`SessionMutator`] drives project objects inside a running [`HostSession`]
//!
//! The backend is picked once per session with [`create_mutator`].

pub mod build_engine;
pub mod error;
pub mod session;
pub mod traits;

pub use build_engine::{BuildEngineMutator, MsBuildProject};
pub use error::{MutationError, TransientOnly};
pub use session::{HostSession, PropertyValue, SessionItem, SessionItemKind, SessionMutator};
pub use traits::ProjectMutator;

use anyhow::{bail, Result};
use retarget_core::Backend;
use std::sync::Arc;

/// Create the mutator for a backend
///
/// The host-session backend needs a live `session`; the build engine ignores it.
pub fn create_mutator(
    backend: Backend,
    session: Option<Arc<dyn HostSession>>,
) -> Result<Arc<dyn ProjectMutator>> {
    match backend {
        Backend::BuildEngine => Ok(Arc::new(BuildEngineMutator::new())),
        Backend::HostSession => match session {
            Some(session) => Ok(Arc::new(SessionMutator::new(session))),
            None => bail!(
                "The {} backend needs a running host session",
                backend.display_name()
            ),
        },
    }
}
