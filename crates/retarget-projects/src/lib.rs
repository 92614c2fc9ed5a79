//! # retarget-projects
//!
//! The project model shared by every retarget backend:
//! - [`FrameworkDescriptor`] and the [`FrameworkCatalog`] of selectable targets
//! - [`SolutionParser`] turning a solution manifest into project paths
//! - [`ProjectRegistry`], the lock-guarded, insertion-ordered project state
//! - [`sort_projects`] / [`find_project`] over registry snapshots
//!
//! ```no_run
//! use retarget_core::CancellationToken;
//! use retarget_projects::{ProjectModel, ProjectRegistry, SolutionParser};
//! use camino::Utf8Path;
//!
//! # async fn example() -> retarget_projects::Result<()> {
//! let refs = SolutionParser::new()
//!     .parse(Utf8Path::new("/src/app/App.sln"), &CancellationToken::new())
//!     .await?;
//!
//! let registry = ProjectRegistry::new();
//! registry.replace_all(refs.into_iter().map(ProjectModel::from_reference));
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod error;
pub mod registry;
pub mod solution;
pub mod types;

pub use catalog::FrameworkCatalog;
pub use error::{Error, Result};
pub use registry::{find_project, sort_projects, ProjectRegistry, SortDirection, SortField};
pub use solution::{resolve_project_path, ProjectReference, SolutionParser};
pub use types::{
    DescriptorComparison, FrameworkDescriptor, MigrationState, MutationHandle, ProjectModel,
};
