//! Mutator trait definitions

use crate::error::Result;
use async_trait::async_trait;
use retarget_projects::{DescriptorComparison, FrameworkDescriptor, MutationHandle};

/// Reads and writes the target framework of one project
///
/// Implementations are free to cache per-handle state between `read`,
/// `write` and `persist`, but must tolerate calls for handles they have
/// never seen.
#[async_trait]
pub trait ProjectMutator: Send + Sync {
    /// Backend name used in logs and errors
    fn name(&self) -> &'static str;

    /// How descriptors produced by this backend are compared
    fn comparison(&self) -> DescriptorComparison;

    /// Current framework of a project
    ///
    /// `Ok(None)` means the project has no framework property, or its value
    /// is not available yet.
    async fn read(&self, handle: &MutationHandle) -> Result<Option<FrameworkDescriptor>>;

    /// Set the framework of a project to `target`
    async fn write(&self, handle: &MutationHandle, target: &FrameworkDescriptor) -> Result<()>;

    /// Make a previous `write` durable
    async fn persist(&self, handle: &MutationHandle) -> Result<()> {
        let _ = handle;
        Ok(())
    }
}
