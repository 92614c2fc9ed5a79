//! Host-session backend
//!
//! A host session is a running application that has the solution open and
//! exposes its projects as automation objects. Projects there may still be
//! loading, in which case their properties come back with the wrong type.

use crate::error::{MutationError, Result};
use crate::traits::ProjectMutator;
use async_trait::async_trait;
use camino::Utf8PathBuf;
use retarget_projects::{DescriptorComparison, FrameworkDescriptor, MutationHandle};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Numeric framework id property
pub const TARGET_FRAMEWORK: &str = "TargetFramework";
/// Framework moniker property, e.g. `.NETFramework,Version=v4.8`
pub const TARGET_FRAMEWORK_MONIKER: &str = "TargetFrameworkMoniker";

/// What a session item is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionItemKind {
    Project,
    /// A container whose children are projects or further folders
    SolutionFolder,
    /// Anything else the session lists (solution items, misc files)
    Other,
}

/// One item of a session's solution tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionItem {
    /// Key the session resolves items by
    pub unique_name: String,
    pub name: String,
    /// Full path of the project file, when the item has one
    pub path: Option<Utf8PathBuf>,
    pub kind: SessionItemKind,
    #[serde(default)]
    pub children: Vec<SessionItem>,
}

impl SessionItem {
    pub fn project(
        unique_name: impl Into<String>,
        name: impl Into<String>,
        path: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            unique_name: unique_name.into(),
            name: name.into(),
            path: Some(path.into()),
            kind: SessionItemKind::Project,
            children: Vec::new(),
        }
    }

    pub fn folder(
        unique_name: impl Into<String>,
        name: impl Into<String>,
        children: Vec<SessionItem>,
    ) -> Self {
        Self {
            unique_name: unique_name.into(),
            name: name.into(),
            path: None,
            kind: SessionItemKind::SolutionFolder,
            children,
        }
    }
}

/// A loosely typed property value from a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Integer(i64),
    Text(String),
}

/// Automation surface of a running host application
#[async_trait]
pub trait HostSession: Send + Sync {
    /// Path of the open solution; `None` when nothing is open
    async fn solution_path(&self) -> Result<Option<Utf8PathBuf>>;

    /// Top-level items of the open solution
    async fn items(&self) -> Result<Vec<SessionItem>>;

    /// A property of the item with `unique_name`; `None` when it has no such property
    async fn property(&self, unique_name: &str, property: &str) -> Result<Option<PropertyValue>>;

    async fn set_property(
        &self,
        unique_name: &str,
        property: &str,
        value: PropertyValue,
    ) -> Result<()>;
}

/// Mutator over a [`HostSession`]
///
/// Reads take the id from `TargetFramework` and the name from
/// `TargetFrameworkMoniker`; writes set the moniker.
pub struct SessionMutator {
    session: Arc<dyn HostSession>,
}

impl SessionMutator {
    pub fn new(session: Arc<dyn HostSession>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<dyn HostSession> {
        &self.session
    }

    fn item_key<'a>(&self, handle: &'a MutationHandle) -> Result<&'a str> {
        match handle {
            MutationHandle::SessionItem(key) => Ok(key.as_str()),
            other => Err(MutationError::UnsupportedHandle {
                backend: self.name(),
                handle: other.to_string(),
            }),
        }
    }
}

#[async_trait]
impl ProjectMutator for SessionMutator {
    fn name(&self) -> &'static str {
        "host-session"
    }

    fn comparison(&self) -> DescriptorComparison {
        DescriptorComparison::ById
    }

    async fn read(&self, handle: &MutationHandle) -> Result<Option<FrameworkDescriptor>> {
        let key = self.item_key(handle)?;

        let id = match self.session.property(key, TARGET_FRAMEWORK).await? {
            Some(PropertyValue::Integer(n)) => match u32::try_from(n) {
                Ok(id) => id,
                Err(_) => return Ok(None),
            },
            Some(PropertyValue::Text(_)) => {
                tracing::debug!(project = key, "framework id not available yet");
                return Ok(None);
            }
            None => return Ok(None),
        };

        let name = match self.session.property(key, TARGET_FRAMEWORK_MONIKER).await? {
            Some(PropertyValue::Text(name)) => name,
            _ => return Ok(None),
        };

        Ok(Some(FrameworkDescriptor::from_name(id, name)))
    }

    async fn write(&self, handle: &MutationHandle, target: &FrameworkDescriptor) -> Result<()> {
        let key = self.item_key(handle)?;
        self.session
            .set_property(
                key,
                TARGET_FRAMEWORK_MONIKER,
                PropertyValue::Text(target.name.clone()),
            )
            .await
    }
}
