//! Core types for the project model

use crate::solution::ProjectReference;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Delimiter between the framework family and its version in a descriptor name
const NAME_VALUE_DELIMITER: char = '=';

/// A selectable target framework
///
/// `value` is what the build engine writes into a project; `id` is what a
/// host session reports. Which of the two identifies a descriptor depends on
/// the backend, see [`DescriptorComparison`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameworkDescriptor {
    pub id: u32,
    pub name: String,
    pub value: String,
}

impl FrameworkDescriptor {
    pub fn new(id: u32, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            value: value.into(),
        }
    }

    /// Build a descriptor whose value is derived from its name
    ///
    /// Falls back to the whole name when it does not split into exactly two
    /// segments.
    pub fn from_name(id: u32, name: impl Into<String>) -> Self {
        let name = name.into();
        let value = Self::derive_value(&name).unwrap_or_else(|| name.clone());
        Self { id, name, value }
    }

    /// `.NETFramework,Version=v4.5` -> `v4.5`
    pub fn derive_value(name: &str) -> Option<String> {
        let mut parts = name.split(NAME_VALUE_DELIMITER);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(_), Some(value), None) => Some(value.to_string()),
            _ => None,
        }
    }
}

impl fmt::Display for FrameworkDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl PartialOrd for FrameworkDescriptor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ordinal by name; id and value only break ties
impl Ord for FrameworkDescriptor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then(self.id.cmp(&other.id))
            .then_with(|| self.value.cmp(&other.value))
    }
}

/// How two descriptors are judged to name the same framework
///
/// A host session only reports numeric ids reliably, while the build engine
/// only sees the version string it reads from the project file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DescriptorComparison {
    ById,
    ByValue,
}

impl DescriptorComparison {
    pub fn matches(&self, a: &FrameworkDescriptor, b: &FrameworkDescriptor) -> bool {
        match self {
            Self::ById => a.id == b.id,
            Self::ByValue => a.value == b.value,
        }
    }
}

/// Outcome of migrating one project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MigrationState {
    /// Not written in this session (or differs from the chosen target)
    #[default]
    NotAttempted,
    Succeeded,
    Failed,
}

impl MigrationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotAttempted => "not-attempted",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    /// Seed state from a comparison against the chosen target
    pub fn seeded(matches_target: bool) -> Self {
        if matches_target {
            Self::Succeeded
        } else {
            Self::NotAttempted
        }
    }
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend-specific address of the underlying project resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "kebab-case")]
pub enum MutationHandle {
    /// A project file evaluated and rewritten on disk
    ProjectFile(Utf8PathBuf),
    /// A project object inside a host session, by its unique name
    SessionItem(String),
}

impl fmt::Display for MutationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProjectFile(path) => write!(f, "{}", path),
            Self::SessionItem(key) => write!(f, "session:{}", key),
        }
    }
}

/// State of one project in the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectModel {
    /// Absolute project file path; the registry key
    pub path: Utf8PathBuf,
    pub name: String,
    /// `None` means the current framework could not be determined
    pub framework: Option<FrameworkDescriptor>,
    pub selected: bool,
    pub state: MigrationState,
    pub handle: MutationHandle,
}

impl ProjectModel {
    /// A project addressed through its file, name taken from the path
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: name_from_path(&path),
            handle: MutationHandle::ProjectFile(path.clone()),
            path,
            framework: None,
            selected: false,
            state: MigrationState::NotAttempted,
        }
    }

    pub fn from_reference(reference: ProjectReference) -> Self {
        Self::new(reference.path)
    }

    pub fn with_handle(mut self, handle: MutationHandle) -> Self {
        self.handle = handle;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_framework(mut self, framework: Option<FrameworkDescriptor>) -> Self {
        self.framework = framework;
        self
    }

    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    pub fn with_state(mut self, state: MigrationState) -> Self {
        self.state = state;
        self
    }

    /// Selected and with a known framework
    pub fn is_eligible(&self) -> bool {
        self.selected && self.framework.is_some()
    }
}

/// File name without extension, accepting both `/` and `\` separators
fn name_from_path(path: &Utf8Path) -> String {
    let file = path
        .as_str()
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => file.to_string(),
    }
}
