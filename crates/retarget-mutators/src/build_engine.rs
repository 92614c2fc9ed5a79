//! Build-engine backend
//!
//! Evaluates project files straight from disk. The current framework is the
//! `TargetFrameworkVersion` property; writing sets that property and
//! `persist` saves the file.

use crate::error::{MutationError, Result};
use crate::traits::ProjectMutator;
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use parking_lot::Mutex;
use regex::Regex;
use retarget_projects::{DescriptorComparison, FrameworkDescriptor, MutationHandle};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Property holding the target framework version of a project file
pub const TARGET_FRAMEWORK_VERSION: &str = "TargetFrameworkVersion";

/// A project file held in memory
///
/// Property lookup is textual: the first `<Name>value</Name>` element wins,
/// whatever its condition.
#[derive(Debug, Clone)]
pub struct MsBuildProject {
    path: Utf8PathBuf,
    content: String,
    dirty: bool,
}

impl MsBuildProject {
    pub async fn load(path: &Utf8Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_content(path, content)
    }

    pub fn from_content(path: impl Into<Utf8PathBuf>, content: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let content = content.into();
        if !content.contains("<Project") {
            return Err(MutationError::malformed(
                path.as_str(),
                "no <Project> root element",
            ));
        }
        Ok(Self {
            path,
            content,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Has an unsaved `set_property`
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn property(&self, name: &str) -> Option<String> {
        let caps = property_regex(name)?.captures(&self.content)?;
        Some(unescape(caps.get(2)?.as_str().trim()))
    }

    /// Replace the value of an existing property
    pub fn set_property(&mut self, name: &str, value: &str) -> Result<()> {
        let not_applicable = || MutationError::not_applicable(self.path.as_str(), name);
        let re = property_regex(name).ok_or_else(not_applicable)?;
        let range = re
            .captures(&self.content)
            .and_then(|caps| caps.get(2))
            .map(|m| m.range())
            .ok_or_else(not_applicable)?;

        self.content.replace_range(range, &escape(value));
        self.dirty = true;
        Ok(())
    }

    pub async fn save(&mut self) -> Result<()> {
        tokio::fs::write(&self.path, &self.content).await?;
        self.dirty = false;
        Ok(())
    }
}

static TARGET_FRAMEWORK_VERSION_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&property_pattern(TARGET_FRAMEWORK_VERSION))
        .expect("framework property regex is valid")
});

fn property_pattern(name: &str) -> String {
    format!(r"<{0}(\s[^>]*)?>([^<]*)</{0}\s*>", regex::escape(name))
}

/// Element matcher for `name`; the framework property is compiled once
fn property_regex(name: &str) -> Option<Cow<'static, Regex>> {
    if name == TARGET_FRAMEWORK_VERSION {
        return Some(Cow::Borrowed(&*TARGET_FRAMEWORK_VERSION_ELEMENT));
    }
    Regex::new(&property_pattern(name)).ok().map(Cow::Owned)
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn unescape(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Mutator over project files on disk
#[derive(Debug, Default)]
pub struct BuildEngineMutator {
    /// Projects with pending writes, by path
    pending: Mutex<HashMap<Utf8PathBuf, MsBuildProject>>,
}

impl BuildEngineMutator {
    pub fn new() -> Self {
        Self::default()
    }

    fn project_path<'a>(&self, handle: &'a MutationHandle) -> Result<&'a Utf8Path> {
        match handle {
            MutationHandle::ProjectFile(path) => Ok(path.as_path()),
            other => Err(MutationError::UnsupportedHandle {
                backend: self.name(),
                handle: other.to_string(),
            }),
        }
    }

    /// Display name for a version read from a project file
    pub fn descriptor_name(value: &str) -> String {
        format!(".Net Framework, {} : [{}]", TARGET_FRAMEWORK_VERSION, value)
    }
}

#[async_trait]
impl ProjectMutator for BuildEngineMutator {
    fn name(&self) -> &'static str {
        "build-engine"
    }

    fn comparison(&self) -> DescriptorComparison {
        DescriptorComparison::ByValue
    }

    async fn read(&self, handle: &MutationHandle) -> Result<Option<FrameworkDescriptor>> {
        let path = self.project_path(handle)?;
        let project = MsBuildProject::load(path).await?;

        Ok(project.property(TARGET_FRAMEWORK_VERSION).map(|value| {
            FrameworkDescriptor::new(0, Self::descriptor_name(&value), value)
        }))
    }

    async fn write(&self, handle: &MutationHandle, target: &FrameworkDescriptor) -> Result<()> {
        let path = self.project_path(handle)?;

        let cached = self.pending.lock().remove(path);
        let mut project = match cached {
            Some(project) => project,
            None => MsBuildProject::load(path).await?,
        };

        project.set_property(TARGET_FRAMEWORK_VERSION, &target.value)?;
        tracing::debug!(project = %path, value = %target.value, "property set");
        self.pending.lock().insert(path.to_path_buf(), project);
        Ok(())
    }

    async fn persist(&self, handle: &MutationHandle) -> Result<()> {
        let path = self.project_path(handle)?;

        let Some(mut project) = self.pending.lock().remove(path) else {
            return Ok(());
        };

        if let Err(e) = project.save().await {
            self.pending.lock().insert(path.to_path_buf(), project);
            return Err(e);
        }
        tracing::debug!(project = %path, "project saved");
        Ok(())
    }
}
