//! Common test helpers for retarget-engine integration tests
//!
//! - `ScriptedMutator`: a `ProjectMutator` whose reads and writes follow a
//!   per-project script, with a log of every call
//! - `Recorder`: an `EngineObserver` that keeps every event in order
//! - `StaticSession`: a `HostSession` over a fixed solution tree
//! - solution and project file fixtures on disk

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use retarget_core::CancellationToken;
use retarget_engine::{EngineEvent, EngineObserver};
use retarget_mutators::{
    HostSession, MutationError, ProjectMutator, PropertyValue, SessionItem,
};
use retarget_projects::{
    DescriptorComparison, FrameworkDescriptor, MutationHandle, ProjectModel,
};
use std::collections::HashMap;
use std::sync::Mutex;
use tempfile::TempDir;

// ─── Catalog fixtures ────────────────────────────────────────────────────────

#[allow(dead_code)]
pub fn v48() -> FrameworkDescriptor {
    FrameworkDescriptor::from_name(262152, ".NETFramework,Version=v4.8")
}

#[allow(dead_code)]
pub fn v45() -> FrameworkDescriptor {
    FrameworkDescriptor::from_name(262149, ".NETFramework,Version=v4.5")
}

/// Selected projects under `/work` with a known framework
#[allow(dead_code)]
pub fn selected_projects(names: &[&str]) -> Vec<ProjectModel> {
    names
        .iter()
        .map(|name| {
            ProjectModel::new(format!("/work/{0}/{0}.csproj", name))
                .with_framework(Some(v45()))
                .with_selected(true)
        })
        .collect()
}

// ─── Scripted mutator ────────────────────────────────────────────────────────

/// How writes to one project behave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
pub enum Script {
    Succeed,
    /// Fail transiently this many times, then succeed
    BusyFor(u32),
    /// Fail with a permanent error every time
    Broken,
}

#[derive(Default)]
pub struct ScriptedMutator {
    frameworks: HashMap<String, FrameworkDescriptor>,
    unreadable: Vec<String>,
    scripts: Mutex<HashMap<String, Script>>,
    cancel_after: Option<(CancellationToken, usize)>,
    writes: Mutex<Vec<String>>,
    persisted: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl ScriptedMutator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_framework(mut self, key: &str, framework: FrameworkDescriptor) -> Self {
        self.frameworks.insert(key.to_string(), framework);
        self
    }

    pub fn with_unreadable(mut self, key: &str) -> Self {
        self.unreadable.push(key.to_string());
        self
    }

    pub fn with_script(self, key: &str, script: Script) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(key.to_string(), script);
        self
    }

    /// Cancel `token` once `writes` writes have succeeded
    pub fn cancel_after(mut self, token: CancellationToken, writes: usize) -> Self {
        self.cancel_after = Some((token, writes));
        self
    }

    /// Every write attempt, successful or not, by handle key
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    pub fn persisted(&self) -> Vec<String> {
        self.persisted.lock().unwrap().clone()
    }

    fn key(handle: &MutationHandle) -> String {
        match handle {
            MutationHandle::ProjectFile(path) => path.to_string(),
            MutationHandle::SessionItem(key) => key.clone(),
        }
    }
}

#[async_trait]
impl ProjectMutator for ScriptedMutator {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn comparison(&self) -> DescriptorComparison {
        DescriptorComparison::ByValue
    }

    async fn read(
        &self,
        handle: &MutationHandle,
    ) -> Result<Option<FrameworkDescriptor>, MutationError> {
        let key = Self::key(handle);
        if self.unreadable.contains(&key) {
            return Err(MutationError::malformed(key.as_str(), "unreadable"));
        }
        Ok(self.frameworks.get(&key).cloned())
    }

    async fn write(
        &self,
        handle: &MutationHandle,
        _target: &FrameworkDescriptor,
    ) -> Result<(), MutationError> {
        let key = Self::key(handle);
        self.writes.lock().unwrap().push(key.clone());

        let outcome = {
            let mut scripts = self.scripts.lock().unwrap();
            match scripts.get_mut(&key) {
                Some(Script::BusyFor(remaining)) if *remaining > 0 => {
                    *remaining -= 1;
                    Err(MutationError::transient("Project is busy"))
                }
                Some(Script::Broken) => Err(MutationError::not_applicable(
                    key.as_str(),
                    "TargetFrameworkVersion",
                )),
                _ => Ok(()),
            }
        };

        if outcome.is_ok() {
            if let Some((token, after)) = &self.cancel_after {
                let succeeded = self.persisted.lock().unwrap().len() + 1;
                if succeeded >= *after {
                    token.cancel();
                }
            }
        }
        outcome
    }

    async fn persist(&self, handle: &MutationHandle) -> Result<(), MutationError> {
        self.persisted.lock().unwrap().push(Self::key(handle));
        Ok(())
    }
}

// ─── Recording observer ──────────────────────────────────────────────────────

#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<EngineEvent>>,
}

#[allow(dead_code)]
impl Recorder {
    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                EngineEvent::StateChanged { status } => Some(status),
                _ => None,
            })
            .collect()
    }

    pub fn log_lines(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                EngineEvent::LogLine { line } => Some(line),
                _ => None,
            })
            .collect()
    }

    pub fn updates(&self) -> Vec<ProjectModel> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                EngineEvent::ProjectUpdated { project } => Some(project),
                _ => None,
            })
            .collect()
    }

    pub fn discoveries(&self) -> Vec<Vec<ProjectModel>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                EngineEvent::ProjectsDiscovered { projects } => Some(projects),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl EngineObserver for Recorder {
    fn on_projects_discovered(&self, projects: &[ProjectModel]) {
        self.push(EngineEvent::ProjectsDiscovered {
            projects: projects.to_vec(),
        });
    }

    fn on_project_updated(&self, project: &ProjectModel) {
        self.push(EngineEvent::ProjectUpdated {
            project: project.clone(),
        });
    }

    fn on_state_changed(&self, status: &str) {
        self.push(EngineEvent::StateChanged {
            status: status.to_string(),
        });
    }

    fn on_log_line(&self, line: &str) {
        self.push(EngineEvent::LogLine {
            line: line.to_string(),
        });
    }
}

// ─── Host session mock ───────────────────────────────────────────────────────

#[derive(Default)]
pub struct StaticSession {
    pub solution: Option<Utf8PathBuf>,
    pub items: Vec<SessionItem>,
    /// When set, listing items fails with this message
    pub items_error: Option<String>,
    properties: Mutex<HashMap<(String, String), PropertyValue>>,
}

#[allow(dead_code)]
impl StaticSession {
    pub fn new(items: Vec<SessionItem>) -> Self {
        Self {
            solution: Some("/work/App.sln".into()),
            items,
            ..Self::default()
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// A session whose solution is open but whose item tree cannot be listed
    pub fn failing(message: &str) -> Self {
        Self {
            solution: Some("/work/App.sln".into()),
            items_error: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Give `item` a framework id and moniker
    pub fn with_framework(self, item: &str, framework: &FrameworkDescriptor) -> Self {
        {
            let mut properties = self.properties.lock().unwrap();
            properties.insert(
                (item.to_string(), "TargetFramework".to_string()),
                PropertyValue::Integer(i64::from(framework.id)),
            );
            properties.insert(
                (item.to_string(), "TargetFrameworkMoniker".to_string()),
                PropertyValue::Text(framework.name.clone()),
            );
        }
        self
    }

    pub fn value(&self, item: &str, property: &str) -> Option<PropertyValue> {
        self.properties
            .lock()
            .unwrap()
            .get(&(item.to_string(), property.to_string()))
            .cloned()
    }
}

#[async_trait]
impl HostSession for StaticSession {
    async fn solution_path(&self) -> Result<Option<Utf8PathBuf>, MutationError> {
        Ok(self.solution.clone())
    }

    async fn items(&self) -> Result<Vec<SessionItem>, MutationError> {
        match &self.items_error {
            Some(message) => Err(MutationError::Session(message.clone())),
            None => Ok(self.items.clone()),
        }
    }

    async fn property(
        &self,
        unique_name: &str,
        property: &str,
    ) -> Result<Option<PropertyValue>, MutationError> {
        Ok(self.value(unique_name, property))
    }

    async fn set_property(
        &self,
        unique_name: &str,
        property: &str,
        value: PropertyValue,
    ) -> Result<(), MutationError> {
        self.properties
            .lock()
            .unwrap()
            .insert((unique_name.to_string(), property.to_string()), value);
        Ok(())
    }
}

// ─── Files on disk ───────────────────────────────────────────────────────────

#[allow(dead_code)]
pub fn legacy_project(version: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<Project ToolsVersion="15.0" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <PropertyGroup>
    <OutputType>Library</OutputType>
    <TargetFrameworkVersion>{}</TargetFrameworkVersion>
  </PropertyGroup>
</Project>
"#,
        version
    )
}

#[allow(dead_code)]
pub const SDK_PROJECT: &str = r#"<Project Sdk="Microsoft.NET.Sdk">
  <PropertyGroup>
    <TargetFramework>net8.0</TargetFramework>
  </PropertyGroup>
</Project>
"#;

#[allow(dead_code)]
pub fn root(dir: &TempDir) -> &Utf8Path {
    Utf8Path::from_path(dir.path()).unwrap()
}

#[allow(dead_code)]
pub fn write_file(dir: &TempDir, relative: &str, content: &str) -> Utf8PathBuf {
    let path = root(dir).join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

/// A solution manifest listing `projects` as (name, relative path)
#[allow(dead_code)]
pub fn solution(projects: &[(&str, &str)]) -> String {
    let mut text = String::from("Microsoft Visual Studio Solution File, Format Version 12.00\n");
    for (index, (name, path)) in projects.iter().enumerate() {
        text.push_str(&format!(
            "Project(\"{{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}}\") = \"{}\", \"{}\", \"{{00000000-0000-0000-0000-{:012}}}\"\nEndProject\n",
            name, path, index
        ));
    }
    text.push_str("Global\nEndGlobal\n");
    text
}
