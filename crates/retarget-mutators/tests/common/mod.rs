//! Common test helpers for retarget-mutators integration tests
//!
//! - `InMemorySession`: a `HostSession` backed by a property map, with
//!   scripted busy failures and a log of every write
//! - project file fixtures on disk

use async_trait::async_trait;
use camino::Utf8PathBuf;
use retarget_mutators::{HostSession, MutationError, PropertyValue, SessionItem};
use std::collections::HashMap;
use std::sync::Mutex;
use tempfile::TempDir;

// ─── Host session mock ───────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemorySession {
    pub solution: Option<Utf8PathBuf>,
    pub items: Vec<SessionItem>,
    properties: Mutex<HashMap<(String, String), PropertyValue>>,
    busy_writes: Mutex<u32>,
    writes: Mutex<Vec<(String, String, PropertyValue)>>,
}

#[allow(dead_code)]
impl InMemorySession {
    pub fn new(items: Vec<SessionItem>) -> Self {
        Self {
            solution: Some("/work/App.sln".into()),
            items,
            ..Self::default()
        }
    }

    pub fn with_property(self, item: &str, property: &str, value: PropertyValue) -> Self {
        self.properties
            .lock()
            .unwrap()
            .insert((item.to_string(), property.to_string()), value);
        self
    }

    /// The next `count` writes fail with a transient error
    pub fn fail_next_writes(&self, count: u32) {
        *self.busy_writes.lock().unwrap() = count;
    }

    pub fn writes(&self) -> Vec<(String, String, PropertyValue)> {
        self.writes.lock().unwrap().clone()
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
impl HostSession for InMemorySession {
    async fn solution_path(&self) -> Result<Option<Utf8PathBuf>, MutationError> {
        Ok(self.solution.clone())
    }

    async fn items(&self) -> Result<Vec<SessionItem>, MutationError> {
        Ok(self.items.clone())
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
        {
            let mut busy = self.busy_writes.lock().unwrap();
            if *busy > 0 {
                *busy -= 1;
                return Err(MutationError::transient("The application is busy"));
            }
        }
        self.writes.lock().unwrap().push((
            unique_name.to_string(),
            property.to_string(),
            value.clone(),
        ));
        self.properties
            .lock()
            .unwrap()
            .insert((unique_name.to_string(), property.to_string()), value);
        Ok(())
    }
}

// ─── Project file fixtures ───────────────────────────────────────────────────

#[allow(dead_code)]
pub fn legacy_project(version: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<Project ToolsVersion="15.0" DefaultTargets="Build" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <PropertyGroup>
    <Configuration Condition=" '$(Configuration)' == '' ">Debug</Configuration>
    <OutputType>Library</OutputType>
    <TargetFrameworkVersion>{}</TargetFrameworkVersion>
  </PropertyGroup>
  <ItemGroup>
    <Compile Include="Class1.cs" />
  </ItemGroup>
</Project>
"#,
        version
    )
}

/// An SDK-style project without `TargetFrameworkVersion`
#[allow(dead_code)]
pub const SDK_PROJECT: &str = r#"<Project Sdk="Microsoft.NET.Sdk">
  <PropertyGroup>
    <TargetFramework>net8.0</TargetFramework>
  </PropertyGroup>
</Project>
"#;

#[allow(dead_code)]
pub fn write_project(dir: &TempDir, relative: &str, content: &str) -> Utf8PathBuf {
    let path = Utf8PathBuf::from_path_buf(dir.path().join(relative)).unwrap();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}
