//! Build and capability report for `retarget version`

use retarget_core::Backend;
use retarget_projects::FrameworkCatalog;
use serde::Serialize;
use std::fmt;

/// What this build is and what it ships with
#[derive(Debug, Clone, Serialize)]
pub struct VersionInfo {
    pub version: String,

    /// Short git SHA, when built from a checkout
    pub commit: Option<String>,

    pub build_date: Option<String>,

    /// Target triple
    pub target: Option<String>,

    /// Backend used when neither config nor flags pick one
    pub default_backend: Backend,

    /// Frameworks in the bundled catalog
    pub frameworks: usize,

    /// Value of the first bundled framework, the default migration target
    pub default_framework: Option<String>,
}

impl VersionInfo {
    pub fn current() -> Self {
        let catalog = FrameworkCatalog::embedded().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "bundled framework catalog unreadable");
            FrameworkCatalog::new(Vec::new())
        });
        Self::build(catalog)
    }

    fn build(catalog: FrameworkCatalog) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            commit: option_env!("GIT_SHA").map(String::from),
            build_date: option_env!("BUILD_DATE").map(String::from),
            target: option_env!("TARGET").map(String::from),
            default_backend: Backend::default(),
            frameworks: catalog.len(),
            default_framework: catalog.default_descriptor().map(|f| f.value.clone()),
        }
    }

    /// One-line catalog summary, e.g. `14 frameworks (default v4.8)`
    pub fn catalog_summary(&self) -> String {
        match &self.default_framework {
            Some(value) => format!("{} frameworks (default {})", self.frameworks, value),
            None => "no frameworks".to_string(),
        }
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "retarget {}", self.version)?;
        if let Some(commit) = &self.commit {
            write!(f, " ({})", commit)?;
        }
        if let Some(target) = &self.target {
            write!(f, " {}", target)?;
        }
        Ok(())
    }
}
