//! Configuration for a retarget session

mod loader;

pub use loader::ConfigLoader;

use crate::error::{Error, Result};
use crate::types::RetryPolicy;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which mutation backend a session talks to
///
/// Chosen once per session; the engine never branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// Evaluate and rewrite project files on disk
    #[default]
    BuildEngine,
    /// Drive project objects inside a running host application
    HostSession,
}

impl Backend {
    /// All backends, in the order they are offered to an operator
    pub fn all() -> [Self; 2] {
        [Self::BuildEngine, Self::HostSession]
    }

    /// Kebab-case identifier used in config files and flags
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BuildEngine => "build-engine",
            Self::HostSession => "host-session",
        }
    }

    /// Operator-facing name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::BuildEngine => "Build Engine",
            Self::HostSession => "Host Session",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim();
        Self::all()
            .into_iter()
            .find(|b| {
                b.as_str().eq_ignore_ascii_case(needle)
                    || b.display_name().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| {
                Error::invalid_config(format!(
                    "Unknown backend: {}. Valid backends: {}",
                    s,
                    Self::all()
                        .iter()
                        .map(|b| b.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}

/// Resolved configuration for one retarget session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct MigratorConfig {
    /// Mutation backend
    #[serde(default)]
    pub backend: Backend,

    /// Retry policy applied to every project write
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Alternative framework catalog file; the embedded catalog is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<Utf8PathBuf>,
}
