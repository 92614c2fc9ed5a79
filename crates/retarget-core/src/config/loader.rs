//! Hierarchical configuration loader with precedence
//!
//! Loads configuration from multiple sources with the following precedence (low to high):
//! 1. Embedded defaults (built into binary)
//! 2. User config (~/.retarget/config.yaml), or an explicit file passed by the caller
//! 3. Environment variables (RETARGET_* prefix)
//! 4. CLI flags (handled by caller)

use super::{Backend, MigratorConfig};
use crate::error::{Error, Result};
use crate::types::RetryStrategy;
use camino::{Utf8Path, Utf8PathBuf};
use rust_embed::RustEmbed;
use serde::Deserialize;
use std::env;
use std::fs;

/// Embedded configuration files
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../embedded/config/"]
#[prefix = ""]
struct EmbeddedConfigs;

const DEFAULTS_FILE: &str = "defaults.yaml";
const USER_CONFIG_FILE: &str = "config.yaml";

/// A config file layer; absent keys leave the lower layer untouched
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ConfigOverlay {
    backend: Option<Backend>,
    retry: Option<RetryOverlay>,
    catalog: Option<Utf8PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RetryOverlay {
    max_attempts: Option<u32>,
    strategy: Option<RetryStrategy>,
    backoff_multiplier: Option<f64>,
    initial_delay_ms: Option<u64>,
    max_delay_ms: Option<u64>,
}

/// Configuration hierarchy loader
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Directory holding the user config file
    config_dir: Option<Utf8PathBuf>,
}

impl ConfigLoader {
    /// Create a loader rooted at ~/.retarget
    ///
    /// A missing home directory is not an error; the user layer is skipped.
    pub fn new() -> Self {
        let config_dir = crate::utils::get_home_dir()
            .ok()
            .and_then(|home| Utf8PathBuf::from_path_buf(home).ok())
            .map(|home| home.join(".retarget"));
        Self { config_dir }
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            config_dir: Some(config_dir.into()),
        }
    }

    /// Path of the user config file, if a config directory is known
    pub fn user_config_path(&self) -> Option<Utf8PathBuf> {
        self.config_dir
            .as_ref()
            .map(|dir| dir.join(USER_CONFIG_FILE))
    }

    /// Load the merged configuration
    ///
    /// When `explicit` is given it replaces the user config file and must exist.
    pub fn load(&self, explicit: Option<&Utf8Path>) -> Result<MigratorConfig> {
        let mut config = Self::load_embedded_defaults()?;

        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::config_not_found(path.as_str()));
                }
                config = Self::apply_overlay(config, Self::load_overlay(path)?);
            }
            None => {
                if let Some(path) = self.user_config_path().filter(|p| p.exists()) {
                    tracing::debug!(path = %path, "loading user config");
                    config = Self::apply_overlay(config, Self::load_overlay(&path)?);
                }
            }
        }

        Self::apply_env_overrides(config)
    }

    /// Load the embedded defaults file
    fn load_embedded_defaults() -> Result<MigratorConfig> {
        let embedded_file = EmbeddedConfigs::get(DEFAULTS_FILE).ok_or_else(|| {
            Error::config_not_found(format!("Embedded config not found: {}", DEFAULTS_FILE))
        })?;

        let content = std::str::from_utf8(&embedded_file.data).map_err(|_| {
            Error::invalid_config(format!("Invalid UTF-8 in embedded config: {}", DEFAULTS_FILE))
        })?;

        serde_yaml_ng::from_str(content).map_err(|e| {
            Error::invalid_config(format!(
                "Failed to parse embedded config {}: {}",
                DEFAULTS_FILE, e
            ))
        })
    }

    fn load_overlay(path: &Utf8Path) -> Result<ConfigOverlay> {
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(ConfigOverlay::default());
        }
        serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))
    }

    /// Merge an overlay into a base config (overlay wins per key)
    fn apply_overlay(mut base: MigratorConfig, overlay: ConfigOverlay) -> MigratorConfig {
        if let Some(backend) = overlay.backend {
            base.backend = backend;
        }
        if let Some(catalog) = overlay.catalog {
            base.catalog = Some(catalog);
        }
        if let Some(retry) = overlay.retry {
            if let Some(v) = retry.max_attempts {
                base.retry.max_attempts = v;
            }
            if let Some(v) = retry.strategy {
                base.retry.strategy = v;
            }
            if let Some(v) = retry.backoff_multiplier {
                base.retry.backoff_multiplier = v;
            }
            if let Some(v) = retry.initial_delay_ms {
                base.retry.initial_delay_ms = v;
            }
            if let Some(v) = retry.max_delay_ms {
                base.retry.max_delay_ms = v;
            }
        }
        base
    }

    /// Apply RETARGET_* environment variable overrides
    fn apply_env_overrides(mut config: MigratorConfig) -> Result<MigratorConfig> {
        if let Ok(val) = env::var("RETARGET_BACKEND") {
            config.backend = val.parse()?;
        }

        if let Ok(val) = env::var("RETARGET_RETRY_ATTEMPTS") {
            config.retry.max_attempts = val.parse().map_err(|_| {
                Error::invalid_config("RETARGET_RETRY_ATTEMPTS must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("RETARGET_RETRY_DELAY_MS") {
            config.retry.initial_delay_ms = val.parse().map_err(|_| {
                Error::invalid_config("RETARGET_RETRY_DELAY_MS must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("RETARGET_CATALOG") {
            if !val.trim().is_empty() {
                config.catalog = Some(Utf8PathBuf::from(val));
            }
        }

        if config.retry.max_attempts == 0 {
            return Err(Error::invalid_config("retry max-attempts must be at least 1"));
        }

        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
