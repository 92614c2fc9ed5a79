//! Shared utility functions for retarget crates

use anyhow::anyhow;
use std::path::PathBuf;

/// Get the user's home directory
///
/// HOME wins over `dirs::home_dir()` so that test harnesses and containers
/// can redirect it.
pub fn get_home_dir() -> anyhow::Result<PathBuf> {
    if let Ok(home) = std::env::var("HOME") {
        return Ok(PathBuf::from(home));
    }

    dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))
}
