//! Framework catalog
//!
//! The catalog is the ordered list of frameworks an operator can migrate to.
//! It ships embedded in the binary and can be replaced by a file with the
//! same shape:
//!
//! ```yaml
//! frameworks:
//!   - id: 262152
//!     name: ".NETFramework,Version=v4.8"
//!   - id: 262663
//!     name: ".NETFramework,Version=v4.7.2"
//!     value: v4.7.2
//! ```
//!
//! Entries without a usable `id` or `name` are skipped. A resource that
//! cannot be read at all yields an empty catalog.

use crate::error::{Error, Result};
use crate::types::FrameworkDescriptor;
use camino::Utf8Path;
use rust_embed::RustEmbed;
use serde_yaml_ng::Value;

#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../embedded/catalog/"]
struct EmbeddedCatalog;

const CATALOG_FILE: &str = "frameworks.yaml";

/// Immutable, ordered set of selectable frameworks
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameworkCatalog {
    descriptors: Vec<FrameworkDescriptor>,
}

impl FrameworkCatalog {
    pub fn new(descriptors: Vec<FrameworkDescriptor>) -> Self {
        Self { descriptors }
    }

    /// Load the catalog, preferring `path` over the embedded resource
    ///
    /// Never fails; an unreadable source is logged and gives an empty catalog.
    pub fn load(path: Option<&Utf8Path>) -> Self {
        let result = match path {
            Some(path) => Self::from_file(path),
            None => Self::embedded(),
        };
        result.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "no frameworks available");
            Self::default()
        })
    }

    /// The catalog compiled into the binary
    pub fn embedded() -> Result<Self> {
        let file = EmbeddedCatalog::get(CATALOG_FILE).ok_or_else(|| Error::CatalogUnavailable {
            path: format!("embedded:{}", CATALOG_FILE),
        })?;
        let content = std::str::from_utf8(&file.data)
            .map_err(|_| Error::catalog_parse("embedded catalog is not valid UTF-8"))?;
        Self::from_yaml_str(content)
    }

    pub fn from_file(path: &Utf8Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            tracing::debug!(path = %path, error = %e, "cannot read catalog");
            Error::CatalogUnavailable {
                path: path.to_string(),
            }
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let doc: Value = serde_yaml_ng::from_str(content)
            .map_err(|e| Error::catalog_parse(e.to_string()))?;

        let entries = doc
            .get("frameworks")
            .and_then(Value::as_sequence)
            .ok_or_else(|| Error::catalog_parse("missing `frameworks` sequence"))?;

        let descriptors = entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                let descriptor = parse_entry(entry);
                if descriptor.is_none() {
                    tracing::warn!(index, "skipping catalog entry without a valid id and name");
                }
                descriptor
            })
            .collect();

        Ok(Self { descriptors })
    }

    pub fn descriptors(&self) -> &[FrameworkDescriptor] {
        &self.descriptors
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrameworkDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// The comparison target assumed before the operator picks one
    pub fn default_descriptor(&self) -> Option<&FrameworkDescriptor> {
        self.descriptors.first()
    }

    /// Look up a descriptor by numeric id, value or name (in that order)
    pub fn find(&self, key: &str) -> Option<&FrameworkDescriptor> {
        let key = key.trim();
        if let Ok(id) = key.parse::<u32>() {
            if let Some(found) = self.descriptors.iter().find(|d| d.id == id) {
                return Some(found);
            }
        }
        self.descriptors
            .iter()
            .find(|d| d.value.eq_ignore_ascii_case(key))
            .or_else(|| {
                self.descriptors
                    .iter()
                    .find(|d| d.name.eq_ignore_ascii_case(key))
            })
    }
}

fn parse_entry(entry: &Value) -> Option<FrameworkDescriptor> {
    let id = match entry.get("id")? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok())?,
        Value::String(s) => s.trim().parse::<u32>().ok()?,
        _ => return None,
    };

    let name = entry.get("name")?.as_str()?.trim();
    if name.is_empty() {
        return None;
    }

    Some(match entry.get("value").and_then(Value::as_str) {
        Some(value) => FrameworkDescriptor::new(id, name, value),
        None => FrameworkDescriptor::from_name(id, name),
    })
}
