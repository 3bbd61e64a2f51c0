//! package.json load/update/save
//!
//! The document is kept as a `serde_json` object so fields this tool does not
//! know about survive a rewrite untouched, in their original order.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::manifest::types::{DependencyEntry, DependencyGroup};

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Manifest root must be a JSON object")]
    NotAnObject,

    #[error("`{0}` must be a JSON object")]
    InvalidGroup(DependencyGroup),

    #[error("`{group}` has no dependency named `{name}`")]
    UnknownDependency { group: DependencyGroup, name: String },
}

/// An in-memory package.json
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    root: Map<String, Value>,
}

impl Manifest {
    /// Parse manifest text; the root must be an object and every present
    /// dependency group must be an object too.
    pub fn parse(content: &str) -> Result<Self, ManifestError> {
        let Value::Object(root) = serde_json::from_str::<Value>(content)? else {
            return Err(ManifestError::NotAnObject);
        };

        for group in DependencyGroup::ALL {
            if let Some(value) = root.get(group.as_str())
                && !value.is_object()
            {
                return Err(ManifestError::InvalidGroup(group));
            }
        }

        Ok(Self { root })
    }

    /// Read and parse the manifest at `path`
    pub async fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ManifestError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        debug!("Loaded manifest {}", path.display());

        Self::parse(&content)
    }

    /// Dependencies of `group` in document order.
    ///
    /// A missing group yields no entries. Values that are not strings are
    /// reported with `version: None`.
    pub fn dependencies(&self, group: DependencyGroup) -> Vec<DependencyEntry> {
        let Some(Value::Object(deps)) = self.root.get(group.as_str()) else {
            return Vec::new();
        };

        deps.iter()
            .map(|(name, value)| {
                let version = value.as_str().map(String::from);
                if version.is_none() {
                    debug!("{}: `{}` has a non-string version", group, name);
                }
                DependencyEntry {
                    group,
                    name: name.clone(),
                    version,
                }
            })
            .collect()
    }

    /// Current version string of a dependency, if present and a string
    pub fn version(&self, group: DependencyGroup, name: &str) -> Option<&str> {
        self.root
            .get(group.as_str())
            .and_then(|deps| deps.get(name))
            .and_then(Value::as_str)
    }

    /// Overwrite the version of an existing dependency, keeping its position
    pub fn set_version(
        &mut self,
        group: DependencyGroup,
        name: &str,
        version: &str,
    ) -> Result<(), ManifestError> {
        let slot = self
            .root
            .get_mut(group.as_str())
            .and_then(Value::as_object_mut)
            .and_then(|deps| deps.get_mut(name))
            .ok_or_else(|| ManifestError::UnknownDependency {
                group,
                name: name.to_string(),
            })?;

        *slot = Value::String(version.to_string());
        Ok(())
    }

    /// Pretty-printed JSON (2-space indent) with a trailing newline
    pub fn to_json_string(&self) -> Result<String, ManifestError> {
        let mut text = serde_json::to_string_pretty(&self.root)?;
        text.push('\n');
        Ok(text)
    }

    /// Write the manifest to `path`
    pub async fn save(&self, path: &Path) -> Result<(), ManifestError> {
        let text = self.to_json_string()?;
        tokio::fs::write(path, text)
            .await
            .map_err(|source| ManifestError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        debug!("Wrote manifest {}", path.display());
        Ok(())
    }
}
