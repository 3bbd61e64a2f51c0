use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::version::registries::npm::DEFAULT_BASE_URL;
use crate::version::registries::npm_cli::DEFAULT_NPM_PROGRAM;
use crate::version::resolver::LATEST_TAG;

/// Config file looked up next to the manifest when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "dist-tag-sync.json";

/// Manifest updated when `--manifest` is not given
pub const DEFAULT_MANIFEST_FILE: &str = "package.json";

/// Environment variable holding a `tracing` filter directive
pub const LOG_ENV_VAR: &str = "DIST_TAG_SYNC_LOG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Tool configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncConfig {
    /// Preferred dist-tag per dependency
    pub overrides: Overrides,
    /// How a failing `npm install` is treated
    pub install: InstallPolicy,
    /// Where dist-tags are fetched from
    pub source: SourceKind,
    /// Base URL used by [`SourceKind::Registry`]
    pub registry_url: String,
    /// Package manager executable
    pub npm: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            overrides: Overrides::default(),
            install: InstallPolicy::default(),
            source: SourceKind::default(),
            registry_url: DEFAULT_BASE_URL.to_string(),
            npm: DEFAULT_NPM_PROGRAM.to_string(),
        }
    }
}

impl SyncConfig {
    /// Parse the config file at `path`
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Like [`SyncConfig::load`], but a missing file yields the defaults
    pub async fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path).await {
            Err(ConfigError::Io { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            result => result,
        }
    }
}

/// Dependency name -> preferred dist-tag. Unlisted dependencies use `latest`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Overrides(IndexMap<String, String>);

impl Overrides {
    /// Tag to resolve for `package_name`
    pub fn tag_for(&self, package_name: &str) -> &str {
        self.0
            .get(package_name)
            .map(String::as_str)
            .unwrap_or(LATEST_TAG)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Overrides {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Failure policy for `npm install`
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InstallPolicy {
    /// A failing install aborts the run
    #[default]
    Strict,
    /// A failing install is logged and the run continues
    Tolerant,
}

/// Source of dist-tag listings
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// `npm dist-tags <package>`
    #[default]
    NpmCli,
    /// npm registry HTTP API
    Registry,
}

/// Returns the path to the data directory for dist-tag-sync.
/// Uses $XDG_DATA_HOME/dist-tag-sync if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/dist-tag-sync,
/// or ./dist-tag-sync if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the directory log files are written to.
pub fn log_dir() -> PathBuf {
    data_dir().join("logs")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("dist-tag-sync")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn sync_config_from_partial_object_uses_defaults_for_missing_fields() {
        let result = serde_json::from_value::<SyncConfig>(json!({
            "install": "tolerant"
        }))
        .unwrap();

        assert_eq!(result.install, InstallPolicy::Tolerant);
        assert_eq!(result.overrides, Overrides::default());
        assert_eq!(result.source, SourceKind::NpmCli);
        assert_eq!(result.registry_url, DEFAULT_BASE_URL);
        assert_eq!(result.npm, "npm");
    }

    #[test]
    fn sync_config_from_full_object_parses_all_fields() {
        let result = serde_json::from_value::<SyncConfig>(json!({
            "overrides": { "typescript": "beta", "react": "canary" },
            "install": "strict",
            "source": "registry",
            "registryUrl": "https://npm.example.com",
            "npm": "/usr/local/bin/npm"
        }))
        .unwrap();

        assert_eq!(
            result,
            SyncConfig {
                overrides: [("typescript", "beta"), ("react", "canary")]
                    .into_iter()
                    .collect(),
                install: InstallPolicy::Strict,
                source: SourceKind::Registry,
                registry_url: "https://npm.example.com".to_string(),
                npm: "/usr/local/bin/npm".to_string(),
            }
        );
    }

    #[test]
    fn sync_config_rejects_unknown_install_policy() {
        let result = serde_json::from_value::<SyncConfig>(json!({ "install": "sometimes" }));
        assert!(result.is_err());
    }

    #[test]
    fn overrides_default_to_latest_tag() {
        let overrides: Overrides = [("typescript", "beta")].into_iter().collect();

        assert_eq!(overrides.tag_for("typescript"), "beta");
        assert_eq!(overrides.tag_for("react"), "latest");
        assert_eq!(Overrides::default().tag_for("anything"), "latest");
    }

    #[tokio::test]
    async fn load_or_default_returns_defaults_for_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(DEFAULT_CONFIG_FILE);

        let result = SyncConfig::load_or_default(&path).await.unwrap();

        assert_eq!(result, SyncConfig::default());
    }

    #[tokio::test]
    async fn load_or_default_reports_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "{ overrides: }").unwrap();

        let result = SyncConfig::load_or_default(&path).await;

        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[tokio::test]
    async fn load_reads_overrides_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, r#"{"overrides": {"vite": "next"}}"#).unwrap();

        let result = SyncConfig::load(&path).await.unwrap();

        assert_eq!(result.overrides.tag_for("vite"), "next");
    }

    #[test]
    fn data_dir_with_env_uses_xdg_data_home_when_set() {
        let path = data_dir_with_env(
            Some("/tmp/test-data".to_string()),
            Some(PathBuf::from("/home/user")),
        );

        assert_eq!(path, PathBuf::from("/tmp/test-data/dist-tag-sync"));
    }

    #[test]
    fn data_dir_with_env_falls_back_to_home_local_share() {
        let path = data_dir_with_env(None, Some(PathBuf::from("/home/user")));

        assert_eq!(path, PathBuf::from("/home/user/.local/share/dist-tag-sync"));
    }

    #[test]
    fn data_dir_with_env_falls_back_to_current_dir_when_no_dirs_available() {
        let path = data_dir_with_env(None, None);
        assert_eq!(path, PathBuf::from("./dist-tag-sync"));
    }
}
