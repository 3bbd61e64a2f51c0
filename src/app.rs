//! End-to-end run: config -> manifest -> update -> save -> maintenance

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, DEFAULT_CONFIG_FILE, InstallPolicy, SourceKind, SyncConfig};
use crate::maintenance::{Maintenance, MaintenanceError};
use crate::manifest::{Manifest, ManifestError};
use crate::process::CommandRunner;
use crate::updater::{DependencyReport, Outcome, UpdateError, update_manifest};
use crate::version::error::RegistryError;
use crate::version::registries::{NpmCliRegistry, NpmRegistry};
use crate::version::registry::TagRegistry;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("Failed to set up registry: {0}")]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Update(#[from] UpdateError),

    #[error(transparent)]
    Maintenance(#[from] MaintenanceError),
}

impl AppError {
    /// Exit code of the external command that failed, if any
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            AppError::Update(e) => e.exit_code(),
            AppError::Maintenance(e) => e.exit_code(),
            AppError::Registry(e) => e.exit_code(),
            AppError::Config(_) | AppError::Manifest(_) => None,
        }
    }
}

/// Options for a single run, usually built from the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub manifest_path: PathBuf,
    /// Explicit config file; must exist when given
    pub config_path: Option<PathBuf>,
    pub source: Option<SourceKind>,
    pub registry_url: Option<String>,
    pub tolerate_install_failure: bool,
    /// Resolve and report only
    pub dry_run: bool,
    pub skip_maintenance: bool,
}

impl RunOptions {
    fn project_dir(&self) -> &Path {
        match self.manifest_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    async fn load_config(&self) -> Result<SyncConfig, ConfigError> {
        let mut config = match &self.config_path {
            Some(path) => SyncConfig::load(path).await?,
            None => {
                let path = self.project_dir().join(DEFAULT_CONFIG_FILE);
                SyncConfig::load_or_default(&path).await?
            }
        };

        if let Some(source) = self.source {
            config.source = source;
        }
        if let Some(url) = &self.registry_url {
            config.registry_url = url.clone();
        }
        if self.tolerate_install_failure {
            config.install = InstallPolicy::Tolerant;
        }
        Ok(config)
    }
}

/// Counts of what a run did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub updated: usize,
    pub unchanged: usize,
    pub unresolvable: usize,
    pub skipped: usize,
    /// Whether the manifest was written back
    pub written: bool,
}

impl RunSummary {
    fn from_reports(reports: &[DependencyReport]) -> Self {
        reports
            .iter()
            .fold(Self::default(), |mut summary, report| {
                match report.outcome {
                    Outcome::Updated { .. } => summary.updated += 1,
                    Outcome::Unchanged { .. } => summary.unchanged += 1,
                    Outcome::Unresolvable { .. } => summary.unresolvable += 1,
                    Outcome::Skipped(_) => summary.skipped += 1,
                }
                summary
            })
    }
}

fn build_registry(
    config: &SyncConfig,
    runner: Arc<dyn CommandRunner>,
    project_dir: &Path,
) -> Result<Box<dyn TagRegistry>, RegistryError> {
    let registry: Box<dyn TagRegistry> = match config.source {
        SourceKind::NpmCli => Box::new(NpmCliRegistry::new(runner, &config.npm, project_dir)),
        SourceKind::Registry => Box::new(NpmRegistry::new(&config.registry_url)?),
    };
    Ok(registry)
}

/// Update the manifest and rebuild the dependency tree
pub async fn run(
    options: &RunOptions,
    runner: Arc<dyn CommandRunner>,
) -> Result<RunSummary, AppError> {
    let config = options.load_config().await?;
    let mut manifest = Manifest::load(&options.manifest_path).await?;
    let registry = build_registry(&config, runner.clone(), options.project_dir())?;

    let reports = update_manifest(&mut manifest, registry.as_ref(), &config.overrides).await?;
    let mut summary = RunSummary::from_reports(&reports);
    info!(
        "{} updated, {} unchanged, {} unresolvable, {} skipped",
        summary.updated, summary.unchanged, summary.unresolvable, summary.skipped
    );

    if options.dry_run {
        info!("Dry run: leaving {} untouched", options.manifest_path.display());
        return Ok(summary);
    }

    manifest.save(&options.manifest_path).await?;
    summary.written = true;

    if options.skip_maintenance {
        return Ok(summary);
    }

    Maintenance::new(
        runner.as_ref(),
        options.project_dir(),
        &config.npm,
        config.install,
    )
    .run()
    .await?;

    Ok(summary)
}
