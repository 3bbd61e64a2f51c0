//! Post-update maintenance
//!
//! After the manifest is rewritten, the installed tree is rebuilt from
//! scratch: `node_modules/` and `package-lock.json` are removed, then
//! `npm install`, `npm audit fix` and `npm dedup` run in order.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::config::InstallPolicy;
use crate::process::{CommandRunner, CommandSpec, ProcessError};

/// Installed dependency tree, relative to the project directory
pub const MODULES_DIR: &str = "node_modules";

/// Lock file, relative to the project directory
pub const LOCK_FILE: &str = "package-lock.json";

#[derive(Debug, Error)]
pub enum MaintenanceError {
    #[error("Failed to remove {}: {source}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Process(#[from] ProcessError),
}

impl MaintenanceError {
    /// Exit code of the failed command, if any
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            MaintenanceError::Process(e) => e.exit_code(),
            MaintenanceError::Remove { .. } => None,
        }
    }
}

/// How a non-zero exit of a step is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnFailure {
    Abort,
    Warn,
}

impl From<InstallPolicy> for OnFailure {
    fn from(policy: InstallPolicy) -> Self {
        match policy {
            InstallPolicy::Strict => OnFailure::Abort,
            InstallPolicy::Tolerant => OnFailure::Warn,
        }
    }
}

/// Runs the maintenance steps inside a project directory
pub struct Maintenance<'a> {
    runner: &'a dyn CommandRunner,
    project_dir: PathBuf,
    npm: String,
    install: InstallPolicy,
}

impl<'a> Maintenance<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        project_dir: &Path,
        npm: &str,
        install: InstallPolicy,
    ) -> Self {
        Self {
            runner,
            project_dir: project_dir.to_path_buf(),
            npm: npm.to_string(),
            install,
        }
    }

    /// Run every step in order
    pub async fn run(&self) -> Result<(), MaintenanceError> {
        remove_dir_if_exists(&self.project_dir.join(MODULES_DIR)).await?;
        remove_file_if_exists(&self.project_dir.join(LOCK_FILE)).await?;

        info!("Installing modules");
        self.npm_step(&["install"], self.install.into()).await?;

        info!("Fixing audit issues");
        self.npm_step(&["audit", "fix"], OnFailure::Warn).await?;

        info!("Deduplicating dependencies");
        self.npm_step(&["dedup"], OnFailure::Warn).await?;

        Ok(())
    }

    async fn npm_step(&self, args: &[&str], on_failure: OnFailure) -> Result<(), ProcessError> {
        let spec =
            CommandSpec::new(&self.npm, args.iter().copied()).current_dir(&self.project_dir);
        let code = self.runner.status(&spec).await?;

        if code == Some(0) {
            return Ok(());
        }

        let err = ProcessError::Failed {
            command: spec.to_string(),
            code,
        };
        match on_failure {
            OnFailure::Abort => Err(err),
            OnFailure::Warn => {
                warn!("{}, continuing", err);
                Ok(())
            }
        }
    }
}

async fn remove_dir_if_exists(path: &Path) -> Result<(), MaintenanceError> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => {
            info!("Removed {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(MaintenanceError::Remove {
            path: path.to_path_buf(),
            source,
        }),
    }
}

async fn remove_file_if_exists(path: &Path) -> Result<(), MaintenanceError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            info!("Removed {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(MaintenanceError::Remove {
            path: path.to_path_buf(),
            source,
        }),
    }
}
