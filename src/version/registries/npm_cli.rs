//! `npm dist-tags` command implementation

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;

use crate::process::{CommandRunner, CommandSpec};
use crate::version::error::RegistryError;
use crate::version::registry::TagRegistry;

/// Default package manager executable
pub const DEFAULT_NPM_PROGRAM: &str = "npm";

/// Registry implementation that shells out to `npm dist-tags <package>`
///
/// Queries run inside the project directory so its `.npmrc` applies.
pub struct NpmCliRegistry {
    runner: Arc<dyn CommandRunner>,
    program: String,
    project_dir: PathBuf,
}

impl NpmCliRegistry {
    pub fn new(runner: Arc<dyn CommandRunner>, program: &str, project_dir: &Path) -> Self {
        Self {
            runner,
            program: program.to_string(),
            project_dir: project_dir.to_path_buf(),
        }
    }

    fn command(&self, package_name: &str) -> CommandSpec {
        CommandSpec::new(&self.program, ["dist-tags", package_name])
            .current_dir(&self.project_dir)
    }
}

#[async_trait::async_trait]
impl TagRegistry for NpmCliRegistry {
    fn name(&self) -> &'static str {
        "npm-cli"
    }

    async fn fetch_dist_tags(&self, package_name: &str) -> Result<String, RegistryError> {
        let spec = self.command(package_name);
        let output = self.runner.output(&spec).await?;

        if !output.success() {
            warn!(
                "`{}` failed: {}",
                spec,
                output.stderr.lines().next().unwrap_or_default()
            );
        }

        Ok(output.check(&spec)?.stdout)
    }
}
