//! Command runner test utilities

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use dist_tag_sync::process::{CommandOutput, CommandRunner, CommandSpec, ProcessError};

/// Fake npm: answers `dist-tags` queries from canned listings and records
/// every command it is asked to run
#[derive(Default)]
pub struct FakeRunner {
    listings: HashMap<String, String>,
    exit_codes: HashMap<String, i32>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `npm dist-tags <package>` with one `tag: version` line per pair
    pub fn with_tags(mut self, package: &str, tags: &[(&str, &str)]) -> Self {
        let listing = tags
            .iter()
            .map(|(tag, version)| format!("{tag}: {version}\n"))
            .collect();
        self.listings.insert(package.to_string(), listing);
        self
    }

    /// Make the command whose arguments join to `args` exit with `code`
    pub fn with_exit_code(mut self, args: &str, code: i32) -> Self {
        self.exit_codes.insert(args.to_string(), code);
        self
    }

    /// Command lines run so far, e.g. `npm dist-tags react`
    pub fn command_lines(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|spec| spec.to_string())
            .collect()
    }

    /// Working directories of the commands run so far
    pub fn working_dirs(&self) -> Vec<Option<PathBuf>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|spec| spec.cwd.clone())
            .collect()
    }

    fn record(&self, spec: &CommandSpec) -> i32 {
        self.calls.lock().unwrap().push(spec.clone());
        *self.exit_codes.get(&spec.args.join(" ")).unwrap_or(&0)
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn output(&self, spec: &CommandSpec) -> Result<CommandOutput, ProcessError> {
        let code = self.record(spec);

        let listing = match spec.args.as_slice() {
            [cmd, package] if cmd == "dist-tags" => self.listings.get(package).cloned(),
            _ => None,
        };

        Ok(match listing {
            Some(stdout) if code == 0 => CommandOutput {
                code: Some(0),
                stdout,
                stderr: String::new(),
            },
            _ => CommandOutput {
                code: Some(if code == 0 { 1 } else { code }),
                stdout: String::new(),
                stderr: "npm error code E404".to_string(),
            },
        })
    }

    async fn status(&self, spec: &CommandSpec) -> Result<Option<i32>, ProcessError> {
        Ok(Some(self.record(spec)))
    }
}

/// Write `content` as package.json inside `dir` and return its path
pub fn write_manifest(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("package.json");
    std::fs::write(&path, content).unwrap();
    path
}
