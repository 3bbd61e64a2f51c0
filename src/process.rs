//! External command execution
//!
//! Every shell-out (registry queries, npm install/audit/dedup) goes through
//! [`CommandRunner`] so the update and maintenance logic can be driven by a
//! mock in tests.

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;

#[cfg(test)]
use mockall::automock;

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {}", describe_exit(.code))]
    Failed { command: String, code: Option<i32> },
}

impl ProcessError {
    /// Exit code of the failed command, if it exited normally
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ProcessError::Failed { code, .. } => *code,
            ProcessError::Spawn { .. } => None,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {code}"),
        None => "a signal".to_string(),
    }
}

/// A command line to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory; inherits the current one when `None`
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
        }
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Whether this spec runs `program` with exactly `args`
    pub fn is(&self, program: &str, args: &[&str]) -> bool {
        self.program == program && self.args.iter().map(String::as_str).eq(args.iter().copied())
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Convert a non-zero exit into [`ProcessError::Failed`]
    pub fn check(self, spec: &CommandSpec) -> Result<Self, ProcessError> {
        if self.success() {
            Ok(self)
        } else {
            Err(ProcessError::Failed {
                command: spec.to_string(),
                code: self.code,
            })
        }
    }
}

/// Capability to run external commands
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the command with captured stdout/stderr.
    ///
    /// A non-zero exit is not an error here; only failing to start is.
    async fn output(&self, spec: &CommandSpec) -> Result<CommandOutput, ProcessError>;

    /// Run the command with inherited stdio and return its exit code
    /// (`None` when killed by a signal).
    async fn status(&self, spec: &CommandSpec) -> Result<Option<i32>, ProcessError>;
}

/// [`CommandRunner`] backed by `tokio::process`
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioCommandRunner;

impl TokioCommandRunner {
    fn command(spec: &CommandSpec) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&spec.program);
        cmd.args(&spec.args);
        if let Some(dir) = &spec.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }

    fn spawn_error(spec: &CommandSpec, source: std::io::Error) -> ProcessError {
        ProcessError::Spawn {
            program: spec.program.clone(),
            source,
        }
    }
}

#[async_trait::async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn output(&self, spec: &CommandSpec) -> Result<CommandOutput, ProcessError> {
        debug!("Running (captured): {}", spec);
        let output = Self::command(spec)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| Self::spawn_error(spec, e))?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn status(&self, spec: &CommandSpec) -> Result<Option<i32>, ProcessError> {
        debug!("Running: {}", spec);
        let status = Self::command(spec)
            .status()
            .await
            .map_err(|e| Self::spawn_error(spec, e))?;

        Ok(status.code())
    }
}
