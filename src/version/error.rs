use thiserror::Error;

use crate::process::ProcessError;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Registry query failed: {0}")]
    Command(#[from] ProcessError),

    #[error("Package not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl RegistryError {
    /// Exit code of the failed registry command, if any
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            RegistryError::Command(e) => e.exit_code(),
            _ => None,
        }
    }
}
