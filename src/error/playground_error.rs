//! Host-level error types.

use thiserror::Error;
use xplayground_types::{RunId, SandboxError};

use super::ConfigError;

/// Host-level errors
#[derive(Debug, Error)]
pub enum PlaygroundError {
    #[error("Sandbox error: {0}")]
    Sandbox(#[from] SandboxError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Run {run_id} did not finish in time")]
    Timeout { run_id: RunId },
    #[error("Playground is shut down")]
    Closed,
}
