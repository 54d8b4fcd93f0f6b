//! Process-layer error type.

use thiserror::Error;

/// Errors surfaced while constructing or driving a [`crate::process::ProcessRunner`].
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The OS refused to create the child process.
    #[error("failed to spawn process: {0}")]
    SpawnFailed(#[from] std::io::Error),

    /// The executable descriptor could not be turned into a runnable command.
    #[error("executable descriptor is invalid: {0}")]
    UnsupportedExecutable(String),

    /// A `FunctionExec` named a target with no registered implementation.
    #[error("no function registered for target '{0}'")]
    UnknownFunction(String),
}
