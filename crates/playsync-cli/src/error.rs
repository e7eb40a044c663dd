//! Errors surfaced by the command line front end.

use thiserror::Error;

use crate::logging::LoggingError;

/// Result type alias for command line operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that end a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Error from the core library.
    #[error(transparent)]
    Core(#[from] playsync_core::Error),

    /// Logging could not be set up.
    #[error(transparent)]
    Logging(#[from] LoggingError),

    /// A background task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Reading the menu input or writing its output failed.
    #[error("Terminal IO error: {0}")]
    Io(#[from] std::io::Error),
}
