//! Error types for Playsync core operations.
//!
//! Errors are grouped per domain (file system, downloads, external processes,
//! dependencies) and wrapped by the top-level [`Error`]. Most pipeline steps
//! never surface these to the user directly: they log and fold failures into
//! typed reports. Only configuration and dependency problems are fatal.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Playsync core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// File system operation failed.
    #[error(transparent)]
    FileSystem(#[from] FileSystemError),

    /// Playlist download failed.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// External process could not be run or reported failure.
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// A required external command is missing.
    #[error(transparent)]
    Dependency(#[from] DependencyError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// File system errors, always carrying the offending path.
#[derive(Debug, Error)]
pub enum FileSystemError {
    /// Reading a file or listing a directory failed.
    #[error("Failed to read {path}: {reason}")]
    ReadFailed {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// Writing a file failed.
    #[error("Failed to write {path}: {reason}")]
    WriteFailed {
        /// Path that could not be written.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// Creating a directory failed.
    #[error("Failed to create directory {path}: {reason}")]
    CreateDirFailed {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// Deleting a file failed.
    #[error("Failed to delete {path}: {reason}")]
    DeleteFailed {
        /// Path that could not be deleted.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// Copying a file failed.
    #[error("Failed to copy {from} to {to}: {reason}")]
    CopyFailed {
        /// Source path.
        from: PathBuf,
        /// Destination path.
        to: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// A directory the step depends on does not exist.
    #[error("Directory not found: {path}")]
    DirectoryNotFound {
        /// The missing directory.
        path: PathBuf,
    },

    /// Copied file does not match its source.
    #[error("Checksum mismatch after copying to {path}")]
    ChecksumMismatch {
        /// The destination whose digest differs.
        path: PathBuf,
    },
}

/// Playlist download errors.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The playlist URL was empty.
    #[error("Playlist URL is empty")]
    EmptyUrl,

    /// The downloader ran but reported failure.
    #[error("{reason}")]
    Failed {
        /// Playlist URL.
        url: String,
        /// Downloader diagnostic output.
        reason: String,
    },
}

/// External process errors.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The program could not be started.
    #[error("Failed to execute {program}: {reason}")]
    SpawnFailed {
        /// Program name.
        program: String,
        /// Underlying reason.
        reason: String,
    },

    /// The program exited with a non-zero status.
    #[error("{program} exited with status {code:?}: {stderr}")]
    NonZeroExit {
        /// Program name.
        program: String,
        /// Exit code, if the process was not killed by a signal.
        code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },
}

/// Missing external dependencies.
#[derive(Debug, Error)]
pub enum DependencyError {
    /// A command required by the pipeline is not on `PATH`.
    #[error("{command} is required but not found.")]
    MissingCommand {
        /// The missing command.
        command: String,
    },
}
