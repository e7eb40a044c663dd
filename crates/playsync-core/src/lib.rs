//! `Playsync` Core Library
//!
//! This crate provides the core functionality for `Playsync`, a tool that
//! keeps a phone's music folder in step with a set of `YouTube` playlists:
//! - Concurrent playlist downloading through `yt-dlp`
//! - Cover-art embedding through `ffmpeg`
//! - Syncing finished files into the device music folder
//! - Cleanup of intermediate files left in the download directory
//! - Application configuration management
//!
//! External programs are always run through the [`CommandRunner`] trait, so
//! every pipeline step can be exercised without the real tools installed.
//!
//! # Error Handling
//!
//! Errors are typed per domain. See the [`error`] module for details.
//!
//! ```rust,ignore
//! use playsync_core::{AppConfig, Result};
//!
//! fn load() -> Result<AppConfig> {
//!     let config = AppConfig::load()?;
//!     config.ensure_directories()?;
//!     Ok(config)
//! }
//! ```

pub mod cleanup;
pub mod config;
pub mod dependencies;
pub mod error;
pub mod integrity;
pub mod library;
pub mod media_scan;
pub mod naming;
pub mod notify;
pub mod process;
pub mod queue;
pub mod sync;
pub mod thumbnail;
pub mod youtube;

#[cfg(test)]
mod test_support;

pub use cleanup::{CleanupReport, embed_default_thumbnails, remove_temp_files, run_cleanup};
pub use config::{
    AppConfig, DEFAULT_MAX_CONCURRENT_DOWNLOADS, DEFAULT_TEMP_MARKER, MAX_CONCURRENT_DOWNLOADS,
    MIN_CONCURRENT_DOWNLOADS, ToolConfig, default_base_directory, default_music_directory,
};
pub use dependencies::{ensure_command_exists, verify_dependencies};
pub use error::{
    DependencyError, DownloadError, Error, FileSystemError, ProcessError, Result,
};
pub use integrity::{HASH_CHUNK_SIZE, file_hash, verify_copy};
pub use library::{AudioFile, collect_audio_files, list_files};
pub use media_scan::{MEDIA_SCAN_ACTION, MediaScanner};
pub use naming::{OUTPUT_TEMPLATE, TempNaming, output_template, sanitize_filename};
pub use notify::{Notifier, WakeLockGuard};
pub use process::{CommandOutput, CommandRunner, SystemCommandRunner};
pub use queue::{BATCH_COMPLETED_CONTENT, FetchOrchestrator};
pub use sync::{SyncReport, sync_music};
pub use thumbnail::{EmbedOutcome, ThumbnailEmbedder};
pub use youtube::{
    DOWNLOADS_COMPLETED_TITLE, FetchOutcome, FetchReport, PlaylistFetcher, YtDlpFetcher,
    run_fetch_task,
};
