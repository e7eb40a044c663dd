//! Copying finished downloads into the device music folder.
//!
//! Every audio file gets the default cover art embedded in place before it
//! is copied. Copies overwrite existing files of the same name and keep the
//! source timestamps. The download directory is never emptied: the archive
//! file, not the directory contents, decides what gets downloaded again.

use std::fs;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::error::{FileSystemError, Result};
use crate::integrity::verify_copy;
use crate::library::{audio_files_in, list_files};
use crate::media_scan::MediaScanner;
use crate::naming::TempNaming;
use crate::thumbnail::ThumbnailEmbedder;

/// Result of a sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// The music directory did not exist, so nothing was touched.
    pub music_dir_missing: bool,
    /// Number of files found in the download directory.
    pub files_scanned: usize,
    /// Destination paths of the files copied.
    pub copied: Vec<PathBuf>,
    /// Source files that could not be synced, with the reason.
    pub failed: Vec<(PathBuf, String)>,
    /// Number of copies the media scanner accepted.
    pub media_scans: usize,
}

impl SyncReport {
    /// Number of files copied.
    #[must_use]
    pub fn copied_count(&self) -> usize {
        self.copied.len()
    }

    /// Whether every audio file was synced.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !self.music_dir_missing && self.failed.is_empty()
    }
}

/// Copy every downloaded audio file to the music directory.
///
/// A missing music directory is reported, not returned as an error. Files
/// that fail individually are logged and listed in [`SyncReport::failed`].
///
/// # Errors
///
/// Returns an error if the download directory cannot be listed.
pub fn sync_music(
    config: &AppConfig,
    embedder: &ThumbnailEmbedder,
    scanner: Option<&MediaScanner>,
) -> Result<SyncReport> {
    info!(
        "Starting sync: {} → {}",
        config.download_dir.display(),
        config.music_dir.display()
    );

    let mut report = SyncReport::default();

    if !config.music_dir.is_dir() {
        error!("Music directory not found: {}", config.music_dir.display());
        report.music_dir_missing = true;
        return Ok(report);
    }

    let files = list_files(&config.download_dir)?;
    report.files_scanned = files.len();
    info!("Found {} total files in {}", files.len(), config.download_dir.display());

    let temp = TempNaming::new(&config.temp_marker, &config.audio_format)?;
    let audio_files = audio_files_in(&files, &config.audio_format, &config.thumbnail_format, &temp);
    if audio_files.is_empty() {
        warn!("No matching audio files found! Check filename formats.");
        info!("No new music to sync.");
        return Ok(report);
    }

    for audio in audio_files {
        match sync_file(config, embedder, &audio.path) {
            Ok(destination) => {
                info!("Copied: {} → {}", audio.path.display(), destination.display());
                if let Some(scanner) = scanner
                    && scanner.trigger(&destination)
                {
                    report.media_scans += 1;
                }
                report.copied.push(destination);
            }
            Err(e) => {
                error!("Failed to sync {}: {}", audio.path.display(), e);
                report.failed.push((audio.path, e.to_string()));
            }
        }
    }

    debug!(
        "Sync finished: {} copied, {} failed",
        report.copied.len(),
        report.failed.len()
    );
    Ok(report)
}

/// Embed the default thumbnail into `source` and copy it to the music directory.
fn sync_file(config: &AppConfig, embedder: &ThumbnailEmbedder, source: &Path) -> Result<PathBuf> {
    // An embed failure leaves the source as it was; it is still worth copying.
    embedder.embed(source, &config.default_thumbnail, source);

    let file_name = source
        .file_name()
        .ok_or_else(|| FileSystemError::ReadFailed {
            path: source.to_path_buf(),
            reason: "path has no file name".to_string(),
        })?;
    let destination = config.music_dir.join(file_name);

    fs::copy(source, &destination).map_err(|e| FileSystemError::CopyFailed {
        from: source.to_path_buf(),
        to: destination.clone(),
        reason: e.to_string(),
    })?;
    preserve_timestamps(source, &destination)?;

    if config.verify_copies {
        verify_copy(source, &destination)?;
        debug!("Verified copy of {}", source.display());
    }

    Ok(destination)
}

/// Give `destination` the access and modification times of `source`.
fn preserve_timestamps(source: &Path, destination: &Path) -> Result<()> {
    let metadata = fs::metadata(source).map_err(|e| FileSystemError::ReadFailed {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })?;

    filetime::set_file_times(
        destination,
        FileTime::from_last_access_time(&metadata),
        FileTime::from_last_modification_time(&metadata),
    )
    .map_err(|e| FileSystemError::WriteFailed {
        path: destination.to_path_buf(),
        reason: format!("Failed to set file times: {e}"),
    })?;
    Ok(())
}
