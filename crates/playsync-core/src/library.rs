//! Non-recursive scans of the download directory.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{FileSystemError, Result};
use crate::naming::TempNaming;

/// A downloaded audio file and its optional companion thumbnail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFile {
    /// Full path of the audio file.
    pub path: PathBuf,
    /// File name including extension.
    pub file_name: String,
    /// File name without extension.
    pub stem: String,
    /// Image with the same stem, if one exists next to the audio file.
    pub thumbnail: Option<PathBuf>,
}

impl AudioFile {
    /// Describe the audio file at `path`, looking for a `thumbnail_format` sibling.
    #[must_use]
    pub fn new(path: PathBuf, thumbnail_format: &str) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let candidate = path.with_extension(thumbnail_format);
        let thumbnail = candidate.is_file().then_some(candidate);

        Self {
            path,
            file_name,
            stem,
            thumbnail,
        }
    }

    /// Whether the file has its own cover art next to it.
    #[must_use]
    pub const fn has_thumbnail(&self) -> bool {
        self.thumbnail.is_some()
    }
}

/// List the regular files directly inside `dir`, sorted by name.
///
/// # Errors
///
/// Returns [`FileSystemError::DirectoryNotFound`] if `dir` is not a
/// directory, or an error if it cannot be read.
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(FileSystemError::DirectoryNotFound {
            path: dir.to_path_buf(),
        }
        .into());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| FileSystemError::ReadFailed {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Whether `path` has extension `extension` (exact match).
#[must_use]
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(extension)
}

/// Audio files among `files`, excluding intermediate temp files.
#[must_use]
pub fn audio_files_in(
    files: &[PathBuf],
    audio_format: &str,
    thumbnail_format: &str,
    temp: &TempNaming,
) -> Vec<AudioFile> {
    files
        .iter()
        .filter(|p| has_extension(p, audio_format))
        .filter(|p| {
            let is_temp = temp.is_temp(p);
            if is_temp {
                debug!("Skipping intermediate file {}", p.display());
            }
            !is_temp
        })
        .map(|p| AudioFile::new(p.clone(), thumbnail_format))
        .collect()
}

/// Scan `dir` for audio files.
///
/// # Errors
///
/// Returns an error if `dir` cannot be read.
pub fn collect_audio_files(
    dir: &Path,
    audio_format: &str,
    thumbnail_format: &str,
    temp: &TempNaming,
) -> Result<Vec<AudioFile>> {
    let files = list_files(dir)?;
    Ok(audio_files_in(&files, audio_format, thumbnail_format, temp))
}
