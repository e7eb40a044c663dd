//! File naming rules shared by the downloader, embedder and cleanup.
//!
//! The temp-file contract lives here so the code that produces intermediate
//! files and the code that deletes them cannot drift apart.

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::{Error, Result};

/// Characters dropped from filenames entirely.
const REMOVED_CHARS: [char; 3] = ['\'', '"', '\\'];

/// Characters replaced with an underscore.
const REPLACED_CHARS: [char; 8] = ['?', '*', '<', '>', '|', ':', '/', '\0'];

/// Downloader output template: playlist position and title.
pub const OUTPUT_TEMPLATE: &str = "%(playlist_index)s - %(title)s.%(ext)s";

/// Sanitize a string for use as a filename.
///
/// Quotes and backslashes are removed, filesystem-invalid characters become
/// `_`, everything else (whitespace, punctuation, template `%(...)s` fields)
/// is kept. Applying it twice yields the same result.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !REMOVED_CHARS.contains(c))
        .map(|c| if REPLACED_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Full downloader output template rooted at `download_dir`.
#[must_use]
pub fn output_template(download_dir: &Path) -> String {
    format!(
        "{}/{}",
        download_dir.display(),
        sanitize_filename(OUTPUT_TEMPLATE)
    )
}

/// Naming convention for intermediate files: `<stem><marker>.<ext>`.
#[derive(Debug, Clone)]
pub struct TempNaming {
    marker: String,
    extension: String,
    pattern: Regex,
}

impl TempNaming {
    /// Create the convention for `marker` on files with `extension`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the pattern cannot be compiled.
    pub fn new(marker: &str, extension: &str) -> Result<Self> {
        let pattern = Regex::new(&format!(
            r"^.*{}\.{}$",
            regex::escape(marker),
            regex::escape(extension)
        ))
        .map_err(|e| Error::Configuration(format!("Invalid temp marker {marker:?}: {e}")))?;

        Ok(Self {
            marker: marker.to_string(),
            extension: extension.to_string(),
            pattern,
        })
    }

    /// Whether `path` names an intermediate file.
    #[must_use]
    pub fn is_temp(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| self.pattern.is_match(name))
    }

    /// Intermediate sibling of `path`, e.g. `song.m4a` -> `song_temp.m4a`.
    #[must_use]
    pub fn temp_path_for(&self, path: &Path) -> PathBuf {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        path.with_file_name(format!("{stem}{}.{}", self.marker, self.extension))
    }
}
