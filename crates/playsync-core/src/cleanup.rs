//! Download directory housekeeping.
//!
//! Cleanup runs two passes over the download directory:
//!
//! 1. delete intermediate files left behind by interrupted or failed embeds;
//! 2. for audio files without companion cover art, mux the default thumbnail
//!    into a temp-named sibling.
//!
//! Pass 2 never touches the original audio file. Its output is itself a temp
//! file, so the next cleanup run removes it again in pass 1.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::error::Result;
use crate::library::{audio_files_in, list_files};
use crate::naming::TempNaming;
use crate::thumbnail::ThumbnailEmbedder;

/// Result of a cleanup run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Temp files deleted in pass 1.
    pub removed: Vec<PathBuf>,
    /// Temp files pass 1 could not delete, with the reason.
    pub failed_removals: Vec<(PathBuf, String)>,
    /// Temp files produced in pass 2.
    pub embedded: Vec<PathBuf>,
    /// Audio files whose default-thumbnail embed failed in pass 2.
    pub embed_failures: Vec<PathBuf>,
}

/// Pass 1: delete every temp-marked audio file in the download directory.
///
/// Returns the files removed and the files that could not be deleted. Files
/// that vanish between listing and deletion count as removed; any other
/// deletion error is logged and the remaining files are still processed.
///
/// # Errors
///
/// Returns an error if the directory cannot be listed.
pub fn remove_temp_files(
    config: &AppConfig,
    temp: &TempNaming,
) -> Result<(Vec<PathBuf>, Vec<(PathBuf, String)>)> {
    let temp_files: Vec<PathBuf> = list_files(&config.download_dir)?
        .into_iter()
        .filter(|p| temp.is_temp(p))
        .collect();

    if temp_files.is_empty() {
        info!("No orphaned temp files found.");
        return Ok((temp_files, Vec::new()));
    }

    let names: Vec<String> = temp_files
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect();
    info!(
        "Found {} temp files before deletion: {:?}",
        temp_files.len(),
        names
    );

    Ok(remove_each(temp_files))
}

fn remove_each(paths: Vec<PathBuf>) -> (Vec<PathBuf>, Vec<(PathBuf, String)>) {
    let mut removed = Vec::with_capacity(paths.len());
    let mut failed = Vec::new();

    for path in paths {
        info!("Removing temp file: {}", path.display());
        match fs::remove_file(&path) {
            Ok(()) => removed.push(path),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Temp file already gone: {}", path.display());
                removed.push(path);
            }
            Err(e) => {
                error!("Failed to remove temp file {}: {}", path.display(), e);
                failed.push((path, e.to_string()));
            }
        }
    }

    (removed, failed)
}

/// Pass 2: embed the default thumbnail for audio files lacking cover art.
///
/// Returns the temp files written and the audio files whose embed failed.
///
/// # Errors
///
/// Returns an error if the download directory cannot be listed.
pub fn embed_default_thumbnails(
    config: &AppConfig,
    embedder: &ThumbnailEmbedder,
    temp: &TempNaming,
) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    let files = list_files(&config.download_dir)?;
    let mut embedded = Vec::new();
    let mut failures = Vec::new();

    for audio in audio_files_in(&files, &config.audio_format, &config.thumbnail_format, temp) {
        if audio.has_thumbnail() {
            continue;
        }

        warn!("Embedding default thumbnail for: {}", audio.path.display());
        let destination = temp.temp_path_for(&audio.path);
        if embedder
            .embed(&audio.path, &config.default_thumbnail, &destination)
            .is_embedded()
        {
            embedded.push(destination);
        } else {
            failures.push(audio.path);
        }
    }

    Ok((embedded, failures))
}

/// Run both cleanup passes.
///
/// # Errors
///
/// Returns an error if the download directory cannot be listed or the
/// configured temp marker is unusable. Per-file failures of either pass are
/// recorded in the report instead.
pub fn run_cleanup(config: &AppConfig, embedder: &ThumbnailEmbedder) -> Result<CleanupReport> {
    info!("Starting cleanup process...");

    let temp = TempNaming::new(&config.temp_marker, &config.audio_format)?;
    let (removed, failed_removals) = remove_temp_files(config, &temp)?;
    let (embedded, embed_failures) = embed_default_thumbnails(config, embedder, &temp)?;

    info!("Cleanup process completed.");
    Ok(CleanupReport {
        removed,
        failed_removals,
        embedded,
        embed_failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{CommandOutput, MockCommandRunner};
    use crate::test_support::capture_logs;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn setup() -> (TempDir, AppConfig, TempNaming) {
        let root = TempDir::new().expect("Failed to create temp dir");
        let config = AppConfig::rooted_at(root.path());
        fs::create_dir_all(&config.download_dir).unwrap();
        let temp = TempNaming::new(&config.temp_marker, &config.audio_format).unwrap();
        (root, config, temp)
    }

    fn writing_embedder(temp: &TempNaming) -> ThumbnailEmbedder {
        let mut runner = MockCommandRunner::new();
        runner.expect_run().returning(|_, args| {
            fs::write(&args[args.len() - 2], "muxed").expect("write mux output");
            Ok(CommandOutput::success())
        });
        ThumbnailEmbedder::new(Arc::new(runner), "ffmpeg", temp.clone())
    }

    fn idle_embedder(temp: &TempNaming) -> ThumbnailEmbedder {
        let mut runner = MockCommandRunner::new();
        runner.expect_run().never();
        ThumbnailEmbedder::new(Arc::new(runner), "ffmpeg", temp.clone())
    }

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), name).unwrap();
    }

    #[test]
    fn test_remove_temp_files_only_removes_temp() {
        let (_root, config, temp) = setup();
        let dir = &config.download_dir;
        touch(dir, "song_temp.m4a");
        touch(dir, "other_temp.m4a");
        touch(dir, "song.m4a");
        touch(dir, "notes_temp.txt");

        let (removed, failed) = remove_temp_files(&config, &temp).unwrap();

        assert_eq!(removed.len(), 2);
        assert!(failed.is_empty());
        assert!(!dir.join("song_temp.m4a").exists());
        assert!(!dir.join("other_temp.m4a").exists());
        assert!(dir.join("song.m4a").exists());
        assert!(dir.join("notes_temp.txt").exists());

        // Nothing left on the second run.
        let (second, logs) = capture_logs(|| remove_temp_files(&config, &temp).unwrap());
        assert_eq!(second, (Vec::new(), Vec::new()));
        assert!(logs.contains("INFO"));
        assert!(logs.contains("No orphaned temp files found."));
        assert!(!logs.contains("Removing temp file"));
    }

    #[test]
    fn test_remove_temp_files_logs_what_it_deletes() {
        let (_root, config, temp) = setup();
        touch(&config.download_dir, "song_temp.m4a");

        let (_, logs) = capture_logs(|| remove_temp_files(&config, &temp).unwrap());
        assert!(logs.contains("Found 1 temp files before deletion: [\"song_temp.m4a\"]"));
        assert!(logs.contains("Removing temp file:"));
        assert!(!logs.contains("No orphaned temp files found."));
    }

    #[test]
    fn test_failed_removal_does_not_stop_the_rest() {
        let (_root, config, _temp) = setup();
        let dir = &config.download_dir;
        // Unlinking a directory fails with something other than NotFound.
        let stuck = dir.join("stuck_temp.m4a");
        fs::create_dir(&stuck).unwrap();
        touch(dir, "later_temp.m4a");
        let vanished = dir.join("gone_temp.m4a");

        let ((removed, failed), logs) = capture_logs(|| {
            remove_each(vec![stuck.clone(), vanished.clone(), dir.join("later_temp.m4a")])
        });

        assert_eq!(removed, vec![vanished, dir.join("later_temp.m4a")]);
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0, stuck);
        assert!(!dir.join("later_temp.m4a").exists());
        assert!(stuck.is_dir());
        assert!(logs.contains("Failed to remove temp file"));
    }

    #[test]
    fn test_embed_default_thumbnail_without_cover() {
        let (_root, config, temp) = setup();
        let dir = &config.download_dir;
        touch(dir, "bare.m4a");
        touch(dir, "covered.m4a");
        touch(dir, "covered.png");

        let (embedded, failures) =
            embed_default_thumbnails(&config, &writing_embedder(&temp), &temp).unwrap();

        assert_eq!(embedded, vec![dir.join("bare_temp.m4a")]);
        assert!(failures.is_empty());
        assert!(dir.join("bare_temp.m4a").exists());
        assert!(!dir.join("covered_temp.m4a").exists());
        // The original is untouched.
        assert_eq!(fs::read_to_string(dir.join("bare.m4a")).unwrap(), "bare.m4a");
    }

    #[test]
    fn test_embed_default_thumbnail_with_cover_does_nothing() {
        let (_root, config, temp) = setup();
        touch(&config.download_dir, "song.m4a");
        touch(&config.download_dir, "song.png");

        let (embedded, failures) =
            embed_default_thumbnails(&config, &idle_embedder(&temp), &temp).unwrap();
        assert!(embedded.is_empty());
        assert!(failures.is_empty());
    }

    #[test]
    fn test_embed_failure_is_recorded() {
        let (_root, config, temp) = setup();
        touch(&config.download_dir, "song.m4a");

        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .returning(|_, _| Ok(CommandOutput::failure(1, "missing image")));
        let embedder = ThumbnailEmbedder::new(Arc::new(runner), "ffmpeg", temp.clone());

        let (embedded, failures) = embed_default_thumbnails(&config, &embedder, &temp).unwrap();
        assert!(embedded.is_empty());
        assert_eq!(failures, vec![config.download_dir.join("song.m4a")]);
    }

    #[test]
    fn test_run_cleanup_two_runs() {
        let (_root, config, temp) = setup();
        touch(&config.download_dir, "song.m4a");
        touch(&config.download_dir, "stale_temp.m4a");

        let first = run_cleanup(&config, &writing_embedder(&temp)).unwrap();
        assert_eq!(first.removed, vec![config.download_dir.join("stale_temp.m4a")]);
        assert!(first.failed_removals.is_empty());
        assert_eq!(first.embedded, vec![config.download_dir.join("song_temp.m4a")]);

        let second = run_cleanup(&config, &writing_embedder(&temp)).unwrap();
        assert_eq!(second.removed, vec![config.download_dir.join("song_temp.m4a")]);
        assert_eq!(second.embedded, vec![config.download_dir.join("song_temp.m4a")]);
    }
}
