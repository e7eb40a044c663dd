//! Playlist fetching through the external downloader.
//!
//! One fetch task downloads one playlist. The downloader does all the heavy
//! lifting: format selection, audio extraction, thumbnail and metadata
//! embedding, and skipping entries already listed in the archive file.
//! A task never fails its caller; it reports a [`FetchOutcome`] instead.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info};

use crate::config::AppConfig;
use crate::error::{DownloadError, Error, Result};
use crate::naming::output_template;
use crate::notify::Notifier;
use crate::process::CommandRunner;

/// Title of the notifications posted after downloads.
pub const DOWNLOADS_COMPLETED_TITLE: &str = "Downloads Completed";

/// Downloads a single playlist.
#[cfg_attr(test, mockall::automock)]
pub trait PlaylistFetcher: Send + Sync {
    /// Download every new entry of the playlist at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] when the downloader reports failure, or any
    /// other error when it could not be run at all.
    fn fetch(&self, url: &str) -> Result<()>;
}

/// [`PlaylistFetcher`] driving the `yt-dlp` command line.
pub struct YtDlpFetcher {
    runner: Arc<dyn CommandRunner>,
    program: String,
    download_dir: PathBuf,
    archive_file: PathBuf,
    audio_format: String,
    audio_quality: String,
}

impl YtDlpFetcher {
    /// Create a fetcher from the application configuration.
    pub fn from_config(config: &AppConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            program: config.tools.downloader.clone(),
            download_dir: config.download_dir.clone(),
            archive_file: config.archive_file.clone(),
            audio_format: config.audio_format.clone(),
            audio_quality: config.audio_quality.clone(),
        }
    }

    /// Downloader arguments for `url`.
    #[must_use]
    pub fn download_args(&self, url: &str) -> Vec<String> {
        vec![
            "-f".to_string(),
            "bestaudio/best".to_string(),
            "-x".to_string(),
            "--audio-format".to_string(),
            self.audio_format.clone(),
            "--audio-quality".to_string(),
            format!("{}K", self.audio_quality),
            "--embed-thumbnail".to_string(),
            "--embed-metadata".to_string(),
            "-o".to_string(),
            output_template(&self.download_dir),
            "--download-archive".to_string(),
            self.archive_file.display().to_string(),
            "--yes-playlist".to_string(),
            url.to_string(),
        ]
    }
}

impl PlaylistFetcher for YtDlpFetcher {
    fn fetch(&self, url: &str) -> Result<()> {
        if url.trim().is_empty() {
            return Err(DownloadError::EmptyUrl.into());
        }

        let output = self.runner.run(&self.program, &self.download_args(url))?;
        if output.is_success() {
            return Ok(());
        }

        Err(DownloadError::Failed {
            url: url.to_string(),
            reason: failure_reason(&output.stderr, output.code),
        }
        .into())
    }
}

/// Pick the most useful line out of the downloader's stderr.
fn failure_reason(stderr: &str, code: Option<i32>) -> String {
    let errors: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| l.starts_with("ERROR"))
        .collect();
    if !errors.is_empty() {
        return errors.join("; ");
    }

    stderr
        .lines()
        .map(str::trim)
        .rfind(|l| !l.is_empty())
        .map_or_else(|| format!("downloader exited with status {code:?}"), str::to_string)
}

/// Outcome of one fetch task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The downloader finished successfully.
    Completed,
    /// The downloader reported a download failure.
    Failed {
        /// Failure description.
        reason: String,
    },
    /// Anything else went wrong, including a panicked worker.
    Unexpected {
        /// Failure description.
        reason: String,
    },
}

/// Outcome of one fetch task, tagged with its playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReport {
    /// Playlist URL.
    pub url: String,
    /// What happened.
    pub outcome: FetchOutcome,
}

impl FetchReport {
    /// Whether the playlist was fetched.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.outcome, FetchOutcome::Completed)
    }

    /// The log line describing this report.
    #[must_use]
    pub fn summary(&self) -> String {
        match &self.outcome {
            FetchOutcome::Completed => format!("Completed: {}", self.url),
            FetchOutcome::Failed { reason } => {
                format!("Download failed for {} | Error: {}", self.url, reason)
            }
            FetchOutcome::Unexpected { reason } => {
                format!("Unexpected error for {} | Error: {}", self.url, reason)
            }
        }
    }
}

/// Run one fetch task: download, log, notify. Never fails.
pub fn run_fetch_task(fetcher: &dyn PlaylistFetcher, notifier: &Notifier, url: &str) -> FetchReport {
    info!("Starting download: {}", url);

    let outcome = match fetcher.fetch(url) {
        Ok(()) => FetchOutcome::Completed,
        Err(Error::Download(e)) => FetchOutcome::Failed {
            reason: e.to_string(),
        },
        Err(e) => FetchOutcome::Unexpected {
            reason: e.to_string(),
        },
    };

    let report = FetchReport {
        url: url.to_string(),
        outcome,
    };

    if report.is_success() {
        info!("{}", report.summary());
        notifier.notify(
            DOWNLOADS_COMPLETED_TITLE,
            &format!("Successfully Downloaded {url}!"),
        );
    } else {
        error!("{}", report.summary());
    }

    report
}
