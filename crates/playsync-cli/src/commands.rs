//! The actions the command line exposes, wired to the core library.
//!
//! Blocking steps (sync, cleanup, dependency checks) are moved onto the
//! blocking thread pool so the interrupt handler stays responsive.

use std::path::Path;
use std::sync::Arc;

use playsync_core::{
    AppConfig, CleanupReport, CommandRunner, FetchOrchestrator, FetchReport, MediaScanner,
    Notifier, SyncReport, TempNaming, ThumbnailEmbedder, YtDlpFetcher, file_hash, run_cleanup,
    sync_music, verify_dependencies,
};
use tracing::{info, warn};

use crate::error::{CliError, Result};

/// Shared state for every action: the configuration and the process runner.
#[derive(Clone)]
pub struct App {
    config: Arc<AppConfig>,
    runner: Arc<dyn CommandRunner>,
}

impl App {
    /// Create the application around `config`, running tools through `runner`.
    pub fn new(config: AppConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            config: Arc::new(config),
            runner,
        }
    }

    /// The loaded configuration.
    #[cfg(test)]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn embedder(&self) -> Result<ThumbnailEmbedder> {
        let temp = TempNaming::new(&self.config.temp_marker, &self.config.audio_format)?;
        Ok(ThumbnailEmbedder::new(
            Arc::clone(&self.runner),
            self.config.tools.muxer.clone(),
            temp,
        ))
    }

    fn notifier(&self) -> Notifier {
        Notifier::new(
            Arc::clone(&self.runner),
            self.config.tools.notifier.clone(),
            self.config.notifications,
        )
    }

    /// Download every configured playlist.
    pub async fn download(&self) -> Vec<FetchReport> {
        if self.config.playlist_urls.is_empty() {
            warn!("No playlist URLs configured");
        }

        let fetcher = YtDlpFetcher::from_config(&self.config, Arc::clone(&self.runner));
        let mut orchestrator = FetchOrchestrator::new(
            Arc::new(fetcher),
            Arc::new(self.notifier()),
            self.config.max_concurrent_downloads,
        );
        if self.config.wake_lock {
            orchestrator = orchestrator.with_wake_lock(
                Arc::clone(&self.runner),
                self.config.tools.wake_lock.clone(),
                self.config.tools.wake_unlock.clone(),
            );
        }

        let reports = orchestrator.run(&self.config.playlist_urls).await;
        let completed = reports.iter().filter(|r| r.is_success()).count();
        info!("{} of {} playlists downloaded", completed, reports.len());
        reports
    }

    /// Check required tools, then download every configured playlist.
    pub async fn verify_and_download(&self) -> Result<Vec<FetchReport>> {
        self.verify().await?;
        Ok(self.download().await)
    }

    /// Copy finished downloads into the music directory.
    pub async fn sync(&self) -> Result<SyncReport> {
        let app = self.clone();
        tokio::task::spawn_blocking(move || app.sync_blocking()).await?
    }

    fn sync_blocking(&self) -> Result<SyncReport> {
        let embedder = self.embedder()?;
        let scanner = self
            .config
            .media_scan_after_sync
            .then(|| MediaScanner::new(Arc::clone(&self.runner), self.config.tools.media_scanner.clone()));

        let report = sync_music(&self.config, &embedder, scanner.as_ref())?;
        if !report.music_dir_missing {
            info!(
                "Synced {} files, {} failed",
                report.copied_count(),
                report.failed.len()
            );
        }
        Ok(report)
    }

    /// Remove temp files and embed the default thumbnail where art is missing.
    pub async fn cleanup(&self) -> Result<CleanupReport> {
        let app = self.clone();
        tokio::task::spawn_blocking(move || -> Result<CleanupReport> {
            let embedder = app.embedder()?;
            Ok(run_cleanup(&app.config, &embedder)?)
        })
        .await?
    }

    /// Check that every required external command is installed.
    pub async fn verify(&self) -> Result<()> {
        let commands = self.config.tools.required_commands(self.config.wake_lock);
        tokio::task::spawn_blocking(move || verify_dependencies(&commands))
            .await?
            .map_err(CliError::from)
    }
}

/// MD5 digest of `path`, printed by the `hash` subcommand.
pub fn hash(path: &Path) -> Result<String> {
    Ok(file_hash(path)?)
}
