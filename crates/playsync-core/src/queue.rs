//! Batch download orchestration.
//!
//! Playlist URLs are pushed into a bounded queue that a fixed pool of worker
//! tasks drains. Each fetch runs on the blocking thread pool because the
//! downloader is a synchronous child process. The batch waits for every
//! worker before returning, whatever the individual outcomes.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::config::{MAX_CONCURRENT_DOWNLOADS, MIN_CONCURRENT_DOWNLOADS};
use crate::notify::{Notifier, WakeLockGuard};
use crate::process::CommandRunner;
use crate::youtube::{
    DOWNLOADS_COMPLETED_TITLE, FetchOutcome, FetchReport, PlaylistFetcher, run_fetch_task,
};

/// Content of the notification posted once the whole batch is done.
pub const BATCH_COMPLETED_CONTENT: &str = "Successfully Downloaded All Playlists!";

struct WakeLockCommands {
    runner: Arc<dyn CommandRunner>,
    lock: String,
    unlock: String,
}

/// Runs fetch tasks for a batch of playlists with bounded concurrency.
pub struct FetchOrchestrator {
    fetcher: Arc<dyn PlaylistFetcher>,
    notifier: Arc<Notifier>,
    max_workers: usize,
    wake_lock: Option<WakeLockCommands>,
}

impl FetchOrchestrator {
    /// Create an orchestrator running at most `max_workers` fetches at once.
    ///
    /// `max_workers` is clamped to the supported concurrency range.
    pub fn new(fetcher: Arc<dyn PlaylistFetcher>, notifier: Arc<Notifier>, max_workers: usize) -> Self {
        Self {
            fetcher,
            notifier,
            max_workers: max_workers.clamp(MIN_CONCURRENT_DOWNLOADS, MAX_CONCURRENT_DOWNLOADS),
            wake_lock: None,
        }
    }

    /// Hold the device wake lock while a batch runs.
    #[must_use]
    pub fn with_wake_lock(
        mut self,
        runner: Arc<dyn CommandRunner>,
        lock: impl Into<String>,
        unlock: impl Into<String>,
    ) -> Self {
        self.wake_lock = Some(WakeLockCommands {
            runner,
            lock: lock.into(),
            unlock: unlock.into(),
        });
        self
    }

    /// Number of worker tasks a batch of `url_count` playlists gets.
    #[must_use]
    pub fn worker_count(&self, url_count: usize) -> usize {
        self.max_workers.min(url_count)
    }

    /// Fetch every playlist in `urls` and return one report per URL.
    ///
    /// Never fails: download errors, unexpected errors and panicking workers
    /// all end up as reports. Report order follows completion, not input.
    pub async fn run(&self, urls: &[String]) -> Vec<FetchReport> {
        info!("Starting batch playlist download...");

        let _wake_lock = self.wake_lock.as_ref().and_then(|w| {
            WakeLockGuard::acquire(Arc::clone(&w.runner), &w.lock, &w.unlock, true)
        });

        let reports = if urls.is_empty() {
            Vec::new()
        } else {
            self.drain(urls).await
        };

        info!("All downloads complete.");
        self.notifier
            .notify(DOWNLOADS_COMPLETED_TITLE, BATCH_COMPLETED_CONTENT);

        reports
    }

    async fn drain(&self, urls: &[String]) -> Vec<FetchReport> {
        let (tx, rx) = mpsc::channel::<String>(urls.len());
        for url in urls {
            if tx.send(url.clone()).await.is_err() {
                break;
            }
        }
        drop(tx);

        let rx = Arc::new(Mutex::new(rx));
        let mut workers = JoinSet::new();
        for worker_id in 0..self.worker_count(urls.len()) {
            let rx = Arc::clone(&rx);
            let fetcher = Arc::clone(&self.fetcher);
            let notifier = Arc::clone(&self.notifier);

            workers.spawn(async move {
                let mut reports = Vec::new();
                loop {
                    let next = rx.lock().await.recv().await;
                    let Some(url) = next else { break };
                    debug!("Worker {} picked up {}", worker_id, url);
                    reports.push(fetch_on_blocking_pool(&fetcher, &notifier, url).await);
                }
                debug!("Worker {} finished", worker_id);
                reports
            });
        }

        let mut reports = Vec::with_capacity(urls.len());
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(batch) => reports.extend(batch),
                Err(e) => error!("Download worker failed: {}", e),
            }
        }
        reports
    }
}

async fn fetch_on_blocking_pool(
    fetcher: &Arc<dyn PlaylistFetcher>,
    notifier: &Arc<Notifier>,
    url: String,
) -> FetchReport {
    let fetcher = Arc::clone(fetcher);
    let notifier = Arc::clone(notifier);
    let task_url = url.clone();

    match tokio::task::spawn_blocking(move || run_fetch_task(fetcher.as_ref(), &notifier, &task_url))
        .await
    {
        Ok(report) => report,
        Err(e) => {
            error!("Error downloading {}: {}", url, e);
            FetchReport {
                url,
                outcome: FetchOutcome::Unexpected {
                    reason: e.to_string(),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::error::{DownloadError, Result};
    use crate::process::{CommandOutput, MockCommandRunner};
    use crate::youtube::MockPlaylistFetcher;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn silent_notifier() -> Arc<Notifier> {
        let mut runner = MockCommandRunner::new();
        runner.expect_run().never();
        Arc::new(Notifier::disabled(Arc::new(runner)))
    }

    fn urls(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    /// Fetcher that sleeps and records how many fetches overlap.
    struct SlowFetcher {
        active: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    impl SlowFetcher {
        fn new() -> Self {
            Self {
                active: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl PlaylistFetcher for SlowFetcher {
        fn fetch(&self, _url: &str) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(100));
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_mixed_outcomes() {
        let mut fetcher = MockPlaylistFetcher::new();
        fetcher.expect_fetch().times(2).returning(|url| {
            if url.contains("fail") {
                Err(DownloadError::Failed {
                    url: url.to_string(),
                    reason: "Simulated download failure".to_string(),
                }
                .into())
            } else {
                Ok(())
            }
        });

        let orchestrator = FetchOrchestrator::new(Arc::new(fetcher), silent_notifier(), 3);
        let mut reports = orchestrator
            .run(&urls(&[
                "http://example.com/success_playlist",
                "http://example.com/fail_playlist",
            ]))
            .await;
        reports.sort_by(|a, b| a.url.cmp(&b.url));

        assert_eq!(reports.len(), 2);
        assert!(reports[0].summary().contains("Download failed"));
        assert!(reports[1].summary().contains("Completed"));
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let fetcher = Arc::new(SlowFetcher::new());
        let orchestrator = FetchOrchestrator::new(fetcher.clone(), silent_notifier(), 3);

        let batch: Vec<String> = (0..7).map(|i| format!("http://example.com/{i}")).collect();
        let reports = orchestrator.run(&batch).await;

        assert_eq!(reports.len(), 7);
        assert!(reports.iter().all(FetchReport::is_success));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 7);
        let peak = fetcher.peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak concurrency was {peak}");
        assert!(peak > 1, "fetches never overlapped");
    }

    #[tokio::test]
    async fn test_configured_concurrency_never_exceeds_three() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        let mut seeded = AppConfig::rooted_at(temp_dir.path());
        seeded.max_concurrent_downloads = 5;
        seeded.save_to(&path).unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.max_concurrent_downloads, 3);

        // Bypass the config clamp; the orchestrator caps on its own.
        let fetcher = Arc::new(SlowFetcher::new());
        let orchestrator = FetchOrchestrator::new(fetcher.clone(), silent_notifier(), 5);

        let batch: Vec<String> = (0..8).map(|i| format!("http://example.com/{i}")).collect();
        let reports = orchestrator.run(&batch).await;

        assert_eq!(reports.len(), 8);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 8);
        let peak = fetcher.peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak concurrency was {peak}");
    }

    struct PanickingFetcher;

    impl PlaylistFetcher for PanickingFetcher {
        fn fetch(&self, url: &str) -> Result<()> {
            assert!(!url.contains("boom"), "fetcher blew up");
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_panicking_fetch_is_reported() {
        let orchestrator = FetchOrchestrator::new(Arc::new(PanickingFetcher), silent_notifier(), 2);
        let mut reports = orchestrator
            .run(&urls(&["http://example.com/boom", "http://example.com/fine"]))
            .await;
        reports.sort_by(|a, b| a.url.cmp(&b.url));

        assert_eq!(reports.len(), 2);
        assert!(matches!(reports[0].outcome, FetchOutcome::Unexpected { .. }));
        assert!(reports[1].is_success());
    }

    #[tokio::test]
    async fn test_empty_batch_still_notifies() {
        let mut fetcher = MockPlaylistFetcher::new();
        fetcher.expect_fetch().never();

        let mut runner = MockCommandRunner::new();
        runner.expect_run().times(1).returning(|_, args| {
            assert_eq!(args[1], DOWNLOADS_COMPLETED_TITLE);
            assert_eq!(args[3], BATCH_COMPLETED_CONTENT);
            Ok(CommandOutput::success())
        });
        let notifier = Arc::new(Notifier::new(Arc::new(runner), "termux-notification", true));

        let orchestrator = FetchOrchestrator::new(Arc::new(fetcher), notifier, 3);
        assert!(orchestrator.run(&[]).await.is_empty());
    }

    #[tokio::test]
    async fn test_final_notification_after_failures() {
        let mut fetcher = MockPlaylistFetcher::new();
        fetcher
            .expect_fetch()
            .returning(|_| Err(DownloadError::EmptyUrl.into()));

        let sent = Arc::new(std::sync::Mutex::new(Vec::new()));
        let recorded = Arc::clone(&sent);
        let mut runner = MockCommandRunner::new();
        runner.expect_run().returning(move |_, args| {
            recorded.lock().unwrap().push(args[3].clone());
            Ok(CommandOutput::success())
        });
        let notifier = Arc::new(Notifier::new(Arc::new(runner), "termux-notification", true));

        let orchestrator = FetchOrchestrator::new(Arc::new(fetcher), notifier, 3);
        let reports = orchestrator.run(&urls(&["a", "b"])).await;

        assert!(reports.iter().all(|r| !r.is_success()));
        assert_eq!(*sent.lock().unwrap(), vec![BATCH_COMPLETED_CONTENT.to_string()]);
    }

    #[tokio::test]
    async fn test_wake_lock_spans_batch() {
        let mut fetcher = MockPlaylistFetcher::new();
        fetcher.expect_fetch().times(1).returning(|_| Ok(()));

        let mut seq = mockall::Sequence::new();
        let mut lock_runner = MockCommandRunner::new();
        lock_runner
            .expect_run()
            .withf(|program, _| program == "termux-wake-lock")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(CommandOutput::success()));
        lock_runner
            .expect_run()
            .withf(|program, _| program == "termux-wake-unlock")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(CommandOutput::success()));

        let orchestrator = FetchOrchestrator::new(Arc::new(fetcher), silent_notifier(), 3)
            .with_wake_lock(Arc::new(lock_runner), "termux-wake-lock", "termux-wake-unlock");
        let reports = orchestrator.run(&urls(&["http://example.com/list"])).await;
        assert_eq!(reports.len(), 1);
    }

    #[test]
    fn test_worker_count() {
        let orchestrator = FetchOrchestrator::new(Arc::new(SlowFetcher::new()), silent_notifier(), 3);
        assert_eq!(orchestrator.worker_count(1), 1);
        assert_eq!(orchestrator.worker_count(10), 3);

        let clamped = FetchOrchestrator::new(Arc::new(SlowFetcher::new()), silent_notifier(), 0);
        assert_eq!(clamped.worker_count(10), 1);
        let capped = FetchOrchestrator::new(Arc::new(SlowFetcher::new()), silent_notifier(), 50);
        assert_eq!(capped.worker_count(10), 3);
    }
}
