//! Media-scanner broadcast so synced files show up without a remount.

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};

use crate::process::CommandRunner;

/// Intent broadcast to index a single file.
pub const MEDIA_SCAN_ACTION: &str = "android.intent.action.MEDIA_SCANNER_SCAN_FILE";

/// Triggers the platform media scanner for individual files.
pub struct MediaScanner {
    runner: Arc<dyn CommandRunner>,
    program: String,
}

impl MediaScanner {
    /// Create a scanner invoking `program` through `runner`.
    pub fn new(runner: Arc<dyn CommandRunner>, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
        }
    }

    /// Broadcast arguments for `path`.
    #[must_use]
    pub fn scan_args(path: &Path) -> Vec<String> {
        vec![
            "broadcast".to_string(),
            "-a".to_string(),
            MEDIA_SCAN_ACTION.to_string(),
            "-d".to_string(),
            format!("file://{}", path.display()),
        ]
    }

    /// Ask the media scanner to index `path`. Best-effort; returns whether
    /// the broadcast succeeded.
    pub fn trigger(&self, path: &Path) -> bool {
        let result = self
            .runner
            .run(&self.program, &Self::scan_args(path))
            .and_then(|output| output.check(&self.program));

        match result {
            Ok(_) => {
                info!("Triggered media scan for: {}", path.display());
                true
            }
            Err(e) => {
                error!("Media scan failed for {}: {}", path.display(), e);
                false
            }
        }
    }
}
