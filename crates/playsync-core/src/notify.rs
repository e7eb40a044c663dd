//! Device notifications and wake lock.
//!
//! Both are fire-and-forget: a missing or failing tool is logged and ignored.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::process::CommandRunner;

/// Sends device notifications.
pub struct Notifier {
    runner: Arc<dyn CommandRunner>,
    program: String,
    enabled: bool,
}

impl Notifier {
    /// Create a notifier invoking `program` through `runner`.
    pub fn new(runner: Arc<dyn CommandRunner>, program: impl Into<String>, enabled: bool) -> Self {
        Self {
            runner,
            program: program.into(),
            enabled,
        }
    }

    /// A notifier that never runs anything.
    pub fn disabled(runner: Arc<dyn CommandRunner>) -> Self {
        Self::new(runner, String::new(), false)
    }

    /// Post a notification with `title` and `content`.
    pub fn notify(&self, title: &str, content: &str) {
        if !self.enabled {
            debug!("Notifications disabled, skipping: {}", title);
            return;
        }

        let args = vec![
            "--title".to_string(),
            title.to_string(),
            "--content".to_string(),
            content.to_string(),
        ];
        match self
            .runner
            .run(&self.program, &args)
            .and_then(|output| output.check(&self.program))
        {
            Ok(_) => debug!("Notification sent: {}", title),
            Err(e) => warn!("Notification failed: {}", e),
        }
    }
}

/// Holds the device wake lock until dropped.
pub struct WakeLockGuard {
    runner: Arc<dyn CommandRunner>,
    unlock_program: String,
}

impl WakeLockGuard {
    /// Acquire the wake lock.
    ///
    /// Returns `None` if `enabled` is false or the lock command fails; in
    /// both cases nothing is released later.
    pub fn acquire(
        runner: Arc<dyn CommandRunner>,
        lock_program: &str,
        unlock_program: &str,
        enabled: bool,
    ) -> Option<Self> {
        if !enabled {
            return None;
        }

        if let Err(e) = runner
            .run(lock_program, &[])
            .and_then(|output| output.check(lock_program))
        {
            warn!("Failed to acquire wake lock: {}", e);
            return None;
        }

        debug!("Wake lock acquired");
        Some(Self {
            runner,
            unlock_program: unlock_program.to_string(),
        })
    }
}

impl Drop for WakeLockGuard {
    fn drop(&mut self) {
        match self
            .runner
            .run(&self.unlock_program, &[])
            .and_then(|output| output.check(&self.unlock_program))
        {
            Ok(_) => debug!("Wake lock released"),
            Err(e) => warn!("Failed to release wake lock: {}", e),
        }
    }
}
