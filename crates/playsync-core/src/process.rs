//! External process invocation.
//!
//! All external tools are run through [`CommandRunner`] with an explicit
//! argument vector. Nothing is ever passed through a shell.

use std::process::Command;

use tracing::debug;

use crate::error::{ProcessError, Result};

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was terminated by a signal.
    pub code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// Output of a process that exited with status 0.
    #[must_use]
    pub fn success() -> Self {
        Self {
            code: Some(0),
            ..Self::default()
        }
    }

    /// Output of a process that exited with `code` and printed `stderr`.
    #[must_use]
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whether the process exited with status 0.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.code, Some(0))
    }

    /// Convert a non-zero exit into a [`ProcessError::NonZeroExit`].
    pub fn check(self, program: &str) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ProcessError::NonZeroExit {
                program: program.to_string(),
                code: self.code,
                stderr: self.stderr.trim().to_string(),
            }
            .into())
        }
    }
}

/// Runs external programs. Abstracted so tests never spawn real tools.
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` to completion, capturing its output.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::SpawnFailed`] if the program cannot be started.
    /// A non-zero exit is not an error at this level.
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput>;
}

/// [`CommandRunner`] backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    /// Create a new system command runner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        debug!("Executing command: {} {:?}", program, args);
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| ProcessError::SpawnFailed {
                program: program.to_string(),
                reason: e.to_string(),
            })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
