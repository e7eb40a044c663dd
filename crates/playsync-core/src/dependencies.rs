//! Presence checks for the external commands the pipeline needs.

use tracing::{error, info};

use crate::error::{DependencyError, Result};

/// Fail if `command` cannot be found on `PATH`.
pub fn ensure_command_exists(command: &str) -> Result<()> {
    if which::which(command).is_err() {
        error!(
            "Missing cmd: {}. Install it before running the script!",
            command
        );
        return Err(DependencyError::MissingCommand {
            command: command.to_string(),
        }
        .into());
    }
    Ok(())
}

/// Ensure every command in `commands` is available, stopping at the first missing one.
pub fn verify_dependencies<S: AsRef<str>>(commands: &[S]) -> Result<()> {
    info!("Checking system dependencies...");
    for command in commands {
        ensure_command_exists(command.as_ref())?;
    }
    info!("All dependencies verified successfully!");
    Ok(())
}
