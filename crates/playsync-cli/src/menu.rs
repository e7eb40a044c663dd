//! Interactive numbered menu, shown when no subcommand is given.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{error, info};

use crate::commands::App;
use crate::error::Result;

/// Menu text printed before every prompt.
pub const MENU: &str = "\n🎵 Playsync 🎵
1. Download Playlists
2. Sync Music
3. Cleanup Temporary Files
4. Verify Dependencies
5. Exit";

/// Prompt printed after the menu.
pub const PROMPT: &str = "\nEnter a number: ";

/// Reply to anything that is not a menu number.
pub const INVALID_CHOICE: &str = "Invalid choice. Please enter a number between 1 and 5.";

/// A menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    /// 1. Download Playlists
    Download,
    /// 2. Sync Music
    Sync,
    /// 3. Cleanup Temporary Files
    Cleanup,
    /// 4. Verify Dependencies
    Verify,
    /// 5. Exit
    Exit,
}

impl MenuChoice {
    /// Parse a line of user input.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::Download),
            "2" => Some(Self::Sync),
            "3" => Some(Self::Cleanup),
            "4" => Some(Self::Verify),
            "5" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Show the menu and run the chosen actions until Exit or end of input.
///
/// A failing action is logged and the menu is shown again.
pub async fn run_menu<R, W>(app: &App, input: R, output: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();

    loop {
        writeln!(output, "{MENU}")?;
        write!(output, "{PROMPT}")?;
        output.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(output)?;
            return Ok(());
        };

        let Some(choice) = MenuChoice::parse(&line) else {
            writeln!(output, "{INVALID_CHOICE}")?;
            continue;
        };

        match choice {
            MenuChoice::Download => {
                info!("Starting playlist download...");
                app.download().await;
            }
            MenuChoice::Sync => {
                info!("Starting music sync...");
                if let Err(e) = app.sync().await {
                    error!("Sync failed: {}", e);
                }
            }
            MenuChoice::Cleanup => {
                info!("Running cleanup process...");
                if let Err(e) = app.cleanup().await {
                    error!("Cleanup failed: {}", e);
                }
            }
            MenuChoice::Verify => {
                if let Err(e) = app.verify().await {
                    error!("{}", e);
                }
            }
            MenuChoice::Exit => {
                writeln!(output, "Exiting.")?;
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playsync_core::{AppConfig, SystemCommandRunner};
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn test_app(root: &std::path::Path) -> App {
        let config = AppConfig::rooted_at(root);
        config.ensure_directories().unwrap();
        App::new(config, Arc::new(SystemCommandRunner::new()))
    }

    async fn drive(app: &App, input: &str) -> String {
        let mut output = Vec::new();
        run_menu(app, input.as_bytes(), &mut output).await.unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_parse_choice() {
        assert_eq!(MenuChoice::parse("1"), Some(MenuChoice::Download));
        assert_eq!(MenuChoice::parse(" 3 \n"), Some(MenuChoice::Cleanup));
        assert_eq!(MenuChoice::parse("5"), Some(MenuChoice::Exit));
        assert_eq!(MenuChoice::parse("0"), None);
        assert_eq!(MenuChoice::parse("6"), None);
        assert_eq!(MenuChoice::parse("sync"), None);
        assert_eq!(MenuChoice::parse(""), None);
    }

    #[tokio::test]
    async fn test_invalid_then_exit() {
        let temp_dir = TempDir::new().unwrap();
        let app = test_app(temp_dir.path());

        let output = drive(&app, "9\nabc\n5\n").await;

        assert_eq!(output.matches(INVALID_CHOICE).count(), 2);
        assert_eq!(output.matches("1. Download Playlists").count(), 3);
        assert!(output.ends_with("Exiting.\n"));
    }

    #[tokio::test]
    async fn test_end_of_input_exits() {
        let temp_dir = TempDir::new().unwrap();
        let app = test_app(temp_dir.path());

        let output = drive(&app, "").await;
        assert!(output.contains(PROMPT));
        assert!(!output.contains("Exiting."));
    }

    #[tokio::test]
    async fn test_cleanup_choice_runs_cleanup() {
        let temp_dir = TempDir::new().unwrap();
        let app = test_app(temp_dir.path());
        let leftover = app.config().download_dir.join("track_temp.m4a");
        fs::write(&leftover, "partial").unwrap();

        drive(&app, "3\n5\n").await;
        assert!(!leftover.exists());
    }
}
