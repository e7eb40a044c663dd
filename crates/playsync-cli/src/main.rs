//! `playsync` command line entry point.
//!
//! Sets up logging, loads the configuration, and runs either a single
//! subcommand or the interactive menu. Ctrl-C ends the process at once
//! without waiting for downloads still in flight.

mod commands;
mod error;
mod logging;
mod menu;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use playsync_core::{AppConfig, SystemCommandRunner};
use tokio::io::BufReader;
use tokio::runtime::Builder;
use tracing::{Level, debug, error, info};

use crate::commands::App;
use crate::error::Result;
use crate::logging::LoggingConfig;

/// Download YouTube playlists as audio and sync them to the device music folder.
#[derive(Debug, Parser)]
#[command(name = "playsync", version, about)]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, env = "PLAYSYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Log debug output to the console.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
enum Command {
    /// Verify dependencies, then download every configured playlist.
    Download,
    /// Copy downloaded audio into the music directory.
    Sync,
    /// Remove temp files and embed default thumbnails.
    Cleanup,
    /// Check that the required external tools are installed.
    Verify,
    /// Show the interactive menu (default).
    Menu,
    /// Print the MD5 digest of a file.
    Hash {
        /// File to hash.
        file: PathBuf,
    },
}

impl Command {
    fn interrupt_message(&self) -> &'static str {
        match self {
            Self::Download => "Download interrupted. Exiting gracefully...",
            Self::Sync => "Sync interrupted. Exiting gracefully...",
            _ => "Interrupted. Exiting gracefully...",
        }
    }
}

fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit.map_or_else(AppConfig::config_file_path, Path::to_path_buf)
}

/// Log directory named by the config at `path`. Reads only, so nothing the
/// full load would log is lost before the subscriber exists.
fn log_directory(path: &Path) -> Result<PathBuf> {
    Ok(AppConfig::read_from(path)?
        .map_or_else(|| AppConfig::default().log_dir, |config| config.log_dir))
}

fn load_config(path: &Path) -> Result<AppConfig> {
    let config = AppConfig::load_from(path)?;
    config.ensure_directories()?;
    Ok(config)
}

async fn execute(command: Command, app: &App) -> Result<()> {
    match command {
        Command::Download => {
            app.verify_and_download().await?;
        }
        Command::Sync => {
            app.sync().await?;
        }
        Command::Cleanup => {
            app.cleanup().await?;
            info!("Cleanup complete!");
        }
        Command::Verify => app.verify().await?,
        Command::Menu => {
            let stdin = BufReader::new(tokio::io::stdin());
            menu::run_menu(app, stdin, &mut std::io::stdout()).await?;
        }
        Command::Hash { file } => {
            let digest = commands::hash(&file)?;
            println!("{digest}  {}", file.display());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let path = config_path(cli.config.as_deref());

    let log_dir = match log_directory(&path) {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let console_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let logging_config = LoggingConfig::new(log_dir).with_console_level(console_level);
    let _logging_guard = match logging::init(&logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        }
    };
    debug!("Logging to {}", logging_config.log_file_path().display());

    let config = match load_config(&path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match Builder::new_multi_thread()
        .enable_all()
        .thread_name("playsync-worker")
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to build async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let command = cli.command.unwrap_or(Command::Menu);
    let app = App::new(config, Arc::new(SystemCommandRunner::new()));

    let (code, interrupted) = runtime.block_on(async {
        tokio::select! {
            result = execute(command.clone(), &app) => match result {
                Ok(()) => (ExitCode::SUCCESS, false),
                Err(e) => {
                    error!("{}", e);
                    (ExitCode::FAILURE, false)
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("{}", command.interrupt_message());
                (ExitCode::SUCCESS, true)
            }
        }
    });

    if interrupted {
        // Blocking fetches and the stdin reader cannot be cancelled.
        runtime.shutdown_background();
    }
    code
}
