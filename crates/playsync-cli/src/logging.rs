//! Logging setup using tracing.
//!
//! Two layers are installed:
//! - console output as `[LEVEL] message`
//! - `app.log` in the configured log directory as
//!   `<timestamp> - <LEVEL> - <message>`, appended and never rotated

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{Event, Level, Subscriber};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{FmtContext, FormatEvent, FormatFields, format::Writer},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

/// Name of the log file inside the log directory.
pub const LOG_FILE_NAME: &str = "app.log";

/// Timestamp layout of file log lines, e.g. `2025-01-31 18:04:05,123`.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Logging configuration options.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Directory where `app.log` is written.
    pub log_directory: PathBuf,
    /// Maximum log level for console output, unless `RUST_LOG` is set.
    pub console_level: Level,
    /// Maximum log level for file output.
    pub file_level: Level,
    /// Whether to include ANSI color codes in console output.
    pub console_ansi: bool,
}

impl LoggingConfig {
    /// Configuration writing to `log_directory` with the default levels.
    #[must_use]
    pub const fn new(log_directory: PathBuf) -> Self {
        Self {
            log_directory,
            console_level: Level::INFO,
            file_level: Level::DEBUG,
            console_ansi: false,
        }
    }

    /// Set the console log level.
    #[must_use]
    pub const fn with_console_level(mut self, level: Level) -> Self {
        self.console_level = level;
        self
    }

    /// Path of the log file.
    #[must_use]
    pub fn log_file_path(&self) -> PathBuf {
        self.log_directory.join(LOG_FILE_NAME)
    }
}

/// Line layout produced by [`LineFormat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    /// `<timestamp> - <LEVEL> - <message>`
    Timestamped,
    /// `[LEVEL] message`
    Bracketed,
}

/// Event formatter writing plain single-line records.
#[derive(Debug, Clone, Copy)]
pub struct LineFormat {
    style: LineStyle,
}

impl LineFormat {
    /// Formatter for `style`.
    #[must_use]
    pub const fn new(style: LineStyle) -> Self {
        Self { style }
    }
}

/// Level name as it appears in log lines.
#[must_use]
pub const fn level_name(level: Level) -> &'static str {
    match level {
        Level::TRACE => "TRACE",
        Level::DEBUG => "DEBUG",
        Level::INFO => "INFO",
        Level::WARN => "WARNING",
        Level::ERROR => "ERROR",
    }
}

/// The part of a log line before the message.
#[must_use]
pub fn line_prefix(style: LineStyle, level: Level, timestamp: &str) -> String {
    match style {
        LineStyle::Timestamped => format!("{timestamp} - {} - ", level_name(level)),
        LineStyle::Bracketed => format!("[{}] ", level_name(level)),
    }
}

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let timestamp = match self.style {
            LineStyle::Timestamped => Local::now().format(TIMESTAMP_FORMAT).to_string(),
            LineStyle::Bracketed => String::new(),
        };
        write!(
            writer,
            "{}",
            line_prefix(self.style, *event.metadata().level(), &timestamp)
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Guard that keeps file logging active. Drop this to flush and close the log file.
pub struct LoggingGuard {
    _file_guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Initialize the logging system with the given configuration.
///
/// Returns a guard that must be kept alive for the duration of the application.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or a global
/// subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<LoggingGuard, LoggingError> {
    ensure_log_directory(&config.log_directory)?;

    let file_appender = RollingFileAppender::new(Rotation::NEVER, &config.log_directory, LOG_FILE_NAME);
    let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);

    // RUST_LOG overrides the console filter only.
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(crate_directives(config.console_level)));
    let file_filter = EnvFilter::new(crate_directives(config.file_level));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_ansi(config.console_ansi)
        .event_format(LineFormat::new(LineStyle::Bracketed))
        .with_filter(console_filter);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .event_format(LineFormat::new(LineStyle::Timestamped))
        .with_filter(file_filter);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

fn ensure_log_directory(path: &Path) -> Result<(), LoggingError> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| LoggingError::DirectoryCreationFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    }
    Ok(())
}

/// Filter directives: warnings from dependencies, `level` for our crates.
fn crate_directives(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    format!("warn,playsync={level},playsync_core={level}")
}

/// Errors that can occur during logging initialization.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// Failed to create the log directory.
    #[error("Failed to create log directory {path}: {reason}")]
    DirectoryCreationFailed {
        /// The path that could not be created.
        path: PathBuf,
        /// The reason for the failure.
        reason: String,
    },

    /// A global subscriber was already set.
    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}
