//! Application configuration management.
//!
//! Every pipeline step receives an [`AppConfig`] by reference instead of
//! reading process-wide constants, so tests can point the whole tool at a
//! temporary directory tree.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, FileSystemError, Result};

/// Default maximum number of concurrent playlist downloads.
pub const DEFAULT_MAX_CONCURRENT_DOWNLOADS: usize = 3;

/// Minimum allowed concurrent downloads.
pub const MIN_CONCURRENT_DOWNLOADS: usize = 1;

/// Maximum allowed concurrent downloads.
pub const MAX_CONCURRENT_DOWNLOADS: usize = 3;

/// Default marker inserted before the extension of intermediate files.
pub const DEFAULT_TEMP_MARKER: &str = "_temp";

/// Names of the external programs the pipeline shells out to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolConfig {
    /// Playlist downloader.
    #[serde(default = "default_downloader")]
    pub downloader: String,
    /// Audio/image muxer used for thumbnail embedding.
    #[serde(default = "default_muxer")]
    pub muxer: String,
    /// Media-scanner broadcast utility.
    #[serde(default = "default_media_scanner")]
    pub media_scanner: String,
    /// Device notification command.
    #[serde(default = "default_notifier")]
    pub notifier: String,
    /// Command acquiring the device wake lock.
    #[serde(default = "default_wake_lock")]
    pub wake_lock: String,
    /// Command releasing the device wake lock.
    #[serde(default = "default_wake_unlock")]
    pub wake_unlock: String,
}

fn default_downloader() -> String {
    "yt-dlp".to_string()
}

fn default_muxer() -> String {
    "ffmpeg".to_string()
}

fn default_media_scanner() -> String {
    "am".to_string()
}

fn default_notifier() -> String {
    "termux-notification".to_string()
}

fn default_wake_lock() -> String {
    "termux-wake-lock".to_string()
}

fn default_wake_unlock() -> String {
    "termux-wake-unlock".to_string()
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            downloader: default_downloader(),
            muxer: default_muxer(),
            media_scanner: default_media_scanner(),
            notifier: default_notifier(),
            wake_lock: default_wake_lock(),
            wake_unlock: default_wake_unlock(),
        }
    }
}

impl ToolConfig {
    /// Commands that must be on `PATH` before any pipeline phase starts.
    #[must_use]
    pub fn required_commands(&self, use_wake_lock: bool) -> Vec<String> {
        let mut commands = vec![
            self.downloader.clone(),
            self.muxer.clone(),
            self.notifier.clone(),
            self.media_scanner.clone(),
        ];
        if use_wake_lock {
            commands.push(self.wake_lock.clone());
            commands.push(self.wake_unlock.clone());
        }
        commands
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Directory the downloader writes into.
    pub download_dir: PathBuf,
    /// Device music folder that finished files are copied to.
    pub music_dir: PathBuf,
    /// Directory holding the log file and the download archive.
    pub log_dir: PathBuf,
    /// Archive file used by the downloader to skip known entries.
    pub archive_file: PathBuf,
    /// Fallback cover art for files without their own thumbnail.
    pub default_thumbnail: PathBuf,
    /// Audio extension produced by the downloader.
    #[serde(default = "default_audio_format")]
    pub audio_format: String,
    /// Extension of companion thumbnail files.
    #[serde(default = "default_thumbnail_format")]
    pub thumbnail_format: String,
    /// Audio quality in kbps passed to the downloader.
    #[serde(default = "default_audio_quality")]
    pub audio_quality: String,
    /// Marker identifying intermediate files, e.g. `song_temp.m4a`.
    #[serde(default = "default_temp_marker")]
    pub temp_marker: String,
    /// Maximum number of concurrent playlist downloads.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_downloads: usize,
    /// Playlists fetched by the download phase.
    #[serde(default)]
    pub playlist_urls: Vec<String>,
    /// External program names.
    #[serde(default)]
    pub tools: ToolConfig,
    /// Send device notifications on download completion.
    #[serde(default = "default_true")]
    pub notifications: bool,
    /// Hold a device wake lock while downloading.
    #[serde(default = "default_true")]
    pub wake_lock: bool,
    /// Ask the media scanner to index each synced file.
    #[serde(default = "default_true")]
    pub media_scan_after_sync: bool,
    /// Compare digests of source and destination after each copy.
    #[serde(default = "default_true")]
    pub verify_copies: bool,
}

fn default_audio_format() -> String {
    "m4a".to_string()
}

fn default_thumbnail_format() -> String {
    "png".to_string()
}

fn default_audio_quality() -> String {
    "192".to_string()
}

fn default_temp_marker() -> String {
    DEFAULT_TEMP_MARKER.to_string()
}

const fn default_max_concurrent() -> usize {
    DEFAULT_MAX_CONCURRENT_DOWNLOADS
}

const fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::rooted_at(&default_base_directory())
    }
}

impl AppConfig {
    /// Build a configuration whose working directories live under `base`.
    ///
    /// The music directory keeps its device default; tests override it.
    #[must_use]
    pub fn rooted_at(base: &Path) -> Self {
        let log_dir = base.join(".logs");
        Self {
            download_dir: base.join("downloads"),
            music_dir: default_music_directory(),
            archive_file: log_dir.join("downloaded_songs.txt"),
            log_dir,
            default_thumbnail: base.join(".DigiArt").join("default_thumb.png"),
            audio_format: default_audio_format(),
            thumbnail_format: default_thumbnail_format(),
            audio_quality: default_audio_quality(),
            temp_marker: default_temp_marker(),
            max_concurrent_downloads: DEFAULT_MAX_CONCURRENT_DOWNLOADS,
            playlist_urls: Vec::new(),
            tools: ToolConfig::default(),
            notifications: true,
            wake_lock: true,
            media_scan_after_sync: true,
            verify_copies: true,
        }
    }

    /// Load configuration from the default location, creating it if missing.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from `path`, or write and return defaults if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        let Some(mut config) = Self::read_from(path)? else {
            debug!("Config file not found at {}, using defaults", path.display());
            let config = Self::default();
            if let Err(e) = config.save_to(path) {
                warn!("Failed to save default config: {}", e);
            }
            return Ok(config);
        };
        config.validate();

        info!("Loaded config from {}", path.display());
        debug!(
            "Download directory: {}, music directory: {}",
            config.download_dir.display(),
            config.music_dir.display()
        );

        Ok(config)
    }

    /// Parse the configuration at `path` as written, or `None` if there is no
    /// file. Nothing is logged, validated or written.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn read_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|e| FileSystemError::ReadFailed {
            path: path.to_path_buf(),
            reason: format!("Failed to read config file: {e}"),
        })?;

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| Error::Configuration(format!("Failed to parse config file: {e}")))
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| FileSystemError::CreateDirFailed {
                path: parent.to_path_buf(),
                reason: format!("Failed to create config directory: {e}"),
            })?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| FileSystemError::WriteFailed {
            path: path.to_path_buf(),
            reason: format!("Failed to write config file: {e}"),
        })?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Clamp values that are only meaningful within a range.
    pub fn validate(&mut self) {
        let requested = self.max_concurrent_downloads;
        self.max_concurrent_downloads =
            requested.clamp(MIN_CONCURRENT_DOWNLOADS, MAX_CONCURRENT_DOWNLOADS);
        if requested != self.max_concurrent_downloads {
            warn!(
                "max_concurrent_downloads {} out of range, using {}",
                requested, self.max_concurrent_downloads
            );
        }
        if self.temp_marker.is_empty() {
            warn!("Empty temp_marker, using {}", DEFAULT_TEMP_MARKER);
            self.temp_marker = default_temp_marker();
        }
    }

    /// Create the download and log directories.
    ///
    /// Also warns when the default thumbnail is missing, since every embed
    /// would then fail.
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.download_dir, &self.log_dir] {
            fs::create_dir_all(dir).map_err(|e| FileSystemError::CreateDirFailed {
                path: dir.clone(),
                reason: e.to_string(),
            })?;
        }

        if !self.default_thumbnail.exists() {
            warn!(
                "Default thumbnail not found at {}. Please ensure it exists.",
                self.default_thumbnail.display()
            );
        }
        Ok(())
    }

    /// Get the path to the default config file.
    #[must_use]
    pub fn config_file_path() -> PathBuf {
        config_file_path()
    }
}

/// Get the default working directory for downloads and logs.
#[must_use]
pub fn default_base_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Workspace")
        .join("music_sync_tool")
}

/// Get the default device music directory.
#[must_use]
pub fn default_music_directory() -> PathBuf {
    PathBuf::from("/storage/emulated/0/Music")
}

fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| dirs::data_local_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("playsync")
        .join("config.json")
}
