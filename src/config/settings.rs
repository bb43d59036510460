//! User settings stored in `system/config.toml`

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::paths::AppPaths;
use crate::domain::download::CommandTemplate;
use crate::domain::hotkey::{HotkeyBindings, HotkeyParseError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write config {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error(transparent)]
    Hotkey(#[from] HotkeyParseError),
}

/// Global hotkeys as written by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeyConfig {
    /// Reads the clipboard and queues the link
    pub add: String,
    /// Hands every queued link to the downloader
    pub download: String,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            add: "ctrl+space".to_string(),
            download: "ctrl+shift+space".to_string(),
        }
    }
}

/// How links are taken from the clipboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Send Ctrl+C first so a highlighted link is copied
    pub copy_selection: bool,
    /// Wait after the synthetic Ctrl+C before reading
    pub copy_delay_ms: u64,
    /// Skip links that are already queued
    pub skip_duplicates: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            copy_selection: false,
            copy_delay_ms: 200,
            skip_duplicates: false,
        }
    }
}

/// External downloader invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloaderConfig {
    pub program: String,
    pub args: Vec<String>,
    /// Flag receiving the target folder; empty string disables it
    pub output_flag: String,
    pub playlist_args: Vec<String>,
    /// Keep the shell window of every launch visible
    pub show_console: bool,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            program: "yt-dlp".to_string(),
            args: Vec::new(),
            output_flag: "-P".to_string(),
            playlist_args: vec!["--yes-playlist".to_string()],
            show_console: false,
        }
    }
}

impl DownloaderConfig {
    pub fn template(&self) -> CommandTemplate {
        CommandTemplate {
            program: self.program.clone(),
            args: self.args.clone(),
            output_flag: Some(self.output_flag.clone()).filter(|flag| !flag.is_empty()),
            playlist_args: self.playlist_args.clone(),
        }
    }
}

/// Global configuration loaded from `system/config.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Show tray balloons after a dispatch and for problems
    pub notifications: bool,
    /// Route links into per-site subfolders
    pub route_by_site: bool,
    /// Base download folder; `Downloads` next to the executable when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloads_dir: Option<PathBuf>,
    pub hotkeys: HotkeyConfig,
    pub capture: CaptureConfig,
    pub downloader: DownloaderConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            notifications: true,
            route_by_site: true,
            downloads_dir: None,
            hotkeys: HotkeyConfig::default(),
            capture: CaptureConfig::default(),
            downloader: DownloaderConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, creating a default file if none exists
    pub fn load_or_init(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            tracing::info!("created default config at {}", path.display());
            return Ok(config);
        }
        Self::load(path)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(self)?;
        let write_error = |source: io::Error| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        fs::write(path, text).map_err(write_error)
    }

    pub fn hotkey_bindings(&self) -> Result<HotkeyBindings, ConfigError> {
        Ok(HotkeyBindings::parse(&self.hotkeys.add, &self.hotkeys.download)?)
    }

    /// Base download folder, relative paths resolved against the app root
    pub fn downloads_base(&self, paths: &AppPaths) -> PathBuf {
        match &self.downloads_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => paths.root.join(dir),
            None => paths.default_downloads_dir.clone(),
        }
    }
}
