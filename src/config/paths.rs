//! File locations next to the executable
//!
//! Everything the app persists lives beside the binary, so the whole folder
//! can be moved or carried on a USB stick.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const SYSTEM_DIR: &str = "system";
const LIST_FILE: &str = "download-list.txt";
const CONFIG_FILE: &str = "config.toml";
const LOG_FILE: &str = "tray-downloader.log";
const INFO_FILE: &str = "info.txt";
const DOWNLOADS_DIR: &str = "Downloads";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub root: PathBuf,
    pub system_dir: PathBuf,
    pub list_file: PathBuf,
    pub config_file: PathBuf,
    pub log_file: PathBuf,
    pub info_file: PathBuf,
    pub default_downloads_dir: PathBuf,
}

impl AppPaths {
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let system_dir = root.join(SYSTEM_DIR);
        Self {
            list_file: system_dir.join(LIST_FILE),
            config_file: system_dir.join(CONFIG_FILE),
            log_file: system_dir.join(LOG_FILE),
            info_file: system_dir.join(INFO_FILE),
            default_downloads_dir: root.join(DOWNLOADS_DIR),
            system_dir,
            root,
        }
    }

    /// Layout rooted at the directory of the running executable
    pub fn discover() -> io::Result<Self> {
        let exe = std::env::current_exe()?;
        let root = exe
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "executable has no parent directory"))?;
        Ok(Self::from_root(root))
    }

    pub fn ensure_system_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.system_dir)
    }
}
