//! Configuration module for tray-downloader
//!
//! Holds the on-disk layout next to the executable and the user settings
//! read from `system/config.toml`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, ConfigError};
