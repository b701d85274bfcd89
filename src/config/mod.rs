//! Configuration module
//!
//! Handles application settings: port, transmission and display defaults, and
//! per-device parameter overrides

mod settings;

pub use settings::{AppConfig, DeviceParameters, DisplaySettings, TransmissionSettings};

use directories::ProjectDirs;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration file name inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Platform has no home/config directory
    #[error("Could not determine config directory")]
    NoConfigDir,

    /// Reading or writing the file failed
    #[error("Config file error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid TOML for [`AppConfig`]
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config could not be written as TOML
    #[error("Could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "talkersim", "Talkersim")
}

/// Get the application configuration directory
pub fn config_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the application data directory
pub fn data_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
}

/// Get the log directory
pub fn log_dir() -> Option<PathBuf> {
    data_dir().map(|d| d.join("logs"))
}

/// Default config file path
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join(CONFIG_FILE))
}

/// Initialize application directories
pub fn init_directories() -> std::io::Result<()> {
    if let Some(dir) = config_dir() {
        std::fs::create_dir_all(&dir)?;
    }
    if let Some(dir) = log_dir() {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(())
}
