//! Application settings

use super::ConfigError;
use crate::core::device::{MessageKind, ParameterSnapshot};
use crate::core::scheduler::{FailurePolicy, DEFAULT_INTERVAL_MS};
use crate::core::transport::SerialConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Transmission settings
    pub transmission: TransmissionSettings,
    /// Display settings
    pub display: DisplaySettings,
    /// Serial port settings
    pub port: SerialConfig,
    /// Per-device parameter overrides
    pub parameters: DeviceParameters,
}

impl AppConfig {
    /// Load config from the default location, or defaults if there is none
    pub fn load() -> Result<Self, ConfigError> {
        let path = super::config_path().ok_or(ConfigError::NoConfigDir)?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = super::config_path().ok_or(ConfigError::NoConfigDir)?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        self.save_to(&path)
    }

    /// Save config to a specific file
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Parameters for a device: its defaults with configured overrides on top
    pub fn parameters_for(&self, kind: MessageKind) -> ParameterSnapshot {
        kind.spec()
            .default_snapshot()
            .merged(self.parameters.overrides(kind))
    }

    /// Failure policy from the transmission settings
    pub fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy {
            max_consecutive_failures: self.transmission.max_consecutive_failures,
        }
    }
}

/// Transmission settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransmissionSettings {
    /// Device simulated when none is given on the command line
    pub device: MessageKind,
    /// Tick interval in milliseconds
    pub interval_ms: u64,
    /// Consecutive send failures before stopping (0 = never)
    pub max_consecutive_failures: u32,
}

impl Default for TransmissionSettings {
    fn default() -> Self {
        Self {
            device: MessageKind::default(),
            interval_ms: DEFAULT_INTERVAL_MS,
            max_consecutive_failures: FailurePolicy::default().max_consecutive_failures,
        }
    }
}

/// Display settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Prefix displayed lines with a timestamp
    pub timestamps: bool,
    /// Lines kept in the in-memory log
    pub log_capacity: usize,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            timestamps: true,
            log_capacity: 1000,
        }
    }
}

/// Parameter overrides per device kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceParameters {
    /// Compass repeater
    pub compass: ParameterSnapshot,
    /// Echo-sounder repeater
    pub sonar: ParameterSnapshot,
    /// Orientation sensor
    pub sensor: ParameterSnapshot,
}

impl DeviceParameters {
    /// Overrides for one kind
    pub fn overrides(&self, kind: MessageKind) -> &ParameterSnapshot {
        match kind {
            MessageKind::Compass => &self.compass,
            MessageKind::Sonar => &self.sonar,
            MessageKind::Sensor => &self.sensor,
        }
    }

    /// Mutable overrides for one kind
    pub fn overrides_mut(&mut self, kind: MessageKind) -> &mut ParameterSnapshot {
        match kind {
            MessageKind::Compass => &mut self.compass,
            MessageKind::Sonar => &mut self.sonar,
            MessageKind::Sensor => &mut self.sensor,
        }
    }
}
