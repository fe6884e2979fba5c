//! Configuration file loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use super::defaults::*;
use crate::color::DisplayMode;
use crate::station::{RegistryConfig, StationDescriptor};

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read the config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Malformed INI text
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] ini::ParseError),

    /// Config file does not exist
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Required key missing
    #[error("Missing configuration: {section}.{key}")]
    MissingValue { section: String, key: String },

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// Complete map configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    /// Pixels on the strip. Zero means "one past the highest station LED".
    pub led_count: usize,
    /// Time between observation refreshes.
    pub refresh_interval: Duration,
    /// Time between display cycles.
    pub display_interval: Duration,
    /// Neighbors filled in for stations that declare none.
    pub auto_neighbors: usize,
    /// What the LEDs show.
    pub display: DisplayMode,
    /// Blink stations gusting at or above this many knots.
    pub gust_alert_kt: Option<f64>,
    /// Force a full rewrite this often.
    pub resync_interval: Option<Duration>,
    /// Stations in file order.
    pub stations: Vec<StationDescriptor>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            led_count: 0,
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            display_interval: Duration::from_millis(DEFAULT_DISPLAY_INTERVAL_MS),
            auto_neighbors: DEFAULT_AUTO_NEIGHBORS,
            display: DisplayMode::default(),
            gust_alert_kt: None,
            resync_interval: None,
            stations: Vec::new(),
        }
    }
}

impl MapConfig {
    /// Load from the default path (`~/.ledvfrmap/config.ini`).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&default_config_path())
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Err(ConfigFileError::NotFound(path.to_path_buf()));
        }
        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Parse INI text.
    pub fn parse(text: &str) -> Result<Self, ConfigFileError> {
        let ini = Ini::load_from_str(text)?;
        super::parser::parse_ini(&ini)
    }

    /// Strip length, derived from the stations when not configured.
    pub fn effective_led_count(&self) -> usize {
        if self.led_count > 0 {
            self.led_count
        } else {
            self.stations
                .iter()
                .map(|s| s.led + 1)
                .max()
                .unwrap_or(0)
        }
    }

    /// Input for [`StationRegistry::build`](crate::station::StationRegistry::build).
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig::new(self.effective_led_count(), self.stations.clone())
            .with_auto_neighbors(self.auto_neighbors)
    }
}

/// Get the path to the config directory (~/.ledvfrmap).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Get the path to the config file (~/.ledvfrmap/config.ini).
pub fn default_config_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}
