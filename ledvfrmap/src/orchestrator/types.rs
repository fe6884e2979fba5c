//! Orchestrator types and errors

use std::fmt;

use chrono::{DateTime, Utc};

use crate::color::Rgb;
use crate::config::ConfigFileError;
use crate::estimator::Classification;
use crate::observation::Observation;
use crate::station::RegistryError;

/// Errors that stop the map from starting.
#[derive(Debug)]
pub enum OrchestratorError {
    /// Configuration file could not be loaded
    Config(ConfigFileError),
    /// Station configuration is invalid
    Registry(RegistryError),
    /// The strip has fewer pixels than the registry needs
    StripTooShort { pixels: usize, required: usize },
}

impl fmt::Display for OrchestratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrchestratorError::Config(e) => write!(f, "Configuration error: {}", e),
            OrchestratorError::Registry(e) => write!(f, "Station configuration error: {}", e),
            OrchestratorError::StripTooShort { pixels, required } => write!(
                f,
                "LED strip has {} pixels but the configuration needs {}",
                pixels, required
            ),
        }
    }
}

impl std::error::Error for OrchestratorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OrchestratorError::Config(e) => Some(e),
            OrchestratorError::Registry(e) => Some(e),
            OrchestratorError::StripTooShort { .. } => None,
        }
    }
}

impl From<ConfigFileError> for OrchestratorError {
    fn from(e: ConfigFileError) -> Self {
        OrchestratorError::Config(e)
    }
}

impl From<RegistryError> for OrchestratorError {
    fn from(e: RegistryError) -> Self {
        OrchestratorError::Registry(e)
    }
}

/// Current view of one station, for status reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct StationStatus {
    /// Station identifier
    pub code: String,
    /// Human-readable name
    pub name: String,
    /// LED index
    pub led: usize,
    /// Reported, estimated or unknown category
    pub classification: Classification,
    /// Color from the station's policy
    pub color: Rgb,
    /// Whether the LED is currently meant to be lit
    pub lit: bool,
    /// Latest observation, if any
    pub observation: Option<Observation>,
}

/// Counters for the two periodic activities.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapStats {
    /// Successful observation refreshes
    pub refreshes: u64,
    /// Failed observation fetches
    pub refresh_failures: u64,
    /// Message of the most recent fetch failure
    pub last_refresh_error: Option<String>,
    /// When the most recent fetch failure happened
    pub last_refresh_error_at: Option<DateTime<Utc>>,
    /// Display cycles run
    pub display_cycles: u64,
    /// Display cycles whose flush failed
    pub flush_failures: u64,
}
