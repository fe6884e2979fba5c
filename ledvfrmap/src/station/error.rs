//! Station registry errors.

use thiserror::Error;

use crate::geo::GeoPoint;

/// Configuration problems detected while building the registry, plus lookups
/// of unknown stations.
///
/// Every variant except `NotFound` is fatal at startup.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    /// LED slot is outside `[0, led_count)`.
    #[error("station {station}: LED {led} is out of range (LED count is {led_count})")]
    LedOutOfRange {
        station: String,
        led: usize,
        led_count: usize,
    },

    /// Two stations claim the same LED slot.
    #[error("LED {led} is assigned to both {first} and {second}")]
    DuplicateLed {
        led: usize,
        first: String,
        second: String,
    },

    /// A station code appears more than once.
    #[error("station {0} is defined more than once")]
    DuplicateStation(String),

    /// A station code is empty.
    #[error("station code must not be empty")]
    EmptyCode,

    /// Coordinates are not finite or out of range.
    #[error("station {station}: invalid location {location}")]
    InvalidLocation { station: String, location: GeoPoint },

    /// A declared neighbor does not exist.
    #[error("station {station}: unknown neighbor {neighbor}")]
    UnknownNeighbor { station: String, neighbor: String },

    /// A station lists itself as a neighbor.
    #[error("station {0} lists itself as a neighbor")]
    SelfNeighbor(String),

    /// Lookup of a station that is not registered.
    #[error("station {0} not found")]
    NotFound(String),
}

impl RegistryError {
    /// Whether this error is a configuration problem (as opposed to a lookup miss).
    pub fn is_configuration(&self) -> bool {
        !matches!(self, RegistryError::NotFound(_))
    }
}
