//! Station registry construction and queries.

use std::collections::{HashMap, HashSet};

use crate::geo::{haversine_miles, GeoPoint};
use crate::spatial::SpatialIndex;

use super::error::RegistryError;

/// Configuration-supplied description of one station.
#[derive(Debug, Clone, PartialEq)]
pub struct StationDescriptor {
    /// Station identifier, e.g. "KHPN".
    pub code: String,
    /// Human-readable name.
    pub name: Option<String>,
    /// LED slot on the strip.
    pub led: usize,
    /// Station location.
    pub location: GeoPoint,
    /// Codes of stations used to estimate missing data for this one.
    pub neighbors: Vec<String>,
}

impl StationDescriptor {
    /// Create a descriptor with no name and no neighbors.
    pub fn new(code: impl Into<String>, led: usize, latitude: f64, longitude: f64) -> Self {
        Self {
            code: code.into(),
            name: None,
            led,
            location: GeoPoint::new(latitude, longitude),
            neighbors: Vec::new(),
        }
    }

    /// Set the human-readable name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the declared neighbor codes.
    pub fn with_neighbors<I, S>(mut self, neighbors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.neighbors = neighbors.into_iter().map(Into::into).collect();
        self
    }
}

/// Everything needed to build a [`StationRegistry`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistryConfig {
    /// Number of addressable LEDs on the strip.
    pub led_count: usize,
    /// Neighbors to assign automatically to stations that declare none (0 = off).
    pub auto_neighbors: usize,
    /// Station descriptors in configuration order.
    pub stations: Vec<StationDescriptor>,
}

impl RegistryConfig {
    /// Create a config for `led_count` LEDs.
    pub fn new(led_count: usize, stations: Vec<StationDescriptor>) -> Self {
        Self {
            led_count,
            auto_neighbors: 0,
            stations,
        }
    }

    /// Enable automatic nearest-neighbor assignment.
    pub fn with_auto_neighbors(mut self, count: usize) -> Self {
        self.auto_neighbors = count;
        self
    }
}

/// A registered station. Immutable once the registry is built.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    code: String,
    name: Option<String>,
    location: GeoPoint,
    led: usize,
    /// Registry positions of resolved neighbors.
    neighbors: Vec<usize>,
}

impl Station {
    /// Station identifier.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Human-readable name, falling back to the code.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.code)
    }

    /// Station location.
    pub fn location(&self) -> GeoPoint {
        self.location
    }

    /// LED slot.
    pub fn led(&self) -> usize {
        self.led
    }

    /// Whether any neighbors were resolved for this station.
    pub fn has_neighbors(&self) -> bool {
        !self.neighbors.is_empty()
    }
}

impl std::fmt::Display for Station {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.code)
    }
}

/// The fixed set of stations with LED slots and neighbor lists.
///
/// # Example
///
/// ```
/// use ledvfrmap::station::{RegistryConfig, StationDescriptor, StationRegistry};
///
/// let config = RegistryConfig::new(3, vec![
///     StationDescriptor::new("KHPN", 0, 41.067, -73.708).with_neighbors(["KLGA"]),
///     StationDescriptor::new("KLGA", 1, 40.777, -73.873),
/// ]);
///
/// let registry = StationRegistry::build(&config).unwrap();
/// let khpn = registry.get("KHPN").unwrap();
/// let neighbors: Vec<_> = registry.neighbors(khpn).map(|s| s.code()).collect();
/// assert_eq!(neighbors, vec!["KLGA"]);
/// ```
#[derive(Debug)]
pub struct StationRegistry {
    stations: Vec<Station>,
    by_code: HashMap<String, usize>,
    index: SpatialIndex<usize>,
    led_count: usize,
}

impl StationRegistry {
    /// Validate `config` and build the registry.
    ///
    /// # Errors
    ///
    /// Returns a configuration [`RegistryError`] for a duplicated or
    /// out-of-range LED slot, a duplicated or empty code, an invalid location,
    /// or a neighbor code that cannot be resolved.
    pub fn build(config: &RegistryConfig) -> Result<Self, RegistryError> {
        let mut stations = Vec::with_capacity(config.stations.len());
        let mut by_code = HashMap::with_capacity(config.stations.len());
        let mut led_owner: HashMap<usize, &str> = HashMap::new();

        // Pass 1: create every station so neighbors can refer forward
        for descriptor in &config.stations {
            let code = descriptor.code.trim();
            if code.is_empty() {
                return Err(RegistryError::EmptyCode);
            }
            if descriptor.led >= config.led_count {
                return Err(RegistryError::LedOutOfRange {
                    station: code.to_string(),
                    led: descriptor.led,
                    led_count: config.led_count,
                });
            }
            if let Some(first) = led_owner.insert(descriptor.led, code) {
                return Err(RegistryError::DuplicateLed {
                    led: descriptor.led,
                    first: first.to_string(),
                    second: code.to_string(),
                });
            }
            if !descriptor.location.is_valid() {
                return Err(RegistryError::InvalidLocation {
                    station: code.to_string(),
                    location: descriptor.location,
                });
            }
            if by_code.insert(code.to_string(), stations.len()).is_some() {
                return Err(RegistryError::DuplicateStation(code.to_string()));
            }

            stations.push(Station {
                code: code.to_string(),
                name: descriptor.name.clone(),
                location: descriptor.location,
                led: descriptor.led,
                neighbors: Vec::new(),
            });
        }

        // Pass 2: spatial index over all stations
        let index = SpatialIndex::build(
            stations
                .iter()
                .enumerate()
                .map(|(position, station)| (station.location.as_plane(), position))
                .collect(),
        );
        debug_assert_eq!(index.len(), stations.len());

        // Pass 3: resolve neighbors
        for (position, descriptor) in config.stations.iter().enumerate() {
            let code = &stations[position].code;
            let neighbors = if descriptor.neighbors.is_empty() && config.auto_neighbors > 0 {
                nearest_others(&index, stations[position].location, position, config.auto_neighbors)
            } else {
                resolve_declared(code, &descriptor.neighbors, &by_code)?
            };
            if !neighbors.is_empty() {
                let codes: Vec<&str> = neighbors.iter().map(|&n| stations[n].code.as_str()).collect();
                tracing::debug!(station = %code, neighbors = ?codes, "Resolved neighbors");
            }
            stations[position].neighbors = neighbors;
        }

        tracing::info!(
            stations = stations.len(),
            led_count = config.led_count,
            "Station registry built"
        );

        Ok(Self {
            stations,
            by_code,
            index,
            led_count: config.led_count,
        })
    }

    /// Look up a station by code.
    pub fn get(&self, code: &str) -> Result<&Station, RegistryError> {
        self.lookup(code)
            .ok_or_else(|| RegistryError::NotFound(code.to_string()))
    }

    /// Look up a station by code, `None` if unknown.
    pub fn lookup(&self, code: &str) -> Option<&Station> {
        self.by_code.get(code).map(|&i| &self.stations[i])
    }

    /// The station driving LED slot `led`.
    pub fn station_for_led(&self, led: usize) -> Option<&Station> {
        self.stations.iter().find(|s| s.led == led)
    }

    /// All stations in configuration order.
    pub fn stations(&self) -> impl Iterator<Item = &Station> {
        self.stations.iter()
    }

    /// All station codes in configuration order.
    pub fn codes(&self) -> Vec<String> {
        self.stations.iter().map(|s| s.code.clone()).collect()
    }

    /// Resolved neighbors of `station`.
    pub fn neighbors<'a>(&'a self, station: &'a Station) -> impl Iterator<Item = &'a Station> {
        station.neighbors.iter().map(move |&i| &self.stations[i])
    }

    /// Number of registered stations.
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    /// Whether no stations are registered.
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Addressable LED count the registry was validated against.
    pub fn led_count(&self) -> usize {
        self.led_count
    }

    /// The station nearest to `point` (planar lat/lon distance) with its
    /// great-circle distance in statute miles.
    pub fn nearest_station(&self, point: GeoPoint) -> Option<(&Station, f64)> {
        let (_, &position) = self.index.nearest(point.as_plane())?;
        let station = &self.stations[position];
        Some((station, haversine_miles(point, station.location)))
    }

    /// Up to `k` stations nearest to `point`, closest first.
    pub fn nearest_stations(&self, point: GeoPoint, k: usize) -> Vec<&Station> {
        self.index
            .k_nearest(point.as_plane(), k)
            .into_iter()
            .map(|n| &self.stations[*n.payload])
            .collect()
    }
}

fn resolve_declared(
    code: &str,
    declared: &[String],
    by_code: &HashMap<String, usize>,
) -> Result<Vec<usize>, RegistryError> {
    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(declared.len());
    for neighbor in declared {
        let neighbor = neighbor.trim();
        if neighbor == code {
            return Err(RegistryError::SelfNeighbor(code.to_string()));
        }
        let &position = by_code
            .get(neighbor)
            .ok_or_else(|| RegistryError::UnknownNeighbor {
                station: code.to_string(),
                neighbor: neighbor.to_string(),
            })?;
        if seen.insert(position) {
            resolved.push(position);
        }
    }
    Ok(resolved)
}

fn nearest_others(
    index: &SpatialIndex<usize>,
    location: GeoPoint,
    own_position: usize,
    count: usize,
) -> Vec<usize> {
    index
        .k_nearest(location.as_plane(), count + 1)
        .into_iter()
        .map(|n| *n.payload)
        .filter(|&p| p != own_position)
        .take(count)
        .collect()
}
