//! Aircraft traffic density per station.
//!
//! Each aircraft position is attributed to its nearest station and counted
//! if it lies within a radius of it. The counts can be rendered through a
//! [`Gradient`] lookup table.
//!
//! Positions come from a JSON array of points:
//!
//! ```json
//! [
//!   { "latitude": 41.2, "longitude": -73.5 },
//!   { "latitude": 39.7, "longitude": -104.9 }
//! ]
//! ```

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::color::{palette, Gradient, Rgb, DEFAULT_GRADIENT_STEPS};
use crate::geo::GeoPoint;
use crate::source::FetchError;
use crate::station::StationRegistry;

/// Default attribution radius in statute miles.
pub const DEFAULT_TRAFFIC_RADIUS_MILES: f64 = 100.0;

/// Aircraft counts per station.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrafficDensity {
    counts: HashMap<String, usize>,
    attributed: usize,
    ignored: usize,
}

impl TrafficDensity {
    /// Count aircraft near each station.
    ///
    /// Positions farther than `radius_miles` from their nearest station, or
    /// with invalid coordinates, are ignored.
    pub fn tally<I>(registry: &StationRegistry, positions: I, radius_miles: f64) -> Self
    where
        I: IntoIterator<Item = GeoPoint>,
    {
        let mut density = Self::default();
        for position in positions {
            let nearest = position
                .is_valid()
                .then(|| registry.nearest_station(position))
                .flatten()
                .filter(|(_, miles)| *miles <= radius_miles);

            match nearest {
                Some((station, _)) => {
                    *density.counts.entry(station.code().to_string()).or_default() += 1;
                    density.attributed += 1;
                }
                None => density.ignored += 1,
            }
        }
        debug!(
            attributed = density.attributed,
            ignored = density.ignored,
            stations = density.counts.len(),
            "Tallied traffic"
        );
        density
    }

    /// Aircraft attributed to a station.
    pub fn count(&self, code: &str) -> usize {
        self.counts.get(code).copied().unwrap_or(0)
    }

    /// Highest count at any station.
    pub fn max_count(&self) -> usize {
        self.counts.values().copied().max().unwrap_or(0)
    }

    /// Aircraft attributed to some station.
    pub fn attributed(&self) -> usize {
        self.attributed
    }

    /// Aircraft out of range of every station.
    pub fn ignored(&self) -> usize {
        self.ignored
    }

    /// Stations with at least one aircraft.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(code, count)| (code.as_str(), *count))
    }

    /// Color for a station's count.
    pub fn color_for(&self, code: &str, gradient: &Gradient) -> Rgb {
        gradient.color_for_value(self.count(code) as f64)
    }

    /// Off for no traffic up to white for the busiest station.
    pub fn gradient(&self) -> Gradient {
        let high = self.max_count().max(1) as f64;
        match Gradient::new(0.0, high, &[palette::OFF, palette::WHITE], DEFAULT_GRADIENT_STEPS) {
            Ok(gradient) => gradient,
            Err(e) => unreachable!("invalid traffic gradient: {}", e),
        }
    }
}

/// Read aircraft positions from a JSON file.
pub fn read_positions(path: &Path) -> Result<Vec<GeoPoint>, FetchError> {
    let content = std::fs::read_to_string(path)?;
    let positions: Vec<GeoPoint> = serde_json::from_str(&content)?;
    debug!(path = %path.display(), positions = positions.len(), "Read aircraft positions");
    Ok(positions)
}
