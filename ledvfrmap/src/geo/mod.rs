//! Geographic coordinates and great-circle distance.
//!
//! The spatial index treats latitude/longitude as a flat 2-D plane, which is
//! fine for "which airport is closest" at short range. Anything that needs a
//! real distance (traffic radius checks, nearest-station lookups) goes through
//! [`haversine_miles`] instead.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in statute miles.
pub const EARTH_RADIUS_MILES: f64 = 3958.756;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees, positive north.
    pub latitude: f64,
    /// Longitude in degrees, positive east.
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// The point as a planar `[latitude, longitude]` pair for the spatial index.
    pub fn as_plane(&self) -> [f64; 2] {
        [self.latitude, self.longitude]
    }

    /// Whether both components are finite and inside the valid degree ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", self.latitude, self.longitude)
    }
}

/// Haversine distance between two points in statute miles.
pub fn haversine_miles(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1.0 for antipodal points
    2.0 * EARTH_RADIUS_MILES * h.sqrt().min(1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    const KHPN: GeoPoint = GeoPoint {
        latitude: 41.0670,
        longitude: -73.7076,
    };
    const KJFK: GeoPoint = GeoPoint {
        latitude: 40.6398,
        longitude: -73.7789,
    };

    #[test]
    fn test_haversine_zero_for_same_point() {
        assert_eq!(haversine_miles(KHPN, KHPN), 0.0);
    }

    #[test]
    fn test_haversine_known_distance() {
        // White Plains to JFK is roughly 29.7 statute miles
        let d = haversine_miles(KHPN, KJFK);
        assert!((d - 29.7).abs() < 0.5, "got {}", d);
    }

    #[test]
    fn test_haversine_is_symmetric() {
        assert!((haversine_miles(KHPN, KJFK) - haversine_miles(KJFK, KHPN)).abs() < 1e-9);
    }

    #[test]
    fn test_antipodal_points_do_not_nan() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.0, 180.0);
        let d = haversine_miles(a, b);
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_MILES).abs() < 1e-6);
    }

    #[test]
    fn test_validity() {
        assert!(KHPN.is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, f64::NAN).is_valid());
    }
}
