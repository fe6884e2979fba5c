//! Observation data model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sky-cover token meaning "no measurable ceiling".
pub const CLEAR_SKY_COVER: &str = "CLR";

/// FAA flight category, best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FlightCategory {
    /// Visual flight rules.
    Vfr,
    /// Marginal visual flight rules.
    Mvfr,
    /// Instrument flight rules.
    Ifr,
    /// Low instrument flight rules.
    Lifr,
}

impl FlightCategory {
    /// All categories, best first.
    pub const ALL: [FlightCategory; 4] = [
        FlightCategory::Vfr,
        FlightCategory::Mvfr,
        FlightCategory::Ifr,
        FlightCategory::Lifr,
    ];

    /// The standard abbreviation ("VFR", "MVFR", ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightCategory::Vfr => "VFR",
            FlightCategory::Mvfr => "MVFR",
            FlightCategory::Ifr => "IFR",
            FlightCategory::Lifr => "LIFR",
        }
    }
}

impl fmt::Display for FlightCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a flight category.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown flight category: {0}")]
pub struct ParseCategoryError(pub String);

impl FromStr for FlightCategory {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "VFR" => Ok(FlightCategory::Vfr),
            "MVFR" => Ok(FlightCategory::Mvfr),
            "IFR" => Ok(FlightCategory::Ifr),
            "LIFR" => Ok(FlightCategory::Lifr),
            _ => Err(ParseCategoryError(s.to_string())),
        }
    }
}

/// Latest weather observation for one station.
///
/// Every field is optional because reports routinely omit them. Values are
/// replaced wholesale on refresh, never patched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Observation {
    /// Reported flight category, if the source supplied one.
    pub flight_category: Option<FlightCategory>,
    /// Cloud base of the lowest broken/overcast layer, feet AGL.
    pub ceiling_ft_agl: Option<f64>,
    /// Sky-cover token, e.g. "CLR", "BKN", "OVC".
    pub sky_cover: Option<String>,
    /// Horizontal visibility in statute miles.
    pub visibility_statute_mi: Option<f64>,
    /// Sustained wind speed in knots.
    pub wind_speed_kt: Option<f64>,
    /// Wind gust speed in knots.
    pub wind_gust_kt: Option<f64>,
    /// Air temperature in degrees Celsius.
    pub temperature_c: Option<f64>,
    /// When the observation was taken.
    pub observation_time: Option<DateTime<Utc>>,
}

impl Observation {
    /// Create an empty observation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reported flight category.
    pub fn with_category(mut self, category: FlightCategory) -> Self {
        self.flight_category = Some(category);
        self
    }

    /// Set the ceiling in feet AGL.
    pub fn with_ceiling(mut self, feet: f64) -> Self {
        self.ceiling_ft_agl = Some(feet);
        self
    }

    /// Set the sky-cover token.
    pub fn with_sky_cover(mut self, token: impl Into<String>) -> Self {
        self.sky_cover = Some(token.into());
        self
    }

    /// Set visibility in statute miles.
    pub fn with_visibility(mut self, miles: f64) -> Self {
        self.visibility_statute_mi = Some(miles);
        self
    }

    /// Set the sustained wind in knots.
    pub fn with_wind(mut self, knots: f64) -> Self {
        self.wind_speed_kt = Some(knots);
        self
    }

    /// Set the gust speed in knots.
    pub fn with_gust(mut self, knots: f64) -> Self {
        self.wind_gust_kt = Some(knots);
        self
    }

    /// Set the temperature in degrees Celsius.
    pub fn with_temperature(mut self, celsius: f64) -> Self {
        self.temperature_c = Some(celsius);
        self
    }

    /// Set the observation time.
    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.observation_time = Some(time);
        self
    }

    /// Whether the sky cover is the "clear" sentinel.
    pub fn is_clear_sky(&self) -> bool {
        self.sky_cover
            .as_deref()
            .is_some_and(|s| s.trim().eq_ignore_ascii_case(CLEAR_SKY_COVER))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse_and_display() {
        for category in FlightCategory::ALL {
            let parsed: FlightCategory = category.to_string().parse().unwrap();
            assert_eq!(parsed, category);
        }
        assert_eq!("mvfr".parse::<FlightCategory>(), Ok(FlightCategory::Mvfr));
        assert!("VMC".parse::<FlightCategory>().is_err());
    }

    #[test]
    fn test_category_ordering_best_first() {
        assert!(FlightCategory::Vfr < FlightCategory::Mvfr);
        assert!(FlightCategory::Ifr < FlightCategory::Lifr);
    }

    #[test]
    fn test_clear_sky_detection() {
        assert!(Observation::new().with_sky_cover("CLR").is_clear_sky());
        assert!(Observation::new().with_sky_cover(" clr ").is_clear_sky());
        assert!(!Observation::new().with_sky_cover("OVC").is_clear_sky());
        assert!(!Observation::new().is_clear_sky());
    }

    #[test]
    fn test_deserialize_partial_json() {
        let json = r#"{"flight_category": "IFR", "visibility_statute_mi": 2.5}"#;
        let obs: Observation = serde_json::from_str(json).unwrap();
        assert_eq!(obs.flight_category, Some(FlightCategory::Ifr));
        assert_eq!(obs.visibility_statute_mi, Some(2.5));
        assert_eq!(obs.ceiling_ft_agl, None);
    }

    #[test]
    fn test_deserialize_timestamp() {
        let json = r#"{"observation_time": "2024-05-01T12:53:00Z"}"#;
        let obs: Observation = serde_json::from_str(json).unwrap();
        assert_eq!(
            obs.observation_time.map(|t| t.to_rfc3339()),
            Some("2024-05-01T12:53:00+00:00".to_string())
        );
    }
}
