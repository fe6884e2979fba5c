//! Color policies.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use crate::estimator::Classification;
use crate::observation::{FlightCategory, Observation};
use crate::station::Station;

use super::gradient::{Gradient, DEFAULT_GRADIENT_STEPS};
use super::rgb::{palette, Rgb};

/// Everything a policy may look at when picking a station's color.
#[derive(Debug, Clone, Copy)]
pub struct StationSample<'a> {
    /// The station being colored.
    pub station: &'a Station,
    /// Its classification for this cycle.
    pub classification: Classification,
    /// Its current observation, if any.
    pub observation: Option<&'a Observation>,
}

/// Strategy that maps a station sample to a color.
pub trait ColorPolicy: Send + Sync + fmt::Debug {
    /// Color for this sample.
    fn color_for(&self, sample: &StationSample<'_>) -> Rgb;

    /// Short name for logs and status output.
    fn name(&self) -> &str;
}

/// Flight-category palette.
///
/// # Example
///
/// ```
/// use ledvfrmap::color::{palette, CategoryPolicy};
/// use ledvfrmap::observation::FlightCategory;
///
/// let policy = CategoryPolicy::default();
/// assert_eq!(policy.color_for_category(Some(FlightCategory::Vfr)), palette::GREEN);
/// assert_eq!(policy.color_for_category(None), palette::OFF);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryPolicy {
    vfr: Rgb,
    mvfr: Rgb,
    ifr: Rgb,
    lifr: Rgb,
    unknown: Rgb,
}

impl Default for CategoryPolicy {
    fn default() -> Self {
        Self {
            vfr: palette::GREEN,
            mvfr: palette::BLUE,
            ifr: palette::RED,
            lifr: palette::MAGENTA,
            unknown: palette::OFF,
        }
    }
}

impl CategoryPolicy {
    /// Override the color for one category.
    pub fn with_color(mut self, category: FlightCategory, color: Rgb) -> Self {
        match category {
            FlightCategory::Vfr => self.vfr = color,
            FlightCategory::Mvfr => self.mvfr = color,
            FlightCategory::Ifr => self.ifr = color,
            FlightCategory::Lifr => self.lifr = color,
        }
        self
    }

    /// Color for a category, or the unknown color for `None`.
    pub fn color_for_category(&self, category: Option<FlightCategory>) -> Rgb {
        match category {
            Some(FlightCategory::Vfr) => self.vfr,
            Some(FlightCategory::Mvfr) => self.mvfr,
            Some(FlightCategory::Ifr) => self.ifr,
            Some(FlightCategory::Lifr) => self.lifr,
            None => self.unknown,
        }
    }
}

impl ColorPolicy for CategoryPolicy {
    fn color_for(&self, sample: &StationSample<'_>) -> Rgb {
        self.color_for_category(sample.classification.category())
    }

    fn name(&self) -> &str {
        "flight_category"
    }
}

/// Scalar observation field a gradient can display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Temperature in °C.
    Temperature,
    /// Sustained wind in knots.
    WindSpeed,
    /// Gust speed in knots.
    WindGust,
    /// Ceiling in feet AGL.
    Ceiling,
    /// Visibility in statute miles.
    Visibility,
}

impl Metric {
    /// Read this metric from an observation.
    pub fn extract(&self, observation: &Observation) -> Option<f64> {
        let value = match self {
            Metric::Temperature => observation.temperature_c,
            Metric::WindSpeed => observation.wind_speed_kt,
            Metric::WindGust => observation.wind_gust_kt,
            Metric::Ceiling => observation.ceiling_ft_agl,
            Metric::Visibility => observation.visibility_statute_mi,
        };
        value.filter(|v| v.is_finite())
    }

    /// Short name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Temperature => "temperature",
            Metric::WindSpeed => "wind",
            Metric::WindGust => "gust",
            Metric::Ceiling => "ceiling",
            Metric::Visibility => "visibility",
        }
    }
}

/// Gradient over one observation metric. A station without the metric
/// renders off.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientPolicy {
    metric: Metric,
    gradient: Gradient,
}

impl GradientPolicy {
    /// Color `metric` through `gradient`.
    pub fn new(metric: Metric, gradient: Gradient) -> Self {
        Self { metric, gradient }
    }

    /// Temperature from -20 °C (violet) to 40 °C (red).
    pub fn temperature() -> Self {
        let mut stops = palette::ROYGBIV;
        stops.reverse();
        Self::preset(Metric::Temperature, -20.0, 40.0, &stops)
    }

    /// Wind speed from calm (green) to 40 kt (red).
    pub fn wind() -> Self {
        Self::preset(
            Metric::WindSpeed,
            0.0,
            40.0,
            &[palette::GREEN, palette::YELLOW, palette::RED],
        )
    }

    /// Gusts from calm (green) to 40 kt (red).
    pub fn gust() -> Self {
        Self::preset(
            Metric::WindGust,
            0.0,
            40.0,
            &[palette::GREEN, palette::YELLOW, palette::RED],
        )
    }

    fn preset(metric: Metric, low: f64, high: f64, stops: &[Rgb]) -> Self {
        // Preset domains and stops are constant and valid
        let gradient = match Gradient::new(low, high, stops, DEFAULT_GRADIENT_STEPS) {
            Ok(gradient) => gradient,
            Err(e) => unreachable!("invalid preset gradient: {}", e),
        };
        Self { metric, gradient }
    }

    /// The metric this policy reads.
    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// The underlying gradient.
    pub fn gradient(&self) -> &Gradient {
        &self.gradient
    }

    /// Color for a raw metric value.
    pub fn color_for_value(&self, value: f64) -> Rgb {
        self.gradient.color_for_value(value)
    }
}

impl ColorPolicy for GradientPolicy {
    fn color_for(&self, sample: &StationSample<'_>) -> Rgb {
        sample
            .observation
            .and_then(|o| self.metric.extract(o))
            .map_or(palette::OFF, |v| self.gradient.color_for_value(v))
    }

    fn name(&self) -> &str {
        self.metric.as_str()
    }
}

/// Display mode selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// Flight category colors.
    #[default]
    FlightCategory,
    /// Temperature gradient.
    Temperature,
    /// Wind speed gradient.
    Wind,
    /// Gust gradient.
    Gust,
}

impl DisplayMode {
    /// The policy implementing this mode.
    pub fn policy(&self) -> Arc<dyn ColorPolicy> {
        match self {
            DisplayMode::FlightCategory => Arc::new(CategoryPolicy::default()),
            DisplayMode::Temperature => Arc::new(GradientPolicy::temperature()),
            DisplayMode::Wind => Arc::new(GradientPolicy::wind()),
            DisplayMode::Gust => Arc::new(GradientPolicy::gust()),
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DisplayMode::FlightCategory => "flight_category",
            DisplayMode::Temperature => "temperature",
            DisplayMode::Wind => "wind",
            DisplayMode::Gust => "gust",
        })
    }
}

/// Unrecognised display mode string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown display mode: {0}")]
pub struct ParseDisplayModeError(pub String);

impl FromStr for DisplayMode {
    type Err = ParseDisplayModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flight_category" | "category" => Ok(DisplayMode::FlightCategory),
            "temperature" | "temp" => Ok(DisplayMode::Temperature),
            "wind" => Ok(DisplayMode::Wind),
            "gust" => Ok(DisplayMode::Gust),
            _ => Err(ParseDisplayModeError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::station::{RegistryConfig, StationDescriptor, StationRegistry};

    fn one_station() -> StationRegistry {
        StationRegistry::build(&RegistryConfig::new(
            1,
            vec![StationDescriptor::new("KHPN", 0, 41.0, -73.7)],
        ))
        .unwrap()
    }

    #[test]
    fn test_default_category_palette() {
        let policy = CategoryPolicy::default();
        assert_eq!(policy.color_for_category(Some(FlightCategory::Vfr)), palette::GREEN);
        assert_eq!(policy.color_for_category(Some(FlightCategory::Mvfr)), palette::BLUE);
        assert_eq!(policy.color_for_category(Some(FlightCategory::Ifr)), palette::RED);
        assert_eq!(policy.color_for_category(Some(FlightCategory::Lifr)), palette::MAGENTA);
        assert_eq!(policy.color_for_category(None), palette::OFF);
    }

    #[test]
    fn test_category_policy_uses_estimates_too() {
        let registry = one_station();
        let station = registry.get("KHPN").unwrap();
        let policy = CategoryPolicy::default();

        let sample = StationSample {
            station,
            classification: Classification::Estimated(FlightCategory::Ifr),
            observation: None,
        };
        assert_eq!(policy.color_for(&sample), palette::RED);

        let unknown = StationSample {
            classification: Classification::Unknown,
            ..sample
        };
        assert_eq!(policy.color_for(&unknown), palette::OFF);
    }

    #[test]
    fn test_category_override() {
        let policy = CategoryPolicy::default().with_color(FlightCategory::Lifr, palette::VIOLET);
        assert_eq!(policy.color_for_category(Some(FlightCategory::Lifr)), palette::VIOLET);
    }

    #[test]
    fn test_gradient_missing_metric_is_off() {
        let registry = one_station();
        let station = registry.get("KHPN").unwrap();
        let policy = GradientPolicy::temperature();
        let observation = Observation::new().with_wind(12.0);
        let sample = StationSample {
            station,
            classification: Classification::Unknown,
            observation: Some(&observation),
        };
        assert_eq!(policy.color_for(&sample), palette::OFF);

        let nothing = StationSample {
            observation: None,
            ..sample
        };
        assert_eq!(policy.color_for(&nothing), palette::OFF);
    }

    #[test]
    fn test_gradient_reads_metric() {
        let registry = one_station();
        let station = registry.get("KHPN").unwrap();
        let policy = GradientPolicy::wind();
        let calm = Observation::new().with_wind(0.0);
        let sample = StationSample {
            station,
            classification: Classification::Unknown,
            observation: Some(&calm),
        };
        assert_eq!(policy.color_for(&sample), palette::GREEN);
        assert_eq!(policy.name(), "wind");
    }

    #[test]
    fn test_temperature_preset_runs_cold_to_hot() {
        let policy = GradientPolicy::temperature();
        assert_eq!(policy.color_for_value(-40.0), palette::VIOLET);
        assert_eq!(policy.color_for_value(45.0), palette::RED);
        assert_eq!(policy.gradient().steps(), DEFAULT_GRADIENT_STEPS);
        assert_eq!(policy.gradient().domain(), (-20.0, 40.0));
    }

    #[test]
    fn test_custom_metric_gradient() {
        let gradient = Gradient::new(0.0, 10.0, &[palette::RED, palette::GREEN], 2).unwrap();
        let policy = GradientPolicy::new(Metric::Visibility, gradient);
        assert_eq!(policy.metric(), Metric::Visibility);
        assert_eq!(policy.color_for_value(9.0), palette::GREEN);
    }

    #[test]
    fn test_display_mode_parse() {
        assert_eq!(
            "flight_category".parse::<DisplayMode>(),
            Ok(DisplayMode::FlightCategory)
        );
        assert_eq!("Temperature".parse::<DisplayMode>(), Ok(DisplayMode::Temperature));
        assert_eq!("wind".parse::<DisplayMode>(), Ok(DisplayMode::Wind));
        assert_eq!("gust".parse::<DisplayMode>(), Ok(DisplayMode::Gust));
        assert!("traffic".parse::<DisplayMode>().is_err());
        assert_eq!(DisplayMode::Gust.policy().name(), "gust");
        assert_eq!(DisplayMode::Wind.to_string(), "wind");
    }
}
