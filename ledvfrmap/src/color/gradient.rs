//! Gradient lookup tables.

use thiserror::Error;

use super::rgb::{palette, Rgb};

/// Default number of entries in a gradient lookup table.
pub const DEFAULT_GRADIENT_STEPS: usize = 50;

/// Invalid gradient parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradientError {
    /// Domain is empty, reversed or not finite.
    #[error("invalid gradient domain [{low}, {high}]")]
    InvalidDomain { low: f64, high: f64 },
    /// No color stops were given.
    #[error("gradient needs at least one color stop")]
    NoStops,
    /// Table size of zero.
    #[error("gradient needs at least one step")]
    NoSteps,
}

/// A color lookup table over a numeric domain.
///
/// Values are clamped into `[low, high]`, scaled onto the table, and rounded
/// to the nearest entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    low: f64,
    high: f64,
    table: Vec<Rgb>,
}

impl Gradient {
    /// Build a table of `steps` entries through `stops` over `[low, high]`.
    pub fn new(low: f64, high: f64, stops: &[Rgb], steps: usize) -> Result<Self, GradientError> {
        if !(low.is_finite() && high.is_finite() && low < high) {
            return Err(GradientError::InvalidDomain { low, high });
        }
        if stops.is_empty() {
            return Err(GradientError::NoStops);
        }
        if steps == 0 {
            return Err(GradientError::NoSteps);
        }
        Ok(Self {
            low,
            high,
            table: multi_gradient(stops, steps),
        })
    }

    /// Number of table entries.
    pub fn steps(&self) -> usize {
        self.table.len()
    }

    /// The `[low, high]` domain.
    pub fn domain(&self) -> (f64, f64) {
        (self.low, self.high)
    }

    /// Color for a raw value. Non-finite values render off.
    pub fn color_for_value(&self, value: f64) -> Rgb {
        if !value.is_finite() {
            return palette::OFF;
        }
        let clamped = value.clamp(self.low, self.high);
        let scaled = (clamped - self.low) / (self.high - self.low);
        let last = self.table.len().saturating_sub(1);
        let index = ((scaled * last as f64).round() as usize).min(last);
        self.table.get(index).copied().unwrap_or(palette::OFF)
    }
}

/// `n` colors evenly spaced from `start` to `finish`, both included.
pub fn linear_gradient(start: Rgb, finish: Rgb, n: usize) -> Vec<Rgb> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => (0..n)
            .map(|i| start.lerp(finish, i as f64 / (n - 1) as f64))
            .collect(),
    }
}

/// `n` colors evenly spaced along the piecewise-linear path through `stops`.
///
/// The first and last entries are exactly the first and last stops.
pub fn multi_gradient(stops: &[Rgb], n: usize) -> Vec<Rgb> {
    match (stops, n) {
        ([], _) | (_, 0) => Vec::new(),
        ([only], _) => vec![*only; n],
        (_, 1) => vec![stops[0]],
        _ => {
            let segments = (stops.len() - 1) as f64;
            (0..n)
                .map(|i| {
                    let position = i as f64 / (n - 1) as f64 * segments;
                    let segment = (position.floor() as usize).min(stops.len() - 2);
                    let local = position - segment as f64;
                    stops[segment].lerp(stops[segment + 1], local)
                })
                .collect()
        }
    }
}
