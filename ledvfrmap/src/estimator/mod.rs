//! Flight category classification and neighbor-based estimation.
//!
//! A reported category is always authoritative. When a station does not
//! report one, ceiling and visibility are taken from its own observation
//! where present and otherwise averaged over its neighbors, then run through
//! fixed FAA-style bands.
//!
//! ```text
//! ceiling > 3000 ft   AND visibility > 5 mi        → VFR
//! 1000..=3000 ft      AND 3..=5 mi                 → MVFR
//! 500..1000 ft        OR  1..3 mi                  → IFR
//! < 500 ft            OR  < 1 mi                   → LIFR
//! anything else (gaps in the banding)              → Unknown
//! ```
//!
//! Estimated results are tagged [`Classification::Estimated`] so callers can
//! tell them apart from reported values.

use std::fmt;

use crate::observation::{FlightCategory, Observation, ObservationLookup};
use crate::station::{Station, StationRegistry};

/// Synthetic ceiling used for a "CLR" sky cover, in feet.
pub const CLEAR_SKY_CEILING_FT: f64 = 5000.0;

/// Result of classifying one station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Category reported by the observation itself.
    Reported(FlightCategory),
    /// Category estimated from ceiling/visibility (own or neighbors').
    Estimated(FlightCategory),
    /// Not enough data, or the values fall into a banding gap.
    Unknown,
}

impl Classification {
    /// The category regardless of provenance.
    pub fn category(&self) -> Option<FlightCategory> {
        match self {
            Classification::Reported(c) | Classification::Estimated(c) => Some(*c),
            Classification::Unknown => None,
        }
    }

    /// Whether this is a best-effort estimate.
    pub fn is_estimated(&self) -> bool {
        matches!(self, Classification::Estimated(_))
    }

    /// Whether this came straight from the observation.
    pub fn is_reported(&self) -> bool {
        matches!(self, Classification::Reported(_))
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Reported(c) => write!(f, "{}", c),
            Classification::Estimated(c) => write!(f, "{} (estimated)", c),
            Classification::Unknown => f.write_str("unknown"),
        }
    }
}

/// Where an estimated value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    /// The station's own observation.
    Own,
    /// Average over this many contributing neighbors.
    Neighbors(usize),
}

/// Ceiling and visibility gathered for estimation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conditions {
    /// Ceiling in feet AGL.
    pub ceiling_ft: f64,
    /// Where the ceiling came from.
    pub ceiling_source: ValueSource,
    /// Visibility in statute miles.
    pub visibility_mi: f64,
    /// Where the visibility came from.
    pub visibility_source: ValueSource,
}

/// Classify a station.
///
/// Returns the reported category unchanged when present and otherwise
/// attempts an estimate. Neighbor data never overrides a reported category.
pub fn classify<L>(
    station: &Station,
    registry: &StationRegistry,
    observations: &L,
) -> Classification
where
    L: ObservationLookup + ?Sized,
{
    let own = observations.observation(station.code());

    if let Some(category) = own.and_then(|o| o.flight_category) {
        return Classification::Reported(category);
    }

    let Some(conditions) = estimate_conditions(station, registry, observations) else {
        tracing::trace!(station = %station, "Insufficient data to estimate category");
        return Classification::Unknown;
    };

    match categorize(conditions.ceiling_ft, conditions.visibility_mi) {
        Some(category) => {
            tracing::trace!(
                station = %station,
                ceiling_ft = conditions.ceiling_ft,
                visibility_mi = conditions.visibility_mi,
                category = %category,
                "Estimated flight category"
            );
            Classification::Estimated(category)
        }
        None => Classification::Unknown,
    }
}

/// Gather ceiling and visibility for a station.
///
/// Each value comes from the station's own observation if it has one, else
/// from the mean over neighbors that contribute a value. Returns `None` if
/// either value cannot be determined.
pub fn estimate_conditions<L>(
    station: &Station,
    registry: &StationRegistry,
    observations: &L,
) -> Option<Conditions>
where
    L: ObservationLookup + ?Sized,
{
    let own = observations.observation(station.code());
    let neighbors: Vec<&Observation> = registry
        .neighbors(station)
        .filter_map(|n| observations.observation(n.code()))
        .collect();

    let (ceiling_ft, ceiling_source) = match own.and_then(own_ceiling) {
        Some(value) => (value, ValueSource::Own),
        None => average(neighbors.iter().filter_map(|o| neighbor_ceiling(o)))?,
    };

    let (visibility_mi, visibility_source) =
        match own.and_then(|o| finite(o.visibility_statute_mi)) {
            Some(value) => (value, ValueSource::Own),
            None => average(
                neighbors
                    .iter()
                    .filter_map(|o| finite(o.visibility_statute_mi)),
            )?,
        };

    Some(Conditions {
        ceiling_ft,
        ceiling_source,
        visibility_mi,
        visibility_source,
    })
}

/// Map ceiling/visibility onto a category using the fixed bands.
///
/// Returns `None` for combinations that fall between bands, e.g. a high
/// ceiling with visibility in (1, 3].
pub fn categorize(ceiling_ft: f64, visibility_mi: f64) -> Option<FlightCategory> {
    if ceiling_ft > 3000.0 && visibility_mi > 5.0 {
        Some(FlightCategory::Vfr)
    } else if (1000.0..=3000.0).contains(&ceiling_ft) && (3.0..=5.0).contains(&visibility_mi) {
        Some(FlightCategory::Mvfr)
    } else if (500.0..1000.0).contains(&ceiling_ft) || (1.0..3.0).contains(&visibility_mi) {
        Some(FlightCategory::Ifr)
    } else if ceiling_ft < 500.0 || visibility_mi < 1.0 {
        Some(FlightCategory::Lifr)
    } else {
        None
    }
}

/// Own ceiling: the reported cloud base, or the clear-sky synthetic value.
fn own_ceiling(observation: &Observation) -> Option<f64> {
    finite(observation.ceiling_ft_agl).or_else(|| {
        observation
            .is_clear_sky()
            .then_some(CLEAR_SKY_CEILING_FT)
    })
}

/// Neighbor ceiling: "CLR" counts as the synthetic value; any other sky cover
/// without a numeric base contributes nothing.
fn neighbor_ceiling(observation: &Observation) -> Option<f64> {
    if observation.is_clear_sky() {
        Some(CLEAR_SKY_CEILING_FT)
    } else {
        finite(observation.ceiling_ft_agl)
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Mean of the values, `None` when there are none.
fn average(values: impl Iterator<Item = f64>) -> Option<(f64, ValueSource)> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        return None;
    }
    Some((sum / count as f64, ValueSource::Neighbors(count)))
}
