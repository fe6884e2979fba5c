//! INI parsing logic for converting `Ini` → `MapConfig`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::str::FromStr;
use std::time::Duration;

use ini::{Ini, Properties};
use tracing::warn;

use super::defaults::STATION_SECTION_PREFIX;
use super::file::{ConfigFileError, MapConfig};
use crate::station::StationDescriptor;

const MAP_SECTION: &str = "map";

const NON_NEGATIVE: &str = "must be a non-negative integer";
const POSITIVE_SECS: &str = "must be a positive integer (seconds)";
const POSITIVE_MS: &str = "must be a positive integer (milliseconds)";
const POSITIVE_KNOTS: &str = "must be a positive number (knots)";

/// Parse an `Ini` object into a `MapConfig`.
///
/// Starts from `MapConfig::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<MapConfig, ConfigFileError> {
    let mut config = MapConfig::default();

    // [map] section
    if let Some(section) = ini.section(Some(MAP_SECTION)) {
        if let Some(v) = section.get("led_count") {
            config.led_count = parse_value(MAP_SECTION, "led_count", v, NON_NEGATIVE)?;
        }
        if let Some(v) = section.get("refresh_interval_secs") {
            let secs: u64 = parse_value(MAP_SECTION, "refresh_interval_secs", v, POSITIVE_SECS)?;
            if secs == 0 {
                return Err(invalid(MAP_SECTION, "refresh_interval_secs", v, POSITIVE_SECS));
            }
            config.refresh_interval = Duration::from_secs(secs);
        }
        if let Some(v) = section.get("display_interval_ms") {
            let ms: u64 = parse_value(MAP_SECTION, "display_interval_ms", v, POSITIVE_MS)?;
            if ms == 0 {
                return Err(invalid(MAP_SECTION, "display_interval_ms", v, POSITIVE_MS));
            }
            config.display_interval = Duration::from_millis(ms);
        }
        if let Some(v) = section.get("auto_neighbors") {
            config.auto_neighbors = parse_value(MAP_SECTION, "auto_neighbors", v, NON_NEGATIVE)?;
        }
        if let Some(v) = section.get("display") {
            config.display = parse_value(
                MAP_SECTION,
                "display",
                v,
                "must be one of: flight_category, temperature, wind, gust",
            )?;
        }
        if let Some(v) = section.get("gust_alert_kt") {
            let v = v.trim();
            if !v.is_empty() {
                let knots: f64 = parse_value(MAP_SECTION, "gust_alert_kt", v, POSITIVE_KNOTS)?;
                if !(knots.is_finite() && knots > 0.0) {
                    return Err(invalid(MAP_SECTION, "gust_alert_kt", v, POSITIVE_KNOTS));
                }
                config.gust_alert_kt = Some(knots);
            }
        }
        if let Some(v) = section.get("resync_interval_secs") {
            let secs: u64 = parse_value(
                MAP_SECTION,
                "resync_interval_secs",
                v,
                "must be a non-negative integer (seconds, 0 disables)",
            )?;
            config.resync_interval = (secs > 0).then(|| Duration::from_secs(secs));
        }
    }

    // [station.CODE] sections
    for (name, properties) in ini.iter() {
        let Some(name) = name else {
            continue;
        };
        if name == MAP_SECTION {
            continue;
        }
        match name.strip_prefix(STATION_SECTION_PREFIX) {
            Some(code) => config.stations.push(parse_station(name, code, properties)?),
            None => warn!(section = name, "Ignoring unknown config section"),
        }
    }

    Ok(config)
}

fn parse_station(
    section: &str,
    code: &str,
    properties: &Properties,
) -> Result<StationDescriptor, ConfigFileError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(invalid(
            section,
            "code",
            code,
            "station section needs a code, e.g. [station.KHPN]",
        ));
    }

    let led: usize = parse_value(
        section,
        "led",
        required(section, properties, "led")?,
        NON_NEGATIVE,
    )?;
    let latitude: f64 = parse_value(
        section,
        "latitude",
        required(section, properties, "latitude")?,
        "must be a number in [-90, 90]",
    )?;
    let longitude: f64 = parse_value(
        section,
        "longitude",
        required(section, properties, "longitude")?,
        "must be a number in [-180, 180]",
    )?;

    let mut station = StationDescriptor::new(code, led, latitude, longitude);

    if let Some(v) = properties.get("name") {
        let v = v.trim();
        if !v.is_empty() {
            station = station.with_name(v);
        }
    }
    if let Some(v) = properties.get("neighbors") {
        station = station.with_neighbors(v.split(',').map(str::trim).filter(|n| !n.is_empty()));
    }

    Ok(station)
}

fn required<'a>(
    section: &str,
    properties: &'a Properties,
    key: &str,
) -> Result<&'a str, ConfigFileError> {
    properties.get(key).ok_or_else(|| ConfigFileError::MissingValue {
        section: section.to_string(),
        key: key.to_string(),
    })
}

fn parse_value<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value.trim().parse().map_err(|_| invalid(section, key, value, reason))
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
