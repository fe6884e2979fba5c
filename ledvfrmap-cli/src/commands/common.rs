//! Helpers shared across CLI commands.

use std::path::{Path, PathBuf};

use ledvfrmap::color::Rgb;
use ledvfrmap::config::{default_config_path, MapConfig};
use ledvfrmap::estimator::Classification;

use crate::error::CliError;

/// Resolve the config path, falling back to the default location.
pub fn config_path(config: Option<PathBuf>) -> PathBuf {
    config.unwrap_or_else(default_config_path)
}

/// Load the map configuration.
pub fn load_config(path: &Path) -> Result<MapConfig, CliError> {
    Ok(MapConfig::load_from(path)?)
}

/// One table row of classification output.
pub fn classification_row(
    led: usize,
    code: &str,
    classification: Classification,
    color: Rgb,
) -> String {
    format!(
        "{:>4}  {:<6} {:<16} {}",
        led,
        code,
        classification.to_string(),
        color
    )
}

/// One table row of traffic output.
pub fn traffic_row(led: usize, code: &str, aircraft: usize, color: Rgb) -> String {
    format!("{:>4}  {:<6} {:>5} {}", led, code, aircraft, color)
}
