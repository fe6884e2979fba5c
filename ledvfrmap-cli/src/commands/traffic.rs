//! `ledvfrmap traffic`: aircraft density per station from a positions file.

use std::path::PathBuf;

use ledvfrmap::station::StationRegistry;
use ledvfrmap::traffic::{read_positions, TrafficDensity};

use super::common::{config_path, load_config, traffic_row};
use crate::error::CliError;

/// Tally aircraft per station and print counts with their colors.
pub fn run(config: Option<PathBuf>, positions: PathBuf, radius: f64) -> Result<(), CliError> {
    let config = load_config(&config_path(config))?;
    let registry = StationRegistry::build(&config.registry_config())?;
    let positions = read_positions(&positions).map_err(CliError::Positions)?;

    let density = TrafficDensity::tally(&registry, positions, radius);
    let gradient = density.gradient();

    println!(
        "{} aircraft within {} mi of a station, {} out of range",
        density.attributed(),
        radius,
        density.ignored()
    );
    println!();

    for station in registry.stations() {
        let code = station.code();
        let color = density.color_for(code, &gradient);
        println!("{}", traffic_row(station.led(), code, density.count(code), color));
    }
    Ok(())
}
