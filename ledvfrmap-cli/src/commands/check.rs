//! `ledvfrmap check`: validate the configuration.

use std::path::PathBuf;

use ledvfrmap::station::StationRegistry;

use super::common::{config_path, load_config};
use crate::error::CliError;

/// Load the config, build the registry and print what it resolved to.
pub fn run(config: Option<PathBuf>) -> Result<(), CliError> {
    let path = config_path(config);
    let config = load_config(&path)?;
    let registry = StationRegistry::build(&config.registry_config())?;

    println!("Config: {}", path.display());
    println!(
        "{} stations on {} LEDs, display: {}",
        registry.len(),
        registry.led_count(),
        config.display
    );
    println!();

    for station in registry.stations() {
        let neighbors: Vec<&str> = registry.neighbors(station).map(|n| n.code()).collect();
        println!(
            "{:>4}  {:<6} {:<30} {}",
            station.led(),
            station.code(),
            station.name(),
            station.location()
        );
        if !neighbors.is_empty() {
            println!("      neighbors: {}", neighbors.join(", "));
        }
    }

    println!();
    println!("Configuration OK");
    Ok(())
}
