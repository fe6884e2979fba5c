//! `ledvfrmap classify`: one-shot classification from a snapshot file.

use std::path::PathBuf;

use ledvfrmap::color::StationSample;
use ledvfrmap::estimator::classify;
use ledvfrmap::source::{JsonFileSource, ObservationSource};
use ledvfrmap::station::StationRegistry;

use super::common::{classification_row, config_path, load_config};
use crate::error::CliError;

/// Classify and color every station once, printing a table.
pub fn run(config: Option<PathBuf>, observations: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path(config))?;
    let registry = StationRegistry::build(&config.registry_config())?;
    let source = JsonFileSource::new(observations);
    let observations = source.fetch(&registry.codes())?;
    let policy = config.display.policy();

    println!(
        "{} of {} stations reporting, display: {}",
        observations.len(),
        registry.len(),
        config.display
    );
    println!();

    for station in registry.stations() {
        let classification = classify(station, &registry, &observations);
        let color = policy.color_for(&StationSample {
            station,
            classification,
            observation: observations.get(station.code()),
        });
        println!(
            "{}",
            classification_row(station.led(), station.code(), classification, color)
        );
    }
    Ok(())
}
