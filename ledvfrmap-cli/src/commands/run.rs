//! `ledvfrmap run`: drive the map until interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use ledvfrmap::display::LogDriver;
use ledvfrmap::logging::{default_log_dir, default_log_file, init_logging};
use ledvfrmap::orchestrator::MapOrchestrator;
use ledvfrmap::source::JsonFileSource;
use tracing::info;

use super::common::{config_path, load_config};
use crate::error::CliError;

/// Run the refresh and display loops until Ctrl-C or SIGTERM, then clear the strip.
pub fn run(
    config: Option<PathBuf>,
    observations: PathBuf,
    log_dir: Option<PathBuf>,
) -> Result<(), CliError> {
    let log_dir = log_dir.unwrap_or_else(default_log_dir);
    let _logging_guard =
        init_logging(&log_dir, default_log_file()).map_err(CliError::LoggingInit)?;

    let path = config_path(config);
    let config = load_config(&path)?;
    info!(
        version = ledvfrmap::VERSION,
        config = %path.display(),
        "Starting ledvfrmap"
    );

    let driver = LogDriver::new(config.effective_led_count());
    let source = JsonFileSource::new(observations);
    let orchestrator =
        MapOrchestrator::from_map_config(&config, Arc::new(source), Box::new(driver))?;

    let token = orchestrator.cancellation_token();
    ctrlc::set_handler(move || {
        info!("Shutdown signal received");
        token.cancel();
    })
    .map_err(|e| CliError::Runtime(format!("Failed to set signal handler: {}", e)))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(format!("Failed to create runtime: {}", e)))?;

    runtime.block_on(orchestrator.run());
    info!("ledvfrmap stopped");
    Ok(())
}
