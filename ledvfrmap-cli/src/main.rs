//! ledvfrmap CLI - Command-line interface
//!
//! Runs the LED weather map and offers offline checks of the configuration,
//! of an observation snapshot and of aircraft traffic around the stations.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ledvfrmap::traffic::DEFAULT_TRAFFIC_RADIUS_MILES;

#[derive(Parser)]
#[command(name = "ledvfrmap")]
#[command(version = ledvfrmap::VERSION)]
#[command(about = "Live aviation weather on an addressable LED map", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the map until Ctrl-C or SIGTERM
    Run {
        /// Config file (default: ~/.ledvfrmap/config.ini)
        #[arg(long)]
        config: Option<PathBuf>,

        /// JSON observation file, re-read on every refresh
        #[arg(long)]
        observations: PathBuf,

        /// Log directory (default: ~/.ledvfrmap/logs)
        #[arg(long)]
        log_dir: Option<PathBuf>,
    },

    /// Validate the config and print stations with their neighbors
    Check {
        /// Config file (default: ~/.ledvfrmap/config.ini)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Classify every station once from an observation file
    Classify {
        /// Config file (default: ~/.ledvfrmap/config.ini)
        #[arg(long)]
        config: Option<PathBuf>,

        /// JSON observation file
        #[arg(long)]
        observations: PathBuf,
    },

    /// Count aircraft near each station from a positions file
    Traffic {
        /// Config file (default: ~/.ledvfrmap/config.ini)
        #[arg(long)]
        config: Option<PathBuf>,

        /// JSON array of aircraft positions
        #[arg(long)]
        positions: PathBuf,

        /// Attribution radius in statute miles
        #[arg(long, default_value_t = DEFAULT_TRAFFIC_RADIUS_MILES)]
        radius: f64,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            observations,
            log_dir,
        } => commands::run::run(config, observations, log_dir),
        Commands::Check { config } => commands::check::run(config),
        Commands::Classify {
            config,
            observations,
        } => commands::classify::run(config, observations),
        Commands::Traffic {
            config,
            positions,
            radius,
        } => commands::traffic::run(config, positions, radius),
    };

    if let Err(e) = result {
        e.exit();
    }
}
