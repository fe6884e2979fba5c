//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use ledvfrmap::config::ConfigFileError;
use ledvfrmap::orchestrator::OrchestratorError;
use ledvfrmap::source::FetchError;
use ledvfrmap::station::RegistryError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(std::io::Error),
    /// Failed to load the config file
    Config(ConfigFileError),
    /// Station configuration is invalid
    Registry(RegistryError),
    /// The map could not start
    Startup(OrchestratorError),
    /// Observations could not be read
    Fetch(FetchError),
    /// Aircraft positions could not be read
    Positions(FetchError),
    /// Runtime or signal handler setup failed
    Runtime(String),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Config(ConfigFileError::NotFound(_)) => {
                eprintln!();
                eprintln!("Create a config file with a [map] section and one");
                eprintln!("[station.CODE] section per LED, or pass --config <path>.");
            }
            CliError::Registry(e) if e.is_configuration() => {
                eprintln!();
                eprintln!("Run 'ledvfrmap check' to validate the station list.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Config(e) => write!(f, "{}", e),
            CliError::Registry(e) => write!(f, "Invalid station configuration: {}", e),
            CliError::Startup(e) => write!(f, "Failed to start map: {}", e),
            CliError::Fetch(e) => write!(f, "Failed to read observations: {}", e),
            CliError::Positions(e) => write!(f, "Failed to read aircraft positions: {}", e),
            CliError::Runtime(msg) => write!(f, "Runtime error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::LoggingInit(e) => Some(e),
            CliError::Config(e) => Some(e),
            CliError::Registry(e) => Some(e),
            CliError::Startup(e) => Some(e),
            CliError::Fetch(e) => Some(e),
            CliError::Positions(e) => Some(e),
            CliError::Runtime(_) => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<RegistryError> for CliError {
    fn from(e: RegistryError) -> Self {
        CliError::Registry(e)
    }
}

impl From<OrchestratorError> for CliError {
    fn from(e: OrchestratorError) -> Self {
        CliError::Startup(e)
    }
}

impl From<FetchError> for CliError {
    fn from(e: FetchError) -> Self {
        CliError::Fetch(e)
    }
}
