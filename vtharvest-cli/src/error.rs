//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use vtharvest::config::ConfigFileError;
use vtharvest::convert::ConvertError;
use vtharvest::fetch::FetchError;
use vtharvest::HarvestError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(ConfigFileError),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// A harvest stage failed
    Harvest(HarvestError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Harvest(HarvestError::Convert(ConvertError::Spawn { program, .. })) => {
                eprintln!();
                eprintln!("'{}' could not be started. Make sure GDAL is installed:", program);
                eprintln!("  Debian/Ubuntu: sudo apt install gdal-bin");
                eprintln!("  macOS:         brew install gdal");
                eprintln!("or point [convert] ogr2ogr in config.ini at the binary.");
            }
            CliError::Harvest(HarvestError::Fetch(FetchError::Status { status, .. }))
                if *status == 401 || *status == 403 =>
            {
                eprintln!();
                eprintln!("The tile server refused the request. Some servers require a");
                eprintln!("Referer header; set [source] referer in config.ini or use --referer.");
            }
            CliError::Harvest(HarvestError::Fetch(_)) => {
                eprintln!();
                eprintln!("Tiles downloaded so far are kept. Run the command again to resume.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::Harvest(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::Harvest(e) => Some(e),
            CliError::LoggingInit(_) => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<HarvestError> for CliError {
    fn from(e: HarvestError) -> Self {
        CliError::Harvest(e)
    }
}
