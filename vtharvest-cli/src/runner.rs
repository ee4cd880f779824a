//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and harvester
//! creation to reduce duplication across command handlers.

use std::future::Future;
use std::path::{Path, PathBuf};

use tracing::info;
use vtharvest::config::{config_file_path, ConfigFile, HarvestConfig, DEFAULT_LOG_FILE};
use vtharvest::logging::{init_logging, LoggingGuard};
use vtharvest::progress::ProgressSink;
use vtharvest::Harvester;

use crate::commands::common::{GlobalArgs, RegionArgs};
use crate::error::CliError;
use crate::ui::TerminalSink;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
    /// Where the configuration was loaded from
    config_path: PathBuf,
}

impl CliRunner {
    /// Load the config file and initialize logging.
    ///
    /// Uses `--config` when given, otherwise `~/.vtharvest/config.ini`. A
    /// missing file yields the defaults.
    pub fn new(global: &GlobalArgs) -> Result<Self, CliError> {
        let config_path = global.config.clone().unwrap_or_else(config_file_path);
        let config = ConfigFile::load_from(&config_path)?;

        let log_path = &config.logging.file;
        let log_dir = log_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let log_file = log_path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());

        let logging_guard = init_logging(log_dir, &log_file, global.debug)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
            config_path,
        })
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("vtharvest v{}", vtharvest::VERSION);
        info!(config = %self.config_path.display(), "vtharvest CLI: {} command", command);
    }

    /// Run configuration from the config file with CLI overrides applied.
    pub fn harvest_config(&self, overrides: RegionArgs) -> HarvestConfig {
        overrides.apply(HarvestConfig::from(&self.config))
    }

    /// Create a harvester, rendering progress on the terminal when stdout
    /// is a TTY. Logs keep stderr to themselves.
    pub fn create_harvester(&self, config: HarvestConfig) -> Result<Harvester, CliError> {
        let harvester = Harvester::new(config)?;
        if atty::is(atty::Stream::Stdout) {
            return Ok(harvester.with_progress(Box::new(|label: &str| {
                Box::new(TerminalSink::new(label)) as Box<dyn ProgressSink>
            })));
        }
        Ok(harvester)
    }

    /// Drive an async stage to completion on a multi-thread runtime.
    pub fn block_on<F: Future>(&self, future: F) -> Result<F::Output, CliError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(CliError::Runtime)?;
        Ok(runtime.block_on(future))
    }
}
