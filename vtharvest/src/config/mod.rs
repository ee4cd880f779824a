//! Configuration for harvest runs.
//!
//! [`ConfigFile`] mirrors the INI file at `~/.vtharvest/config.ini`, one
//! struct per `[section]`. [`HarvestConfig`] is the builder-style run
//! configuration the library consumes; the CLI derives it from the file and
//! applies command-line overrides on top.

mod defaults;
mod file;
mod harvest;
mod parser;
mod settings;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use harvest::HarvestConfig;
pub use settings::{
    CacheSettings, ConfigFile, ConvertSettings, FetchSettings, LoggingSettings, MergeSettings,
    RegionSettings, SourceSettings,
};
