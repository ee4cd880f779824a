//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.

use std::path::PathBuf;

use crate::coord::GeoBoundingBox;
use crate::fetch::UrlTemplate;

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub region: RegionSettings,
    pub source: SourceSettings,
    pub fetch: FetchSettings,
    pub merge: MergeSettings,
    pub cache: CacheSettings,
    pub convert: ConvertSettings,
    pub logging: LoggingSettings,
}

/// Area to harvest.
#[derive(Debug, Clone)]
pub struct RegionSettings {
    /// Dataset name, also the cache subdirectory
    pub name: String,
    pub bbox: GeoBoundingBox,
    pub zoom: u8,
}

/// Tile service.
#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub url: UrlTemplate,
    /// Sent as `Referer` header when set
    pub referer: Option<String>,
}

/// Download behaviour.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub concurrency: usize,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
}

/// Merge behaviour.
#[derive(Debug, Clone)]
pub struct MergeSettings {
    /// Layers dropped while decoding
    pub ignore_layers: Vec<String>,
    /// Gzip level 0-9 for layer streams
    pub compression: u32,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub directory: PathBuf,
}

/// External conversion tool.
#[derive(Debug, Clone)]
pub struct ConvertSettings {
    pub ogr2ogr: String,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub file: PathBuf,
}
