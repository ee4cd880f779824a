//! Default values for all configuration settings.

use std::path::PathBuf;
use std::time::Duration;

use super::settings::*;
use crate::coord::GeoBoundingBox;
use crate::fetch::{UrlTemplate, DEFAULT_CONCURRENCY, DEFAULT_TIMEOUT};
use crate::layers::DEFAULT_COMPRESSION;
use crate::mvt::DEFAULT_IGNORED_LAYER;

pub const DEFAULT_REGION_NAME: &str = "basemap.de";

/// Germany, `minLon,minLat,maxLon,maxLat`.
pub const DEFAULT_BBOX: [f64; 4] = [5.8, 47.2, 15.1, 55.1];

pub const DEFAULT_ZOOM: u8 = 15;

/// Maximum zoom accepted from configuration.
pub const MAX_ZOOM: u8 = 24;

pub const DEFAULT_TILE_URL: &str =
    "https://sgx.geodatenzentrum.de/gdz_basemapde_vektor/tiles/v1/bm_web_de_3857/{z}/{x}/{y}.pbf";

pub const DEFAULT_REFERER: &str = "https://adv-smart.de/map-editor/map";

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(250);

pub const DEFAULT_OGR2OGR: &str = "ogr2ogr";

pub const DEFAULT_LOG_FILE: &str = "vtharvest.log";

/// Default cache root (`<platform cache dir>/vtharvest`).
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vtharvest")
}

pub(super) fn default_bbox() -> GeoBoundingBox {
    let [min_lon, min_lat, max_lon, max_lat] = DEFAULT_BBOX;
    GeoBoundingBox {
        min_lon,
        min_lat,
        max_lon,
        max_lat,
    }
}

pub(super) fn default_url() -> UrlTemplate {
    UrlTemplate(DEFAULT_TILE_URL.to_string())
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            region: RegionSettings {
                name: DEFAULT_REGION_NAME.to_string(),
                bbox: default_bbox(),
                zoom: DEFAULT_ZOOM,
            },
            source: SourceSettings {
                url: default_url(),
                referer: Some(DEFAULT_REFERER.to_string()),
            },
            fetch: FetchSettings {
                concurrency: DEFAULT_CONCURRENCY,
                timeout_secs: DEFAULT_TIMEOUT.as_secs(),
                max_attempts: DEFAULT_MAX_ATTEMPTS,
                retry_delay_ms: DEFAULT_RETRY_DELAY.as_millis() as u64,
            },
            merge: MergeSettings {
                ignore_layers: vec![DEFAULT_IGNORED_LAYER.to_string()],
                compression: DEFAULT_COMPRESSION,
            },
            cache: CacheSettings {
                directory: default_cache_dir(),
            },
            convert: ConvertSettings {
                ogr2ogr: DEFAULT_OGR2OGR.to_string(),
            },
            logging: LoggingSettings {
                file: super::file::config_directory().join(DEFAULT_LOG_FILE),
            },
        }
    }
}
