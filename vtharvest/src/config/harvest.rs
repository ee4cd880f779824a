//! Run configuration consumed by the harvester.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::defaults::{default_cache_dir, DEFAULT_OGR2OGR};
use super::settings::ConfigFile;
use crate::coord::GeoBoundingBox;
use crate::fetch::{RetryPolicy, UrlTemplate, DEFAULT_CONCURRENCY, DEFAULT_TIMEOUT};
use crate::layers::DEFAULT_COMPRESSION;
use crate::mvt::DEFAULT_IGNORED_LAYER;

/// Everything one harvest run needs.
///
/// # Example
///
/// ```
/// use vtharvest::config::HarvestConfig;
/// use vtharvest::coord::GeoBoundingBox;
/// use vtharvest::fetch::UrlTemplate;
///
/// let config = HarvestConfig::new(
///     "berlin",
///     "13.0,52.3,13.8,52.7".parse::<GeoBoundingBox>().unwrap(),
///     14,
///     UrlTemplate::parse("https://tiles.example/{z}/{x}/{y}.pbf").unwrap(),
/// )
/// .with_concurrency(4)
/// .with_cache_dir("/tmp/vt");
///
/// assert_eq!(config.region_dir(), std::path::Path::new("/tmp/vt/berlin"));
/// ```
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    name: String,
    bbox: GeoBoundingBox,
    zoom: u8,
    url: UrlTemplate,
    referer: Option<String>,
    cache_dir: PathBuf,
    concurrency: usize,
    timeout: Duration,
    retry: RetryPolicy,
    ignored_layers: Vec<String>,
    compression: u32,
    ogr2ogr: String,
}

impl HarvestConfig {
    pub fn new(name: impl Into<String>, bbox: GeoBoundingBox, zoom: u8, url: UrlTemplate) -> Self {
        Self {
            name: name.into(),
            bbox,
            zoom,
            url,
            referer: None,
            cache_dir: default_cache_dir(),
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            ignored_layers: vec![DEFAULT_IGNORED_LAYER.to_string()],
            compression: DEFAULT_COMPRESSION,
            ogr2ogr: DEFAULT_OGR2OGR.to_string(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_bbox(mut self, bbox: GeoBoundingBox) -> Self {
        self.bbox = bbox;
        self
    }

    pub fn with_zoom(mut self, zoom: u8) -> Self {
        self.zoom = zoom;
        self
    }

    pub fn with_url(mut self, url: UrlTemplate) -> Self {
        self.url = url;
        self
    }

    pub fn with_referer(mut self, referer: Option<String>) -> Self {
        self.referer = referer;
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_ignored_layers(mut self, layers: Vec<String>) -> Self {
        self.ignored_layers = layers;
        self
    }

    pub fn with_compression(mut self, level: u32) -> Self {
        self.compression = level.min(9);
        self
    }

    pub fn with_ogr2ogr(mut self, program: impl Into<String>) -> Self {
        self.ogr2ogr = program.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bbox(&self) -> &GeoBoundingBox {
        &self.bbox
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn url(&self) -> &UrlTemplate {
        &self.url
    }

    pub fn referer(&self) -> Option<&str> {
        self.referer.as_deref()
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// `<cache_dir>/<name>`, the root of all stage directories.
    pub fn region_dir(&self) -> PathBuf {
        self.cache_dir.join(&self.name)
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    pub fn ignored_layers(&self) -> &[String] {
        &self.ignored_layers
    }

    pub fn compression(&self) -> u32 {
        self.compression
    }

    pub fn ogr2ogr(&self) -> &str {
        &self.ogr2ogr
    }
}

impl From<&ConfigFile> for HarvestConfig {
    fn from(file: &ConfigFile) -> Self {
        HarvestConfig::new(
            file.region.name.clone(),
            file.region.bbox,
            file.region.zoom,
            file.source.url.clone(),
        )
        .with_referer(file.source.referer.clone())
        .with_cache_dir(file.cache.directory.clone())
        .with_concurrency(file.fetch.concurrency)
        .with_timeout(Duration::from_secs(file.fetch.timeout_secs))
        .with_retry(RetryPolicy::new(
            file.fetch.max_attempts,
            Duration::from_millis(file.fetch.retry_delay_ms),
        ))
        .with_ignored_layers(file.merge.ignore_layers.clone())
        .with_compression(file.merge.compression)
        .with_ogr2ogr(file.convert.ogr2ogr.clone())
    }
}
