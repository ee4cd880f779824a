//! Common types and utilities shared across CLI commands.

use std::path::PathBuf;

use clap::Args;
use vtharvest::config::{HarvestConfig, MAX_ZOOM};
use vtharvest::coord::GeoBoundingBox;
use vtharvest::fetch::UrlTemplate;

/// Options accepted by every command.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Config file (default: ~/.vtharvest/config.ini)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging regardless of RUST_LOG
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Region and source overrides. Anything left unset comes from the config
/// file.
#[derive(Debug, Clone, Default, Args)]
pub struct RegionArgs {
    /// Bounding box as minLon,minLat,maxLon,maxLat
    #[arg(long, value_name = "BBOX", allow_hyphen_values = true)]
    pub bbox: Option<GeoBoundingBox>,

    /// Zoom level
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=MAX_ZOOM as i64))]
    pub zoom: Option<u8>,

    /// Tile URL template containing {z}, {x} and {y}
    #[arg(long, value_name = "TEMPLATE")]
    pub url: Option<UrlTemplate>,

    /// Region name, used as the directory under the cache root
    #[arg(long)]
    pub name: Option<String>,

    /// Cache root directory
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Number of concurrent tile requests
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: Option<u16>,

    /// Referer header sent with every tile request
    #[arg(long)]
    pub referer: Option<String>,
}

impl RegionArgs {
    /// Apply the overrides on top of `config`. CLI takes precedence.
    pub fn apply(self, mut config: HarvestConfig) -> HarvestConfig {
        if let Some(bbox) = self.bbox {
            config = config.with_bbox(bbox);
        }
        if let Some(zoom) = self.zoom {
            config = config.with_zoom(zoom);
        }
        if let Some(url) = self.url {
            config = config.with_url(url);
        }
        if let Some(name) = self.name {
            config = config.with_name(name);
        }
        if let Some(dir) = self.cache_dir {
            config = config.with_cache_dir(dir);
        }
        if let Some(concurrency) = self.concurrency {
            config = config.with_concurrency(concurrency as usize);
        }
        if let Some(referer) = self.referer {
            config = config.with_referer(Some(referer));
        }
        config
    }
}
