//! vtharvest - Vector tile harvesting for offline GIS processing
//!
//! This library downloads every Mapbox Vector Tile of a region from an
//! XYZ tile server, merges the per-tile features into one gzip-compressed
//! GeoJSON-lines stream per source layer, and hands the streams to
//! `ogr2ogr` for GeoPackage conversion and attribute-wise union.
//!
//! # Stages
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | Fetch | [`fetch`] | `1_tiles/<z>/<x>/<y>.pbf` |
//! | Merge | [`merge`] | `2_geojson/<layer>.geojsonl.gz` |
//! | Convert | [`convert`] | `3_gpkg`, `4_geojson`, `5_gpkg` |
//!
//! [`harvester::Harvester`] runs the stages in order; each one is skipped
//! when its directory already carries a completion marker.

pub mod config;
pub mod convert;
pub mod coord;
pub mod error;
pub mod feature;
pub mod fetch;
pub mod geometry;
pub mod harvester;
pub mod layers;
pub mod logging;
pub mod merge;
pub mod mvt;
pub mod progress;
pub mod stage;

pub use error::HarvestError;
pub use harvester::{Harvester, HarvestSummary};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
