//! CLI command implementations.
//!
//! Each subcommand has its own module with a `run` handler.
//!
//! # Command Modules
//!
//! - [`run`] - All stages in order (fetch, merge, convert)
//! - [`fetch`] - Download the region's tiles into the cache
//! - [`merge`] - Merge cached tiles into per-layer streams
//! - [`convert`] - GeoPackage conversion and union via ogr2ogr
//! - [`tiles`] - Show the tile range of a region without fetching

pub mod common;
pub mod convert;
pub mod fetch;
pub mod merge;
pub mod run;
pub mod tiles;
