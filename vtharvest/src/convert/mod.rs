//! Conversion of merged layer streams with `ogr2ogr`.
//!
//! Three stages follow the merge, each gated by its own `finished.lock`:
//!
//! 1. layer streams → one GeoPackage per layer ([`Converter::geopackage_stage`])
//! 2. GeoPackages → unioned layer streams ([`Converter::union_stage`])
//! 3. unioned streams → GeoPackages (again `geopackage_stage`)
//!
//! The tool runs sequentially, one layer at a time. A non-zero exit aborts
//! the stage.

mod error;
mod kind;
mod ogr;

pub use error::ConvertError;
pub use kind::GeometryKind;
pub use ogr::{geopackage_args, union_args, union_sql, CommandRunner, Ogr2Ogr};

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use indexmap::IndexSet;
use tracing::info;

use crate::feature::LAYER_NAME_KEY;
use crate::layers::LAYER_FILE_SUFFIX;
use crate::stage::StageGate;

/// File suffix of GeoPackage outputs.
pub const GEOPACKAGE_SUFFIX: &str = ".gpkg";

/// Drives the conversion tool over every layer of a stage directory.
pub struct Converter<R: CommandRunner = Ogr2Ogr> {
    runner: R,
}

impl<R: CommandRunner> Converter<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Converts every `*.geojsonl.gz` in `src` into `dst/<layer>.gpkg`.
    ///
    /// Returns the number of layers converted; zero when `dst` is already
    /// complete.
    pub fn geopackage_stage(&self, src: &Path, dst: &Path) -> Result<usize, ConvertError> {
        let gate = StageGate::new(dst);
        if gate.is_complete() {
            info!(dir = %dst.display(), "GeoPackage conversion already complete, skipping");
            return Ok(0);
        }
        fs::create_dir_all(dst).map_err(ConvertError::io(dst))?;

        let layers = list_layers(src, LAYER_FILE_SUFFIX)?;
        info!(layers = layers.len(), src = %src.display(), "Converting layers to GeoPackage");
        for (name, path) in &layers {
            let kind = GeometryKind::from_layer_name(name)?;
            let output = dst.join(format!("{}{}", name, GEOPACKAGE_SUFFIX));
            remove_stale(&output)?;
            self.runner
                .run(name, &geopackage_args(name, kind, path, &output))?;
        }

        gate.mark_complete()?;
        Ok(layers.len())
    }

    /// Unions every `*.gpkg` in `gpkg_dir` into `dst/<layer>.geojsonl.gz`,
    /// grouping by the attribute columns seen in `merged_dir/<layer>.geojsonl.gz`.
    pub fn union_stage(
        &self,
        gpkg_dir: &Path,
        merged_dir: &Path,
        dst: &Path,
    ) -> Result<usize, ConvertError> {
        let gate = StageGate::new(dst);
        if gate.is_complete() {
            info!(dir = %dst.display(), "Union already complete, skipping");
            return Ok(0);
        }
        fs::create_dir_all(dst).map_err(ConvertError::io(dst))?;

        let layers = list_layers(gpkg_dir, GEOPACKAGE_SUFFIX)?;
        info!(layers = layers.len(), "Unioning features");
        for (name, path) in &layers {
            let merged = merged_dir.join(format!("{}{}", name, LAYER_FILE_SUFFIX));
            let columns = attribute_columns(&merged)?;
            let output = dst.join(format!("{}{}", name, LAYER_FILE_SUFFIX));
            remove_stale(&output)?;
            self.runner
                .run(name, &union_args(name, &columns, path, &output))?;
        }

        gate.mark_complete()?;
        Ok(layers.len())
    }
}

impl Default for Converter<Ogr2Ogr> {
    fn default() -> Self {
        Self::new(Ogr2Ogr::default())
    }
}

/// `(layer name, path)` of every file in `dir` ending in `suffix`, sorted.
fn list_layers(dir: &Path, suffix: &str) -> Result<Vec<(String, PathBuf)>, ConvertError> {
    let pattern = format!(
        "{}/*{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        suffix
    );
    let entries = glob::glob(&pattern).map_err(|e| ConvertError::Pattern {
        pattern: pattern.clone(),
        reason: e.to_string(),
    })?;

    let mut layers = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| ConvertError::Io {
            path: e.path().to_path_buf(),
            source: e.into_error(),
        })?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_suffix(suffix))
            .map(String::from);
        if let Some(name) = name {
            layers.push((name, path));
        }
    }
    layers.sort();
    Ok(layers)
}

/// Attribute keys of all features in a layer stream, in first-seen order,
/// without the layer name.
///
/// A missing file yields no columns.
pub fn attribute_columns(path: &Path) -> Result<Vec<String>, ConvertError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(ConvertError::io(path)(e)),
    };

    let mut columns: IndexSet<String> = IndexSet::new();
    for line in BufReader::new(GzDecoder::new(file)).lines() {
        let line = line.map_err(ConvertError::io(path))?;
        if line.trim().is_empty() {
            continue;
        }
        let feature: serde_json::Value =
            serde_json::from_str(&line).map_err(|source| ConvertError::InvalidFeature {
                path: path.to_path_buf(),
                source,
            })?;
        if let Some(properties) = feature.get("properties").and_then(|p| p.as_object()) {
            for key in properties.keys() {
                if key != LAYER_NAME_KEY && !columns.contains(key.as_str()) {
                    columns.insert(key.clone());
                }
            }
        }
    }
    Ok(columns.into_iter().collect())
}

fn remove_stale(path: &Path) -> Result<(), ConvertError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ConvertError::io(path)(e)),
    }
}
