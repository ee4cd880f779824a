//! Per-layer gzip feature streams.
//!
//! [`LayerWriter`] fans features out by layer name into one
//! `<dir>/<layer>.geojsonl.gz` file each, one GeoJSON feature per line.
//! Sinks are opened lazily on the first feature of a layer and stay open
//! until [`LayerWriter::close_all`].

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use indexmap::map::Entry;
use indexmap::IndexMap;
use thiserror::Error;
use tracing::{debug, info};

use crate::feature::Feature;

/// File suffix of merged layer streams.
pub const LAYER_FILE_SUFFIX: &str = ".geojsonl.gz";

/// Default gzip level for layer streams.
pub const DEFAULT_COMPRESSION: u32 = 5;

/// Errors from opening, writing or closing a layer stream.
#[derive(Debug, Error)]
pub enum LayerError {
    #[error("failed to open layer file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize feature for layer '{layer}': {source}")]
    Serialize {
        layer: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write layer '{layer}': {source}")]
    Write {
        layer: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to finish layer file {path}: {source}")]
    Finish {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Lowercases `name` and replaces each whitespace character with `_`.
pub fn sanitize_layer_name(name: &str) -> String {
    name.chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// What one closed layer stream contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSummary {
    pub name: String,
    pub path: PathBuf,
    pub features: u64,
}

struct LayerSink {
    path: PathBuf,
    encoder: GzEncoder<BufWriter<File>>,
    features: u64,
}

impl LayerSink {
    fn open(path: PathBuf, level: Compression) -> Result<Self, LayerError> {
        let file = File::create(&path).map_err(|source| LayerError::Open {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            path,
            encoder: GzEncoder::new(BufWriter::new(file), level),
            features: 0,
        })
    }

    fn finish(self) -> io::Result<(PathBuf, u64)> {
        let buffered = self.encoder.finish()?;
        let file = buffered.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok((self.path, self.features))
    }
}

/// Serializes `feature` and appends it plus a newline to `out`.
///
/// Encoding happens before anything is written, so a failure of `out`
/// surfaces as [`LayerError::Write`] rather than a serialization error.
fn write_line<W: Write>(out: &mut W, feature: &Feature, layer: &str) -> Result<(), LayerError> {
    let mut line = serde_json::to_vec(feature).map_err(|source| LayerError::Serialize {
        layer: layer.to_string(),
        source,
    })?;
    line.push(b'\n');
    out.write_all(&line).map_err(|source| LayerError::Write {
        layer: layer.to_string(),
        source,
    })
}

/// Fan-out writer owning every layer sink of one merge run.
///
/// Writes are synchronous: a full buffer blocks the caller until the data
/// reaches the file, which bounds memory when a tile bursts features.
pub struct LayerWriter {
    dir: PathBuf,
    level: Compression,
    sinks: IndexMap<String, LayerSink>,
}

impl LayerWriter {
    /// Creates a writer placing layer files in `dir` (created if missing).
    pub fn new(dir: impl Into<PathBuf>, compression_level: u32) -> Result<Self, LayerError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| LayerError::Open {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir,
            level: Compression::new(compression_level.min(9)),
            sinks: IndexMap::new(),
        })
    }

    /// Directory holding the layer files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of sinks opened so far.
    pub fn open_layers(&self) -> usize {
        self.sinks.len()
    }

    /// Appends `feature` as one JSON line to its layer's stream.
    pub fn write(&mut self, feature: &Feature) -> Result<(), LayerError> {
        let name = sanitize_layer_name(&feature.layer);
        let sink = match self.sinks.entry(name.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let path = self.dir.join(format!("{}{}", name, LAYER_FILE_SUFFIX));
                debug!(layer = %name, path = %path.display(), "Opening layer stream");
                entry.insert(LayerSink::open(path, self.level)?)
            }
        };

        write_line(&mut sink.encoder, feature, &name)?;
        sink.features += 1;
        Ok(())
    }

    /// Finishes, flushes and syncs every stream.
    ///
    /// Consumes the writer, so it can only run once per merge.
    pub fn close_all(self) -> Result<Vec<LayerSummary>, LayerError> {
        let mut summaries = Vec::with_capacity(self.sinks.len());
        for (name, sink) in self.sinks {
            let path = sink.path.clone();
            let (path, features) = sink
                .finish()
                .map_err(|source| LayerError::Finish { path, source })?;
            info!(layer = %name, features, "Layer stream closed");
            summaries.push(LayerSummary {
                name,
                path,
                features,
            });
        }
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{Geometry, Properties};
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tempfile::TempDir;

    fn feature(layer: &str, x: f64) -> Feature {
        Feature::new(Geometry::Point([x, 1.0]), Properties::new(), layer)
    }

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        let mut text = String::new();
        GzDecoder::new(File::open(path).unwrap())
            .read_to_string(&mut text)
            .unwrap();
        text.lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::WriteZero, "no space left"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_sink_failure_is_a_write_error() {
        let err = write_line(&mut FullDisk, &feature("adresse", 1.0), "adresse").unwrap_err();
        match err {
            LayerError::Write { layer, source } => {
                assert_eq!(layer, "adresse");
                assert_eq!(source.kind(), io::ErrorKind::WriteZero);
            }
            other => panic!("expected Write, got {}", other),
        }
    }

    #[test]
    fn test_write_line_ends_with_newline() {
        let mut out = Vec::new();
        write_line(&mut out, &feature("adresse", 2.0), "adresse").unwrap();
        assert_eq!(out.last(), Some(&b'\n'));
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["type"], "Feature");
    }

    #[test]
    fn test_sanitize_layer_name() {
        assert_eq!(sanitize_layer_name("Gebaeude Flaeche"), "gebaeude_flaeche");
        assert_eq!(sanitize_layer_name("strasse\tlinie"), "strasse_linie");
        assert_eq!(sanitize_layer_name("adresse"), "adresse");
    }

    #[test]
    fn test_fan_out_by_layer() {
        let temp = TempDir::new().unwrap();
        let mut writer = LayerWriter::new(temp.path(), DEFAULT_COMPRESSION).unwrap();

        writer.write(&feature("gebaeude_flaeche", 1.0)).unwrap();
        writer.write(&feature("strasse_linie", 2.0)).unwrap();
        writer.write(&feature("gebaeude_flaeche", 3.0)).unwrap();
        assert_eq!(writer.open_layers(), 2);

        let summaries = writer.close_all().unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].name, "gebaeude_flaeche");
        assert_eq!(summaries[0].features, 2);

        let buildings = read_lines(&temp.path().join("gebaeude_flaeche.geojsonl.gz"));
        assert_eq!(buildings.len(), 2);
        assert!(buildings
            .iter()
            .all(|f| f["properties"]["layerName"] == "gebaeude_flaeche"));
        assert_eq!(buildings[1]["geometry"]["coordinates"][0], 3.0);

        let roads = read_lines(&temp.path().join("strasse_linie.geojsonl.gz"));
        assert_eq!(roads.len(), 1);
        assert_eq!(roads[0]["type"], "Feature");
    }

    #[test]
    fn test_names_differing_by_case_share_a_sink() {
        let temp = TempDir::new().unwrap();
        let mut writer = LayerWriter::new(temp.path(), DEFAULT_COMPRESSION).unwrap();

        writer.write(&feature("Adresse", 1.0)).unwrap();
        writer.write(&feature("adresse", 2.0)).unwrap();

        let summaries = writer.close_all().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].features, 2);
    }

    #[test]
    fn test_close_without_writes_creates_nothing() {
        let temp = TempDir::new().unwrap();
        let writer = LayerWriter::new(temp.path().join("out"), DEFAULT_COMPRESSION).unwrap();

        assert!(writer.close_all().unwrap().is_empty());
        assert_eq!(fs::read_dir(temp.path().join("out")).unwrap().count(), 0);
    }
}
