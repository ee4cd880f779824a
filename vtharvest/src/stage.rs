//! Stage completion markers and the on-disk stage layout.
//!
//! A stage is complete when its output directory contains a zero-byte
//! `finished.lock`. The marker must only be written after every output of
//! the stage is durably on disk.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Name of the completion marker file.
pub const LOCK_FILE: &str = "finished.lock";

/// Errors from stage bookkeeping.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("failed to create stage directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to write completion marker {path}: {source}")]
    WriteMarker { path: PathBuf, source: io::Error },
}

/// Idempotency gate for one pipeline stage.
#[derive(Debug, Clone)]
pub struct StageGate {
    dir: PathBuf,
}

impl StageGate {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The stage's output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the marker file.
    pub fn marker_path(&self) -> PathBuf {
        self.dir.join(LOCK_FILE)
    }

    /// True iff the marker exists.
    pub fn is_complete(&self) -> bool {
        self.marker_path().exists()
    }

    /// Writes the empty marker file.
    pub fn mark_complete(&self) -> Result<(), StageError> {
        fs::create_dir_all(&self.dir).map_err(|source| StageError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.marker_path();
        File::create(&path)
            .and_then(|file| file.sync_all())
            .map_err(|source| StageError::WriteMarker {
                path: path.clone(),
                source,
            })?;

        debug!(marker = %path.display(), "Stage marked complete");
        Ok(())
    }
}

/// Directories of the five pipeline stages for one named region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageLayout {
    root: PathBuf,
}

impl StageLayout {
    /// Layout rooted at `<cache_root>/<name>`.
    pub fn new(cache_root: &Path, name: &str) -> Self {
        Self {
            root: cache_root.join(name),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Raw tile payloads.
    pub fn tiles(&self) -> PathBuf {
        self.root.join("1_tiles")
    }

    /// Merged per-layer GeoJSON streams.
    pub fn merged(&self) -> PathBuf {
        self.root.join("2_geojson")
    }

    /// Per-layer GeoPackages of the merged streams.
    pub fn geopackages(&self) -> PathBuf {
        self.root.join("3_gpkg")
    }

    /// Per-layer unioned GeoJSON streams.
    pub fn unioned(&self) -> PathBuf {
        self.root.join("4_geojson")
    }

    /// Per-layer GeoPackages of the unioned streams.
    pub fn unioned_geopackages(&self) -> PathBuf {
        self.root.join("5_gpkg")
    }

    /// All stage directories in pipeline order.
    pub fn all(&self) -> [PathBuf; 5] {
        [
            self.tiles(),
            self.merged(),
            self.geopackages(),
            self.unioned(),
            self.unioned_geopackages(),
        ]
    }

    /// Creates every stage directory; existing directories are left alone.
    pub fn create_all(&self) -> Result<(), StageError> {
        for dir in self.all() {
            fs::create_dir_all(&dir).map_err(|source| StageError::CreateDir {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }
}
