//! Sequential merge of cached tiles into per-layer feature streams.
//!
//! Each cached tile goes through decode, clip and reprojection, and the
//! resulting features are appended to their layer's stream. The loop runs
//! on a single thread; only the [`LayerWriter`] touches the sinks.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use thiserror::Error;
use tracing::{debug, info};

use crate::coord::TileCoord;
use crate::geometry::{clip_to_tile, demercator, ClipError};
use crate::layers::{LayerError, LayerWriter, DEFAULT_COMPRESSION};
use crate::mvt::{DecodeError, TileDecoder};
use crate::progress::{LogSink, Progress, ProgressSink};
use crate::stage::{StageError, StageGate};

/// Errors that abort a merge run.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("failed to read tile {tile} from {path}: {source}")]
    Read {
        tile: TileCoord,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode tile {tile}: {source}")]
    Decode {
        tile: TileCoord,
        #[source]
        source: DecodeError,
    },

    #[error("failed to clip feature of tile {tile}: {source}")]
    Clip {
        tile: TileCoord,
        #[source]
        source: ClipError,
    },

    #[error(transparent)]
    Layer(#[from] LayerError),

    #[error(transparent)]
    Stage(#[from] StageError),
}

/// Counters for one merge run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Tiles in the work list.
    pub total: usize,
    /// Tiles that had a payload and were decoded.
    pub processed: usize,
    /// Tiles without a cached payload.
    pub skipped: usize,
    /// Features written across all layers.
    pub features: u64,
    /// Layer streams produced.
    pub layers: usize,
    /// True when the stage was already complete and nothing ran.
    pub already_complete: bool,
}

/// Merges cached tiles from `tiles_dir` into layer streams in `output_dir`.
pub struct Merger {
    tiles_dir: PathBuf,
    output_dir: PathBuf,
    decoder: TileDecoder,
    compression: u32,
    progress_sink: Option<Box<dyn ProgressSink>>,
}

impl Merger {
    pub fn new(tiles_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            tiles_dir: tiles_dir.into(),
            output_dir: output_dir.into(),
            decoder: TileDecoder::default(),
            compression: DEFAULT_COMPRESSION,
            progress_sink: None,
        }
    }

    pub fn with_decoder(mut self, decoder: TileDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_compression(mut self, level: u32) -> Self {
        self.compression = level;
        self
    }

    pub fn with_progress(mut self, sink: Box<dyn ProgressSink>) -> Self {
        self.progress_sink = Some(sink);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Runs the merge over `tiles`.
    ///
    /// Returns immediately when the output stage is already marked complete.
    /// The completion marker is written only after every layer stream has
    /// been closed.
    pub fn run(&mut self, tiles: &[TileCoord]) -> Result<MergeSummary, MergeError> {
        let gate = StageGate::new(&self.output_dir);
        if gate.is_complete() {
            info!(dir = %self.output_dir.display(), "Merge already complete, skipping");
            return Ok(MergeSummary {
                total: tiles.len(),
                already_complete: true,
                ..MergeSummary::default()
            });
        }

        let mut order = tiles.to_vec();
        order.shuffle(&mut rand::rng());

        info!(tiles = order.len(), "Merging tiles");
        let sink = self
            .progress_sink
            .take()
            .unwrap_or_else(|| Box::new(LogSink::new("merge")));
        let mut progress = Progress::new(order.len(), sink);
        let mut writer = LayerWriter::new(&self.output_dir, self.compression)?;
        let mut summary = MergeSummary {
            total: order.len(),
            ..MergeSummary::default()
        };

        for (index, tile) in order.iter().enumerate() {
            progress.tick(index);
            match self.read_payload(*tile)? {
                Some(payload) => {
                    summary.features += self.merge_tile(*tile, &payload, &mut writer)?;
                    summary.processed += 1;
                }
                None => summary.skipped += 1,
            }
        }
        progress.finish();

        let layers = writer.close_all()?;
        summary.layers = layers.len();
        gate.mark_complete()?;

        info!(
            processed = summary.processed,
            skipped = summary.skipped,
            features = summary.features,
            layers = summary.layers,
            "Merge finished"
        );
        Ok(summary)
    }

    /// Cached payload of `tile`, or `None` if never fetched or empty upstream.
    fn read_payload(&self, tile: TileCoord) -> Result<Option<Vec<u8>>, MergeError> {
        let path = tile.cache_path(&self.tiles_dir);
        match fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(MergeError::Read { tile, path, source }),
        }
    }

    fn merge_tile(
        &self,
        tile: TileCoord,
        payload: &[u8],
        writer: &mut LayerWriter,
    ) -> Result<u64, MergeError> {
        let features = self
            .decoder
            .decode(payload, tile)
            .map_err(|source| MergeError::Decode { tile, source })?;

        let mut written = 0;
        for feature in &features {
            let pieces =
                clip_to_tile(feature, tile).map_err(|source| MergeError::Clip { tile, source })?;
            for mut piece in pieces {
                piece.geometry = demercator(piece.geometry, tile.z);
                writer.write(&piece)?;
                written += 1;
            }
        }
        debug!(tile = %tile, decoded = features.len(), written, "Merged tile");
        Ok(written)
    }
}
