//! End-to-end harvest of one region.
//!
//! A [`Harvester`] owns the run configuration and the on-disk stage layout
//! under `<cache>/<name>/`. Each stage is gated by its own completion
//! marker, so [`Harvester::run_all`] resumes an interrupted run at the
//! first unfinished stage.
//!
//! ```text
//! 1_tiles ──merge──▶ 2_geojson ──gpkg──▶ 3_gpkg ──union──▶ 4_geojson ──gpkg──▶ 5_gpkg
//! ```

use std::fmt;
use std::time::Instant;

use tracing::info;

use crate::config::HarvestConfig;
use crate::convert::{Converter, Ogr2Ogr};
use crate::coord::{tiles_in_bbox, TileCoord};
use crate::error::HarvestError;
use crate::fetch::{FetchSummary, ReqwestTileClient, TileFetcher};
use crate::merge::{MergeSummary, Merger};
use crate::mvt::TileDecoder;
use crate::progress::ProgressSink;
use crate::stage::StageLayout;

/// Builds a progress sink for the stage with the given label.
pub type ProgressFactory = Box<dyn Fn(&str) -> Box<dyn ProgressSink> + Send + Sync>;

/// Layers handled by each conversion step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertSummary {
    pub geopackages: usize,
    pub unioned: usize,
    pub unioned_geopackages: usize,
}

/// Results of a complete run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    pub fetch: FetchSummary,
    pub merge: MergeSummary,
    pub convert: ConvertSummary,
}

/// Runs the harvest stages for one region.
pub struct Harvester {
    config: HarvestConfig,
    layout: StageLayout,
    progress: Option<ProgressFactory>,
}

impl fmt::Debug for Harvester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Harvester")
            .field("config", &self.config)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

impl Harvester {
    /// Creates the harvester and every stage directory of the region.
    pub fn new(config: HarvestConfig) -> Result<Self, HarvestError> {
        let layout = StageLayout::new(config.cache_dir(), config.name());
        layout.create_all()?;
        info!(
            region = config.name(),
            root = %layout.root().display(),
            "Stage layout ready"
        );
        Ok(Self {
            config,
            layout,
            progress: None,
        })
    }

    /// Installs a progress sink factory used for the fetch and merge stages.
    pub fn with_progress(mut self, factory: ProgressFactory) -> Self {
        self.progress = Some(factory);
        self
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    pub fn layout(&self) -> &StageLayout {
        &self.layout
    }

    /// Tiles covering the configured bounding box at the configured zoom.
    pub fn tiles(&self) -> Vec<TileCoord> {
        tiles_in_bbox(self.config.bbox(), self.config.zoom())
    }

    /// Downloads every tile of the region into `1_tiles`.
    pub async fn fetch(&self) -> Result<FetchSummary, HarvestError> {
        let tiles = self.tiles();
        info!(
            region = self.config.name(),
            zoom = self.config.zoom(),
            tiles = tiles.len(),
            url = %self.config.url(),
            "Starting fetch stage"
        );

        let client = ReqwestTileClient::new(self.config.timeout(), self.config.referer())?;
        let mut fetcher = TileFetcher::new(client, self.config.url().clone(), self.layout.tiles())
            .with_concurrency(self.config.concurrency())
            .with_retry(self.config.retry());
        if let Some(sink) = self.sink("fetch") {
            fetcher = fetcher.with_progress(sink);
        }

        Ok(fetcher.run(&tiles).await?)
    }

    /// Merges the cached tiles into per-layer streams in `2_geojson`.
    pub fn merge(&self) -> Result<MergeSummary, HarvestError> {
        let tiles = self.tiles();
        info!(region = self.config.name(), tiles = tiles.len(), "Starting merge stage");

        let decoder = TileDecoder::new(self.config.ignored_layers().iter().cloned());
        let mut merger = Merger::new(self.layout.tiles(), self.layout.merged())
            .with_decoder(decoder)
            .with_compression(self.config.compression());
        if let Some(sink) = self.sink("merge") {
            merger = merger.with_progress(sink);
        }

        Ok(merger.run(&tiles)?)
    }

    /// Converts the merged streams to GeoPackage, unions them and converts
    /// the unioned streams again.
    pub fn convert(&self) -> Result<ConvertSummary, HarvestError> {
        info!(region = self.config.name(), "Starting conversion stages");
        let converter = Converter::new(Ogr2Ogr::new(self.config.ogr2ogr()));
        let layout = &self.layout;

        let geopackages = converter.geopackage_stage(&layout.merged(), &layout.geopackages())?;
        let unioned =
            converter.union_stage(&layout.geopackages(), &layout.merged(), &layout.unioned())?;
        let unioned_geopackages =
            converter.geopackage_stage(&layout.unioned(), &layout.unioned_geopackages())?;

        Ok(ConvertSummary {
            geopackages,
            unioned,
            unioned_geopackages,
        })
    }

    /// Runs fetch, merge and convert in order.
    pub async fn run_all(&self) -> Result<HarvestSummary, HarvestError> {
        let started = Instant::now();

        let fetch = self.fetch().await?;
        let merge = self.merge()?;
        let convert = self.convert()?;

        info!(
            region = self.config.name(),
            elapsed_secs = started.elapsed().as_secs(),
            "Harvest complete"
        );
        Ok(HarvestSummary {
            fetch,
            merge,
            convert,
        })
    }

    fn sink(&self, label: &str) -> Option<Box<dyn ProgressSink>> {
        self.progress.as_ref().map(|factory| factory(label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::GeoBoundingBox;
    use crate::fetch::UrlTemplate;
    use crate::progress::ProgressSnapshot;
    use crate::stage::StageGate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn config(cache: &TempDir) -> HarvestConfig {
        HarvestConfig::new(
            "testregion",
            GeoBoundingBox::new(13.37, 52.50, 13.40, 52.52).unwrap(),
            14,
            UrlTemplate::parse("http://127.0.0.1:9/{z}/{x}/{y}.pbf").unwrap(),
        )
        .with_cache_dir(cache.path())
        .with_ogr2ogr("/nonexistent/ogr2ogr")
    }

    fn mark_all(harvester: &Harvester) {
        for dir in harvester.layout().all() {
            StageGate::new(dir).mark_complete().unwrap();
        }
    }

    #[test]
    fn test_new_creates_stage_layout() {
        let cache = TempDir::new().unwrap();
        let harvester = Harvester::new(config(&cache)).unwrap();

        for dir in harvester.layout().all() {
            assert!(dir.is_dir(), "{} missing", dir.display());
        }
        assert_eq!(harvester.layout().root(), cache.path().join("testregion"));
    }

    #[test]
    fn test_tiles_cover_bbox() {
        let cache = TempDir::new().unwrap();
        let harvester = Harvester::new(config(&cache)).unwrap();

        let tiles = harvester.tiles();
        assert!(!tiles.is_empty());
        assert!(tiles.iter().all(|t| t.z == 14));
    }

    #[test]
    fn test_merge_without_cached_tiles_skips_all() {
        let cache = TempDir::new().unwrap();
        let harvester = Harvester::new(config(&cache)).unwrap();

        let summary = harvester.merge().unwrap();

        assert_eq!(summary.total, harvester.tiles().len());
        assert_eq!(summary.skipped, summary.total);
        assert_eq!(summary.layers, 0);
        assert!(StageGate::new(harvester.layout().merged()).is_complete());
    }

    #[test]
    fn test_convert_missing_tool_fails_without_marking() {
        let cache = TempDir::new().unwrap();
        let harvester = Harvester::new(config(&cache)).unwrap();
        std::fs::write(
            harvester.layout().merged().join("strasse_linie.geojsonl.gz"),
            b"",
        )
        .unwrap();

        let err = harvester.convert().unwrap_err();

        assert!(matches!(err, HarvestError::Convert(_)));
        assert!(!StageGate::new(harvester.layout().geopackages()).is_complete());
    }

    #[tokio::test]
    async fn test_run_all_resumes_completed_stages() {
        let cache = TempDir::new().unwrap();
        let harvester = Harvester::new(config(&cache)).unwrap();
        mark_all(&harvester);

        let summary = harvester.run_all().await.unwrap();

        assert!(summary.fetch.already_complete);
        assert!(summary.merge.already_complete);
        assert_eq!(summary.convert, ConvertSummary::default());
    }

    #[test]
    fn test_progress_factory_is_used_per_stage() {
        struct CountingSink;
        impl ProgressSink for CountingSink {
            fn render(&mut self, _snapshot: &ProgressSnapshot) {}
        }

        let cache = TempDir::new().unwrap();
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let harvester = Harvester::new(config(&cache))
            .unwrap()
            .with_progress(Box::new(move |_label| {
                counter.fetch_add(1, Ordering::SeqCst);
                Box::new(CountingSink)
            }));

        harvester.merge().unwrap();
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }
}
