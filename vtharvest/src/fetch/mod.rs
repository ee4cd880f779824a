//! Concurrent tile fetching into the on-disk tile cache.
//!
//! Every tile of the work list ends up as a file at
//! `<cache>/<z>/<x>/<y>.pbf`. A zero-length file records that the server
//! answered 404 for that tile. Existing files are never requested again,
//! so an interrupted run resumes where it stopped.
//!
//! # Example
//!
//! ```ignore
//! use vtharvest::fetch::{ReqwestTileClient, TileFetcher, UrlTemplate, DEFAULT_TIMEOUT};
//!
//! let client = ReqwestTileClient::new(DEFAULT_TIMEOUT, None)?;
//! let template = UrlTemplate::parse("https://tiles.example/{z}/{x}/{y}.pbf")?;
//! let mut fetcher = TileFetcher::new(client, template, "cache/1_tiles");
//! let summary = fetcher.run(&tiles).await?;
//! ```

mod client;
mod error;
mod retry;
mod url;

pub use client::{
    FetchOutcome, ReqwestTileClient, TileClient, DEFAULT_TIMEOUT, POOL_MAX_IDLE_PER_HOST,
};
pub use error::FetchError;
pub use retry::RetryPolicy;
pub use url::{UrlTemplate, UrlTemplateError};

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::stream::{self, TryStreamExt};
use rand::seq::SliceRandom;
use tracing::{debug, info, trace};

use crate::coord::TileCoord;
use crate::progress::{LogSink, Progress, ProgressSink};
use crate::stage::StageGate;

/// Default number of requests in flight.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Counters for one fetch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchSummary {
    /// Tiles in the work list.
    pub total: usize,
    /// Tiles downloaded with a body.
    pub downloaded: usize,
    /// Tiles the server reported as absent.
    pub not_found: usize,
    /// Tiles already present in the cache.
    pub cached: usize,
    /// True when the stage was already complete and nothing ran.
    pub already_complete: bool,
}

#[derive(Default)]
struct FetchCounters {
    downloaded: AtomicUsize,
    not_found: AtomicUsize,
    cached: AtomicUsize,
}

/// Fetches tiles with bounded concurrency into a cache directory.
pub struct TileFetcher<C: TileClient> {
    client: C,
    template: UrlTemplate,
    cache_dir: PathBuf,
    concurrency: usize,
    retry: RetryPolicy,
    progress_sink: Option<Box<dyn ProgressSink>>,
}

impl<C: TileClient> TileFetcher<C> {
    pub fn new(client: C, template: UrlTemplate, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            template,
            cache_dir: cache_dir.into(),
            concurrency: DEFAULT_CONCURRENCY,
            retry: RetryPolicy::default(),
            progress_sink: None,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_progress(mut self, sink: Box<dyn ProgressSink>) -> Self {
        self.progress_sink = Some(sink);
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Materializes every tile of `tiles` in the cache.
    ///
    /// The first fatal error stops the run; in-flight requests are dropped
    /// and the stage is left unmarked.
    pub async fn run(&mut self, tiles: &[TileCoord]) -> Result<FetchSummary, FetchError> {
        let gate = StageGate::new(&self.cache_dir);
        if gate.is_complete() {
            info!(dir = %self.cache_dir.display(), "Fetch already complete, skipping");
            return Ok(FetchSummary {
                total: tiles.len(),
                already_complete: true,
                ..FetchSummary::default()
            });
        }

        let mut order = tiles.to_vec();
        order.shuffle(&mut rand::rng());

        info!(
            tiles = order.len(),
            concurrency = self.concurrency,
            "Fetching tiles"
        );
        let sink = self
            .progress_sink
            .take()
            .unwrap_or_else(|| Box::new(LogSink::new("fetch")));
        let mut progress = Progress::new(order.len(), sink);
        let counters = FetchCounters::default();

        let this = &*self;
        let counters_ref = &counters;
        stream::iter(order.into_iter().enumerate().map(Ok::<_, FetchError>))
            .try_for_each_concurrent(this.concurrency, |(index, tile)| {
                progress.tick(index);
                async move { this.fetch_tile(tile, counters_ref).await }
            })
            .await?;
        progress.finish();

        gate.mark_complete()?;

        let summary = FetchSummary {
            total: tiles.len(),
            downloaded: counters.downloaded.load(Ordering::Relaxed),
            not_found: counters.not_found.load(Ordering::Relaxed),
            cached: counters.cached.load(Ordering::Relaxed),
            already_complete: false,
        };
        info!(
            downloaded = summary.downloaded,
            not_found = summary.not_found,
            cached = summary.cached,
            "Fetch finished"
        );
        Ok(summary)
    }

    async fn fetch_tile(&self, tile: TileCoord, counters: &FetchCounters) -> Result<(), FetchError> {
        let path = tile.cache_path(&self.cache_dir);
        if tokio::fs::try_exists(&path)
            .await
            .map_err(FetchError::io(&path))?
        {
            trace!(tile = %tile, "Tile already cached");
            counters.cached.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(FetchError::io(parent))?;
        }

        let url = self.template.url_for(tile);
        match self.retry.fetch(&self.client, &url).await? {
            FetchOutcome::Found(body) => {
                let partial = path.with_extension("pbf.part");
                tokio::fs::write(&partial, &body)
                    .await
                    .map_err(FetchError::io(&partial))?;
                tokio::fs::rename(&partial, &path)
                    .await
                    .map_err(FetchError::io(&path))?;
                debug!(tile = %tile, bytes = body.len(), "Tile downloaded");
                counters.downloaded.fetch_add(1, Ordering::Relaxed);
            }
            FetchOutcome::NotFound => {
                tokio::fs::File::create(&path)
                    .await
                    .map_err(FetchError::io(&path))?;
                debug!(tile = %tile, "Tile not found upstream");
                counters.not_found.fetch_add(1, Ordering::Relaxed);
            }
        }
        Ok(())
    }
}
