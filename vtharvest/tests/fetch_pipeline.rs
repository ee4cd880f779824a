//! Integration tests for the fetch stage against scripted tile clients.

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tempfile::TempDir;
use vtharvest::coord::TileCoord;
use vtharvest::fetch::{FetchError, FetchOutcome, RetryPolicy, TileClient, TileFetcher, UrlTemplate};
use vtharvest::progress::NullSink;
use vtharvest::stage::LOCK_FILE;

/// How the scripted server answers.
#[derive(Clone, Copy)]
enum Behavior {
    /// 200 for every tile whose x is even, 404 otherwise.
    EvenColumns,
    /// 500 for every tile.
    ServerError,
    /// Every request times out.
    Timeout,
}

#[derive(Clone)]
struct ScriptedClient {
    behavior: Behavior,
    calls: Arc<AtomicUsize>,
}

impl ScriptedClient {
    fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl TileClient for ScriptedClient {
    async fn fetch(&self, url: &str) -> Result<FetchOutcome, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::EvenColumns => {
                let x: u32 = url.split('/').nth(4).and_then(|s| s.parse().ok()).unwrap_or(1);
                if x % 2 == 0 {
                    Ok(FetchOutcome::Found(Bytes::from(format!("payload {}", url))))
                } else {
                    Ok(FetchOutcome::NotFound)
                }
            }
            Behavior::ServerError => Err(FetchError::Status {
                url: url.to_string(),
                status: 500,
            }),
            Behavior::Timeout => Err(FetchError::Timeout {
                url: url.to_string(),
            }),
        }
    }
}

fn template() -> UrlTemplate {
    UrlTemplate::parse("mock://tiles/{z}/{x}/{y}").unwrap()
}

fn tiles() -> Vec<TileCoord> {
    (10..14)
        .flat_map(|x| (20..23).map(move |y| TileCoord::new(x, y, 6)))
        .collect()
}

fn fetcher(client: ScriptedClient, cache: &TempDir) -> TileFetcher<ScriptedClient> {
    TileFetcher::new(client, template(), cache.path())
        .with_concurrency(4)
        .with_retry(RetryPolicy::new(3, Duration::from_millis(1)))
        .with_progress(Box::new(NullSink))
}

#[tokio::test]
async fn test_missing_tiles_become_empty_files() {
    let cache = TempDir::new().unwrap();
    let client = ScriptedClient::new(Behavior::EvenColumns);

    let summary = fetcher(client, &cache).run(&tiles()).await.unwrap();

    assert_eq!(summary.total, 12);
    assert_eq!(summary.downloaded, 6);
    assert_eq!(summary.not_found, 6);
    for tile in tiles() {
        let bytes = fs::read(tile.cache_path(cache.path())).unwrap();
        if tile.x % 2 == 0 {
            assert_eq!(bytes, format!("payload mock://tiles/6/{}/{}", tile.x, tile.y).as_bytes());
        } else {
            assert!(bytes.is_empty(), "{} should be empty", tile);
        }
    }
    assert!(cache.path().join(LOCK_FILE).exists());
}

#[tokio::test]
async fn test_completed_stage_makes_no_requests() {
    let cache = TempDir::new().unwrap();
    let client = ScriptedClient::new(Behavior::EvenColumns);
    let calls = Arc::clone(&client.calls);

    fetcher(client.clone(), &cache).run(&tiles()).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 12);

    let summary = fetcher(client, &cache).run(&tiles()).await.unwrap();

    assert!(summary.already_complete);
    assert_eq!(calls.load(Ordering::SeqCst), 12);
}

#[tokio::test]
async fn test_interrupted_run_resumes_from_cache() {
    let cache = TempDir::new().unwrap();
    let client = ScriptedClient::new(Behavior::EvenColumns);
    let calls = Arc::clone(&client.calls);

    // Pretend a previous run got through the first five tiles.
    for tile in tiles().into_iter().take(5) {
        let path = tile.cache_path(cache.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"earlier").unwrap();
    }

    let summary = fetcher(client, &cache).run(&tiles()).await.unwrap();

    assert_eq!(summary.cached, 5);
    assert_eq!(calls.load(Ordering::SeqCst), 7);
}

#[tokio::test]
async fn test_server_error_is_fatal_without_retry() {
    let cache = TempDir::new().unwrap();
    let client = ScriptedClient::new(Behavior::ServerError);
    let calls = Arc::clone(&client.calls);
    let one = [TileCoord::new(10, 20, 6)];

    let err = fetcher(client, &cache).run(&one).await.unwrap_err();

    assert!(matches!(err, FetchError::Status { status: 500, .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!cache.path().join(LOCK_FILE).exists());
    assert!(!one[0].cache_path(cache.path()).exists());
}

#[tokio::test]
async fn test_timeouts_exhaust_retries() {
    let cache = TempDir::new().unwrap();
    let client = ScriptedClient::new(Behavior::Timeout);
    let calls = Arc::clone(&client.calls);
    let one = [TileCoord::new(11, 21, 6)];

    let err = fetcher(client, &cache).run(&one).await.unwrap_err();

    match err {
        FetchError::RetriesExhausted { attempts, last, .. } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, FetchError::Timeout { .. }));
        }
        other => panic!("expected RetriesExhausted, got {}", other),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(!cache.path().join(LOCK_FILE).exists());
}

/// Answers every tile after a short delay, tracking how many requests are
/// open at once.
#[derive(Clone, Default)]
struct SlowClient {
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl TileClient for SlowClient {
    async fn fetch(&self, _url: &str) -> Result<FetchOutcome, FetchError> {
        let open = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(open, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(FetchOutcome::Found(Bytes::from_static(b"tile")))
    }
}

#[tokio::test]
async fn test_requests_in_flight_are_bounded() {
    let cache = TempDir::new().unwrap();
    let client = SlowClient::default();
    let peak = Arc::clone(&client.peak);
    let many: Vec<TileCoord> = (0..8)
        .flat_map(|x| (0..5).map(move |y| TileCoord::new(x, y, 4)))
        .collect();

    let summary = TileFetcher::new(client, template(), cache.path())
        .with_concurrency(8)
        .with_progress(Box::new(NullSink))
        .run(&many)
        .await
        .unwrap();

    assert_eq!(summary.downloaded, 40);
    let peak = peak.load(Ordering::SeqCst);
    assert!(peak <= 8, "{} requests were in flight at once", peak);
    assert!(peak > 1, "requests never overlapped");
}
