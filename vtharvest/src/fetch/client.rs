//! HTTP client abstraction for tile requests.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use reqwest::StatusCode;
use tracing::{debug, trace};

use super::FetchError;

/// Per-request deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Idle connections kept per host; matches the default worker count.
pub const POOL_MAX_IDLE_PER_HOST: usize = 8;

const KEEPALIVE: Duration = Duration::from_secs(60);
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// User-Agent sent with every tile request.
const USER_AGENT: &str = concat!("vtharvest/", env!("CARGO_PKG_VERSION"));

/// Result of a tile request that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// HTTP 200 with the full body.
    Found(Bytes),
    /// HTTP 404: the tile is known to be empty.
    NotFound,
}

/// Trait for fetching one tile URL.
///
/// Allows the fetcher to run against a mock in tests.
pub trait TileClient: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchOutcome, FetchError>> + Send;
}

/// Tile client backed by a pooled async reqwest client.
#[derive(Clone)]
pub struct ReqwestTileClient {
    client: reqwest::Client,
}

impl ReqwestTileClient {
    /// Creates a client with the given request timeout and optional
    /// `Referer` header.
    pub fn new(timeout: Duration, referer: Option<&str>) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        if let Some(referer) = referer {
            let value = HeaderValue::from_str(referer)
                .map_err(|e| FetchError::Client(format!("invalid referer '{}': {}", referer, e)))?;
            headers.insert(REFERER, value);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .tcp_keepalive(KEEPALIVE)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

impl TileClient for ReqwestTileClient {
    async fn fetch(&self, url: &str) -> Result<FetchOutcome, FetchError> {
        trace!(url = url, "HTTP GET request starting");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        debug!(url = url, status = status.as_u16(), "HTTP response received");

        match status {
            StatusCode::OK => {
                let body = response.bytes().await.map_err(|e| classify(url, e))?;
                Ok(FetchOutcome::Found(body))
            }
            StatusCode::NOT_FOUND => Ok(FetchOutcome::NotFound),
            other => Err(FetchError::Status {
                url: url.to_string(),
                status: other.as_u16(),
            }),
        }
    }
}

fn classify(url: &str, e: reqwest::Error) -> FetchError {
    let url = url.to_string();
    if e.is_timeout() {
        FetchError::Timeout { url }
    } else if e.is_connect() {
        FetchError::Connect {
            url,
            reason: e.to_string(),
        }
    } else {
        FetchError::Transport {
            url,
            reason: e.to_string(),
        }
    }
}
