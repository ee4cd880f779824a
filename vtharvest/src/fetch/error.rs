//! Error types for tile fetching.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::stage::StageError;

/// Errors raised while fetching tiles.
///
/// Only [`FetchError::Timeout`] and [`FetchError::Connect`] are retried;
/// everything else aborts the fetch run.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Request exceeded its deadline.
    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// Connection could not be established.
    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    /// Server answered with a status other than 200 or 404.
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// Any other transport failure, including reading the body.
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    /// A retryable error persisted through every attempt.
    #[error("giving up on {url} after {attempts} attempts: {last}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },

    /// HTTP client could not be built.
    #[error("failed to create HTTP client: {0}")]
    Client(String),

    /// Cache file or directory could not be written.
    #[error("cache I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Stage(#[from] StageError),
}

impl FetchError {
    /// True for transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Timeout { .. } | FetchError::Connect { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> FetchError {
        let path = path.into();
        move |source| FetchError::Io { path, source }
    }
}
