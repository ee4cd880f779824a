//! Error types for the conversion stages.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::stage::StageError;

#[derive(Debug, Error)]
pub enum ConvertError {
    /// Layer name carries no recognizable geometry suffix.
    #[error("cannot infer geometry type of layer '{layer}'")]
    UnknownGeometryKind { layer: String },

    /// The external tool could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The external tool exited unsuccessfully.
    #[error("{program} failed for layer '{layer}' ({status}): {stderr}")]
    ToolFailed {
        program: String,
        layer: String,
        status: String,
        stderr: String,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A merged layer line is not valid JSON.
    #[error("invalid feature in {path}: {source}")]
    InvalidFeature {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid file pattern '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },

    #[error(transparent)]
    Stage(#[from] StageError),
}

impl ConvertError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> ConvertError {
        let path = path.into();
        move |source| ConvertError::Io { path, source }
    }
}
