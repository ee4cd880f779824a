//! Top-level error type for harvest runs.

use thiserror::Error;

use crate::config::ConfigFileError;
use crate::convert::ConvertError;
use crate::coord::BoundsError;
use crate::fetch::{FetchError, UrlTemplateError};
use crate::merge::MergeError;
use crate::stage::StageError;

/// Any error that stops a harvest run.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigFileError),

    #[error("invalid tile URL: {0}")]
    UrlTemplate(#[from] UrlTemplateError),

    #[error("invalid bounding box: {0}")]
    Bounds(#[from] BoundsError),

    #[error(transparent)]
    Stage(#[from] StageError),

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("merge failed: {0}")]
    Merge(#[from] MergeError),

    #[error("conversion failed: {0}")]
    Convert(#[from] ConvertError),
}
