//! Error types for vector tile decoding.

use thiserror::Error;

/// Errors that can occur while decoding a vector tile payload.
///
/// Every variant is fatal for the merge stage: a tile that cannot be decoded
/// exactly would silently drop or misplace data.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Payload is not a valid protobuf tile message.
    #[error("invalid tile protobuf: {0}")]
    Protobuf(String),

    /// Gzip-wrapped payload could not be inflated.
    #[error("failed to inflate gzip payload: {0}")]
    Gzip(#[source] std::io::Error),

    /// Layer declares a coordinate extent other than the supported one.
    #[error("layer '{layer}' has extent {extent}, expected {expected}")]
    UnexpectedExtent {
        layer: String,
        extent: u32,
        expected: u32,
    },

    /// Feature geometry type is not point, line or polygon.
    #[error("layer '{layer}' contains unsupported geometry type {geom_type}")]
    UnknownGeometryType { layer: String, geom_type: i32 },

    /// Feature tag references a key or value that does not exist.
    #[error("layer '{layer}' has invalid tag index {index}")]
    InvalidTag { layer: String, index: u32 },

    /// Geometry command stream is malformed.
    #[error("malformed geometry in layer '{layer}': {reason}")]
    Geometry { layer: String, reason: String },
}
