//! Clipping and reprojection of decoded features.
//!
//! Features leave the decoder in global pixel space. [`clip_to_tile`] cuts
//! them down to their source tile so neighbouring tiles do not duplicate
//! geometry, and [`demercator`] maps the result to longitude/latitude.
//!
//! Boolean operations are delegated to the `geo` crate; this module only
//! converts between the feature model and `geo` types and enforces the
//! winding and precision rules around them.

mod clip;
mod project;

pub use clip::clip_to_tile;
pub use project::{demercator, pixel_to_lon_lat, rewind};

use geo::{Coord, LineString, MultiPolygon, Polygon};
use thiserror::Error;

use crate::feature::Position;

/// Errors raised while clipping a feature.
///
/// A malformed input polygon is a data-integrity problem, so both variants
/// abort the merge.
#[derive(Debug, Error)]
pub enum ClipError {
    /// Geometry contains NaN or infinite coordinates.
    #[error("feature in layer '{layer}' has non-finite coordinates")]
    NonFinite { layer: String },

    /// The polygon boolean operation failed.
    #[error("polygon clip failed for layer '{layer}': {reason}")]
    BooleanOp { layer: String, reason: String },
}

pub(crate) fn to_line_string(line: &[Position]) -> LineString<f64> {
    LineString::new(line.iter().map(|&[x, y]| Coord { x, y }).collect())
}

pub(crate) fn from_line_string(line: &LineString<f64>) -> Vec<Position> {
    line.coords().map(|c| [c.x, c.y]).collect()
}

/// First ring is the exterior, the rest are holes. `None` for no rings.
pub(crate) fn to_polygon(rings: &[Vec<Position>]) -> Option<Polygon<f64>> {
    let (exterior, interiors) = rings.split_first()?;
    Some(Polygon::new(
        to_line_string(exterior),
        interiors.iter().map(|r| to_line_string(r)).collect(),
    ))
}

pub(crate) fn from_polygon(polygon: &Polygon<f64>) -> Vec<Vec<Position>> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(from_line_string)
        .collect()
}

pub(crate) fn to_multi_polygon(polygons: &[Vec<Vec<Position>>]) -> MultiPolygon<f64> {
    MultiPolygon::new(polygons.iter().filter_map(|p| to_polygon(p)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_conversion_keeps_ring_order() {
        let rings = vec![
            vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]],
            vec![[2.0, 2.0], [2.0, 4.0], [4.0, 4.0], [4.0, 2.0], [2.0, 2.0]],
        ];
        let polygon = to_polygon(&rings).unwrap();
        assert_eq!(polygon.interiors().len(), 1);
        assert_eq!(from_polygon(&polygon), rings);
    }

    #[test]
    fn test_empty_polygon_is_none() {
        assert!(to_polygon(&[]).is_none());
    }
}
