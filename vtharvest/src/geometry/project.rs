//! Inverse Web-Mercator projection from global pixel space.

use std::f64::consts::PI;

use geo::orient::{Direction, Orient};

use super::{from_polygon, to_multi_polygon, to_polygon};
use crate::coord::TILE_EXTENT;
use crate::feature::{Geometry, Position};

/// Maps a global pixel position to `[lon, lat]` for a world `extent`
/// pixels wide.
#[inline]
pub fn pixel_to_lon_lat([px, py]: Position, extent: f64) -> Position {
    let lon = 360.0 * px / extent - 180.0;
    let lat = 360.0 / PI * ((1.0 - 2.0 * py / extent) * PI).exp().atan() - 90.0;
    [lon, lat]
}

/// Projects every position of `geometry` from pixel space at `zoom` to
/// longitude/latitude, then rewinds polygons to the right-hand rule.
pub fn demercator(geometry: Geometry, zoom: u8) -> Geometry {
    let extent = 2f64.powi(zoom as i32) * TILE_EXTENT as f64;
    rewind(geometry.map_positions(|p| pixel_to_lon_lat(p, extent)))
}

/// Orients polygon rings: exteriors counter-clockwise, holes clockwise.
///
/// Non-polygon geometries are returned unchanged.
pub fn rewind(geometry: Geometry) -> Geometry {
    match geometry {
        Geometry::Polygon(rings) => match to_polygon(&rings) {
            Some(polygon) => Geometry::Polygon(from_polygon(&polygon.orient(Direction::Default))),
            None => Geometry::Polygon(rings),
        },
        Geometry::MultiPolygon(polygons) => {
            let oriented = to_multi_polygon(&polygons).orient(Direction::Default);
            Geometry::MultiPolygon(oriented.iter().map(from_polygon).collect())
        }
        other => other,
    }
}
