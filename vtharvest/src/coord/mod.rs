//! Tile grid math.
//!
//! Converts geographic coordinates (longitude/latitude) into Web Mercator
//! slippy-tile indices and enumerates the tiles covering a bounding box.

mod types;

pub use types::{BoundsError, GeoBoundingBox, PixelBounds, TileCoord, TILE_EXTENT};

use std::f64::consts::PI;

/// Converts geographic coordinates to fractional tile coordinates.
///
/// Returns `(x, y)` at zoom level `zoom`; the integer part is the tile index,
/// the fractional part the position inside the tile.
#[inline]
pub fn deg_to_tile(lon: f64, lat: f64, zoom: u8) -> (f64, f64) {
    let n = 2.0_f64.powi(zoom as i32);
    let x = (lon + 180.0) / 360.0 * n;
    let y = (1.0 - (lat * PI / 180.0).tan().asinh() / PI) / 2.0 * n;
    (x, y)
}

/// Converts fractional tile coordinates back to `(lon, lat)` in degrees.
#[inline]
pub fn tile_to_deg(x: f64, y: f64, zoom: u8) -> (f64, f64) {
    let n = 2.0_f64.powi(zoom as i32);
    let lon = x / n * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * y / n)).sinh().atan() * 180.0 / PI;
    (lon, lat)
}

/// Inclusive tile index range `(min_x, min_y, max_x, max_y)` covering `bbox`.
///
/// The north-west corner gives the minimum indices, the south-east corner the
/// maximum ones. Indices are clamped to the valid grid at this zoom level.
pub fn tile_range(bbox: &GeoBoundingBox, zoom: u8) -> (u32, u32, u32, u32) {
    let (x0, y0) = deg_to_tile(bbox.min_lon, bbox.max_lat, zoom);
    let (x1, y1) = deg_to_tile(bbox.max_lon, bbox.min_lat, zoom);
    let max_index = (1_u64 << zoom) - 1;
    let clamp = |v: f64| (v.floor().max(0.0) as u64).min(max_index) as u32;
    (clamp(x0), clamp(y0), clamp(x1), clamp(y1))
}

/// Enumerates every tile of the closed rectangle covering `bbox`.
///
/// Tiles are ordered column by column (x outer, y inner).
pub fn tiles_in_bbox(bbox: &GeoBoundingBox, zoom: u8) -> Vec<TileCoord> {
    let (min_x, min_y, max_x, max_y) = tile_range(bbox, zoom);
    let mut tiles =
        Vec::with_capacity(((max_x - min_x + 1) as usize) * ((max_y - min_y + 1) as usize));
    for x in min_x..=max_x {
        for y in min_y..=max_y {
            tiles.push(TileCoord::new(x, y, zoom));
        }
    }
    tiles
}
