//! Polygon reconstruction from flat ring lists.

use super::commands::TilePoint;

/// Shoelace sum `Σ (x[i+1] - x[i]) · (y[i] + y[i+1])` over the closed ring.
///
/// Only the sign matters: it encodes the ring's winding. Zero means the ring
/// is degenerate. Summed in `i128`, since a corrupt command stream can push
/// the cursor far past the tile extent.
pub fn signed_area(ring: &[TilePoint]) -> i128 {
    let n = ring.len();
    if n == 0 {
        return 0;
    }
    let mut sum = 0_i128;
    let mut j = n - 1;
    for i in 0..n {
        let p1 = ring[i];
        let p2 = ring[j];
        sum += (i128::from(p2.x) - i128::from(p1.x)) * (i128::from(p1.y) + i128::from(p2.y));
        j = i;
    }
    sum
}

/// Groups rings into polygons with holes.
///
/// The winding of the first non-degenerate ring defines "outer". Each ring
/// with that winding starts a new polygon; each ring with the opposite
/// winding becomes a hole of the polygon started last. Zero-area rings are
/// dropped.
pub fn classify_rings(rings: Vec<Vec<TilePoint>>) -> Vec<Vec<Vec<TilePoint>>> {
    let mut polygons = Vec::new();
    let mut polygon: Option<Vec<Vec<TilePoint>>> = None;
    let mut outer_negative: Option<bool> = None;

    for ring in rings {
        let area = signed_area(&ring);
        if area == 0 {
            continue;
        }
        let negative = area < 0;
        let outer = *outer_negative.get_or_insert(negative);

        if negative != outer {
            // The first non-degenerate ring is always outer, so a hole
            // always has a polygon to attach to.
            if let Some(current) = polygon.as_mut() {
                current.push(ring);
            }
            continue;
        }
        if let Some(done) = polygon.replace(vec![ring]) {
            polygons.push(done);
        }
    }

    if let Some(done) = polygon {
        polygons.push(done);
    }
    polygons
}
