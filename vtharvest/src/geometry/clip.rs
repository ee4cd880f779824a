//! Clipping of pixel-space features to their tile's bounds.

use std::panic::{self, AssertUnwindSafe};

use geo::orient::{Direction, Orient};
use geo::{BooleanOps, Coord, Polygon, Rect};

use super::{from_polygon, to_multi_polygon, to_polygon, ClipError};
use crate::coord::{PixelBounds, TileCoord};
use crate::feature::{Feature, Geometry, Position};

/// Clips `feature` to the pixel bounds of `tile`.
///
/// Multi-part results are split into one single-part feature per part, each
/// carrying the full property set. A feature entirely outside the tile
/// yields an empty vector.
pub fn clip_to_tile(feature: &Feature, tile: TileCoord) -> Result<Vec<Feature>, ClipError> {
    let bounds = tile.pixel_bounds();
    match &feature.geometry {
        Geometry::Point([x, y]) => {
            if !(x.is_finite() && y.is_finite()) {
                return Err(non_finite(feature));
            }
            if bounds.contains(*x, *y) {
                Ok(vec![feature.clone()])
            } else {
                Ok(Vec::new())
            }
        }
        Geometry::LineString(line) => clip_lines(feature, std::slice::from_ref(line), &bounds),
        Geometry::MultiLineString(lines) => clip_lines(feature, lines, &bounds),
        Geometry::Polygon(rings) => clip_polygons(feature, std::slice::from_ref(rings), &bounds),
        Geometry::MultiPolygon(polygons) => clip_polygons(feature, polygons, &bounds),
    }
}

fn clip_lines(
    feature: &Feature,
    lines: &[Vec<Position>],
    bounds: &PixelBounds,
) -> Result<Vec<Feature>, ClipError> {
    if !all_finite(lines.iter().flatten()) {
        return Err(non_finite(feature));
    }

    Ok(lines
        .iter()
        .flat_map(|line| clip_polyline(line, bounds))
        .map(|piece| round_ring(&piece))
        .filter(|piece| piece.len() >= 2)
        .map(|piece| feature.with_geometry(Geometry::LineString(piece)))
        .collect())
}

const LEFT: u8 = 1;
const RIGHT: u8 = 2;
const BELOW: u8 = 4;
const ABOVE: u8 = 8;

/// Cohen-Sutherland clip of one polyline against `bounds`.
///
/// Vertex order is kept and the line is only cut where it crosses the box,
/// so each exit from the box starts a new piece.
fn clip_polyline(points: &[Position], bounds: &PixelBounds) -> Vec<Vec<Position>> {
    let mut pieces = Vec::new();
    let Some(first) = points.first() else {
        return pieces;
    };

    let mut part: Vec<Position> = Vec::new();
    let mut code_a = outcode(first, bounds);
    let last = points.len() - 1;

    for (i, pair) in points.windows(2).enumerate() {
        let (mut a, mut b) = (pair[0], pair[1]);
        let end_code = outcode(&b, bounds);
        let mut code_b = end_code;
        let is_last = i + 1 == last;

        loop {
            if code_a | code_b == 0 {
                part.push(a);
                if code_b != end_code {
                    // Segment leaves the box.
                    part.push(b);
                    if !is_last {
                        pieces.push(std::mem::take(&mut part));
                    }
                } else if is_last {
                    part.push(b);
                }
                break;
            } else if code_a & code_b != 0 {
                break;
            } else if code_a != 0 {
                a = intersect(&a, &b, code_a, bounds);
                code_a = outcode(&a, bounds);
            } else {
                b = intersect(&a, &b, code_b, bounds);
                code_b = outcode(&b, bounds);
            }
        }
        code_a = end_code;
    }

    if !part.is_empty() {
        pieces.push(part);
    }
    pieces
}

fn outcode([x, y]: &Position, bounds: &PixelBounds) -> u8 {
    let mut code = 0;
    if *x < bounds.min_x {
        code |= LEFT;
    } else if *x > bounds.max_x {
        code |= RIGHT;
    }
    if *y < bounds.min_y {
        code |= BELOW;
    } else if *y > bounds.max_y {
        code |= ABOVE;
    }
    code
}

/// Point where segment `a`-`b` meets the box edge named by `edge`.
fn intersect(a: &Position, b: &Position, edge: u8, bounds: &PixelBounds) -> Position {
    let [ax, ay] = *a;
    let [bx, by] = *b;
    if edge & ABOVE != 0 {
        [ax + (bx - ax) * (bounds.max_y - ay) / (by - ay), bounds.max_y]
    } else if edge & BELOW != 0 {
        [ax + (bx - ax) * (bounds.min_y - ay) / (by - ay), bounds.min_y]
    } else if edge & RIGHT != 0 {
        [bounds.max_x, ay + (by - ay) * (bounds.max_x - ax) / (bx - ax)]
    } else {
        [bounds.min_x, ay + (by - ay) * (bounds.min_x - ax) / (bx - ax)]
    }
}

fn clip_polygons(
    feature: &Feature,
    polygons: &[Vec<Vec<Position>>],
    bounds: &PixelBounds,
) -> Result<Vec<Feature>, ClipError> {
    if !all_finite(polygons.iter().flatten().flatten()) {
        return Err(non_finite(feature));
    }

    let rounded: Vec<Vec<Vec<Position>>> = polygons
        .iter()
        .map(|rings| rings.iter().map(|r| round_ring(r)).collect())
        .collect();
    let subject = to_multi_polygon(&rounded).orient(Direction::Default);
    let clip = bounds_polygon(bounds);
    let clipped = guarded(feature, || subject.intersection(&clip))?;

    Ok(clipped
        .iter()
        .filter_map(round_polygon)
        .map(|polygon| {
            let rings = from_polygon(&polygon.orient(Direction::Default));
            feature.with_geometry(Geometry::Polygon(rings))
        })
        .collect())
}

/// Rounds to integer pixels and drops rings that collapse below a closed
/// triangle. `None` when the exterior collapses.
fn round_polygon(polygon: &Polygon<f64>) -> Option<Polygon<f64>> {
    let mut rings = from_polygon(polygon).into_iter().map(|ring| round_ring(&ring));

    let exterior = rings.next().filter(|ring| ring.len() >= 4)?;
    let holes = rings.filter(|ring| ring.len() >= 4);
    to_polygon(&std::iter::once(exterior).chain(holes).collect::<Vec<_>>())
}

/// Rounds each position and removes consecutive duplicates.
fn round_ring(ring: &[Position]) -> Vec<Position> {
    let mut out: Vec<Position> = ring.iter().map(|[x, y]| [x.round(), y.round()]).collect();
    out.dedup();
    out
}

fn bounds_polygon(bounds: &PixelBounds) -> Polygon<f64> {
    Rect::new(
        Coord {
            x: bounds.min_x,
            y: bounds.min_y,
        },
        Coord {
            x: bounds.max_x,
            y: bounds.max_y,
        },
    )
    .to_polygon()
}

fn all_finite<'a>(mut positions: impl Iterator<Item = &'a Position>) -> bool {
    positions.all(|[x, y]| x.is_finite() && y.is_finite())
}

fn non_finite(feature: &Feature) -> ClipError {
    ClipError::NonFinite {
        layer: feature.layer.clone(),
    }
}

/// Runs a boolean operation, turning a panic inside `geo` into an error.
fn guarded<T>(feature: &Feature, op: impl FnOnce() -> T) -> Result<T, ClipError> {
    panic::catch_unwind(AssertUnwindSafe(op)).map_err(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "boolean operation panicked".to_string());
        ClipError::BooleanOp {
            layer: feature.layer.clone(),
            reason,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{Properties, PropertyValue};
    use geo::Area;

    fn feature(geometry: Geometry) -> Feature {
        let mut props = Properties::new();
        props.insert("klasse".to_string(), "Wald".into());
        Feature::new(geometry, props, "vegetation_flaeche")
    }

    fn square(x: f64, y: f64, size: f64) -> Vec<Position> {
        vec![[x, y], [x + size, y], [x + size, y + size], [x, y + size], [x, y]]
    }

    #[test]
    fn test_point_on_edges_is_kept() {
        let tile = TileCoord::new(1, 1, 2);
        for p in [[4096.0, 4096.0], [8192.0, 8192.0], [4096.0, 8192.0], [6000.0, 5000.0]] {
            let clipped = clip_to_tile(&feature(Geometry::Point(p)), tile).unwrap();
            assert_eq!(clipped.len(), 1, "point {:?} should be kept", p);
        }
    }

    #[test]
    fn test_point_outside_is_dropped() {
        let tile = TileCoord::new(1, 1, 2);
        for p in [[4095.0, 5000.0], [8193.0, 5000.0], [5000.0, 4095.5]] {
            let clipped = clip_to_tile(&feature(Geometry::Point(p)), tile).unwrap();
            assert!(clipped.is_empty(), "point {:?} should be dropped", p);
        }
    }

    #[test]
    fn test_line_is_cut_at_tile_edge() {
        let line = Geometry::LineString(vec![[-100.0, 100.0], [200.0, 100.0]]);
        let clipped = clip_to_tile(&feature(line), TileCoord::new(0, 0, 0)).unwrap();

        assert_eq!(clipped.len(), 1);
        match &clipped[0].geometry {
            Geometry::LineString(points) => {
                assert_eq!(points.first(), Some(&[0.0, 100.0]));
                assert_eq!(points.last(), Some(&[200.0, 100.0]));
            }
            other => panic!("expected LineString, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_line_leaving_and_reentering_is_split() {
        let line = Geometry::LineString(vec![
            [100.0, 100.0],
            [5000.0, 100.0],
            [5000.0, 200.0],
            [100.0, 200.0],
        ]);
        let clipped = clip_to_tile(&feature(line), TileCoord::new(0, 0, 0)).unwrap();

        assert_eq!(clipped.len(), 2);
        for piece in &clipped {
            assert_eq!(piece.geometry.type_name(), "LineString");
            assert_eq!(
                piece.properties.get("klasse"),
                Some(&PropertyValue::String("Wald".to_string()))
            );
        }
    }

    #[test]
    fn test_line_outside_is_dropped() {
        let line = Geometry::LineString(vec![[5000.0, 100.0], [6000.0, 100.0]]);
        let clipped = clip_to_tile(&feature(line), TileCoord::new(0, 0, 0)).unwrap();
        assert!(clipped.is_empty());
    }

    fn line_pieces(clipped: &[Feature]) -> Vec<Vec<Position>> {
        clipped
            .iter()
            .map(|f| match &f.geometry {
                Geometry::LineString(points) => points.clone(),
                other => panic!("expected LineString, got {}", other.type_name()),
            })
            .collect()
    }

    #[test]
    fn test_crossing_parts_keep_their_routes() {
        let parts = vec![
            vec![[100.0, 100.0], [300.0, 300.0]],
            vec![[100.0, 300.0], [300.0, 100.0]],
        ];
        let lines = Geometry::MultiLineString(parts.clone());
        let clipped = clip_to_tile(&feature(lines), TileCoord::new(0, 0, 0)).unwrap();
        assert_eq!(line_pieces(&clipped), parts);
    }

    #[test]
    fn test_t_junction_parts_are_not_rejoined() {
        let parts = vec![
            vec![[100.0, 100.0], [300.0, 100.0]],
            vec![[200.0, 100.0], [200.0, 300.0]],
        ];
        let lines = Geometry::MultiLineString(parts.clone());
        let clipped = clip_to_tile(&feature(lines), TileCoord::new(0, 0, 0)).unwrap();
        assert_eq!(line_pieces(&clipped), parts);
    }

    #[test]
    fn test_overlapping_parts_stay_separate() {
        let parts = vec![
            vec![[100.0, 100.0], [300.0, 100.0]],
            vec![[200.0, 100.0], [400.0, 100.0]],
        ];
        let lines = Geometry::MultiLineString(parts.clone());
        let clipped = clip_to_tile(&feature(lines), TileCoord::new(0, 0, 0)).unwrap();
        assert_eq!(line_pieces(&clipped), parts);
    }

    #[test]
    fn test_split_pieces_keep_vertex_order() {
        let line = Geometry::LineString(vec![
            [100.0, 100.0],
            [5000.0, 100.0],
            [5000.0, 200.0],
            [100.0, 200.0],
        ]);
        let clipped = clip_to_tile(&feature(line), TileCoord::new(0, 0, 0)).unwrap();
        assert_eq!(
            line_pieces(&clipped),
            vec![
                vec![[100.0, 100.0], [4096.0, 100.0]],
                vec![[4096.0, 200.0], [100.0, 200.0]],
            ]
        );
    }

    #[test]
    fn test_line_crossing_tile_is_cut_on_both_sides() {
        let line = Geometry::LineString(vec![[-100.0, -100.0], [5000.0, 5000.0]]);
        let clipped = clip_to_tile(&feature(line), TileCoord::new(0, 0, 0)).unwrap();
        assert_eq!(line_pieces(&clipped), vec![vec![[0.0, 0.0], [4096.0, 4096.0]]]);
    }

    #[test]
    fn test_polygon_is_intersected_with_tile() {
        let polygon = Geometry::Polygon(vec![square(-100.0, -100.0, 200.0)]);
        let clipped = clip_to_tile(&feature(polygon), TileCoord::new(0, 0, 0)).unwrap();

        assert_eq!(clipped.len(), 1);
        let rings = match &clipped[0].geometry {
            Geometry::Polygon(rings) => rings.clone(),
            other => panic!("expected Polygon, got {}", other.type_name()),
        };
        let area = to_polygon(&rings).unwrap().unsigned_area();
        assert!((area - 10_000.0).abs() < 1e-6);
        assert!(rings[0].iter().all(|[x, y]| *x >= 0.0 && *y >= 0.0));
    }

    #[test]
    fn test_polygon_hole_survives_clip() {
        let polygon = Geometry::Polygon(vec![
            square(-100.0, 10.0, 1000.0),
            square(100.0, 100.0, 100.0),
        ]);
        let clipped = clip_to_tile(&feature(polygon), TileCoord::new(0, 0, 0)).unwrap();

        assert_eq!(clipped.len(), 1);
        match &clipped[0].geometry {
            Geometry::Polygon(rings) => assert_eq!(rings.len(), 2),
            other => panic!("expected Polygon, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_multipolygon_is_flattened() {
        let polygons = Geometry::MultiPolygon(vec![
            vec![square(10.0, 10.0, 50.0)],
            vec![square(1000.0, 1000.0, 50.0)],
            vec![square(9000.0, 9000.0, 50.0)],
        ]);
        let clipped = clip_to_tile(&feature(polygons), TileCoord::new(0, 0, 0)).unwrap();

        assert_eq!(clipped.len(), 2);
        assert!(clipped
            .iter()
            .all(|f| f.geometry.type_name() == "Polygon" && f.layer == "vegetation_flaeche"));
    }

    #[test]
    fn test_non_finite_coordinates_are_rejected() {
        let polygon = Geometry::Polygon(vec![vec![
            [0.0, 0.0],
            [f64::NAN, 0.0],
            [10.0, 10.0],
            [0.0, 0.0],
        ]]);
        let err = clip_to_tile(&feature(polygon), TileCoord::new(0, 0, 0)).unwrap_err();
        assert!(matches!(err, ClipError::NonFinite { .. }));
    }

    #[test]
    fn test_round_ring_dedups() {
        let ring = round_ring(&[[0.2, 0.2], [0.4, 0.1], [1.0, 1.0]]);
        assert_eq!(ring, vec![[0.0, 0.0], [1.0, 1.0]]);
    }
}
