//! Geometry command stream decoding.
//!
//! A feature geometry is a flat `u32` stream of command integers
//! (`id | count << 3`) followed by zig-zag encoded parameter pairs. The
//! cursor position carries across commands and rings.

const MOVE_TO: u32 = 1;
const LINE_TO: u32 = 2;
const CLOSE_PATH: u32 = 7;

/// Integer point in tile-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePoint {
    pub x: i64,
    pub y: i64,
}

/// Decodes a zig-zag encoded parameter.
#[inline]
fn zigzag(value: u32) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Decodes a command stream into a list of point sequences.
///
/// Every MoveTo starts a new sequence. ClosePath appends a copy of the
/// sequence's first point, so polygon rings come back closed.
pub fn decode_geometry(stream: &[u32]) -> Result<Vec<Vec<TilePoint>>, String> {
    let mut lines: Vec<Vec<TilePoint>> = Vec::new();
    let mut current: Option<Vec<TilePoint>> = None;
    let (mut x, mut y) = (0_i64, 0_i64);
    let mut i = 0;

    while i < stream.len() {
        let command = stream[i];
        let id = command & 0x7;
        let count = (command >> 3) as usize;
        i += 1;

        match id {
            MOVE_TO | LINE_TO => {
                let needed = count * 2;
                if i + needed > stream.len() {
                    return Err(format!(
                        "command {} at offset {} needs {} parameters, {} left",
                        id,
                        i - 1,
                        needed,
                        stream.len() - i
                    ));
                }
                for _ in 0..count {
                    x += zigzag(stream[i]);
                    y += zigzag(stream[i + 1]);
                    i += 2;

                    if id == MOVE_TO {
                        if let Some(line) = current.take() {
                            lines.push(line);
                        }
                        current = Some(Vec::new());
                    }
                    match current.as_mut() {
                        Some(line) => line.push(TilePoint { x, y }),
                        None => return Err("LineTo before MoveTo".to_string()),
                    }
                }
            }
            CLOSE_PATH => {
                if let Some(line) = current.as_mut() {
                    if let Some(&first) = line.first() {
                        line.push(first);
                    }
                }
            }
            other => return Err(format!("unknown command id {}", other)),
        }
    }

    if let Some(line) = current.take() {
        lines.push(line);
    }
    Ok(lines)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn encode_zigzag(v: i64) -> u32 {
        ((v << 1) ^ (v >> 63)) as u32
    }

    pub(crate) fn command(id: u32, count: u32) -> u32 {
        (id & 0x7) | (count << 3)
    }

    /// Encodes rings as MoveTo + LineTo (+ ClosePath when `close`).
    pub(crate) fn encode_rings(rings: &[Vec<(i64, i64)>], close: bool) -> Vec<u32> {
        let mut out = Vec::new();
        let (mut cx, mut cy) = (0_i64, 0_i64);
        for ring in rings {
            let points: &[(i64, i64)] = if close {
                &ring[..ring.len() - 1]
            } else {
                &ring[..]
            };
            for (idx, &(x, y)) in points.iter().enumerate() {
                if idx == 0 {
                    out.push(command(MOVE_TO, 1));
                } else if idx == 1 {
                    out.push(command(LINE_TO, (points.len() - 1) as u32));
                }
                out.push(encode_zigzag(x - cx));
                out.push(encode_zigzag(y - cy));
                cx = x;
                cy = y;
            }
            if close {
                out.push(command(CLOSE_PATH, 1));
            }
        }
        out
    }

    #[test]
    fn test_zigzag() {
        assert_eq!(zigzag(0), 0);
        assert_eq!(zigzag(1), -1);
        assert_eq!(zigzag(2), 1);
        assert_eq!(zigzag(3), -2);
        assert_eq!(zigzag(encode_zigzag(-4096)), -4096);
    }

    #[test]
    fn test_decode_point() {
        // MoveTo(1) (25, 17), the canonical point example of the MVT encoding
        let stream = [9, 50, 34];
        let lines = decode_geometry(&stream).unwrap();
        assert_eq!(lines, vec![vec![TilePoint { x: 25, y: 17 }]]);
    }

    #[test]
    fn test_decode_multipoint() {
        let stream = [17, 10, 14, 3, 9];
        let lines = decode_geometry(&stream).unwrap();
        assert_eq!(
            lines,
            vec![
                vec![TilePoint { x: 5, y: 7 }],
                vec![TilePoint { x: 3, y: 2 }]
            ]
        );
    }

    #[test]
    fn test_decode_linestring() {
        let stream = [9, 4, 4, 18, 0, 16, 16, 0];
        let lines = decode_geometry(&stream).unwrap();
        assert_eq!(
            lines,
            vec![vec![
                TilePoint { x: 2, y: 2 },
                TilePoint { x: 2, y: 10 },
                TilePoint { x: 10, y: 10 }
            ]]
        );
    }

    #[test]
    fn test_close_path_closes_ring() {
        let stream = [9, 6, 12, 18, 10, 12, 24, 44, 15];
        let lines = decode_geometry(&stream).unwrap();
        assert_eq!(lines.len(), 1);
        let ring = &lines[0];
        assert_eq!(ring.first(), ring.last());
        assert_eq!(ring.len(), 4);
    }

    #[test]
    fn test_encode_helper_roundtrip() {
        let ring = vec![(0, 0), (10, 0), (10, 10), (0, 0)];
        let lines = decode_geometry(&encode_rings(&[ring.clone()], true)).unwrap();
        let decoded: Vec<(i64, i64)> = lines[0].iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(decoded, ring);
    }

    #[test]
    fn test_truncated_stream_is_error() {
        assert!(decode_geometry(&[9, 50]).is_err());
    }

    #[test]
    fn test_line_to_without_move_to_is_error() {
        assert!(decode_geometry(&[10, 2, 2]).is_err());
    }

    #[test]
    fn test_unknown_command_is_error() {
        assert!(decode_geometry(&[3]).is_err());
    }
}
