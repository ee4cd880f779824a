//! Vector tile decoding.
//!
//! Turns one tile payload plus its grid coordinate into a flat list of
//! [`Feature`]s in global pixel space (`tile index × 4096 + local offset`).
//!
//! The protobuf envelope is parsed with the prost messages shipped by
//! `geozero`; the geometry command streams and polygon ring structure are
//! decoded here.
//!
//! # Example
//!
//! ```ignore
//! use vtharvest::coord::TileCoord;
//! use vtharvest::mvt::TileDecoder;
//!
//! let decoder = TileDecoder::default();
//! let features = decoder.decode(&payload, TileCoord::new(17176, 11061, 15))?;
//! ```

pub(crate) mod commands;
mod error;
mod rings;

pub use commands::{decode_geometry, TilePoint};
pub use error::DecodeError;
pub use rings::{classify_rings, signed_area};

use std::collections::HashSet;
use std::io::Read;

use flate2::read::GzDecoder;
use geozero::mvt::{tile, Message, Tile};
use tracing::trace;

use crate::coord::{TileCoord, TILE_EXTENT};
use crate::feature::{Feature, Geometry, Position, Properties, PropertyValue};

/// Layer used only for background rendering, skipped by default.
pub const DEFAULT_IGNORED_LAYER: &str = "hintergrund";

const GEOM_POINT: i32 = tile::GeomType::Point as i32;
const GEOM_LINESTRING: i32 = tile::GeomType::Linestring as i32;
const GEOM_POLYGON: i32 = tile::GeomType::Polygon as i32;

/// Decoder for vector tile payloads.
#[derive(Debug, Clone)]
pub struct TileDecoder {
    ignored_layers: HashSet<String>,
}

impl Default for TileDecoder {
    fn default() -> Self {
        Self::new([DEFAULT_IGNORED_LAYER])
    }
}

impl TileDecoder {
    /// Creates a decoder that skips the given layer names entirely.
    pub fn new<I, S>(ignored_layers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ignored_layers: ignored_layers.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true if features of `layer` are dropped.
    pub fn ignores(&self, layer: &str) -> bool {
        self.ignored_layers.contains(layer)
    }

    /// Decodes `payload` belonging to `tile`.
    ///
    /// Gzip-wrapped payloads are inflated first. An empty payload yields no
    /// features.
    pub fn decode(&self, payload: &[u8], tile: TileCoord) -> Result<Vec<Feature>, DecodeError> {
        let inflated;
        let bytes = if is_gzip(payload) {
            inflated = inflate(payload)?;
            &inflated[..]
        } else {
            payload
        };

        let message = Tile::decode(bytes).map_err(|e| DecodeError::Protobuf(e.to_string()))?;
        let origin = tile.pixel_origin();
        let mut features = Vec::new();

        for layer in &message.layers {
            if self.ignores(&layer.name) {
                continue;
            }

            let extent = layer.extent.unwrap_or(TILE_EXTENT);
            if extent != TILE_EXTENT {
                return Err(DecodeError::UnexpectedExtent {
                    layer: layer.name.clone(),
                    extent,
                    expected: TILE_EXTENT,
                });
            }

            for feature in &layer.features {
                decode_feature(layer, feature, origin, &mut features)?;
            }
        }

        trace!(tile = %tile, features = features.len(), "Decoded tile");
        Ok(features)
    }
}

fn is_gzip(payload: &[u8]) -> bool {
    payload.len() >= 2 && payload[0] == 0x1f && payload[1] == 0x8b
}

fn inflate(payload: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::new();
    GzDecoder::new(payload)
        .read_to_end(&mut out)
        .map_err(DecodeError::Gzip)?;
    Ok(out)
}

fn decode_feature(
    layer: &tile::Layer,
    feature: &tile::Feature,
    origin: (f64, f64),
    out: &mut Vec<Feature>,
) -> Result<(), DecodeError> {
    let geom_type = feature.r#type.unwrap_or(0);
    if !matches!(geom_type, GEOM_POINT | GEOM_LINESTRING | GEOM_POLYGON) {
        return Err(DecodeError::UnknownGeometryType {
            layer: layer.name.clone(),
            geom_type,
        });
    }

    let properties = decode_properties(layer, &feature.tags)?;
    let lines = decode_geometry(&feature.geometry).map_err(|reason| DecodeError::Geometry {
        layer: layer.name.clone(),
        reason,
    })?;

    let translate = |p: &TilePoint| -> Position { [p.x as f64 + origin.0, p.y as f64 + origin.1] };
    let translate_line = |line: &[TilePoint]| -> Vec<Position> { line.iter().map(translate).collect() };

    match geom_type {
        GEOM_POINT => {
            // A multi-point feature becomes one point feature per point.
            for point in lines.iter().filter_map(|line| line.first()) {
                out.push(Feature::new(
                    Geometry::Point(translate(point)),
                    properties.clone(),
                    layer.name.as_str(),
                ));
            }
        }
        GEOM_LINESTRING => {
            let mut lines: Vec<Vec<Position>> =
                lines.iter().map(|line| translate_line(line.as_slice())).collect();
            let geometry = match lines.len() {
                0 => return Ok(()),
                1 => Geometry::LineString(lines.remove(0)),
                _ => Geometry::MultiLineString(lines),
            };
            out.push(Feature::new(geometry, properties, layer.name.as_str()));
        }
        _ => {
            let mut polygons: Vec<Vec<Vec<Position>>> = classify_rings(lines)
                .iter()
                .map(|rings| rings.iter().map(|ring| translate_line(ring.as_slice())).collect())
                .collect();
            let geometry = match polygons.len() {
                0 => return Ok(()),
                1 => Geometry::Polygon(polygons.remove(0)),
                _ => Geometry::MultiPolygon(polygons),
            };
            out.push(Feature::new(geometry, properties, layer.name.as_str()));
        }
    }
    Ok(())
}

fn decode_properties(layer: &tile::Layer, tags: &[u32]) -> Result<Properties, DecodeError> {
    let invalid = |index: u32| DecodeError::InvalidTag {
        layer: layer.name.clone(),
        index,
    };

    let pairs = tags.chunks_exact(2);
    if let [dangling] = pairs.remainder() {
        return Err(invalid(*dangling));
    }

    let mut properties = Properties::with_capacity(tags.len() / 2);
    for pair in pairs {
        let key = layer
            .keys
            .get(pair[0] as usize)
            .ok_or_else(|| invalid(pair[0]))?;
        let value = layer
            .values
            .get(pair[1] as usize)
            .ok_or_else(|| invalid(pair[1]))?;
        properties.insert(key.clone(), convert_value(value));
    }
    Ok(properties)
}

fn convert_value(value: &tile::Value) -> PropertyValue {
    if let Some(s) = &value.string_value {
        PropertyValue::String(s.clone())
    } else if let Some(f) = value.float_value {
        PropertyValue::Float(f as f64)
    } else if let Some(d) = value.double_value {
        PropertyValue::Float(d)
    } else if let Some(i) = value.int_value {
        PropertyValue::Int(i)
    } else if let Some(u) = value.uint_value {
        PropertyValue::UInt(u)
    } else if let Some(s) = value.sint_value {
        PropertyValue::Int(s)
    } else if let Some(b) = value.bool_value {
        PropertyValue::Bool(b)
    } else {
        PropertyValue::Null
    }
}
