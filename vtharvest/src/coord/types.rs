//! Coordinate types.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

/// Local coordinate extent of one vector tile, in pixels per side.
pub const TILE_EXTENT: u32 = 4096;

/// Errors raised when building a [`GeoBoundingBox`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoundsError {
    /// Wrong number of comma-separated values.
    #[error("expected 4 comma-separated values (minLon,minLat,maxLon,maxLat), got {0}")]
    WrongArity(usize),

    /// A value did not parse as a number.
    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    /// A value is NaN or infinite.
    #[error("bounding box values must be finite")]
    NonFinite,

    /// Minimum exceeds maximum on one axis.
    #[error("inverted bounding box: {axis} minimum {min} exceeds maximum {max}")]
    Inverted { axis: &'static str, min: f64, max: f64 },
}

/// Geographic bounding box `[minLon, minLat, maxLon, maxLat]` in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GeoBoundingBox {
    /// Creates a bounding box, rejecting non-finite or inverted ranges.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<Self, BoundsError> {
        if ![min_lon, min_lat, max_lon, max_lat]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(BoundsError::NonFinite);
        }
        if min_lon > max_lon {
            return Err(BoundsError::Inverted {
                axis: "longitude",
                min: min_lon,
                max: max_lon,
            });
        }
        if min_lat > max_lat {
            return Err(BoundsError::Inverted {
                axis: "latitude",
                min: min_lat,
                max: max_lat,
            });
        }
        Ok(Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        })
    }
}

impl FromStr for GeoBoundingBox {
    type Err = BoundsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(BoundsError::WrongArity(parts.len()));
        }
        let mut values = [0.0_f64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| BoundsError::InvalidNumber(part.to_string()))?;
        }
        Self::new(values[0], values[1], values[2], values[3])
    }
}

impl fmt::Display for GeoBoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

/// Pixel-space rectangle, inclusive on all sides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl PixelBounds {
    /// Returns true if the point lies inside or on the edge of the bounds.
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

/// A tile in the slippy-map grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    /// Column, west to east
    pub x: u32,
    /// Row, north to south
    pub y: u32,
    /// Zoom level
    pub z: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Global pixel coordinates of the tile's north-west corner.
    #[inline]
    pub fn pixel_origin(&self) -> (f64, f64) {
        (
            self.x as f64 * TILE_EXTENT as f64,
            self.y as f64 * TILE_EXTENT as f64,
        )
    }

    /// Global pixel rectangle covered by this tile.
    pub fn pixel_bounds(&self) -> PixelBounds {
        let (x, y) = self.pixel_origin();
        PixelBounds {
            min_x: x,
            min_y: y,
            max_x: x + TILE_EXTENT as f64,
            max_y: y + TILE_EXTENT as f64,
        }
    }

    /// Path of the cached payload below `root`: `<root>/<z>/<x>/<y>.pbf`.
    pub fn cache_path(&self, root: &Path) -> PathBuf {
        root.join(self.z.to_string())
            .join(self.x.to_string())
            .join(format!("{}.pbf", self.y))
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}
