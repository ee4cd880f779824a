//! Geometry type inference from layer names.

use std::fmt;

use super::ConvertError;

/// Layer name that holds points despite lacking the point suffix.
const ADDRESS_LAYER: &str = "adresse";

/// Target geometry type of a GeoPackage layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
}

impl GeometryKind {
    /// Infers the kind from the naming convention of the tile schema:
    /// `…punkt` and `adresse` hold points, `…linie` lines and `…flaeche`
    /// areas.
    pub fn from_layer_name(name: &str) -> Result<Self, ConvertError> {
        if name.ends_with("punkt") || name == ADDRESS_LAYER {
            Ok(GeometryKind::Point)
        } else if name.ends_with("linie") {
            Ok(GeometryKind::LineString)
        } else if name.ends_with("flaeche") {
            Ok(GeometryKind::Polygon)
        } else {
            Err(ConvertError::UnknownGeometryKind {
                layer: name.to_string(),
            })
        }
    }

    /// Name accepted by `ogr2ogr -nlt`.
    pub fn ogr_name(self) -> &'static str {
        match self {
            GeometryKind::Point => "POINT",
            GeometryKind::LineString => "LINESTRING",
            GeometryKind::Polygon => "POLYGON",
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ogr_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inference() {
        assert_eq!(
            GeometryKind::from_layer_name("baum_punkt").unwrap(),
            GeometryKind::Point
        );
        assert_eq!(
            GeometryKind::from_layer_name("adresse").unwrap(),
            GeometryKind::Point
        );
        assert_eq!(
            GeometryKind::from_layer_name("strasse_linie").unwrap(),
            GeometryKind::LineString
        );
        assert_eq!(
            GeometryKind::from_layer_name("gebaeude_flaeche").unwrap(),
            GeometryKind::Polygon
        );
    }

    #[test]
    fn test_unknown_suffix() {
        let err = GeometryKind::from_layer_name("beschriftung").unwrap_err();
        assert!(matches!(err, ConvertError::UnknownGeometryKind { layer } if layer == "beschriftung"));
    }

    #[test]
    fn test_address_must_match_exactly() {
        assert!(GeometryKind::from_layer_name("adresse_alt").is_err());
    }

    #[test]
    fn test_ogr_names() {
        assert_eq!(GeometryKind::Polygon.to_string(), "POLYGON");
        assert_eq!(GeometryKind::Point.ogr_name(), "POINT");
    }
}
