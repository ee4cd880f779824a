//! Feature model shared by the decoder, the clipper and the layer writer.

use indexmap::IndexMap;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Property key carrying the source layer of a feature.
pub const LAYER_NAME_KEY: &str = "layerName";

/// A coordinate pair, `[x, y]` in pixel space or `[lon, lat]` after projection.
pub type Position = [f64; 2];

/// Geometry with coordinates nested according to its type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Position),
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

impl Geometry {
    /// GeoJSON type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::LineString(_) => "LineString",
            Geometry::MultiLineString(_) => "MultiLineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPolygon(_) => "MultiPolygon",
        }
    }

    /// Nesting depth of the coordinate arrays.
    pub fn depth(&self) -> usize {
        match self {
            Geometry::Point(_) => 1,
            Geometry::LineString(_) => 2,
            Geometry::MultiLineString(_) | Geometry::Polygon(_) => 3,
            Geometry::MultiPolygon(_) => 4,
        }
    }

    /// True when the geometry has no coordinates at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Geometry::Point(_) => false,
            Geometry::LineString(line) => line.is_empty(),
            Geometry::MultiLineString(lines) => lines.is_empty(),
            Geometry::Polygon(rings) => rings.is_empty(),
            Geometry::MultiPolygon(polygons) => polygons.is_empty(),
        }
    }

    /// Applies `f` to every position.
    pub fn map_positions<F>(self, mut f: F) -> Geometry
    where
        F: FnMut(Position) -> Position,
    {
        match self {
            Geometry::Point(p) => Geometry::Point(f(p)),
            Geometry::LineString(l) => Geometry::LineString(map_line(l, &mut f)),
            Geometry::MultiLineString(ls) => {
                Geometry::MultiLineString(ls.into_iter().map(|l| map_line(l, &mut f)).collect())
            }
            Geometry::Polygon(rings) => {
                Geometry::Polygon(rings.into_iter().map(|r| map_line(r, &mut f)).collect())
            }
            Geometry::MultiPolygon(polygons) => Geometry::MultiPolygon(
                polygons
                    .into_iter()
                    .map(|rings| rings.into_iter().map(|r| map_line(r, &mut f)).collect())
                    .collect(),
            ),
        }
    }
}

fn map_line<F>(line: Vec<Position>, f: &mut F) -> Vec<Position>
where
    F: FnMut(Position) -> Position,
{
    line.into_iter().map(|p| f(p)).collect()
}

/// Scalar attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

/// Insertion-ordered attribute map.
pub type Properties = IndexMap<String, PropertyValue>;

/// A geometry with attributes, tagged with its source layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Geometry,
    pub properties: Properties,
    pub layer: String,
}

impl Feature {
    /// Creates a feature and injects `layerName` into its properties.
    pub fn new(geometry: Geometry, mut properties: Properties, layer: impl Into<String>) -> Self {
        let layer = layer.into();
        properties.insert(LAYER_NAME_KEY.to_string(), layer.clone().into());
        Self {
            geometry,
            properties,
            layer,
        }
    }

    /// Same attributes and layer, different geometry.
    pub fn with_geometry(&self, geometry: Geometry) -> Self {
        Self {
            geometry,
            properties: self.properties.clone(),
            layer: self.layer.clone(),
        }
    }
}

impl Serialize for Feature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Feature", 3)?;
        state.serialize_field("type", "Feature")?;
        state.serialize_field("geometry", &self.geometry)?;
        state.serialize_field("properties", &self.properties)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_layer_name_injected() {
        let feature = Feature::new(Geometry::Point([1.0, 2.0]), Properties::new(), "strasse_linie");
        assert_eq!(
            feature.properties.get(LAYER_NAME_KEY),
            Some(&PropertyValue::String("strasse_linie".to_string()))
        );
    }

    #[test]
    fn test_feature_serializes_as_geojson() {
        let mut props = Properties::new();
        props.insert("klasse".to_string(), "Hauptstrasse".into());
        props.insert("breite".to_string(), PropertyValue::Float(7.5));
        props.insert("spuren".to_string(), PropertyValue::Int(2));
        let feature = Feature::new(
            Geometry::LineString(vec![[0.0, 0.0], [1.0, 1.0]]),
            props,
            "strasse_linie",
        );

        let value = serde_json::to_value(&feature).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "Feature",
                "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]]},
                "properties": {
                    "klasse": "Hauptstrasse",
                    "breite": 7.5,
                    "spuren": 2,
                    "layerName": "strasse_linie"
                }
            })
        );
    }

    #[test]
    fn test_geometry_depths() {
        assert_eq!(Geometry::Point([0.0, 0.0]).depth(), 1);
        assert_eq!(Geometry::LineString(vec![]).depth(), 2);
        assert_eq!(Geometry::Polygon(vec![]).depth(), 3);
        assert_eq!(Geometry::MultiPolygon(vec![]).depth(), 4);
    }

    #[test]
    fn test_map_positions_reaches_every_level() {
        let geometry = Geometry::MultiPolygon(vec![vec![vec![[1.0, 1.0], [2.0, 2.0]]]]);
        let shifted = geometry.map_positions(|[x, y]| [x + 1.0, y - 1.0]);
        assert_eq!(
            shifted,
            Geometry::MultiPolygon(vec![vec![vec![[2.0, 0.0], [3.0, 1.0]]]])
        );
    }
}
