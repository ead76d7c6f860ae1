//! GeoJSON geometry model.
//!
//! [`Geometry`] is a closed enum over the GeoJSON geometry types a farm record
//! can carry. Conversion from raw JSON is lenient: anything that does not
//! match the expected nesting for its `type` tag is kept verbatim as
//! [`Geometry::Unsupported`] instead of failing the record. Positions follow
//! the GeoJSON convention (`[longitude, latitude]`), so every [`Coord`] has
//! `x = longitude` and `y = latitude`. A third (altitude) ordinate is accepted
//! on input and dropped.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::GeometryError;

/// A single GeoJSON position; `x` is longitude, `y` is latitude.
pub type Coord = geo_types::Coord<f64>;

/// Structured geometry value attached to a farm record.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Coord),
    MultiPoint(Vec<Coord>),
    LineString(Vec<Coord>),
    MultiLineString(Vec<Vec<Coord>>),
    /// Outer ring followed by any holes.
    Polygon(Vec<Vec<Coord>>),
    MultiPolygon(Vec<Vec<Vec<Coord>>>),
    /// Unknown `type` tag or malformed coordinates. The raw JSON is kept so
    /// the record round-trips unchanged through the store.
    Unsupported(Value),
}

/// Discriminant of [`Geometry`], used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
    Unsupported,
}

impl GeometryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GeometryKind::Point => "Point",
            GeometryKind::MultiPoint => "MultiPoint",
            GeometryKind::LineString => "LineString",
            GeometryKind::MultiLineString => "MultiLineString",
            GeometryKind::Polygon => "Polygon",
            GeometryKind::MultiPolygon => "MultiPolygon",
            GeometryKind::Unsupported => "Unsupported",
        }
    }
}

impl std::fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Geometry {
    /// Convenience constructor taking GeoJSON order.
    pub fn point(lon: f64, lat: f64) -> Self {
        Geometry::Point(Coord { x: lon, y: lat })
    }

    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::MultiPoint(_) => GeometryKind::MultiPoint,
            Geometry::LineString(_) => GeometryKind::LineString,
            Geometry::MultiLineString(_) => GeometryKind::MultiLineString,
            Geometry::Polygon(_) => GeometryKind::Polygon,
            Geometry::MultiPolygon(_) => GeometryKind::MultiPolygon,
            Geometry::Unsupported(_) => GeometryKind::Unsupported,
        }
    }

    /// Interpret a GeoJSON geometry object. Never fails: shapes that cannot be
    /// read end up as [`Geometry::Unsupported`].
    pub fn from_geojson(value: &Value) -> Self {
        parse_known(value).unwrap_or_else(|| Geometry::Unsupported(value.clone()))
    }

    /// Parse a geometry embedded as JSON text (for example a CSV column).
    ///
    /// Blank text and a literal `null` mean "no geometry". Text that is not
    /// JSON at all is an error; well-formed JSON of an unexpected shape is
    /// [`Geometry::Unsupported`].
    pub fn from_json_str(text: &str) -> Result<Option<Self>, GeometryError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let value: Value = serde_json::from_str(trimmed)
            .map_err(|err| GeometryError::InvalidJson(err.to_string()))?;
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(Self::from_geojson(&value)))
    }

    /// Render back to a GeoJSON geometry object.
    pub fn to_geojson(&self) -> Value {
        match self {
            Geometry::Point(c) => json!({ "type": "Point", "coordinates": position(c) }),
            Geometry::MultiPoint(cs) => {
                json!({ "type": "MultiPoint", "coordinates": positions(cs) })
            }
            Geometry::LineString(cs) => {
                json!({ "type": "LineString", "coordinates": positions(cs) })
            }
            Geometry::MultiLineString(parts) => json!({
                "type": "MultiLineString",
                "coordinates": parts.iter().map(|p| positions(p)).collect::<Vec<_>>(),
            }),
            Geometry::Polygon(rings) => json!({
                "type": "Polygon",
                "coordinates": rings.iter().map(|r| positions(r)).collect::<Vec<_>>(),
            }),
            Geometry::MultiPolygon(polys) => json!({
                "type": "MultiPolygon",
                "coordinates": polys
                    .iter()
                    .map(|rings| rings.iter().map(|r| positions(r)).collect::<Vec<_>>())
                    .collect::<Vec<_>>(),
            }),
            Geometry::Unsupported(raw) => raw.clone(),
        }
    }
}

fn position(c: &Coord) -> Value {
    json!([c.x, c.y])
}

fn positions(cs: &[Coord]) -> Vec<Value> {
    cs.iter().map(position).collect()
}

fn parse_known(value: &Value) -> Option<Geometry> {
    let obj: &Map<String, Value> = value.as_object()?;
    let kind = obj.get("type")?.as_str()?;
    let coords = obj.get("coordinates")?;

    let geometry = match kind {
        "Point" => Geometry::Point(parse_position(coords)?),
        "MultiPoint" => Geometry::MultiPoint(parse_positions(coords)?),
        "LineString" => Geometry::LineString(parse_positions(coords)?),
        "MultiLineString" => Geometry::MultiLineString(parse_nested(coords, parse_positions)?),
        "Polygon" => Geometry::Polygon(parse_nested(coords, parse_positions)?),
        "MultiPolygon" => Geometry::MultiPolygon(parse_nested(coords, |rings| {
            parse_nested(rings, parse_positions)
        })?),
        _ => return None,
    };
    Some(geometry)
}

fn parse_position(value: &Value) -> Option<Coord> {
    let items = value.as_array()?;
    if items.len() < 2 {
        return None;
    }
    let x = items[0].as_f64()?;
    let y = items[1].as_f64()?;
    Some(Coord { x, y })
}

fn parse_positions(value: &Value) -> Option<Vec<Coord>> {
    value.as_array()?.iter().map(parse_position).collect()
}

fn parse_nested<T>(value: &Value, inner: impl Fn(&Value) -> Option<T>) -> Option<Vec<T>> {
    value.as_array()?.iter().map(inner).collect()
}

impl Serialize for Geometry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_geojson().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Geometry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Geometry::from_geojson(&value))
    }
}
