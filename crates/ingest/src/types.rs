//! Public data model for the ingest crate.
//!
//! Records move through two shapes:
//!
//! ```text
//! CSV row / GeoJSON feature
//!        │  (IngestSource::records)
//!        ▼
//! RawFarmRecord              loosely typed, exactly as the source had it
//!        │  (normalize_record)
//!        ▼
//! NormalizedIncomingRecord   typed, sanitized, ready for merging
//! ```
//!
//! Absence is always modelled with `Option`. An empty string never survives
//! normalization, and an acreage of `0.0` is a real value, not a placeholder.

use std::fmt;

use chrono::{DateTime, Utc};
use geometry::Geometry;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a record came from.
///
/// Serialized in lowercase (`"csv"`, `"geojson"`). The unified store keeps the
/// source of the most recent write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FarmSource {
    /// Tabular upload, one farm per row.
    Csv,
    /// GeoJSON `Feature` or `FeatureCollection`, one farm per feature.
    Geojson,
}

impl FarmSource {
    pub fn as_str(self) -> &'static str {
        match self {
            FarmSource::Csv => "csv",
            FarmSource::Geojson => "geojson",
        }
    }
}

impl fmt::Display for FarmSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scalar cell as the source delivered it.
///
/// CSV only ever produces [`RawValue::Text`]; GeoJSON properties may carry
/// either form.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Text(String),
    Number(f64),
}

impl RawValue {
    /// Convert a JSON property. `null` is treated as absent.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(RawValue::Text(s.clone())),
            Value::Number(n) => match n.as_f64() {
                Some(f) => Some(RawValue::Number(f)),
                None => Some(RawValue::Text(n.to_string())),
            },
            other => Some(RawValue::Text(other.to_string())),
        }
    }

    /// Textual form, used for identifiers and names.
    ///
    /// Integral numbers render without a fractional part so that a numeric
    /// `farm_id` of `17` becomes `"17"`, not `"17.0"`.
    pub fn into_text(self) -> String {
        match self {
            RawValue::Text(s) => s,
            RawValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", n as i64),
            RawValue::Number(n) => n.to_string(),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

/// One record as read from a source, before any validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFarmRecord {
    /// 1-based ordinal of the row or feature within its document. Only used
    /// in error messages.
    pub position: usize,
    pub source: FarmSource,
    pub farm_id: Option<RawValue>,
    pub farm_name: Option<RawValue>,
    pub acreage: Option<RawValue>,
    pub latitude: Option<RawValue>,
    pub longitude: Option<RawValue>,
    pub geometry: Option<Geometry>,
    pub last_updated: Option<RawValue>,
}

impl RawFarmRecord {
    /// Empty record for the given source and position; every field absent.
    pub fn new(source: FarmSource, position: usize) -> Self {
        Self {
            position,
            source,
            farm_id: None,
            farm_name: None,
            acreage: None,
            latitude: None,
            longitude: None,
            geometry: None,
            last_updated: None,
        }
    }
}

/// A validated record ready to be merged into the unified store.
///
/// `farm_id` is guaranteed non-empty. `latitude`/`longitude` are whatever the
/// source stated directly and are independent of `geometry`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedIncomingRecord {
    pub farm_id: String,
    #[serde(default)]
    pub farm_name: Option<String>,
    #[serde(default)]
    pub acreage: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    pub source: FarmSource,
    /// When the source says the record was last modified. Compared against
    /// the stored record to decide whether scalar fields may be replaced.
    pub last_updated: DateTime<Utc>,
}

impl NormalizedIncomingRecord {
    /// Minimal record: identifier, source and timestamp, every optional field
    /// absent.
    pub fn new(
        farm_id: impl Into<String>,
        source: FarmSource,
        last_updated: DateTime<Utc>,
    ) -> Self {
        Self {
            farm_id: farm_id.into(),
            farm_name: None,
            acreage: None,
            latitude: None,
            longitude: None,
            geometry: None,
            source,
            last_updated,
        }
    }

    pub fn with_farm_name(mut self, name: impl Into<String>) -> Self {
        self.farm_name = Some(name.into());
        self
    }

    pub fn with_acreage(mut self, acreage: f64) -> Self {
        self.acreage = Some(acreage);
        self
    }

    pub fn with_lat_lon(mut self, lat: f64, lon: f64) -> Self {
        self.latitude = Some(lat);
        self.longitude = Some(lon);
        self
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }
}
