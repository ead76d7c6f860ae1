use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use geometry::{representative_point, GeoPoint, Geometry};
use ingest::FarmSource;
use serde::{Deserialize, Serialize};

/// The reconciled view of one farm, as held by the store.
///
/// `last_updated` is the ingestion time of the most recent merge, not the
/// source's own modification time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedFarmRecord {
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
    pub last_updated: DateTime<Utc>,
}

impl UnifiedFarmRecord {
    /// Directly stored coordinates, when both halves are present.
    pub fn lat_lon(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            _ => None,
        }
    }

    /// Representative point of the stored geometry.
    pub fn geometry_point(&self) -> Option<GeoPoint> {
        self.geometry.as_ref().and_then(representative_point)
    }
}

/// Fields the merge engine can mutate. `last_updated` is not listed because
/// every merge bumps it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    FarmName,
    Acreage,
    Latitude,
    Longitude,
    Geometry,
    Source,
}

impl RecordField {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordField::FarmName => "farm_name",
            RecordField::Acreage => "acreage",
            RecordField::Latitude => "latitude",
            RecordField::Longitude => "longitude",
            RecordField::Geometry => "geometry",
            RecordField::Source => "source",
        }
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeAction {
    /// First sighting of the farm id.
    Create,
    /// Existing record updated; any incoming geometry was accepted.
    UpdateAccepted,
    /// Existing record updated, but the incoming geometry moved the farm
    /// further than the policy allows and was discarded.
    UpdateFlagged,
}

/// Why a geometry update was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometryFlag {
    pub shift_km: f64,
    pub threshold_km: f64,
}

impl GeometryFlag {
    pub fn reason(&self) -> String {
        format!(
            "Geometry shift {:.3} km exceeds threshold {:.3} km",
            self.shift_km, self.threshold_km
        )
    }
}

/// Result of merging one incoming record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeOutcome {
    pub action: MergeAction,
    /// Fields whose stored value actually changed.
    pub fields_changed: BTreeSet<RecordField>,
    pub geometry_flag: Option<GeometryFlag>,
}

impl MergeOutcome {
    pub fn is_flagged(&self) -> bool {
        self.geometry_flag.is_some()
    }

    pub fn changed(&self, field: RecordField) -> bool {
        self.fields_changed.contains(&field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_reason_formats_three_decimals() {
        let flag = GeometryFlag {
            shift_km: 68.1234,
            threshold_km: 5.0,
        };
        assert_eq!(
            flag.reason(),
            "Geometry shift 68.123 km exceeds threshold 5.000 km"
        );
    }

    #[test]
    fn fields_serialize_snake_case() {
        let value = serde_json::to_value(RecordField::FarmName).expect("serialize");
        assert_eq!(value, serde_json::json!("farm_name"));
        let action = serde_json::to_value(MergeAction::UpdateFlagged).expect("serialize");
        assert_eq!(action, serde_json::json!("update_flagged"));
    }
}
