//! Radius queries over unified farm records.
//!
//! A record is located by one of two coordinate sources, chosen with
//! [`QueryMode`]:
//!
//! | Mode | Point used | Fallback |
//! |------|------------|----------|
//! | `latlon` | stored `latitude`/`longitude` | none, excluded |
//! | `geometry` | representative point of `geometry` | none, excluded |
//! | `auto` | stored `latitude`/`longitude` | representative point |
//!
//! A record is a hit when its distance to the centre is at most the radius
//! (inclusive). Hits come back nearest first; equal distances keep the input
//! order, and [`FarmIndex`](crate::FarmIndex) feeds records in `farm_id`
//! order, so the result is fully deterministic.

use std::fmt;
use std::str::FromStr;

use geometry::{distance_km, GeoPoint};
use merge::UnifiedFarmRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which coordinates locate a record in a radius query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    /// Stored lat/lon when both are present, otherwise the geometry.
    #[default]
    Auto,
    /// Stored lat/lon only.
    LatLon,
    /// Geometry representative point only.
    Geometry,
}

impl QueryMode {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryMode::Auto => "auto",
            QueryMode::LatLon => "latlon",
            QueryMode::Geometry => "geometry",
        }
    }

    /// The point this mode uses for `record`, if any.
    pub fn locate(self, record: &UnifiedFarmRecord) -> Option<GeoPoint> {
        match self {
            QueryMode::LatLon => record.lat_lon(),
            QueryMode::Geometry => record.geometry_point(),
            QueryMode::Auto => record.lat_lon().or_else(|| record.geometry_point()),
        }
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown query mode '{0}', expected auto, latlon or geometry")]
pub struct ParseQueryModeError(pub String);

impl FromStr for QueryMode {
    type Err = ParseQueryModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(QueryMode::Auto),
            "latlon" => Ok(QueryMode::LatLon),
            "geometry" => Ok(QueryMode::Geometry),
            _ => Err(ParseQueryModeError(s.to_string())),
        }
    }
}

/// A record inside the query radius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadiusHit {
    pub farm: UnifiedFarmRecord,
    pub distance_km: f64,
}

/// Filter `records` to those within `radius_km` of `center`, nearest first.
///
/// A negative (or NaN) radius matches nothing; a zero radius matches only
/// records located exactly at `center`.
pub fn within_radius<I>(records: I, center: GeoPoint, radius_km: f64, mode: QueryMode) -> Vec<RadiusHit>
where
    I: IntoIterator<Item = UnifiedFarmRecord>,
{
    if radius_km.is_nan() || radius_km < 0.0 {
        return Vec::new();
    }

    let mut hits: Vec<RadiusHit> = records
        .into_iter()
        .filter_map(|farm| {
            let point = mode.locate(&farm)?;
            let distance_km = distance_km(center, point);
            (distance_km <= radius_km).then_some(RadiusHit { farm, distance_km })
        })
        .collect();

    // `sort_by` is stable, so ties keep input order.
    hits.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use geometry::Geometry;
    use ingest::FarmSource;

    fn farm(id: &str, lat_lon: Option<(f64, f64)>, geometry: Option<Geometry>) -> UnifiedFarmRecord {
        UnifiedFarmRecord {
            farm_id: id.into(),
            farm_name: None,
            acreage: None,
            latitude: lat_lon.map(|(lat, _)| lat),
            longitude: lat_lon.map(|(_, lon)| lon),
            geometry,
            source: FarmSource::Csv,
            last_updated: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn ids(hits: &[RadiusHit]) -> Vec<&str> {
        hits.iter().map(|h| h.farm.farm_id.as_str()).collect()
    }

    #[test]
    fn parses_modes() {
        assert_eq!("auto".parse::<QueryMode>(), Ok(QueryMode::Auto));
        assert_eq!("LatLon".parse::<QueryMode>(), Ok(QueryMode::LatLon));
        assert_eq!(" geometry ".parse::<QueryMode>(), Ok(QueryMode::Geometry));
        assert!("nearest".parse::<QueryMode>().is_err());
        assert_eq!(QueryMode::default(), QueryMode::Auto);
    }

    #[test]
    fn latlon_mode_sorts_by_distance_and_filters() {
        let center = GeoPoint::new(41.329, 19.817);
        let records = vec![
            farm("far", Some((42.0, 19.817)), None),
            farm("near", Some((41.33, 19.82)), None),
            farm("mid", Some((41.40, 19.817)), None),
            farm("geom-only", None, Some(Geometry::point(19.817, 41.329))),
        ];
        let hits = within_radius(records, center, 50.0, QueryMode::LatLon);
        assert_eq!(ids(&hits), vec!["near", "mid"]);
        assert!(hits[0].distance_km < hits[1].distance_km);
    }

    #[test]
    fn geometry_mode_ignores_lat_lon() {
        let center = GeoPoint::new(41.329, 19.817);
        let records = vec![
            farm("latlon-only", Some((41.329, 19.817)), None),
            farm("geom", None, Some(Geometry::point(19.818, 41.329))),
            farm("unsupported", None, Some(Geometry::Unsupported(serde_json::json!({})))),
        ];
        let hits = within_radius(records, center, 50.0, QueryMode::Geometry);
        assert_eq!(ids(&hits), vec!["geom"]);
    }

    #[test]
    fn auto_prefers_lat_lon_then_geometry() {
        let center = GeoPoint::new(41.329, 19.817);
        let records = vec![
            // Stored lat/lon is far away even though the geometry is close.
            farm("prefers-latlon", Some((43.0, 19.817)), Some(Geometry::point(19.817, 41.329))),
            farm("falls-back", None, Some(Geometry::point(19.82, 41.33))),
            farm("unlocated", None, None),
        ];
        let hits = within_radius(records, center, 25.0, QueryMode::Auto);
        assert_eq!(ids(&hits), vec!["falls-back"]);
    }

    #[test]
    fn boundary_is_inclusive() {
        let center = GeoPoint::new(0.0, 0.0);
        let edge = GeoPoint::new(0.5, 0.0);
        let radius = distance_km(center, edge);
        let records = vec![farm("edge", Some((0.5, 0.0)), None)];

        assert_eq!(within_radius(records.clone(), center, radius, QueryMode::LatLon).len(), 1);
        assert!(within_radius(records, center, radius - 1e-9, QueryMode::LatLon).is_empty());
    }

    #[test]
    fn zero_and_negative_radius() {
        let center = GeoPoint::new(10.0, 10.0);
        let records = vec![
            farm("here", Some((10.0, 10.0)), None),
            farm("there", Some((10.001, 10.0)), None),
        ];
        let hits = within_radius(records.clone(), center, 0.0, QueryMode::LatLon);
        assert_eq!(ids(&hits), vec!["here"]);
        assert_eq!(hits[0].distance_km, 0.0);

        assert!(within_radius(records.clone(), center, -1.0, QueryMode::LatLon).is_empty());
        assert!(within_radius(records, center, f64::NAN, QueryMode::LatLon).is_empty());
    }

    #[test]
    fn ties_keep_input_order() {
        let center = GeoPoint::new(0.0, 0.0);
        let records = vec![
            farm("b", Some((0.0, 0.1)), None),
            farm("a", Some((0.0, -0.1)), None),
            farm("c", Some((0.1, 0.0)), None),
        ];
        let hits = within_radius(records, center, 100.0, QueryMode::LatLon);
        // All three lie 0.1 degrees from the origin along a great circle.
        assert_eq!(ids(&hits), vec!["b", "a", "c"]);
    }
}
