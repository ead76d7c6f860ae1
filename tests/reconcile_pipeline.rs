use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use farmsync::{
    BackendConfig, CsvSource, FarmIndex, FarmIngestService, FixedClock, GeoJsonSource, GeoPoint,
    Geometry, IndexConfig, PipelineError, QueryMode,
};
use serde_json::json;

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap()
}

fn service(index: &Arc<FarmIndex>, now: DateTime<Utc>) -> FarmIngestService {
    FarmIngestService::new(Arc::clone(index)).with_clock(Arc::new(FixedClock::new(now)))
}

fn memory_index() -> Arc<FarmIndex> {
    Arc::new(FarmIndex::new(IndexConfig::new()).expect("in-memory index"))
}

#[test]
fn small_move_is_accepted_large_move_is_flagged() -> Result<(), PipelineError> {
    let index = memory_index();

    let csv = "farm_id,farm_name,acreage,latitude,longitude,last_updated\n\
               F1,North,10,41.3290,19.8170,2024-01-01T00:00:00Z\n";
    service(&index, at(1, 12)).ingest(&CsvSource::new(csv))?;

    // About 0.27 km from the stored coordinates, and newer than the stored record.
    let nudge = json!({
        "type": "Feature",
        "properties": {
            "farm_id": "F1",
            "farm_name": "North Renamed",
            "acreage": 12.5,
            "last_updated": "2025-03-02T00:00:00Z"
        },
        "geometry": { "type": "Point", "coordinates": [19.8200, 41.3300] }
    });
    let summary = service(&index, at(2, 6)).ingest(&GeoJsonSource::new(nudge))?;
    assert_eq!(summary.updated, 1);
    assert!(summary.geometry_flags.is_empty());

    let record = index.get("F1")?.expect("F1 stored");
    assert_eq!(record.geometry, Some(Geometry::point(19.82, 41.33)));
    assert_eq!(record.latitude, Some(41.33));
    assert_eq!(record.longitude, Some(19.82));
    assert_eq!(record.farm_name.as_deref(), Some("North Renamed"));
    assert_eq!(record.acreage, Some(12.5));

    // Roughly 68 km west, no scalar properties.
    let jump = json!({
        "type": "Feature",
        "properties": { "farm_id": "F1", "farm_name": "" },
        "geometry": { "type": "Point", "coordinates": [19.0000, 41.3290] }
    });
    let summary = service(&index, at(3, 6)).ingest(&GeoJsonSource::new(jump))?;
    assert_eq!(summary.geometry_flags.len(), 1);
    assert!(summary.geometry_flags[0].shift_km > 60.0);

    let record = index.get("F1")?.expect("F1 stored");
    assert_eq!(record.geometry, Some(Geometry::point(19.82, 41.33)));
    assert_eq!(record.latitude, Some(41.33));
    assert_eq!(record.longitude, Some(19.82));
    assert_eq!(record.farm_name.as_deref(), Some("North Renamed"));
    assert_eq!(record.acreage, Some(12.5));
    assert_eq!(record.last_updated, at(3, 6));
    Ok(())
}

#[test]
fn reingesting_the_same_upload_only_bumps_last_updated() -> Result<(), PipelineError> {
    let index = memory_index();
    let csv = "farm_id,farm_name,acreage,latitude,longitude\nF1,North,10,41.329,19.817\n";

    service(&index, at(1, 0)).ingest(&CsvSource::new(csv))?;
    let first = index.get("F1")?.expect("stored");

    let summary = service(&index, at(2, 0)).ingest(&CsvSource::new(csv))?;
    assert_eq!(summary.updated, 1);
    let second = index.get("F1")?.expect("stored");

    assert_eq!(second.last_updated, at(2, 0));
    assert_eq!(
        (second.farm_name, second.acreage, second.latitude, second.longitude),
        (first.farm_name, first.acreage, first.latitude, first.longitude)
    );
    Ok(())
}

#[test]
fn radius_query_across_sources() -> Result<(), PipelineError> {
    let index = memory_index();
    let csv = "farm_id,latitude,longitude\n\
               near,41.330,19.820\n\
               far,42.500,19.817\n";
    service(&index, at(1, 0)).ingest(&CsvSource::new(csv))?;

    let polygon = json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": { "farm_id": "field" },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[19.80, 41.32], [19.82, 41.32], [19.82, 41.34], [19.80, 41.34]]]
            }
        }]
    });
    service(&index, at(1, 1)).ingest(&GeoJsonSource::new(polygon))?;

    let center = GeoPoint::new(41.329, 19.817);
    let auto: Vec<_> = index
        .search_radius(center, 50.0, QueryMode::Auto)?
        .into_iter()
        .map(|hit| hit.farm.farm_id)
        .collect();
    assert_eq!(auto, vec!["near", "field"]);

    let latlon = index.search_radius(center, 50.0, QueryMode::LatLon)?;
    assert_eq!(latlon.len(), 1);

    let geometry = index.search_radius(center, 50.0, QueryMode::Geometry)?;
    assert_eq!(geometry.len(), 1);
    assert_eq!(geometry[0].farm.farm_id, "field");
    Ok(())
}

#[test]
fn unsupported_geometry_is_stored_without_a_flag() -> Result<(), PipelineError> {
    let index = memory_index();
    let csv = "farm_id,latitude,longitude\nF1,41.329,19.817\n";
    service(&index, at(1, 0)).ingest(&CsvSource::new(csv))?;

    let odd = json!({
        "type": "Feature",
        "properties": { "farm_id": "F1" },
        "geometry": { "type": "GeometryCollection", "geometries": [] }
    });
    let summary = service(&index, at(1, 1)).ingest(&GeoJsonSource::new(odd))?;
    assert!(summary.geometry_flags.is_empty());

    let record = index.get("F1")?.expect("stored");
    assert!(matches!(record.geometry, Some(Geometry::Unsupported(_))));
    assert_eq!(record.latitude, Some(41.329));
    Ok(())
}

#[cfg(feature = "backend-redb")]
#[test]
fn redb_store_survives_reopen() -> Result<(), PipelineError> {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("farms.redb");
    let cfg = IndexConfig::new().with_backend(BackendConfig::redb(path.to_string_lossy()));

    {
        let index = Arc::new(FarmIndex::new(cfg.clone())?);
        let csv = "farm_id,farm_name\nF1,North\nF2,South\n";
        service(&index, at(1, 0)).ingest(&CsvSource::new(csv))?;
        index.flush()?;
    }

    let reopened = FarmIndex::new(cfg)?;
    let names: Vec<_> = reopened
        .records()?
        .into_iter()
        .filter_map(|r| r.farm_name)
        .collect();
    assert_eq!(names, vec!["North", "South"]);
    Ok(())
}
