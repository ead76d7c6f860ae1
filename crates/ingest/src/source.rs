//! Upload formats that produce [`RawFarmRecord`]s.
//!
//! Each source reads a whole document up front and yields records in
//! document order. Sources only split and type-tag the data; validation of
//! individual fields happens in [`normalize_record`](crate::normalize_record).

use csv::{ReaderBuilder, StringRecord, Trim};
use geometry::Geometry;
use serde_json::{Map, Value};

use crate::error::IngestError;
use crate::types::{FarmSource, RawFarmRecord, RawValue};

/// A document that can be split into raw farm records.
pub trait IngestSource {
    fn kind(&self) -> FarmSource;
    fn records(&self) -> Result<Vec<RawFarmRecord>, IngestError>;
}

/// CSV upload with a header row.
///
/// Recognised columns (case-insensitive, any order): `farm_id`, `farm_name`,
/// `acreage`, `latitude`, `longitude`, `geometry` and `last_updated`. Unknown
/// columns are ignored and missing ones read as absent. The `geometry` cell
/// holds a GeoJSON geometry object as JSON text.
#[derive(Debug, Clone)]
pub struct CsvSource {
    content: String,
}

impl CsvSource {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

struct CsvColumns {
    farm_id: Option<usize>,
    farm_name: Option<usize>,
    acreage: Option<usize>,
    latitude: Option<usize>,
    longitude: Option<usize>,
    geometry: Option<usize>,
    last_updated: Option<usize>,
}

impl CsvColumns {
    fn locate(headers: &StringRecord) -> Self {
        let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        Self {
            farm_id: find("farm_id"),
            farm_name: find("farm_name"),
            acreage: find("acreage"),
            latitude: find("latitude"),
            longitude: find("longitude"),
            geometry: find("geometry"),
            last_updated: find("last_updated"),
        }
    }
}

impl IngestSource for CsvSource {
    fn kind(&self) -> FarmSource {
        FarmSource::Csv
    }

    fn records(&self) -> Result<Vec<RawFarmRecord>, IngestError> {
        let content = self.content.strip_prefix('\u{feff}').unwrap_or(&self.content);
        let mut reader = ReaderBuilder::new()
            .trim(Trim::Headers)
            .from_reader(content.as_bytes());
        let columns = CsvColumns::locate(reader.headers()?);

        let mut records = Vec::new();
        for (index, row) in reader.records().enumerate() {
            let row = row?;
            let position = index + 1;
            let cell = |column: Option<usize>| column.and_then(|i| row.get(i)).map(RawValue::from);

            let geometry = match columns.geometry.and_then(|i| row.get(i)) {
                Some(text) => Geometry::from_json_str(text).map_err(|err| {
                    IngestError::InvalidGeometry {
                        position,
                        message: err.to_string(),
                    }
                })?,
                None => None,
            };

            records.push(RawFarmRecord {
                position,
                source: FarmSource::Csv,
                farm_id: cell(columns.farm_id),
                farm_name: cell(columns.farm_name),
                acreage: cell(columns.acreage),
                latitude: cell(columns.latitude),
                longitude: cell(columns.longitude),
                geometry,
                last_updated: cell(columns.last_updated),
            });
        }
        Ok(records)
    }
}

/// GeoJSON upload: a single `Feature` or a `FeatureCollection`.
///
/// Farm attributes live in each feature's `properties` (`farm_id`,
/// `farm_name`, `acreage`, `latitude`, `longitude`, `last_updated`). Point
/// coordinates are not copied into `latitude`/`longitude`; the geometry stays
/// the only spatial claim unless the properties state coordinates directly.
#[derive(Debug, Clone)]
pub struct GeoJsonSource {
    document: Value,
}

impl GeoJsonSource {
    pub fn new(document: Value) -> Self {
        Self { document }
    }

    fn features(&self) -> Result<Vec<&Value>, IngestError> {
        match self.document.get("type").and_then(Value::as_str) {
            Some("FeatureCollection") => match self.document.get("features") {
                Some(Value::Array(items)) => Ok(items.iter().collect()),
                None | Some(Value::Null) => Ok(Vec::new()),
                Some(_) => Err(IngestError::InvalidDocument(
                    "FeatureCollection whose features is not an array".into(),
                )),
            },
            Some("Feature") => Ok(vec![&self.document]),
            Some(other) => Err(IngestError::InvalidDocument(format!("type '{other}'"))),
            None => Err(IngestError::InvalidDocument("a document without a type".into())),
        }
    }
}

impl IngestSource for GeoJsonSource {
    fn kind(&self) -> FarmSource {
        FarmSource::Geojson
    }

    fn records(&self) -> Result<Vec<RawFarmRecord>, IngestError> {
        let empty = Map::new();
        let features = self.features()?;
        let mut records = Vec::with_capacity(features.len());

        for (index, feature) in features.into_iter().enumerate() {
            let props = feature
                .get("properties")
                .and_then(Value::as_object)
                .unwrap_or(&empty);
            let prop = |name: &str| props.get(name).and_then(RawValue::from_json);

            let geometry = match feature.get("geometry") {
                None | Some(Value::Null) => None,
                Some(value) => Some(Geometry::from_geojson(value)),
            };

            records.push(RawFarmRecord {
                position: index + 1,
                source: FarmSource::Geojson,
                farm_id: prop("farm_id"),
                farm_name: prop("farm_name"),
                acreage: prop("acreage"),
                latitude: prop("latitude"),
                longitude: prop("longitude"),
                geometry,
                last_updated: prop("last_updated"),
            });
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn csv_reads_known_columns_in_any_order() {
        let csv = "last_updated,farm_name,farm_id,acreage,extra\n\
                   2024-01-01T00:00:00Z,North Field,F1,12.5,x\n\
                   ,,F2,,y\n";
        let records = CsvSource::new(csv).records().expect("csv parses");
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].position, 1);
        assert_eq!(records[0].farm_id, Some(RawValue::from("F1")));
        assert_eq!(records[0].farm_name, Some(RawValue::from("North Field")));
        assert_eq!(records[0].acreage, Some(RawValue::from("12.5")));
        assert_eq!(records[0].latitude, None);
        assert_eq!(records[0].geometry, None);

        assert_eq!(records[1].farm_name, Some(RawValue::from("")));
        assert_eq!(records[1].source, FarmSource::Csv);
    }

    #[test]
    fn csv_geometry_column_is_json() {
        let csv = "farm_id,geometry\n\
                   F1,\"{\"\"type\"\":\"\"Point\"\",\"\"coordinates\"\":[19.8,41.3]}\"\n\
                   F2,\n";
        let records = CsvSource::new(csv).records().expect("csv parses");
        assert_eq!(records[0].geometry, Some(Geometry::point(19.8, 41.3)));
        assert_eq!(records[1].geometry, None);
    }

    #[test]
    fn csv_bad_geometry_names_the_row() {
        let csv = "farm_id,geometry\nF1,\nF2,{oops\n";
        let err = CsvSource::new(csv).records().expect_err("bad geometry");
        assert!(matches!(err, IngestError::InvalidGeometry { position: 2, .. }));
    }

    #[test]
    fn csv_ragged_rows_are_rejected() {
        let csv = "farm_id,farm_name\nF1,North,extra\n";
        let err = CsvSource::new(csv).records().expect_err("ragged");
        assert!(matches!(err, IngestError::Csv(_)));
    }

    #[test]
    fn csv_byte_order_mark_is_ignored() {
        let csv = "\u{feff}farm_id\nF1\n";
        let records = CsvSource::new(csv).records().expect("csv parses");
        assert_eq!(records[0].farm_id, Some(RawValue::from("F1")));
    }

    #[test]
    fn geojson_feature_collection() {
        let doc = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": { "farm_id": 17, "farm_name": "Hill", "acreage": 3.5 },
                    "geometry": { "type": "Point", "coordinates": [19.82, 41.33] }
                },
                {
                    "type": "Feature",
                    "properties": { "farm_id": "F2" },
                    "geometry": null
                }
            ]
        });
        let records = GeoJsonSource::new(doc).records().expect("parses");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].farm_id, Some(RawValue::Number(17.0)));
        assert_eq!(records[0].acreage, Some(RawValue::Number(3.5)));
        assert_eq!(records[0].geometry, Some(Geometry::point(19.82, 41.33)));
        assert_eq!(records[0].latitude, None);
        assert_eq!(records[1].geometry, None);
        assert_eq!(records[1].position, 2);
    }

    #[test]
    fn geojson_single_feature() {
        let doc = json!({
            "type": "Feature",
            "properties": { "farm_id": "F1" },
            "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1]]] }
        });
        let records = GeoJsonSource::new(doc).records().expect("parses");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source, FarmSource::Geojson);
    }

    #[test]
    fn geojson_rejects_other_documents() {
        let err = GeoJsonSource::new(json!({ "type": "Point", "coordinates": [0, 0] }))
            .records()
            .expect_err("not a feature");
        assert_eq!(err, IngestError::InvalidDocument("type 'Point'".into()));

        let err = GeoJsonSource::new(json!([1, 2, 3]))
            .records()
            .expect_err("not an object");
        assert!(matches!(err, IngestError::InvalidDocument(_)));
    }

    #[test]
    fn geojson_feature_without_properties_has_no_id() {
        let doc = json!({ "type": "FeatureCollection", "features": [{ "type": "Feature" }] });
        let records = GeoJsonSource::new(doc).records().expect("parses");
        assert_eq!(records[0].farm_id, None);
    }
}
