use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use geometry::{distance_km, representative_point, Geometry};
use ingest::NormalizedIncomingRecord;
use tracing::{debug, warn};

use crate::policy::MergePolicy;
use crate::types::{GeometryFlag, MergeAction, MergeOutcome, RecordField, UnifiedFarmRecord};

/// Merge `incoming` into `existing` with the default [`MergePolicy`].
pub fn merge(
    existing: Option<UnifiedFarmRecord>,
    incoming: &NormalizedIncomingRecord,
    ingest_time: DateTime<Utc>,
) -> (UnifiedFarmRecord, MergeOutcome) {
    merge_with_policy(existing, incoming, ingest_time, &MergePolicy::default())
}

/// Merge `incoming` into `existing` and report what happened.
///
/// Rules, in order:
///
/// 1. No existing record: copy the incoming fields as they are.
/// 2. `farm_name` and `acreage` are replaced only when the incoming record is
///    strictly newer than the stored one and carries a value.
/// 3. Geometry has no recency gate. It is accepted unless both the stored and
///    the incoming representative points exist and lie more than
///    `policy.max_geometry_shift_km` apart. An accepted Point also sets
///    `latitude`/`longitude`.
/// 4. Directly supplied `latitude`/`longitude` always overwrite.
/// 5. `last_updated` becomes `ingest_time` and `source` the incoming source.
pub fn merge_with_policy(
    existing: Option<UnifiedFarmRecord>,
    incoming: &NormalizedIncomingRecord,
    ingest_time: DateTime<Utc>,
    policy: &MergePolicy,
) -> (UnifiedFarmRecord, MergeOutcome) {
    let Some(mut record) = existing else {
        return create(incoming, ingest_time);
    };

    let mut changed = BTreeSet::new();

    if incoming.last_updated > record.last_updated {
        if let Some(name) = incoming.farm_name.as_ref().filter(|n| !n.is_empty()) {
            set_field(&mut record.farm_name, name.clone(), RecordField::FarmName, &mut changed);
        }
        if let Some(acreage) = incoming.acreage {
            set_field(&mut record.acreage, acreage, RecordField::Acreage, &mut changed);
        }
    } else {
        debug!(
            farm_id = %record.farm_id,
            incoming = %incoming.last_updated,
            stored = %record.last_updated,
            "merge_scalars_stale"
        );
    }

    let geometry_flag = incoming
        .geometry
        .as_ref()
        .and_then(|geometry| apply_geometry(&mut record, geometry, policy, &mut changed));

    if let Some(lat) = incoming.latitude {
        set_field(&mut record.latitude, lat, RecordField::Latitude, &mut changed);
    }
    if let Some(lon) = incoming.longitude {
        set_field(&mut record.longitude, lon, RecordField::Longitude, &mut changed);
    }

    record.last_updated = ingest_time;
    if record.source != incoming.source {
        record.source = incoming.source;
        changed.insert(RecordField::Source);
    }

    let action = if geometry_flag.is_some() {
        MergeAction::UpdateFlagged
    } else {
        MergeAction::UpdateAccepted
    };

    (
        record,
        MergeOutcome {
            action,
            fields_changed: changed,
            geometry_flag,
        },
    )
}

fn create(
    incoming: &NormalizedIncomingRecord,
    ingest_time: DateTime<Utc>,
) -> (UnifiedFarmRecord, MergeOutcome) {
    let farm_name = incoming.farm_name.clone().filter(|n| !n.is_empty());

    let mut changed = BTreeSet::from([RecordField::Source]);
    let provided = [
        (RecordField::FarmName, farm_name.is_some()),
        (RecordField::Acreage, incoming.acreage.is_some()),
        (RecordField::Latitude, incoming.latitude.is_some()),
        (RecordField::Longitude, incoming.longitude.is_some()),
        (RecordField::Geometry, incoming.geometry.is_some()),
    ];
    changed.extend(provided.into_iter().filter_map(|(f, present)| present.then_some(f)));

    let record = UnifiedFarmRecord {
        farm_id: incoming.farm_id.clone(),
        farm_name,
        acreage: incoming.acreage,
        latitude: incoming.latitude,
        longitude: incoming.longitude,
        geometry: incoming.geometry.clone(),
        source: incoming.source,
        last_updated: ingest_time,
    };

    (
        record,
        MergeOutcome {
            action: MergeAction::Create,
            fields_changed: changed,
            geometry_flag: None,
        },
    )
}

/// Applies or rejects an incoming geometry. Returns the flag when rejected.
fn apply_geometry(
    record: &mut UnifiedFarmRecord,
    incoming: &Geometry,
    policy: &MergePolicy,
    changed: &mut BTreeSet<RecordField>,
) -> Option<GeometryFlag> {
    let stored_point = record.geometry_point().or_else(|| record.lat_lon());
    let incoming_point = representative_point(incoming);

    match (stored_point, incoming_point) {
        (Some(stored), Some(next)) => {
            let shift_km = distance_km(stored, next);
            if shift_km > policy.max_geometry_shift_km {
                warn!(
                    farm_id = %record.farm_id,
                    shift_km,
                    threshold_km = policy.max_geometry_shift_km,
                    "merge_geometry_flagged"
                );
                return Some(GeometryFlag {
                    shift_km,
                    threshold_km: policy.max_geometry_shift_km,
                });
            }
            debug!(farm_id = %record.farm_id, shift_km, "merge_geometry_accepted");
        }
        (_, None) => {
            // Nothing to measure the shift with; accepted as-is.
            warn!(
                farm_id = %record.farm_id,
                kind = %incoming.kind(),
                "merge_geometry_unextractable"
            );
        }
        (None, Some(_)) => {}
    }

    if record.geometry.as_ref() != Some(incoming) {
        record.geometry = Some(incoming.clone());
        changed.insert(RecordField::Geometry);
    }
    if let Geometry::Point(coord) = incoming {
        set_field(&mut record.latitude, coord.y, RecordField::Latitude, changed);
        set_field(&mut record.longitude, coord.x, RecordField::Longitude, changed);
    }
    None
}

fn set_field<T: PartialEq>(
    slot: &mut Option<T>,
    value: T,
    field: RecordField,
    changed: &mut BTreeSet<RecordField>,
) {
    if slot.as_ref() != Some(&value) {
        *slot = Some(value);
        changed.insert(field);
    }
}
