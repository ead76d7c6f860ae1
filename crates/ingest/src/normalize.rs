//! Field-level normalization for raw farm records.
//!
//! Identifiers and names are sanitized (control characters stripped, then
//! trimmed; empty becomes absent). Numbers accept either JSON numbers or
//! numeric strings. Unreadable numbers are dropped with a warning rather than
//! failing the whole upload, since the merge engine treats an absent value as
//! "keep what we have".
//!
//! Timestamps accept RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`
//! (both read as UTC, optional fractional seconds), a bare `YYYY-MM-DD`
//! (midnight UTC) or a numeric Unix time in seconds.
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::warn;

use crate::config::IngestConfig;
use crate::error::IngestError;
use crate::types::{NormalizedIncomingRecord, RawFarmRecord, RawValue};

const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Turn a raw record into a [`NormalizedIncomingRecord`].
///
/// `ingest_time` stands in for a missing (or, unless configured otherwise,
/// unreadable) `last_updated`.
pub(crate) fn normalize_fields(
    raw: RawFarmRecord,
    cfg: &IngestConfig,
    ingest_time: DateTime<Utc>,
) -> Result<NormalizedIncomingRecord, IngestError> {
    let RawFarmRecord {
        position,
        source,
        farm_id,
        farm_name,
        acreage,
        latitude,
        longitude,
        geometry,
        last_updated,
    } = raw;

    let farm_id = sanitize_optional_string(farm_id.map(RawValue::into_text), cfg.strip_control_chars)
        .ok_or(IngestError::MissingFarmId { position })?;
    let farm_name =
        sanitize_optional_string(farm_name.map(RawValue::into_text), cfg.strip_control_chars);

    let acreage = parse_number(position, "acreage", acreage).filter(|value| {
        if *value < 0.0 {
            warn!(position, acreage = *value, "negative acreage dropped");
            return false;
        }
        true
    });
    let latitude = parse_number(position, "latitude", latitude)
        .filter(|value| within_range(position, "latitude", *value, 90.0));
    let longitude = parse_number(position, "longitude", longitude)
        .filter(|value| within_range(position, "longitude", *value, 180.0));

    let last_updated = resolve_timestamp(position, last_updated, cfg, ingest_time)?;

    Ok(NormalizedIncomingRecord {
        farm_id,
        farm_name,
        acreage,
        latitude,
        longitude,
        geometry,
        source,
        last_updated,
    })
}

/// Strips control characters (optionally), trims, and maps empty to `None`.
pub(crate) fn sanitize_optional_string(
    value: Option<String>,
    strip_control: bool,
) -> Option<String> {
    value.and_then(|raw| {
        let filtered = if strip_control {
            raw.chars().filter(|c| !c.is_control()).collect::<String>()
        } else {
            raw
        };
        let trimmed = filtered.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn parse_number(position: usize, field: &'static str, value: Option<RawValue>) -> Option<f64> {
    let parsed = match value? {
        RawValue::Number(n) => n,
        RawValue::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<f64>() {
                Ok(n) => n,
                Err(_) => {
                    warn!(position, field, value = %trimmed, "unparseable number dropped");
                    return None;
                }
            }
        }
    };
    if !parsed.is_finite() {
        warn!(position, field, "non-finite number dropped");
        return None;
    }
    Some(parsed)
}

fn within_range(position: usize, field: &'static str, value: f64, bound: f64) -> bool {
    if value.abs() > bound {
        warn!(position, field, value, "coordinate out of range dropped");
        return false;
    }
    true
}

fn resolve_timestamp(
    position: usize,
    value: Option<RawValue>,
    cfg: &IngestConfig,
    ingest_time: DateTime<Utc>,
) -> Result<DateTime<Utc>, IngestError> {
    let parsed = match value {
        None => return Ok(ingest_time),
        Some(RawValue::Number(secs)) => timestamp_from_unix(secs).ok_or_else(|| secs.to_string()),
        Some(RawValue::Text(text)) if text.trim().is_empty() => return Ok(ingest_time),
        Some(RawValue::Text(text)) => parse_timestamp(&text).ok_or(text),
    };

    let timestamp = match parsed {
        Ok(ts) => ts,
        Err(text) if cfg.reject_unparseable_timestamps => {
            return Err(IngestError::InvalidTimestamp {
                position,
                value: text,
            });
        }
        Err(text) => {
            warn!(position, value = %text, "unparseable last_updated, using ingestion time");
            return Ok(ingest_time);
        }
    };

    if cfg.reject_future_timestamps && timestamp > ingest_time {
        return Err(IngestError::FutureTimestamp {
            position,
            value: timestamp.to_rfc3339(),
        });
    }
    Ok(timestamp)
}

/// Parse the timestamp formats accepted in uploads. Naive forms are UTC.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn timestamp_from_unix(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}
