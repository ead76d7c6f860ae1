//! farmsync ingest layer
//!
//! This is where farm data enters the system. Uploads come in two shapes, a
//! CSV table or a GeoJSON document, and leave as a list of
//! [`NormalizedIncomingRecord`]s the merge engine can reason about.
//!
//! ## What we do here
//!
//! - **Split documents** into per-farm raw records ([`CsvSource`],
//!   [`GeoJsonSource`], both behind the [`IngestSource`] trait).
//! - **Sanitize identifiers and names**: control characters out, whitespace
//!   trimmed, empty strings become absent.
//! - **Parse numbers and timestamps** leniently. Junk numbers are dropped with
//!   a warning; a missing timestamp becomes the ingestion time.
//! - **Reject what cannot be merged**: records without a `farm_id`, CSV
//!   geometry cells that are not JSON, documents that are not GeoJSON
//!   features.
//! - **Log everything** via `tracing`.
//!
//! ## Example
//!
//! ```
//! use chrono::Utc;
//! use ingest::{normalize_source, CsvSource, IngestConfig};
//!
//! let csv = "farm_id,farm_name,acreage\nF1,North Field,12.5\n";
//! let records = normalize_source(&CsvSource::new(csv), &IngestConfig::default(), Utc::now()).unwrap();
//!
//! assert_eq!(records[0].farm_id, "F1");
//! assert_eq!(records[0].acreage, Some(12.5));
//! ```
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{info, warn, Level};

mod config;
mod error;
mod normalize;
mod source;
mod types;

pub use crate::config::{ConfigError, IngestConfig};
pub use crate::error::IngestError;
pub use crate::normalize::parse_timestamp;
pub use crate::source::{CsvSource, GeoJsonSource, IngestSource};
pub use crate::types::{FarmSource, NormalizedIncomingRecord, RawFarmRecord, RawValue};

/// Normalize one raw record.
///
/// `ingest_time` replaces a missing `last_updated`.
pub fn normalize_record(
    raw: RawFarmRecord,
    cfg: &IngestConfig,
    ingest_time: DateTime<Utc>,
) -> Result<NormalizedIncomingRecord, IngestError> {
    let start = Instant::now();
    let position = raw.position;
    let source = raw.source;

    let span = tracing::span!(
        Level::DEBUG,
        "ingest.normalize",
        position,
        source = %source
    );
    let _guard = span.enter();

    match normalize::normalize_fields(raw, cfg, ingest_time) {
        Ok(record) => {
            let elapsed_micros = start.elapsed().as_micros();
            info!(
                farm_id = %record.farm_id,
                has_geometry = record.geometry.is_some(),
                last_updated = %record.last_updated,
                elapsed_micros,
                "ingest_success"
            );
            Ok(record)
        }
        Err(err) => {
            let elapsed_micros = start.elapsed().as_micros();
            warn!(error = %err, elapsed_micros, "ingest_failure");
            Err(err)
        }
    }
}

/// Read every record from `source` and normalize it.
///
/// All-or-nothing: the first failing record aborts the whole document, so a
/// caller never merges half an upload.
pub fn normalize_source(
    source: &dyn IngestSource,
    cfg: &IngestConfig,
    ingest_time: DateTime<Utc>,
) -> Result<Vec<NormalizedIncomingRecord>, IngestError> {
    let raw = source.records()?;
    if let Some(limit) = cfg.max_records {
        if raw.len() > limit {
            warn!(
                source = %source.kind(),
                count = raw.len(),
                limit,
                "ingest_rejected_too_many_records"
            );
            return Err(IngestError::TooManyRecords {
                count: raw.len(),
                limit,
            });
        }
    }

    raw.into_iter()
        .map(|record| normalize_record(record, cfg, ingest_time))
        .collect()
}
