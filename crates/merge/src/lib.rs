//! Record merge engine for farmsync.
//!
//! Given the stored [`UnifiedFarmRecord`] for a farm (if any) and a freshly
//! normalized incoming record, [`merge`] decides field by field what to keep,
//! what to replace and what to flag. It is a pure function: the caller owns
//! persistence and applies the returned record.
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use geometry::Geometry;
//! use ingest::{FarmSource, NormalizedIncomingRecord};
//! use merge::{merge, MergeAction};
//!
//! let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let first = NormalizedIncomingRecord::new("F1", FarmSource::Csv, t)
//!     .with_geometry(Geometry::point(19.8170, 41.3290));
//! let (stored, outcome) = merge(None, &first, t);
//! assert_eq!(outcome.action, MergeAction::Create);
//!
//! // Roughly 68 km west: rejected and flagged.
//! let moved = NormalizedIncomingRecord::new("F1", FarmSource::Geojson, t)
//!     .with_geometry(Geometry::point(19.0000, 41.3290));
//! let (stored, outcome) = merge(Some(stored), &moved, t);
//! assert_eq!(outcome.action, MergeAction::UpdateFlagged);
//! assert_eq!(stored.geometry, Some(Geometry::point(19.8170, 41.3290)));
//! ```

mod engine;
mod policy;
mod types;

pub use crate::engine::{merge, merge_with_policy};
pub use crate::policy::{MergePolicy, PolicyError, DEFAULT_MAX_GEOMETRY_SHIFT_KM};
pub use crate::types::{GeometryFlag, MergeAction, MergeOutcome, RecordField, UnifiedFarmRecord};
