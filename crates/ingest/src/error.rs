//! Error types produced by the ingest crate.
//!
//! Every variant that concerns a single record carries its 1-based
//! `position` within the uploaded document so callers can point at the
//! offending row or feature.
//!
//! # HTTP Status Code Mapping
//!
//! | Error | Status |
//! |-------|--------|
//! | [`Csv`](IngestError::Csv) | 400 |
//! | [`TooManyRecords`](IngestError::TooManyRecords) | 413 |
//! | everything else | 422 |
use thiserror::Error;

/// Errors that can occur while reading or normalizing farm records.
///
/// Cloneable and comparable so tests can assert on exact variants. The enum
/// is `#[non_exhaustive]`; match with a catch-all arm.
///
/// ```rust
/// use ingest::IngestError;
///
/// let err = IngestError::MissingFarmId { position: 3 };
/// assert_eq!(err.to_string(), "record 3: farm_id is required");
/// assert_eq!(err.http_status_code(), 422);
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IngestError {
    /// A GeoJSON upload whose top-level `type` is neither `Feature` nor
    /// `FeatureCollection`.
    #[error("body must be a GeoJSON Feature or FeatureCollection, got {0}")]
    InvalidDocument(String),

    /// `farm_id` missing, or empty once control characters and whitespace
    /// are stripped.
    #[error("record {position}: farm_id is required")]
    MissingFarmId { position: usize },

    /// A CSV geometry cell that is not JSON.
    #[error("record {position}: {message}")]
    InvalidGeometry { position: usize, message: String },

    /// `last_updated` could not be parsed and the config asks for strictness.
    #[error("record {position}: unparseable last_updated '{value}'")]
    InvalidTimestamp { position: usize, value: String },

    /// `last_updated` lies in the future and the config rejects that.
    #[error("record {position}: last_updated {value} is in the future")]
    FutureTimestamp { position: usize, value: String },

    /// The CSV reader could not tokenize the document.
    #[error("malformed CSV: {0}")]
    Csv(String),

    /// The document holds more records than `IngestConfig::max_records`.
    #[error("document has {count} records, limit is {limit}")]
    TooManyRecords { count: usize, limit: usize },
}

impl IngestError {
    pub fn http_status_code(&self) -> u16 {
        match self {
            IngestError::Csv(_) => 400,
            IngestError::TooManyRecords { .. } => 413,
            _ => 422,
        }
    }
}

impl From<csv::Error> for IngestError {
    fn from(err: csv::Error) -> Self {
        IngestError::Csv(err.to_string())
    }
}
