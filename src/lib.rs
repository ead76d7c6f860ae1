//! Workspace umbrella crate for farmsync.
//!
//! Ties the ingest layer, the merge engine and the farm store together behind
//! [`FarmIngestService`], so an upload goes from raw CSV or GeoJSON to merged,
//! queryable records in one call.
//!
//! ```
//! use std::sync::Arc;
//! use chrono::{TimeZone, Utc};
//! use farmsync::{CsvSource, FarmIndex, FarmIngestService, FixedClock, IndexConfig};
//!
//! let index = Arc::new(FarmIndex::new(IndexConfig::new()).unwrap());
//! let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap());
//! let service = FarmIngestService::new(index).with_clock(Arc::new(clock));
//!
//! let csv = "farm_id,farm_name,latitude,longitude\nF1,North,41.329,19.817\n";
//! let summary = service.ingest(&CsvSource::new(csv)).unwrap();
//! assert_eq!(summary.ingested, 1);
//! assert_eq!(summary.created, 1);
//! ```

mod clock;
pub mod config;
mod service;

pub use crate::clock::{Clock, FixedClock, SystemClock};
pub use crate::config::{ConfigLoadError, FarmsyncConfig};
pub use crate::service::{FarmIngestService, GeometryFlagReport, IngestSummary};

pub use geometry::{distance_km, representative_point, GeoPoint, Geometry, GeometryKind};
pub use index::{
    BackendConfig, CompressionCodec, CompressionConfig, FarmIndex, IndexConfig, IndexError,
    QueryMode, RadiusHit,
};
pub use ingest::{
    CsvSource, FarmSource, GeoJsonSource, IngestConfig, IngestError, IngestSource,
    NormalizedIncomingRecord,
};
pub use merge::{MergeAction, MergeOutcome, MergePolicy, UnifiedFarmRecord};

use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

use thiserror::Error;

/// Errors that can occur while pushing an upload through ingest and merge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("ingest failure: {0}")]
    Ingest(#[from] IngestError),
    #[error("store failure: {0}")]
    Index(#[from] IndexError),
}

/// Metrics observer for pipeline stages.
pub trait PipelineMetrics: Send + Sync {
    /// Called once per upload after normalization, with the record count on
    /// success.
    fn record_normalize(&self, latency: Duration, result: Result<usize, IngestError>);
    /// Called once per merged record.
    fn record_merge(&self, latency: Duration, result: Result<MergeAction, IndexError>);
}

/// Install or clear the global pipeline metrics recorder.
pub fn set_pipeline_metrics(recorder: Option<Arc<dyn PipelineMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn PipelineMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn PipelineMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn PipelineMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

pub(crate) struct MetricsSpan {
    recorder: Arc<dyn PipelineMetrics>,
    start: Instant,
}

impl MetricsSpan {
    pub(crate) fn start() -> Option<Self> {
        metrics_recorder().map(|recorder| Self {
            recorder,
            start: Instant::now(),
        })
    }

    pub(crate) fn record_normalize(self, result: Result<usize, IngestError>) {
        self.recorder.record_normalize(self.start.elapsed(), result);
    }

    pub(crate) fn record_merge(self, result: Result<MergeAction, IndexError>) {
        self.recorder.record_merge(self.start.elapsed(), result);
    }
}
