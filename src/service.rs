use std::sync::Arc;

use ingest::{normalize_source, IngestConfig, IngestSource};
use merge::{MergeAction, MergePolicy};
use index::FarmIndex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::clock::{Clock, SystemClock};
use crate::{MetricsSpan, PipelineError};

/// One rejected geometry from an upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryFlagReport {
    pub farm_id: String,
    pub shift_km: f64,
    pub reason: String,
}

/// What an upload did to the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestSummary {
    /// Records read from the upload and merged.
    pub ingested: usize,
    pub created: usize,
    /// Merges into an existing record, flagged or not.
    pub updated: usize,
    pub geometry_flags: Vec<GeometryFlagReport>,
}

/// Runs uploads through normalization and the merge engine into a
/// [`FarmIndex`].
#[derive(Clone)]
pub struct FarmIngestService {
    index: Arc<FarmIndex>,
    ingest_cfg: IngestConfig,
    policy: MergePolicy,
    clock: Arc<dyn Clock>,
}

impl FarmIngestService {
    pub fn new(index: Arc<FarmIndex>) -> Self {
        Self {
            index,
            ingest_cfg: IngestConfig::default(),
            policy: MergePolicy::default(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_ingest_config(mut self, cfg: IngestConfig) -> Self {
        self.ingest_cfg = cfg;
        self
    }

    pub fn with_policy(mut self, policy: MergePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn index(&self) -> &Arc<FarmIndex> {
        &self.index
    }

    pub fn policy(&self) -> &MergePolicy {
        &self.policy
    }

    /// Normalize every record of `source`, then merge them in document order.
    ///
    /// The whole upload shares one ingestion timestamp. A normalization error
    /// aborts before anything is written; a store error stops the batch
    /// partway, leaving earlier records merged.
    pub fn ingest(&self, source: &dyn IngestSource) -> Result<IngestSummary, PipelineError> {
        let ingest_time = self.clock.now();
        let kind = source.kind();

        let span = MetricsSpan::start();
        let records = match normalize_source(source, &self.ingest_cfg, ingest_time) {
            Ok(records) => {
                if let Some(span) = span {
                    span.record_normalize(Ok(records.len()));
                }
                records
            }
            Err(err) => {
                if let Some(span) = span {
                    span.record_normalize(Err(err.clone()));
                }
                return Err(err.into());
            }
        };

        let mut summary = IngestSummary::default();
        for incoming in &records {
            let span = MetricsSpan::start();
            let (record, outcome) =
                match self.index.merge_incoming(incoming, ingest_time, &self.policy) {
                    Ok(merged) => merged,
                    Err(err) => {
                        if let Some(span) = span {
                            span.record_merge(Err(err.clone()));
                        }
                        warn!(farm_id = %incoming.farm_id, error = %err, "ingest_merge_failed");
                        return Err(err.into());
                    }
                };
            if let Some(span) = span {
                span.record_merge(Ok(outcome.action));
            }

            summary.ingested += 1;
            match outcome.action {
                MergeAction::Create => summary.created += 1,
                MergeAction::UpdateAccepted | MergeAction::UpdateFlagged => summary.updated += 1,
            }
            if let Some(flag) = &outcome.geometry_flag {
                summary.geometry_flags.push(GeometryFlagReport {
                    farm_id: record.farm_id,
                    shift_km: flag.shift_km,
                    reason: flag.reason(),
                });
            }
        }

        info!(
            source = %kind,
            ingested = summary.ingested,
            created = summary.created,
            updated = summary.updated,
            flagged = summary.geometry_flags.len(),
            "ingest_batch_complete"
        );
        Ok(summary)
    }
}
