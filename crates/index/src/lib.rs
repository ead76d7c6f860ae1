//! # farmsync index
//!
//! Backend-agnostic store for [`UnifiedFarmRecord`]s, plus the radius query
//! evaluator that runs over them.
//!
//! ## Core Features
//!
//! - **Pluggable Backends** behind the [`IndexBackend`] trait: an in-memory
//!   map for tests and ephemeral deployments, and Redb (feature
//!   `backend-redb`, on by default) for a single-file persistent store.
//! - **Compact storage**: records are JSON, wrapped with a schema version and
//!   compressed with Zstd unless [`CompressionCodec::None`] is chosen.
//! - **Serialized merges**: [`FarmIndex::merge_incoming`] runs the
//!   read-merge-write cycle under a single writer lock, so two uploads
//!   touching the same farm never interleave.
//! - **Radius search** via [`within_radius`] and [`QueryMode`].
//!
//! ## Example
//!
//! ```
//! use chrono::Utc;
//! use geometry::{GeoPoint, Geometry};
//! use index::{FarmIndex, IndexConfig, QueryMode};
//! use ingest::{FarmSource, NormalizedIncomingRecord};
//! use merge::MergePolicy;
//!
//! let index = FarmIndex::new(IndexConfig::new()).unwrap();
//! let now = Utc::now();
//! let incoming = NormalizedIncomingRecord::new("F1", FarmSource::Geojson, now)
//!     .with_geometry(Geometry::point(19.82, 41.33));
//! index.merge_incoming(&incoming, now, &MergePolicy::default()).unwrap();
//!
//! let hits = index
//!     .search_radius(GeoPoint::new(41.329, 19.817), 5.0, QueryMode::Auto)
//!     .unwrap();
//! assert_eq!(hits[0].farm.farm_id, "F1");
//! ```

mod backend;
mod query;

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use geometry::GeoPoint;
use ingest::NormalizedIncomingRecord;
use merge::{merge_with_policy, MergeOutcome, MergePolicy, UnifiedFarmRecord};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use zstd::{decode_all, encode_all};

#[cfg(feature = "backend-redb")]
pub use backend::RedbBackend;
pub use backend::{BackendConfig, InMemoryBackend, IndexBackend};
pub use query::{within_radius, ParseQueryModeError, QueryMode, RadiusHit};

/// Bump whenever the stored record layout changes.
pub const INDEX_SCHEMA_VERSION: u16 = 1;

/// Envelope written to the backend.
#[derive(Serialize, Deserialize)]
struct StoredRecord {
    #[serde(default = "default_schema_version")]
    schema_version: u16,
    record: UnifiedFarmRecord,
}

const fn default_schema_version() -> u16 {
    INDEX_SCHEMA_VERSION
}

/// Compression codec options for index storage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CompressionCodec {
    /// Plain JSON (handy when inspecting a redb file by hand).
    None,
    #[default]
    Zstd,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressionConfig {
    pub codec: CompressionCodec,
    /// Zstd level, 1-22.
    pub level: i32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            codec: CompressionCodec::default(),
            level: 3,
        }
    }
}

impl CompressionConfig {
    pub fn new(codec: CompressionCodec, level: i32) -> Self {
        Self { codec, level }
    }

    pub fn with_codec(mut self, codec: CompressionCodec) -> Self {
        self.codec = codec;
        self
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, IndexError> {
        match self.codec {
            CompressionCodec::None => Ok(data.to_vec()),
            CompressionCodec::Zstd => Ok(encode_all(data, self.level)?),
        }
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, IndexError> {
        match self.codec {
            CompressionCodec::None => Ok(data.to_vec()),
            CompressionCodec::Zstd => Ok(decode_all(data)?),
        }
    }
}

/// Config for initializing the index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexConfig {
    pub backend: BackendConfig,
    pub compression: CompressionConfig,
}

impl IndexConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(mut self, backend: BackendConfig) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_compression(mut self, compression: CompressionConfig) -> Self {
        self.compression = compression;
        self
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Serialization encode error: {0}")]
    Encode(String),
    #[error("Serialization decode error: {0}")]
    Decode(String),
    #[error("Compression error: {0}")]
    Zstd(String),
}

impl From<std::io::Error> for IndexError {
    fn from(e: std::io::Error) -> Self {
        IndexError::Zstd(e.to_string())
    }
}

impl IndexError {
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::Backend(err.to_string())
    }
}

/// The unified farm store.
pub struct FarmIndex {
    backend: Box<dyn IndexBackend>,
    cfg: IndexConfig,
    /// Held across every read-merge-write so merges are applied one at a time.
    writer: Mutex<()>,
}

impl FarmIndex {
    /// Open the store using the configured backend.
    pub fn new(cfg: IndexConfig) -> Result<Self, IndexError> {
        let backend = cfg.backend.build()?;
        Ok(Self::with_backend(cfg, backend))
    }

    /// Build a store over an already constructed backend.
    pub fn with_backend(cfg: IndexConfig, backend: Box<dyn IndexBackend>) -> Self {
        Self {
            backend,
            cfg,
            writer: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.cfg
    }

    pub fn get(&self, farm_id: &str) -> Result<Option<UnifiedFarmRecord>, IndexError> {
        match self.backend.get(farm_id)? {
            Some(data) => Ok(Some(self.decode_record(&data)?)),
            None => Ok(None),
        }
    }

    pub fn flush(&self) -> Result<(), IndexError> {
        self.backend.flush()
    }

    /// Every stored record, ordered by `farm_id`.
    pub fn records(&self) -> Result<Vec<UnifiedFarmRecord>, IndexError> {
        let mut out = Vec::new();
        self.backend.scan(&mut |data: &[u8]| {
            out.push(self.decode_record(data)?);
            Ok(())
        })?;
        out.sort_by(|a, b| a.farm_id.cmp(&b.farm_id));
        Ok(out)
    }

    pub fn len(&self) -> Result<usize, IndexError> {
        let mut count = 0;
        self.backend.scan(&mut |_: &[u8]| {
            count += 1;
            Ok(())
        })?;
        Ok(count)
    }

    pub fn is_empty(&self) -> Result<bool, IndexError> {
        Ok(self.len()? == 0)
    }

    /// Merge one incoming record into the store and persist the result.
    ///
    /// The lookup, the merge and the write happen under the writer lock.
    pub fn merge_incoming(
        &self,
        incoming: &NormalizedIncomingRecord,
        ingest_time: DateTime<Utc>,
        policy: &MergePolicy,
    ) -> Result<(UnifiedFarmRecord, MergeOutcome), IndexError> {
        let _guard = self
            .writer
            .lock()
            .map_err(|_| IndexError::backend("poisoned writer lock"))?;

        let existing = self.get(&incoming.farm_id)?;
        let (record, outcome) = merge_with_policy(existing, incoming, ingest_time, policy);
        self.write(&record)?;

        debug!(
            farm_id = %record.farm_id,
            action = ?outcome.action,
            fields_changed = outcome.fields_changed.len(),
            "index_merge_applied"
        );
        Ok((record, outcome))
    }

    /// Stored records within `radius_km` of `center`, nearest first.
    pub fn search_radius(
        &self,
        center: GeoPoint,
        radius_km: f64,
        mode: QueryMode,
    ) -> Result<Vec<RadiusHit>, IndexError> {
        let hits = within_radius(self.records()?, center, radius_km, mode);
        debug!(
            lat = center.lat,
            lon = center.lon,
            radius_km,
            mode = %mode,
            hits = hits.len(),
            "index_radius_query"
        );
        Ok(hits)
    }

    fn write(&self, record: &UnifiedFarmRecord) -> Result<(), IndexError> {
        let payload = self.encode_record(record)?;
        self.backend.put(&record.farm_id, &payload)
    }

    fn decode_record(&self, data: &[u8]) -> Result<UnifiedFarmRecord, IndexError> {
        let decompressed = self.cfg.compression.decompress(data)?;
        let stored: StoredRecord = serde_json::from_slice(&decompressed)
            .map_err(|e| IndexError::Decode(e.to_string()))?;
        if stored.schema_version > INDEX_SCHEMA_VERSION {
            return Err(IndexError::Decode(format!(
                "record schema version {} is newer than supported {}",
                stored.schema_version, INDEX_SCHEMA_VERSION
            )));
        }
        Ok(stored.record)
    }

    fn encode_record(&self, record: &UnifiedFarmRecord) -> Result<Vec<u8>, IndexError> {
        let stored = StoredRecord {
            schema_version: INDEX_SCHEMA_VERSION,
            record: record.clone(),
        };
        let encoded =
            serde_json::to_vec(&stored).map_err(|e| IndexError::Encode(e.to_string()))?;
        self.cfg.compression.compress(&encoded)
    }
}
