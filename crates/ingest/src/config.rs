//! Configuration for record normalization.
//!
//! [`IngestConfig`] is cheap to clone and deserializes from JSON, TOML or
//! YAML. Validate it once at startup.
//!
//! ```rust
//! use ingest::IngestConfig;
//!
//! let config = IngestConfig {
//!     reject_future_timestamps: true,
//!     max_records: Some(10_000),
//!     ..IngestConfig::default()
//! };
//! config.validate().expect("valid config");
//! ```
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Runtime configuration for ingest behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Configuration schema version. Must be at least 1.
    pub version: u32,

    /// Remove control characters from identifiers and names before trimming.
    ///
    /// Default: `true`
    pub strip_control_chars: bool,

    /// Fail the upload when `last_updated` is present but unreadable. When
    /// `false` the record falls back to the ingestion time and a warning is
    /// logged.
    ///
    /// Default: `false`
    pub reject_unparseable_timestamps: bool,

    /// Fail the upload when `last_updated` is later than the ingestion time.
    ///
    /// Default: `false`
    pub reject_future_timestamps: bool,

    /// Upper bound on records per upload. `None` disables the limit.
    pub max_records: Option<usize>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            version: 1,
            strip_control_chars: true,
            reject_unparseable_timestamps: false,
            reject_future_timestamps: false,
            max_records: None,
        }
    }
}

impl IngestConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 {
            return Err(ConfigError::InvalidVersion(self.version));
        }
        if self.max_records == Some(0) {
            return Err(ConfigError::InvalidLimit {
                name: "max_records",
                value: 0,
            });
        }
        Ok(())
    }
}

/// Errors raised by [`IngestConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid config version {0}, must be at least 1")]
    InvalidVersion(u32),

    #[error("invalid {name}: {value} (must be greater than zero)")]
    InvalidLimit { name: &'static str, value: usize },
}
