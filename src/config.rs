//! YAML configuration file support for farmsync.
//!
//! One file configures every stage: ingest normalization, the merge policy,
//! the record store and radius query defaults. Every section is optional.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "production"
//!
//! ingest:
//!   version: 1
//!   strip_control_chars: true
//!   reject_unparseable_timestamps: false
//!   reject_future_timestamps: false
//!   max_records: 50000
//!
//! merge:
//!   max_geometry_shift_km: 5.0
//!
//! index:
//!   backend: "redb"
//!   path: "/var/lib/farmsync/farms.redb"
//!   compression: "zstd"
//!   level: 3
//!
//! query:
//!   default_radius_km: 50.0
//!   default_mode: "auto"
//! ```

use std::fs;
use std::path::Path;

use index::{BackendConfig, CompressionCodec, CompressionConfig, IndexConfig, QueryMode};
use ingest::IngestConfig;
use merge::MergePolicy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level YAML configuration for the whole pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FarmsyncConfig {
    /// Configuration format version
    pub version: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub merge: MergePolicy,

    #[serde(default)]
    pub index: IndexYamlConfig,

    #[serde(default)]
    pub query: QueryYamlConfig,
}

impl FarmsyncConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: FarmsyncConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.ingest
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("ingest: {e}")))?;
        self.merge
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("merge: {e}")))?;
        self.index.validate()?;
        self.query.validate()?;
        Ok(())
    }

    /// Store configuration built from the `index` section.
    pub fn index_config(&self) -> IndexConfig {
        self.index.to_index_config()
    }

    pub fn merge_policy(&self) -> MergePolicy {
        self.merge
    }
}

impl Default for FarmsyncConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            ingest: IngestConfig::default(),
            merge: MergePolicy::default(),
            index: IndexYamlConfig::default(),
            query: QueryYamlConfig::default(),
        }
    }
}

/// Index YAML configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexYamlConfig {
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Required for the redb backend.
    #[serde(default)]
    pub path: Option<String>,

    #[serde(default = "default_compression")]
    pub compression: String,

    #[serde(default = "default_level")]
    pub level: i32,
}

impl IndexYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        let valid_backends = ["in_memory", "redb"];
        if !valid_backends.contains(&self.backend.as_str()) {
            return Err(ConfigLoadError::Validation(format!(
                "index.backend must be one of: {valid_backends:?}"
            )));
        }

        if self.backend == "redb" && self.path.as_deref().is_none_or(|p| p.trim().is_empty()) {
            return Err(ConfigLoadError::Validation(
                "index.path is required when backend is 'redb'".to_string(),
            ));
        }

        let valid_codecs = ["zstd", "none"];
        if !valid_codecs.contains(&self.compression.as_str()) {
            return Err(ConfigLoadError::Validation(format!(
                "index.compression must be one of: {valid_codecs:?}"
            )));
        }

        if !(1..=22).contains(&self.level) {
            return Err(ConfigLoadError::Validation(
                "index.level must be between 1 and 22".to_string(),
            ));
        }
        Ok(())
    }

    fn to_index_config(&self) -> IndexConfig {
        let backend = match (self.backend.as_str(), &self.path) {
            ("redb", Some(path)) => BackendConfig::redb(path.clone()),
            _ => BackendConfig::in_memory(),
        };
        let codec = match self.compression.as_str() {
            "none" => CompressionCodec::None,
            _ => CompressionCodec::Zstd,
        };
        IndexConfig::new()
            .with_backend(backend)
            .with_compression(CompressionConfig::new(codec, self.level))
    }
}

impl Default for IndexYamlConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: None,
            compression: default_compression(),
            level: default_level(),
        }
    }
}

/// Defaults for radius queries that omit `radius` or `use`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryYamlConfig {
    #[serde(default = "default_radius_km")]
    pub default_radius_km: f64,

    #[serde(default)]
    pub default_mode: QueryMode,
}

impl QueryYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if !self.default_radius_km.is_finite() || self.default_radius_km < 0.0 {
            return Err(ConfigLoadError::Validation(
                "query.default_radius_km must be a finite, non-negative number".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for QueryYamlConfig {
    fn default() -> Self {
        Self {
            default_radius_km: default_radius_km(),
            default_mode: QueryMode::Auto,
        }
    }
}

fn default_backend() -> String {
    "in_memory".to_string()
}
fn default_compression() -> String {
    "zstd".to_string()
}
fn default_level() -> i32 {
    3
}
fn default_radius_km() -> f64 {
    50.0
}
