use crate::config::ServerConfig;
use crate::error::ServerResult;
use farmsync::config::QueryYamlConfig;
use farmsync::{FarmIngestService, FarmsyncConfig};
use index::FarmIndex;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Upload pipeline writing into `index`
    pub service: FarmIngestService,

    /// Unified farm store (shared across requests)
    pub index: Arc<FarmIndex>,

    /// Defaults for radius queries
    pub query: QueryYamlConfig,
}

impl ServerState {
    /// Create state from the server config, loading the pipeline YAML it
    /// points at (or built-in defaults).
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let pipeline = match &config.pipeline_config {
            Some(path) => FarmsyncConfig::from_file(path)?,
            None => FarmsyncConfig::default(),
        };
        Self::with_pipeline(config, &pipeline)
    }

    /// Create state from an already loaded pipeline configuration.
    pub fn with_pipeline(config: ServerConfig, pipeline: &FarmsyncConfig) -> ServerResult<Self> {
        let index = Arc::new(FarmIndex::new(pipeline.index_config())?);
        let service = FarmIngestService::new(index)
            .with_ingest_config(pipeline.ingest.clone())
            .with_policy(pipeline.merge_policy());
        Ok(Self::with_service(config, service, pipeline.query.clone()))
    }

    /// Wrap an existing service, e.g. one with a fixed clock.
    pub fn with_service(
        config: ServerConfig,
        service: FarmIngestService,
        query: QueryYamlConfig,
    ) -> Self {
        let index = Arc::clone(service.index());
        Self {
            config: Arc::new(config),
            service,
            index,
            query,
        }
    }
}
