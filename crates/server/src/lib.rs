//! farmsync server: HTTP API over the farm reconciliation pipeline.
//!
//! Uploads (CSV or GeoJSON) are normalized, merged into the unified farm
//! store and reported back as an ingest summary. The store can then be read
//! whole, by farm id, or through a radius query.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe (touches the store)
//! - `GET /farms` - Every unified record, ordered by farm id
//! - `GET /farms/within?lat=..&lon=..&radius=50&use=auto` - Radius query,
//!   nearest first
//! - `GET /farms/{farm_id}` - One record
//! - `POST /ingest/csv` - UTF-8 CSV body
//! - `POST /ingest/geojson` - GeoJSON `Feature` or `FeatureCollection`
//!
//! Errors are returned as `{"error": {"code": "...", "message": "..."}}`.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
