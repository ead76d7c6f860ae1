//! API route handlers
//!
//! - `health`: liveness and readiness
//! - `farms`: reads and radius queries over the unified store
//! - `ingest`: CSV and GeoJSON uploads

pub mod farms;
pub mod health;
pub mod ingest;

use crate::error::{ServerError, ServerResult};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// API version and base info (GET /).
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "farmsync",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/farms",
            "/farms/within",
            "/farms/{farm_id}",
            "/ingest/csv",
            "/ingest/geojson",
            "/health",
            "/ready"
        ]
    })))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound("route not found".to_string())
}
