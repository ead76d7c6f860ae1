use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, JsonRejection};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use farmsync::{IngestSource, IngestSummary};
use ingest::{CsvSource, GeoJsonSource};
use serde_json::Value;
use std::sync::Arc;

fn rejected(state: &ServerState, status: StatusCode, message: String) -> ServerError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::PayloadTooLarge(state.config.max_body_size_mb)
    } else {
        ServerError::BadRequest(message)
    }
}

/// Store writes are synchronous, so the batch runs on the blocking pool.
async fn run_ingest<S>(state: Arc<ServerState>, source: S) -> ServerResult<IngestSummary>
where
    S: IngestSource + Send + 'static,
{
    let summary = tokio::task::spawn_blocking(move || state.service.ingest(&source))
        .await
        .map_err(|e| ServerError::Internal(format!("ingest task failed: {e}")))??;
    Ok(summary)
}

/// Upload a CSV table. The body must be UTF-8.
pub async fn ingest_csv(
    State(state): State<Arc<ServerState>>,
    body: Result<Bytes, BytesRejection>,
) -> ServerResult<impl IntoResponse> {
    let body = body.map_err(|e| rejected(&state, e.status(), e.body_text()))?;
    let text = String::from_utf8(body.to_vec())
        .map_err(|_| ServerError::BadRequest("CSV body must be UTF-8".to_string()))?;

    let summary = run_ingest(state, CsvSource::new(text)).await?;
    Ok(Json(summary))
}

/// Upload a GeoJSON `Feature` or `FeatureCollection`.
pub async fn ingest_geojson(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ServerResult<impl IntoResponse> {
    let Json(document) = payload.map_err(|e| rejected(&state, e.status(), e.body_text()))?;

    let summary = run_ingest(state, GeoJsonSource::new(document)).await?;
    Ok(Json(summary))
}
