use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use geometry::GeoPoint;
use index::QueryMode;
use serde::Deserialize;
use std::sync::Arc;

/// Query parameters for `GET /farms/within`
#[derive(Debug, Deserialize)]
pub struct WithinQuery {
    /// Centre latitude, degrees
    pub lat: f64,

    /// Centre longitude, degrees
    pub lon: f64,

    /// Radius in km; the configured default when omitted
    #[serde(default)]
    pub radius: Option<f64>,

    /// `auto`, `latlon` or `geometry`
    #[serde(default, rename = "use")]
    pub mode: Option<String>,
}

/// List every unified record, ordered by farm id.
pub async fn list_farms(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    Ok(Json(state.index.records()?))
}

/// Farms within a radius of a point, nearest first.
pub async fn farms_within(
    State(state): State<Arc<ServerState>>,
    query: Result<Query<WithinQuery>, QueryRejection>,
) -> ServerResult<impl IntoResponse> {
    let Query(query) = query.map_err(|e| ServerError::BadRequest(e.body_text()))?;

    if !(-90.0..=90.0).contains(&query.lat) || !(-180.0..=180.0).contains(&query.lon) {
        return Err(ServerError::BadRequest(format!(
            "lat/lon out of range: ({}, {})",
            query.lat, query.lon
        )));
    }

    let radius = query.radius.unwrap_or(state.query.default_radius_km);
    if radius.is_nan() {
        return Err(ServerError::BadRequest("radius must be a number".to_string()));
    }

    let mode = match query.mode.as_deref() {
        Some(text) => text
            .parse::<QueryMode>()
            .map_err(|e| ServerError::BadRequest(e.to_string()))?,
        None => state.query.default_mode,
    };

    let hits = state
        .index
        .search_radius(GeoPoint::new(query.lat, query.lon), radius, mode)?;
    Ok(Json(hits))
}

/// One unified record by farm id.
pub async fn get_farm(
    State(state): State<Arc<ServerState>>,
    Path(farm_id): Path<String>,
) -> ServerResult<impl IntoResponse> {
    match state.index.get(&farm_id)? {
        Some(record) => Ok(Json(record)),
        None => Err(ServerError::NotFound(format!("farm '{farm_id}' not found"))),
    }
}
