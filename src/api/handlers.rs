use super::error::ApiError;
use super::state::AppState;
use crate::models::{Coordinates, FusedRecord, Location, QueryRequest, QueryResponse};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub const OMITTED_REGIONS_HEADER: HeaderName = HeaderName::from_static("x-omitted-regions");

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "agrofusion",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Answers 200 once the request is valid, even when nothing resolves or no
/// provider answers; the response text says what was missing.
pub async fn handle_query(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(request) = payload?;
    let query = request.validate()?;
    tracing::info!(
        query = %query.text,
        has_hint = query.hint.is_some(),
        "Processing query request"
    );

    Ok(Json(state.orchestrator.respond(&query).await))
}

pub async fn handle_multi_query(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let query = request.validate()?;
    tracing::info!(query = %query.text, "Processing multi-location query request");

    let outcome = state.orchestrator.handle_detailed(&query).await;

    let mut headers = HeaderMap::new();
    if !outcome.omitted.is_empty() {
        match HeaderValue::from_str(&outcome.omitted.join("; ")) {
            Ok(value) => {
                headers.insert(OMITTED_REGIONS_HEADER, value);
            }
            Err(_) => tracing::warn!("Omitted region names are not valid header text"),
        }
    }
    Ok((headers, Json(outcome.responses)).into_response())
}

/// Debug view of the fused record; 503 when no provider answers.
pub async fn get_context(
    State(state): State<Arc<AppState>>,
    Path((lat, lon)): Path<(f64, f64)>,
) -> Result<Json<FusedRecord>, ApiError> {
    let coords = Coordinates::new(lat, lon).validate()?;
    tracing::info!(lat = lat, lon = lon, "Fetching fused context");

    let location = state.orchestrator.resolver().locate(coords).await;
    let record = state.orchestrator.fusion().fuse(&location).await?;
    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
pub struct ResolveParams {
    #[serde(default)]
    pub q: String,
}

pub async fn resolve_locations(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResolveParams>,
) -> Result<Json<Vec<Location>>, ApiError> {
    let query = QueryRequest::new(params.q).validate()?;
    let locations = state.orchestrator.resolver().resolve(&query.text).await;
    tracing::info!(query = %query.text, resolved = locations.len(), "Resolved locations");
    Ok(Json(locations))
}
