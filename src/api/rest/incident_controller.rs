use crate::api::rest::{ApiError, ApiResult, AppState};
use crate::db::models::{Camera, Incident, IncidentWithCamera};
use crate::db::store::IncidentFilter;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use log::{error, info};
use serde::Deserialize;

/// Query parameters for listing incidents
#[derive(Debug, Deserialize)]
pub struct ListIncidentsParams {
    /// Only the literal `false` restricts the list to unresolved incidents
    pub resolved: Option<String>,
}

fn parse_id(id: &str) -> ApiResult<i32> {
    id.parse::<i32>()
        .map_err(|_| ApiError::bad_request(format!("Invalid ID: {}", id)))
}

/// List incidents joined with their camera, newest first
pub async fn list_incidents(
    State(state): State<AppState>,
    Query(params): Query<ListIncidentsParams>,
) -> ApiResult<Json<Vec<IncidentWithCamera>>> {
    let filter = IncidentFilter::from_query_param(params.resolved.as_deref());

    let incidents = state.store.list_incidents(filter).await.map_err(|e| {
        error!("Failed to list incidents: {}", e);
        ApiError::from(e)
    })?;

    Ok(Json(incidents))
}

/// Mark an incident resolved. Resolving twice leaves it resolved.
pub async fn resolve_incident(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Incident>> {
    let id = parse_id(&id)?;
    let incident = state.store.set_resolved(id, true).await?;

    info!("Resolved incident {}", id);

    Ok(Json(incident))
}

/// Flip the resolved flag of an incident
pub async fn toggle_incident(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Incident>> {
    let id = parse_id(&id)?;
    let incident = state.store.toggle_resolved(id).await?;

    info!("Toggled incident {} to resolved = {}", id, incident.resolved);

    Ok(Json(incident))
}

/// Liveness of the API and its store
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    if state.store.health_check().await {
        (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "status": "unavailable" })),
        )
    }
}

pub async fn list_cameras(State(state): State<AppState>) -> ApiResult<Json<Vec<Camera>>> {
    let cameras = state.store.list_cameras().await?;
    Ok(Json(cameras))
}
