//! Event endpoints

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;

use planner_core::protocol::{
    CreateEventRequest, CreateEventResponse, ScopedDeleteResponse, ScopedPatchResponse,
};
use planner_core::{Event, EventId, EventPatch, Scope};

use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events", post(create_event))
        .route(
            "/events/{id}",
            get(get_event).patch(patch_event).delete(delete_event),
        )
}

/// `?scope=this|following|all`, `this` when omitted
#[derive(Debug, Deserialize)]
pub struct ScopeQuery {
    #[serde(default)]
    pub scope: Scope,
}

/// POST /events - Create an event, materializing its recurrence when asked
async fn create_event(
    State(state): State<AppState>,
    Json(req): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<CreateEventResponse>), AppError> {
    let response = state.planner()?.create_event(&req)?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /events/:id - Fetch one event
async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<EventId>,
) -> Result<Json<Event>, AppError> {
    let event = state.planner()?.get_event(&id)?;
    Ok(Json(event))
}

/// PATCH /events/:id?scope= - Apply a partial edit to the scoped occurrences
async fn patch_event(
    State(state): State<AppState>,
    Path(id): Path<EventId>,
    Query(query): Query<ScopeQuery>,
    Json(patch): Json<EventPatch>,
) -> Result<Json<ScopedPatchResponse>, AppError> {
    let response = state.planner()?.patch_event(&id, query.scope, &patch)?;
    Ok(Json(response))
}

/// DELETE /events/:id?scope= - Remove the scoped occurrences
async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<EventId>,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<ScopedDeleteResponse>, AppError> {
    let response = state.planner()?.delete_event(&id, query.scope)?;
    Ok(Json(response))
}
