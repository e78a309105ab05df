//! Recurrence group endpoints

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};

use planner_core::protocol::{CreateEventResponse, ResumeMaterializationRequest};
use planner_core::{Event, RecurrenceGroupId};

use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/groups/{group_id}/events", get(list_group_events))
        .route("/groups/{group_id}/materialize", post(resume_materialization))
}

/// GET /groups/:group_id/events - List a group's occurrences in index order
async fn list_group_events(
    State(state): State<AppState>,
    Path(group_id): Path<RecurrenceGroupId>,
) -> Result<Json<Vec<Event>>, AppError> {
    let events = state.planner()?.group_events(&group_id)?;
    Ok(Json(events))
}

/// POST /groups/:group_id/materialize - Complete an interrupted materialization
async fn resume_materialization(
    State(state): State<AppState>,
    Path(group_id): Path<RecurrenceGroupId>,
    Json(req): Json<ResumeMaterializationRequest>,
) -> Result<Json<CreateEventResponse>, AppError> {
    let response = state.planner()?.resume_materialization(group_id, &req)?;
    Ok(Json(response))
}
