pub mod events;
pub mod groups;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use planner_core::PlannerError;
use serde::Serialize;

/// Standard API error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Convert anyhow errors to HTTP responses
pub struct AppError(anyhow::Error);

impl AppError {
    fn status(&self) -> StatusCode {
        match self.0.downcast_ref::<PlannerError>() {
            Some(PlannerError::Validation(_)) | Some(PlannerError::Recurrence(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Some(PlannerError::NotFound(_)) | Some(PlannerError::GroupNotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            Some(e) if e.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }

        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
