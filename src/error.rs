use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced to HTTP callers. Fanout-path failures (push, broadcast)
/// are absorbed and logged in the fanout engine and never appear here.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid transition: order is {current}, cannot apply {requested}")]
    TransitionRejected {
        current: String,
        requested: &'static str,
    },

    #[error("order already claimed by another delivery partner")]
    AssignmentConflict,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code, present for the conflict variants so
    /// clients can distinguish "re-poll available" from "wrong state".
    fn code(&self) -> Option<&'static str> {
        match self {
            AppError::TransitionRejected { .. } => Some("transition_rejected"),
            AppError::AssignmentConflict => Some("assignment_conflict"),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::TransitionRejected { .. } | AppError::AssignmentConflict => {
                StatusCode::CONFLICT
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let mut body = json!({ "error": self.to_string() });
        if let Some(code) = self.code() {
            body["code"] = json!(code);
        }

        (status, Json(body)).into_response()
    }
}
