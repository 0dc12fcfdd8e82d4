use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Blocking collided with live appointments; `conflicts` is the serialized list.
    #[error("Schedule conflict: {message}")]
    ScheduleConflict { message: String, conflicts: Value },

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Queue full: {0}")]
    QueueFull(String),

    #[error("Duplicate ticket: {0}")]
    DuplicateTicket(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Conflict(_)
            | AppError::ScheduleConflict { .. }
            | AppError::InvalidTransition(_)
            | AppError::QueueFull(_)
            | AppError::DuplicateTicket(_) => StatusCode::CONFLICT,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Auth(_) => "AUTH_ERROR",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Internal(_) => "INTERNAL_ERROR",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::Conflict(_) => "CONFLICT",
            AppError::ScheduleConflict { .. } => "SCHEDULE_CONFLICT",
            AppError::InvalidTransition(_) => "INVALID_TRANSITION",
            AppError::QueueFull(_) => "QUEUE_FULL",
            AppError::DuplicateTicket(_) => "DUPLICATE_TICKET",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        let body = match self {
            AppError::ScheduleConflict { message, conflicts } => {
                tracing::warn!("Error: {}: {}", status, message);
                json!({
                    "error": message,
                    "code": code,
                    "conflicts": conflicts
                })
            }
            other => {
                let message = match other {
                    AppError::Auth(msg)
                    | AppError::Forbidden(msg)
                    | AppError::NotFound(msg)
                    | AppError::Internal(msg)
                    | AppError::Database(msg)
                    | AppError::ValidationError(msg)
                    | AppError::Conflict(msg)
                    | AppError::InvalidTransition(msg)
                    | AppError::QueueFull(msg)
                    | AppError::DuplicateTicket(msg) => msg,
                    AppError::ScheduleConflict { message, .. } => message,
                };

                if status.is_server_error() {
                    tracing::error!("Error: {}: {}", status, message);
                } else {
                    tracing::warn!("Error: {}: {}", status, message);
                }

                json!({
                    "error": message,
                    "code": code
                })
            }
        };

        (status, Json(body)).into_response()
    }
}
