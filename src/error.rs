//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::service::ServiceError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // Use-case errors (4xx/5xx by kind)
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    /// HTTP status, machine-readable code and optional details
    fn classify(&self) -> (StatusCode, &'static str, Option<String>) {
        match self {
            // 400 Bad Request
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }

            AppError::Service(service_err) => match service_err {
                ServiceError::NotFound(id) => {
                    (StatusCode::NOT_FOUND, "user_not_found", Some(id.to_string()))
                }
                ServiceError::VersionConflict(id) => {
                    (StatusCode::CONFLICT, "version_conflict", Some(id.to_string()))
                }
                ServiceError::DuplicateKey(constraint) => {
                    (StatusCode::CONFLICT, "duplicate_user", Some(constraint.clone()))
                }
                ServiceError::NoChanges => (StatusCode::BAD_REQUEST, "no_changes", None),
                ServiceError::InvalidFilter(e) => {
                    (StatusCode::BAD_REQUEST, "invalid_filter", Some(e.to_string()))
                }
                ServiceError::Infrastructure { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
                }
            },
        }
    }

    /// Log at a level matching who is at fault
    fn log(&self) {
        match self {
            AppError::InvalidRequest(msg) => {
                tracing::debug!(details = %msg, "Rejected invalid request");
            }
            AppError::Service(e) if e.is_client_error() => {
                tracing::debug!(error = %e, "Rejected request");
            }
            AppError::Service(e) if e.is_conflict_error() => {
                tracing::info!(error = %e, "Request conflicted with stored state");
            }
            AppError::Service(e) => {
                tracing::error!("Service error: {:?}", e);
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let (status, error_code, details) = self.classify();

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
