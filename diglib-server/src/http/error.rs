//! API error types with IntoResponse
//!
//! Errors are converted to JSON responses with appropriate status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::{DbError, ScopeError};

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Database unreachable (503)
    Unavailable { message: String },

    /// Database error (500, logged)
    Database(DbError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Unavailable { message } => {
                tracing::warn!("Database unavailable: {}", message);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    json!({
                        "error": "service_unavailable",
                        "message": "database is unavailable"
                    }),
                )
            }
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "internal_error",
                        "message": "an internal error occurred"
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        if e.is_connectivity() {
            Self::Unavailable {
                message: e.to_string(),
            }
        } else {
            Self::Database(e)
        }
    }
}

impl From<ScopeError<DbError>> for ApiError {
    fn from(e: ScopeError<DbError>) -> Self {
        match e {
            ScopeError::Open(e) | ScopeError::Handler(e) => Self::from(e),
            ScopeError::Close(e) => Self::Database(e),
            ScopeError::HandlerAndClose { handler, close } => {
                // The response can carry one cause; keep the other in the log
                tracing::error!("Failed to close session after error: {}", close);
                Self::from(handler)
            }
        }
    }
}
