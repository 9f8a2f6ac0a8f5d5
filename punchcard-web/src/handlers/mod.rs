//! HTTP request handlers for the Punchcard web server
//!
//! This module contains all the HTTP request handlers organized by functionality.

pub mod admin;
pub mod attendance;
pub mod export;
pub mod health;
pub mod types;

// Re-export all handler functions to maintain API compatibility
pub use admin::*;
pub use attendance::*;
pub use export::*;
pub use health::*;

// Re-export all types for convenience
pub use types::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use punchcard_applications::ApplicationError;
use serde_json::json;
use tracing::error;

/// Application error translated to an API response
///
/// Handlers bubble application failures through `?`; the mapping to a status
/// code and a `detail` body lives here so every endpoint reports them the
/// same way.
pub struct ApiError(pub ApplicationError);

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self.0 {
            ApplicationError::NoActiveSession => {
                (StatusCode::BAD_REQUEST, "Start attendance first".to_string())
            }
            ApplicationError::Authentication { .. } => {
                (StatusCode::UNAUTHORIZED, "Authentication failed".to_string())
            }
            ApplicationError::InvalidDate { message } => {
                (StatusCode::BAD_REQUEST, message.clone())
            }
            ApplicationError::NotFound { message } => (StatusCode::NOT_FOUND, message.clone()),
            other => {
                error!("Unhandled application error: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        json_detail(status, &detail)
    }
}

/// Build a `{"detail": ...}` response with the given status
pub(crate) fn json_detail(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}
