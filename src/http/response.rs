//! Error responses for the admin surface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::settings::SettingsError;

/// Errors returned by handlers.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    /// Details are logged, not returned.
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Settings could not be saved".to_string()),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<SettingsError> for ApiError {
    fn from(e: SettingsError) -> Self {
        if e.is_client_error() {
            ApiError::BadRequest(e.to_string())
        } else {
            tracing::error!(error = %e, "Settings operation failed");
            ApiError::Internal
        }
    }
}
