//! Mapping of core errors onto HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use triage_core::Error as CoreError;

/// Error returned by route handlers
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("forbidden")]
    Forbidden,

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ApiError {
    /// Status code and client-facing message
    fn parts(&self) -> (StatusCode, String) {
        match self {
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "forbidden".to_string()),
            ApiError::Core(CoreError::Validation(msg)) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Core(CoreError::DuplicateId(_)) => {
                (StatusCode::CONFLICT, "id exists".to_string())
            }
            ApiError::Core(CoreError::NotFound(msg)) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Core(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.parts();
        if status.is_server_error() {
            log::error!("[api] {}", message);
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}
