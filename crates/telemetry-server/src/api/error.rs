use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Request failures and the HTTP status each one maps to.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request format: {0}")]
    BadRequest(String),

    #[error("Device not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<telemetry_core::Error> for ApiError {
    fn from(err: telemetry_core::Error) -> Self {
        match err {
            telemetry_core::Error::DeviceNotFound(id) => ApiError::NotFound(id),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "Bad request format"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "Device not found"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };
        (status, message).into_response()
    }
}
