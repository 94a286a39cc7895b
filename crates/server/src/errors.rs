use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use service::ServiceError;

/// Error body returned by every API route: `{"error", "message", "exc_type"}`.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub title: String,
    pub message: Option<String>,
    pub exc_type: Option<&'static str>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, title: impl Into<String>, message: Option<String>) -> Self {
        Self { status, title: title.into(), message, exc_type: None }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", Some(message.into()))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Validation Error", Some(message.into()))
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.title,
            "message": self.message,
            "exc_type": self.exc_type,
        });
        (self.status, Json(body)).into_response()
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        let exc_type = Some(e.kind());
        let (status, title, message) = match e {
            ServiceError::Validation(m) => (StatusCode::BAD_REQUEST, "Validation Error".to_string(), m),
            ServiceError::NotFound(m) => (StatusCode::NOT_FOUND, "Not Found".to_string(), m),
            ServiceError::Permission { title, message } => (StatusCode::FORBIDDEN, title, message),
            ServiceError::Duplicate(m) => (StatusCode::CONFLICT, "Duplicate Entry".to_string(), m),
            ServiceError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string(), m),
            ServiceError::Db(m) | ServiceError::Internal(m) => {
                error!(error = %m, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Error".to_string(), m)
            }
        };
        Self { status, title, message: Some(message), exc_type }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("store unavailable: {0}")]
    Store(String),
}
