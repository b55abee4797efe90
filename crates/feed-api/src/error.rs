use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use feed_core::error::DomainError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Session expired: {0}")]
    SessionExpired(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::SessionExpired(msg) => {
                tracing::warn!("Session expired: {}", msg);
                (
                    StatusCode::UNAUTHORIZED,
                    "SessionExpired",
                    "Please create a new session".to_string(),
                )
            }
            ApiError::NotFound(msg) => {
                tracing::warn!("Not found: {}", msg);
                (StatusCode::NOT_FOUND, "NotFound", msg)
            }
            ApiError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, "BadRequest", msg)
            }
            ApiError::StorageUnavailable(msg) => {
                tracing::error!("Storage error: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, "StorageUnavailable", msg)
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "InternalError", msg)
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidSession(id) => ApiError::SessionExpired(id),
            DomainError::InvalidCursor(raw) => {
                ApiError::BadRequest(format!("Invalid cursor: {}", raw))
            }
            DomainError::ValidationError(msg) => ApiError::BadRequest(msg),
            DomainError::StorageError(msg) => ApiError::StorageUnavailable(msg),
            DomainError::InternalError(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::BadRequest(errors.to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
