//! Error types for shelfmark-api
//!
//! Maps service and store failures onto the HTTP surface. Quality rejections
//! are ordinary 400 outcomes carrying the violated rule id, not faults.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Review content failed quality classification (400, with rule id)
    #[error("Review rejected by quality rule: {0}")]
    QualityRejected(String),

    /// Missing or empty verified identity (401)
    #[error("Authentication required")]
    Unauthorized,

    /// Authenticated but lacking the required capability (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),

    /// shelfmark-common error
    #[error("Common error: {0}")]
    Common(#[from] shelfmark_common::Error),
}

impl From<crate::services::review_service::ReviewServiceError> for ApiError {
    fn from(err: crate::services::review_service::ReviewServiceError) -> Self {
        use crate::services::review_service::ReviewServiceError;

        match err {
            ReviewServiceError::Invalid(msg) => ApiError::BadRequest(msg),
            ReviewServiceError::Rejected(rule) => ApiError::QualityRejected(rule),
            ReviewServiceError::UnknownBook(isbn) => {
                ApiError::NotFound(format!("No book found for ISBN {isbn}"))
            }
            ReviewServiceError::Unauthenticated => ApiError::Unauthorized,
            ReviewServiceError::Forbidden => {
                ApiError::Forbidden("Moderator capability required".to_string())
            }
            ReviewServiceError::ReviewNotFound(id) => {
                ApiError::NotFound(format!("Review {id} not found"))
            }
            ReviewServiceError::Database(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::QualityRejected(rule) => {
                (StatusCode::BAD_REQUEST, "QUALITY_REJECTED", rule)
            }
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Io(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "IO_ERROR",
                err.to_string(),
            ),
            ApiError::Other(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                err.to_string(),
            ),
            ApiError::Common(err) => return common_error_response(err),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Map shelfmark-common errors onto their HTTP status
fn common_error_response(err: shelfmark_common::Error) -> Response {
    use shelfmark_common::Error;

    let api_error = match err {
        Error::NotFound(msg) => ApiError::NotFound(msg),
        Error::InvalidInput(msg) => ApiError::BadRequest(msg),
        Error::Unauthenticated => ApiError::Unauthorized,
        Error::Forbidden(msg) => ApiError::Forbidden(msg),
        other => ApiError::Internal(other.to_string()),
    };
    api_error.into_response()
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
