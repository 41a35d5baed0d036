//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::ErrorKind;
use ordering::OrderingError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// No authenticated user was supplied.
    Unauthorized,
    /// Bad request from the client.
    BadRequest(String),
    /// Resource not found.
    NotFound(String),
    /// Engine error, mapped via its domain classification.
    Ordering(OrderingError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "authentication required".to_string(),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Ordering(err) => ordering_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn ordering_error_to_response(err: OrderingError) -> (StatusCode, String) {
    if err.is_transient() {
        return (StatusCode::SERVICE_UNAVAILABLE, err.to_string());
    }

    match err.domain_kind() {
        Some(ErrorKind::Validation) => (StatusCode::BAD_REQUEST, err.to_string()),
        Some(ErrorKind::NotFound) => (StatusCode::NOT_FOUND, err.to_string()),
        Some(ErrorKind::Conflict) | Some(ErrorKind::State) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        None => {
            tracing::error!(error = %err, "internal server error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            )
        }
    }
}

impl From<OrderingError> for ApiError {
    fn from(err: OrderingError) -> Self {
        ApiError::Ordering(err)
    }
}

impl From<store::StoreError> for ApiError {
    fn from(err: store::StoreError) -> Self {
        ApiError::Ordering(OrderingError::Store(err))
    }
}

impl From<domain::DomainError> for ApiError {
    fn from(err: domain::DomainError) -> Self {
        ApiError::Ordering(OrderingError::Domain(err))
    }
}
