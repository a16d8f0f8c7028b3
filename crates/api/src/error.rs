//! API error types with HTTP response mapping.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use purchase::PurchaseError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// The caller identity is missing or malformed.
    Unauthorized(String),
    /// Purchase or catalog operation error.
    Purchase(PurchaseError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Purchase(err) => purchase_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn purchase_error_to_response(err: PurchaseError) -> (StatusCode, String) {
    let status = match &err {
        PurchaseError::NotFound(_) => StatusCode::NOT_FOUND,
        PurchaseError::Forbidden(_) => StatusCode::FORBIDDEN,
        PurchaseError::OutOfStock(_) => StatusCode::CONFLICT,
        PurchaseError::NoReservation { .. } => StatusCode::PRECONDITION_FAILED,
        PurchaseError::NothingToUpdate | PurchaseError::InvalidField { .. } => {
            StatusCode::BAD_REQUEST
        }
        PurchaseError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        PurchaseError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        PurchaseError::Internal(_) => {
            tracing::error!(error = %err, "internal server error");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            );
        }
    };
    (status, err.to_string())
}

impl From<PurchaseError> for ApiError {
    fn from(err: PurchaseError) -> Self {
        ApiError::Purchase(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
