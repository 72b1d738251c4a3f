//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use rentflow_core::error::{AppError, ErrorKind};
use rentflow_core::types::ApiErrorResponse;

/// An [`AppError`] on its way out of a handler, with optional details.
#[derive(Debug)]
pub struct ApiError {
    /// The domain error.
    pub error: AppError,
    /// Field-level details, e.g. validation failures.
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Attach details to the response body.
    pub fn with_details(error: AppError, details: serde_json::Value) -> Self {
        Self {
            error,
            details: Some(details),
        }
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        Self {
            error,
            details: None,
        }
    }
}

/// HTTP status for an error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Conflict
        | ErrorKind::AssetOccupied
        | ErrorKind::SessionNotActive
        | ErrorKind::SessionClosed => StatusCode::CONFLICT,
        ErrorKind::NoApplicableRate => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Internal
        | ErrorKind::Database
        | ErrorKind::Configuration
        | ErrorKind::Serialization => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.error.kind;
        let status = status_for(kind);

        let message = if status.is_server_error() {
            tracing::error!(kind = %kind, error = %self.error, "Request failed");
            "Internal server error".to_string()
        } else {
            self.error.message
        };

        let body = ApiErrorResponse {
            error: kind.code().to_string(),
            message,
            details: self.details,
        };

        (status, Json(body)).into_response()
    }
}
