//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    extract::multipart::MultipartRejection,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::models::merchant::RegistrationStatus;

/// Application-wide error type.
///
/// Each variant maps to a specific HTTP status code and error code.
///
/// # Error Categories
///
/// - **Database / Storage Errors**: infrastructure failures, reported as 500
/// - **Authentication Errors**: missing or unknown bearer tokens
/// - **Ownership Errors**: the caller may not act on this merchant
/// - **Resource Errors**: requested rows do not exist (or are out of scope)
/// - **Validation Errors**: payloads or transitions that violate business rules
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Document storage failed (disk full, permission denied, ...).
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Bearer token is missing, unknown, or belongs to an inactive user.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid or missing credentials")]
    Unauthorized,

    /// The authenticated user is not allowed to perform this action,
    /// e.g. approving a merchant they drafted themselves.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("{0}")]
    NotPermitted(String),

    /// Requested entity does not exist or is outside the caller's DFSP scope.
    ///
    /// Returns HTTP 404 Not Found. The payload names the entity kind.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Request is malformed (bad multipart body, unparsable field).
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("{0}")]
    InvalidRequest(String),

    /// Request is well-formed but fails validation.
    ///
    /// Returns HTTP 422 Unprocessable Entity.
    #[error("{0}")]
    Validation(String),

    /// The merchant's registration status does not allow the requested change.
    ///
    /// Returns HTTP 422 Unprocessable Entity.
    #[error("Cannot change registration status from {from} to {to}")]
    InvalidTransition {
        from: RegistrationStatus,
        to: RegistrationStatus,
    },
}

impl AppError {
    /// HTTP status and machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, String) {
        match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            AppError::NotPermitted(_) => (StatusCode::UNAUTHORIZED, "not_permitted".to_string()),
            AppError::NotFound(entity) => (
                StatusCode::NOT_FOUND,
                format!("{}_not_found", entity.replace(' ', "_")),
            ),
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request".to_string()),
            AppError::Validation(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_failed".to_string(),
            ),
            AppError::InvalidTransition { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_status_transition".to_string(),
            ),
            AppError::Database(_) | AppError::Storage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error".to_string(),
            ),
        }
    }
}

/// A body that parses as JSON but does not fit the request type (unknown enum
/// variant, wrong field type) is a validation failure; anything else about the
/// body is a malformed request.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => AppError::Validation(err.body_text()),
            other => AppError::InvalidRequest(other.body_text()),
        }
    }
}

/// Query strings only carry filters, so a value that does not parse is a
/// validation failure.
impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// Database and storage failures are logged and replaced by a generic message.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AppError::Database(err) => {
                tracing::error!(error = %err, "database failure");
                "An internal error occurred".to_string()
            }
            AppError::Storage(err) => {
                tracing::error!(error = %err, "document storage failure");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
