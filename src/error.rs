//! Replica error types with HTTP status code mapping.
//!
//! [`ReplicaError`] is the central error type of the crate. Per-backend
//! failures are normally folded into outcome entries by the service layer;
//! only [`ReplicaError::AllBackendsFailed`] escapes a fan-out write.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 3002,
///     "message": "all 3 backends failed",
///     "details": "primary: connection refused; ..."
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// A single backend's failure inside an aggregate error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendFailure {
    /// Backend name.
    pub backend: String,
    /// Error text reported by the backend.
    pub message: String,
}

/// Crate error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                 |
/// |-----------|-----------------|-----------------------------|
/// | 1001      | Validation      | 400 Bad Request             |
/// | 1002      | Configuration   | 500 Internal Server Error   |
/// | 3002      | Aggregate backend failure | 503 Service Unavailable |
#[derive(Debug, thiserror::Error)]
pub enum ReplicaError {
    /// Every backend of a fan-out write failed.
    #[error("all {attempted} backends failed")]
    AllBackendsFailed {
        /// Number of backends the write was attempted on.
        attempted: usize,
        /// Per-backend failures, in registry order.
        failures: Vec<BackendFailure>,
    },

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration could not be loaded or is inconsistent.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ReplicaError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::Config(_) => 1002,
            Self::AllBackendsFailed { .. } => 3002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::AllBackendsFailed { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Extra detail rendered into the `details` field of the error body.
    fn details(&self) -> Option<String> {
        match self {
            Self::AllBackendsFailed { failures, .. } if !failures.is_empty() => Some(
                failures
                    .iter()
                    .map(|f| format!("{}: {}", f.backend, f.message))
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            _ => None,
        }
    }
}

impl IntoResponse for ReplicaError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: self.details(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_failure_maps_to_service_unavailable() {
        let err = ReplicaError::AllBackendsFailed {
            attempted: 2,
            failures: vec![
                BackendFailure {
                    backend: "primary".to_string(),
                    message: "connection refused".to_string(),
                },
                BackendFailure {
                    backend: "replica".to_string(),
                    message: "timeout".to_string(),
                },
            ],
        };
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.error_code(), 3002);
        assert_eq!(err.to_string(), "all 2 backends failed");
        assert_eq!(
            err.details().as_deref(),
            Some("primary: connection refused; replica: timeout")
        );
    }

    #[test]
    fn invalid_request_maps_to_bad_request() {
        let err = ReplicaError::InvalidRequest("missing guid".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.details().is_none());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
