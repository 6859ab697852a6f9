//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and its mapping
//! onto HTTP responses. This is the only place where an error kind becomes a
//! status code.

use crate::config::ConfigError;
use crate::web::envelope::Envelope;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use positions_core::ports::PortError;
use tracing::error;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from the core service or its ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// A request body or parameter could not be understood.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration Error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub const MSG_INTERNAL: &str = "internal server error";
pub const MSG_INVALID_INPUT: &str = "invalid input";
pub const MSG_INVALID_TOKEN: &str = "invalid token";
pub const MSG_PERMISSION_DENIED: &str = "permission denied";

impl ApiError {
    /// The status code and client-facing message for this error.
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::Port(PortError::NotFound(what)) => {
                (StatusCode::NOT_FOUND, format!("{} not found", what))
            }
            ApiError::Port(PortError::PermissionDenied) => {
                (StatusCode::UNAUTHORIZED, MSG_PERMISSION_DENIED.to_string())
            }
            ApiError::Port(PortError::Unauthorized) => {
                (StatusCode::UNAUTHORIZED, MSG_INVALID_TOKEN.to_string())
            }
            ApiError::Port(PortError::InvalidInput(_)) | ApiError::InvalidInput(_) => {
                (StatusCode::BAD_REQUEST, MSG_INVALID_INPUT.to_string())
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, MSG_INTERNAL.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, Json(Envelope::<()>::failure(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_status_codes() {
        let cases = [
            (ApiError::Port(PortError::NotFound("position P1".into())), StatusCode::NOT_FOUND),
            (ApiError::Port(PortError::PermissionDenied), StatusCode::UNAUTHORIZED),
            (ApiError::Port(PortError::Unauthorized), StatusCode::UNAUTHORIZED),
            (ApiError::InvalidInput("bad json".into()), StatusCode::BAD_REQUEST),
            (
                ApiError::Port(PortError::Unexpected("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::Io(std::io::Error::new(std::io::ErrorKind::AddrInUse, "busy")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.status_and_message().0, expected, "{}", err);
        }
    }

    #[test]
    fn internal_details_are_not_leaked() {
        let err = ApiError::Port(PortError::Unexpected("connection refused to 10.0.0.3".into()));
        assert_eq!(err.status_and_message().1, MSG_INTERNAL);
    }

    #[test]
    fn not_found_names_the_resource() {
        let err = ApiError::Port(PortError::NotFound("position P1".into()));
        assert_eq!(err.status_and_message().1, "position P1 not found");
    }
}
