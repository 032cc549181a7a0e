//! Error types and HTTP response conversion
//!
//! Two layers of failure exist in this crate:
//!
//! - [`ContractError`]: a resource was declared inconsistently (no model, a
//!   pagination validator that cannot produce `offset`/`limit`, a route
//!   registered twice). These surface at registration time so the service
//!   fails during startup rather than on the first request.
//! - [`Error`]: framework-level failures (configuration, I/O, tracing setup).
//!
//! Request-time failures live in [`crate::handlers::ApiError`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

/// A resource declaration that cannot produce working handlers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    /// Storage was touched by a resource that declares neither a model nor a queryset
    #[error("'{resource}' should either include a `model` store, or provide a queryset override")]
    MissingModel {
        /// Resource name
        resource: String,
    },

    /// The declared pagination validator does not produce `offset` and `limit`
    #[error("'{resource}' declares pagination class `{validator}` which does not produce `offset` and `limit`")]
    InvalidPagination {
        /// Resource name
        resource: String,
        /// Validator name
        validator: String,
    },

    /// Permission checks were applied to an endpoint that already carries them
    #[error("permission checks were already applied to the handlers of '{resource}'")]
    PermissionsAlreadyApplied {
        /// Resource name
        resource: String,
    },

    /// Two resources registered under the same path
    #[error("route '{path}' is already registered in namespace '{namespace}'")]
    DuplicateRoute {
        /// Namespace name
        namespace: String,
        /// Full route path
        path: String,
    },

    /// Route paths must be absolute
    #[error("route '{path}' must start with '/'")]
    InvalidPath {
        /// Offending path
        path: String,
    },
}

/// Main error type for the framework
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Resource declaration error
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,

    /// Optional error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// HTTP status code
    pub status: u16,
}

impl ErrorResponse {
    /// Create error response with a code
    pub fn with_code(
        status: StatusCode,
        code: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            error: error.into(),
            code: Some(code.into()),
            status: status.as_u16(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let code = match &self {
            Error::Config(_) => "CONFIG_ERROR",
            Error::Contract(_) => "CONTRACT_ERROR",
            Error::Io(_) => "IO_ERROR",
            Error::Internal(_) => "INTERNAL_ERROR",
        };

        tracing::error!(code, "{}", self);

        let status = StatusCode::INTERNAL_SERVER_ERROR;
        let body = ErrorResponse::with_code(status, code, "An internal error occurred");
        (status, Json(body)).into_response()
    }
}

// Manual From implementations for boxed errors
impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_error_messages_name_the_resource() {
        let err = ContractError::MissingModel {
            resource: "widgets".to_string(),
        };
        assert!(err.to_string().contains("'widgets'"));

        let err = ContractError::InvalidPagination {
            resource: "widgets".to_string(),
            validator: "SearchParameters".to_string(),
        };
        assert!(err.to_string().contains("SearchParameters"));
    }

    #[test]
    fn test_error_into_response_hides_details() {
        let err = Error::Internal("socket exploded".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_contract_error_converts() {
        let err: Error = ContractError::InvalidPath {
            path: "widgets".to_string(),
        }
        .into();
        assert!(matches!(err, Error::Contract(ContractError::InvalidPath { .. })));
    }
}
