//! API error types for handler operations
//!
//! Every recognized request-time failure of a generated handler is an
//! [`ApiError`] with an explicit status and JSON payload:
//!
//! | Kind                | Status |
//! |---------------------|--------|
//! | `BadRequest`        | 400    |
//! | `ValidationFailed`  | 400    |
//! | `Unauthorized`      | 401    |
//! | `Forbidden`         | 403    |
//! | `Conflict`          | 409    |
//! | `PayloadTooLarge`   | 413    |
//! | `InternalError`     | 500    |
//! | `ServiceUnavailable`| 503    |
//!
//! # Example
//!
//! ```rust
//! use acton_resources::handlers::{ApiError, ApiErrorKind, ApiOperation};
//!
//! let error = ApiError::conflict(ApiOperation::Create, "UNIQUE constraint failed: widget.name");
//! assert!(matches!(error.kind, ApiErrorKind::Conflict));
//! assert_eq!(error.kind.status_code().as_u16(), 409);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::ContractError;
use crate::repository::{RepositoryError, RepositoryErrorKind};

/// Operation being performed when the API error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    /// Listing entities
    List,
    /// Creating a new entity
    Create,
    /// Running permission checks
    Authorize,
    /// Validating request parameters
    Validate,
    /// Turning a transport request into a handler context
    Dispatch,
}

impl fmt::Display for ApiOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => write!(f, "list"),
            Self::Create => write!(f, "create"),
            Self::Authorize => write!(f, "authorize"),
            Self::Validate => write!(f, "validate"),
            Self::Dispatch => write!(f, "dispatch"),
        }
    }
}

/// Category of API error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// Request validation failed
    ValidationFailed,
    /// Invalid request format
    BadRequest,
    /// Authentication required
    Unauthorized,
    /// Access denied
    Forbidden,
    /// Operation conflicts with stored state
    Conflict,
    /// Request body exceeded the configured limit
    PayloadTooLarge,
    /// Internal server error
    InternalError,
    /// Storage temporarily unavailable
    ServiceUnavailable,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed => write!(f, "validation_failed"),
            Self::BadRequest => write!(f, "bad_request"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::Forbidden => write!(f, "forbidden"),
            Self::Conflict => write!(f, "conflict"),
            Self::PayloadTooLarge => write!(f, "payload_too_large"),
            Self::InternalError => write!(f, "internal_error"),
            Self::ServiceUnavailable => write!(f, "service_unavailable"),
        }
    }
}

impl ApiErrorKind {
    /// Get the HTTP status code for this error kind
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationFailed | Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Conflict => StatusCode::CONFLICT,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get the error code string for this error kind
    #[must_use]
    pub fn error_code(&self) -> String {
        format!("{}", self).to_uppercase()
    }
}

/// Field-keyed validation messages
///
/// Keys are field names, or `"<index>.<field>"` for errors found while
/// serializing the items of a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    /// Create an empty error set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Builder form of [`ValidationErrors::add`]
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.add(field, message);
        self
    }

    /// Merge another set, prefixing each field with `prefix.`
    pub fn merge_prefixed(&mut self, prefix: &str, other: ValidationErrors) {
        for (field, messages) in other.0 {
            self.0
                .entry(format!("{prefix}.{field}"))
                .or_default()
                .extend(messages);
        }
    }

    /// Messages recorded for a field
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Whether no errors were recorded
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields with errors
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over fields and their messages
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            first = false;
            write!(f, "{}: {}", field, messages.join(", "))?;
        }
        Ok(())
    }
}

/// Structured API error with operation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// The operation being performed when the error occurred
    pub operation: ApiOperation,
    /// The category of error
    pub kind: ApiErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Per-field details, present for validation failures
    pub errors: Option<ValidationErrors>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(operation: ApiOperation, kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            errors: None,
        }
    }

    /// Create a validation failed error carrying per-field details
    pub fn validation_failed(operation: ApiOperation, errors: ValidationErrors) -> Self {
        Self {
            operation,
            kind: ApiErrorKind::ValidationFailed,
            message: "Validation failed".to_string(),
            errors: Some(errors),
        }
    }

    /// Create a bad request error
    pub fn bad_request(operation: ApiOperation, message: impl Into<String>) -> Self {
        Self::new(operation, ApiErrorKind::BadRequest, message)
    }

    /// Create a conflict error
    pub fn conflict(operation: ApiOperation, message: impl Into<String>) -> Self {
        Self::new(operation, ApiErrorKind::Conflict, message)
    }

    /// Create an internal error
    pub fn internal(operation: ApiOperation, message: impl Into<String>) -> Self {
        Self::new(operation, ApiErrorKind::InternalError, message)
    }

    /// Map a repository failure, keeping integrity conflicts as 409
    pub fn from_repository(operation: ApiOperation, err: RepositoryError) -> Self {
        match err.kind {
            RepositoryErrorKind::Integrity => Self::conflict(operation, err.message),
            RepositoryErrorKind::Unavailable => Self::new(
                operation,
                ApiErrorKind::ServiceUnavailable,
                "Service temporarily unavailable",
            ),
            RepositoryErrorKind::Other => {
                tracing::error!(%operation, "Repository error: {}", err.message);
                Self::internal(operation, "An internal error occurred")
            }
        }
    }

    /// Map a broken resource contract met during a request
    pub fn from_contract(operation: ApiOperation, err: ContractError) -> Self {
        tracing::error!(%operation, "Resource contract violated: {}", err);
        Self::internal(operation, "An internal error occurred")
    }

    /// Check if this error is retriable
    pub fn is_retriable(&self) -> bool {
        matches!(self.kind, ApiErrorKind::ServiceUnavailable)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "API {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let Some(errors) = &self.errors {
            write!(f, " [{}]", errors)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Response body for API errors
#[derive(Debug, Serialize, Deserialize)]
struct ApiErrorResponse {
    status: u16,
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<ValidationErrors>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.kind.status_code();

        if status.is_server_error() {
            tracing::error!(
                operation = %self.operation,
                kind = %self.kind,
                retriable = self.is_retriable(),
                "API error: {}", self.message
            );
        } else {
            tracing::debug!(
                operation = %self.operation,
                kind = %self.kind,
                "API error: {}", self.message
            );
        }

        let response = ApiErrorResponse {
            status: status.as_u16(),
            code: self.kind.error_code(),
            message: self.message,
            errors: self.errors,
        };

        (status, Json(response)).into_response()
    }
}
