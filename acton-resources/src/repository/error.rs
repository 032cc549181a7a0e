//! Repository error types
//!
//! # Example
//!
//! ```rust
//! use acton_resources::repository::{RepositoryError, RepositoryErrorKind};
//!
//! let error = RepositoryError::integrity("UNIQUE constraint failed: widget.name");
//! assert!(matches!(error.kind, RepositoryErrorKind::Integrity));
//! ```

use std::fmt;

/// Operation being performed when the repository error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOperation {
    /// Executing a query
    Fetch,
    /// Committing a unit of work
    Commit,
    /// Discarding a unit of work
    Rollback,
}

impl fmt::Display for RepositoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch => write!(f, "fetch"),
            Self::Commit => write!(f, "commit"),
            Self::Rollback => write!(f, "rollback"),
        }
    }
}

/// Category of repository error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryErrorKind {
    /// A uniqueness or integrity constraint rejected the write
    Integrity,
    /// The backing store cannot be reached
    Unavailable,
    /// Anything else
    Other,
}

impl fmt::Display for RepositoryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integrity => write!(f, "integrity"),
            Self::Unavailable => write!(f, "unavailable"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Structured repository error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryError {
    /// The operation being performed when the error occurred
    pub operation: RepositoryOperation,
    /// The category of error
    pub kind: RepositoryErrorKind,
    /// Message reported by the store
    pub message: String,
}

impl RepositoryError {
    /// Create a new repository error
    pub fn new(
        operation: RepositoryOperation,
        kind: RepositoryErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
        }
    }

    /// Create an integrity conflict raised at commit
    pub fn integrity(message: impl Into<String>) -> Self {
        Self::new(
            RepositoryOperation::Commit,
            RepositoryErrorKind::Integrity,
            message,
        )
    }

    /// Create an unavailable error
    pub fn unavailable(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::Unavailable, message)
    }

    /// Create a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(
            RepositoryOperation::Fetch,
            RepositoryErrorKind::Other,
            message,
        )
    }

    /// Check if this error is retriable
    pub fn is_retriable(&self) -> bool {
        matches!(self.kind, RepositoryErrorKind::Unavailable)
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Repository {} error during {}: {}",
            self.kind, self.operation, self.message
        )
    }
}

impl std::error::Error for RepositoryError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = RepositoryError::integrity("UNIQUE constraint failed: widget.name");
        assert_eq!(
            err.to_string(),
            "Repository integrity error during commit: UNIQUE constraint failed: widget.name"
        );
    }

    #[test]
    fn test_retriable() {
        assert!(RepositoryError::unavailable(RepositoryOperation::Fetch, "down").is_retriable());
        assert!(!RepositoryError::integrity("dup").is_retriable());
    }
}
