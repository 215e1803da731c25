//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A route path is not an absolute, query-free path.
    #[error("invalid route path: {0}")]
    InvalidPath(String),

    /// The role name is not one of the known roles.
    #[error("unknown role: {0}")]
    UnknownRole(String),

    /// The HTTP method is not supported.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// The request body could not be encoded.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// A configuration value is out of range or inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
