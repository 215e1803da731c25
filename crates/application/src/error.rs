//! Application error types

use thiserror::Error;
use tolk_domain::{ApiResponse, DomainError};

use crate::ports::HttpClientError;

/// Classified failure of an API call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The credential is missing, expired, or invalid (401).
    #[error("unauthorized: {message}")]
    Unauthorized {
        /// Server-provided detail.
        message: String,
    },

    /// The user is authenticated but not allowed to do this (403).
    #[error("forbidden: {message}")]
    Forbidden {
        /// Server-provided detail.
        message: String,
    },

    /// The request was rejected for business reasons (4xx other than 401/403/409).
    #[error("request rejected ({status}): {message}")]
    Validation {
        /// Status returned by the server.
        status: u16,
        /// Server-provided detail.
        message: String,
    },

    /// The request conflicts with existing state (409).
    #[error("conflict: {message}")]
    Conflict {
        /// Server-provided detail.
        message: String,
    },

    /// The server failed (5xx) or could not be reached.
    #[error("server error: {message}")]
    ServerError {
        /// Status returned by the server, `None` for transport failures.
        status: Option<u16>,
        /// Server-provided or transport detail.
        message: String,
    },

    /// The credential was still rejected after a successful renewal.
    #[error("session expired")]
    SessionExpired,

    /// A success response carried a body that could not be decoded.
    #[error("malformed response body: {0}")]
    Decode(String),

    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] DomainError),
}

impl ApiError {
    /// Classifies an error status.
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = if body.trim().is_empty() {
            tolk_domain::StatusCode::new(status)
                .reason_phrase()
                .to_string()
        } else {
            body.trim().to_string()
        };
        match status {
            401 => Self::Unauthorized { message },
            403 => Self::Forbidden { message },
            409 => Self::Conflict { message },
            400..=499 => Self::Validation { status, message },
            _ => Self::ServerError {
                status: Some(status),
                message,
            },
        }
    }

    /// Classifies an error response.
    #[must_use]
    pub fn from_response(response: &ApiResponse) -> Self {
        Self::from_status(response.status.as_u16(), &response.text())
    }

    /// Returns true for a rejected credential, whether or not a renewal was attempted.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. } | Self::SessionExpired)
    }

    /// Returns a short title suitable for showing to the user.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "Unauthorized",
            Self::Forbidden { .. } => "Forbidden",
            Self::Validation { .. } => "Bad request",
            Self::Conflict { .. } => "Conflict",
            Self::ServerError { status: None, .. } => "Server unreachable",
            Self::ServerError { .. } => "Internal server error",
            Self::SessionExpired => "Session expired",
            Self::Decode(_) => "Unexpected response",
            Self::InvalidRequest(_) => "Invalid request",
        }
    }
}

impl From<HttpClientError> for ApiError {
    fn from(error: HttpClientError) -> Self {
        Self::ServerError {
            status: None,
            message: error.to_string(),
        }
    }
}

/// Result type alias for API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors returned by session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The underlying API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The operation requires a logged-in user.
    #[error("no user is logged in")]
    NotAuthenticated,

    /// A newer login, logout, or termination happened while the operation was in flight.
    #[error("the session changed while the operation was in flight")]
    Superseded,
}

impl From<DomainError> for SessionError {
    fn from(error: DomainError) -> Self {
        Self::Api(ApiError::InvalidRequest(error))
    }
}

/// Result type alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
