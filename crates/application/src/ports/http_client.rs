//! HTTP Client port

use async_trait::async_trait;
use thiserror::Error;
use tolk_domain::{ApiRequest, ApiResponse};

/// Errors raised when a request could not produce a response at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpClientError {
    /// The request did not complete in time.
    #[error("request timed out after {timeout_ms} ms")]
    Timeout {
        /// The timeout that elapsed.
        timeout_ms: u64,
    },

    /// The server could not be reached.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The target URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

/// Port for executing HTTP requests against the API.
///
/// Implementations must send the session cookies with every request and
/// store the cookies the server sets. Error statuses are returned as
/// responses, never as `Err`.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Executes `request` and returns the response.
    ///
    /// # Errors
    ///
    /// Returns an error only when no response was received.
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, HttpClientError>;
}
