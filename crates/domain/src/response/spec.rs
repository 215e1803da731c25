//! Response types

use std::collections::HashMap;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// HTTP status code with semantic helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StatusCode(pub u16);

impl StatusCode {
    /// 401 Unauthorized
    pub const UNAUTHORIZED: Self = Self(401);

    /// Creates a new `StatusCode`.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric status code.
    #[must_use]
    pub const fn as_u16(&self) -> u16 {
        self.0
    }

    /// Returns true if this is a 2xx success status.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Returns true if this is a 4xx client error status.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.0 >= 400 && self.0 < 500
    }

    /// Returns true if this is a 5xx server error status.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.0 >= 500 && self.0 < 600
    }

    /// Returns true if this is any error status (4xx or 5xx).
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.0 >= 400 && self.0 < 600
    }

    /// Returns the canonical reason phrase for common status codes.
    #[must_use]
    pub const fn reason_phrase(&self) -> &'static str {
        match self.0 {
            200 => "OK",
            201 => "Created",
            202 => "Accepted",
            204 => "No Content",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            409 => "Conflict",
            422 => "Unprocessable Entity",
            429 => "Too Many Requests",
            500 => "Internal Server Error",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            504 => "Gateway Timeout",
            _ => "Unknown",
        }
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.0, self.reason_phrase())
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

/// A response as returned by the transport.
///
/// Error statuses are still responses at this level; classifying them is
/// left to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Response headers, names lower-cased.
    pub headers: HashMap<String, String>,
    /// Raw response body.
    pub body: Vec<u8>,
    /// Time from send to last body byte.
    pub duration: Duration,
}

impl ApiResponse {
    /// Creates a response without headers or timing information.
    #[must_use]
    pub fn new(status: impl Into<StatusCode>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: status.into(),
            headers: HashMap::new(),
            body: body.into(),
            duration: Duration::ZERO,
        }
    }

    /// Creates a response whose body is the JSON encoding of `value`.
    #[must_use]
    pub fn json(status: impl Into<StatusCode>, value: &serde_json::Value) -> Self {
        let mut response = Self::new(status, value.to_string());
        response
            .headers
            .insert("content-type".to_string(), "application/json".to_string());
        response
    }

    /// Returns true if the status code indicates success (2xx).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns true if the credential was rejected as expired or invalid.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        self.status.0 == StatusCode::UNAUTHORIZED.0
    }

    /// Returns the body as a lossy UTF-8 string.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns the decoder error when the body is not valid JSON for `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}
