//! Request descriptor type

use serde::{Deserialize, Serialize};

use super::HttpMethod;
use crate::error::{DomainError, DomainResult};

/// Everything needed to perform, and re-perform, a call against the API.
///
/// The `retried` flag belongs to this one request: the gateway sets it
/// before the single retry that follows a successful renewal, so a request
/// is never recovered twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Path relative to the API base URL, always starting with `/`
    pub path: String,
    /// Query parameters in insertion order
    #[serde(default)]
    pub query: Vec<(String, String)>,
    /// Optional JSON body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
    /// Whether this request has already been retried after a renewal
    #[serde(default)]
    pub retried: bool,
}

impl ApiRequest {
    /// Creates a request with no query and no body.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            retried: false,
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Creates a POST request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Creates a PATCH request.
    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Attaches a JSON body serialized from `body`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidBody`] if `body` cannot be represented as JSON.
    pub fn with_json<T: Serialize>(mut self, body: &T) -> DomainResult<Self> {
        let value =
            serde_json::to_value(body).map_err(|e| DomainError::InvalidBody(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Returns the path with its encoded query string, if any.
    #[must_use]
    pub fn path_and_query(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        match serde_urlencoded::to_string(&self.query) {
            Ok(encoded) => format!("{}?{encoded}", self.path),
            Err(_) => self.path.clone(),
        }
    }
}
