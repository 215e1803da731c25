//! HTTP Client implementation using reqwest.
//!
//! This adapter implements the `HttpClient` port using the reqwest library.
//! The session lives in cookies, so the client keeps a cookie jar and sends
//! it with every request.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use tolk_application::ports::{HttpClient, HttpClientError};
use tolk_domain::{ApiRequest, ApiResponse, HttpMethod, StatusCode};

/// Per-request timeout used by [`ReqwestHttpClient::new`].
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client implementation using reqwest.
///
/// Request paths are appended to the base URL, so a base URL with a path
/// prefix (`https://host/api`) works as expected.
pub struct ReqwestHttpClient {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl ReqwestHttpClient {
    /// Creates a client for `base_url` with default settings.
    ///
    /// Default configuration:
    /// - Request timeout: 30 seconds
    /// - Follow redirects: up to 10
    /// - Cookie jar: enabled
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new(base_url: Url) -> Result<Self, HttpClientError> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Creates a client whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn with_timeout(base_url: Url, timeout: Duration) -> Result<Self, HttpClientError> {
        let client = Client::builder()
            .user_agent(concat!("Tolk/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(10))
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|e| HttpClientError::Other(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// Returns the base URL requests are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds the absolute URL of `request`.
    fn url_for(&self, request: &ApiRequest) -> Result<Url, HttpClientError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let target = format!("{base}{}", request.path_and_query());
        Url::parse(&target).map_err(|e| HttpClientError::InvalidUrl(format!("{e}: {target}")))
    }

    /// Converts domain `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    /// Maps reqwest errors to `HttpClientError`.
    fn map_error(&self, error: &reqwest::Error) -> HttpClientError {
        if error.is_timeout() {
            return HttpClientError::Timeout {
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            };
        }
        if error.is_connect() {
            return HttpClientError::ConnectionFailed(error.to_string());
        }
        if error.is_builder() {
            return HttpClientError::InvalidUrl(error.to_string());
        }
        HttpClientError::Other(error.to_string())
    }
}

impl std::fmt::Debug for ReqwestHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestHttpClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, HttpClientError> {
        let url = self.url_for(request)?;
        let start = Instant::now();

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| self.map_error(&e))?;
        let status = response.status().as_u16();

        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("<binary>").to_string()))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| HttpClientError::Other(format!("Failed to read body: {e}")))?
            .to_vec();
        let duration = start.elapsed();

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            status,
            elapsed_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            "request completed"
        );

        Ok(ApiResponse {
            status: StatusCode::new(status),
            headers,
            body,
            duration,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn client(base: &str) -> ReqwestHttpClient {
        ReqwestHttpClient::new(Url::parse(base).unwrap()).unwrap()
    }

    #[test]
    fn test_to_reqwest_method() {
        assert_eq!(
            ReqwestHttpClient::to_reqwest_method(HttpMethod::Get),
            Method::GET
        );
        assert_eq!(
            ReqwestHttpClient::to_reqwest_method(HttpMethod::Post),
            Method::POST
        );
        assert_eq!(
            ReqwestHttpClient::to_reqwest_method(HttpMethod::Patch),
            Method::PATCH
        );
        assert_eq!(
            ReqwestHttpClient::to_reqwest_method(HttpMethod::Delete),
            Method::DELETE
        );
    }

    #[test]
    fn test_url_keeps_base_path() {
        let request = ApiRequest::get("/projects").with_query("status", "OPEN");

        assert_eq!(
            client("https://tolk.example.com/api/").url_for(&request).unwrap().as_str(),
            "https://tolk.example.com/api/projects?status=OPEN"
        );
        assert_eq!(
            client("http://localhost:8080").url_for(&ApiRequest::get("/me")).unwrap().as_str(),
            "http://localhost:8080/me"
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_connection_error() {
        let client = client("http://127.0.0.1:1");
        let result = client.execute(&ApiRequest::get("/me")).await;
        assert!(matches!(
            result,
            Err(HttpClientError::ConnectionFailed(_) | HttpClientError::Other(_))
        ));
    }
}
