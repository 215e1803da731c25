//! Session coordinator configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tolk_domain::{DomainError, DomainResult, RoutePaths};
use url::Url;

/// Default renewal timeout in milliseconds.
pub const DEFAULT_RENEW_TIMEOUT_MS: u64 = 10_000;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

/// Configuration surface of the session coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Base URL every API path is resolved against.
    pub api_base_url: Url,
    /// Well-known route paths used by the guard and for redirects.
    pub paths: RoutePaths,
    /// Upper bound for one renewal attempt, in milliseconds.
    pub renew_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_base_url(),
            paths: RoutePaths::default(),
            renew_timeout_ms: DEFAULT_RENEW_TIMEOUT_MS,
        }
    }
}

impl SessionConfig {
    /// Creates a configuration for `api_base_url` with default paths and timeout.
    #[must_use]
    pub fn new(api_base_url: Url) -> Self {
        Self {
            api_base_url,
            ..Self::default()
        }
    }

    /// Sets the renewal timeout.
    #[must_use]
    pub fn with_renew_timeout(mut self, timeout: Duration) -> Self {
        self.renew_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Returns the renewal timeout.
    #[must_use]
    pub const fn renew_timeout(&self) -> Duration {
        Duration::from_millis(self.renew_timeout_ms)
    }

    /// Checks that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error for an unusable base URL, invalid route paths, or a zero timeout.
    pub fn validate(&self) -> DomainResult<()> {
        if self.api_base_url.cannot_be_a_base() {
            return Err(DomainError::InvalidConfiguration(format!(
                "api_base_url {} cannot be used as a base",
                self.api_base_url
            )));
        }
        if self.renew_timeout_ms == 0 {
            return Err(DomainError::InvalidConfiguration(
                "renew_timeout_ms must be greater than zero".to_string(),
            ));
        }
        self.paths.validate()
    }
}

#[allow(clippy::expect_used)]
fn default_base_url() -> Url {
    Url::parse(DEFAULT_API_BASE_URL).expect("default API base URL is a valid URL")
}
