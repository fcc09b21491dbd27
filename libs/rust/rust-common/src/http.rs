//! HTTP client configuration and building.
//!
//! Timeouts belong to the client, not to the callers that issue requests.
//! Components that talk to remote endpoints receive an already configured
//! [`reqwest::Client`] built here.

use crate::PlatformError;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Whole-request timeout (default: 30s)
    pub timeout: Duration,
    /// Connection timeout (default: 10s)
    pub connect_timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("set-issuer/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    /// Set the whole-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    fn validate(&self) -> Result<(), PlatformError> {
        if self.timeout.is_zero() {
            return Err(PlatformError::invalid_input("HTTP timeout must be greater than 0"));
        }
        if self.connect_timeout > self.timeout {
            return Err(PlatformError::invalid_input(
                "HTTP connect timeout must not exceed the request timeout",
            ));
        }
        Ok(())
    }
}

/// Build a configured HTTP client.
///
/// Redirects are not followed: a redirect from a receiver is surfaced to the
/// caller as-is.
///
/// # Errors
///
/// Returns [`PlatformError::InvalidInput`] for inconsistent timeouts and
/// [`PlatformError::Http`] if the TLS backend fails to initialise.
///
/// # Examples
///
/// ```
/// use rust_common::{HttpConfig, build_http_client};
/// use std::time::Duration;
///
/// let config = HttpConfig::default().with_timeout(Duration::from_secs(60));
/// assert!(build_http_client(&config).is_ok());
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, PlatformError> {
    config.validate()?;

    let client = ClientBuilder::new()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .redirect(reqwest::redirect::Policy::none())
        .user_agent(&config.user_agent)
        .use_rustls_tls()
        .build()?;

    tracing::debug!(
        timeout_ms = config.timeout.as_millis() as u64,
        user_agent = %config.user_agent,
        "HTTP client built"
    );
    Ok(client)
}
