//! Delivery Client: push a signed SET to a receiver and classify the answer.
//!
//! One call is one HTTP round trip. There is no retry, no internal timeout
//! and no state carried between calls; timeouts come from the
//! [`reqwest::Client`] configuration.

use crate::signer::{SET_MEDIA_TYPE, SignedToken};
use crate::{CaepError, CaepResult};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use rust_common::{HttpConfig, build_http_client};
use serde_json::Value;
use std::error::Error as _;
use std::future::Future;
use tracing::{info, instrument, warn};
use url::Url;

/// Outcome of a delivery attempt that received a response.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryResult {
    /// 204 No Content
    Accepted,
    /// Any other 2xx
    AcceptedWithBody {
        /// HTTP status code
        status: u16,
        /// Response body, if one was sent
        body: Option<Value>,
    },
    /// Any non-2xx response
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body, if one was sent
        body: Option<Value>,
    },
}

impl DeliveryResult {
    /// Classify a status code and its (possibly empty) body.
    ///
    /// A 204 never has its body inspected. Bodies that are not JSON are kept
    /// as a JSON string.
    #[must_use]
    pub fn classify(status: u16, body: &[u8]) -> Self {
        match status {
            204 => Self::Accepted,
            200..=299 => Self::AcceptedWithBody { status, body: parse_body(body) },
            _ => Self::Rejected { status, body: parse_body(body) },
        }
    }

    /// Whether the receiver accepted the token.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        !matches!(self, Self::Rejected { .. })
    }

    /// Status code, where one is recorded.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::Accepted => 204,
            Self::AcceptedWithBody { status, .. } | Self::Rejected { status, .. } => *status,
        }
    }

    /// Turn a rejection into [`CaepError::Rejected`].
    ///
    /// # Errors
    ///
    /// Returns [`CaepError::Rejected`] for [`DeliveryResult::Rejected`].
    pub fn into_result(self) -> CaepResult<Self> {
        match self {
            Self::Rejected { status, body } => Err(CaepError::Rejected { status, body }),
            accepted => Ok(accepted),
        }
    }
}

fn parse_body(body: &[u8]) -> Option<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    serde_json::from_slice(body)
        .ok()
        .or_else(|| Some(Value::String(String::from_utf8_lossy(body).into_owned())))
}

/// Sends signed SETs to a receiver endpoint.
///
/// Uses native async traits (Rust 2024).
pub trait SetTransmitter: Send + Sync {
    /// POST `token` to `endpoint` and classify the response.
    ///
    /// Returns [`CaepError::Transport`] when no response was received.
    fn deliver(
        &self,
        token: &SignedToken,
        endpoint: &Url,
    ) -> impl Future<Output = CaepResult<DeliveryResult>> + Send;
}

/// reqwest-backed [`SetTransmitter`].
#[derive(Debug, Clone)]
pub struct HttpTransmitter {
    http_client: reqwest::Client,
}

impl HttpTransmitter {
    /// Wrap an already configured client.
    #[must_use]
    pub const fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    /// Build a client from `config`.
    ///
    /// # Errors
    ///
    /// Propagates client construction failures as [`CaepError::Platform`].
    pub fn from_config(config: &HttpConfig) -> CaepResult<Self> {
        Ok(Self::new(build_http_client(config)?))
    }
}

impl SetTransmitter for HttpTransmitter {
    #[instrument(skip(self, token), fields(endpoint = %endpoint))]
    async fn deliver(&self, token: &SignedToken, endpoint: &Url) -> CaepResult<DeliveryResult> {
        let start = std::time::Instant::now();

        let response = self
            .http_client
            .post(endpoint.clone())
            .header(CONTENT_TYPE, SET_MEDIA_TYPE)
            .header(ACCEPT, "application/json")
            .body(token.as_str().to_owned())
            .send()
            .await
            .map_err(|e| CaepError::transport(describe_transport_error(&e)))?;

        let status = response.status().as_u16();
        let result = if status == 204 {
            DeliveryResult::Accepted
        } else {
            // A response was received; an unreadable body does not change its status.
            match response.bytes().await {
                Ok(body) => DeliveryResult::classify(status, &body),
                Err(e) => {
                    warn!(status, error = %e, "failed to read response body");
                    DeliveryResult::classify(status, &[])
                }
            }
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        if result.is_accepted() {
            info!(status, elapsed_ms, "SET accepted by receiver");
        } else {
            warn!(status, elapsed_ms, "SET rejected by receiver");
        }
        Ok(result)
    }
}

fn describe_transport_error(err: &reqwest::Error) -> String {
    let kind = if err.is_timeout() {
        "timed out"
    } else if err.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    // reqwest's Display omits the underlying cause (DNS, TLS, refused).
    let mut message = format!("{kind}: {err}");
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
