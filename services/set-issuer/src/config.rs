//! Type-Safe Configuration with Validation
//!
//! Loaded once at startup from environment variables. Parsing goes through a
//! lookup function so tests can inject values without touching the process
//! environment.

use auth_caep::jwk::{MAX_RSA_BITS, MIN_RSA_BITS};
use rust_common::{HttpConfig, TracingConfig};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Path appended to the receiver domain when no endpoint is configured.
pub const DEFAULT_EVENTS_PATH: &str = "/security/api/v1/security-events";

const DEFAULT_PRIVATE_KEYS_FILE: &str = "./private-keys.json";
const DEFAULT_PUBLIC_KEYS_FILE: &str = "./jwks.json";
const DEFAULT_KEY_BITS: usize = 2048;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid URL format
    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl {
        /// Variable holding the URL
        field: String,
        /// Parser message
        reason: String,
    },

    /// Receiver domain is not a bare host
    #[error("Invalid receiver domain {0:?}: expected a host name without scheme or path")]
    InvalidDomain(String),

    /// Modulus size outside the supported range
    #[error("Invalid key size {0}: must be between {MIN_RSA_BITS} and {MAX_RSA_BITS} bits")]
    InvalidKeyBits(usize),

    /// Zero HTTP timeout
    #[error("Invalid HTTP timeout: must be greater than 0")]
    InvalidTimeout,

    /// Missing required field
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    /// Environment variable parse error
    #[error("Failed to parse environment variable {name}: {reason}")]
    ParseError {
        /// Variable name
        name: String,
        /// Parser message
        reason: String,
    },
}

/// Issuer configuration with validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Receiver domain (`SET_RECEIVER_DOMAIN`)
    pub receiver_domain: Option<String>,
    /// Issuer URI, copied verbatim into `iss` (`SET_ISSUER`)
    pub issuer: Option<String>,
    /// Audience URI, copied verbatim into `aud` (`SET_AUDIENCE`)
    pub audience: Option<String>,
    /// Delivery URL (`SET_ENDPOINT_URL`)
    pub endpoint_url: Option<Url>,
    /// Private key set file
    pub private_keys_file: PathBuf,
    /// Public key set file
    pub public_keys_file: PathBuf,
    /// Pinned signing key id
    pub signing_kid: Option<String>,
    /// Subject of the default events
    pub subject_email: Option<String>,
    /// JSON file of event-type URI to body
    pub events_file: Option<PathBuf>,
    /// Admin reason attached to the default events
    pub reason_admin: Option<String>,
    /// RSA modulus size for new keys
    pub key_bits: usize,
    /// HTTP client timeout in seconds (must be > 0)
    pub http_timeout_secs: u64,
    /// Tracing filter
    pub log_level: String,
    /// JSON log output
    pub log_json: bool,
}

/// Where and as whom tokens are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryTarget {
    /// `iss` claim
    pub issuer: String,
    /// `aud` claim
    pub audience: String,
    /// Receiver endpoint
    pub endpoint: Url,
}

impl Config {
    /// Loads configuration from environment variables with validation.
    ///
    /// A `.env` file in the working directory is read first when present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for unparsable or out-of-range values.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads configuration from an arbitrary variable source.
    ///
    /// Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for unparsable or out-of-range values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let config = Self {
            receiver_domain: var("SET_RECEIVER_DOMAIN"),
            issuer: var("SET_ISSUER"),
            audience: var("SET_AUDIENCE"),
            endpoint_url: var("SET_ENDPOINT_URL")
                .map(|v| parse_url("SET_ENDPOINT_URL", &v))
                .transpose()?,
            private_keys_file: var("SET_PRIVATE_KEYS_FILE")
                .map_or_else(|| PathBuf::from(DEFAULT_PRIVATE_KEYS_FILE), PathBuf::from),
            public_keys_file: var("SET_PUBLIC_KEYS_FILE")
                .map_or_else(|| PathBuf::from(DEFAULT_PUBLIC_KEYS_FILE), PathBuf::from),
            signing_kid: var("SET_SIGNING_KID"),
            subject_email: var("SET_SUBJECT_EMAIL"),
            events_file: var("SET_EVENTS_FILE").map(PathBuf::from),
            reason_admin: var("SET_REASON_ADMIN"),
            key_bits: parse_var("SET_KEY_BITS", var("SET_KEY_BITS"), DEFAULT_KEY_BITS)?,
            http_timeout_secs: parse_var(
                "SET_HTTP_TIMEOUT",
                var("SET_HTTP_TIMEOUT"),
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?,
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_json: parse_var("LOG_JSON", var("LOG_JSON"), false)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_RSA_BITS..=MAX_RSA_BITS).contains(&self.key_bits) {
            return Err(ConfigError::InvalidKeyBits(self.key_bits));
        }
        if self.http_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        if let Some(domain) = &self.receiver_domain {
            if domain.contains(&['/', ':', ' '][..]) {
                return Err(ConfigError::InvalidDomain(domain.clone()));
            }
        }
        if let Some(issuer) = &self.issuer {
            parse_url("SET_ISSUER", issuer)?;
        }
        if let Some(audience) = &self.audience {
            parse_url("SET_AUDIENCE", audience)?;
        }
        Ok(())
    }

    /// Resolve issuer, audience and endpoint for delivery.
    ///
    /// Audience defaults to `https://{domain}` and the endpoint to
    /// `https://{domain}/security/api/v1/security-events`. The domain may be
    /// omitted only when both are configured explicitly.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequired`] when the issuer or the
    /// domain needed for a default is absent.
    pub fn delivery_target(&self) -> Result<DeliveryTarget, ConfigError> {
        let issuer = self
            .issuer
            .clone()
            .ok_or_else(|| ConfigError::MissingRequired("SET_ISSUER".to_string()))?;
        let domain = || {
            self.receiver_domain
                .as_deref()
                .ok_or_else(|| ConfigError::MissingRequired("SET_RECEIVER_DOMAIN".to_string()))
        };

        let audience = match &self.audience {
            Some(audience) => audience.clone(),
            None => format!("https://{}", domain()?),
        };
        let endpoint = match &self.endpoint_url {
            Some(endpoint) => endpoint.clone(),
            None => parse_url(
                "SET_RECEIVER_DOMAIN",
                &format!("https://{}{DEFAULT_EVENTS_PATH}", domain()?),
            )?,
        };

        Ok(DeliveryTarget { issuer, audience, endpoint })
    }

    /// HTTP client settings derived from the configured timeout.
    #[must_use]
    pub fn http_config(&self) -> HttpConfig {
        let timeout = Duration::from_secs(self.http_timeout_secs);
        HttpConfig::default()
            .with_timeout(timeout)
            .with_connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
    }

    /// Tracing settings. Logs go to stderr; stdout carries the report.
    #[must_use]
    pub fn tracing_config(&self) -> TracingConfig {
        TracingConfig::default()
            .with_service_name("set-issuer")
            .with_log_level(&self.log_level)
            .with_json_output(self.log_json)
    }
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_var<T: std::str::FromStr>(name: &str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match value {
        Some(val) => val.parse().map_err(|e: T::Err| ConfigError::ParseError {
            name: name.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
        field: field.to_string(),
        reason: e.to_string(),
    })
}
