//! Error types for SET issuing, using thiserror 2.0.
//!
//! Every failure is local to one emission attempt. Nothing here is retried
//! automatically; [`CaepError::is_retryable`] only tells the caller whether a
//! second attempt could plausibly succeed.

use rust_common::PlatformError;
use thiserror::Error;

/// SET issuing errors.
#[derive(Error, Debug)]
pub enum CaepError {
    /// Key generation failed (bad parameters or entropy failure)
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    /// A persisted key set could not be parsed or was empty
    #[error("Failed to load key set: {0}")]
    KeyLoad(String),

    /// No usable signing key in the loaded set
    #[error("No signing key available: {0}")]
    NoSigningKey(String),

    /// A key with the same `kid` is already in the set
    #[error("Duplicate key id in key set: {0}")]
    DuplicateKid(String),

    /// Claims were requested without any event
    #[error("A security event token must carry at least one event")]
    EmptyEvents,

    /// An event body or event type is not acceptable
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    /// Failed to sign a Security Event Token
    #[error("Failed to sign SET: {0}")]
    Signing(String),

    /// No response was received from the receiver
    #[error("Transport error: {0}")]
    Transport(String),

    /// The receiver answered with a non-success status
    #[error("Receiver rejected SET with HTTP {status}{}", .body.as_ref().map(|b| format!(": {b}")).unwrap_or_default())]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body, parsed as JSON when possible
        body: Option<serde_json::Value>,
    },

    /// Platform error (from rust-common)
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CaepError {
    /// Check if this error is retryable.
    ///
    /// Transport failures, throttling and server-side rejections are
    /// transient; everything else needs a change of input.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Rejected { status, .. } => *status == 429 || *status >= 500,
            Self::Platform(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Create a key generation error.
    #[must_use]
    pub fn key_generation(msg: impl Into<String>) -> Self {
        Self::KeyGeneration(msg.into())
    }

    /// Create a key load error.
    #[must_use]
    pub fn key_load(msg: impl Into<String>) -> Self {
        Self::KeyLoad(msg.into())
    }

    /// Create a no-signing-key error.
    #[must_use]
    pub fn no_signing_key(msg: impl Into<String>) -> Self {
        Self::NoSigningKey(msg.into())
    }

    /// Create an invalid event error.
    #[must_use]
    pub fn invalid_event(msg: impl Into<String>) -> Self {
        Self::InvalidEvent(msg.into())
    }

    /// Create a signing error.
    #[must_use]
    pub fn signing(msg: impl Into<String>) -> Self {
        Self::Signing(msg.into())
    }

    /// Create a transport error.
    #[must_use]
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}

/// Result type for SET operations.
pub type CaepResult<T> = Result<T, CaepError>;
