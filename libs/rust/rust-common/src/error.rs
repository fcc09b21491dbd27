//! Centralized error types shared by the workspace crates.
//!
//! Failures that are not specific to security events (HTTP client setup,
//! local I/O, JSON handling, bad input) are expressed here so that library
//! and service errors can wrap them with `#[from]`.

use thiserror::Error;

/// Common error type for platform operations.
///
/// Errors are classified as transient or permanent through
/// [`PlatformError::is_retryable`]. The classification is advisory: nothing
/// in this workspace retries on its own.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// HTTP client could not be built or a request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Tracing subscriber could not be installed
    #[error("Tracing initialisation failed: {0}")]
    Tracing(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlatformError {
    /// Check if this error is retryable.
    ///
    /// Only HTTP failures that never reached the peer (connect errors and
    /// timeouts) are transient.
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_common::PlatformError;
    ///
    /// let err = PlatformError::invalid_input("bad url");
    /// assert!(!err.is_retryable());
    /// ```
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Create an invalid input error with the given message.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an internal error with the given message.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_retryable_errors() {
        assert!(!PlatformError::invalid_input("test").is_retryable());
        assert!(!PlatformError::internal("test").is_retryable());
        assert!(!PlatformError::Tracing("test".to_string()).is_retryable());

        let io: PlatformError = std::io::Error::other("disk").into();
        assert!(!io.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = PlatformError::invalid_input("audience must be a URL");
        assert_eq!(err.to_string(), "Invalid input: audience must be a URL");

        let err: PlatformError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.to_string(), "I/O error: gone");
    }
}
