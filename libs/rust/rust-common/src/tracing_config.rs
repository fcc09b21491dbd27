//! Tracing subscriber initialisation.
//!
//! `RUST_LOG` takes precedence over the configured level when it is set.

use crate::PlatformError;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Tracing configuration.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Service name attached to the startup event
    pub service_name: String,
    /// Log level filter
    pub log_level: String,
    /// Whether to output JSON format
    pub json_output: bool,
    /// Whether to write to stderr instead of stdout
    pub stderr: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            service_name: "set-issuer".to_string(),
            log_level: "info".to_string(),
            json_output: false,
            stderr: true,
        }
    }
}

impl TracingConfig {
    /// Set the service name.
    #[must_use]
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Set the log level.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable or disable JSON output.
    #[must_use]
    pub const fn with_json_output(mut self, enabled: bool) -> Self {
        self.json_output = enabled;
        self
    }

    /// Write to stdout rather than stderr.
    #[must_use]
    pub const fn with_stdout(mut self) -> Self {
        self.stderr = false;
        self
    }

    fn filter(&self) -> Result<EnvFilter, PlatformError> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.log_level)
                .map_err(|e| PlatformError::Tracing(format!("invalid log level {:?}: {e}", self.log_level))),
        }
    }
}

/// Initialize tracing with the given configuration.
///
/// Should be called once at application startup.
///
/// # Errors
///
/// Returns [`PlatformError::Tracing`] if the level filter is invalid or a
/// global subscriber is already installed.
pub fn init_tracing(config: &TracingConfig) -> Result<(), PlatformError> {
    let filter = config.filter()?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = match (config.json_output, config.stderr) {
        (true, true) => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        (true, false) => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        (false, true) => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        (false, false) => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };
    result.map_err(|e| PlatformError::Tracing(e.to_string()))?;

    tracing::debug!(service = %config.service_name, "tracing initialised");
    Ok(())
}
