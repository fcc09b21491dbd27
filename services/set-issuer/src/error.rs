//! Issuer error types.

use crate::config::ConfigError;
use auth_caep::CaepError;
use std::path::PathBuf;
use thiserror::Error;

/// Failures of the issuer commands.
#[derive(Error, Debug)]
pub enum IssuerError {
    /// Configuration is missing or invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Key handling, claim building, signing or delivery failed
    #[error(transparent)]
    Caep(#[from] CaepError),

    /// Reading or writing a file failed
    #[error("{}: {source}", path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Refusing to overwrite an existing key file
    #[error("{} already exists; pass --force to overwrite", .0.display())]
    AlreadyExists(PathBuf),

    /// Events file is not a JSON object of event-type URI to body
    #[error("Invalid events file {}: {reason}", path.display())]
    EventsFile {
        /// File involved
        path: PathBuf,
        /// What is wrong with it
        reason: String,
    },

    /// Neither a subject email nor an events file was given
    #[error("No events to send: set SET_SUBJECT_EMAIL or provide an events file")]
    NoEventSource,

    /// A blocking task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(String),
}

impl IssuerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

/// Result type for issuer operations.
pub type IssuerResult<T> = Result<T, IssuerError>;
