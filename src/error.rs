//! Error types for the Prism analytics engine
//!
//! This module provides error handling using thiserror for structured
//! error definitions and anyhow for error propagation at the edges.
//!
//! The event log store never surfaces these to its callers: storage
//! failures are recovered locally and logged. They reach callers from the
//! network clients, configuration loading, and the CLI.

use thiserror::Error;

/// Main error type for Prism operations
#[derive(Error, Debug)]
pub enum PrismError {
    /// Storage backend read or write failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Workflow engine returned a non-success status
    #[error("Workflow error ({status}): {message}")]
    Workflow { status: u16, message: String },

    /// Storage provider (file host) rejected an upload
    #[error("Storage provider error: {0}")]
    Provider(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Caller supplied input that cannot be processed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl PrismError {
    /// HTTP status to report for this error in the `{error, status}` shape
    pub fn status(&self) -> u16 {
        match self {
            PrismError::Workflow { status, .. } => *status,
            PrismError::InvalidInput(_) => 400,
            _ => 500,
        }
    }
}

/// Result type alias for Prism operations
pub type Result<T> = std::result::Result<T, PrismError>;

/// Convert anyhow::Error to PrismError
impl From<anyhow::Error> for PrismError {
    fn from(err: anyhow::Error) -> Self {
        PrismError::Other(err.to_string())
    }
}
