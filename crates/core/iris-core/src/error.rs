//! Error types for the IRIS chat client

use thiserror::Error;

/// Main error type for IRIS operations
#[derive(Debug, Error)]
pub enum IrisError {
    /// The chat service could not be reached or rejected the request.
    ///
    /// This is the only error surfaced to the user while a request cycle is
    /// running; the caller rolls back the pending user turn when it sees it.
    #[error("{0}")]
    Api(String),

    /// Health check failed at start-up
    #[error("{0}")]
    Unavailable(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Convenient Result type using IrisError
pub type Result<T> = std::result::Result<T, IrisError>;

impl IrisError {
    /// Create an API (transport) error
    pub fn api(msg: impl Into<String>) -> Self {
        IrisError::Api(msg.into())
    }

    /// Create a service unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        IrisError::Unavailable(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        IrisError::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        IrisError::Validation(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        IrisError::Other(msg.into())
    }

    /// Whether this error came from talking to the chat service
    pub fn is_transport(&self) -> bool {
        matches!(self, IrisError::Api(_))
    }
}
