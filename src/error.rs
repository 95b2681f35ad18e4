//! Error types for the Macroscope MCP server
//!
//! Structured error definitions via thiserror; anyhow is accepted at the
//! boundary and folded into the crate error.

use thiserror::Error;

/// Main error type for Macroscope operations
#[derive(Error, Debug)]
pub enum MacroscopeError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Result type alias for Macroscope operations
pub type Result<T> = std::result::Result<T, MacroscopeError>;

/// Convert anyhow::Error to MacroscopeError
impl From<anyhow::Error> for MacroscopeError {
    fn from(err: anyhow::Error) -> Self {
        MacroscopeError::Other(err.to_string())
    }
}
