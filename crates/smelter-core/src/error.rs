//! Error types for smelter.

use thiserror::Error;

/// Result type alias for smelter operations.
pub type Result<T> = std::result::Result<T, SmelterError>;

/// Errors that can occur in smelter operations.
#[derive(Error, Debug)]
pub enum SmelterError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization or parse error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed source record; skipped at item granularity
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error; fatal at construction
    #[error("Configuration error: {0}")]
    Config(String),
}
