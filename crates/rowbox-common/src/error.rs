//! Error types for Rowbox

use thiserror::Error;

/// Result type alias for Rowbox operations
pub type Result<T> = std::result::Result<T, RowboxError>;

/// Main error type for shared Rowbox operations
#[derive(Error, Debug)]
pub enum RowboxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid file status: {0}")]
    InvalidStatus(String),

    #[error("Invalid column type: {0}")]
    InvalidColumnType(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}
