//! Error types for SQLMon drivers

use thiserror::Error;

/// Core error type for driver and connection operations
#[derive(Error, Debug)]
pub enum SqlMonError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for driver operations
pub type Result<T> = std::result::Result<T, SqlMonError>;
