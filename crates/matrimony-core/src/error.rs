//! Error types for matrimony-core

use thiserror::Error;

/// Result type alias using matrimony-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in matrimony-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// User record not found
    #[error("User record not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Media/object storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Remote record store error
    #[error("Record store error: {0}")]
    Record(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
