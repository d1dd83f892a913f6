use std::io;

use matrimony_core::AttachmentClass;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] matrimony_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("User not found: {0}")]
    UserNotFound(String),
    #[error("Failed to load user data for {0}")]
    LoadFailed(String),
    #[error("Another {0} upload or save is in progress")]
    Busy(AttachmentClass),
    #[error("{0}")]
    Rejected(String),
    #[error("Nothing was saved to {0}")]
    NothingPersisted(AttachmentClass),
    #[error("No {0} to remove")]
    NothingToRemove(String),
    #[error("Failed to save {0}")]
    SaveFailed(AttachmentClass),
    #[error("Not a reference into the configured bucket: {0}")]
    InvalidReference(String),
    #[error("Cannot read {path}: {source}")]
    ReadFile { path: String, source: io::Error },
}
