//! Error types for lumen operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for lumen operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for all lumen operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Required configuration is missing or malformed.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An image source string is empty or malformed.
    #[error("Invalid image source: {0}")]
    InvalidSource(String),

    /// A local image file does not exist.
    #[error("Image file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Fetching a remote image failed (network error or non-2xx status).
    #[error("Failed to fetch image: {0}")]
    Fetch(String),

    /// Bytes did not decode as base64 or as a recognized image format.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The upstream chat-completions API call failed or returned unusable content.
    #[error("Upstream API error: {0}")]
    Upstream(String),

    /// Object-storage upload failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for an upstream API error.
    pub fn upstream(message: impl Into<String>) -> Self {
        Error::Upstream(message.into())
    }

    /// Shorthand for a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Error::Decode(message.into())
    }
}
