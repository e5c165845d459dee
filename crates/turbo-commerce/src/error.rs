//! Commerce error types.

use thiserror::Error;

/// Errors that can occur while building or decoding search requests.
#[derive(Error, Debug)]
pub enum CommerceError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for CommerceError {
    fn from(e: serde_json::Error) -> Self {
        CommerceError::SerializationError(e.to_string())
    }
}
