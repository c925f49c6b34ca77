//! Packet client errors

use thiserror::Error;

/// Errors that can occur when interacting with the Packet API
#[derive(Debug, Error)]
pub enum PacketError {
    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Packet API returned an error
    #[error("Packet API error: {0}")]
    Api(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Authentication failed (invalid or revoked API key)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request (rejected by API validation)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Credential blob could not be used to build a client
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),
}

impl PacketError {
    /// Whether the remote resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, PacketError::NotFound(_))
    }
}
