//! Credential blob parsing
//!
//! The credential blob stored in a provider secret is a JSON document:
//!
//! ```json
//! {"apiKey": "...", "projectID": "..."}
//! ```

use crate::error::PacketError;
use serde::Deserialize;
use std::fmt;

/// Packet API credentials
#[derive(Clone, Deserialize)]
pub struct Credentials {
    /// API key sent as `X-Auth-Token`
    #[serde(rename = "apiKey")]
    pub api_key: String,

    /// Default project for the key
    #[serde(rename = "projectID", default)]
    pub project_id: Option<String>,
}

impl Credentials {
    /// Parses a credential blob
    pub fn from_json(blob: &[u8]) -> Result<Self, PacketError> {
        if blob.is_empty() {
            return Err(PacketError::InvalidCredentials(
                "credential blob is empty".to_string(),
            ));
        }
        let credentials: Credentials = serde_json::from_slice(blob)
            .map_err(|e| PacketError::InvalidCredentials(format!("malformed credential blob: {}", e)))?;
        if credentials.api_key.trim().is_empty() {
            return Err(PacketError::InvalidCredentials("apiKey is empty".to_string()));
        }
        Ok(credentials)
    }
}

// The API key never appears in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("project_id", &self.project_id)
            .finish()
    }
}
