//! Packet API client
//!
//! Implements the device endpoints of the Packet REST API:
//! `/devices/{id}` and `/projects/{project_id}/devices`.

use crate::credentials::Credentials;
use crate::device_trait::DeviceService;
use crate::error::PacketError;
use crate::models::*;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Public Packet API endpoint
pub const DEFAULT_API_URL: &str = "https://api.packet.net";

const USER_AGENT: &str = concat!("packet-device-controller/", env!("CARGO_PKG_VERSION"));

/// Packet API client
pub struct PacketClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for PacketClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacketClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl PacketClient {
    /// Create a new Packet client
    ///
    /// # Arguments
    /// * `base_url` - Packet API base URL (e.g., "https://api.packet.net")
    /// * `api_key` - API key sent as `X-Auth-Token`
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, PacketError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Create a client from a credential blob (see [`Credentials`])
    pub fn from_credentials(base_url: impl Into<String>, blob: &[u8]) -> Result<Self, PacketError> {
        let credentials = Credentials::from_json(blob)?;
        Self::new(base_url, credentials.api_key)
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("X-Auth-Token", &self.api_key)
            .header("Accept", "application/json")
    }

    /// Maps non-success responses to `PacketError`
    async fn check(response: Response, what: &str) -> Result<Response, PacketError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorResponse>(&body)
            .ok()
            .and_then(|e| e.message())
            .unwrap_or(body);

        Err(match status {
            StatusCode::NOT_FOUND => PacketError::NotFound(format!("{}: {}", what, detail)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                PacketError::Authentication(format!("{}: {} - {}", what, status, detail))
            }
            StatusCode::UNPROCESSABLE_ENTITY => {
                PacketError::InvalidRequest(format!("{}: {}", what, detail))
            }
            _ => PacketError::Api(format!("{}: {} - {}", what, status, detail)),
        })
    }

    /// Get a device by ID
    ///
    /// # Returns
    /// * `Ok(Device)` - The device
    /// * `Err(PacketError::NotFound)` - If the device does not exist or `id` is empty
    pub async fn get_device(&self, id: &str) -> Result<Device, PacketError> {
        if id.is_empty() {
            return Err(PacketError::NotFound("device ID is empty".to_string()));
        }
        let url = format!("{}/devices/{}", self.base_url, id);
        debug!("Fetching device {} from Packet", id);

        let response = self.authorized(self.client.get(&url)).send().await?;
        let response = Self::check(response, &format!("get device {}", id)).await?;

        let device: Device = response.json().await?;
        Ok(device)
    }

    /// Create a device in `request.project_id`
    pub async fn create_device(&self, request: &DeviceCreateRequest) -> Result<Device, PacketError> {
        if request.project_id.is_empty() {
            return Err(PacketError::InvalidRequest("projectID is required".to_string()));
        }
        let url = format!("{}/projects/{}/devices", self.base_url, request.project_id);
        debug!("Creating device in project {} (plan {}, facility {:?})",
            request.project_id, request.plan, request.facility);

        let response = self.authorized(self.client.post(&url)).json(request).send().await?;
        let response = Self::check(response, "create device").await?;

        let device: Device = response.json().await?;
        debug!("Created device {}", device.id);
        Ok(device)
    }

    /// Update the mutable attributes of a device
    pub async fn update_device(&self, id: &str, request: &DeviceUpdateRequest) -> Result<Device, PacketError> {
        if id.is_empty() {
            return Err(PacketError::NotFound("device ID is empty".to_string()));
        }
        let url = format!("{}/devices/{}", self.base_url, id);
        debug!("Updating device {}", id);

        let response = self.authorized(self.client.put(&url)).json(request).send().await?;
        let response = Self::check(response, &format!("update device {}", id)).await?;

        let device: Device = response.json().await?;
        Ok(device)
    }

    /// Delete a device
    pub async fn delete_device(&self, id: &str) -> Result<(), PacketError> {
        if id.is_empty() {
            return Err(PacketError::NotFound("device ID is empty".to_string()));
        }
        let url = format!("{}/devices/{}", self.base_url, id);
        debug!("Deleting device {}", id);

        let response = self.authorized(self.client.delete(&url)).send().await?;
        Self::check(response, &format!("delete device {}", id)).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl DeviceService for PacketClient {
    async fn get_device(&self, id: &str) -> Result<Device, PacketError> {
        PacketClient::get_device(self, id).await
    }

    async fn create_device(&self, request: &DeviceCreateRequest) -> Result<Device, PacketError> {
        PacketClient::create_device(self, request).await
    }

    async fn update_device(&self, id: &str, request: &DeviceUpdateRequest) -> Result<Device, PacketError> {
        PacketClient::update_device(self, id, request).await
    }

    async fn delete_device(&self, id: &str) -> Result<(), PacketError> {
        PacketClient::delete_device(self, id).await
    }
}
