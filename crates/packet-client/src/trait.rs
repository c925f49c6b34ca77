//! DeviceService trait for mocking
//!
//! This trait abstracts the device endpoints of the Packet API so the
//! controller can be unit tested against `MockPacketClient`.

use crate::error::PacketError;
use crate::models::*;

/// Device operations of the Packet API
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
/// Implementations return `PacketError::NotFound` for unknown or empty IDs.
#[async_trait::async_trait]
pub trait DeviceService: Send + Sync {
    async fn get_device(&self, id: &str) -> Result<Device, PacketError>;
    async fn create_device(&self, request: &DeviceCreateRequest) -> Result<Device, PacketError>;
    async fn update_device(&self, id: &str, request: &DeviceUpdateRequest) -> Result<Device, PacketError>;
    async fn delete_device(&self, id: &str) -> Result<(), PacketError>;
}
