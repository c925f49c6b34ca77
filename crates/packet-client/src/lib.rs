//! Packet REST API Client
//!
//! A Rust client library for the device endpoints of the Packet provisioning API.
//!
//! # Example
//!
//! ```no_run
//! use packet_client::{DeviceService, PacketClient, DEFAULT_API_URL};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = br#"{"apiKey": "your-api-key", "projectID": "proj-1"}"#;
//! let client = PacketClient::from_credentials(DEFAULT_API_URL, credentials)?;
//!
//! let device = client.get_device("6d5e1f1c-0000-4000-8000-000000000000").await?;
//! println!("{} is {}", device.hostname, device.state);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod credentials;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod device_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::{DEFAULT_API_URL, PacketClient};
pub use credentials::Credentials;
pub use device_trait::DeviceService;
pub use error::PacketError;
pub use models::*;
#[cfg(feature = "test-util")]
pub use mock::MockPacketClient;
