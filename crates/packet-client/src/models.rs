//! Packet API models
//!
//! These models match the JSON representation of the Packet `/devices` endpoints.

use serde::{Deserialize, Serialize};

/// Device as returned by the Packet API
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Device {
    pub id: String,
    #[serde(default)]
    pub href: String,
    #[serde(default)]
    pub hostname: String,
    /// Lifecycle state (queued, provisioning, active, ...)
    #[serde(default)]
    pub state: String,
    /// Network assignments, in the order returned by the API
    #[serde(default, rename = "ip_addresses")]
    pub network: Vec<IpAddressAssignment>,
    /// Provisioning progress, 0-100
    #[serde(default)]
    pub provisioning_percentage: Option<f32>,
    #[serde(default)]
    pub plan: Option<Plan>,
    #[serde(default)]
    pub facility: Option<Facility>,
    #[serde(default)]
    pub operating_system: Option<OperatingSystem>,
    #[serde(default)]
    pub billing_cycle: Option<String>,
    #[serde(default)]
    pub userdata: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub ipxe_script_url: Option<String>,
    #[serde(default)]
    pub always_pxe: bool,
}

/// IP address assigned to a device
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IpAddressAssignment {
    #[serde(default)]
    pub id: Option<String>,
    /// 4 or 6
    pub address_family: u8,
    pub public: bool,
    pub address: String,
    #[serde(default)]
    pub management: bool,
}

impl IpAddressAssignment {
    /// Public IPv4 address
    pub fn is_public_ipv4(&self) -> bool {
        self.public && self.address_family == 4
    }
}

/// Nested plan reference
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Plan {
    #[serde(default)]
    pub id: Option<String>,
    pub slug: String,
}

/// Nested facility reference
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Facility {
    #[serde(default)]
    pub id: Option<String>,
    pub code: String,
}

/// Nested operating system reference
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OperatingSystem {
    #[serde(default)]
    pub id: Option<String>,
    pub slug: String,
}

/// Request body for `POST /projects/{project_id}/devices`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeviceCreateRequest {
    /// Project in the request path, not the body
    #[serde(skip)]
    pub project_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    pub plan: String,
    pub facility: Vec<String>,
    pub operating_system: String,
    pub billing_cycle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub userdata: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub locked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipxe_script_url: Option<String>,
    pub always_pxe: bool,
}

/// Request body for `PUT /devices/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeviceUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub userdata: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipxe_script_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub always_pxe: Option<bool>,
}

/// Error body returned by the Packet API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorResponse {
    /// All messages joined, or `None` when the body carried none
    pub fn message(&self) -> Option<String> {
        let mut messages = self.errors.clone();
        if let Some(e) = &self.error {
            messages.push(e.clone());
        }
        if messages.is_empty() {
            None
        } else {
            Some(messages.join(", "))
        }
    }
}
