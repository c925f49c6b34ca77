//! Device Custom Resource Definition
//!
//! A `Device` is the desired and observed state of one bare-metal server
//! provisioned through the Packet API.

use crate::conditions::{Condition, ConditionedStatus};
use crate::references::ResourceReference;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Annotation holding the remote device ID once the device has been created
pub const EXTERNAL_NAME_ANNOTATION: &str = "packet.dcops.microscaler.io/external-name";

/// Finalizer that holds Kubernetes deletion until the remote device is gone
pub const DEVICE_FINALIZER: &str = "device.packet.dcops.microscaler.io";

/// DeviceSpec defines the desired state of a Packet device
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "packet.dcops.microscaler.io",
    version = "v1alpha1",
    kind = "Device",
    namespaced,
    status = "DeviceStatus",
    printcolumn = r#"{"name":"READY", "type":"string", "jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
    printcolumn = r#"{"name":"STATE", "type":"string", "jsonPath":".status.atProvider.state"}"#,
    printcolumn = r#"{"name":"IPV4", "type":"string", "jsonPath":".status.atProvider.ipv4"}"#,
    printcolumn = r#"{"name":"AGE", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSpec {
    /// Parameters sent to the Packet API
    pub for_provider: DeviceParameters,

    /// Provider holding the API credentials
    pub provider_ref: ResourceReference,

    /// What happens to the remote device when this resource is deleted
    #[serde(default)]
    pub reclaim_policy: ReclaimPolicy,
}

/// Device parameters as understood by the Packet API
///
/// `plan`, `facility`, `operatingSystem`, `billingCycle` and `projectID` are fixed
/// at creation. The remaining fields can be changed on a running device.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceParameters {
    /// Hostname (optional, the API generates one when empty)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    /// Plan slug (e.g., "c3.small.x86")
    pub plan: String,

    /// Facility code (e.g., "ewr1")
    pub facility: String,

    /// Operating system slug (e.g., "ubuntu_20_04")
    pub operating_system: String,

    /// Billing cycle (hourly, daily, monthly, yearly)
    #[serde(default = "default_billing_cycle")]
    pub billing_cycle: String,

    /// Project the device is created in
    #[serde(rename = "projectID")]
    pub project_id: String,

    /// User data passed to the device at boot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userdata: Option<String>,

    /// Tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Protect the device against deletion through the API
    #[serde(default)]
    pub locked: bool,

    /// iPXE script URL for custom operating systems
    #[serde(default, rename = "ipxeScriptURL", skip_serializing_if = "Option::is_none")]
    pub ipxe_script_url: Option<String>,

    /// Always boot from iPXE
    #[serde(default, rename = "alwaysPXE")]
    pub always_pxe: bool,
}

fn default_billing_cycle() -> String {
    "hourly".to_string()
}

/// Reclaim policy for the remote device
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum ReclaimPolicy {
    /// Delete the remote device with the resource
    #[default]
    Delete,
    /// Leave the remote device running
    Retain,
}

/// Lifecycle state reported by the Packet API
///
/// Only `queued`, `provisioning` and `active` are classified; every other value
/// is preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeviceState {
    /// Waiting for hardware
    Queued,
    /// Operating system install in progress
    Provisioning,
    /// Running
    Active,
    /// Any state not classified above
    Other(String),
}

impl DeviceState {
    /// Wire representation
    pub fn as_str(&self) -> &str {
        match self {
            DeviceState::Queued => "queued",
            DeviceState::Provisioning => "provisioning",
            DeviceState::Active => "active",
            DeviceState::Other(s) => s,
        }
    }
}

impl From<&str> for DeviceState {
    fn from(s: &str) -> Self {
        match s {
            "queued" => DeviceState::Queued,
            "provisioning" => DeviceState::Provisioning,
            "active" => DeviceState::Active,
            other => DeviceState::Other(other.to_string()),
        }
    }
}

impl From<String> for DeviceState {
    fn from(s: String) -> Self {
        DeviceState::from(s.as_str())
    }
}

impl From<DeviceState> for String {
    fn from(state: DeviceState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last observed attributes of the remote device
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceObservation {
    /// Remote device ID (set after creation, never changed afterwards)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Hostname
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    /// API URL of the device
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,

    /// Lifecycle state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub state: Option<DeviceState>,

    /// First public IPv4 address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<String>,

    /// Provisioning progress as a fraction between 0 and 1 (6 decimal places)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_progress: Option<String>,
}

/// DeviceStatus defines the observed state of a Packet device
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatus {
    /// Conditions and binding phase
    #[serde(flatten)]
    pub conditioned: ConditionedStatus,

    /// Remote device attributes
    #[serde(default)]
    pub at_provider: DeviceObservation,
}

impl Device {
    /// Status, created empty on first access
    pub fn status_mut(&mut self) -> &mut DeviceStatus {
        self.status.get_or_insert_with(DeviceStatus::default)
    }

    /// Sets conditions on the status
    pub fn set_conditions(&mut self, conditions: impl IntoIterator<Item = Condition>) {
        self.status_mut().conditioned.set_conditions(conditions);
    }

    /// Remote device ID from the external-name annotation
    pub fn external_name(&self) -> Option<&str> {
        self.metadata
            .annotations
            .as_ref()
            .and_then(|a| a.get(EXTERNAL_NAME_ANNOTATION))
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Binds this resource to a remote device ID
    pub fn set_external_name(&mut self, id: impl Into<String>) {
        self.metadata
            .annotations
            .get_or_insert_with(Default::default)
            .insert(EXTERNAL_NAME_ANNOTATION.to_string(), id.into());
    }

    /// Whether Kubernetes deletion has been requested
    pub fn is_deleting(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }

    /// Whether the device finalizer is present
    pub fn has_finalizer(&self) -> bool {
        self.metadata
            .finalizers
            .as_ref()
            .is_some_and(|f| f.iter().any(|n| n == DEVICE_FINALIZER))
    }

    /// Adds the device finalizer, returning false if it was already present
    pub fn add_finalizer(&mut self) -> bool {
        if self.has_finalizer() {
            return false;
        }
        self.metadata
            .finalizers
            .get_or_insert_with(Vec::new)
            .push(DEVICE_FINALIZER.to_string());
        true
    }

    /// Removes the device finalizer, returning false if it was not present
    pub fn remove_finalizer(&mut self) -> bool {
        if !self.has_finalizer() {
            return false;
        }
        if let Some(finalizers) = self.metadata.finalizers.as_mut() {
            finalizers.retain(|n| n != DEVICE_FINALIZER);
        }
        true
    }
}
