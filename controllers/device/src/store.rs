//! Record store access.
//!
//! The connector and the lifecycle adapter read providers and secrets and persist
//! `Device` resources through `RecordStore`, so they can be tested against an
//! in-memory store. `KubeRecordStore` is the Kubernetes implementation.

use crds::{Device, DeviceStatus, Provider};
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::debug;

/// Errors returned by a `RecordStore`
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested object does not exist
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        /// Kind of the missing object
        kind: &'static str,
        /// Namespace it was looked up in
        namespace: String,
        /// Object name
        name: String,
    },

    /// The object handed to the store cannot be persisted as-is
    #[error("invalid object: {0}")]
    Invalid(String),

    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),
}

/// Reads and writes the records the controller depends on.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Get a provider by namespace and name
    async fn get_provider(&self, namespace: &str, name: &str) -> Result<Provider, StoreError>;

    /// Get a secret by namespace and name
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, StoreError>;

    /// Persist the device's metadata (annotations and finalizers)
    async fn update_device(&self, device: &Device) -> Result<(), StoreError>;

    /// Persist the device's status subresource
    async fn update_status(&self, device: &Device) -> Result<(), StoreError>;
}

/// Name and namespace of a device, namespace defaulting to "default"
pub fn device_key(device: &Device) -> Result<(&str, &str), StoreError> {
    let name = device
        .metadata
        .name
        .as_deref()
        .ok_or_else(|| StoreError::Invalid("Device missing name".to_string()))?;
    let namespace = device.metadata.namespace.as_deref().unwrap_or("default");
    Ok((namespace, name))
}

/// Merge patch carrying the device's annotations and finalizers.
///
/// Unset lists are left out; a `null` would wipe entries written by others.
pub fn metadata_patch(device: &Device) -> Value {
    let mut metadata = Map::new();
    if let Some(annotations) = &device.metadata.annotations {
        metadata.insert("annotations".to_string(), json!(annotations));
    }
    if let Some(finalizers) = &device.metadata.finalizers {
        metadata.insert("finalizers".to_string(), json!(finalizers));
    }
    json!({ "metadata": metadata })
}

/// Merge patch replacing the observed status.
///
/// Every `atProvider` field is present, cleared ones as `null`, so a value
/// that disappeared remotely is removed from the stored status too.
pub fn status_patch(status: &DeviceStatus) -> Value {
    let observed = &status.at_provider;
    let mut patch = json!(status);
    patch["atProvider"] = json!({
        "id": observed.id,
        "hostname": observed.hostname,
        "href": observed.href,
        "state": observed.state,
        "ipv4": observed.ipv4,
        "provisioningProgress": observed.provisioning_progress,
    });
    json!({ "status": patch })
}

/// `RecordStore` backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeRecordStore {
    client: Client,
}

impl KubeRecordStore {
    /// Creates a store using the given Kubernetes client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn devices(&self, namespace: &str) -> Api<Device> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait::async_trait]
impl RecordStore for KubeRecordStore {
    async fn get_provider(&self, namespace: &str, name: &str) -> Result<Provider, StoreError> {
        let api: Api<Provider> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name).await?.ok_or_else(|| StoreError::NotFound {
            kind: "Provider",
            namespace: namespace.to_string(),
            name: name.to_string(),
        })
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, StoreError> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name).await?.ok_or_else(|| StoreError::NotFound {
            kind: "Secret",
            namespace: namespace.to_string(),
            name: name.to_string(),
        })
    }

    async fn update_device(&self, device: &Device) -> Result<(), StoreError> {
        let (namespace, name) = device_key(device)?;
        let patch = metadata_patch(device);
        self.devices(namespace)
            .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        debug!("Persisted Device {}/{} metadata", namespace, name);
        Ok(())
    }

    async fn update_status(&self, device: &Device) -> Result<(), StoreError> {
        let (namespace, name) = device_key(device)?;
        let Some(status) = &device.status else {
            return Ok(());
        };
        let patch = status_patch(status);
        self.devices(namespace)
            .patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        debug!("Persisted Device {}/{} status", namespace, name);
        Ok(())
    }
}
