//! Test utilities for unit testing the connector, lifecycle adapter and reconcile loop
//!
//! This module provides fixtures and an in-memory `RecordStore`.

use crate::connector::{ClientFactory, Connector};
use crate::store::{RecordStore, StoreError, device_key};
use crds::{
    Device, DeviceParameters, DeviceSpec, DeviceStatus, Provider, ProviderSpec, ReclaimPolicy,
    ResourceReference, SecretKeySelector,
};
use k8s_openapi::ByteString;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use packet_client::{
    DeviceService, Facility, IpAddressAssignment, MockPacketClient, OperatingSystem, PacketError, Plan,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

/// Credential blob accepted by `PacketClient::from_credentials`
pub const CREDENTIALS: &str = r#"{"apiKey": "test-key", "projectID": "proj-1"}"#;

/// Secret key the default fixtures store credentials under
pub const CREDENTIALS_KEY: &str = "credentials";

/// Desired parameters matching `remote_device`
pub fn test_parameters() -> DeviceParameters {
    DeviceParameters {
        hostname: Some("web-1".to_string()),
        plan: "c3.small.x86".to_string(),
        facility: "ewr1".to_string(),
        operating_system: "ubuntu_20_04".to_string(),
        billing_cycle: "hourly".to_string(),
        project_id: "proj-1".to_string(),
        ..Default::default()
    }
}

/// Device in namespace "default" referencing the `packet` provider
pub fn test_device(name: &str) -> Device {
    let mut device = Device::new(
        name,
        DeviceSpec {
            for_provider: test_parameters(),
            provider_ref: ResourceReference::provider("packet"),
            reclaim_policy: ReclaimPolicy::Delete,
        },
    );
    device.metadata.namespace = Some("default".to_string());
    device
}

/// Device already bound to remote `id`, finalizer in place
pub fn bound_device(name: &str, id: &str) -> Device {
    let mut device = test_device(name);
    device.set_external_name(id);
    device.add_finalizer();
    device
}

/// Remote device in `state` whose mutable fields match `test_parameters`
pub fn remote_device(id: &str, state: &str) -> packet_client::Device {
    packet_client::Device {
        id: id.to_string(),
        href: format!("/devices/{id}"),
        hostname: "web-1".to_string(),
        state: state.to_string(),
        plan: Some(Plan {
            id: None,
            slug: "c3.small.x86".to_string(),
        }),
        facility: Some(Facility {
            id: None,
            code: "ewr1".to_string(),
        }),
        operating_system: Some(OperatingSystem {
            id: None,
            slug: "ubuntu_20_04".to_string(),
        }),
        billing_cycle: Some("hourly".to_string()),
        ..Default::default()
    }
}

/// Public IPv4 assignment
pub fn public_ipv4(address: &str) -> IpAddressAssignment {
    IpAddressAssignment {
        address_family: 4,
        public: true,
        address: address.to_string(),
        ..Default::default()
    }
}

/// Connector whose factory always hands out (a clone of) `mock`
pub fn mock_connector(store: Arc<dyn RecordStore>, mock: MockPacketClient) -> Connector {
    let factory: ClientFactory =
        Arc::new(move |_blob: &[u8]| -> Result<Box<dyn DeviceService>, PacketError> {
            Ok(Box::new(mock.clone()))
        });
    Connector::with_client_factory(store, factory)
}

type Key = (String, String);

fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

#[derive(Default)]
struct State {
    providers: HashMap<Key, Provider>,
    secrets: HashMap<Key, Secret>,
    devices: HashMap<Key, Device>,
    statuses: HashMap<Key, DeviceStatus>,
    device_failure: Option<String>,
    status_failure: Option<String>,
    device_updates: usize,
}

/// In-memory `RecordStore`
///
/// Clones share state, so a test can keep a handle after passing one to the connector.
#[derive(Clone, Default)]
pub struct MemoryRecordStore {
    state: Arc<Mutex<State>>,
}

impl MemoryRecordStore {
    /// Store holding a provider `name` whose secret `secret_name` carries `blob`
    pub fn with_provider(namespace: &str, name: &str, secret_name: &str, blob: &str) -> Self {
        let store = Self::default();
        store.add_provider(namespace, name, secret_name, CREDENTIALS_KEY);
        store.add_secret(namespace, secret_name, CREDENTIALS_KEY, blob);
        store
    }

    /// Adds a provider pointing at `secret_name`/`key` in the same namespace
    pub fn add_provider(&self, namespace: &str, name: &str, secret_name: &str, key_name: &str) {
        let mut provider = Provider::new(
            name,
            ProviderSpec {
                credentials_secret_ref: SecretKeySelector {
                    name: secret_name.to_string(),
                    namespace: None,
                    key: key_name.to_string(),
                },
            },
        );
        provider.metadata.namespace = Some(namespace.to_string());
        self.state
            .lock()
            .unwrap()
            .providers
            .insert(key(namespace, name), provider);
    }

    /// Adds a secret with a single data entry
    pub fn add_secret(&self, namespace: &str, name: &str, key_name: &str, value: &str) {
        let secret = Secret {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            data: Some(BTreeMap::from([(
                key_name.to_string(),
                ByteString(value.as_bytes().to_vec()),
            )])),
            ..Default::default()
        };
        self.state
            .lock()
            .unwrap()
            .secrets
            .insert(key(namespace, name), secret);
    }

    /// Makes every `update_device` call fail until cleared
    pub fn fail_device_updates(&self, message: &str) {
        self.state.lock().unwrap().device_failure = Some(message.to_string());
    }

    /// Makes every `update_status` call fail until cleared
    pub fn fail_status_updates(&self, message: &str) {
        self.state.lock().unwrap().status_failure = Some(message.to_string());
    }

    /// Clears injected failures
    pub fn clear_failures(&self) {
        let mut state = self.state.lock().unwrap();
        state.device_failure = None;
        state.status_failure = None;
    }

    /// Last device persisted through `update_device`
    pub fn persisted_device(&self, namespace: &str, name: &str) -> Option<Device> {
        self.state.lock().unwrap().devices.get(&key(namespace, name)).cloned()
    }

    /// Last status persisted through `update_status`
    pub fn persisted_status(&self, namespace: &str, name: &str) -> Option<DeviceStatus> {
        self.state.lock().unwrap().statuses.get(&key(namespace, name)).cloned()
    }

    /// Successful `update_device` calls
    pub fn device_updates(&self) -> usize {
        self.state.lock().unwrap().device_updates
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get_provider(&self, namespace: &str, name: &str) -> Result<Provider, StoreError> {
        self.state
            .lock()
            .unwrap()
            .providers
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: "Provider",
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, StoreError> {
        self.state
            .lock()
            .unwrap()
            .secrets
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: "Secret",
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    async fn update_device(&self, device: &Device) -> Result<(), StoreError> {
        let (namespace, name) = device_key(device)?;
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.device_failure {
            return Err(StoreError::Invalid(message.clone()));
        }
        state.devices.insert(key(namespace, name), device.clone());
        state.device_updates += 1;
        Ok(())
    }

    async fn update_status(&self, device: &Device) -> Result<(), StoreError> {
        let (namespace, name) = device_key(device)?;
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.status_failure {
            return Err(StoreError::Invalid(message.clone()));
        }
        if let Some(status) = &device.status {
            state.statuses.insert(key(namespace, name), status.clone());
        }
        Ok(())
    }
}
