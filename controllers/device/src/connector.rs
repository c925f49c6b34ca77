//! Connector: resolves Packet credentials for a `Device` and binds a client.
//!
//! Credentials are read on every call and never cached, so a rotated secret
//! takes effect on the next reconciliation.

use crate::error::ControllerError;
use crate::external::ExternalDevice;
use crate::store::{RecordStore, device_key};
use crds::{API_GROUP, Device, PROVIDER_KIND};
use packet_client::{DeviceService, PacketClient, PacketError};
use std::sync::Arc;
use tracing::debug;

/// Builds a device client from a credential blob
pub type ClientFactory =
    Arc<dyn Fn(&[u8]) -> Result<Box<dyn DeviceService>, PacketError> + Send + Sync>;

/// Produces lifecycle adapters bound to a device's provider credentials.
#[derive(Clone)]
pub struct Connector {
    store: Arc<dyn RecordStore>,
    new_client: ClientFactory,
}

impl Connector {
    /// Connector building `PacketClient`s against `api_url`
    pub fn new(store: Arc<dyn RecordStore>, api_url: String) -> Self {
        let new_client: ClientFactory =
            Arc::new(move |blob: &[u8]| -> Result<Box<dyn DeviceService>, PacketError> {
                let client = PacketClient::from_credentials(api_url.clone(), blob)?;
                Ok(Box::new(client))
            });
        Self::with_client_factory(store, new_client)
    }

    /// Connector using a custom client factory
    pub fn with_client_factory(store: Arc<dyn RecordStore>, new_client: ClientFactory) -> Self {
        Self { store, new_client }
    }

    /// Resolves provider → secret → client for `device`.
    pub async fn connect(&self, device: &Device) -> Result<ExternalDevice, ControllerError> {
        let (namespace, name) = device_key(device).map_err(ControllerError::ProviderNotFound)?;
        let provider_ref = &device.spec.provider_ref;
        if provider_ref.kind != PROVIDER_KIND || provider_ref.api_group != API_GROUP {
            return Err(ControllerError::TypeMismatch(format!(
                "providerRef of Device {}/{} points at {}/{}, expected {}/{}",
                namespace, name, provider_ref.api_group, provider_ref.kind, API_GROUP, PROVIDER_KIND
            )));
        }

        let provider_ns = provider_ref.namespace_or(namespace);
        let provider = self
            .store
            .get_provider(provider_ns, &provider_ref.name)
            .await
            .map_err(ControllerError::ProviderNotFound)?;

        let selector = &provider.spec.credentials_secret_ref;
        let secret_ns = selector.namespace.as_deref().unwrap_or(provider_ns);
        let secret = self
            .store
            .get_secret(secret_ns, &selector.name)
            .await
            .map_err(ControllerError::SecretNotFound)?;

        // A missing key yields an empty blob, which the client rejects.
        let blob = secret
            .data
            .as_ref()
            .and_then(|data| data.get(&selector.key))
            .map(|value| value.0.clone())
            .unwrap_or_default();
        debug!(
            "Resolved credentials for Device {}/{} from Secret {}/{} key {}",
            namespace, name, secret_ns, selector.name, selector.key
        );

        let client = (self.new_client)(blob.as_slice()).map_err(ControllerError::ClientConstructionFailed)?;
        Ok(ExternalDevice::new(self.store.clone(), client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use packet_client::MockPacketClient;

    #[tokio::test]
    async fn test_connect_resolves_provider_and_secret() {
        let store = MemoryRecordStore::with_provider("default", "packet", "packet-creds", CREDENTIALS);
        let blobs = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen = blobs.clone();
        let mock = MockPacketClient::new();
        let factory: ClientFactory =
            Arc::new(move |blob: &[u8]| -> Result<Box<dyn DeviceService>, PacketError> {
                seen.lock().unwrap().push(blob.to_vec());
                Ok(Box::new(mock.clone()))
            });
        let connector = Connector::with_client_factory(Arc::new(store), factory);

        let result = connector.connect(&test_device("web-1")).await;
        assert!(result.is_ok());
        assert_eq!(blobs.lock().unwrap().as_slice(), &[CREDENTIALS.as_bytes().to_vec()]);
    }

    #[tokio::test]
    async fn test_connect_provider_not_found() {
        let store = MemoryRecordStore::default();
        let connector = mock_connector(Arc::new(store), MockPacketClient::new());

        let err = connector.connect(&test_device("web-1")).await.err().unwrap();
        assert!(matches!(err, ControllerError::ProviderNotFound(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_connect_secret_not_found() {
        let store = MemoryRecordStore::default();
        store.add_provider("default", "packet", "missing-secret", "credentials");
        let connector = mock_connector(Arc::new(store), MockPacketClient::new());

        let err = connector.connect(&test_device("web-1")).await.err().unwrap();
        assert!(matches!(err, ControllerError::SecretNotFound(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_connect_rejects_malformed_credentials() {
        let store = MemoryRecordStore::with_provider("default", "packet", "packet-creds", "not json");
        let connector = Connector::new(Arc::new(store), "http://127.0.0.1:1".to_string());

        let err = connector.connect(&test_device("web-1")).await.err().unwrap();
        assert!(matches!(err, ControllerError::ClientConstructionFailed(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_connect_missing_secret_key_fails_client_construction() {
        let store = MemoryRecordStore::default();
        store.add_provider("default", "packet", "packet-creds", "other-key");
        store.add_secret("default", "packet-creds", "credentials", CREDENTIALS);
        let connector = Connector::new(Arc::new(store), "http://127.0.0.1:1".to_string());

        let err = connector.connect(&test_device("web-1")).await.err().unwrap();
        assert!(matches!(err, ControllerError::ClientConstructionFailed(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_connect_rejects_wrong_reference_kind() {
        let store = MemoryRecordStore::with_provider("default", "packet", "packet-creds", CREDENTIALS);
        let connector = mock_connector(Arc::new(store), MockPacketClient::new());
        let mut device = test_device("web-1");
        device.spec.provider_ref.kind = "Secret".to_string();

        let err = connector.connect(&device).await.err().unwrap();
        assert!(matches!(err, ControllerError::TypeMismatch(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_connect_uses_reference_namespace() {
        let store = MemoryRecordStore::with_provider("infra", "packet", "packet-creds", CREDENTIALS);
        let connector = mock_connector(Arc::new(store), MockPacketClient::new());
        let mut device = test_device("web-1");
        device.spec.provider_ref.namespace = Some("infra".to_string());

        assert!(connector.connect(&device).await.is_ok());
    }
}
