//! Main controller implementation.
//!
//! Builds the record store, connector and reconciler, then supervises the
//! Device watcher task.

use crate::config::Config;
use crate::connector::Connector;
use crate::error::ControllerError;
use crate::managed::ManagedReconciler;
use crate::store::{KubeRecordStore, RecordStore};
use crate::watcher::watch_devices;
use crds::Device;
use kube::{Api, Client};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Device controller: one watcher over `Device` resources.
#[derive(Debug)]
pub struct Controller {
    device_watcher: JoinHandle<Result<(), ControllerError>>,
}

impl Controller {
    /// Creates a controller and starts its watcher.
    pub async fn new(config: Config) -> Result<Self, ControllerError> {
        info!("Initializing Packet Device Controller");

        let kube_client = Client::try_default().await?;
        let store: Arc<dyn RecordStore> = Arc::new(KubeRecordStore::new(kube_client.clone()));
        let connector = Connector::new(Arc::clone(&store), config.api_url.clone());
        let reconciler = Arc::new(ManagedReconciler::new(
            connector,
            store,
            config.poll_interval,
            config.short_wait,
        ));

        let device_api: Api<Device> = match config.watch_namespace.as_deref() {
            Some(ns) => Api::namespaced(kube_client, ns),
            None => Api::all(kube_client),
        };

        let concurrency = config.concurrency;
        let device_watcher =
            tokio::spawn(async move { watch_devices(device_api, reconciler, concurrency).await });

        Ok(Self { device_watcher })
    }

    /// Runs until the watcher exits or a shutdown signal arrives.
    pub async fn run(mut self) -> Result<(), ControllerError> {
        info!("Packet Device Controller running");

        tokio::select! {
            result = &mut self.device_watcher => {
                result.map_err(|e| ControllerError::Watch(format!("Device watcher panicked: {}", e)))?
                    .map_err(|e| ControllerError::Watch(format!("Device watcher error: {}", e)))?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
            }
        }

        info!("Packet Device Controller stopped");
        Ok(())
    }
}
