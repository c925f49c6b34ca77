//! Lifecycle adapter for a single Packet device.
//!
//! `ExternalDevice` is produced by the connector for one reconciliation and
//! performs exactly one remote call per operation. Retries belong to the loop.

use crate::conversion;
use crate::error::ControllerError;
use crate::store::RecordStore;
use crds::{Condition, Device, DeviceState};
use packet_client::DeviceService;
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of observing the remote device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExternalObservation {
    /// The remote device exists
    pub resource_exists: bool,
    /// Every mutable field matches the desired parameters
    pub resource_up_to_date: bool,
}

/// Adapter bound to one authenticated Packet client
pub struct ExternalDevice {
    store: Arc<dyn RecordStore>,
    client: Box<dyn DeviceService>,
}

impl std::fmt::Debug for ExternalDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalDevice").finish_non_exhaustive()
    }
}

impl ExternalDevice {
    pub(crate) fn new(store: Arc<dyn RecordStore>, client: Box<dyn DeviceService>) -> Self {
        Self { store, client }
    }

    /// Reads the remote device and records what was seen in `atProvider`.
    ///
    /// A missing remote device is reported as `resource_exists: false` and
    /// leaves the record untouched.
    pub async fn observe(&self, device: &mut Device) -> Result<ExternalObservation, ControllerError> {
        let id = device.external_name().unwrap_or_default().to_string();
        let remote = match self.client.get_device(&id).await {
            Ok(remote) => remote,
            Err(e) if e.is_not_found() => {
                debug!("Packet device {:?} not found", id);
                return Ok(ExternalObservation::default());
            }
            Err(e) => return Err(ControllerError::ObserveFailed(e)),
        };

        let status = device.status_mut();
        status.at_provider = conversion::observation(&remote);
        match DeviceState::from(remote.state.as_str()) {
            DeviceState::Active => {
                status.conditioned.set_conditions([Condition::available()]);
                status.conditioned.set_bindable();
            }
            DeviceState::Provisioning => {
                status.conditioned.set_conditions([Condition::creating()]);
            }
            DeviceState::Queued => {
                status.conditioned.set_conditions([Condition::unavailable()]);
            }
            DeviceState::Other(state) => {
                debug!("Packet device {} in unclassified state {}", id, state);
            }
        }

        Ok(ExternalObservation {
            resource_exists: true,
            resource_up_to_date: conversion::is_up_to_date(&device.spec.for_provider, &remote),
        })
    }

    /// Creates the remote device and binds the record to it.
    ///
    /// The binding is persisted before returning. If that write fails the
    /// remote device exists but the record does not know about it, so the next
    /// reconciliation creates another one.
    pub async fn create(&self, device: &mut Device) -> Result<(), ControllerError> {
        device.set_conditions([Condition::creating()]);

        let request = conversion::create_request(&device.spec.for_provider);
        let created = self
            .client
            .create_device(&request)
            .await
            .map_err(ControllerError::CreateFailed)?;
        info!(
            "Created Packet device {} in project {}",
            created.id, request.project_id
        );

        device.status_mut().at_provider.id = Some(created.id.clone());
        device.set_external_name(created.id);
        self.store
            .update_device(device)
            .await
            .map_err(ControllerError::ManagedUpdateFailed)
    }

    /// Sends the full desired mutable state to the remote device
    pub async fn update(&self, device: &Device) -> Result<(), ControllerError> {
        let id = device.external_name().unwrap_or_default();
        let request = conversion::update_request(&device.spec.for_provider);
        self.client
            .update_device(id, &request)
            .await
            .map_err(ControllerError::UpdateFailed)?;
        info!("Updated Packet device {}", id);
        Ok(())
    }

    /// Deletes the remote device. Already gone counts as success.
    pub async fn delete(&self, device: &mut Device) -> Result<(), ControllerError> {
        device.set_conditions([Condition::deleting()]);

        let id = device.external_name().unwrap_or_default().to_string();
        match self.client.delete_device(&id).await {
            Ok(()) => {
                info!("Deleted Packet device {}", id);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                debug!("Packet device {:?} already deleted", id);
                Ok(())
            }
            Err(e) => Err(ControllerError::DeleteFailed(e)),
        }
    }
}

#[cfg(test)]
#[path = "external_test.rs"]
mod external_test;
