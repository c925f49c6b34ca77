//! Managed reconcile loop for `Device` resources.
//!
//! One call to [`ManagedReconciler::reconcile`] is one tick for one device:
//! connect, then observe and create, update or delete as needed. The outcome of
//! every tick is written to the `Synced` condition.

use crate::backoff::FibonacciBackoff;
use crate::connector::Connector;
use crate::error::ControllerError;
use crate::store::{RecordStore, device_key};
use crds::{Condition, Device, ReclaimPolicy};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

const BACKOFF_MIN: Duration = Duration::from_secs(30);
const BACKOFF_MAX: Duration = Duration::from_secs(600);

/// What the controller should do with a device after a successful tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Reconcile again after the given delay
    Requeue(Duration),
    /// Nothing left to do until the resource changes
    AwaitChange,
}

/// Drives `Device` resources towards their desired state
pub struct ManagedReconciler {
    connector: Connector,
    store: Arc<dyn RecordStore>,
    poll_interval: Duration,
    short_wait: Duration,
    backoff_states: Mutex<HashMap<String, FibonacciBackoff>>,
}

impl std::fmt::Debug for ManagedReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedReconciler")
            .field("poll_interval", &self.poll_interval)
            .field("short_wait", &self.short_wait)
            .finish_non_exhaustive()
    }
}

impl ManagedReconciler {
    /// Creates a reconciler.
    ///
    /// `poll_interval` is the requeue delay for devices that are up to date,
    /// `short_wait` the delay after a create, update or pending delete.
    pub fn new(
        connector: Connector,
        store: Arc<dyn RecordStore>,
        poll_interval: Duration,
        short_wait: Duration,
    ) -> Self {
        Self {
            connector,
            store,
            poll_interval,
            short_wait,
            backoff_states: Mutex::new(HashMap::new()),
        }
    }

    /// Runs one tick for `device`.
    ///
    /// Failures are recorded in the `Synced` condition before being returned.
    pub async fn reconcile(&self, device: &Device) -> Result<ReconcileOutcome, ControllerError> {
        let mut device = device.clone();
        let key = backoff_key(&device);
        info!("Reconciling Device {}", key);

        match self.reconcile_device(&mut device).await {
            Ok(ReconcileOutcome::AwaitChange) => {
                self.reset_backoff(&key);
                Ok(ReconcileOutcome::AwaitChange)
            }
            Ok(outcome) => {
                device.set_conditions([Condition::reconcile_success()]);
                self.store
                    .update_status(&device)
                    .await
                    .map_err(ControllerError::ManagedUpdateFailed)?;
                self.reset_backoff(&key);
                Ok(outcome)
            }
            Err(e) => {
                device.set_conditions([Condition::reconcile_error(&e)]);
                if let Err(status_err) = self.store.update_status(&device).await {
                    warn!("Failed to record error on Device {}: {}", key, status_err);
                }
                Err(e)
            }
        }
    }

    /// Requeue delay after a failed tick; consecutive failures back off further
    pub fn error_backoff(&self, device: &Device) -> Duration {
        let key = backoff_key(device);
        let mut states = self
            .backoff_states
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        states
            .entry(key)
            .or_insert_with(|| FibonacciBackoff::new(BACKOFF_MIN, BACKOFF_MAX))
            .next_backoff()
    }

    fn reset_backoff(&self, key: &str) {
        let mut states = self
            .backoff_states
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(backoff) = states.get_mut(key) {
            backoff.reset();
        }
    }

    async fn reconcile_device(&self, device: &mut Device) -> Result<ReconcileOutcome, ControllerError> {
        if device.is_deleting() {
            return self.finalize(device).await;
        }

        if device.add_finalizer() {
            self.store
                .update_device(device)
                .await
                .map_err(ControllerError::ManagedUpdateFailed)?;
        }

        let external = self.connector.connect(device).await?;
        let observation = external.observe(device).await?;

        if !observation.resource_exists {
            external.create(device).await?;
            return Ok(ReconcileOutcome::Requeue(self.short_wait));
        }

        if !observation.resource_up_to_date {
            external.update(device).await?;
            return Ok(ReconcileOutcome::Requeue(self.short_wait));
        }

        debug!("Device {} is up to date", backoff_key(device));
        Ok(ReconcileOutcome::Requeue(self.poll_interval))
    }

    async fn finalize(&self, device: &mut Device) -> Result<ReconcileOutcome, ControllerError> {
        if !device.has_finalizer() {
            return Ok(ReconcileOutcome::AwaitChange);
        }

        if device.spec.reclaim_policy == ReclaimPolicy::Retain {
            info!("Retaining Packet device for Device {}", backoff_key(device));
            return self.release(device).await;
        }
        if device.external_name().is_none() {
            return self.release(device).await;
        }

        let external = self.connector.connect(device).await?;
        external.delete(device).await?;
        if external.observe(device).await?.resource_exists {
            device.set_conditions([Condition::deleting()]);
            debug!("Packet device for Device {} still exists", backoff_key(device));
            return Ok(ReconcileOutcome::Requeue(self.short_wait));
        }

        self.release(device).await
    }

    async fn release(&self, device: &mut Device) -> Result<ReconcileOutcome, ControllerError> {
        device.remove_finalizer();
        self.store
            .update_device(device)
            .await
            .map_err(ControllerError::ManagedUpdateFailed)?;
        info!("Released finalizer on Device {}", backoff_key(device));
        Ok(ReconcileOutcome::AwaitChange)
    }
}

fn backoff_key(device: &Device) -> String {
    match device_key(device) {
        Ok((namespace, name)) => format!("{namespace}/{name}"),
        Err(_) => "<unnamed>".to_string(),
    }
}
