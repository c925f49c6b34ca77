//! Kubernetes resource watcher.
//!
//! Drives `ManagedReconciler` from a `kube_runtime::Controller`, which handles
//! reconnection and guarantees a device is never reconciled concurrently with
//! itself.

use crate::error::ControllerError;
use crate::managed::{ManagedReconciler, ReconcileOutcome};
use crds::Device;
use futures::StreamExt;
use kube::Api;
use kube_runtime::{Controller, controller::{Action, Config as ControllerConfig}, watcher};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

async fn reconcile(device: Arc<Device>, ctx: Arc<ManagedReconciler>) -> Result<Action, ControllerError> {
    match ctx.reconcile(&device).await? {
        ReconcileOutcome::Requeue(after) => Ok(Action::requeue(after)),
        ReconcileOutcome::AwaitChange => Ok(Action::await_change()),
    }
}

fn error_policy(device: Arc<Device>, error: &ControllerError, ctx: Arc<ManagedReconciler>) -> Action {
    let backoff = ctx.error_backoff(&device);
    error!(
        "Reconciliation error for Device {}/{}: {} (retrying in {}s)",
        device.metadata.namespace.as_deref().unwrap_or("default"),
        device.metadata.name.as_deref().unwrap_or_default(),
        error,
        backoff.as_secs()
    );
    Action::requeue(backoff)
}

/// Watches `Device` resources until the watch stream ends.
///
/// Debounce batches bursts of events (our own status patches included) into a
/// single reconciliation.
pub async fn watch_devices(
    api: Api<Device>,
    reconciler: Arc<ManagedReconciler>,
    concurrency: u16,
) -> Result<(), ControllerError> {
    info!("Starting Device watcher (concurrency {})", concurrency);

    let controller_config = ControllerConfig::default()
        .debounce(Duration::from_secs(5))
        .concurrency(concurrency);

    Controller::new(api, watcher::Config::default())
        .with_config(controller_config)
        .run(reconcile, error_policy, reconciler)
        .for_each(|res| async move {
            match res {
                Ok((object, _)) => debug!("Reconciled Device {}", object),
                Err(e) => error!("Device controller error: {}", e),
            }
        })
        .await;

    Ok(())
}
