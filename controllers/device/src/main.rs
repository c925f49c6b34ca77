//! Packet Device Controller
//!
//! Reconciles `Device` custom resources against bare-metal servers in the
//! Packet API. Credentials come from the `Provider` each device references.

mod backoff;
mod config;
mod connector;
mod controller;
mod conversion;
mod error;
mod external;
mod managed;
mod store;
mod watcher;

#[cfg(test)]
mod test_utils;

use crate::config::Config;
use crate::controller::Controller;
use crate::error::ControllerError;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    // kube and reqwest both use rustls; pick the ring provider before either starts
    let _ = rustls::crypto::ring::default_provider().install_default();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Packet Device Controller");

    let config = Config::from_env()?;
    info!("Configuration:");
    info!("  Packet API URL: {}", config.api_url);
    info!("  Namespace: {}", config.watch_namespace.as_deref().unwrap_or("all namespaces"));
    info!("  Poll interval: {}s", config.poll_interval.as_secs());
    info!("  Short wait: {}s", config.short_wait.as_secs());
    info!("  Concurrency: {}", config.concurrency);

    let controller = Controller::new(config).await?;
    controller.run().await?;

    Ok(())
}
