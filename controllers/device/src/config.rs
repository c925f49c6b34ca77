//! Controller configuration, read once from the environment at start-up.

use crate::error::ControllerError;
use packet_client::DEFAULT_API_URL;
use std::time::Duration;

const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
const DEFAULT_SHORT_WAIT_SECS: u64 = 30;
const DEFAULT_CONCURRENCY: u16 = 3;

/// Device controller settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Packet API base URL (`PACKET_API_URL`)
    pub api_url: String,
    /// Namespace to watch, all namespaces when unset (`WATCH_NAMESPACE`)
    pub watch_namespace: Option<String>,
    /// Requeue delay for devices that are up to date (`POLL_INTERVAL_SECS`)
    pub poll_interval: Duration,
    /// Requeue delay after a create, update or pending delete (`SHORT_WAIT_SECS`)
    pub short_wait: Duration,
    /// Maximum concurrent reconciliations (`CONTROLLER_CONCURRENCY`)
    pub concurrency: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            watch_namespace: None,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            short_wait: Duration::from_secs(DEFAULT_SHORT_WAIT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`; unset and empty values take defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ControllerError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let poll_interval = match get("POLL_INTERVAL_SECS") {
            Some(v) => Duration::from_secs(parse_positive("POLL_INTERVAL_SECS", &v)?),
            None => defaults.poll_interval,
        };
        let short_wait = match get("SHORT_WAIT_SECS") {
            Some(v) => Duration::from_secs(parse_positive("SHORT_WAIT_SECS", &v)?),
            None => defaults.short_wait,
        };
        let concurrency = match get("CONTROLLER_CONCURRENCY") {
            Some(v) => u16::try_from(parse_positive("CONTROLLER_CONCURRENCY", &v)?).map_err(|_| {
                ControllerError::InvalidConfig(format!("CONTROLLER_CONCURRENCY out of range: {v}"))
            })?,
            None => defaults.concurrency,
        };

        Ok(Self {
            api_url: get("PACKET_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            watch_namespace: get("WATCH_NAMESPACE"),
            poll_interval,
            short_wait,
            concurrency,
        })
    }
}

fn parse_positive(key: &str, value: &str) -> Result<u64, ControllerError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ControllerError::InvalidConfig(format!(
            "{key} must be a positive integer, got {value:?}"
        ))),
    }
}
