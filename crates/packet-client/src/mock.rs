//! Mock PacketClient for unit testing
//!
//! This module provides an in-memory implementation of `DeviceService` that can be
//! used in unit tests without talking to the Packet API. Failures can be injected
//! per operation and every call is counted.

use crate::device_trait::DeviceService;
use crate::error::PacketError;
use crate::models::*;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Device operation, used for failure injection and call counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Get,
    Create,
    Update,
    Delete,
}

/// Mock PacketClient for testing
///
/// Clones share state, so a test can keep a handle while the controller owns another.
#[derive(Debug, Clone, Default)]
pub struct MockPacketClient {
    devices: Arc<Mutex<HashMap<String, Device>>>,
    next_ids: Arc<Mutex<VecDeque<String>>>,
    failures: Arc<Mutex<HashMap<Operation, String>>>,
    calls: Arc<Mutex<HashMap<Operation, usize>>>,
    last_update: Arc<Mutex<Option<(String, DeviceUpdateRequest)>>>,
}

impl MockPacketClient {
    /// Create a new mock client
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device to the mock store (for test setup)
    pub fn add_device(&self, device: Device) {
        self.devices.lock().unwrap().insert(device.id.clone(), device);
    }

    /// Remove a device behind the controller's back (for drift tests)
    pub fn remove_device(&self, id: &str) -> Option<Device> {
        self.devices.lock().unwrap().remove(id)
    }

    /// Current copy of a device
    pub fn device(&self, id: &str) -> Option<Device> {
        self.devices.lock().unwrap().get(id).cloned()
    }

    /// Number of devices in the mock store
    pub fn device_count(&self) -> usize {
        self.devices.lock().unwrap().len()
    }

    /// Mutates a stored device in place (e.g., to advance its state)
    pub fn modify_device(&self, id: &str, f: impl FnOnce(&mut Device)) {
        if let Some(device) = self.devices.lock().unwrap().get_mut(id) {
            f(device);
        }
    }

    /// ID assigned to the next created device instead of a random UUID
    pub fn push_next_id(&self, id: impl Into<String>) {
        self.next_ids.lock().unwrap().push_back(id.into());
    }

    /// Makes every call of `operation` fail with `PacketError::Api(message)`
    pub fn fail(&self, operation: Operation, message: impl Into<String>) {
        self.failures.lock().unwrap().insert(operation, message.into());
    }

    /// Clears an injected failure
    pub fn clear_failure(&self, operation: Operation) {
        self.failures.lock().unwrap().remove(&operation);
    }

    /// Number of calls made for `operation`
    pub fn calls(&self, operation: Operation) -> usize {
        self.calls.lock().unwrap().get(&operation).copied().unwrap_or(0)
    }

    /// The last update request received, with its device ID
    pub fn last_update(&self) -> Option<(String, DeviceUpdateRequest)> {
        self.last_update.lock().unwrap().clone()
    }

    fn record(&self, operation: Operation) -> Result<(), PacketError> {
        *self.calls.lock().unwrap().entry(operation).or_insert(0) += 1;
        match self.failures.lock().unwrap().get(&operation) {
            Some(message) => Err(PacketError::Api(message.clone())),
            None => Ok(()),
        }
    }

    fn next_id(&self) -> String {
        self.next_ids
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait::async_trait]
impl DeviceService for MockPacketClient {
    async fn get_device(&self, id: &str) -> Result<Device, PacketError> {
        self.record(Operation::Get)?;
        self.device(id)
            .ok_or_else(|| PacketError::NotFound(format!("Device {} not found", id)))
    }

    async fn create_device(&self, request: &DeviceCreateRequest) -> Result<Device, PacketError> {
        self.record(Operation::Create)?;
        let id = self.next_id();
        let device = Device {
            id: id.clone(),
            href: format!("/devices/{}", id),
            hostname: request.hostname.clone().unwrap_or_else(|| format!("device-{}", id)),
            state: "queued".to_string(),
            network: Vec::new(),
            provisioning_percentage: Some(0.0),
            plan: Some(Plan { id: None, slug: request.plan.clone() }),
            facility: request.facility.first().map(|code| Facility { id: None, code: code.clone() }),
            operating_system: Some(OperatingSystem { id: None, slug: request.operating_system.clone() }),
            billing_cycle: Some(request.billing_cycle.clone()),
            userdata: request.userdata.clone(),
            tags: request.tags.clone(),
            locked: request.locked,
            ipxe_script_url: request.ipxe_script_url.clone(),
            always_pxe: request.always_pxe,
        };
        self.add_device(device.clone());
        Ok(device)
    }

    async fn update_device(&self, id: &str, request: &DeviceUpdateRequest) -> Result<Device, PacketError> {
        self.record(Operation::Update)?;
        *self.last_update.lock().unwrap() = Some((id.to_string(), request.clone()));

        let mut devices = self.devices.lock().unwrap();
        let device = devices
            .get_mut(id)
            .ok_or_else(|| PacketError::NotFound(format!("Device {} not found", id)))?;
        if let Some(hostname) = &request.hostname {
            device.hostname = hostname.clone();
        }
        if let Some(userdata) = &request.userdata {
            device.userdata = Some(userdata.clone());
        }
        if let Some(locked) = request.locked {
            device.locked = locked;
        }
        if let Some(tags) = &request.tags {
            device.tags = tags.clone();
        }
        if let Some(url) = &request.ipxe_script_url {
            device.ipxe_script_url = Some(url.clone());
        }
        if let Some(always_pxe) = request.always_pxe {
            device.always_pxe = always_pxe;
        }
        Ok(device.clone())
    }

    async fn delete_device(&self, id: &str) -> Result<(), PacketError> {
        self.record(Operation::Delete)?;
        self.remove_device(id)
            .map(|_| ())
            .ok_or_else(|| PacketError::NotFound(format!("Device {} not found", id)))
    }
}
