//! Shared fixtures and helpers for device allocation BDD scenarios.

use std::cell::RefCell;
use std::collections::HashMap;

use blockdev_alloc::{AllocatorConfig, Device, DeviceError, DeviceManager, Instance, ReleaseOutcome};
use rstest::fixture;

/// Outcome of the most recent release step.
#[derive(Clone, Debug)]
pub enum ReleaseRecord {
    Completed(ReleaseOutcome),
    Failed(DeviceError),
}

#[derive(Debug)]
pub struct AllocationContext {
    pub manager: RefCell<DeviceManager>,
    pub instance: RefCell<Option<Instance>>,
    pub devices: RefCell<HashMap<String, Device>>,
    pub lookups: RefCell<HashMap<String, Device>>,
    pub request_error: RefCell<Option<DeviceError>>,
    pub last_release: RefCell<Option<ReleaseRecord>>,
}

impl AllocationContext {
    pub fn instance_id(&self) -> String {
        self.instance
            .borrow()
            .as_ref()
            .map(|instance| instance.instance_id.clone())
            .unwrap_or_else(|| panic!("test setup requires an instance"))
    }

    /// Runs `action` against the device requested for `volume`.
    pub fn with_device<R>(&self, volume: &str, action: impl FnOnce(&mut Device) -> R) -> R {
        let mut devices = self.devices.borrow_mut();
        let device = devices
            .get_mut(volume)
            .unwrap_or_else(|| panic!("no device requested for volume {volume}"));
        action(device)
    }

    pub fn record_release(&self, result: Result<ReleaseOutcome, DeviceError>) {
        let record = match result {
            Ok(outcome) => ReleaseRecord::Completed(outcome),
            Err(err) => ReleaseRecord::Failed(err),
        };
        *self.last_release.borrow_mut() = Some(record);
    }
}

#[fixture]
pub fn allocation_context() -> AllocationContext {
    AllocationContext {
        manager: RefCell::new(DeviceManager::default()),
        instance: RefCell::new(None),
        devices: RefCell::new(HashMap::new()),
        lookups: RefCell::new(HashMap::new()),
        request_error: RefCell::new(None),
        last_release: RefCell::new(None),
    }
}

pub fn manager_with_suffixes(first: &str, last: &str) -> DeviceManager {
    let config = AllocatorConfig {
        device_prefix: String::from("/dev/sd"),
        first_suffix: first.to_owned(),
        last_suffix: last.to_owned(),
    };
    DeviceManager::from_config(&config)
        .unwrap_or_else(|err| panic!("allocator config should be valid: {err}"))
}
