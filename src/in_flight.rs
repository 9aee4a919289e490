//! Bookkeeping for device names handed out but not yet released.
//!
//! The table maps `instance id -> device name -> volume id`. It holds no lock
//! of its own; [`crate::DeviceManager`] guards every call with its mutex.

use std::collections::{BTreeMap, HashMap};

/// Reservations made by this process that the provider may not report yet.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct InFlightAttachments {
    by_instance: HashMap<String, BTreeMap<String, String>>,
}

impl InFlightAttachments {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `device_name -> volume_id` for the instance, replacing any
    /// previous entry at that name.
    pub fn add(&mut self, instance_id: &str, volume_id: &str, device_name: &str) {
        self.by_instance
            .entry(instance_id.to_owned())
            .or_default()
            .insert(device_name.to_owned(), volume_id.to_owned());
    }

    /// Removes the entry at `device_name`; absent entries are ignored.
    pub fn remove(&mut self, instance_id: &str, device_name: &str) {
        let Some(names) = self.by_instance.get_mut(instance_id) else {
            return;
        };
        names.remove(device_name);
        if names.is_empty() {
            self.by_instance.remove(instance_id);
        }
    }

    /// Returns a copy of the reservations held for the instance.
    #[must_use]
    pub fn names_in_use(&self, instance_id: &str) -> BTreeMap<String, String> {
        self.by_instance
            .get(instance_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the volume reserved at `device_name`, if any.
    #[must_use]
    pub fn volume_for(&self, instance_id: &str, device_name: &str) -> Option<&str> {
        self.by_instance
            .get(instance_id)
            .and_then(|names| names.get(device_name))
            .map(String::as_str)
    }

    /// Returns `true` when no reservation is held for any instance.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_instance.is_empty()
    }
}
