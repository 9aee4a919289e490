//! Device manager: picks device names and tracks in-flight attachments.
//!
//! The provider's block-device mapping lags behind attach calls that are
//! still running. The manager therefore merges the reported mapping with its
//! own in-flight reservations before every decision, and holds a single lock
//! across the read-merge-decide-write sequence so that two concurrent
//! requests for different volumes cannot pick the same free name.
//!
//! Reservations are only removed by a successful release. A process that
//! stops before releasing leaks the entry until restart; the merged view
//! heals once the provider reports the final state.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::allocator::{NameAllocator, SequentialNameAllocator};
use crate::config::{AllocatorConfig, ConfigError};
use crate::device::{Device, ReleaseOutcome};
use crate::error::DeviceError;
use crate::in_flight::InFlightAttachments;
use crate::instance::Instance;

/// Prefix expected on every device name reported by the provider.
const DEVICE_PATH_PREFIX: &str = "/dev/";

/// In-flight table shared between a manager and the handles it returns.
#[derive(Debug, Default)]
pub(crate) struct Reservations {
    in_flight: Mutex<InFlightAttachments>,
}

impl Reservations {
    /// Locks the table. The table only holds plain maps, so a panic in
    /// another holder cannot leave it half-updated and poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, InFlightAttachments> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clears the entry backing `device` if it still maps to its volume.
    pub(crate) fn release(&self, device: &Device) -> Result<ReleaseOutcome, DeviceError> {
        let mut in_flight = self.lock();

        let Some(existing) = in_flight.volume_for(device.instance_id(), device.path()) else {
            return Ok(ReleaseOutcome::NotInFlight);
        };

        // A delayed release can race with a fresh allocation that reused the
        // path once the provider reported it free.
        if existing != device.volume_id() {
            return Err(DeviceError::ReleaseMismatch {
                path: device.path().to_owned(),
                expected: device.volume_id().to_owned(),
                found: existing.to_owned(),
            });
        }

        info!(
            instance_id = device.instance_id(),
            path = device.path(),
            volume_id = device.volume_id(),
            "releasing in-flight attachment entry"
        );
        in_flight.remove(device.instance_id(), device.path());
        Ok(ReleaseOutcome::Released)
    }
}

/// Assigns device names to volumes and tracks in-flight attachments.
///
/// Cloning the manager shares its reservation table.
#[derive(Debug)]
pub struct DeviceManager<A: NameAllocator = SequentialNameAllocator> {
    allocator: Arc<A>,
    reservations: Arc<Reservations>,
}

impl<A: NameAllocator> Clone for DeviceManager<A> {
    fn clone(&self) -> Self {
        Self {
            allocator: Arc::clone(&self.allocator),
            reservations: Arc::clone(&self.reservations),
        }
    }
}

impl Default for DeviceManager {
    fn default() -> Self {
        Self::new(SequentialNameAllocator::default())
    }
}

impl DeviceManager {
    /// Builds a manager whose naming scheme comes from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration fails validation.
    pub fn from_config(config: &AllocatorConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.allocator()?))
    }
}

impl<A: NameAllocator> DeviceManager<A> {
    /// Creates a manager with an empty reservation table.
    #[must_use]
    pub fn new(allocator: A) -> Self {
        Self {
            allocator: Arc::new(allocator),
            reservations: Arc::new(Reservations::default()),
        }
    }

    /// Returns the device for `volume_id`, reserving a new name if the volume
    /// has none yet.
    ///
    /// When the volume already appears in the provider mapping or in the
    /// in-flight table the existing path is returned with
    /// [`Device::is_already_assigned`] set and nothing is reserved.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::InvalidInstance`] for a missing instance,
    /// [`DeviceError::MissingInstanceId`] for a blank identity,
    /// [`DeviceError::MissingVolumeId`] for a blank volume, and
    /// [`DeviceError::Exhausted`] when no device name is free.
    pub fn new_device(
        &self,
        instance: Option<&Instance>,
        volume_id: &str,
    ) -> Result<Device, DeviceError> {
        let mut in_flight = self.reservations.lock();

        let (snapshot, instance_id) = resolve(instance, volume_id)?;

        let in_use = names_in_use(&in_flight, snapshot, instance_id);
        if let Some(path) = path_for(&in_use, volume_id) {
            return Ok(self.device(snapshot, instance_id, volume_id, path, true));
        }

        let name =
            self.allocator
                .next_free(&in_use)
                .map_err(|source| DeviceError::Exhausted {
                    instance_id: instance_id.to_owned(),
                    source,
                })?;

        in_flight.add(instance_id, volume_id, &name);
        info!(
            instance_id,
            volume_id,
            path = name.as_str(),
            "reserved device name"
        );

        Ok(self.device(snapshot, instance_id, volume_id, name, false))
    }

    /// Looks up the device already assigned to `volume_id` without reserving
    /// anything.
    ///
    /// The returned handle has an empty path when the volume has no device.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::InvalidInstance`] for a missing instance,
    /// [`DeviceError::MissingInstanceId`] for a blank identity, and
    /// [`DeviceError::MissingVolumeId`] for a blank volume.
    pub fn get_device(
        &self,
        instance: Option<&Instance>,
        volume_id: &str,
    ) -> Result<Device, DeviceError> {
        let in_flight = self.reservations.lock();

        let (snapshot, instance_id) = resolve(instance, volume_id)?;

        let in_use = names_in_use(&in_flight, snapshot, instance_id);
        Ok(match path_for(&in_use, volume_id) {
            Some(path) => self.device(snapshot, instance_id, volume_id, path, true),
            None => self.device(snapshot, instance_id, volume_id, String::new(), false),
        })
    }

    /// Releases `device`, which must have been created by this manager (or a
    /// clone of it).
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::ForeignDevice`] for a handle created by another
    /// manager and [`DeviceError::ReleaseMismatch`] when the device path is
    /// now reserved for another volume.
    pub fn release(&self, device: &Device, force: bool) -> Result<ReleaseOutcome, DeviceError> {
        if !device.is_backed_by(&self.reservations) {
            return Err(DeviceError::ForeignDevice {
                path: device.path().to_owned(),
                volume_id: device.volume_id().to_owned(),
            });
        }
        device.release(force)
    }

    /// Returns a copy of the in-flight reservations for one instance.
    #[must_use]
    pub fn in_flight_snapshot(&self, instance_id: &str) -> BTreeMap<String, String> {
        self.reservations.lock().names_in_use(instance_id)
    }

    fn device(
        &self,
        instance: &Instance,
        instance_id: &str,
        volume_id: &str,
        path: String,
        is_already_assigned: bool,
    ) -> Device {
        Device::new(
            instance,
            instance_id,
            volume_id,
            path,
            is_already_assigned,
            Arc::clone(&self.reservations),
        )
    }
}

/// Validates the request arguments shared by `new_device` and `get_device`.
fn resolve<'a>(
    instance: Option<&'a Instance>,
    volume_id: &str,
) -> Result<(&'a Instance, &'a str), DeviceError> {
    let snapshot = instance.ok_or(DeviceError::InvalidInstance)?;
    let instance_id = snapshot.id()?;
    if volume_id.trim().is_empty() {
        return Err(DeviceError::MissingVolumeId);
    }
    Ok((snapshot, instance_id))
}

/// Merges the provider mapping with in-flight reservations for one instance.
/// In-flight entries win: they are the most recent decision of this process.
fn names_in_use(
    in_flight: &InFlightAttachments,
    instance: &Instance,
    instance_id: &str,
) -> BTreeMap<String, String> {
    let mut in_use = BTreeMap::new();
    for mapping in &instance.block_device_mappings {
        if !mapping.device_name.starts_with(DEVICE_PATH_PREFIX) {
            warn!(
                instance_id,
                device_name = mapping.device_name.as_str(),
                "unexpected device name in block device mapping"
            );
        }
        in_use.insert(mapping.device_name.clone(), mapping.volume_id.clone());
    }
    debug!(instance_id, ?in_use, "device names reported by provider");

    in_use.extend(in_flight.names_in_use(instance_id));
    debug!(instance_id, ?in_use, "device names after merging in-flight");

    in_use
}

fn path_for(in_use: &BTreeMap<String, String>, volume_id: &str) -> Option<String> {
    in_use
        .iter()
        .find(|(_, volume)| volume.as_str() == volume_id)
        .map(|(name, _)| name.clone())
}
