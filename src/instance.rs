//! Provider-reported instance state consumed by the device manager.

use serde::{Deserialize, Serialize};

use crate::error::DeviceError;

/// One device slot the provider reports as attached.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct BlockDeviceMapping {
    /// OS device name (for example `/dev/sdb`).
    pub device_name: String,
    /// Identifier of the volume occupying the slot.
    pub volume_id: String,
}

/// Snapshot of a compute instance as described by the cloud API.
///
/// The snapshot is treated as immutable for the duration of one manager
/// call; the manager never refreshes it.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Instance {
    /// Provider specific instance identifier.
    pub instance_id: String,
    /// Block devices currently attached according to the provider.
    #[serde(default)]
    pub block_device_mappings: Vec<BlockDeviceMapping>,
}

impl Instance {
    /// Creates an instance snapshot with no attached devices.
    #[must_use]
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            block_device_mappings: Vec::new(),
        }
    }

    /// Adds a reported `device_name -> volume_id` mapping.
    #[must_use]
    pub fn with_device(
        mut self,
        device_name: impl Into<String>,
        volume_id: impl Into<String>,
    ) -> Self {
        self.block_device_mappings.push(BlockDeviceMapping {
            device_name: device_name.into(),
            volume_id: volume_id.into(),
        });
        self
    }

    /// Resolves the instance identity used to key reservations.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::MissingInstanceId`] when the identifier is blank.
    pub fn id(&self) -> Result<&str, DeviceError> {
        let id = self.instance_id.trim();
        if id.is_empty() {
            return Err(DeviceError::MissingInstanceId);
        }
        Ok(id)
    }
}
