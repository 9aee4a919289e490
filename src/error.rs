//! Error types for device allocation and release.

use thiserror::Error;

use crate::allocator::AllocatorError;

/// Errors raised by the [`crate::DeviceManager`] and device handles.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum DeviceError {
    /// Raised when no instance descriptor was supplied.
    #[error("invalid instance: instance is missing")]
    InvalidInstance,
    /// Raised when the instance descriptor carries a blank identity.
    #[error("can't get ID from instance: identifier is empty")]
    MissingInstanceId,
    /// Raised when the requested volume identifier is blank.
    #[error("invalid volume: volume ID is empty")]
    MissingVolumeId,
    /// Raised when every device name in the naming scheme is in use.
    #[error("could not get a free device name to assign to node {instance_id}: {source}")]
    Exhausted {
        /// Instance that ran out of device names.
        instance_id: String,
        /// Allocator failure that triggered the error.
        source: AllocatorError,
    },
    /// Raised when the in-flight entry at a path belongs to another volume.
    #[error("release on device {path:?} assigned to different volume: {expected:?} vs {found:?}")]
    ReleaseMismatch {
        /// Device path being released.
        path: String,
        /// Volume the releasing handle was created for.
        expected: String,
        /// Volume currently recorded at the path.
        found: String,
    },
    /// Raised when a handle is released through a manager that did not
    /// create it.
    #[error("device {path:?} for volume {volume_id:?} belongs to another device manager")]
    ForeignDevice {
        /// Device path carried by the handle.
        path: String,
        /// Volume the handle was created for.
        volume_id: String,
    },
}
