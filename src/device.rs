//! Device handles returned by the [`crate::DeviceManager`].

use std::sync::Arc;

use tracing::error;

use crate::error::DeviceError;
use crate::instance::Instance;
use crate::manager::Reservations;

/// Result of a release that did not fail.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReleaseOutcome {
    /// The in-flight entry for the handle was removed.
    Released,
    /// No in-flight entry exists at the handle's path; nothing to do.
    NotInFlight,
    /// The handle is tainted and the release was not forced.
    SkippedTainted,
}

/// A device slot assigned (or looked up) for one volume on one instance.
///
/// Handles keep a reference to the reservation ledger of the manager that
/// created them, so [`Device::release`] always clears the entry in that
/// manager and no other.
#[derive(Debug)]
pub struct Device {
    instance: Instance,
    instance_id: String,
    volume_id: String,
    path: String,
    is_already_assigned: bool,
    tainted: bool,
    reservations: Arc<Reservations>,
}

impl Device {
    pub(crate) fn new(
        instance: &Instance,
        instance_id: &str,
        volume_id: &str,
        path: String,
        is_already_assigned: bool,
        reservations: Arc<Reservations>,
    ) -> Self {
        Self {
            instance: instance.clone(),
            instance_id: instance_id.to_owned(),
            volume_id: volume_id.to_owned(),
            path,
            is_already_assigned,
            tainted: false,
            reservations,
        }
    }

    /// Instance snapshot the handle was created from.
    #[must_use]
    pub const fn instance(&self) -> &Instance {
        &self.instance
    }

    /// Resolved identity of the owning instance.
    #[must_use]
    pub const fn instance_id(&self) -> &str {
        self.instance_id.as_str()
    }

    /// Volume the handle was requested for.
    #[must_use]
    pub const fn volume_id(&self) -> &str {
        self.volume_id.as_str()
    }

    /// Assigned device path, empty when nothing is assigned.
    #[must_use]
    pub const fn path(&self) -> &str {
        self.path.as_str()
    }

    /// Whether the volume already had a device (attached or in flight)
    /// before this call; when `true` no attach call is needed.
    #[must_use]
    pub const fn is_already_assigned(&self) -> bool {
        self.is_already_assigned
    }

    /// Whether [`Device::taint`] has been called.
    #[must_use]
    pub const fn is_tainted(&self) -> bool {
        self.tainted
    }

    /// Marks the handle so that non-forced releases leave its reservation
    /// in place. Used when the outcome of the attach or detach is unknown.
    pub const fn taint(&mut self) {
        self.tainted = true;
    }

    /// Whether the handle was created by the manager owning `reservations`.
    pub(crate) fn is_backed_by(&self, reservations: &Arc<Reservations>) -> bool {
        Arc::ptr_eq(&self.reservations, reservations)
    }

    /// Releases the in-flight reservation backing this handle.
    ///
    /// A tainted handle is skipped unless `force` is set.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::ReleaseMismatch`] when the path has since been
    /// reserved for a different volume; that reservation is left untouched.
    pub fn release(&self, force: bool) -> Result<ReleaseOutcome, DeviceError> {
        if self.tainted && !force {
            return Ok(ReleaseOutcome::SkippedTainted);
        }
        self.reservations.release(self)
    }

    /// Releases the reservation, logging instead of returning any error.
    ///
    /// Attach and detach workflows call this once the cloud API call has
    /// finished: a failed release must not fail the surrounding workflow.
    pub fn release_logged(&self, force: bool) -> Option<ReleaseOutcome> {
        match self.release(force) {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                error!(
                    instance_id = %self.instance_id,
                    volume_id = %self.volume_id,
                    path = %self.path,
                    "error releasing device: {err}"
                );
                None
            }
        }
    }
}
