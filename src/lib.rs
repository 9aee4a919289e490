//! Device-name allocation core for a block-storage attach driver.
//!
//! The crate decides which OS device slot a cloud volume should occupy on an
//! instance, keeps concurrent attach requests from colliding on the same
//! slot, and reconciles its in-flight reservations with the (lagging)
//! block-device mapping reported by the cloud provider. It performs no
//! network calls: callers hand in an already-resolved [`Instance`] snapshot.

pub mod allocator;
pub mod config;
pub mod device;
pub mod error;
pub mod in_flight;
pub mod instance;
pub mod manager;
pub mod snapshot;
pub mod test_support;

pub use allocator::{AllocatorError, NameAllocator, SequentialNameAllocator};
pub use config::{AllocatorConfig, ConfigError};
pub use device::{Device, ReleaseOutcome};
pub use error::DeviceError;
pub use in_flight::InFlightAttachments;
pub use instance::{BlockDeviceMapping, Instance};
pub use manager::DeviceManager;
pub use snapshot::{SnapshotError, load_instance};
