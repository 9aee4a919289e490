//! Test support utilities shared across unit and integration tests.

use std::collections::BTreeSet;
use std::env;
use std::ffi::OsString;

use tokio::sync::{Mutex, MutexGuard};

use crate::config::AllocatorConfig;
use crate::instance::Instance;

/// Instance identifier used by fixtures.
pub const TEST_INSTANCE_ID: &str = "i-0123456789";

/// Device reported for the boot disk of fixture instances.
pub const ROOT_DEVICE: &str = "/dev/sda";

/// Builds an instance that only reports its boot disk.
#[must_use]
pub fn booted_instance(instance_id: &str) -> Instance {
    Instance::new(instance_id).with_device(ROOT_DEVICE, format!("{instance_id}-root"))
}

/// Builds an instance reporting the given `(device, volume)` pairs in
/// addition to its boot disk.
#[must_use]
pub fn instance_with_devices(instance_id: &str, devices: &[(&str, &str)]) -> Instance {
    devices
        .iter()
        .fold(booted_instance(instance_id), |instance, (device, volume)| {
            instance.with_device(*device, *volume)
        })
}

/// Configuration matching the built-in defaults.
#[must_use]
pub fn default_config() -> AllocatorConfig {
    AllocatorConfig {
        device_prefix: String::from("/dev/sd"),
        first_suffix: String::from("b"),
        last_suffix: String::from("z"),
    }
}

/// Renders an instance snapshot as the JSON document read by
/// [`crate::load_instance`].
///
/// # Errors
///
/// Returns the serialiser error when the instance cannot be rendered.
pub fn instance_json(instance: &Instance) -> serde_json::Result<String> {
    serde_json::to_string(instance)
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: Mutex<()> = Mutex::const_new(());

/// Guard that holds the env mutex and cleans up variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets multiple environment variables while holding a global mutex.
    pub async fn set_vars(pairs: &[(&str, &str)]) -> Self {
        debug_assert!(
            {
                let mut seen = BTreeSet::new();
                pairs.iter().all(|(key, _)| seen.insert(*key))
            },
            "duplicate environment variable keys passed to EnvGuard::set_vars"
        );

        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let old = env::var_os(key);
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe { env::set_var(key, value) };
            previous.push(((*key).to_owned(), old));
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}
