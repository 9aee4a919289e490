//! BDD step definitions for device allocation behaviour.

use blockdev_alloc::test_support::booted_instance;
use blockdev_alloc::{DeviceError, DeviceManager, ReleaseOutcome};
use rstest_bdd_macros::{given, then, when};

use super::test_helpers::{AllocationContext, ReleaseRecord, manager_with_suffixes};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[given("a device manager with the default naming scheme")]
fn default_manager(allocation_context: &AllocationContext) {
    *allocation_context.manager.borrow_mut() = DeviceManager::default();
}

#[given("a device manager using suffixes \"{first}\" to \"{last}\"")]
fn limited_manager(allocation_context: &AllocationContext, first: String, last: String) {
    *allocation_context.manager.borrow_mut() = manager_with_suffixes(first.trim(), last.trim());
}

#[given("an instance \"{instance_id}\" with its boot disk attached")]
fn booted(allocation_context: &AllocationContext, instance_id: String) {
    *allocation_context.instance.borrow_mut() = Some(booted_instance(instance_id.trim()));
}

#[given("the provider reports volume \"{volume}\" at \"{device}\"")]
fn provider_reports(allocation_context: &AllocationContext, volume: String, device: String) {
    let mut slot = allocation_context.instance.borrow_mut();
    let Some(instance) = slot.take() else {
        panic!("test setup requires an instance");
    };
    *slot = Some(instance.with_device(device, volume));
}

#[when("I request a device for volume \"{volume}\"")]
fn request_device(allocation_context: &AllocationContext, volume: String) {
    let result = allocation_context
        .manager
        .borrow()
        .new_device(allocation_context.instance.borrow().as_ref(), &volume);
    match result {
        Ok(device) => {
            allocation_context.devices.borrow_mut().insert(volume, device);
        }
        Err(err) => *allocation_context.request_error.borrow_mut() = Some(err),
    }
}

#[when("I release the device for volume \"{volume}\"")]
fn release_device(allocation_context: &AllocationContext, volume: String) {
    let result = allocation_context.with_device(&volume, |device| device.release(false));
    allocation_context.record_release(result);
}

#[when("I force release the device for volume \"{volume}\"")]
fn force_release_device(allocation_context: &AllocationContext, volume: String) {
    let result = allocation_context.with_device(&volume, |device| device.release(true));
    allocation_context.record_release(result);
}

#[when("I taint the device for volume \"{volume}\"")]
fn taint_device(allocation_context: &AllocationContext, volume: String) {
    allocation_context.with_device(&volume, |device| device.taint());
}

#[when("I look up volume \"{volume}\"")]
fn look_up(allocation_context: &AllocationContext, volume: String) {
    let device = allocation_context
        .manager
        .borrow()
        .get_device(allocation_context.instance.borrow().as_ref(), &volume)
        .unwrap_or_else(|err| panic!("lookup should succeed: {err}"));
    allocation_context.lookups.borrow_mut().insert(volume, device);
}

#[then("volume \"{volume}\" is assigned \"{device}\"")]
fn assigned(
    allocation_context: &AllocationContext,
    volume: String,
    device: String,
) -> Result<(), StepError> {
    let path = allocation_context.with_device(&volume, |handle| handle.path().to_owned());
    if path == device {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {volume} at {device}, got {path:?}"
        )))
    }
}

#[then("volume \"{volume}\" was newly reserved")]
fn newly_reserved(allocation_context: &AllocationContext, volume: String) -> Result<(), StepError> {
    if allocation_context.with_device(&volume, |device| device.is_already_assigned()) {
        return Err(StepError::Assertion(format!(
            "expected {volume} to be newly reserved"
        )));
    }
    Ok(())
}

#[then("volume \"{volume}\" was already assigned")]
fn already_assigned(
    allocation_context: &AllocationContext,
    volume: String,
) -> Result<(), StepError> {
    if allocation_context.with_device(&volume, |device| device.is_already_assigned()) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {volume} to be already assigned"
        )))
    }
}

#[then("the lookup for volume \"{volume}\" finds no device")]
fn lookup_finds_nothing(
    allocation_context: &AllocationContext,
    volume: String,
) -> Result<(), StepError> {
    let lookups = allocation_context.lookups.borrow();
    let Some(lookup) = lookups.get(&volume) else {
        return Err(StepError::Assertion(format!("missing lookup for {volume}")));
    };
    if lookup.path().is_empty() && !lookup.is_already_assigned() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected no device for {volume}, got {:?}",
            lookup.path()
        )))
    }
}

#[then("the release succeeds")]
fn release_succeeds(allocation_context: &AllocationContext) -> Result<(), StepError> {
    match *allocation_context.last_release.borrow() {
        Some(ReleaseRecord::Completed(ReleaseOutcome::Released)) => Ok(()),
        ref other => Err(StepError::Assertion(format!(
            "expected a successful release, got {other:?}"
        ))),
    }
}

#[then("the release reports a mismatch")]
fn release_mismatch(allocation_context: &AllocationContext) -> Result<(), StepError> {
    match *allocation_context.last_release.borrow() {
        Some(ReleaseRecord::Failed(DeviceError::ReleaseMismatch { .. })) => Ok(()),
        ref other => Err(StepError::Assertion(format!(
            "expected a release mismatch, got {other:?}"
        ))),
    }
}

#[then("\"{device}\" is reserved for volume \"{volume}\"")]
fn reserved_for(
    allocation_context: &AllocationContext,
    device: String,
    volume: String,
) -> Result<(), StepError> {
    let reservations = allocation_context
        .manager
        .borrow()
        .in_flight_snapshot(&allocation_context.instance_id());
    match reservations.get(&device) {
        Some(found) if *found == volume => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected {device} reserved for {volume}, got {other:?}"
        ))),
    }
}

#[then("no device is reserved")]
fn nothing_reserved(allocation_context: &AllocationContext) -> Result<(), StepError> {
    let reservations = allocation_context
        .manager
        .borrow()
        .in_flight_snapshot(&allocation_context.instance_id());
    if reservations.is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected no reservations, got {reservations:?}"
        )))
    }
}

#[then("the request fails because no device name is free")]
fn request_exhausted(allocation_context: &AllocationContext) -> Result<(), StepError> {
    match *allocation_context.request_error.borrow() {
        Some(DeviceError::Exhausted { .. }) => Ok(()),
        ref other => Err(StepError::Assertion(format!(
            "expected an exhaustion error, got {other:?}"
        ))),
    }
}
