//! BDD scenarios for device allocation.

use rstest_bdd_macros::scenario;

use super::test_helpers::{AllocationContext, allocation_context};

#[scenario(
    path = "tests/features/device_allocation.feature",
    name = "Allocate the next free device name"
)]
fn scenario_allocate_next_free(allocation_context: AllocationContext) {
    let _ = allocation_context;
}

#[scenario(
    path = "tests/features/device_allocation.feature",
    name = "Return the existing device for an attached volume"
)]
fn scenario_existing_device(allocation_context: AllocationContext) {
    let _ = allocation_context;
}

#[scenario(
    path = "tests/features/device_allocation.feature",
    name = "Release clears the reservation"
)]
fn scenario_release_clears(allocation_context: AllocationContext) {
    let _ = allocation_context;
}

#[scenario(
    path = "tests/features/device_allocation.feature",
    name = "A stale release does not clear a newer reservation"
)]
fn scenario_stale_release(allocation_context: AllocationContext) {
    let _ = allocation_context;
}

#[scenario(
    path = "tests/features/device_allocation.feature",
    name = "A tainted device is only released when forced"
)]
fn scenario_tainted_release(allocation_context: AllocationContext) {
    let _ = allocation_context;
}

#[scenario(
    path = "tests/features/device_allocation.feature",
    name = "Report exhaustion when every device name is taken"
)]
fn scenario_exhaustion(allocation_context: AllocationContext) {
    let _ = allocation_context;
}
