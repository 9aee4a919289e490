//! Command-line interface definitions for the `blockdev-alloc` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::Parser;

/// Top-level CLI for the `blockdev-alloc` binary.
#[derive(Debug, Parser)]
#[command(
    name = "blockdev-alloc",
    about = "Preview block device name allocation for cloud volumes",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Allocate device names for volumes against an instance snapshot.
    #[command(
        name = "plan",
        about = "Allocate device names for volumes against an instance snapshot"
    )]
    Plan(PlanCommand),
    /// Show the device currently assigned to a volume.
    #[command(name = "lookup", about = "Show the device currently assigned to a volume")]
    Lookup(LookupCommand),
    /// Print version information as JSON.
    #[command(name = "version", about = "Print version information as JSON")]
    Version,
}

/// Arguments for the `blockdev-alloc plan` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct PlanCommand {
    /// Path to a JSON instance snapshot (`instance_id` plus
    /// `block_device_mappings`).
    #[arg(long, value_name = "PATH")]
    pub(crate) instance: String,
    /// Volume to allocate a device for. Repeat to plan several attachments;
    /// volumes are allocated in the order given.
    #[arg(long = "volume", value_name = "VOLUME_ID", required = true)]
    pub(crate) volumes: Vec<String>,
}

/// Arguments for the `blockdev-alloc lookup` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct LookupCommand {
    /// Path to a JSON instance snapshot.
    #[arg(long, value_name = "PATH")]
    pub(crate) instance: String,
    /// Volume to look up.
    #[arg(long, value_name = "VOLUME_ID")]
    pub(crate) volume: String,
}
