//! Binary entry point for the `blockdev-alloc` CLI.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use serde::Serialize;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use blockdev_alloc::{
    AllocatorConfig, Device, DeviceError, DeviceManager, SnapshotError, load_instance,
};

mod cli;

use cli::{Cli, LookupCommand, PlanCommand};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("allocation failed: {0}")]
    Device(#[from] DeviceError),
    #[error("failed to write output: {0}")]
    Output(String),
}

/// One row of `plan` or `lookup` output.
#[derive(Debug, Eq, PartialEq, Serialize)]
struct DeviceReport {
    volume_id: String,
    path: Option<String>,
    already_assigned: bool,
}

impl From<&Device> for DeviceReport {
    fn from(device: &Device) -> Self {
        Self {
            volume_id: device.volume_id().to_owned(),
            path: Some(device.path())
                .filter(|path| !path.is_empty())
                .map(str::to_owned),
            already_assigned: device.is_already_assigned(),
        }
    }
}

#[derive(Debug, Serialize)]
struct VersionReport {
    name: &'static str,
    version: &'static str,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli, io::stdout()) {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn dispatch(cli: Cli, out: impl Write) -> Result<(), CliError> {
    match cli {
        Cli::Plan(command) => {
            let manager = manager_from_config()?;
            let reports = plan(&manager, &command)?;
            write_json(out, &reports)
        }
        Cli::Lookup(command) => {
            let manager = manager_from_config()?;
            let report = lookup(&manager, &command)?;
            write_json(out, &report)
        }
        Cli::Version => write_json(
            out,
            &VersionReport {
                name: env!("CARGO_PKG_NAME"),
                version: env!("CARGO_PKG_VERSION"),
            },
        ),
    }
}

fn manager_from_config() -> Result<DeviceManager, CliError> {
    let config =
        AllocatorConfig::load_without_cli_args().map_err(|err| CliError::Config(err.to_string()))?;
    DeviceManager::from_config(&config).map_err(|err| CliError::Config(err.to_string()))
}

/// Allocates devices for every requested volume in order. Reservations are
/// kept until the end of the run so later volumes see earlier choices.
fn plan(manager: &DeviceManager, command: &PlanCommand) -> Result<Vec<DeviceReport>, CliError> {
    let instance = load_instance(&command.instance)?;
    let mut reports = Vec::with_capacity(command.volumes.len());
    for volume_id in &command.volumes {
        let device = manager.new_device(Some(&instance), volume_id)?;
        reports.push(DeviceReport::from(&device));
    }
    Ok(reports)
}

fn lookup(manager: &DeviceManager, command: &LookupCommand) -> Result<DeviceReport, CliError> {
    let instance = load_instance(&command.instance)?;
    let device = manager.get_device(Some(&instance), &command.volume)?;
    Ok(DeviceReport::from(&device))
}

fn write_json<T: Serialize>(mut out: impl Write, value: &T) -> Result<(), CliError> {
    let rendered =
        serde_json::to_string_pretty(value).map_err(|err| CliError::Output(err.to_string()))?;
    writeln!(out, "{rendered}").map_err(|err| CliError::Output(err.to_string()))
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
