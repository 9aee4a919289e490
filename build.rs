//! Build script rendering the `blockdev-alloc` man page.
//!
//! The page documents the diagnostic `plan`, `lookup`, and `version`
//! subcommands from the same clap definitions the binary parses, and is
//! written to `$OUT_DIR/<package name>.1` for packaging.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::CommandFactory;
use clap_mangen::Man;

#[path = "src/cli/mod.rs"]
mod cli;

use cli::Cli;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = io::stdout();
    writeln!(stdout, "cargo:rerun-if-changed=build.rs")?;
    writeln!(stdout, "cargo:rerun-if-changed=src/cli/mod.rs")?;

    let out_dir = env::var_os("OUT_DIR")
        .map(PathBuf::from)
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "OUT_DIR was not set"))?;
    let page_name = format!("{}.1", env!("CARGO_PKG_NAME"));

    let mut page = Vec::new();
    Man::new(Cli::command()).render(&mut page)?;
    fs::write(out_dir.join(page_name), page)?;

    Ok(())
}
