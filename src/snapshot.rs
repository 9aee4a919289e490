//! Loading instance snapshots from disk.
//!
//! Operators capture the provider's view of an instance as JSON (for example
//! the output of a describe call reshaped into [`Instance`]) and feed it to the
//! `blockdev-alloc` binary to preview which device names would be chosen.

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};
use thiserror::Error;

use crate::instance::Instance;

/// Errors raised while loading an instance snapshot.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum SnapshotError {
    /// Raised when the snapshot path is empty or only whitespace.
    #[error("instance snapshot path must not be empty")]
    PathEmpty,
    /// Raised when reading the snapshot file fails.
    #[error("failed to read instance snapshot `{path}`: {message}")]
    Read {
        /// Expanded path that failed to read.
        path: String,
        /// Underlying error message.
        message: String,
    },
    /// Raised when the snapshot is not a valid instance document.
    #[error("failed to parse instance snapshot `{path}`: {message}")]
    Parse {
        /// Expanded path of the malformed snapshot.
        path: String,
        /// Parser error message.
        message: String,
    },
}

/// Expands a leading `~/` prefix to the user's home directory.
///
/// The input is returned unchanged when `HOME` is not set.
#[must_use]
pub fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return format!("{}/{rest}", home.to_string_lossy());
    }
    path.to_owned()
}

/// Reads and parses an instance snapshot.
///
/// # Errors
///
/// Returns [`SnapshotError`] when the path is blank, the file cannot be read,
/// or its content is not a valid instance document.
pub fn load_instance(path: &str) -> Result<Instance, SnapshotError> {
    if path.trim().is_empty() {
        return Err(SnapshotError::PathEmpty);
    }

    let expanded = expand_tilde(path);
    let content = read_to_string_ambient(&expanded).map_err(|message| SnapshotError::Read {
        path: expanded.clone(),
        message,
    })?;

    parse_instance(&content).map_err(|message| SnapshotError::Parse {
        path: expanded,
        message,
    })
}

/// Parses an instance document from JSON text.
pub(crate) fn parse_instance(content: &str) -> Result<Instance, String> {
    serde_json::from_str::<Instance>(content).map_err(|err| err.to_string())
}

fn read_to_string_ambient(path: &str) -> Result<String, String> {
    let path_buf = Utf8Path::new(path);

    let (dir_path, file_path) = if path_buf.is_absolute() {
        let parent = path_buf
            .parent()
            .ok_or_else(|| format!("path has no parent directory: {path_buf}"))?;
        let file_name = path_buf
            .file_name()
            .ok_or_else(|| format!("path has no file name: {path_buf}"))?;
        (parent, Utf8Path::new(file_name))
    } else {
        (Utf8Path::new("."), path_buf)
    };

    let dir =
        Dir::open_ambient_dir(dir_path, ambient_authority()).map_err(|err| err.to_string())?;
    dir.read_to_string(file_path).map_err(|err| err.to_string())
}
