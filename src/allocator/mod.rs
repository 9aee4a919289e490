//! Device name allocation.
//!
//! Names are drawn from a fixed, ordered namespace: a prefix followed by a
//! single-letter suffix from an inclusive range (`/dev/sdb` to `/dev/sdz` by
//! default). Allocation is a pure function of the names already in use, so
//! the same allocator can be shared between threads as long as callers
//! serialise the decision that follows it.

use std::collections::BTreeMap;

use thiserror::Error;

/// Default prefix applied to every candidate device name.
pub const DEFAULT_DEVICE_PREFIX: &str = "/dev/sd";

/// First suffix handed out by default. `a` is reserved for the boot disk.
pub const DEFAULT_FIRST_SUFFIX: char = 'b';

/// Last suffix handed out by default.
pub const DEFAULT_LAST_SUFFIX: char = 'z';

/// Errors raised while picking a device name.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum AllocatorError {
    /// Raised when every candidate in the namespace is already taken.
    #[error("all {candidates} device names with prefix {prefix:?} are in use")]
    Exhausted {
        /// Prefix of the exhausted namespace.
        prefix: String,
        /// Number of candidates in the namespace.
        candidates: usize,
    },
}

/// Chooses a free device name given the names currently in use.
///
/// Implementations must be pure: the result depends only on `in_use`, and a
/// returned name is never a key of `in_use`.
pub trait NameAllocator: Send + Sync {
    /// Returns the first free name in the allocator's ordering.
    ///
    /// # Errors
    ///
    /// Returns [`AllocatorError::Exhausted`] when every candidate is taken.
    fn next_free(&self, in_use: &BTreeMap<String, String>) -> Result<String, AllocatorError>;
}

/// Allocator walking `prefix + suffix` for each suffix in ascending order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SequentialNameAllocator {
    prefix: String,
    first_suffix: char,
    last_suffix: char,
}

impl Default for SequentialNameAllocator {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_DEVICE_PREFIX.to_owned(),
            first_suffix: DEFAULT_FIRST_SUFFIX,
            last_suffix: DEFAULT_LAST_SUFFIX,
        }
    }
}

impl SequentialNameAllocator {
    /// Creates an allocator over `prefix + first_suffix ..= prefix + last_suffix`.
    ///
    /// A range whose last suffix precedes the first yields an empty
    /// namespace; [`crate::AllocatorConfig::validate`] rejects such ranges
    /// before they reach this constructor.
    #[must_use]
    pub fn new(prefix: impl Into<String>, first_suffix: char, last_suffix: char) -> Self {
        Self {
            prefix: prefix.into(),
            first_suffix,
            last_suffix,
        }
    }

    /// Returns the prefix shared by every candidate.
    #[must_use]
    pub const fn prefix(&self) -> &str {
        self.prefix.as_str()
    }

    /// Iterates every candidate name in allocation order.
    pub fn candidates(&self) -> impl Iterator<Item = String> + '_ {
        (self.first_suffix..=self.last_suffix).map(|suffix| format!("{}{suffix}", self.prefix))
    }
}

impl NameAllocator for SequentialNameAllocator {
    fn next_free(&self, in_use: &BTreeMap<String, String>) -> Result<String, AllocatorError> {
        self.candidates()
            .find(|candidate| !in_use.contains_key(candidate))
            .ok_or_else(|| AllocatorError::Exhausted {
                prefix: self.prefix.clone(),
                candidates: self.candidates().count(),
            })
    }
}
