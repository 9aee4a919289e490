//! Configuration loading via `ortho-config`.

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::allocator::SequentialNameAllocator;

/// Naming scheme configuration derived from defaults, configuration files,
/// and environment variables.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "BLOCKDEV")]
pub struct AllocatorConfig {
    /// Prefix shared by every device name. Defaults to `/dev/sd`.
    #[ortho_config(default = "/dev/sd".to_owned())]
    pub device_prefix: String,
    /// First suffix letter handed out. Defaults to `b`, leaving `a` to the
    /// boot disk.
    #[ortho_config(default = "b".to_owned())]
    pub first_suffix: String,
    /// Last suffix letter handed out. Defaults to `z`.
    #[ortho_config(default = "z".to_owned())]
    pub last_suffix: String,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

const DEVICE_PREFIX_FIELD: FieldMetadata = FieldMetadata::new(
    "device name prefix",
    "BLOCKDEV_DEVICE_PREFIX",
    "device_prefix",
);
const FIRST_SUFFIX_FIELD: FieldMetadata = FieldMetadata::new(
    "first device suffix",
    "BLOCKDEV_FIRST_SUFFIX",
    "first_suffix",
);
const LAST_SUFFIX_FIELD: FieldMetadata = FieldMetadata::new(
    "last device suffix",
    "BLOCKDEV_LAST_SUFFIX",
    "last_suffix",
);

impl AllocatorConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to the blockdev-alloc configuration file",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }

    fn suffix_letter(value: &str, metadata: &FieldMetadata) -> Result<char, ConfigError> {
        let mut chars = value.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(letter), None) if letter.is_ascii_lowercase() => Ok(letter),
            _ => Err(ConfigError::InvalidSuffixRange(format!(
                "{} must be a single lowercase ASCII letter (set {}), got {value:?}",
                metadata.description, metadata.env_var
            ))),
        }
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("blockdev-alloc")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Builds the sequential allocator described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when validation fails.
    pub fn allocator(&self) -> Result<SequentialNameAllocator, ConfigError> {
        let (first, last) = self.suffix_range()?;
        Ok(SequentialNameAllocator::new(
            self.device_prefix.trim(),
            first,
            last,
        ))
    }

    /// Performs semantic validation. Error messages include guidance on how
    /// to provide values via environment variables or configuration files.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a field is empty and
    /// [`ConfigError::InvalidSuffixRange`] when the suffixes do not describe
    /// an ascending range of lowercase letters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.suffix_range().map(|_| ())
    }

    fn suffix_range(&self) -> Result<(char, char), ConfigError> {
        Self::require_field(&self.device_prefix, &DEVICE_PREFIX_FIELD)?;
        Self::require_field(&self.first_suffix, &FIRST_SUFFIX_FIELD)?;
        Self::require_field(&self.last_suffix, &LAST_SUFFIX_FIELD)?;

        let first = Self::suffix_letter(&self.first_suffix, &FIRST_SUFFIX_FIELD)?;
        let last = Self::suffix_letter(&self.last_suffix, &LAST_SUFFIX_FIELD)?;
        if first > last {
            return Err(ConfigError::InvalidSuffixRange(format!(
                "first suffix {first:?} comes after last suffix {last:?}"
            )));
        }
        Ok((first, last))
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates the suffix bounds do not form a usable range.
    #[error("invalid device suffix range: {0}")]
    InvalidSuffixRange(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}
