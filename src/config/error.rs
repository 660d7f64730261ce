//! Error types for configuration parsing and validation.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file '{}': {source}", path.display())]
    FileRead {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to write configuration file (for init command).
    #[error("Failed to write config file '{}': {source}", path.display())]
    FileWrite {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Missing required field that must be provided by CLI or config file.
    #[error("Missing required field: {field}. {hint}")]
    MissingRequired {
        /// Name of the missing field
        field: &'static str,
        /// Hint for how to provide the value
        hint: &'static str,
    },

    /// A server address could not be parsed.
    #[error("Invalid server address '{address}': {source}")]
    InvalidAddress {
        /// The address as given
        address: String,
        /// Parse failure
        #[source]
        source: crate::protocol::TargetParseError,
    },

    /// Invalid duration value (negative, zero or too large).
    #[error("Invalid duration for {field}: {reason}")]
    InvalidDuration {
        /// Name of the field
        field: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Parallelism must be at least one.
    #[error("Invalid parallelism: must be at least 1")]
    InvalidParallelism,

    /// A message template does not parse.
    #[error("Invalid {name} message template: {reason}")]
    InvalidTemplate {
        /// Which message
        name: &'static str,
        /// Handlebars error
        reason: String,
    },
}

/// Well-known field names for `MissingRequired` errors.
pub mod field {
    /// At least one server to watch.
    pub const SERVER: &str = "server";
}

impl ConfigError {
    /// Creates a `MissingRequired` error for a required field.
    #[must_use]
    pub const fn missing(field: &'static str, hint: &'static str) -> Self {
        Self::MissingRequired { field, hint }
    }
}
