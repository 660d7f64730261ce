//! Configuration layer for mcsw.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - TOML configuration file parsing ([`TomlConfig`])
//! - Validated configuration ([`ValidatedConfig`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! Scalar values are resolved with the following priority (highest to lowest):
//!
//! 1. **Explicit CLI arguments**
//! 2. **TOML config file**
//! 3. **Built-in defaults**
//!
//! Servers are combined rather than replaced: `[[server]]` tables first,
//! then each `--server` flag in order.
//!
//! # Boolean Flag Semantics
//!
//! `--notify-names` uses OR semantics: it enables join/leave reports for
//! every server but cannot switch off a `notify_names = true` table.

mod cli;
pub mod defaults;
mod error;
mod toml;
mod validated;


pub use cli::{Cli, Command};
pub use error::{ConfigError, field};
pub use toml::{TomlConfig, default_config_template};
pub use validated::{ServerSpec, ValidatedConfig, write_default_config};
