//! Default values for configuration options.

use std::time::Duration;

/// Default seconds between update cycles.
pub const INTERVAL_SECS: u64 = 30;

/// Default probe timeout in seconds.
pub const TIMEOUT_SECS: u64 = 30;

/// Default history retention in seconds.
pub const RETENTION_SECS: u64 = 60;

/// Default number of servers probed concurrently.
pub const PARALLELISM: usize = 10;

/// Upper bound for every duration setting (one week).
pub const MAX_DURATION_SECS: u64 = 7 * 24 * 60 * 60;

/// Default config file written by `init`.
pub const CONFIG_FILE: &str = "mcsw.toml";

#[must_use]
pub const fn interval() -> Duration {
    Duration::from_secs(INTERVAL_SECS)
}
