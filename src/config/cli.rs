//! CLI argument parsing using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::defaults;

/// mcsw: Minecraft server watcher
///
/// Probes Minecraft servers over the legacy and modern status-ping
/// protocols and reports online, player count and player presence changes.
#[derive(Debug, Parser)]
#[command(name = "mcsw")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Server to watch as HOST[:PORT] (can be specified multiple times)
    #[arg(long = "server", value_name = "HOST[:PORT]")]
    pub servers: Vec<String>,

    /// Seconds to sleep between update cycles
    #[arg(long, allow_negative_numbers = true)]
    pub interval: Option<i64>,

    /// Probe timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Seconds to keep probe results in history
    #[arg(long)]
    pub retention: Option<u64>,

    /// Maximum number of servers probed at once
    #[arg(long)]
    pub parallelism: Option<usize>,

    /// Report player joins and leaves for every server
    #[arg(long = "notify-names")]
    pub notify_names: bool,

    /// Path to configuration file
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// Subcommands for mcsw
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = defaults::CONFIG_FILE)]
        output: PathBuf,
    },

    /// Probe one server once and print the result
    Ping {
        /// Server address as HOST[:PORT]
        address: String,
    },
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Some(Command::Init { .. }))
    }

    #[must_use]
    pub const fn is_ping(&self) -> bool {
        matches!(self.command, Some(Command::Ping { .. }))
    }
}
