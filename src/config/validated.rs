//! Validated configuration after merging CLI and TOML sources.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::protocol::Target;
use crate::registry::RegistrySettings;
use crate::status::{EventMessages, NotifySettings};

use super::cli::Cli;
use super::defaults;
use super::error::{ConfigError, field};
use super::toml::{MessagesSection, ServerSection, TomlConfig};

/// One server to watch, ready to hand to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSpec {
    pub target: Target,
    pub label: String,
    pub force_new: bool,
    pub notify: NotifySettings,
}

/// Fully validated configuration ready for use by the application.
///
/// Use [`ValidatedConfig::from_raw`] to build from CLI args and an
/// optional TOML config.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Servers to watch, TOML entries first then `--server` flags
    pub servers: Vec<ServerSpec>,

    /// Sleep between update cycles
    pub interval: Duration,

    /// Probe timeout, retention and parallelism
    pub registry: RegistrySettings,

    /// Event message templates
    pub messages: EventMessages,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Config {{ servers: {}, interval: {}s, timeout: {}s, retention: {}s, parallelism: {} }}",
            self.servers.len(),
            self.interval.as_secs(),
            self.registry.probe_timeout.as_secs(),
            self.registry.retention.as_secs(),
            self.registry.parallelism,
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional TOML config.
    ///
    /// CLI arguments take precedence over TOML config values. Servers from
    /// both sources are combined.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No server is configured (except for the `ping` subcommand)
    /// - A server address does not parse
    /// - The interval is negative, timeout/retention is zero, or any duration
    ///   exceeds [`defaults::MAX_DURATION_SECS`]
    /// - Parallelism is zero
    /// - A message template does not parse
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let servers = Self::resolve_servers(cli, toml)?;
        if servers.is_empty() && !cli.is_ping() {
            return Err(ConfigError::missing(
                field::SERVER,
                "Use --server or add a [[server]] table to the config file",
            ));
        }

        let monitor = toml.map(|t| &t.monitor);

        let interval = Self::resolve_interval(cli, toml)?;
        let probe_timeout = positive_secs(
            "timeout",
            cli.timeout.or_else(|| monitor.and_then(|m| m.timeout)),
            defaults::TIMEOUT_SECS,
        )?;
        let retention = positive_secs(
            "retention",
            cli.retention.or_else(|| monitor.and_then(|m| m.retention)),
            defaults::RETENTION_SECS,
        )?;
        let parallelism = cli
            .parallelism
            .or_else(|| monitor.and_then(|m| m.parallelism))
            .unwrap_or(defaults::PARALLELISM);
        if parallelism == 0 {
            return Err(ConfigError::InvalidParallelism);
        }

        let messages = Self::resolve_messages(toml.map(|t| &t.messages))?;

        Ok(Self {
            servers,
            interval,
            registry: RegistrySettings {
                probe_timeout,
                retention,
                parallelism,
            },
            messages,
            verbose: cli.verbose,
        })
    }

    /// Loads and merges configuration from CLI and optional config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed, or
    /// the merged configuration is invalid.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let toml = if let Some(ref path) = cli.config {
            Some(TomlConfig::load(path)?)
        } else {
            None
        };

        Self::from_raw(cli, toml.as_ref())
    }

    fn resolve_servers(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Vec<ServerSpec>, ConfigError> {
        let mut servers = Vec::new();

        for section in toml.map_or(&[][..], |t| t.servers.as_slice()) {
            let mut spec = server_from_section(section)?;
            spec.notify.named_players |= cli.notify_names;
            servers.push(spec);
        }

        for address in &cli.servers {
            let target = parse_target(address)?;
            servers.push(ServerSpec {
                label: address.trim().to_string(),
                target,
                force_new: false,
                notify: NotifySettings {
                    named_players: cli.notify_names,
                    ..NotifySettings::default()
                },
            });
        }

        Ok(servers)
    }

    fn resolve_interval(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Duration, ConfigError> {
        // Priority: CLI explicit > TOML > default
        let Some(seconds) = cli
            .interval
            .or_else(|| toml.and_then(|t| t.monitor.interval))
        else {
            return Ok(defaults::interval());
        };

        let seconds = u64::try_from(seconds).map_err(|_| ConfigError::InvalidDuration {
            field: "interval",
            reason: format!("must not be negative (got {seconds})"),
        })?;
        if seconds > defaults::MAX_DURATION_SECS {
            return Err(too_large("interval", seconds));
        }
        Ok(Duration::from_secs(seconds))
    }

    fn resolve_messages(section: Option<&MessagesSection>) -> Result<EventMessages, ConfigError> {
        let mut messages = EventMessages::default();
        let Some(section) = section else {
            return Ok(messages);
        };

        let overrides = [
            ("online", &section.online, &mut messages.online),
            ("offline", &section.offline, &mut messages.offline),
            ("count_changed", &section.count_changed, &mut messages.count_changed),
            ("player_joined", &section.player_joined, &mut messages.player_joined),
            ("player_left", &section.player_left, &mut messages.player_left),
        ];
        for (name, configured, slot) in overrides {
            if let Some(template) = configured {
                EventMessages::validate(template).map_err(|e| ConfigError::InvalidTemplate {
                    name,
                    reason: e.to_string(),
                })?;
                slot.clone_from(template);
            }
        }

        Ok(messages)
    }
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

// Helper functions

fn parse_target(address: &str) -> Result<Target, ConfigError> {
    address
        .parse::<Target>()
        .map_err(|source| ConfigError::InvalidAddress {
            address: address.to_string(),
            source,
        })
}

fn server_from_section(section: &ServerSection) -> Result<ServerSpec, ConfigError> {
    let defaults = NotifySettings::default();
    Ok(ServerSpec {
        target: parse_target(&section.address)?,
        label: section
            .label
            .clone()
            .unwrap_or_else(|| section.address.trim().to_string()),
        force_new: section.force_new,
        notify: NotifySettings {
            online_status: section.notify_online.unwrap_or(defaults.online_status),
            player_count: section.notify_count.unwrap_or(defaults.player_count),
            named_players: section.notify_names.unwrap_or(defaults.named_players),
        },
    })
}

fn positive_secs(
    field: &'static str,
    configured: Option<u64>,
    default: u64,
) -> Result<Duration, ConfigError> {
    let seconds = configured.unwrap_or(default);
    if seconds == 0 {
        return Err(ConfigError::InvalidDuration {
            field,
            reason: "must be greater than 0".to_string(),
        });
    }
    if seconds > defaults::MAX_DURATION_SECS {
        return Err(too_large(field, seconds));
    }
    Ok(Duration::from_secs(seconds))
}

fn too_large(field: &'static str, seconds: u64) -> ConfigError {
    ConfigError::InvalidDuration {
        field,
        reason: format!(
            "must be at most {} seconds (got {seconds})",
            defaults::MAX_DURATION_SECS
        ),
    }
}
