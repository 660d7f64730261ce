//! TOML configuration file parsing.

use std::path::Path;

use serde::Deserialize;

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// Everything is optional so a file can carry just the servers and leave
/// tuning to CLI flags and defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Scheduler and probe tuning
    #[serde(default)]
    pub monitor: MonitorSection,

    /// Servers to watch (`[[server]]` tables)
    #[serde(default, rename = "server")]
    pub servers: Vec<ServerSection>,

    /// Event message templates
    #[serde(default)]
    pub messages: MessagesSection,
}

/// Scheduler and probe tuning section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorSection {
    /// Seconds between update cycles (signed so negatives can be rejected)
    pub interval: Option<i64>,

    /// Probe timeout in seconds
    pub timeout: Option<u64>,

    /// History retention in seconds
    pub retention: Option<u64>,

    /// Maximum servers probed at once
    pub parallelism: Option<usize>,
}

/// One watched server.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// `host[:port]`
    pub address: String,

    /// Display label (default: the address)
    pub label: Option<String>,

    /// Use a dedicated probe even if another entry watches the same target
    #[serde(default)]
    pub force_new: bool,

    pub notify_online: Option<bool>,
    pub notify_count: Option<bool>,
    pub notify_names: Option<bool>,
}

/// Event message templates section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessagesSection {
    pub online: Option<String>,
    pub offline: Option<String>,
    pub count_changed: Option<String>,
    pub player_joined: Option<String>,
    pub player_left: Option<String>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# mcsw configuration file

[monitor]
# Seconds between update cycles (default: 30)
interval = 30

# Probe timeout in seconds (default: 30)
# timeout = 30

# Seconds to keep probe results (default: 60)
# retention = 60

# Maximum servers probed at once (default: 10)
# parallelism = 10

# One [[server]] table per watched server.
[[server]]
address = "localhost:25565"
# label = "Local"
# force_new = false
# notify_online = true
# notify_count = true
# notify_names = false

[messages]
# Handlebars templates. Variables: {{text}}, {{count}}, {{name}}, {{id}}
# online = "Server is online: {{text}}"
# offline = "Server is offline: {{text}}"
# count_changed = "Player count changed: {{count}}"
# player_joined = "Player joined: {{name}}"
# player_left = "Player left: {{name}}"
"#
    .to_string()
}
