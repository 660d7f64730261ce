//! Probe target identity.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::DEFAULT_PORT;

/// Error returned when a `host[:port]` string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetParseError {
    /// The address string was empty.
    #[error("address is empty")]
    Empty,

    /// The port part is not a valid 16-bit port number.
    #[error("invalid port '{0}'")]
    InvalidPort(String),

    /// A bracketed IPv6 literal was not closed.
    #[error("unterminated '[' in address")]
    UnterminatedBracket,
}

/// A `(host, port)` pair probed by exactly one [`crate::probe::ServerProbe`].
///
/// Host comparison is case-insensitive, so `Play.Example.com:25565` and
/// `play.example.com:25565` name the same target.
#[derive(Debug, Clone)]
pub struct Target {
    host: String,
    port: u16,
}

impl Target {
    /// Creates a target from a host name (or IP literal) and port.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Returns the host exactly as given.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns true if this target has the given identity.
    #[must_use]
    pub fn is(&self, host: &str, port: u16) -> bool {
        self.port == port && self.host.eq_ignore_ascii_case(host)
    }
}

impl PartialEq for Target {
    fn eq(&self, other: &Self) -> bool {
        self.is(&other.host, other.port)
    }
}

impl Eq for Target {}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for Target {
    type Err = TargetParseError;

    /// Parses `host`, `host:port`, `[v6]` or `[v6]:port`.
    ///
    /// A missing port defaults to [`DEFAULT_PORT`]. A bare IPv6 literal
    /// without brackets is taken as a host with the default port.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TargetParseError::Empty);
        }

        let (host, port) = if let Some(rest) = s.strip_prefix('[') {
            let (host, after) = rest
                .split_once(']')
                .ok_or(TargetParseError::UnterminatedBracket)?;
            (host, after.strip_prefix(':'))
        } else {
            match s.rsplit_once(':') {
                Some((host, port)) if !host.contains(':') => (host, Some(port)),
                _ => (s, None),
            }
        };

        if host.is_empty() {
            return Err(TargetParseError::Empty);
        }

        let port = match port {
            Some(p) => p
                .parse::<u16>()
                .map_err(|_| TargetParseError::InvalidPort(p.to_string()))?,
            None => DEFAULT_PORT,
        };

        Ok(Self::new(host, port))
    }
}
