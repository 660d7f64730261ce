//! Outcome of one status-ping attempt.

use std::time::{Duration, SystemTime};

use super::error::ProbeError;

/// A player entry from the status sample.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerSample {
    /// Player UUID as sent by the server
    pub id: String,
    /// Player display name
    pub name: String,
}

impl PlayerSample {
    /// Creates a sample entry.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Server state reported by a successful ping.
///
/// Legacy responses carry no favicon or player sample; `protocol` is only
/// absent for pre-1.4 legacy servers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerStatus {
    /// Raw message of the day, formatting codes included
    pub motd: String,
    /// Advertised player capacity
    pub max_players: u32,
    /// Players currently online
    pub online_players: u32,
    /// Server version name
    pub version: String,
    /// Protocol version number, when reported
    pub protocol: Option<i32>,
    /// Favicon data URI, when reported
    pub favicon: Option<String>,
    /// Sample of online players, in server order
    pub sample: Vec<PlayerSample>,
}

/// Immutable record of one protocol attempt.
///
/// Either carries a [`ServerStatus`] or the [`ProbeError`] that ended the
/// attempt, never both.
#[derive(Debug)]
pub struct Snapshot {
    requested_at: SystemTime,
    elapsed: Duration,
    outcome: Result<ServerStatus, ProbeError>,
}

impl Snapshot {
    /// Creates a snapshot from a finished attempt.
    #[must_use]
    pub const fn new(
        requested_at: SystemTime,
        elapsed: Duration,
        outcome: Result<ServerStatus, ProbeError>,
    ) -> Self {
        Self {
            requested_at,
            elapsed,
            outcome,
        }
    }

    /// Creates a successful snapshot.
    #[must_use]
    pub const fn success(requested_at: SystemTime, elapsed: Duration, status: ServerStatus) -> Self {
        Self::new(requested_at, elapsed, Ok(status))
    }

    /// Creates a failed snapshot.
    #[must_use]
    pub const fn failure(requested_at: SystemTime, elapsed: Duration, error: ProbeError) -> Self {
        Self::new(requested_at, elapsed, Err(error))
    }

    /// Wall-clock time the attempt started.
    #[must_use]
    pub const fn requested_at(&self) -> SystemTime {
        self.requested_at
    }

    /// Time from connect to final byte read (or to failure).
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// `requested_at + elapsed`.
    #[must_use]
    pub fn completed_at(&self) -> SystemTime {
        self.requested_at + self.elapsed
    }

    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }

    #[must_use]
    pub fn status(&self) -> Option<&ServerStatus> {
        self.outcome.as_ref().ok()
    }

    #[must_use]
    pub fn error(&self) -> Option<&ProbeError> {
        self.outcome.as_ref().err()
    }
}
