//! Combined outcome of one probe cycle.

use std::fmt;
use std::time::{Duration, SystemTime};

use crate::protocol::{
    PlayerSample, ProbeError, ServerStatus, Snapshot, strip_formatting,
};

/// The pair of snapshots produced by one probe cycle.
///
/// The modern snapshot is preferred whenever it succeeded; otherwise the
/// legacy one is. Effective fields read from the preferred snapshot.
#[derive(Debug)]
pub struct ProbeResult {
    legacy: Snapshot,
    modern: Snapshot,
}

impl ProbeResult {
    #[must_use]
    pub const fn new(legacy: Snapshot, modern: Snapshot) -> Self {
        Self { legacy, modern }
    }

    /// Result used when the cycle as a whole missed its deadline.
    #[must_use]
    pub const fn timed_out(requested_at: SystemTime, elapsed: Duration) -> Self {
        Self::new(
            Snapshot::failure(requested_at, elapsed, ProbeError::Timeout),
            Snapshot::failure(requested_at, elapsed, ProbeError::Timeout),
        )
    }

    #[must_use]
    pub const fn legacy(&self) -> &Snapshot {
        &self.legacy
    }

    #[must_use]
    pub const fn modern(&self) -> &Snapshot {
        &self.modern
    }

    /// True if either protocol succeeded.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.legacy.succeeded() || self.modern.succeeded()
    }

    /// Modern if it succeeded, else legacy.
    #[must_use]
    pub const fn preferred(&self) -> &Snapshot {
        if self.modern.succeeded() {
            &self.modern
        } else {
            &self.legacy
        }
    }

    /// Round-trip time: the faster of the two attempts.
    #[must_use]
    pub fn ping(&self) -> Duration {
        self.legacy.elapsed().min(self.modern.elapsed())
    }

    #[must_use]
    pub const fn requested_at(&self) -> SystemTime {
        self.preferred().requested_at()
    }

    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.preferred().elapsed()
    }

    #[must_use]
    pub fn completed_at(&self) -> SystemTime {
        self.preferred().completed_at()
    }

    /// Status from the preferred snapshot, if it succeeded.
    #[must_use]
    pub fn status(&self) -> Option<&ServerStatus> {
        self.preferred().status()
    }

    /// Error of the preferred snapshot, if it failed.
    #[must_use]
    pub fn error(&self) -> Option<&ProbeError> {
        self.preferred().error()
    }

    /// Raw motd of the preferred snapshot; empty on failure.
    #[must_use]
    pub fn motd(&self) -> &str {
        self.status().map_or("", |s| s.motd.as_str())
    }

    /// Preferred motd with formatting codes removed.
    #[must_use]
    pub fn plain_motd(&self) -> String {
        strip_formatting(self.motd())
    }

    /// Motd to show to a human.
    ///
    /// Modern servers often send only the first line of a multi-component
    /// description in `text`; the legacy reason string carries it whole.
    /// The legacy motd wins when it succeeded and is strictly longer.
    #[must_use]
    pub fn display_motd(&self) -> &str {
        let preferred = self.motd();
        match self.legacy.status() {
            Some(legacy) if legacy.motd.chars().count() > preferred.chars().count() => {
                &legacy.motd
            }
            _ => preferred,
        }
    }

    #[must_use]
    pub fn online_players(&self) -> u32 {
        self.status().map_or(0, |s| s.online_players)
    }

    #[must_use]
    pub fn max_players(&self) -> u32 {
        self.status().map_or(0, |s| s.max_players)
    }

    #[must_use]
    pub fn version(&self) -> &str {
        self.status().map_or("", |s| s.version.as_str())
    }

    #[must_use]
    pub fn favicon(&self) -> Option<&str> {
        self.status().and_then(|s| s.favicon.as_deref())
    }

    /// Player sample; empty when legacy is preferred or both failed.
    #[must_use]
    pub fn sample(&self) -> &[PlayerSample] {
        self.status().map_or(&[], |s| s.sample.as_slice())
    }
}

impl fmt::Display for ProbeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.error() {
            None => write!(
                f,
                "{} | {}/{} players | {} | {} ms",
                strip_formatting(self.display_motd()),
                self.online_players(),
                self.max_players(),
                self.version(),
                self.ping().as_millis()
            ),
            Some(error) => write!(f, "offline ({error})"),
        }
    }
}
