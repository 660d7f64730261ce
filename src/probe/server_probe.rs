//! Per-target probe orchestrator.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};

use tokio::time::Instant;

use super::ProbeResult;
use crate::protocol::{LegacyPing, ModernPing, StatusPing, Target};
use crate::time::{Clock, SystemClock};

/// Extra time granted past the codec deadline before the cycle is
/// declared timed out as a whole.
const JOIN_GRACE: Duration = Duration::from_millis(250);

/// Stand-in deadline for timeouts too large to add to an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Runs both codecs against one target and keeps an age-bounded history.
///
/// Results are shared as `Arc<ProbeResult>` so observers can hold on to
/// one after it is purged here.
///
/// # Type Parameters
///
/// - `C`: Clock used to age out history (defaults to [`SystemClock`])
#[derive(Debug)]
pub struct ServerProbe<C = SystemClock> {
    target: Target,
    retention: Duration,
    clock: C,
    legacy: LegacyPing,
    modern: ModernPing,
    history: Mutex<Vec<Arc<ProbeResult>>>,
}

impl ServerProbe<SystemClock> {
    /// Creates a probe for `target` with the default retention.
    #[must_use]
    pub const fn new(target: Target) -> Self {
        Self::with_clock(target, SystemClock)
    }
}

impl<C: Clock> ServerProbe<C> {
    /// How long results are kept by default.
    pub const DEFAULT_RETENTION: Duration = Duration::from_secs(60);

    /// Creates a probe that ages history against `clock`.
    #[must_use]
    pub const fn with_clock(target: Target, clock: C) -> Self {
        Self {
            target,
            retention: Self::DEFAULT_RETENTION,
            clock,
            legacy: LegacyPing::new(),
            modern: ModernPing::new(),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Sets how long results are kept.
    #[must_use]
    pub const fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Sets the protocol version announced by the modern codec.
    #[must_use]
    pub const fn with_modern_protocol(mut self, protocol_version: i32) -> Self {
        self.modern = self.modern.with_protocol_version(protocol_version);
        self
    }

    #[must_use]
    pub const fn target(&self) -> &Target {
        &self.target
    }

    #[must_use]
    pub const fn retention(&self) -> Duration {
        self.retention
    }

    /// Returns true if this probe is for `host:port` (host case-insensitive).
    #[must_use]
    pub fn matches(&self, host: &str, port: u16) -> bool {
        self.target.is(host, port)
    }

    /// Probes the target over both protocols in parallel.
    ///
    /// Both codecs share one deadline of `now + timeout` and are stamped
    /// with this probe's clock. If joining them
    /// overruns that deadline, both are abandoned and an all-timeout
    /// result is recorded instead. The result is appended to history and
    /// expired entries are purged before returning.
    pub async fn probe(&self, timeout: Duration) -> Arc<ProbeResult> {
        tracing::debug!("Probing {} (timeout {timeout:?})", self.target);
        let requested_at = self.clock.now();
        let started = Instant::now();
        let deadline = saturating_deadline(started, timeout);

        let legacy = {
            let (codec, target) = (self.legacy, self.target.clone());
            tokio::spawn(async move { codec.ping(&target, requested_at, deadline).await })
        };
        let modern = {
            let (codec, target) = (self.modern, self.target.clone());
            tokio::spawn(async move { codec.ping(&target, requested_at, deadline).await })
        };
        let abort = (legacy.abort_handle(), modern.abort_handle());

        let joined = tokio::time::timeout_at(saturating_deadline(deadline, JOIN_GRACE), async {
            tokio::try_join!(legacy, modern)
        })
        .await;

        let result = match joined {
            Ok(Ok((legacy, modern))) => ProbeResult::new(legacy, modern),
            Ok(Err(e)) => {
                tracing::warn!("Probe task for {} failed: {e}", self.target);
                abort.0.abort();
                abort.1.abort();
                ProbeResult::timed_out(requested_at, started.elapsed())
            }
            Err(_) => {
                tracing::warn!("Probe of {} overran its deadline", self.target);
                abort.0.abort();
                abort.1.abort();
                ProbeResult::timed_out(requested_at, started.elapsed())
            }
        };

        tracing::debug!("Probed {}: {result}", self.target);
        self.record(result)
    }

    /// Most recent result by completion time.
    ///
    /// With `only_successful`, failed results are skipped. Ties go to the
    /// later-recorded result.
    #[must_use]
    pub fn latest(&self, only_successful: bool) -> Option<Arc<ProbeResult>> {
        self.lock_history()
            .iter()
            .filter(|result| !only_successful || result.succeeded())
            .max_by_key(|result| result.completed_at())
            .cloned()
    }

    /// Results currently retained, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<Arc<ProbeResult>> {
        self.lock_history().clone()
    }

    /// Appends `result` and purges results requested before `now - retention`.
    pub(crate) fn record(&self, result: ProbeResult) -> Arc<ProbeResult> {
        let result = Arc::new(result);
        let cutoff = self
            .clock
            .now()
            .checked_sub(self.retention)
            .unwrap_or(SystemTime::UNIX_EPOCH);

        let mut history = self.lock_history();
        history.push(Arc::clone(&result));
        history.retain(|kept| kept.requested_at() >= cutoff);
        result
    }

    fn lock_history(&self) -> std::sync::MutexGuard<'_, Vec<Arc<ProbeResult>>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// `start + timeout`, capped far in the future instead of overflowing.
fn saturating_deadline(start: Instant, timeout: Duration) -> Instant {
    start
        .checked_add(timeout)
        .or_else(|| start.checked_add(FAR_FUTURE))
        .unwrap_or(start)
}
