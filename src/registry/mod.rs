//! Server registry and scheduler.
//!
//! The [`Registry`] owns every [`ServerProbe`] and [`ServerEntry`]:
//!
//! - one probe per `(host, port)` unless a fresh one is forced
//! - any number of entries per probe, each with its own notify settings
//! - a probe is dropped once its last entry is removed
//!
//! An optional auto-update loop probes all targets, diffs every entry and
//! hands non-empty event lists to the subscribers.

mod auto_update;
mod error;


use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::probe::ServerProbe;
use crate::protocol::Target;
use crate::status::{NotifySettings, ServerEntry, StatusEvent};

use auto_update::AutoUpdate;
pub use error::RegistryError;

/// Callback receiving the events of one entry from one cycle.
pub type Subscriber = Arc<dyn Fn(&ServerEntry, &[StatusEvent]) + Send + Sync>;

/// Tunables shared by all probes of a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrySettings {
    /// Deadline for each probe cycle of each target
    pub probe_timeout: Duration,
    /// History retention for newly created probes
    pub retention: Duration,
    /// Maximum number of targets probed at once
    pub parallelism: usize,
}

impl RegistrySettings {
    pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_RETENTION: Duration = Duration::from_secs(60);
    pub const DEFAULT_PARALLELISM: usize = 10;
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            probe_timeout: Self::DEFAULT_PROBE_TIMEOUT,
            retention: Self::DEFAULT_RETENTION,
            parallelism: Self::DEFAULT_PARALLELISM,
        }
    }
}

#[derive(Default)]
struct Members {
    probes: Vec<Arc<ServerProbe>>,
    entries: Vec<Arc<ServerEntry>>,
}

/// State reachable from both the registry handle and the update loop.
struct Shared {
    settings: RegistrySettings,
    members: Mutex<Members>,
    subscribers: Mutex<Vec<Subscriber>>,
    next_id: AtomicU64,
}

impl Shared {
    fn members(&self) -> MutexGuard<'_, Members> {
        self.members.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn subscribers(&self) -> MutexGuard<'_, Vec<Subscriber>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Probes every registered target, at most `parallelism` at a time.
    ///
    /// Works on a snapshot of the probe list; targets added meanwhile are
    /// picked up next cycle.
    async fn probe_all(&self, timeout: Duration) {
        let probes = self.members().probes.clone();
        let semaphore = Arc::new(Semaphore::new(self.settings.parallelism.max(1)));
        let mut tasks = JoinSet::new();

        for probe in probes {
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                probe.probe(timeout).await;
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Probe task failed: {e}");
            }
        }
    }

    /// One loop iteration: probe all, diff every entry, notify.
    async fn run_cycle(&self) {
        self.probe_all(self.settings.probe_timeout).await;

        let entries = self.members().entries.clone();
        let subscribers = self.subscribers().clone();
        for entry in entries {
            let events = entry.update();
            if events.is_empty() {
                continue;
            }
            tracing::debug!("{}: dispatching {} event(s)", entry.label(), events.len());
            for subscriber in &subscribers {
                subscriber(&entry, &events);
            }
        }
    }
}

/// Owns probes and entries and drives the auto-update loop.
///
/// Dropping the registry stops a running loop.
pub struct Registry {
    shared: Arc<Shared>,
    auto_update: Mutex<Option<AutoUpdate>>,
}

impl Registry {
    /// Creates a registry with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(RegistrySettings::default())
    }

    #[must_use]
    pub fn with_settings(settings: RegistrySettings) -> Self {
        Self {
            shared: Arc::new(Shared {
                settings,
                members: Mutex::new(Members::default()),
                subscribers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
            auto_update: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn settings(&self) -> RegistrySettings {
        self.shared.settings
    }

    /// Returns the probe for `host:port`, creating it if needed.
    ///
    /// With `force_new`, a fresh probe is always created and registered
    /// alongside any existing one for the same target.
    pub fn resolve(&self, host: &str, port: u16, force_new: bool) -> Arc<ServerProbe> {
        let mut members = self.shared.members();
        let existing = if force_new {
            None
        } else {
            members.probes.iter().find(|p| p.matches(host, port)).cloned()
        };
        if let Some(existing) = existing {
            return existing;
        }

        let probe = Arc::new(
            ServerProbe::new(Target::new(host, port)).with_retention(self.shared.settings.retention),
        );
        tracing::debug!("Registered probe for {}", probe.target());
        members.probes.push(Arc::clone(&probe));
        probe
    }

    /// Adds a watch entry on `host:port` with default notify settings.
    pub fn add_entry(
        &self,
        host: &str,
        port: u16,
        force_new: bool,
        label: impl Into<String>,
    ) -> Arc<ServerEntry> {
        self.add_entry_with(host, port, force_new, label, NotifySettings::default())
    }

    /// Adds a watch entry with explicit notify settings.
    pub fn add_entry_with(
        &self,
        host: &str,
        port: u16,
        force_new: bool,
        label: impl Into<String>,
        notify: NotifySettings,
    ) -> Arc<ServerEntry> {
        let probe = self.resolve(host, port, force_new);
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let entry = Arc::new(ServerEntry::new(id, label, probe).with_notify(notify));
        self.shared.members().entries.push(Arc::clone(&entry));
        entry
    }

    /// Removes `entry`, and its probe if no other entry uses it.
    ///
    /// Returns false if the entry was not registered.
    pub fn remove_entry(&self, entry: &Arc<ServerEntry>) -> bool {
        let mut members = self.shared.members();
        let Some(index) = members.entries.iter().position(|e| Arc::ptr_eq(e, entry)) else {
            return false;
        };
        members.entries.remove(index);

        let probe = entry.probe();
        let still_used = members
            .entries
            .iter()
            .any(|e| Arc::ptr_eq(e.probe(), probe));
        if !still_used {
            members.probes.retain(|p| !Arc::ptr_eq(p, probe));
            tracing::debug!("Dropped probe for {}", probe.target());
        }
        true
    }

    /// Removes several entries; true only if all were registered.
    pub fn remove_entries(&self, entries: &[Arc<ServerEntry>]) -> bool {
        entries
            .iter()
            .fold(true, |all, entry| self.remove_entry(entry) && all)
    }

    #[must_use]
    pub fn entries(&self) -> Vec<Arc<ServerEntry>> {
        self.shared.members().entries.clone()
    }

    #[must_use]
    pub fn probes(&self) -> Vec<Arc<ServerProbe>> {
        self.shared.members().probes.clone()
    }

    /// Probes every target once with the configured timeout.
    pub async fn probe_all(&self) {
        self.shared.probe_all(self.shared.settings.probe_timeout).await;
    }

    /// Probes every target once with an explicit timeout.
    pub async fn probe_all_with_timeout(&self, timeout: Duration) {
        self.shared.probe_all(timeout).await;
    }

    /// Attaches a callback invoked with each entry's non-empty events.
    pub fn subscribe<F>(&self, subscriber: F)
    where
        F: Fn(&ServerEntry, &[StatusEvent]) + Send + Sync + 'static,
    {
        self.shared.subscribers().push(Arc::new(subscriber));
    }

    /// Starts the periodic update loop, replacing a running one.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NoSubscriber`] if nothing is subscribed;
    /// no loop is started in that case.
    pub async fn start_auto_update(&self, interval: Duration) -> Result<(), RegistryError> {
        if self.shared.subscribers().is_empty() {
            return Err(RegistryError::NoSubscriber);
        }

        self.stop_auto_update().await;

        let started = AutoUpdate::spawn(Arc::clone(&self.shared), interval);
        let replaced = self.lock_auto_update().replace(started);
        if let Some(replaced) = replaced {
            replaced.abort();
        }
        Ok(())
    }

    /// Stops the update loop and waits for it to exit. No-op if not running.
    pub async fn stop_auto_update(&self) {
        let running = self.lock_auto_update().take();
        if let Some(running) = running {
            running.stop().await;
        }
    }

    #[must_use]
    pub fn is_auto_updating(&self) -> bool {
        self.lock_auto_update()
            .as_ref()
            .is_some_and(AutoUpdate::is_running)
    }

    fn lock_auto_update(&self) -> MutexGuard<'_, Option<AutoUpdate>> {
        self.auto_update
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        if let Some(running) = self.lock_auto_update().take() {
            running.abort();
        }
    }
}
