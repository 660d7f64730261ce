//! Per-entry change detection.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::probe::{ProbeResult, ServerProbe};
use crate::protocol::{PlayerSample, ProbeErrorKind, strip_formatting};

use super::StatusEvent;

/// Which event kinds an entry reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifySettings {
    /// Report online/offline transitions
    pub online_status: bool,
    /// Report player count changes
    pub player_count: bool,
    /// Report individual joins and leaves
    pub named_players: bool,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            online_status: true,
            player_count: true,
            named_players: false,
        }
    }
}

/// Display fields mirrored from the latest result seen by [`ServerEntry::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryView {
    pub online: bool,
    pub player_count: u32,
    pub max_players: u32,
    pub version: String,
    /// Display motd with formatting codes removed
    pub motd: String,
    pub last_error: Option<ProbeErrorKind>,
    pub players: Vec<PlayerSample>,
    pub last_update: Option<SystemTime>,
}

impl EntryView {
    pub const DEFAULT_VERSION: &'static str = "0.0.0";
    pub const DEFAULT_MOTD: &'static str = "-";

    fn from_result(result: &ProbeResult) -> Self {
        if !result.succeeded() {
            return Self {
                last_error: result.error().map(crate::protocol::ProbeError::kind),
                last_update: Some(result.completed_at()),
                ..Self::default()
            };
        }
        Self {
            online: true,
            player_count: result.online_players(),
            max_players: result.max_players(),
            version: result.version().to_string(),
            motd: strip_formatting(result.display_motd()),
            last_error: None,
            players: result.sample().to_vec(),
            last_update: Some(result.completed_at()),
        }
    }

    /// `HH:MM:SS` (UTC) of the last update, or `-`.
    #[must_use]
    pub fn last_update_display(&self) -> String {
        self.last_update
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map_or_else(
                || "-".to_string(),
                |since_epoch| {
                    let secs = since_epoch.as_secs() % 86_400;
                    format!("{:02}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60)
                },
            )
    }
}

impl Default for EntryView {
    fn default() -> Self {
        Self {
            online: false,
            player_count: 0,
            max_players: 0,
            version: Self::DEFAULT_VERSION.to_string(),
            motd: Self::DEFAULT_MOTD.to_string(),
            last_error: None,
            players: Vec::new(),
            last_update: None,
        }
    }
}

#[derive(Debug, Clone)]
struct PlayerRecord {
    name: String,
    online: bool,
}

#[derive(Debug, Default)]
struct EntryState {
    notify: NotifySettings,
    last: Option<Arc<ProbeResult>>,
    players: BTreeMap<String, PlayerRecord>,
    view: EntryView,
}

/// A user-facing watch on one probe target.
///
/// Several entries may share one [`ServerProbe`]. Each entry diffs the
/// probe's latest result against the last one it saw and reports changes
/// as [`StatusEvent`]s.
#[derive(Debug)]
pub struct ServerEntry {
    id: u64,
    label: String,
    probe: Arc<ServerProbe>,
    state: Mutex<EntryState>,
}

impl ServerEntry {
    #[must_use]
    pub fn new(id: u64, label: impl Into<String>, probe: Arc<ServerProbe>) -> Self {
        Self {
            id,
            label: label.into(),
            probe,
            state: Mutex::new(EntryState::default()),
        }
    }

    /// Replaces the notification settings.
    #[must_use]
    pub fn with_notify(self, notify: NotifySettings) -> Self {
        self.lock_state().notify = notify;
        self
    }

    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub const fn probe(&self) -> &Arc<ServerProbe> {
        &self.probe
    }

    #[must_use]
    pub fn notify(&self) -> NotifySettings {
        self.lock_state().notify
    }

    pub fn set_notify(&self, notify: NotifySettings) {
        self.lock_state().notify = notify;
    }

    /// Snapshot of the mirrored display fields.
    #[must_use]
    pub fn view(&self) -> EntryView {
        self.lock_state().view.clone()
    }

    /// Last known name for a player id, whether or not they are online.
    #[must_use]
    pub fn player_name(&self, id: &str) -> Option<String> {
        self.lock_state().players.get(id).map(|p| p.name.clone())
    }

    /// Whether a player id is currently tracked as online.
    #[must_use]
    pub fn is_player_online(&self, id: &str) -> bool {
        self.lock_state().players.get(id).is_some_and(|p| p.online)
    }

    /// Diffs the probe's latest result against the last one seen.
    ///
    /// Event order: online change, count change, joins in sample order,
    /// then leaves. The first observation reports the full player count
    /// as a gain. Without any result, the view resets to its defaults and
    /// no events are produced.
    pub fn update(&self) -> Vec<StatusEvent> {
        let current = self.probe.latest(false);
        let mut state = self.lock_state();

        let Some(current) = current else {
            state.last = None;
            state.view = EntryView::default();
            return Vec::new();
        };

        let mut events = Vec::new();
        let notify = state.notify;
        let online = current.succeeded();

        let was_online = state.last.as_ref().map(|last| last.succeeded());
        if notify.online_status && was_online != Some(online) {
            events.push(if online {
                StatusEvent::online(current.plain_motd())
            } else {
                StatusEvent::offline(offline_text(&current))
            });
        }

        let previous_count = state.last.as_ref().map_or(0, |last| last.online_players());
        let delta = i64::from(current.online_players()) - i64::from(previous_count);
        if notify.player_count && delta != 0 {
            events.push(StatusEvent::count_changed(delta));
        }

        let presence = track_players(&mut state.players, current.sample());
        if notify.named_players {
            events.extend(presence);
        }

        state.view = EntryView::from_result(&current);
        state.last = Some(current);

        if !events.is_empty() {
            tracing::debug!("{}: {} event(s)", self.label, events.len());
        }
        events
    }

    fn lock_state(&self) -> MutexGuard<'_, EntryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn offline_text(result: &ProbeResult) -> String {
    result
        .error()
        .map(|e| format!("Connection Failed: {}", e.kind()))
        .unwrap_or_default()
}

/// Updates the presence table from `sample`, returning joins then leaves.
///
/// Leaves are only produced for ids previously marked online.
fn track_players(
    players: &mut BTreeMap<String, PlayerRecord>,
    sample: &[PlayerSample],
) -> Vec<StatusEvent> {
    let mut events = Vec::new();

    for player in sample {
        let record = players
            .entry(player.id.clone())
            .or_insert_with(|| PlayerRecord {
                name: player.name.clone(),
                online: false,
            });
        record.name.clone_from(&player.name);
        if !record.online {
            record.online = true;
            events.push(StatusEvent::joined(player.clone()));
        }
    }

    for (id, record) in players.iter_mut() {
        if record.online && !sample.iter().any(|p| &p.id == id) {
            record.online = false;
            events.push(StatusEvent::left(PlayerSample::new(id, &record.name)));
        }
    }

    events
}
