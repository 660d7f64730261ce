//! Events emitted when a server's observed state changes.

use std::fmt;

use crate::protocol::PlayerSample;

use super::message::{EventMessages, MessageTemplates};

/// One observed change between two probe results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    /// The server went online or offline.
    OnlineStatusChanged {
        /// New online state
        online: bool,
        /// Plain motd when online, `Connection Failed: <kind>` when offline
        status_text: String,
    },

    /// The online player count moved by `delta`.
    PlayerCountChanged {
        /// Signed change; never zero
        delta: i64,
    },

    /// A sampled player joined or left.
    PlayerPresenceChanged {
        /// The player, named as last seen
        player: PlayerSample,
        /// True for a join, false for a leave
        online: bool,
    },
}

impl StatusEvent {
    #[must_use]
    pub fn online(status_text: impl Into<String>) -> Self {
        Self::OnlineStatusChanged {
            online: true,
            status_text: status_text.into(),
        }
    }

    #[must_use]
    pub fn offline(status_text: impl Into<String>) -> Self {
        Self::OnlineStatusChanged {
            online: false,
            status_text: status_text.into(),
        }
    }

    #[must_use]
    pub const fn count_changed(delta: i64) -> Self {
        Self::PlayerCountChanged { delta }
    }

    #[must_use]
    pub const fn joined(player: PlayerSample) -> Self {
        Self::PlayerPresenceChanged {
            player,
            online: true,
        }
    }

    #[must_use]
    pub const fn left(player: PlayerSample) -> Self {
        Self::PlayerPresenceChanged {
            player,
            online: false,
        }
    }

    /// Returns true for presence events.
    #[must_use]
    pub const fn is_presence(&self) -> bool {
        matches!(self, Self::PlayerPresenceChanged { .. })
    }
}

/// Renders with the built-in message templates.
impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&EventMessages::default().render(self))
    }
}
