//! Human-readable messages for status events.
//!
//! Templates use Handlebars syntax. Available variables:
//!
//! - `{{text}}`: status text of an online/offline event
//! - `{{count}}`: signed player-count delta, e.g. `+3` or `-1`
//! - `{{name}}`: player name of a presence event
//! - `{{id}}`: player id of a presence event

use handlebars::{Handlebars, RenderError};
use serde::Serialize;

use super::StatusEvent;

/// Turns events into messages.
pub trait MessageTemplates: Send + Sync {
    fn render(&self, event: &StatusEvent) -> String;
}

/// Template set for every event kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMessages {
    pub online: String,
    pub offline: String,
    pub count_changed: String,
    pub player_joined: String,
    pub player_left: String,
}

impl EventMessages {
    pub const DEFAULT_ONLINE: &'static str = "Server is online: {{text}}";
    pub const DEFAULT_OFFLINE: &'static str = "Server is offline: {{text}}";
    pub const DEFAULT_COUNT_CHANGED: &'static str = "Player count changed: {{count}}";
    pub const DEFAULT_PLAYER_JOINED: &'static str = "Player joined: {{name}}";
    pub const DEFAULT_PLAYER_LEFT: &'static str = "Player left: {{name}}";

    /// Checks that `template` parses.
    ///
    /// # Errors
    ///
    /// Returns the Handlebars error for a malformed template.
    pub fn validate(template: &str) -> Result<(), RenderError> {
        Handlebars::new().render_template(template, &serde_json::json!({}))?;
        Ok(())
    }

    fn templates_for(&self, event: &StatusEvent) -> (&str, &'static str) {
        match event {
            StatusEvent::OnlineStatusChanged { online: true, .. } => {
                (&self.online, Self::DEFAULT_ONLINE)
            }
            StatusEvent::OnlineStatusChanged { online: false, .. } => {
                (&self.offline, Self::DEFAULT_OFFLINE)
            }
            StatusEvent::PlayerCountChanged { .. } => {
                (&self.count_changed, Self::DEFAULT_COUNT_CHANGED)
            }
            StatusEvent::PlayerPresenceChanged { online: true, .. } => {
                (&self.player_joined, Self::DEFAULT_PLAYER_JOINED)
            }
            StatusEvent::PlayerPresenceChanged { online: false, .. } => {
                (&self.player_left, Self::DEFAULT_PLAYER_LEFT)
            }
        }
    }
}

impl Default for EventMessages {
    fn default() -> Self {
        Self {
            online: Self::DEFAULT_ONLINE.to_string(),
            offline: Self::DEFAULT_OFFLINE.to_string(),
            count_changed: Self::DEFAULT_COUNT_CHANGED.to_string(),
            player_joined: Self::DEFAULT_PLAYER_JOINED.to_string(),
            player_left: Self::DEFAULT_PLAYER_LEFT.to_string(),
        }
    }
}

impl MessageTemplates for EventMessages {
    /// Renders `event`, falling back to the built-in template if the
    /// configured one fails.
    fn render(&self, event: &StatusEvent) -> String {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        let data = TemplateData::from(event);
        let (template, fallback) = self.templates_for(event);

        handlebars
            .render_template(template, &data)
            .or_else(|e| {
                tracing::warn!("Message template failed, using default: {e}");
                handlebars.render_template(fallback, &data)
            })
            .unwrap_or_default()
    }
}

#[derive(Serialize)]
struct TemplateData<'a> {
    text: Option<&'a str>,
    count: Option<String>,
    name: Option<&'a str>,
    id: Option<&'a str>,
}

impl<'a> From<&'a StatusEvent> for TemplateData<'a> {
    fn from(event: &'a StatusEvent) -> Self {
        let empty = Self {
            text: None,
            count: None,
            name: None,
            id: None,
        };
        match event {
            StatusEvent::OnlineStatusChanged { status_text, .. } => Self {
                text: Some(status_text.as_str()),
                ..empty
            },
            StatusEvent::PlayerCountChanged { delta } => Self {
                count: Some(format!("{delta:+}")),
                ..empty
            },
            StatusEvent::PlayerPresenceChanged { player, .. } => Self {
                name: Some(player.name.as_str()),
                id: Some(player.id.as_str()),
                ..empty
            },
        }
    }
}
