//! Change detection over probe results.
//!
//! - [`ServerEntry`]: diffs successive results of one probe into events
//! - [`StatusEvent`]: online, player-count and player-presence changes
//! - [`MessageTemplates`] / [`EventMessages`]: event text rendering

mod entry;
mod event;
mod message;


pub use entry::{EntryView, NotifySettings, ServerEntry};
pub use event::StatusEvent;
pub use message::{EventMessages, MessageTemplates};
