//! mcsw: Minecraft server watcher
//!
//! A library for probing Minecraft servers over the legacy and modern
//! status-ping protocols, keeping a short history of results and turning
//! successive results into online, player count and player presence events.

pub mod config;
pub mod probe;
pub mod protocol;
pub mod registry;
pub mod status;
pub mod time;
