//! Probe orchestration.
//!
//! A [`ServerProbe`] owns one target, runs both status-ping codecs against
//! it concurrently and keeps the resulting [`ProbeResult`]s for a bounded
//! time.

mod result;
mod server_probe;

#[cfg(test)]
mod server_probe_tests;

pub use result::ProbeResult;
pub use server_probe::ServerProbe;
