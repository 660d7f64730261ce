//! Minecraft status-ping wire protocols.
//!
//! This module provides:
//! - [`Target`]: case-insensitive `(host, port)` identity
//! - [`LegacyPing`]: pre-netty `0xFE 0x01` server list ping
//! - [`ModernPing`]: handshake + status request (1.7+)
//! - [`Snapshot`]: the outcome of one attempt over one protocol
//! - [`ProbeError`] / [`ProbeErrorKind`]: failure classification
//!
//! Both codecs honour an absolute deadline covering connect, write and
//! read. Failures are returned inside the [`Snapshot`], never raised.

mod error;
mod legacy;
mod modern;
mod snapshot;
mod target;
pub mod varint;

#[cfg(test)]
mod fake_server;
#[cfg(test)]
mod legacy_tests;
#[cfg(test)]
mod varint_tests;

use std::future::Future;
use std::time::SystemTime;

use tokio::net::TcpStream;
use tokio::time::Instant;

pub use error::{ProbeError, ProbeErrorKind, ProtocolViolation};
pub use legacy::{LegacyPing, decode_response as decode_legacy_response, parse_reason};
pub use modern::{MAX_PACKET_LEN, ModernPing, parse_packet, parse_status_json, read_packet};
pub use snapshot::{PlayerSample, ServerStatus, Snapshot};
pub use target::{Target, TargetParseError};

/// Default Minecraft server port.
pub const DEFAULT_PORT: u16 = 25565;

const FORMATTING_PREFIX: char = '\u{a7}';

/// One status-ping protocol variant.
///
/// Implementations must return by `deadline` and close their socket on
/// every path.
pub trait StatusPing: Send + Sync {
    /// Pings `target`, capturing success or failure in the snapshot.
    ///
    /// `requested_at` stamps the snapshot, so every result in one history
    /// shares the caller's time base.
    fn ping(
        &self,
        target: &Target,
        requested_at: SystemTime,
        deadline: Instant,
    ) -> impl Future<Output = Snapshot> + Send;
}

/// Runs one exchange under `deadline` and records its timing.
///
/// The exchange future owns its socket, so dropping it on timeout closes
/// the connection.
pub(crate) async fn run_exchange<F>(
    requested_at: SystemTime,
    deadline: Instant,
    exchange: F,
) -> Snapshot
where
    F: Future<Output = Result<ServerStatus, ProbeError>>,
{
    let started = Instant::now();

    let outcome = tokio::time::timeout_at(deadline, exchange)
        .await
        .unwrap_or(Err(ProbeError::Timeout));

    Snapshot::new(requested_at, started.elapsed(), outcome)
}

pub(crate) async fn connect(target: &Target) -> Result<TcpStream, ProbeError> {
    let stream = TcpStream::connect((target.host(), target.port()))
        .await
        .map_err(|source| ProbeError::Connect { source })?;
    // Requests are tiny; do not let Nagle hold the status request back.
    let _ = stream.set_nodelay(true);
    Ok(stream)
}

/// Removes `§x` formatting codes from a message of the day.
///
/// A trailing lone `§` is dropped as well.
#[must_use]
pub fn strip_formatting(raw: &str) -> String {
    let mut plain = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == FORMATTING_PREFIX {
            chars.next();
        } else {
            plain.push(c);
        }
    }
    plain
}
