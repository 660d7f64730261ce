//! Legacy (pre-netty) server list ping.
//!
//! The client sends `0xFE 0x01` followed by a `MC|PingHost` plugin message
//! and the server answers with a kick packet (`0xFF`) whose reason string
//! carries the status. Two reason layouts exist:
//!
//! ```text
//! 1.4 - 1.6:  §1 \0 protocol \0 version \0 motd \0 online \0 max
//! beta-1.3:   motd § online § max
//! ```

use std::time::SystemTime;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::Instant;

use super::error::{ProbeError, legacy_io_error};
use super::snapshot::{ServerStatus, Snapshot};
use super::target::Target;
use super::{StatusPing, connect, run_exchange};

const SERVER_LIST_PING: [u8; 2] = [0xFE, 0x01];
const PLUGIN_MESSAGE: u8 = 0xFA;
const PING_HOST_CHANNEL: &str = "MC|PingHost";
const KICK_PACKET: u8 = 0xFF;
const MODERN_PREFIX: &str = "\u{a7}1\0";
const FIELD_SEPARATOR: char = '\u{a7}';

/// Legacy status-ping codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyPing {
    protocol_version: u8,
}

impl LegacyPing {
    /// Protocol version announced in the plugin message (1.6.2).
    pub const DEFAULT_PROTOCOL_VERSION: u8 = 74;

    #[must_use]
    pub const fn new() -> Self {
        Self {
            protocol_version: Self::DEFAULT_PROTOCOL_VERSION,
        }
    }

    /// Builds the ping request for `target`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn request_bytes(&self, target: &Target) -> Vec<u8> {
        let channel = utf16_be(PING_HOST_CHANNEL);
        let host = utf16_be(target.host());
        let host_chars = (host.len() / 2) as u16;
        let data_len = (7 + host.len()) as u16;

        let mut request = Vec::with_capacity(16 + channel.len() + host.len());
        request.extend_from_slice(&SERVER_LIST_PING);
        request.push(PLUGIN_MESSAGE);
        request.extend_from_slice(&((channel.len() / 2) as u16).to_be_bytes());
        request.extend(channel);
        request.extend_from_slice(&data_len.to_be_bytes());
        request.push(self.protocol_version);
        request.extend_from_slice(&host_chars.to_be_bytes());
        request.extend(host);
        request.extend_from_slice(&i32::from(target.port()).to_be_bytes());
        request
    }

    async fn exchange(&self, target: &Target) -> Result<ServerStatus, ProbeError> {
        let mut stream = connect(target).await?;
        stream
            .write_all(&self.request_bytes(target))
            .await
            .map_err(legacy_io_error)?;
        stream.flush().await.map_err(legacy_io_error)?;

        let response = read_kick_packet(&mut stream).await?;
        decode_response(&response)
    }
}

impl Default for LegacyPing {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusPing for LegacyPing {
    async fn ping(&self, target: &Target, requested_at: SystemTime, deadline: Instant) -> Snapshot {
        run_exchange(requested_at, deadline, self.exchange(target)).await
    }
}

fn utf16_be(value: &str) -> Vec<u8> {
    value.encode_utf16().flat_map(u16::to_be_bytes).collect()
}

async fn read_kick_packet(stream: &mut TcpStream) -> Result<Vec<u8>, ProbeError> {
    let id = stream.read_u8().await.map_err(legacy_io_error)?;
    if id != KICK_PACKET {
        return Err(unexpected_packet(id));
    }
    let declared = stream.read_u16().await.map_err(legacy_io_error)?;
    let len = 3 + usize::from(declared) * 2;

    let mut response = Vec::with_capacity(len);
    response.push(id);
    response.extend_from_slice(&declared.to_be_bytes());
    response.resize(len, 0);
    stream
        .read_exact(&mut response[3..])
        .await
        .map_err(legacy_io_error)?;
    Ok(response)
}

fn unexpected_packet(id: u8) -> ProbeError {
    ProbeError::malformed_legacy(format!(
        "expected kick packet 0x{KICK_PACKET:02X}, got 0x{id:02X}"
    ))
}

/// Decodes a complete kick packet.
///
/// # Errors
///
/// Returns [`ProbeError::MalformedLegacy`] for a wrong packet id, a length
/// that does not match the buffer, invalid UTF-16, or an unknown layout.
pub fn decode_response(response: &[u8]) -> Result<ServerStatus, ProbeError> {
    let (&id, rest) = response
        .split_first()
        .ok_or_else(|| ProbeError::malformed_legacy("empty response"))?;
    if id != KICK_PACKET {
        return Err(unexpected_packet(id));
    }

    let (len, payload) = rest
        .split_first_chunk::<2>()
        .ok_or_else(|| ProbeError::malformed_legacy("response truncated"))?;
    let chars = usize::from(u16::from_be_bytes(*len));
    if payload.len() != chars * 2 {
        return Err(ProbeError::malformed_legacy(format!(
            "declared {chars} characters, got {} bytes",
            payload.len()
        )));
    }

    let units: Vec<u16> = payload
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    let reason = String::from_utf16(&units)
        .map_err(|_| ProbeError::malformed_legacy("reason is not valid UTF-16"))?;

    parse_reason(&reason)
}

/// Parses the kick reason in either known layout.
///
/// # Errors
///
/// Returns [`ProbeError::MalformedLegacy`] if the field count is wrong or
/// a number does not parse.
pub fn parse_reason(reason: &str) -> Result<ServerStatus, ProbeError> {
    if let Some(fields) = reason.strip_prefix(MODERN_PREFIX) {
        let fields: Vec<&str> = fields.split('\0').collect();
        let [protocol, version, motd, online, max] = fields.as_slice() else {
            return Err(ProbeError::malformed_legacy(format!(
                "expected 6 fields, got {}",
                fields.len() + 1
            )));
        };
        return Ok(ServerStatus {
            motd: (*motd).to_string(),
            max_players: parse_number("max players", max)?,
            online_players: parse_number("online players", online)?,
            version: (*version).to_string(),
            protocol: Some(parse_number("protocol", protocol)?),
            ..ServerStatus::default()
        });
    }

    let mut fields = reason.rsplitn(3, FIELD_SEPARATOR);
    let (Some(max), Some(online), Some(motd)) = (fields.next(), fields.next(), fields.next())
    else {
        return Err(ProbeError::malformed_legacy("unrecognised reason layout"));
    };
    Ok(ServerStatus {
        motd: motd.to_string(),
        max_players: parse_number("max players", max)?,
        online_players: parse_number("online players", online)?,
        ..ServerStatus::default()
    })
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, ProbeError> {
    value
        .trim()
        .parse()
        .map_err(|_| ProbeError::malformed_legacy(format!("invalid {field} '{value}'")))
}
