//! Modern (1.7+) server list ping.
//!
//! Exchange:
//!
//! ```text
//! C -> S  [len][0x00][proto VarInt][host String][port u16 BE][0x01]   handshake
//! C -> S  [0x01][0x00]                                              status request
//! S -> C  [len][packet id][json len][json UTF-8]                    status response
//! ```

use std::time::SystemTime;

use serde::Deserialize;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::time::Instant;

use super::error::{ProbeError, ProtocolViolation, modern_io_error};
use super::snapshot::{PlayerSample, ServerStatus, Snapshot};
use super::target::Target;
use super::{StatusPing, connect, run_exchange, varint};

/// Upper bound on a status response packet.
///
/// Favicons are base64 PNGs of a few KiB; anything near this size is garbage.
pub const MAX_PACKET_LEN: usize = 2 * 1024 * 1024;

const HANDSHAKE_ID: i32 = 0x00;
const STATUS_REQUEST_ID: i32 = 0x00;
const NEXT_STATE_STATUS: i32 = 1;

/// Modern status-ping codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModernPing {
    protocol_version: i32,
}

impl ModernPing {
    /// Protocol version announced in the handshake (1.8).
    pub const DEFAULT_PROTOCOL_VERSION: i32 = 47;

    #[must_use]
    pub const fn new() -> Self {
        Self {
            protocol_version: Self::DEFAULT_PROTOCOL_VERSION,
        }
    }

    /// Announces a different protocol version in the handshake.
    #[must_use]
    pub const fn with_protocol_version(mut self, protocol_version: i32) -> Self {
        self.protocol_version = protocol_version;
        self
    }

    #[must_use]
    pub const fn protocol_version(&self) -> i32 {
        self.protocol_version
    }

    /// Builds the handshake followed by the status request.
    ///
    /// Both packets go out in one write.
    #[must_use]
    pub fn request_bytes(&self, target: &Target) -> Vec<u8> {
        let mut payload = Vec::with_capacity(target.host().len() + 16);
        varint::encode_into(self.protocol_version, &mut payload);
        write_string(target.host(), &mut payload);
        payload.extend_from_slice(&target.port().to_be_bytes());
        varint::encode_into(NEXT_STATE_STATUS, &mut payload);

        let mut request = frame(HANDSHAKE_ID, &payload);
        request.extend(frame(STATUS_REQUEST_ID, &[]));
        request
    }

    async fn exchange(&self, target: &Target) -> Result<ServerStatus, ProbeError> {
        let mut stream = connect(target).await?;
        stream
            .write_all(&self.request_bytes(target))
            .await
            .map_err(modern_io_error)?;
        stream.flush().await.map_err(modern_io_error)?;

        let packet = read_packet(&mut stream).await?;
        Ok(parse_packet(&packet)?)
    }
}

impl Default for ModernPing {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusPing for ModernPing {
    async fn ping(&self, target: &Target, requested_at: SystemTime, deadline: Instant) -> Snapshot {
        run_exchange(requested_at, deadline, self.exchange(target)).await
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn write_string(value: &str, buf: &mut Vec<u8>) {
    varint::encode_into(value.len() as i32, buf);
    buf.extend_from_slice(value.as_bytes());
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn frame(packet_id: i32, payload: &[u8]) -> Vec<u8> {
    let mut body = varint::encode(packet_id);
    body.extend_from_slice(payload);

    let mut packet = varint::encode(body.len() as i32);
    packet.extend(body);
    packet
}

/// Reads one length-prefixed packet body (id and payload).
///
/// # Errors
///
/// - [`ProtocolViolation::InvalidLength`] for a non-positive or oversized length
/// - [`ProtocolViolation::Truncated`] if the stream closes early
pub async fn read_packet<R>(reader: &mut R) -> Result<Vec<u8>, ProbeError>
where
    R: AsyncRead + Unpin,
{
    let declared = varint::read(reader).await?;
    let len = usize::try_from(declared)
        .ok()
        .filter(|len| (1..=MAX_PACKET_LEN).contains(len))
        .ok_or(ProtocolViolation::InvalidLength(declared))?;

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await.map_err(modern_io_error)?;
    Ok(body)
}

/// Decodes a status response body: packet id, then a VarInt-prefixed JSON string.
///
/// # Errors
///
/// Returns a [`ProtocolViolation`] for bad framing or JSON.
pub fn parse_packet(body: &[u8]) -> Result<ServerStatus, ProtocolViolation> {
    let (_packet_id, id_len) = varint::decode(body)?;
    let rest = &body[id_len..];

    let (declared, len_len) = varint::decode(rest)?;
    let json_len = usize::try_from(declared).map_err(|_| ProtocolViolation::InvalidLength(declared))?;
    let json = rest
        .get(len_len..len_len + json_len)
        .ok_or(ProtocolViolation::Truncated)?;
    let json = std::str::from_utf8(json).map_err(|_| ProtocolViolation::InvalidUtf8)?;

    parse_status_json(json)
}

#[derive(Deserialize)]
struct StatusJson {
    #[serde(default)]
    description: Value,
    players: PlayersJson,
    version: VersionJson,
    favicon: Option<String>,
}

#[derive(Deserialize)]
struct PlayersJson {
    max: u32,
    online: u32,
    #[serde(default)]
    sample: Option<Vec<SampleJson>>,
}

#[derive(Deserialize)]
struct SampleJson {
    id: Option<String>,
    name: Option<String>,
}

#[derive(Deserialize)]
struct VersionJson {
    name: String,
    protocol: Option<i32>,
}

/// Decodes the status JSON document.
///
/// The description is taken from `description.text`, falling back to a
/// plain string description. Sample entries without both `id` and `name`
/// are skipped.
///
/// # Errors
///
/// - [`ProtocolViolation::InvalidJson`] if the document does not match
/// - [`ProtocolViolation::EmptyDescription`] if no description text is found
pub fn parse_status_json(json: &str) -> Result<ServerStatus, ProtocolViolation> {
    let parsed: StatusJson =
        serde_json::from_str(json).map_err(|e| ProtocolViolation::InvalidJson(e.to_string()))?;

    let motd = description_text(&parsed.description);
    if motd.is_empty() {
        return Err(ProtocolViolation::EmptyDescription);
    }

    let sample = parsed
        .players
        .sample
        .unwrap_or_default()
        .into_iter()
        .filter_map(|entry| Some(PlayerSample::new(entry.id?, entry.name?)))
        .collect();

    Ok(ServerStatus {
        motd,
        max_players: parsed.players.max,
        online_players: parsed.players.online,
        version: parsed.version.name,
        protocol: parsed.version.protocol,
        favicon: parsed.favicon,
        sample,
    })
}

fn description_text(description: &Value) -> String {
    let text = description
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if text.is_empty() {
        description.as_str().unwrap_or_default().to_string()
    } else {
        text.to_string()
    }
}
