//! Little-endian base-128 VarInt used by the modern framing.
//!
//! A value occupies at most [`MAX_LEN`] bytes. Each byte carries seven
//! payload bits; the high bit marks continuation. Negative values are
//! encoded through their two's-complement `u32` representation and so
//! always take five bytes.

use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::{ProbeError, ProtocolViolation, modern_io_error};

/// Maximum encoded length of a 32-bit VarInt.
pub const MAX_LEN: usize = 5;

const SEGMENT: u8 = 0x7F;
const CONTINUE: u8 = 0x80;

/// Appends the encoding of `value` to `buf`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn encode_into(value: i32, buf: &mut Vec<u8>) {
    let mut rest = value as u32;
    loop {
        let byte = (rest & u32::from(SEGMENT)) as u8;
        rest >>= 7;
        if rest == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | CONTINUE);
    }
}

/// Returns the encoding of `value`.
#[must_use]
pub fn encode(value: i32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(MAX_LEN);
    encode_into(value, &mut buf);
    buf
}

/// Decodes a VarInt from the front of `buf`.
///
/// Returns the value and the number of bytes consumed.
///
/// # Errors
///
/// - [`ProtocolViolation::Truncated`] if `buf` ends mid-value
/// - [`ProtocolViolation::VarIntTooLong`] if a sixth byte would be needed
#[allow(clippy::cast_possible_wrap)]
pub fn decode(buf: &[u8]) -> Result<(i32, usize), ProtocolViolation> {
    let mut value: u32 = 0;
    for position in 0..MAX_LEN {
        let byte = *buf.get(position).ok_or(ProtocolViolation::Truncated)?;
        value |= u32::from(byte & SEGMENT) << (7 * position);
        if byte & CONTINUE == 0 {
            return Ok((value as i32, position + 1));
        }
    }
    Err(ProtocolViolation::VarIntTooLong)
}

/// Reads a VarInt from a stream one byte at a time.
///
/// # Errors
///
/// - [`ProtocolViolation::VarIntTooLong`] if a sixth byte would be needed
/// - [`ProtocolViolation::Truncated`] if the stream closes mid-value
/// - [`ProbeError::Connect`] on other socket errors
#[allow(clippy::cast_possible_wrap)]
pub async fn read<R>(reader: &mut R) -> Result<i32, ProbeError>
where
    R: AsyncRead + Unpin,
{
    let mut value: u32 = 0;
    for position in 0..MAX_LEN {
        let byte = reader.read_u8().await.map_err(modern_io_error)?;
        value |= u32::from(byte & SEGMENT) << (7 * position);
        if byte & CONTINUE == 0 {
            return Ok(value as i32);
        }
    }
    Err(ProtocolViolation::VarIntTooLong.into())
}
