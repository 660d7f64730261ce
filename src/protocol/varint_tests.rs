use super::error::{ProbeError, ProtocolViolation};
use super::varint::{self, MAX_LEN};

const VECTORS: &[(i32, &[u8])] = &[
    (0, &[0x00]),
    (1, &[0x01]),
    (2, &[0x02]),
    (127, &[0x7f]),
    (128, &[0x80, 0x01]),
    (255, &[0xff, 0x01]),
    (25565, &[0xdd, 0xc7, 0x01]),
    (2_097_151, &[0xff, 0xff, 0x7f]),
    (2_147_483_647, &[0xff, 0xff, 0xff, 0xff, 0x07]),
    (-1, &[0xff, 0xff, 0xff, 0xff, 0x0f]),
    (-2_147_483_648, &[0x80, 0x80, 0x80, 0x80, 0x08]),
];

#[test]
fn encodes_known_vectors() {
    for (value, bytes) in VECTORS {
        assert_eq!(varint::encode(*value), *bytes, "encoding {value}");
    }
}

#[test]
fn decodes_known_vectors() {
    for (value, bytes) in VECTORS {
        assert_eq!(varint::decode(bytes), Ok((*value, bytes.len())), "decoding {value}");
    }
}

#[test]
fn decode_reports_consumed_length_and_ignores_trailing_bytes() {
    let buf = [0xdd, 0xc7, 0x01, 0x00, 0x2a];
    assert_eq!(varint::decode(&buf), Ok((25565, 3)));
}

#[test]
fn negative_values_take_five_bytes() {
    assert_eq!(varint::encode(-1).len(), MAX_LEN);
    assert_eq!(varint::encode(i32::MIN).len(), MAX_LEN);
}

#[test]
fn sixth_byte_is_rejected() {
    let buf = [0x80, 0x80, 0x80, 0x80, 0x80, 0x01];
    assert_eq!(varint::decode(&buf), Err(ProtocolViolation::VarIntTooLong));
}

#[test]
fn short_buffer_is_truncated() {
    assert_eq!(varint::decode(&[]), Err(ProtocolViolation::Truncated));
    assert_eq!(varint::decode(&[0x80, 0x80]), Err(ProtocolViolation::Truncated));
}

#[tokio::test]
async fn read_from_stream_matches_decode() {
    let mut stream: &[u8] = &[0xff, 0x01, 0x05];
    assert_eq!(varint::read(&mut stream).await.ok(), Some(255));
    assert_eq!(stream, &[0x05]);
}

#[tokio::test]
async fn read_from_stream_rejects_sixth_byte() {
    let mut stream: &[u8] = &[0xff, 0xff, 0xff, 0xff, 0xff, 0x01];
    let error = varint::read(&mut stream).await.unwrap_err();
    assert!(matches!(
        error,
        ProbeError::Protocol(ProtocolViolation::VarIntTooLong)
    ));
}

#[tokio::test]
async fn read_from_closed_stream_is_truncated() {
    let mut stream: &[u8] = &[0x80];
    let error = varint::read(&mut stream).await.unwrap_err();
    assert!(matches!(
        error,
        ProbeError::Protocol(ProtocolViolation::Truncated)
    ));
}
