use std::time::{Duration, SystemTime};

use tokio::time::Instant;

use super::fake_server::{closed_target, legacy_response, serve_and_hold, serve_once};
use super::{
    LegacyPing, ProbeError, ProbeErrorKind, StatusPing, Target, decode_legacy_response,
    parse_reason,
};

fn deadline() -> Instant {
    Instant::now() + Duration::from_secs(5)
}

fn utf16(value: &str) -> Vec<u8> {
    value.encode_utf16().flat_map(u16::to_be_bytes).collect()
}

#[test]
fn request_matches_golden_bytes() {
    let request = LegacyPing::new().request_bytes(&Target::new("localhost", 25565));

    let mut expected = vec![0xFE, 0x01, 0xFA, 0x00, 0x0B];
    expected.extend(utf16("MC|PingHost"));
    expected.extend_from_slice(&[0x00, 0x19, 0x4A, 0x00, 0x09]);
    expected.extend(utf16("localhost"));
    expected.extend_from_slice(&[0x00, 0x00, 0x63, 0xDD]);

    assert_eq!(request.len(), 54);
    assert_eq!(request, expected);
}

#[test]
fn decodes_modern_layout() {
    let response = legacy_response("\u{a7}1\u{0}127\u{0}1.6.4\u{0}A \u{a7}6gold\u{a7}r server\u{0}3\u{0}20");

    let status = decode_legacy_response(&response).unwrap();

    assert_eq!(status.protocol, Some(127));
    assert_eq!(status.version, "1.6.4");
    assert_eq!(status.motd, "A \u{a7}6gold\u{a7}r server");
    assert_eq!(status.online_players, 3);
    assert_eq!(status.max_players, 20);
    assert!(status.sample.is_empty());
    assert!(status.favicon.is_none());
}

#[test]
fn decodes_pre_1_4_layout() {
    let status = parse_reason("Old school\u{a7}0\u{a7}10").unwrap();

    assert_eq!(status.motd, "Old school");
    assert_eq!(status.online_players, 0);
    assert_eq!(status.max_players, 10);
    assert_eq!(status.protocol, None);
}

#[test]
fn wrong_packet_id_is_malformed() {
    let mut response = legacy_response("\u{a7}1\u{0}1\u{0}v\u{0}m\u{0}1\u{0}2");
    response[0] = 0xFE;

    let error = decode_legacy_response(&response).unwrap_err();
    assert_eq!(error.kind(), ProbeErrorKind::MalformedLegacyResponse);
    assert!(error.to_string().contains("0xFE"));
}

#[test]
fn length_mismatch_is_malformed() {
    let mut response = legacy_response("\u{a7}1\u{0}1\u{0}v\u{0}m\u{0}1\u{0}2");
    response.pop();

    assert!(matches!(
        decode_legacy_response(&response),
        Err(ProbeError::MalformedLegacy { .. })
    ));
}

#[test]
fn missing_fields_are_malformed() {
    assert!(parse_reason("\u{a7}1\u{0}127\u{0}1.6.4\u{0}motd").is_err());
    assert!(parse_reason("no separators at all").is_err());
}

#[test]
fn non_numeric_counts_are_malformed() {
    let error = parse_reason("\u{a7}1\u{0}127\u{0}1.6.4\u{0}m\u{0}many\u{0}20").unwrap_err();
    assert!(error.to_string().contains("many"));
}

#[tokio::test]
async fn pings_fake_server() {
    let ping = LegacyPing::new();
    let request_len = ping.request_bytes(&Target::new("127.0.0.1", 1)).len();
    let response = legacy_response("\u{a7}1\u{0}78\u{0}1.6.4\u{0}Legacy\u{0}1\u{0}8");
    let (target, server) = serve_once(request_len, response).await;

    let snapshot = ping.ping(&target, SystemTime::now(), deadline()).await;

    assert!(snapshot.succeeded(), "{:?}", snapshot.error());
    assert_eq!(snapshot.status().unwrap().motd, "Legacy");
    assert_eq!(server.await.unwrap(), ping.request_bytes(&target));
}

#[tokio::test]
async fn truncated_response_is_malformed() {
    let ping = LegacyPing::new();
    let request_len = ping.request_bytes(&Target::new("127.0.0.1", 1)).len();
    let (target, _server) = serve_once(request_len, vec![0xFF, 0x00, 0x10, 0x00]).await;

    let snapshot = ping.ping(&target, SystemTime::now(), deadline()).await;

    assert_eq!(
        snapshot.error().map(ProbeError::kind),
        Some(ProbeErrorKind::MalformedLegacyResponse)
    );
}

#[tokio::test]
async fn non_kick_reply_fails_without_waiting_for_body() {
    let ping = LegacyPing::new();
    let request_len = ping.request_bytes(&Target::new("127.0.0.1", 1)).len();
    // Declares a long body that never arrives; the connection stays open.
    let (target, _server) = serve_and_hold(request_len, vec![0x02, 0xFF, 0xFF]).await;
    let started = Instant::now();

    let snapshot = ping.ping(&target, SystemTime::now(), deadline()).await;

    let error = snapshot.error().unwrap();
    assert_eq!(error.kind(), ProbeErrorKind::MalformedLegacyResponse);
    assert!(error.to_string().contains("0x02"), "{error}");
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn snapshot_carries_given_request_time() {
    let target = closed_target().await;
    let requested_at = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);

    let snapshot = LegacyPing::new().ping(&target, requested_at, deadline()).await;

    assert_eq!(snapshot.requested_at(), requested_at);
}

#[tokio::test]
async fn refused_connection_is_connect_failure() {
    let target = closed_target().await;

    let snapshot = LegacyPing::new().ping(&target, SystemTime::now(), deadline()).await;

    assert_eq!(
        snapshot.error().map(ProbeError::kind),
        Some(ProbeErrorKind::ConnectFailure)
    );
}
