use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::Instant;

use super::{ProbeResult, ServerProbe};
use crate::protocol::{
    LegacyPing, ModernPing, ProbeError, ProbeErrorKind, ServerStatus, Snapshot, Target,
};
use crate::time::ManualClock;

const MODERN_JSON: &str = r#"{"version":{"name":"1.20.4","protocol":765},"players":{"max":20,"online":1,"sample":[{"id":"u1","name":"Alex"}]},"description":{"text":"Modern"}}"#;
const LEGACY_REASON: &str = "\u{a7}1\u{0}127\u{0}1.6.4\u{0}Legacy motd\u{0}1\u{0}20";

fn at(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

fn result_at(secs: u64, succeeded: bool) -> ProbeResult {
    let snapshot = || {
        if succeeded {
            Snapshot::success(at(secs), Duration::from_millis(5), ServerStatus::default())
        } else {
            Snapshot::failure(at(secs), Duration::from_millis(5), ProbeError::Timeout)
        }
    };
    ProbeResult::new(snapshot(), snapshot())
}

fn manual_probe(now_secs: u64) -> (Arc<ManualClock>, ServerProbe<Arc<ManualClock>>) {
    let clock = Arc::new(ManualClock::new(at(now_secs)));
    let probe = ServerProbe::with_clock(Target::new("localhost", 25565), Arc::clone(&clock));
    (clock, probe)
}

/// Serves `connections` pings on one port, answering each in its own protocol.
async fn serve_both(connections: usize) -> Target {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let target = Target::new("127.0.0.1", listener.local_addr().unwrap().port());
    let legacy_len = LegacyPing::new().request_bytes(&target).len();
    let modern_len = ModernPing::new().request_bytes(&target).len();

    tokio::spawn(async move {
        for _ in 0..connections {
            let (mut socket, _) = listener.accept().await.unwrap();
            tokio::spawn(async move {
                let first = socket.read_u8().await.unwrap();
                let (len, response) = if first == 0xFE {
                    (legacy_len, legacy_packet(LEGACY_REASON))
                } else {
                    (modern_len, modern_packet(MODERN_JSON))
                };
                let mut rest = vec![0u8; len - 1];
                socket.read_exact(&mut rest).await.unwrap();
                socket.write_all(&response).await.unwrap();
            });
        }
    });

    target
}

/// Accepts connections and never answers.
async fn serve_silent() -> Target {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let target = Target::new("127.0.0.1", listener.local_addr().unwrap().port());
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    target
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn modern_packet(json: &str) -> Vec<u8> {
    let mut body = vec![0x00];
    body.extend(crate::protocol::varint::encode(json.len() as i32));
    body.extend_from_slice(json.as_bytes());
    let mut packet = crate::protocol::varint::encode(body.len() as i32);
    packet.extend(body);
    packet
}

#[allow(clippy::cast_possible_truncation)]
fn legacy_packet(reason: &str) -> Vec<u8> {
    let units: Vec<u16> = reason.encode_utf16().collect();
    let mut packet = vec![0xFF];
    packet.extend_from_slice(&(units.len() as u16).to_be_bytes());
    packet.extend(units.iter().flat_map(|u| u.to_be_bytes()));
    packet
}

// =============================================================================
// History
// =============================================================================

#[test]
fn latest_picks_greatest_completion_time() {
    let (_clock, probe) = manual_probe(100);
    probe.record(result_at(95, true));
    probe.record(result_at(99, false));
    probe.record(result_at(97, true));

    let latest = probe.latest(false).unwrap();
    assert_eq!(latest.requested_at(), at(99));

    let latest_ok = probe.latest(true).unwrap();
    assert_eq!(latest_ok.requested_at(), at(97));
}

#[test]
fn latest_on_empty_history_is_none() {
    let (_clock, probe) = manual_probe(100);
    assert!(probe.latest(false).is_none());
    assert!(probe.latest(true).is_none());
}

#[test]
fn latest_successful_is_none_when_all_failed() {
    let (_clock, probe) = manual_probe(100);
    probe.record(result_at(100, false));

    assert!(probe.latest(false).is_some());
    assert!(probe.latest(true).is_none());
}

#[test]
fn record_purges_results_older_than_retention() {
    let (clock, probe) = manual_probe(1_000);
    let probe = probe.with_retention(Duration::from_secs(60));
    probe.record(result_at(950, true));
    probe.record(result_at(990, true));

    clock.advance(Duration::from_secs(20));
    probe.record(result_at(1_020, true));

    let kept: Vec<_> = probe.history().iter().map(|r| r.requested_at()).collect();
    assert_eq!(kept, vec![at(990), at(1_020)]);
}

#[test]
fn purged_result_stays_valid_for_holders() {
    let (clock, probe) = manual_probe(100);
    let held = probe.record(result_at(100, true));

    clock.advance(Duration::from_secs(120));
    probe.record(result_at(220, true));

    assert_eq!(probe.history().len(), 1);
    assert_eq!(held.requested_at(), at(100));
    assert!(held.succeeded());
}

#[test]
fn matches_host_case_insensitively() {
    let probe = ServerProbe::new(Target::new("MC.Example.org", 25565));
    assert!(probe.matches("mc.example.org", 25565));
    assert!(!probe.matches("mc.example.org", 25566));
}

// =============================================================================
// Probing
// =============================================================================

#[tokio::test]
async fn probe_runs_both_protocols() {
    let target = serve_both(2).await;
    let probe = ServerProbe::new(target);

    let result = probe.probe(Duration::from_secs(5)).await;

    assert!(result.legacy().succeeded(), "{:?}", result.legacy().error());
    assert!(result.modern().succeeded(), "{:?}", result.modern().error());
    assert_eq!(result.motd(), "Modern");
    assert_eq!(result.display_motd(), "Legacy motd");
    assert_eq!(result.sample().len(), 1);
    assert!(result.ping() <= result.elapsed());

    let latest = probe.latest(true).unwrap();
    assert!(Arc::ptr_eq(&latest, &result));
}

#[tokio::test]
async fn unreachable_localhost_fails_within_timeout() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let probe = ServerProbe::new(Target::new("127.0.0.1", port));
    let started = Instant::now();

    let result = probe.probe(Duration::from_secs(1)).await;

    assert!(!result.succeeded());
    for snapshot in [result.legacy(), result.modern()] {
        let kind = snapshot.error().map(ProbeError::kind);
        assert!(
            matches!(
                kind,
                Some(ProbeErrorKind::ConnectFailure | ProbeErrorKind::Timeout)
            ),
            "{kind:?}"
        );
    }
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(probe.history().len(), 1);
}

#[tokio::test]
async fn oversized_timeout_still_records_a_result() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let probe = ServerProbe::new(Target::new("127.0.0.1", port));

    let result = probe.probe(Duration::from_secs(u64::MAX)).await;

    assert!(!result.succeeded());
    assert_eq!(probe.history().len(), 1);
}

#[tokio::test]
async fn results_are_stamped_and_purged_by_injected_clock() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let target = Target::new("127.0.0.1", listener.local_addr().unwrap().port());
    drop(listener);
    let clock = Arc::new(ManualClock::new(at(1_000)));
    let probe = ServerProbe::with_clock(target, Arc::clone(&clock))
        .with_retention(Duration::from_secs(60));

    let first = probe.probe(Duration::from_secs(1)).await;
    assert_eq!(first.requested_at(), at(1_000));
    assert_eq!(first.legacy().requested_at(), at(1_000));

    clock.advance(Duration::from_secs(600));
    let second = probe.probe(Duration::from_secs(1)).await;

    let history = probe.history();
    assert_eq!(history.len(), 1);
    assert!(Arc::ptr_eq(&history[0], &second));
    assert_eq!(second.requested_at(), at(1_600));
}

#[tokio::test]
async fn silent_server_times_out_both_protocols() {
    let target = serve_silent().await;
    let probe = ServerProbe::new(target);

    let result = probe.probe(Duration::from_millis(200)).await;

    assert_eq!(
        result.legacy().error().map(ProbeError::kind),
        Some(ProbeErrorKind::Timeout)
    );
    assert_eq!(
        result.modern().error().map(ProbeError::kind),
        Some(ProbeErrorKind::Timeout)
    );
    assert!(probe.latest(true).is_none());
}
