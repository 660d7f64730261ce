//! Loopback servers replaying canned status responses.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use super::target::Target;

/// Accepts one connection, reads exactly `request_len` bytes, writes
/// `response` and closes.
///
/// The handle yields the captured request.
pub async fn serve_once(request_len: usize, response: Vec<u8>) -> (Target, JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = vec![0u8; request_len];
        socket.read_exact(&mut request).await.unwrap();
        socket.write_all(&response).await.unwrap();
        socket.shutdown().await.ok();
        request
    });

    (Target::new("127.0.0.1", port), handle)
}

/// Like [`serve_once`], but keeps the connection open after writing.
pub async fn serve_and_hold(request_len: usize, response: Vec<u8>) -> (Target, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = vec![0u8; request_len];
        socket.read_exact(&mut request).await.unwrap();
        socket.write_all(&response).await.unwrap();
        let mut sink = Vec::new();
        socket.read_to_end(&mut sink).await.ok();
    });

    (Target::new("127.0.0.1", port), handle)
}

/// Accepts one connection and never answers.
pub async fn serve_silent() -> (Target, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut sink = Vec::new();
        // Returns once the client gives up and closes.
        socket.read_to_end(&mut sink).await.ok();
    });

    (Target::new("127.0.0.1", port), handle)
}

/// A target nothing listens on.
pub async fn closed_target() -> Target {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    Target::new("127.0.0.1", port)
}

/// Frames a modern status response around `json`.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub fn modern_response(json: &str) -> Vec<u8> {
    let mut body = super::varint::encode(0);
    body.extend(super::varint::encode(json.len() as i32));
    body.extend_from_slice(json.as_bytes());

    let mut packet = super::varint::encode(body.len() as i32);
    packet.extend(body);
    packet
}

/// Frames a legacy kick packet around `reason`.
#[allow(clippy::cast_possible_truncation)]
pub fn legacy_response(reason: &str) -> Vec<u8> {
    let units: Vec<u16> = reason.encode_utf16().collect();
    let mut packet = vec![0xFF];
    packet.extend_from_slice(&(units.len() as u16).to_be_bytes());
    packet.extend(units.iter().flat_map(|unit| unit.to_be_bytes()));
    packet
}
