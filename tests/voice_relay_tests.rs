//! Duplex relay tests for `/ws/voice` against the mock Live server.
//!
//! These cover the pass-through properties: bytes sent on one side appear on
//! the other side in order with no loss or duplication, and closing either
//! connection closes the other.

mod common;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use ai_calling_agent::ServerConfig;
use common::{MockLive, WAIT_TIMEOUT, spawn_app};

type ClientWs = WebSocketStream<MaybeTlsStream<TcpStream>>;

fn config_for(mock: &MockLive) -> ServerConfig {
    ServerConfig {
        gemini_api_key: Some("test-key".to_string()),
        live_endpoint: mock.url.clone(),
        ..Default::default()
    }
}

async fn connect_voice(addr: std::net::SocketAddr) -> ClientWs {
    let (ws, _) = connect_async(format!("ws://{addr}/ws/voice"))
        .await
        .expect("voice upgrade failed");
    ws
}

/// Receive the next binary frame, ignoring everything else.
async fn recv_binary(ws: &mut ClientWs) -> Vec<u8> {
    tokio::time::timeout(WAIT_TIMEOUT, async {
        while let Some(msg) = ws.next().await {
            if let Message::Binary(data) = msg.expect("client socket error") {
                return data.to_vec();
            }
        }
        panic!("socket ended before a binary frame arrived");
    })
    .await
    .expect("timed out waiting for audio from the gateway")
}

/// A recognizable PCM-ish payload.
fn frame(seed: u8, len: usize) -> Vec<u8> {
    (0..len).map(|i| seed.wrapping_add(i as u8)).collect()
}

#[tokio::test]
async fn client_audio_reaches_upstream_in_order() {
    let mock = MockLive::spawn(false).await;
    let addr = spawn_app(config_for(&mock)).await;
    let mut ws = connect_voice(addr).await;

    let frames: Vec<Vec<u8>> = (0..5).map(|i| frame(i * 10, 320)).collect();
    for f in &frames {
        ws.send(Message::Binary(f.clone().into())).await.unwrap();
    }

    let received = mock.wait_for_audio(frames.len()).await;
    assert_eq!(received, frames, "frames must arrive unmodified and in order");
}

#[tokio::test]
async fn upstream_audio_reaches_client_in_order() {
    let mock = MockLive::spawn(false).await;
    let addr = spawn_app(config_for(&mock)).await;
    let mut ws = connect_voice(addr).await;

    let frames: Vec<Vec<u8>> = (0..5).map(|i| frame(i * 7 + 1, 480)).collect();
    for f in &frames {
        mock.send_audio(f.clone()).await;
    }

    for expected in &frames {
        let received = recv_binary(&mut ws).await;
        assert_eq!(&received, expected);
    }
}

#[tokio::test]
async fn echo_round_trip_preserves_bytes() {
    let mock = MockLive::spawn(true).await;
    let addr = spawn_app(config_for(&mock)).await;
    let mut ws = connect_voice(addr).await;

    let sent = frame(42, 640);
    ws.send(Message::Binary(sent.clone().into())).await.unwrap();

    let received = recv_binary(&mut ws).await;
    assert_eq!(received, sent);
}

#[tokio::test]
async fn client_text_becomes_user_turn() {
    let mock = MockLive::spawn(false).await;
    let addr = spawn_app(config_for(&mock)).await;
    let mut ws = connect_voice(addr).await;

    ws.send(Message::Text("read me the weather".into()))
        .await
        .unwrap();

    let texts = mock.wait_for_texts(1).await;
    assert_eq!(texts, vec!["read me the weather".to_string()]);
}

#[tokio::test]
async fn client_close_closes_upstream() {
    let mock = MockLive::spawn(false).await;
    let addr = spawn_app(config_for(&mock)).await;
    let mut ws = connect_voice(addr).await;

    ws.close(None).await.unwrap();

    mock.wait_for_client_close().await;
}

#[tokio::test]
async fn upstream_close_closes_client() {
    let mock = MockLive::spawn(false).await;
    let addr = spawn_app(config_for(&mock)).await;
    let mut ws = connect_voice(addr).await;

    mock.close().await;

    let outcome = tokio::time::timeout(WAIT_TIMEOUT, async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            }
        }
    })
    .await;
    assert!(outcome.is_ok(), "client socket did not close");
}

#[tokio::test]
async fn voice_without_api_key_closes_immediately() {
    let mock = MockLive::spawn(false).await;
    let addr = spawn_app(ServerConfig {
        gemini_api_key: None,
        live_endpoint: mock.url.clone(),
        ..Default::default()
    })
    .await;
    let mut ws = connect_voice(addr).await;

    let outcome = tokio::time::timeout(WAIT_TIMEOUT, async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            }
        }
    })
    .await;
    assert!(outcome.is_ok(), "session without API key must be closed");
}

#[tokio::test]
async fn per_ip_connection_limit_rejects_with_429() {
    let mock = MockLive::spawn(false).await;
    let addr = spawn_app(ServerConfig {
        max_connections_per_ip: 1,
        ..config_for(&mock)
    })
    .await;

    let _first = connect_voice(addr).await;

    let second = connect_async(format!("ws://{addr}/ws/voice")).await;
    match second {
        Err(tokio_tungstenite::tungstenite::Error::Http(response)) => {
            assert_eq!(response.status(), 429);
        }
        other => panic!("expected HTTP 429 rejection, got {other:?}"),
    }

    // Releasing the first slot makes room again
    drop(_first);
    let deadline = tokio::time::Instant::now() + WAIT_TIMEOUT;
    loop {
        if connect_async(format!("ws://{addr}/ws/voice")).await.is_ok() {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "slot was not released after disconnect"
        );
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}
