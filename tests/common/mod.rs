//! Shared helpers for integration tests: a gateway instance on an ephemeral
//! port and a mock Gemini Live server speaking just enough of the
//! BidiGenerateContent protocol to exercise the relay.

// Each test binary uses a different subset of these helpers
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use base64::prelude::*;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use ai_calling_agent::state::AppState;
use ai_calling_agent::{ServerConfig, routes};

/// Poll interval for the wait helpers.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Upper bound for anything the tests wait on.
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Start the gateway on an ephemeral port and return its address.
pub async fn spawn_app(config: ServerConfig) -> SocketAddr {
    let state = AppState::new(config);
    let app = routes::build_app(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    addr
}

/// A config pointing at nothing in particular, with an API key set.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        gemini_api_key: Some("test-key".to_string()),
        ..Default::default()
    }
}

/// Commands for the mock Live server.
enum MockCommand {
    /// Emit a `serverContent` frame carrying this PCM as inline data
    SendAudio(Vec<u8>),
    /// Close the session from the server side
    Close,
}

/// In-process stand-in for the Gemini Live API.
///
/// Accepts one WebSocket session, answers the `setup` handshake with
/// `setupComplete`, records every media chunk and text turn it receives, and
/// can push audio or a close frame on command. With `echo` on, every received
/// media chunk is immediately sent back as model audio.
pub struct MockLive {
    /// `ws://...` endpoint to put in the gateway config
    pub url: String,
    received_audio: Arc<Mutex<Vec<Vec<u8>>>>,
    received_texts: Arc<Mutex<Vec<String>>>,
    client_closed: Arc<AtomicBool>,
    cmd_tx: mpsc::Sender<MockCommand>,
}

impl MockLive {
    pub async fn spawn(echo: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (cmd_tx, mut cmd_rx) = mpsc::channel::<MockCommand>(64);

        let received_audio = Arc::new(Mutex::new(Vec::new()));
        let received_texts = Arc::new(Mutex::new(Vec::new()));
        let client_closed = Arc::new(AtomicBool::new(false));

        let audio = received_audio.clone();
        let texts = received_texts.clone();
        let closed = client_closed.clone();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            let (mut sink, mut stream) = ws.split();

            // Setup handshake
            while let Some(Ok(msg)) = stream.next().await {
                if let Message::Text(text) = msg {
                    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
                    if value.get("setup").is_some() {
                        sink.send(Message::Text(r#"{"setupComplete":{}}"#.into()))
                            .await
                            .unwrap();
                        break;
                    }
                }
            }

            loop {
                tokio::select! {
                    cmd = cmd_rx.recv() => match cmd {
                        Some(MockCommand::SendAudio(pcm)) => {
                            if sink.send(Message::Text(audio_frame(&pcm).into())).await.is_err() {
                                break;
                            }
                        }
                        Some(MockCommand::Close) => {
                            let _ = sink.send(Message::Close(None)).await;
                            break;
                        }
                        None => break,
                    },

                    msg = stream.next() => match msg {
                        Some(Ok(Message::Text(text))) => {
                            let value: serde_json::Value = serde_json::from_str(&text).unwrap();
                            if let Some(chunks) = value.pointer("/realtimeInput/mediaChunks") {
                                for chunk in chunks.as_array().unwrap() {
                                    let data = BASE64_STANDARD
                                        .decode(chunk["data"].as_str().unwrap())
                                        .unwrap();
                                    if echo
                                        && sink
                                            .send(Message::Text(audio_frame(&data).into()))
                                            .await
                                            .is_err()
                                    {
                                        break;
                                    }
                                    audio.lock().unwrap().push(data);
                                }
                            } else if let Some(turns) = value.pointer("/clientContent/turns") {
                                for turn in turns.as_array().unwrap() {
                                    for part in turn["parts"].as_array().unwrap() {
                                        if let Some(text) = part["text"].as_str() {
                                            texts.lock().unwrap().push(text.to_string());
                                        }
                                    }
                                }
                            }
                        }
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                            closed.store(true, Ordering::SeqCst);
                            break;
                        }
                        Some(Ok(_)) => {}
                    },
                }
            }
        });

        Self {
            url: format!("ws://{addr}/"),
            received_audio,
            received_texts,
            client_closed,
            cmd_tx,
        }
    }

    /// Push model audio to the connected session.
    pub async fn send_audio(&self, pcm: Vec<u8>) {
        self.cmd_tx.send(MockCommand::SendAudio(pcm)).await.unwrap();
    }

    /// Close the session from the server side.
    pub async fn close(&self) {
        self.cmd_tx.send(MockCommand::Close).await.unwrap();
    }

    /// Wait until `count` media chunks arrived, returning them in order.
    pub async fn wait_for_audio(&self, count: usize) -> Vec<Vec<u8>> {
        wait_until(WAIT_TIMEOUT, || {
            let chunks = self.received_audio.lock().unwrap();
            (chunks.len() >= count).then(|| chunks.clone())
        })
        .await
        .expect("timed out waiting for media chunks")
    }

    /// Wait until `count` text turns arrived, returning them in order.
    pub async fn wait_for_texts(&self, count: usize) -> Vec<String> {
        wait_until(WAIT_TIMEOUT, || {
            let texts = self.received_texts.lock().unwrap();
            (texts.len() >= count).then(|| texts.clone())
        })
        .await
        .expect("timed out waiting for text turns")
    }

    /// Wait until the gateway side of the session closed.
    pub async fn wait_for_client_close(&self) {
        wait_until(WAIT_TIMEOUT, || {
            self.client_closed.load(Ordering::SeqCst).then_some(())
        })
        .await
        .expect("timed out waiting for the gateway to close the upstream session");
    }
}

/// A `serverContent` frame carrying PCM as base64 inline data.
fn audio_frame(pcm: &[u8]) -> String {
    serde_json::json!({
        "serverContent": {
            "modelTurn": {
                "parts": [{
                    "inlineData": {
                        "mimeType": "audio/pcm;rate=24000",
                        "data": BASE64_STANDARD.encode(pcm),
                    }
                }]
            }
        }
    })
    .to_string()
}

/// Poll `check` until it returns `Some`, or give up after `timeout`.
pub async fn wait_until<T>(timeout: Duration, mut check: impl FnMut() -> Option<T>) -> Option<T> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if let Some(value) = check() {
            return Some(value);
        }
        if tokio::time::Instant::now() >= deadline {
            return None;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
