//! Voice WebSocket handler.
//!
//! `/ws/voice` bridges a client socket and a Gemini Live session:
//!
//! - Client binary frames (raw PCM, 16 kHz, 16-bit, mono) go upstream
//!   unmodified as media chunks.
//! - Model audio (raw PCM, 24 kHz, 16-bit, mono) comes back to the client as
//!   binary frames, unmodified and in order.
//! - Client text frames are forwarded as complete user text turns.
//!
//! The two directions run independently: the upstream session task pushes
//! model audio through the sender task while this handler's receive loop
//! drains client frames. Closing either side closes the other, and any
//! transport error is terminal for the session.

use std::sync::Arc;

use axum::Extension;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::core::live::{LiveClient, LiveConfig};
use crate::middleware::ClientIp;
use crate::state::AppState;

/// Channel buffer size for audio frames toward the client.
const CHANNEL_BUFFER_SIZE: usize = 1024;

/// Maximum WebSocket message size (1 MB): ample for PCM frames.
const MAX_WS_MESSAGE_SIZE: usize = 1024 * 1024;

/// System instruction for browser voice sessions.
const VOICE_SYSTEM_INSTRUCTION: &str =
    "You are a helpful AI voice assistant. Be conversational and concise.";

/// Frames routed to the client-facing sender task.
enum OutboundFrame {
    /// Raw PCM toward the client
    Audio(bytes::Bytes),
    /// Close the client socket
    Close,
}

/// Voice WebSocket handler: upgrades the connection and runs the relay.
pub async fn voice_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    client_ip: Option<Extension<ClientIp>>,
) -> Response {
    let ip = client_ip.map(|Extension(ClientIp(ip))| ip);
    ws.max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_voice_socket(socket, state, ip))
}

async fn handle_voice_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    ip: Option<std::net::IpAddr>,
) {
    let session_id = uuid::Uuid::new_v4();
    info!(%session_id, "voice session started");

    run_voice_session(socket, &state, session_id).await;

    // The slot was acquired by the connection-limit middleware
    if let Some(ip) = ip {
        state.release_connection(ip);
    }
    info!(%session_id, "voice session ended");
}

async fn run_voice_session(mut socket: WebSocket, state: &Arc<AppState>, session_id: uuid::Uuid) {
    let api_key = match state.config.require_api_key() {
        Ok(key) => key.to_string(),
        Err(e) => {
            error!(%session_id, error = %e, "rejecting voice session");
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };

    let (mut sender, mut receiver) = socket.split();
    let (frame_tx, mut frame_rx) = mpsc::channel::<OutboundFrame>(CHANNEL_BUFFER_SIZE);

    // Sender task: the only writer to the client socket
    let sender_task = tokio::spawn(async move {
        while let Some(frame) = frame_rx.recv().await {
            let result = match frame {
                OutboundFrame::Audio(pcm) => sender.send(Message::Binary(pcm)).await,
                OutboundFrame::Close => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            };
            if result.is_err() {
                break;
            }
        }
    });

    // Signal from the upstream session's teardown to this receive loop
    let (closed_tx, mut closed_rx) = mpsc::channel::<()>(1);

    let mut live = match LiveClient::new(LiveConfig {
        api_key,
        model: state.config.live_model.clone(),
        system_instruction: Some(VOICE_SYSTEM_INSTRUCTION.to_string()),
        endpoint: state.config.live_endpoint.clone(),
        ..Default::default()
    }) {
        Ok(client) => client,
        Err(e) => {
            error!(%session_id, error = %e, "failed to create Live client");
            let _ = frame_tx.send(OutboundFrame::Close).await;
            let _ = sender_task.await;
            return;
        }
    };

    let tx = frame_tx.clone();
    live.on_audio(Arc::new(move |pcm| {
        let tx = tx.clone();
        Box::pin(async move {
            let _ = tx.send(OutboundFrame::Audio(pcm)).await;
        })
    }));

    let tx = frame_tx.clone();
    live.on_closed(Arc::new(move || {
        let tx = tx.clone();
        let closed_tx = closed_tx.clone();
        Box::pin(async move {
            let _ = tx.send(OutboundFrame::Close).await;
            let _ = closed_tx.send(()).await;
        })
    }));

    live.on_error(Arc::new(move |e| {
        Box::pin(async move {
            warn!(error = %e, "upstream session error");
        })
    }));

    if let Err(e) = live.connect().await {
        error!(%session_id, error = %e, "failed to connect Live session");
        let _ = frame_tx.send(OutboundFrame::Close).await;
        let _ = sender_task.await;
        return;
    }

    // Receive loop: client frames go upstream until either side ends
    loop {
        tokio::select! {
            frame = receiver.next() => {
                match frame {
                    Some(Ok(Message::Binary(pcm))) => {
                        if let Err(e) = live.send_audio(pcm).await {
                            warn!(%session_id, error = %e, "dropping session: upstream send failed");
                            break;
                        }
                    }
                    Some(Ok(Message::Text(text))) => {
                        if let Err(e) = live.send_text(&text).await {
                            warn!(%session_id, error = %e, "dropping session: upstream send failed");
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(%session_id, "client closed voice socket");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(%session_id, error = %e, "client socket error");
                        break;
                    }
                }
            }
            _ = closed_rx.recv() => {
                debug!(%session_id, "upstream session ended");
                break;
            }
        }
    }

    // Whichever side ended first, close the other
    live.disconnect().await;
    let _ = frame_tx.send(OutboundFrame::Close).await;
    drop(frame_tx);
    let _ = sender_task.await;
}
