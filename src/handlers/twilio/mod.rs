//! Twilio telephony integration.
//!
//! Two endpoints:
//!
//! - `POST /twilio/incoming` answers Twilio's voice webhook with TwiML that
//!   greets the caller and connects the call to the media-stream WebSocket.
//! - `GET /twilio/media` is that WebSocket: Twilio streams the caller's audio
//!   as base64 μ-law (8 kHz) inside JSON frames, and receives agent audio in
//!   the same envelope. The gateway transcodes μ-law⇄linear PCM at the edge
//!   and relays through a Gemini Live session like the plain voice endpoint.

use std::sync::Arc;

use axum::Extension;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use http::HeaderMap;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

pub mod messages;
pub mod twiml;

use crate::core::audio::{decimate_3to1, pcm_to_ulaw, ulaw_to_pcm};
use crate::core::live::{LiveClient, LiveConfig};
use crate::middleware::ClientIp;
use crate::state::AppState;
use messages::{MediaStreamInbound, MediaStreamOutbound};
use twiml::TwimlBuilder;

/// Channel buffer size for frames toward Twilio.
const CHANNEL_BUFFER_SIZE: usize = 1024;

/// Greeting spoken before the media stream is connected.
const GREETING: &str = "Hello! You are now connected to an AI voice assistant.";

/// System instruction for phone sessions.
const PHONE_SYSTEM_INSTRUCTION: &str =
    "You are a helpful AI phone assistant. Be conversational, concise, and friendly.";

/// Twilio Media Streams sample rate (Hz).
const TWILIO_SAMPLE_RATE: u32 = 8000;

/// Handle an incoming Twilio voice call.
///
/// Returns TwiML connecting the call to this server's media-stream WebSocket,
/// with the scheme chosen from the gateway's own TLS setting.
pub async fn incoming_call_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| state.config.address());
    let scheme = if state.config.is_tls_enabled() {
        "wss"
    } else {
        "ws"
    };
    let stream_url = format!("{scheme}://{host}/twilio/media");
    info!(%stream_url, "answering incoming call");

    let twiml = TwimlBuilder::new()
        .say(GREETING)
        .connect_stream(stream_url)
        .build();

    ([(header::CONTENT_TYPE, "application/xml")], twiml).into_response()
}

/// Frames routed to the Twilio-facing sender task.
enum OutboundFrame {
    /// JSON media-stream event
    Json(String),
    /// Close the Twilio socket
    Close,
}

/// Media-stream WebSocket handler.
pub async fn media_stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    client_ip: Option<Extension<ClientIp>>,
) -> Response {
    let ip = client_ip.map(|Extension(ClientIp(ip))| ip);
    ws.on_upgrade(move |socket| handle_media_socket(socket, state, ip))
}

async fn handle_media_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    ip: Option<std::net::IpAddr>,
) {
    info!("Twilio media stream connected");

    run_media_session(socket, &state).await;

    if let Some(ip) = ip {
        state.release_connection(ip);
    }
    info!("Twilio media stream ended");
}

async fn run_media_session(socket: WebSocket, state: &Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (frame_tx, mut frame_rx) = mpsc::channel::<OutboundFrame>(CHANNEL_BUFFER_SIZE);

    // Sender task: the only writer to the Twilio socket
    let sender_task = tokio::spawn(async move {
        while let Some(frame) = frame_rx.recv().await {
            let result = match frame {
                OutboundFrame::Json(json) => sender.send(Message::Text(json.into())).await,
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

    let (closed_tx, mut closed_rx) = mpsc::channel::<()>(1);

    // Created once the `start` event delivers the stream SID
    let mut live: Option<LiveClient> = None;

    loop {
        tokio::select! {
            frame = receiver.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        let event = match serde_json::from_str::<MediaStreamInbound>(&text) {
                            Ok(event) => event,
                            Err(e) => {
                                warn!(error = %e, "unparseable media-stream frame");
                                continue;
                            }
                        };
                        if !handle_media_event(event, state, &mut live, &frame_tx, &closed_tx).await {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("Twilio closed the media stream");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "media-stream socket error");
                        break;
                    }
                }
            }
            _ = closed_rx.recv() => {
                debug!("upstream session ended, dropping call");
                break;
            }
        }
    }

    if let Some(mut live) = live {
        live.disconnect().await;
    }
    let _ = frame_tx.send(OutboundFrame::Close).await;
    drop(frame_tx);
    let _ = sender_task.await;
}

/// React to one inbound media-stream event. Returns `false` to end the session.
async fn handle_media_event(
    event: MediaStreamInbound,
    state: &Arc<AppState>,
    live: &mut Option<LiveClient>,
    frame_tx: &mpsc::Sender<OutboundFrame>,
    closed_tx: &mpsc::Sender<()>,
) -> bool {
    match event {
        MediaStreamInbound::Connected {} => {
            debug!("media stream handshake");
            true
        }

        MediaStreamInbound::Start { stream_sid, start } => {
            info!(%stream_sid, call_sid = ?start.call_sid, "media stream started");
            match start_live_session(state, stream_sid, frame_tx, closed_tx).await {
                Some(client) => {
                    *live = Some(client);
                    true
                }
                None => false,
            }
        }

        MediaStreamInbound::Media { media } => {
            let Some(live) = live.as_ref() else {
                debug!("media before start, dropping frame");
                return true;
            };
            let ulaw = match media.decode() {
                Ok(ulaw) => ulaw,
                Err(e) => {
                    warn!(error = %e, "undecodable media payload");
                    return true;
                }
            };
            let pcm = ulaw_to_pcm(&ulaw);
            if let Err(e) = live.send_audio(pcm.into()).await {
                warn!(error = %e, "dropping call: upstream send failed");
                return false;
            }
            true
        }

        MediaStreamInbound::Stop {} => {
            info!("media stream stopped");
            false
        }

        MediaStreamInbound::Other => true,
    }
}

/// Create and connect the Live session for one call.
async fn start_live_session(
    state: &Arc<AppState>,
    stream_sid: String,
    frame_tx: &mpsc::Sender<OutboundFrame>,
    closed_tx: &mpsc::Sender<()>,
) -> Option<LiveClient> {
    let api_key = match state.config.require_api_key() {
        Ok(key) => key.to_string(),
        Err(e) => {
            error!(error = %e, "rejecting call");
            return None;
        }
    };

    let mut live = match LiveClient::new(LiveConfig {
        api_key,
        model: state.config.live_model.clone(),
        system_instruction: Some(PHONE_SYSTEM_INSTRUCTION.to_string()),
        input_sample_rate: TWILIO_SAMPLE_RATE,
        endpoint: state.config.live_endpoint.clone(),
        ..Default::default()
    }) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "failed to create Live client for call");
            return None;
        }
    };

    // Agent audio: 24 kHz PCM -> 8 kHz -> mu-law -> base64 media event
    let tx = frame_tx.clone();
    let sid = stream_sid.clone();
    live.on_audio(Arc::new(move |pcm| {
        let tx = tx.clone();
        let sid = sid.clone();
        Box::pin(async move {
            let ulaw = pcm_to_ulaw(&decimate_3to1(&pcm));
            let event = MediaStreamOutbound::media(sid, &ulaw);
            if let Ok(json) = serde_json::to_string(&event) {
                let _ = tx.send(OutboundFrame::Json(json)).await;
            }
        })
    }));

    // Caller barge-in: tell Twilio to drop buffered agent audio
    let tx = frame_tx.clone();
    let sid = stream_sid.clone();
    live.on_interrupted(Arc::new(move || {
        let tx = tx.clone();
        let sid = sid.clone();
        Box::pin(async move {
            if let Ok(json) = serde_json::to_string(&MediaStreamOutbound::clear(sid)) {
                let _ = tx.send(OutboundFrame::Json(json)).await;
            }
        })
    }));

    let closed_tx = closed_tx.clone();
    live.on_closed(Arc::new(move || {
        let closed_tx = closed_tx.clone();
        Box::pin(async move {
            let _ = closed_tx.send(()).await;
        })
    }));

    live.on_error(Arc::new(move |e| {
        Box::pin(async move {
            warn!(error = %e, "upstream session error");
        })
    }));

    if let Err(e) = live.connect().await {
        error!(error = %e, "failed to connect Live session for call");
        return None;
    }

    Some(live)
}
