//! Gemini Live API client implementation.
//!
//! One [`LiveClient`] owns one WebSocket session. `connect` performs the
//! setup handshake inline (send `setup`, wait for `setupComplete`) so that a
//! connected client is immediately ready for media, then hands the socket to
//! a background task that pumps both directions until the session ends.
//!
//! There is deliberately no reconnection path: a session ends the first time
//! either side closes or errors.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::config::{LiveConfig, SETUP_TIMEOUT};
use super::messages::{
    ClientMessage, Content, GenerationConfig, ServerMessage, Setup, SpeechConfig,
};
use super::{
    AudioCallback, ClosedCallback, ErrorCallback, InterruptedCallback, LiveError, LiveResult,
};

/// Channel capacity for outbound WebSocket messages.
const WS_CHANNEL_CAPACITY: usize = 256;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Gemini Live API client.
///
/// Callbacks are registered before `connect`; the connection task holds
/// clones of them, so registration after connect has no effect.
pub struct LiveClient {
    config: LiveConfig,
    /// Shared with the connection task so `is_ready` reflects session death
    connected: Arc<AtomicBool>,
    /// Outbound message channel into the connection task
    ws_sender: Arc<Mutex<Option<mpsc::Sender<ClientMessage>>>>,
    connection_handle: Option<JoinHandle<()>>,

    audio_callback: Option<AudioCallback>,
    interrupted_callback: Option<InterruptedCallback>,
    error_callback: Option<ErrorCallback>,
    closed_callback: Option<ClosedCallback>,
}

impl std::fmt::Debug for LiveClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveClient")
            .field("config", &self.config)
            .field("connected", &self.connected)
            .field("ws_sender", &self.ws_sender)
            .field("connection_handle", &self.connection_handle)
            .field("audio_callback", &self.audio_callback.is_some())
            .field("interrupted_callback", &self.interrupted_callback.is_some())
            .field("error_callback", &self.error_callback.is_some())
            .field("closed_callback", &self.closed_callback.is_some())
            .finish()
    }
}

impl LiveClient {
    /// Create a client from a session configuration.
    pub fn new(config: LiveConfig) -> LiveResult<Self> {
        if config.api_key.is_empty() {
            return Err(LiveError::AuthenticationFailed(
                "API key is required".to_string(),
            ));
        }

        Ok(Self {
            config,
            connected: Arc::new(AtomicBool::new(false)),
            ws_sender: Arc::new(Mutex::new(None)),
            connection_handle: None,
            audio_callback: None,
            interrupted_callback: None,
            error_callback: None,
            closed_callback: None,
        })
    }

    /// Register the callback for model audio output.
    pub fn on_audio(&mut self, callback: AudioCallback) {
        self.audio_callback = Some(callback);
    }

    /// Register the callback for model interruption events.
    pub fn on_interrupted(&mut self, callback: InterruptedCallback) {
        self.interrupted_callback = Some(callback);
    }

    /// Register the callback for terminal session errors.
    pub fn on_error(&mut self, callback: ErrorCallback) {
        self.error_callback = Some(callback);
    }

    /// Register the callback fired when the upstream session ends.
    pub fn on_closed(&mut self, callback: ClosedCallback) {
        self.closed_callback = Some(callback);
    }

    /// Whether the session is connected and ready for media.
    pub fn is_ready(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Session URL with the API key as a query parameter.
    fn session_url(&self) -> String {
        format!("{}?key={}", self.config.endpoint, self.config.api_key)
    }

    /// Initial setup message for this session.
    fn build_setup(&self) -> Setup {
        Setup {
            model: self.config.qualified_model(),
            generation_config: Some(GenerationConfig {
                response_modalities: self.config.response_modalities.clone(),
                speech_config: self.config.voice.as_deref().map(SpeechConfig::prebuilt),
            }),
            system_instruction: self
                .config
                .system_instruction
                .as_deref()
                .map(Content::system_text),
        }
    }

    /// Connect, complete the setup handshake, and start the session task.
    pub async fn connect(&mut self) -> LiveResult<()> {
        if self.is_ready() {
            return Ok(());
        }

        let url = self.session_url();
        let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| LiveError::ConnectionFailed(e.to_string()))?;
        tracing::info!(model = %self.config.model, "connected to Live API");

        let (mut ws_sink, mut ws_stream) = ws_stream.split();

        // Setup handshake: the session accepts no media until setupComplete.
        let setup = ClientMessage::Setup(self.build_setup());
        let json =
            serde_json::to_string(&setup).map_err(|e| LiveError::SerializationError(e.to_string()))?;
        ws_sink
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| LiveError::WebSocketError(e.to_string()))?;

        tokio::time::timeout(SETUP_TIMEOUT, wait_for_setup(&mut ws_sink, &mut ws_stream))
            .await
            .map_err(|_| LiveError::SetupTimeout(SETUP_TIMEOUT))??;
        tracing::debug!("Live session setup complete");

        let (tx, rx) = mpsc::channel::<ClientMessage>(WS_CHANNEL_CAPACITY);
        *self.ws_sender.lock().await = Some(tx);
        self.connected.store(true, Ordering::SeqCst);

        let task = SessionTask {
            connected: self.connected.clone(),
            ws_sender: self.ws_sender.clone(),
            audio_callback: self.audio_callback.clone(),
            interrupted_callback: self.interrupted_callback.clone(),
            error_callback: self.error_callback.clone(),
            closed_callback: self.closed_callback.clone(),
        };
        self.connection_handle = Some(tokio::spawn(task.run(ws_sink, ws_stream, rx)));

        Ok(())
    }

    /// End the session. Dropping the sender lets the session task send a
    /// close frame and run its teardown (including the `on_closed` callback).
    pub async fn disconnect(&mut self) {
        self.ws_sender.lock().await.take();
        self.connected.store(false, Ordering::SeqCst);
        if let Some(handle) = self.connection_handle.take() {
            let _ = handle.await;
        }
        tracing::debug!("Live session disconnected");
    }

    /// Send one chunk of raw PCM audio upstream.
    pub async fn send_audio(&self, pcm: Bytes) -> LiveResult<()> {
        self.send_message(ClientMessage::audio_chunk(
            self.config.input_mime_type(),
            &pcm,
        ))
        .await
    }

    /// Send a complete user text turn upstream.
    pub async fn send_text(&self, text: &str) -> LiveResult<()> {
        self.send_message(ClientMessage::user_text(text)).await
    }

    async fn send_message(&self, message: ClientMessage) -> LiveResult<()> {
        let sender = self.ws_sender.lock().await.clone();
        match sender {
            Some(sender) => sender
                .send(message)
                .await
                .map_err(|_| LiveError::NotConnected),
            None => Err(LiveError::NotConnected),
        }
    }
}

/// Wait for `setupComplete`, answering pings along the way.
async fn wait_for_setup(ws_sink: &mut WsSink, ws_stream: &mut WsStream) -> LiveResult<()> {
    loop {
        let msg = ws_stream
            .next()
            .await
            .ok_or_else(|| LiveError::ConnectionFailed("closed during setup".to_string()))?
            .map_err(|e| LiveError::WebSocketError(e.to_string()))?;

        match msg {
            Message::Text(text) => {
                let server_msg: ServerMessage = serde_json::from_str(&text)
                    .map_err(|e| LiveError::SerializationError(e.to_string()))?;
                if server_msg.setup_complete.is_some() {
                    return Ok(());
                }
                tracing::debug!("ignoring pre-setup server message");
            }
            Message::Ping(data) => {
                ws_sink
                    .send(Message::Pong(data))
                    .await
                    .map_err(|e| LiveError::WebSocketError(e.to_string()))?;
            }
            Message::Close(_) => {
                return Err(LiveError::ConnectionFailed(
                    "server closed during setup".to_string(),
                ));
            }
            _ => {}
        }
    }
}

/// State owned by the spawned session task.
struct SessionTask {
    connected: Arc<AtomicBool>,
    ws_sender: Arc<Mutex<Option<mpsc::Sender<ClientMessage>>>>,
    audio_callback: Option<AudioCallback>,
    interrupted_callback: Option<InterruptedCallback>,
    error_callback: Option<ErrorCallback>,
    closed_callback: Option<ClosedCallback>,
}

impl SessionTask {
    /// Pump both directions until either side ends the session.
    async fn run(
        self,
        mut ws_sink: WsSink,
        mut ws_stream: WsStream,
        mut rx: mpsc::Receiver<ClientMessage>,
    ) {
        loop {
            tokio::select! {
                outbound = rx.recv() => {
                    match outbound {
                        Some(message) => {
                            let json = match serde_json::to_string(&message) {
                                Ok(json) => json,
                                Err(e) => {
                                    tracing::error!("failed to serialize client message: {e}");
                                    continue;
                                }
                            };
                            if let Err(e) = ws_sink.send(Message::Text(json.into())).await {
                                self.report_error(LiveError::WebSocketError(e.to_string())).await;
                                break;
                            }
                        }
                        // Sender dropped: local disconnect. Close the socket
                        // cleanly so the server sees the session end.
                        None => {
                            let _ = ws_sink.send(Message::Close(None)).await;
                            break;
                        }
                    }
                }

                inbound = ws_stream.next() => {
                    match inbound {
                        Some(Ok(Message::Text(text))) => {
                            match serde_json::from_str::<ServerMessage>(&text) {
                                Ok(message) => self.dispatch(message).await,
                                Err(e) => {
                                    tracing::warn!("failed to parse server message: {e}");
                                }
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            if let Err(e) = ws_sink.send(Message::Pong(data)).await {
                                self.report_error(LiveError::WebSocketError(e.to_string())).await;
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) => {
                            tracing::info!("Live API closed the session");
                            break;
                        }
                        Some(Err(e)) => {
                            self.report_error(LiveError::WebSocketError(e.to_string())).await;
                            break;
                        }
                        None => {
                            tracing::info!("Live API stream ended");
                            break;
                        }
                        _ => {}
                    }
                }
            }
        }

        self.connected.store(false, Ordering::SeqCst);
        self.ws_sender.lock().await.take();
        if let Some(cb) = &self.closed_callback {
            cb().await;
        }
        tracing::debug!("Live session task ended");
    }

    /// Route one server frame to the registered callbacks.
    async fn dispatch(&self, message: ServerMessage) {
        if let Some(content) = message.server_content {
            if content.interrupted
                && let Some(cb) = &self.interrupted_callback
            {
                cb().await;
            }

            if let Some(turn) = content.model_turn {
                for part in turn.parts {
                    if let Some(blob) = part.inline_data {
                        match blob.decode() {
                            Ok(pcm) => {
                                if let Some(cb) = &self.audio_callback {
                                    cb(Bytes::from(pcm)).await;
                                }
                            }
                            Err(e) => {
                                tracing::warn!("failed to decode inline audio: {e}");
                            }
                        }
                    }
                }
            }

            if content.turn_complete {
                tracing::trace!("model turn complete");
            }
        }

        if let Some(go_away) = message.go_away {
            tracing::warn!(time_left = ?go_away.time_left, "Live API sent goAway");
        }

        if let Some(usage) = message.usage_metadata {
            tracing::trace!(total_tokens = ?usage.total_token_count, "usage update");
        }
    }

    async fn report_error(&self, error: LiveError) {
        tracing::error!(error = %error, "Live session error");
        if let Some(cb) = &self.error_callback {
            cb(error).await;
        }
    }
}
