//! One persistent WebSocket connection shared by a single read loop and any
//! number of command senders.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::connect_async_with_config;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::InvalidHeaderValue;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::{CloseFrame, WebSocketConfig};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::command::WsCommand;
use super::event::WsEvent;
use crate::events::EventRegistry;

/// Write half of a connection.
pub type FrameSink = Pin<Box<dyn Sink<Message, Error = tungstenite::Error> + Send>>;

/// Read half of a connection.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<Message, tungstenite::Error>> + Send>>;

/// Close code reported when the connection dropped without a close frame.
pub const ABNORMAL_CLOSURE: u16 = 1006;

/// Close code reported for a close frame with no status.
pub const NO_STATUS_RECEIVED: u16 = 1005;

#[derive(Debug, Error)]
pub enum WsError {
    #[error("failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: tungstenite::Error,
    },

    #[error("invalid api key header value")]
    InvalidHeader(#[from] InvalidHeaderValue),

    #[error("session is not open ({0})")]
    NotOpen(SessionState),

    #[error("write did not complete within {0:?}")]
    WriteTimeout(Duration),

    #[error("no frame received within {0:?}")]
    ReadTimeout(Duration),

    #[error("connection closed unexpectedly (code {code}): {reason}")]
    UnexpectedClose { code: u16, reason: String },

    #[error("websocket transport error: {0}")]
    Transport(#[from] tungstenite::Error),

    #[error("failed to encode command: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("a listener is already running on this session")]
    ListenerBusy,
}

impl WsError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, WsError::WriteTimeout(_) | WsError::ReadTimeout(_))
    }

    /// Close code for close-classed failures.
    pub fn close_code(&self) -> Option<u16> {
        match self {
            WsError::UnexpectedClose { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Connection lifecycle. Only `Open` accepts commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl SessionState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => SessionState::Connecting,
            1 => SessionState::Open,
            2 => SessionState::Closing,
            _ => SessionState::Closed,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Connecting => "connecting",
            SessionState::Open => "open",
            SessionState::Closing => "closing",
            SessionState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Which peer close codes end the listener without an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosePolicy {
    clean: Vec<u16>,
}

impl ClosePolicy {
    pub fn new(clean: impl IntoIterator<Item = u16>) -> Self {
        Self {
            clean: clean.into_iter().collect(),
        }
    }

    pub fn is_clean(&self, code: u16) -> bool {
        self.clean.contains(&code)
    }

    pub fn clean_codes(&self) -> &[u16] {
        &self.clean
    }
}

impl Default for ClosePolicy {
    /// Normal closure and going away.
    fn default() -> Self {
        Self::new([1000, 1001])
    }
}

/// Runtime settings for one session.
#[derive(Clone)]
pub struct WsConfig {
    pub url: String,
    pub api_key: String,
    /// Largest accepted inbound message, in bytes.
    pub max_message_size: usize,
    pub write_timeout: Duration,
    /// Keepalive ping period; `None` disables pings.
    pub ping_interval: Option<Duration>,
    /// Longest silence before the listener gives up; `None` waits forever.
    pub read_timeout: Option<Duration>,
    pub close_policy: ClosePolicy,
}

impl WsConfig {
    pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 512 * 1024;
    pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(1);
    pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(30);
    pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            url: crate::WS_URL.to_string(),
            api_key: api_key.into(),
            max_message_size: Self::DEFAULT_MAX_MESSAGE_SIZE,
            write_timeout: Self::DEFAULT_WRITE_TIMEOUT,
            ping_interval: Some(Self::DEFAULT_PING_INTERVAL),
            read_timeout: Some(Self::DEFAULT_READ_TIMEOUT),
            close_policy: ClosePolicy::default(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

impl fmt::Debug for WsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsConfig")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("max_message_size", &self.max_message_size)
            .field("write_timeout", &self.write_timeout)
            .field("ping_interval", &self.ping_interval)
            .field("read_timeout", &self.read_timeout)
            .field("close_policy", &self.close_policy)
            .finish()
    }
}

pub type CloseHook = Arc<dyn Fn(u16, &str) + Send + Sync>;
pub type ControlHook = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// Callbacks for control frames, run on the listener task.
#[derive(Clone, Default)]
pub struct SessionHooks {
    pub on_close: Option<CloseHook>,
    pub on_ping: Option<ControlHook>,
    pub on_pong: Option<ControlHook>,
}

impl SessionHooks {
    pub fn on_close(mut self, hook: impl Fn(u16, &str) + Send + Sync + 'static) -> Self {
        self.on_close = Some(Arc::new(hook));
        self
    }

    pub fn on_ping(mut self, hook: impl Fn(&[u8]) + Send + Sync + 'static) -> Self {
        self.on_ping = Some(Arc::new(hook));
        self
    }

    pub fn on_pong(mut self, hook: impl Fn(&[u8]) + Send + Sync + 'static) -> Self {
        self.on_pong = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for SessionHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHooks")
            .field("on_close", &self.on_close.is_some())
            .field("on_ping", &self.on_ping.is_some())
            .field("on_pong", &self.on_pong.is_some())
            .finish()
    }
}

/// A duplex connection to the event stream.
///
/// `send_command` and `close` may be called from any task while
/// `run_listener` is reading; writes are serialized behind a lock.
pub struct WsSession {
    sink: Mutex<FrameSink>,
    stream: Mutex<FrameStream>,
    state: AtomicU8,
    config: WsConfig,
    hooks: SessionHooks,
    registry: Arc<EventRegistry>,
}

impl WsSession {
    /// Open a connection to `config.url`, authenticated with `config.api_key`.
    pub async fn connect(config: WsConfig) -> Result<Self, WsError> {
        let connect_err = |source| WsError::Connect {
            url: config.url.clone(),
            source,
        };

        let mut request = config
            .url
            .as_str()
            .into_client_request()
            .map_err(connect_err)?;
        request
            .headers_mut()
            .insert(crate::API_KEY_HEADER, HeaderValue::from_str(&config.api_key)?);

        let mut ws_config = WebSocketConfig::default();
        ws_config.max_message_size = Some(config.max_message_size);
        ws_config.max_frame_size = Some(config.max_message_size);

        let (ws, _) = connect_async_with_config(request, Some(ws_config), false)
            .await
            .map_err(connect_err)?;
        info!(url = %config.url, "websocket connected");

        let (sink, stream) = ws.split();
        Ok(Self::from_parts(Box::pin(sink), Box::pin(stream), config))
    }

    /// Wrap an already-established connection.
    pub fn from_parts(sink: FrameSink, stream: FrameStream, config: WsConfig) -> Self {
        Self {
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
            state: AtomicU8::new(SessionState::Open as u8),
            config,
            hooks: SessionHooks::default(),
            registry: Arc::new(EventRegistry::with_standard_kinds()),
        }
    }

    pub fn with_hooks(mut self, hooks: SessionHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Decode `tx` frames with `registry` instead of the standard kinds.
    pub fn with_registry(mut self, registry: Arc<EventRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn config(&self) -> &WsConfig {
        &self.config
    }

    fn set_state(&self, state: SessionState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn closing_locally(&self) -> bool {
        matches!(self.state(), SessionState::Closing | SessionState::Closed)
    }

    /// Encode and write one command frame.
    ///
    /// Fails with [`WsError::WriteTimeout`] if the frame is not written
    /// within `write_timeout`. Never retries.
    pub async fn send_command(&self, command: &dyn WsCommand) -> Result<(), WsError> {
        let state = self.state();
        if state != SessionState::Open {
            return Err(WsError::NotOpen(state));
        }
        let text = command.to_text().map_err(WsError::Encode)?;
        debug!(command = %command.kind(), "sending command");
        self.write_frame(Message::Text(text.into())).await
    }

    async fn write_frame(&self, frame: Message) -> Result<(), WsError> {
        let write = async {
            let mut sink = self.sink.lock().await;
            sink.send(frame).await
        };
        match tokio::time::timeout(self.config.write_timeout, write).await {
            Ok(result) => result.map_err(WsError::from),
            Err(_) => Err(WsError::WriteTimeout(self.config.write_timeout)),
        }
    }

    /// Send a normal close frame and shut the write half. Safe to call more
    /// than once; transport errors during shutdown are ignored.
    pub async fn close(&self) {
        let prev = self
            .state
            .swap(SessionState::Closing as u8, Ordering::AcqRel);
        if SessionState::from_u8(prev) != SessionState::Open {
            // already closing or closed
            self.state.store(prev.max(SessionState::Closing as u8), Ordering::Release);
            return;
        }

        let frame = Message::Close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: "".into(),
        }));
        if let Err(e) = self.write_frame(frame).await {
            debug!(error = %e, "close frame not sent");
        }
        let shutdown = async {
            let mut sink = self.sink.lock().await;
            sink.close().await
        };
        match tokio::time::timeout(self.config.write_timeout, shutdown).await {
            Ok(Err(e)) => debug!(error = %e, "error closing sink"),
            Err(_) => debug!("timed out closing sink"),
            Ok(Ok(())) => {}
        }
        self.set_state(SessionState::Closed);
        info!("websocket closed");
    }

    /// Read frames until the connection ends or `cancel` fires, publishing
    /// each decoded event on `out`.
    ///
    /// Publishing waits for channel capacity; cancellation is observed both
    /// while reading and while waiting to publish. Returns `Ok` on
    /// cancellation, on a close code the [`ClosePolicy`] accepts, and when
    /// the connection ends after [`WsSession::close`]. Frames that fail to
    /// decode are logged and skipped.
    pub async fn run_listener(
        &self,
        cancel: CancellationToken,
        out: mpsc::Sender<WsEvent>,
    ) -> Result<(), WsError> {
        let mut stream = self.stream.try_lock().map_err(|_| WsError::ListenerBusy)?;

        let mut keepalive = self.config.ping_interval.map(|period| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        let read_timeout = self.config.read_timeout;
        let deadline = tokio::time::sleep(read_timeout.unwrap_or(Duration::MAX));
        tokio::pin!(deadline);

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("listener cancelled");
                    return Ok(());
                }
                _ = &mut deadline, if read_timeout.is_some() => {
                    let timeout = read_timeout.unwrap_or_default();
                    warn!(?timeout, "read deadline exceeded");
                    self.set_state(SessionState::Closed);
                    return Err(WsError::ReadTimeout(timeout));
                }
                _ = tick(&mut keepalive) => {
                    if let Err(e) = self.write_frame(Message::Ping(Vec::new().into())).await {
                        warn!(error = %e, "keepalive ping failed");
                        self.set_state(SessionState::Closed);
                        return Err(e);
                    }
                    continue;
                }
                next = stream.next() => next,
            };

            if let Some(timeout) = read_timeout {
                deadline.as_mut().reset(Instant::now() + timeout);
            }

            let frame = match next {
                Some(Ok(frame)) => frame,
                Some(Err(e)) => return self.transport_ended(e),
                None => return self.connection_dropped("stream ended without close frame"),
            };

            let event = match frame {
                Message::Text(text) => self.decode(text.as_bytes()),
                Message::Binary(bytes) => self.decode(&bytes),
                Message::Ping(payload) => {
                    if let Some(hook) = &self.hooks.on_ping {
                        hook(&payload[..]);
                    }
                    None
                }
                Message::Pong(payload) => {
                    if let Some(hook) = &self.hooks.on_pong {
                        hook(&payload[..]);
                    }
                    None
                }
                Message::Close(frame) => return self.peer_closed(frame),
                Message::Frame(_) => None,
            };

            let Some(event) = event else {
                continue;
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("listener cancelled while publishing");
                    return Ok(());
                }
                sent = out.send(event) => {
                    if sent.is_err() {
                        debug!("event receiver dropped, stopping listener");
                        return Ok(());
                    }
                }
            }

            if let Some(timeout) = read_timeout {
                deadline.as_mut().reset(Instant::now() + timeout);
            }
        }
    }

    fn decode(&self, bytes: &[u8]) -> Option<WsEvent> {
        match WsEvent::from_slice(bytes, &self.registry) {
            Ok(event) => {
                debug!(event_type = event.event_type(), "frame decoded");
                Some(event)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    discriminator = e.discriminator().unwrap_or(""),
                    "skipping undecodable frame"
                );
                None
            }
        }
    }

    fn peer_closed(&self, frame: Option<CloseFrame>) -> Result<(), WsError> {
        let (code, reason) = match frame {
            Some(frame) => (u16::from(frame.code), frame.reason.as_str().to_string()),
            None => (NO_STATUS_RECEIVED, String::new()),
        };
        if let Some(hook) = &self.hooks.on_close {
            hook(code, &reason);
        }

        let initiated_locally = self.closing_locally();
        self.set_state(SessionState::Closed);
        if initiated_locally || self.config.close_policy.is_clean(code) {
            info!(code, %reason, "websocket closed by peer");
            return Ok(());
        }
        warn!(code, %reason, "unexpected close");
        Err(WsError::UnexpectedClose { code, reason })
    }

    fn transport_ended(&self, err: tungstenite::Error) -> Result<(), WsError> {
        if self.closing_locally() {
            self.set_state(SessionState::Closed);
            debug!(error = %err, "read ended after local close");
            return Ok(());
        }
        match err {
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                self.set_state(SessionState::Closed);
                Ok(())
            }
            tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake) => {
                self.connection_dropped("connection reset without closing handshake")
            }
            tungstenite::Error::Io(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::ConnectionReset
                        | std::io::ErrorKind::BrokenPipe
                        | std::io::ErrorKind::UnexpectedEof
                ) =>
            {
                self.connection_dropped("connection lost")
            }
            err => {
                self.set_state(SessionState::Closed);
                warn!(error = %err, "websocket read failed");
                Err(WsError::Transport(err))
            }
        }
    }

    fn connection_dropped(&self, reason: &str) -> Result<(), WsError> {
        let initiated_locally = self.closing_locally();
        self.set_state(SessionState::Closed);
        if initiated_locally || self.config.close_policy.is_clean(ABNORMAL_CLOSURE) {
            debug!(reason, "connection ended");
            return Ok(());
        }
        warn!(reason, "abnormal closure");
        Err(WsError::UnexpectedClose {
            code: ABNORMAL_CLOSURE,
            reason: reason.to_string(),
        })
    }
}

async fn tick(keepalive: &mut Option<Interval>) {
    match keepalive {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

impl fmt::Debug for WsSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsSession")
            .field("state", &self.state())
            .field("config", &self.config)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}
