//! OKX WebSocket session over `tokio-tungstenite`.
//!
//! One background task owns the socket. It:
//! - Correlates query replies with pending calls by request ID
//! - Routes channel pushes through the [`SubscriptionMultiplexer`]
//! - Keeps the connection alive with text `ping`/`pong`
//! - Reconnects with jittered exponential backoff, logs in again and
//!   resubscribes every tracked channel

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use dashmap::DashMap;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, Stream, StreamExt};
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use crate::auth::Credentials;
use crate::network::WsChannelKind;
use crate::shared::operation::{Endpoint, Operation};
use crate::shared::reply::{decode_reply, ReplyEnvelope};
use crate::websocket::error::{WebSocketError, WsResult};
use crate::websocket::subscriptions::{
    AckState, Attached, SubscriptionHandle, SubscriptionMultiplexer, SubscriptionStream,
};
use crate::websocket::types::{
    ChannelArg, ChannelKey, EventFrame, Inbound, OpEnvelope, PushFrame, SessionEvent, OP_LOGIN,
    OP_SUBSCRIBE, OP_UNSUBSCRIBE, PING,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Connection timeout duration for WebSocket connections
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// WebSocket session configuration
#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    /// How long a query waits for its reply (ms)
    pub request_timeout_ms: u64,
    /// Number of reconnect attempts before giving up
    pub reconnect_attempts: u32,
    /// Base delay for exponential backoff (ms)
    pub base_delay_ms: u64,
    /// Maximum delay for exponential backoff (ms)
    pub max_delay_ms: u64,
    /// Interval for client ping (seconds)
    pub ping_interval_secs: u64,
    /// Timeout for pong response (seconds). The connection is considered dead if no pong arrives within this time.
    pub pong_timeout_secs: u64,
    /// Whether to automatically reconnect on disconnect
    pub auto_reconnect: bool,
    /// Whether to automatically re-subscribe after reconnect
    pub auto_resubscribe: bool,
    /// API credentials; the session logs in when present
    pub credentials: Option<Credentials>,
    /// Use the demo-trading endpoints in [`OkxWebSocketSession::connect_channel`]
    pub demo_trading: bool,
    /// Capacity of the event channel. Default: 1000
    pub event_channel_capacity: usize,
    /// Capacity of the command channel. Default: 100
    pub command_channel_capacity: usize,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 10_000,
            reconnect_attempts: 10,
            base_delay_ms: 1000,
            max_delay_ms: 30000,
            ping_interval_secs: 20,
            pong_timeout_secs: 10,
            auto_reconnect: true,
            auto_resubscribe: true,
            credentials: None,
            demo_trading: false,
            event_channel_capacity: 1000,
            command_channel_capacity: 100,
        }
    }
}

impl WebSocketConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
    Reconnecting = 3,
    Disconnecting = 4,
}

impl From<u8> for ConnectionState {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Connecting,
            2 => Self::Connected,
            3 => Self::Reconnecting,
            4 => Self::Disconnecting,
            _ => Self::Disconnected,
        }
    }
}

// ─── Commands from public API to background task ─────────────────────────────

enum Command {
    /// Write a frame. `id` names the pending call to fail if it cannot go out.
    Send { id: Option<String>, text: String },
    Disconnect,
}

// ─── Disconnect reasons for reconnection decision ────────────────────────────

enum DisconnectReason {
    UserRequested,
    PongTimeout,
    RateLimited,
    Error(String),
}

// ─── State shared between the session handle and its task ────────────────────

struct PendingCall {
    op: String,
    /// Set for subscribe calls, so id-less acks can still be matched
    channel: Option<ChannelKey>,
    tx: oneshot::Sender<WsResult<ReplyEnvelope>>,
}

struct SessionShared {
    pending: DashMap<String, PendingCall>,
    channels: SubscriptionMultiplexer,
    next_id: AtomicU64,
    state: AtomicU8,
    authenticated: AtomicBool,
}

impl SessionShared {
    fn new() -> Self {
        Self {
            pending: DashMap::new(),
            channels: SubscriptionMultiplexer::new(),
            next_id: AtomicU64::new(1),
            state: AtomicU8::new(ConnectionState::Disconnected as u8),
            authenticated: AtomicBool::new(false),
        }
    }

    fn next_request_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::Relaxed).to_string()
    }

    fn state(&self) -> ConnectionState {
        ConnectionState::from(self.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    fn set_authenticated(&self, authenticated: bool) {
        self.authenticated.store(authenticated, Ordering::SeqCst);
    }

    /// Fulfil a pending call. Returns false when nobody is waiting for `id`.
    fn resolve(&self, id: &str, result: WsResult<ReplyEnvelope>) -> bool {
        match self.pending.remove(id) {
            Some((_, call)) => {
                if call.tx.send(result).is_err() {
                    tracing::debug!(id = %id, op = %call.op, "Caller gave up before the reply");
                }
                true
            }
            None => false,
        }
    }

    fn pending_subscribe_id(&self, key: &ChannelKey) -> Option<String> {
        self.pending
            .iter()
            .find(|entry| entry.channel.as_ref() == Some(key))
            .map(|entry| entry.key().clone())
    }

    fn fail_pending(&self, err: WebSocketError) {
        let ids: Vec<String> = self.pending.iter().map(|entry| entry.key().clone()).collect();
        if !ids.is_empty() {
            tracing::debug!(count = ids.len(), error = %err, "Failing pending calls");
        }
        for id in ids {
            self.resolve(&id, Err(err.clone()));
        }
    }
}

/// Removes a pending call when the waiting caller returns or is dropped.
struct PendingGuard<'a> {
    shared: &'a SessionShared,
    id: &'a str,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.shared.pending.remove(self.id);
    }
}

// ─── Background task state ───────────────────────────────────────────────────

struct TaskState {
    url: String,
    config: WebSocketConfig,
    shared: Arc<SessionShared>,
    event_tx: mpsc::Sender<SessionEvent>,
    cmd_rx: mpsc::Receiver<Command>,
    reconnect_attempts: u32,
}

impl TaskState {
    fn emit(&self, event: SessionEvent) {
        if let Err(mpsc::error::TrySendError::Full(event)) = self.event_tx.try_send(event) {
            tracing::debug!(?event, "Event channel full, dropping event");
        }
    }
}

// ─── Public session ──────────────────────────────────────────────────────────

/// WebSocket session for OKX.
///
/// # Example
///
/// ```ignore
/// use okx_trade_sdk::auth::Credentials;
/// use okx_trade_sdk::domain::trade::PlaceOrderRequest;
/// use okx_trade_sdk::websocket::OkxWebSocketSession;
///
/// let session = OkxWebSocketSession::connect_private(Credentials::from_env()?).await?;
/// let ack = session.place_order(&request).await?;
/// println!("order {}", ack.ord_id);
/// ```
pub struct OkxWebSocketSession {
    url: String,
    config: WebSocketConfig,
    shared: Arc<SessionShared>,
    cmd_tx: mpsc::Sender<Command>,
    event_rx: tokio::sync::Mutex<mpsc::Receiver<SessionEvent>>,
    task_handle: Mutex<Option<JoinHandle<()>>>,
}

impl OkxWebSocketSession {
    /// Connect to a WebSocket server with default configuration
    pub async fn connect(url: &str) -> WsResult<Self> {
        Self::connect_with_config(url, WebSocketConfig::default()).await
    }

    /// Connect to the private endpoint and log in.
    pub async fn connect_private(credentials: Credentials) -> WsResult<Self> {
        let config = WebSocketConfig {
            credentials: Some(credentials),
            ..Default::default()
        };
        Self::connect_channel(WsChannelKind::Private, config).await
    }

    /// Connect to one of the exchange's endpoint families, live or demo per
    /// `config.demo_trading`.
    pub async fn connect_channel(kind: WsChannelKind, config: WebSocketConfig) -> WsResult<Self> {
        let url = kind.url(config.demo_trading);
        Self::connect_with_config(url, config).await
    }

    /// Connect to a WebSocket server with custom configuration.
    ///
    /// Logs in before returning when credentials are configured.
    pub async fn connect_with_config(url: &str, config: WebSocketConfig) -> WsResult<Self> {
        let shared = Arc::new(SessionShared::new());
        shared.set_state(ConnectionState::Connecting);
        let (sink, source, authenticated) = handshake(url, &config).await?;
        shared.set_state(ConnectionState::Connected);
        shared.set_authenticated(authenticated);

        let (event_tx, event_rx) = mpsc::channel(config.event_channel_capacity);
        let (cmd_tx, cmd_rx) = mpsc::channel(config.command_channel_capacity);

        tracing::info!(url = %url, authenticated, "WebSocket connected");
        let _ = event_tx.try_send(SessionEvent::Connected);
        if authenticated {
            let _ = event_tx.try_send(SessionEvent::Authenticated);
        }

        let state = TaskState {
            url: url.to_string(),
            config: config.clone(),
            shared: Arc::clone(&shared),
            event_tx,
            cmd_rx,
            reconnect_attempts: 0,
        };
        let handle = tokio::spawn(run_task(state, sink, source));

        Ok(Self {
            url: url.to_string(),
            config,
            shared,
            cmd_tx,
            event_rx: tokio::sync::Mutex::new(event_rx),
            task_handle: Mutex::new(Some(handle)),
        })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Send an operation and wait for its correlated reply.
    ///
    /// Fails with `Timeout` after the configured request timeout and with
    /// `ConnectionLost` if the socket drops first. Never retried.
    pub async fn query<T: DeserializeOwned>(&self, op: &Operation<T>) -> WsResult<T> {
        self.execute(op, None).await
    }

    /// [`query`](Self::query) that gives up with `Cancelled` once `cancel` fires.
    pub async fn query_with_cancel<T: DeserializeOwned>(
        &self,
        op: &Operation<T>,
        cancel: &CancellationToken,
    ) -> WsResult<T> {
        self.execute(op, Some(cancel)).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        op: &Operation<T>,
        cancel: Option<&CancellationToken>,
    ) -> WsResult<T> {
        let Endpoint::Socket { op: op_name } = op.endpoint() else {
            return Err(WebSocketError::Protocol(format!(
                "{} is not a WebSocket operation",
                op.endpoint()
            )));
        };
        if op.is_signed() && !self.is_authenticated() {
            return Err(WebSocketError::AuthRequired);
        }

        let args = op.request().envelope_args();
        let envelope = self.round_trip(op_name, &args, None, cancel).await?;
        decode_reply(envelope, op.shape(), op.has_per_item_status()).map_err(WebSocketError::from)
    }

    async fn round_trip<A: Serialize>(
        &self,
        op: &str,
        args: &A,
        channel: Option<ChannelKey>,
        cancel: Option<&CancellationToken>,
    ) -> WsResult<ReplyEnvelope> {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            return Err(WebSocketError::Cancelled);
        }
        if !self.is_connected() {
            return Err(WebSocketError::NotConnected);
        }

        let id = self.shared.next_request_id();
        let text = serde_json::to_string(&OpEnvelope {
            id: Some(&id),
            op,
            args,
        })?;

        let (tx, rx) = oneshot::channel();
        self.shared.pending.insert(
            id.clone(),
            PendingCall {
                op: op.to_string(),
                channel,
                tx,
            },
        );
        let _guard = PendingGuard {
            shared: &self.shared,
            id: &id,
        };

        tracing::debug!(id = %id, op = %op, "Sending request");
        self.cmd_tx
            .send(Command::Send {
                id: Some(id.clone()),
                text,
            })
            .await
            .map_err(|_| WebSocketError::NotConnected)?;

        let wait = tokio::time::timeout(self.config.request_timeout(), rx);
        let outcome = match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => {
                    tracing::debug!(id = %id, op = %op, "Request cancelled");
                    return Err(WebSocketError::Cancelled);
                }
                outcome = wait => outcome,
            },
            None => wait.await,
        };

        match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(WebSocketError::ConnectionLost),
            Err(_) => {
                tracing::debug!(id = %id, op = %op, "Request timed out");
                Err(WebSocketError::Timeout)
            }
        }
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Attach `handler` to a channel.
    ///
    /// The first handler for a channel subscribes on the exchange and waits
    /// for the ack. Later handlers attach without a round trip but still
    /// wait for that first ack and share its outcome.
    pub async fn subscribe<F>(&self, arg: ChannelArg, handler: F) -> WsResult<SubscriptionHandle>
    where
        F: FnMut(Arc<PushFrame>) + Send + 'static,
    {
        let attached = self.shared.channels.attach(arg.clone(), Box::new(handler));
        self.settle_attached(&arg, attached).await
    }

    /// Stream form of [`subscribe`](Self::subscribe).
    pub async fn subscribe_stream(&self, arg: ChannelArg) -> WsResult<SubscriptionStream> {
        let (stream, attached) = self.shared.channels.attach_stream(arg.clone());
        self.settle_attached(&arg, attached).await?;
        Ok(stream)
    }

    async fn settle_attached(
        &self,
        arg: &ChannelArg,
        attached: Attached,
    ) -> WsResult<SubscriptionHandle> {
        let Attached {
            handle,
            first,
            mut ack,
        } = attached;

        let result = if first {
            self.confirm_subscription(arg).await
        } else {
            let waited = tokio::time::timeout(
                self.config.request_timeout(),
                ack.wait_for(|state| *state != AckState::Pending),
            )
            .await;
            match waited {
                Ok(Ok(state)) => match &*state {
                    AckState::Failed(reason) => Err(WebSocketError::SubscriptionFailed(reason.clone())),
                    AckState::Pending | AckState::Confirmed => Ok(()),
                },
                // The entry went away before its first ack settled
                Ok(Err(_)) => Err(WebSocketError::SubscriptionFailed(format!(
                    "{}: subscription dropped",
                    handle.key()
                ))),
                Err(_) => Err(WebSocketError::Timeout),
            }
        };

        match result {
            Ok(()) => Ok(handle),
            Err(e) => {
                self.shared.channels.detach(&handle);
                Err(e)
            }
        }
    }

    async fn confirm_subscription(&self, arg: &ChannelArg) -> WsResult<()> {
        let key = arg.key();
        let result = match self
            .round_trip(OP_SUBSCRIBE, &[arg], Some(key.clone()), None)
            .await
        {
            Ok(ack) if ack.is_success() => Ok(()),
            Ok(ack) => Err(WebSocketError::SubscriptionFailed(format!(
                "{}: {} {}",
                key, ack.code, ack.msg
            ))),
            Err(e) => Err(e),
        };

        match &result {
            Ok(()) => {
                tracing::info!(channel = %key, "Subscribed");
                self.shared.channels.settle(&key, AckState::Confirmed);
            }
            Err(e) => {
                tracing::warn!(channel = %key, error = %e, "Subscribe failed");
                let reason = match e {
                    WebSocketError::SubscriptionFailed(reason) => reason.clone(),
                    other => format!("{}: {}", key, other),
                };
                self.shared.channels.settle(&key, AckState::Failed(reason));
                self.shared.channels.remove(&key);
            }
        }
        result
    }

    /// Detach a handler. The last handler for a channel unsubscribes on the
    /// exchange.
    pub async fn unsubscribe(&self, handle: &SubscriptionHandle) -> WsResult<()> {
        let Some(arg) = self.shared.channels.detach(handle) else {
            return Ok(());
        };
        if !self.is_connected() {
            return Ok(());
        }

        let id = self.shared.next_request_id();
        let text = serde_json::to_string(&OpEnvelope {
            id: Some(&id),
            op: OP_UNSUBSCRIBE,
            args: [&arg],
        })?;
        tracing::info!(channel = %arg.key(), "Unsubscribing");
        self.cmd_tx
            .send(Command::Send { id: None, text })
            .await
            .map_err(|_| WebSocketError::NotConnected)
    }

    // =========================================================================
    // State
    // =========================================================================

    /// Get a stream of session events.
    ///
    /// The returned stream borrows `self`, so it must be dropped
    /// before calling `disconnect()`.
    pub fn events(&self) -> Pin<Box<dyn Stream<Item = SessionEvent> + Send + '_>> {
        Box::pin(futures_util::stream::unfold(
            &self.event_rx,
            |rx| async move {
                let mut guard = rx.lock().await;
                guard.recv().await.map(|event| (event, rx))
            },
        ))
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.shared.state()
    }

    pub fn is_connected(&self) -> bool {
        self.connection_state() == ConnectionState::Connected
    }

    pub fn is_authenticated(&self) -> bool {
        self.shared.authenticated.load(Ordering::SeqCst)
    }

    /// Number of channels subscribed on the exchange.
    pub fn subscription_count(&self) -> usize {
        self.shared.channels.len()
    }

    /// Number of queries waiting for a reply.
    pub fn pending_requests(&self) -> usize {
        self.shared.pending.len()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn config(&self) -> &WebSocketConfig {
        &self.config
    }

    /// Close the connection and stop the background task.
    pub async fn disconnect(&self) -> WsResult<()> {
        self.shared.set_state(ConnectionState::Disconnecting);
        let _ = self.cmd_tx.send(Command::Disconnect).await;

        let handle = self
            .task_handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        }

        self.shared.set_state(ConnectionState::Disconnected);
        Ok(())
    }
}

impl Drop for OkxWebSocketSession {
    fn drop(&mut self) {
        let handle = self
            .task_handle
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

// ─── Connection setup ────────────────────────────────────────────────────────

/// Open the socket and, with credentials, log in.
async fn handshake(url: &str, config: &WebSocketConfig) -> WsResult<(WsSink, WsSource, bool)> {
    let (ws_stream, _) = tokio::time::timeout(CONNECTION_TIMEOUT, connect_async(url))
        .await
        .map_err(|_| WebSocketError::Timeout)?
        .map_err(WebSocketError::from)?;
    let (mut sink, mut source) = ws_stream.split();

    let authenticated = match &config.credentials {
        Some(credentials) => {
            let args = credentials.login_args()?;
            send_json(
                &mut sink,
                &OpEnvelope {
                    id: None,
                    op: OP_LOGIN,
                    args: [&args],
                },
            )
            .await?;
            tokio::time::timeout(config.request_timeout(), await_login(&mut source))
                .await
                .map_err(|_| WebSocketError::Timeout)??;
            true
        }
        None => false,
    };

    Ok((sink, source, authenticated))
}

async fn await_login(source: &mut WsSource) -> WsResult<()> {
    while let Some(msg) = source.next().await {
        let text = match msg? {
            Message::Text(text) => text,
            Message::Close(frame) => {
                let (code, reason) = extract_close(frame.as_ref());
                return Err(WebSocketError::ConnectionClosed { code, reason });
            }
            _ => continue,
        };
        let text: &str = text.as_ref();
        match Inbound::parse(text) {
            Ok(Inbound::Event(event)) if event.event == OP_LOGIN || event.event == "error" => {
                if event.is_success() {
                    tracing::info!(conn_id = ?event.conn_id, "WebSocket login accepted");
                    return Ok(());
                }
                return Err(WebSocketError::AuthenticationFailed(format!(
                    "{} {}",
                    event.code, event.msg
                )));
            }
            Ok(_) => tracing::debug!("Ignoring frame received before login reply"),
            Err(e) => tracing::warn!(error = %e, "Failed to parse frame during login"),
        }
    }
    Err(WebSocketError::ConnectionLost)
}

// ─── Background task ─────────────────────────────────────────────────────────

async fn run_task(mut state: TaskState, sink: WsSink, source: WsSource) {
    drive(&mut state, sink, source).await;

    state.shared.set_authenticated(false);
    state.shared.set_state(ConnectionState::Disconnected);
    state.shared.fail_pending(WebSocketError::ConnectionLost);
    if !state.shared.channels.is_empty() {
        tracing::info!(
            count = state.shared.channels.len(),
            "Session closed, dropping subscriptions"
        );
        state.shared.channels.clear();
    }
}

async fn drive(state: &mut TaskState, mut sink: WsSink, mut source: WsSource) {
    loop {
        let reason = run_connected(state, sink, source).await;

        // ── Connection gone: nothing in flight can complete ─────────────
        state.shared.set_authenticated(false);
        state.shared.set_state(ConnectionState::Disconnected);
        state.shared.fail_pending(WebSocketError::ConnectionLost);
        state.shared.channels.mark_all_unconfirmed();

        let rate_limited = match reason {
            DisconnectReason::UserRequested => return,
            DisconnectReason::RateLimited => true,
            DisconnectReason::PongTimeout => false,
            DisconnectReason::Error(reason) => {
                tracing::debug!(reason = %reason, "Connection dropped");
                false
            }
        };
        if !state.config.auto_reconnect {
            return;
        }

        match reconnect(state, rate_limited).await {
            Some((new_sink, new_source)) => {
                sink = new_sink;
                source = new_source;
            }
            None => return,
        }
    }
}

/// The inner connected loop: runs until the connection breaks.
async fn run_connected(
    state: &mut TaskState,
    mut sink: WsSink,
    mut source: WsSource,
) -> DisconnectReason {
    let ping_dur = Duration::from_secs(state.config.ping_interval_secs);
    let pong_dur = Duration::from_secs(state.config.pong_timeout_secs);

    let mut ping_interval = tokio::time::interval(ping_dur);
    ping_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ping_interval.reset();

    let mut pong_deadline: Option<Instant> = None;
    let far_future = Instant::now() + Duration::from_secs(86400);
    let pong_sleep = tokio::time::sleep_until(far_future);
    tokio::pin!(pong_sleep);

    loop {
        tokio::select! {
            // ── a) Incoming WS message ───────────────────────────────────
            msg = source.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let text: &str = text.as_ref();
                        if handle_text(state, text) {
                            pong_deadline = None;
                            pong_sleep.as_mut().reset(far_future);
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = extract_close(frame.as_ref());
                        tracing::info!(code, reason = %reason, "WebSocket closed by server");
                        state.emit(SessionEvent::Disconnected {
                            code: Some(code),
                            reason: reason.clone(),
                        });
                        if code == 1008 {
                            state.emit(SessionEvent::Error(WebSocketError::RateLimited));
                            return DisconnectReason::RateLimited;
                        }
                        return DisconnectReason::Error(reason);
                    }
                    Some(Ok(_)) => {} // Binary, Pong, Frame ignored
                    Some(Err(e)) => {
                        let reason = e.to_string();
                        tracing::error!(error = %reason, "WebSocket error");
                        state.emit(SessionEvent::Disconnected {
                            code: None,
                            reason: reason.clone(),
                        });
                        return DisconnectReason::Error(reason);
                    }
                    None => {
                        tracing::info!("WebSocket stream ended");
                        state.emit(SessionEvent::Disconnected {
                            code: None,
                            reason: "Stream ended".into(),
                        });
                        return DisconnectReason::Error("Stream ended".into());
                    }
                }
            }

            // ── b) Command from public API ───────────────────────────────
            cmd = state.cmd_rx.recv() => {
                match cmd {
                    Some(Command::Send { id, text }) => {
                        if let Err(e) = send_text(&mut sink, text).await {
                            tracing::warn!(error = %e, "Send failed");
                            if let Some(id) = id {
                                state.shared.resolve(&id, Err(e));
                            }
                        }
                    }
                    Some(Command::Disconnect) | None => {
                        let _ = sink.send(Message::Close(Some(CloseFrame {
                            code: CloseCode::Normal,
                            reason: "Client disconnect".into(),
                        }))).await;
                        state.emit(SessionEvent::Disconnected {
                            code: Some(1000),
                            reason: "Client disconnect".into(),
                        });
                        return DisconnectReason::UserRequested;
                    }
                }
            }

            // ── c) Ping interval ─────────────────────────────────────────
            _ = ping_interval.tick() => {
                if pong_deadline.is_none() {
                    match send_text(&mut sink, PING.to_string()).await {
                        Ok(()) => {
                            let deadline = Instant::now() + pong_dur;
                            pong_deadline = Some(deadline);
                            pong_sleep.as_mut().reset(deadline);
                        }
                        Err(e) => tracing::warn!(error = %e, "Failed to send ping"),
                    }
                }
            }

            // ── d) Pong timeout ──────────────────────────────────────────
            () = &mut pong_sleep, if pong_deadline.is_some() => {
                tracing::warn!(
                    timeout_secs = state.config.pong_timeout_secs,
                    "Pong timeout, dropping connection"
                );
                state.emit(SessionEvent::Error(WebSocketError::PongTimeout));
                state.emit(SessionEvent::Disconnected {
                    code: None,
                    reason: "Pong timeout".into(),
                });
                let _ = sink.close().await;
                return DisconnectReason::PongTimeout;
            }
        }
    }
}

/// Route one text frame. Returns true for a keepalive `pong`.
fn handle_text(state: &TaskState, text: &str) -> bool {
    match Inbound::parse(text) {
        Ok(Inbound::Pong) => return true,
        Ok(Inbound::Reply(reply)) => {
            let id = reply.id.clone();
            if !state.shared.resolve(&id, Ok(reply.envelope)) {
                tracing::debug!(id = %id, op = %reply.op, "Dropping reply with no pending call");
            }
        }
        Ok(Inbound::Push(frame)) => {
            state.shared.channels.dispatch(frame);
        }
        Ok(Inbound::Event(event)) => handle_event(state, event),
        Err(e) => {
            tracing::warn!(error = %e, raw = %text, "Failed to parse frame");
            state.emit(SessionEvent::Error(WebSocketError::MessageParseError(
                e.to_string(),
            )));
        }
    }
    false
}

fn handle_event(state: &TaskState, event: EventFrame) {
    match event.event.as_str() {
        OP_SUBSCRIBE | OP_UNSUBSCRIBE | "error" => {
            let key = event.arg.as_ref().map(ChannelArg::key);
            if event.event == OP_SUBSCRIBE {
                if let Some(key) = &key {
                    state.shared.channels.mark_confirmed(key);
                }
            }

            let id = event
                .id
                .clone()
                .or_else(|| key.as_ref().and_then(|k| state.shared.pending_subscribe_id(k)));
            let success = event.is_success();
            let kind = event.event.clone();
            let (code, msg) = (event.code.clone(), event.msg.clone());

            let resolved = match id {
                Some(id) => state.shared.resolve(&id, Ok(event.into_envelope())),
                None => false,
            };
            if resolved {
                return;
            }
            if success {
                tracing::debug!(event = %kind, channel = ?key, "Unsolicited ack");
            } else {
                tracing::warn!(code = %code, msg = %msg, channel = ?key, "Server reported an error");
                state.emit(SessionEvent::Error(WebSocketError::Exchange {
                    code,
                    message: msg,
                }));
            }
        }
        OP_LOGIN => {
            tracing::debug!(code = %event.code, "Ignoring login reply outside handshake");
        }
        "notice" => {
            tracing::info!(code = %event.code, msg = %event.msg, "Server notice");
            state.emit(SessionEvent::Notice {
                code: event.code,
                message: event.msg,
            });
        }
        "channel-conn-count" => {
            tracing::debug!(
                channel = ?event.channel,
                conn_count = ?event.conn_count,
                "Channel connection count"
            );
        }
        "channel-conn-count-error" => {
            tracing::warn!(channel = ?event.channel, msg = %event.msg, "Channel connection limit");
        }
        other => {
            tracing::debug!(event = %other, "Ignoring event");
        }
    }
}

// ─── Reconnection ────────────────────────────────────────────────────────────

async fn reconnect(state: &mut TaskState, rate_limited: bool) -> Option<(WsSink, WsSource)> {
    state.shared.set_state(ConnectionState::Reconnecting);

    while state.reconnect_attempts < state.config.reconnect_attempts {
        state.reconnect_attempts += 1;
        let attempt = state.reconnect_attempts;
        let delay = backoff_delay(&state.config, attempt, rate_limited);

        tracing::info!(
            attempt,
            max = state.config.reconnect_attempts,
            delay_ms = delay.as_millis() as u64,
            rate_limited,
            "Reconnecting"
        );
        state.emit(SessionEvent::Reconnecting { attempt });
        if !wait_backoff(state, delay).await {
            return None;
        }

        state.shared.set_state(ConnectionState::Connecting);
        match handshake(&state.url, &state.config).await {
            Ok((mut sink, source, authenticated)) => {
                state.reconnect_attempts = 0;
                state.shared.set_authenticated(authenticated);
                state.shared.set_state(ConnectionState::Connected);
                tracing::info!(url = %state.url, attempt, "WebSocket reconnected");
                state.emit(SessionEvent::Connected);
                if authenticated {
                    state.emit(SessionEvent::Authenticated);
                }
                resubscribe_all(state, &mut sink).await;
                return Some((sink, source));
            }
            Err(e) => {
                tracing::error!(error = %e, attempt, "Reconnect failed");
                state.shared.set_state(ConnectionState::Reconnecting);
                state.emit(SessionEvent::Error(e));
            }
        }
    }

    tracing::error!(
        attempts = state.config.reconnect_attempts,
        "Giving up on reconnecting"
    );
    None
}

/// Sleep out a backoff delay. Calls issued meanwhile are rejected; returns
/// false when the session asked to disconnect.
async fn wait_backoff(state: &mut TaskState, delay: Duration) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            () = &mut sleep => return true,
            cmd = state.cmd_rx.recv() => match cmd {
                Some(Command::Send { id: Some(id), .. }) => {
                    state.shared.resolve(&id, Err(WebSocketError::NotConnected));
                }
                Some(Command::Send { id: None, .. }) => {}
                Some(Command::Disconnect) | None => return false,
            },
        }
    }
}

async fn resubscribe_all(state: &TaskState, sink: &mut WsSink) {
    if !state.config.auto_resubscribe {
        if !state.shared.channels.is_empty() {
            tracing::info!(
                count = state.shared.channels.len(),
                "Dropping subscriptions, auto-resubscribe disabled"
            );
            state.shared.channels.clear();
        }
        return;
    }

    let args = state.shared.channels.all_args();
    if args.is_empty() {
        return;
    }
    tracing::info!(count = args.len(), "Resubscribing tracked channels");
    for arg in &args {
        let id = state.shared.next_request_id();
        let envelope = OpEnvelope {
            id: Some(&id),
            op: OP_SUBSCRIBE,
            args: [arg],
        };
        if let Err(e) = send_json(sink, &envelope).await {
            tracing::warn!(channel = %arg.key(), error = %e, "Failed to resubscribe");
        }
    }
}

/// Exponential backoff with jitter, capped at `max_delay_ms` (ten times that
/// when rate limited).
fn backoff_delay(config: &WebSocketConfig, attempt: u32, rate_limited: bool) -> Duration {
    let exp = attempt.saturating_sub(1).min(10);
    let base = config.base_delay_ms.saturating_mul(1u64 << exp);
    let jitter = rand::thread_rng().gen_range(0..=config.base_delay_ms / 2);
    let cap = if rate_limited {
        config.max_delay_ms.saturating_mul(10)
    } else {
        config.max_delay_ms
    };
    Duration::from_millis(base.saturating_add(jitter).min(cap))
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

async fn send_json<T: Serialize>(sink: &mut WsSink, msg: &T) -> WsResult<()> {
    let json = serde_json::to_string(msg)?;
    send_text(sink, json).await
}

async fn send_text(sink: &mut WsSink, text: String) -> WsResult<()> {
    sink.send(Message::Text(text.into()))
        .await
        .map_err(|e| WebSocketError::SendFailed(e.to_string()))
}

/// Extract close code and reason from an optional CloseFrame.
fn extract_close(frame: Option<&CloseFrame>) -> (u16, String) {
    match frame {
        Some(f) => (f.code.into(), f.reason.to_string()),
        None => (1006, "No close frame".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = WebSocketConfig::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.reconnect_attempts, 10);
        assert_eq!(config.base_delay_ms, 1000);
        assert_eq!(config.max_delay_ms, 30000);
        assert_eq!(config.ping_interval_secs, 20);
        assert_eq!(config.pong_timeout_secs, 10);
        assert!(config.auto_reconnect);
        assert!(config.auto_resubscribe);
        assert!(config.credentials.is_none());
        assert_eq!(config.event_channel_capacity, 1000);
        assert_eq!(config.command_channel_capacity, 100);
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let config = WebSocketConfig::default();

        let first = backoff_delay(&config, 1, false).as_millis() as u64;
        assert!((1000..=1500).contains(&first));

        let third = backoff_delay(&config, 3, false).as_millis() as u64;
        assert!((4000..=4500).contains(&third));

        let capped = backoff_delay(&config, 20, false).as_millis() as u64;
        assert_eq!(capped, 30000);

        let limited = backoff_delay(&config, 20, true).as_millis() as u64;
        assert!(limited > 30000);
    }

    #[test]
    fn test_connection_state_round_trip() {
        for state in [
            ConnectionState::Disconnected,
            ConnectionState::Connecting,
            ConnectionState::Connected,
            ConnectionState::Reconnecting,
            ConnectionState::Disconnecting,
        ] {
            assert_eq!(ConnectionState::from(state as u8), state);
        }
    }

    #[test]
    fn test_resolve_and_fail_pending() {
        let shared = SessionShared::new();
        let (tx, mut rx) = oneshot::channel();
        shared.pending.insert(
            "1".to_string(),
            PendingCall {
                op: "order".to_string(),
                channel: None,
                tx,
            },
        );
        assert!(shared.resolve("1", Ok(ReplyEnvelope::default())));
        assert!(rx.try_recv().unwrap().is_ok());
        assert!(!shared.resolve("1", Ok(ReplyEnvelope::default())));

        let (tx, mut rx) = oneshot::channel();
        shared.pending.insert(
            "2".to_string(),
            PendingCall {
                op: "subscribe".to_string(),
                channel: Some(ChannelArg::new("orders").key()),
                tx,
            },
        );
        assert_eq!(
            shared.pending_subscribe_id(&ChannelArg::new("orders").key()),
            Some("2".to_string())
        );
        shared.fail_pending(WebSocketError::ConnectionLost);
        assert!(matches!(
            rx.try_recv().unwrap(),
            Err(WebSocketError::ConnectionLost)
        ));
        assert!(shared.pending.is_empty());
    }

    #[test]
    fn test_request_ids_are_monotonic() {
        let shared = SessionShared::new();
        let a: u64 = shared.next_request_id().parse().unwrap();
        let b: u64 = shared.next_request_id().parse().unwrap();
        assert!(b > a);
    }

    #[test]
    fn test_extract_close_with_frame() {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "goodbye".into(),
        };
        let (code, reason) = extract_close(Some(&frame));
        assert_eq!(code, 1000);
        assert_eq!(reason, "goodbye");
    }

    #[test]
    fn test_extract_close_no_frame() {
        let (code, reason) = extract_close(None);
        assert_eq!(code, 1006);
        assert_eq!(reason, "No close frame");
    }
}
