//! Realtime relay client.
//!
//! One [`RealtimeRelay`] serves one chat session. It opens the WebSocket,
//! authorizes it, forwards respond requests and pushes the text it receives
//! into a [`StreamAdapter`].
//!
//! # Example
//!
//! ```rust,ignore
//! use realtime_relay::core::realtime::{Credential, RealtimeRelay, RelayConfig, Turn};
//!
//! #[tokio::main]
//! async fn main() {
//!     let credential = Credential::new("sk-...", Some("Be concise".into())).unwrap();
//!     let (mut relay, output) = RealtimeRelay::with_stream(RelayConfig::default());
//!
//!     relay.connect(&credential).await.unwrap();
//!     relay.send("Be concise", &[Turn::user("Hi")]).await.unwrap();
//!
//!     let reply = output.collect_text().await;
//!     relay.disconnect().await.unwrap();
//! }
//! ```

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::config::{OPENAI_BETA_HEADER, OPENAI_BETA_VALUE, RelayConfig};
use super::messages::{InboundEvent, OutboundRequest, decode, encode_authorize};
use crate::core::realtime::base::{
    ConnectionState, RealtimeError, RealtimeErrorCallback, RealtimeResult, Turn,
};
use crate::core::realtime::credential::Credential;
use crate::core::realtime::stream::{OutputStream, StreamAdapter, output_stream};

/// Capacity of the outbound request channel.
const OUTBOUND_CHANNEL_CAPACITY: usize = 32;

/// How long `disconnect` waits for the session task before aborting it.
const DISCONNECT_GRACE: Duration = Duration::from_secs(2);

/// Abort reason when the caller disconnects mid-response.
pub const DISCONNECTED_REASON: &str = "disconnected";

/// Abort reason when the service closes the socket mid-response.
pub const REMOTE_CLOSED_REASON: &str = "connection closed by remote";

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Connection manager for one relay session.
///
/// # Thread Safety
///
/// State and the error observer sit behind `Arc<RwLock<_>>` so the spawned
/// session task and the caller see the same values. The socket and the
/// stream adapter are owned by the session task alone.
pub struct RealtimeRelay {
    config: RelayConfig,
    session_id: String,
    state: Arc<RwLock<ConnectionState>>,
    /// Stream adapter, moved into the session task on connect
    output: Option<StreamAdapter>,
    outbound: Option<mpsc::Sender<OutboundRequest>>,
    error_callback: Arc<RwLock<Option<RealtimeErrorCallback>>>,
    cancel: CancellationToken,
    connection_handle: Option<JoinHandle<()>>,
}

impl RealtimeRelay {
    /// Create an idle relay writing into `output`.
    pub fn new(config: RelayConfig, output: StreamAdapter) -> Self {
        Self {
            config,
            session_id: Uuid::new_v4().to_string(),
            state: Arc::new(RwLock::new(ConnectionState::Idle)),
            output: Some(output),
            outbound: None,
            error_callback: Arc::new(RwLock::new(None)),
            cancel: CancellationToken::new(),
            connection_handle: None,
        }
    }

    /// Create an idle relay together with the stream it writes into.
    pub fn with_stream(config: RelayConfig) -> (Self, OutputStream) {
        let (adapter, output) = output_stream(config.stream_buffer_size);
        (Self::new(config, adapter), output)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == ConnectionState::Ready
    }

    /// Register the error observer. Replaces any previous observer.
    pub fn on_error(&self, callback: RealtimeErrorCallback) {
        *self.error_callback.write() = Some(callback);
    }

    /// Open the socket and send the authorize frame.
    ///
    /// Valid only on an idle relay. On failure the relay moves to `Failed`
    /// and the output stream is aborted with the error text.
    pub async fn connect(&mut self, credential: &Credential) -> RealtimeResult<()> {
        {
            let mut state = self.state.write();
            if *state != ConnectionState::Idle {
                return Err(RealtimeError::ConnectError(format!(
                    "relay is {}, expected Idle",
                    *state
                )));
            }
            *state = ConnectionState::Connecting;
        }

        let Some(mut adapter) = self.output.take() else {
            *self.state.write() = ConnectionState::Failed;
            return Err(RealtimeError::ConnectError(
                "no output stream attached".to_string(),
            ));
        };

        let (sink, source) = match self.open_transport(credential).await {
            Ok(halves) => halves,
            Err(err) => {
                error!(session_id = %self.session_id, error = %err, "Realtime relay connect failed");
                *self.state.write() = ConnectionState::Failed;
                adapter.on_abort(err.to_string()).await;
                return Err(err);
            }
        };

        let (tx, rx) = mpsc::channel::<OutboundRequest>(OUTBOUND_CHANNEL_CAPACITY);
        self.outbound = Some(tx);

        let task = SessionTask {
            session_id: self.session_id.clone(),
            state: self.state.clone(),
            error_callback: self.error_callback.clone(),
            adapter,
            authorize_timeout: self.config.authorize_timeout,
            authorize_timeout_ms: self.config.authorize_timeout_ms(),
        };
        let cancel = self.cancel.clone();
        self.connection_handle = Some(tokio::spawn(task.run(sink, source, rx, cancel)));

        Ok(())
    }

    /// Handshake plus authorize frame. Leaves the relay in `Authorizing`.
    async fn open_transport(&self, credential: &Credential) -> RealtimeResult<(WsSink, WsSource)> {
        let url = self.config.build_ws_url()?;

        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| RealtimeError::ConnectError(e.to_string()))?;
        let bearer = HeaderValue::from_str(&credential.bearer())
            .map_err(|e| RealtimeError::ConnectError(format!("invalid credential header: {e}")))?;
        request.headers_mut().insert(AUTHORIZATION, bearer);
        request
            .headers_mut()
            .insert(OPENAI_BETA_HEADER, HeaderValue::from_static(OPENAI_BETA_VALUE));

        info!(session_id = %self.session_id, host = url.host_str().unwrap_or_default(), "Connecting to realtime endpoint");

        let (ws_stream, _response) = connect_async(request)
            .await
            .map_err(|e| RealtimeError::ConnectError(e.to_string()))?;
        let (mut sink, source) = ws_stream.split();

        *self.state.write() = ConnectionState::Authorizing;

        let frame = encode_authorize(credential.secret())?;
        sink.send(Message::Text(frame.into()))
            .await
            .map_err(|e| RealtimeError::ConnectError(format!("failed to send authorize frame: {e}")))?;

        debug!(session_id = %self.session_id, "Authorize frame sent");
        Ok((sink, source))
    }

    /// Queue a respond request for `turns`.
    ///
    /// Fails with [`RealtimeError::NotConnected`] unless the relay is
    /// `Authorizing` or `Ready`; nothing is written in that case.
    pub async fn send(&self, instructions: &str, turns: &[Turn]) -> RealtimeResult<()> {
        if !self.state().accepts_send() {
            return Err(RealtimeError::NotConnected);
        }
        let sender = self.outbound.as_ref().ok_or(RealtimeError::NotConnected)?;

        sender
            .send(OutboundRequest::Respond {
                instructions: instructions.to_string(),
                turns: turns.to_vec(),
                temperature: self.config.temperature,
            })
            .await
            .map_err(|_| RealtimeError::NotConnected)?;

        debug!(session_id = %self.session_id, turns = turns.len(), "Respond request queued");
        Ok(())
    }

    /// Close the session. Idempotent.
    pub async fn disconnect(&mut self) -> RealtimeResult<()> {
        let previous = {
            let mut state = self.state.write();
            let previous = *state;
            if !previous.is_terminal() {
                *state = ConnectionState::Closed;
            }
            previous
        };

        self.cancel.cancel();
        self.outbound = None;

        // Never connected: the adapter is still here and its consumer waits.
        if let Some(mut adapter) = self.output.take() {
            adapter.on_abort(DISCONNECTED_REASON).await;
        }

        if let Some(mut handle) = self.connection_handle.take()
            && tokio::time::timeout(DISCONNECT_GRACE, &mut handle)
                .await
                .is_err()
        {
            warn!(session_id = %self.session_id, "Session task did not stop in time, aborting");
            handle.abort();
        }

        if !previous.is_terminal() {
            info!(session_id = %self.session_id, from = %previous, "Realtime relay disconnected");
        }
        Ok(())
    }

    pub fn get_provider_info(&self) -> serde_json::Value {
        serde_json::json!({
            "provider": "openai",
            "api_type": "WebSocket Realtime",
            "endpoint": self.config.url,
            "model": self.config.model,
            "protocol_header": format!("{OPENAI_BETA_HEADER}: {OPENAI_BETA_VALUE}"),
            "modalities": ["text"],
            "session_id": self.session_id,
            "state": self.state().to_string(),
            "features": {
                "text_streaming": true,
                "audio": false,
                "function_calling": false,
                "reconnection": false
            },
        })
    }
}

impl Drop for RealtimeRelay {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// =============================================================================
// Session Task
// =============================================================================

/// State owned by the spawned task that drives the socket.
struct SessionTask {
    session_id: String,
    state: Arc<RwLock<ConnectionState>>,
    error_callback: Arc<RwLock<Option<RealtimeErrorCallback>>>,
    adapter: StreamAdapter,
    authorize_timeout: Duration,
    /// Same deadline, as reported in `AuthorizationTimeout`
    authorize_timeout_ms: u64,
}

impl SessionTask {
    async fn run(
        mut self,
        mut sink: WsSink,
        mut source: WsSource,
        mut outbound: mpsc::Receiver<OutboundRequest>,
        cancel: CancellationToken,
    ) {
        let deadline = tokio::time::sleep(self.authorize_timeout);
        tokio::pin!(deadline);

        loop {
            let authorizing = *self.state.read() == ConnectionState::Authorizing;

            let flow = tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    debug!(session_id = %self.session_id, "Session cancelled");
                    self.adapter.on_abort(DISCONNECTED_REASON).await;
                    ControlFlow::Break(())
                }

                request = outbound.recv() => match request {
                    Some(request) => self.write_request(&mut sink, request).await,
                    None => ControlFlow::Break(()),
                },

                frame = source.next() => self.handle_frame(&mut sink, frame).await,

                _ = &mut deadline, if authorizing => {
                    let err = RealtimeError::AuthorizationTimeout(self.authorize_timeout_ms);
                    warn!(session_id = %self.session_id, "No readiness signal before deadline");
                    self.fail(err.clone()).await;
                    self.adapter.on_abort(err.to_string()).await;
                    ControlFlow::Break(())
                }
            };

            if flow.is_break() {
                break;
            }
        }

        if let Err(e) = sink.close().await {
            debug!(session_id = %self.session_id, error = %e, "Socket close failed");
        }
        info!(session_id = %self.session_id, state = %*self.state.read(), "Realtime session task ended");
    }

    async fn write_request(&mut self, sink: &mut WsSink, request: OutboundRequest) -> ControlFlow<()> {
        let kind = request.kind();
        let frame = match request.encode() {
            Ok(frame) => frame,
            Err(err) => {
                error!(session_id = %self.session_id, kind, error = %err, "Failed to encode request");
                self.notify(err).await;
                return ControlFlow::Continue(());
            }
        };

        if let Err(e) = sink.send(Message::Text(frame.into())).await {
            self.transport_failed(e.to_string()).await;
            return ControlFlow::Break(());
        }
        debug!(session_id = %self.session_id, kind, "Request sent");

        if matches!(request, OutboundRequest::Respond { .. }) {
            self.promote_ready();
        }
        ControlFlow::Continue(())
    }

    async fn handle_frame(
        &mut self,
        sink: &mut WsSink,
        frame: Option<Result<Message, WsError>>,
    ) -> ControlFlow<()> {
        match frame {
            Some(Ok(Message::Text(text))) => self.dispatch(text.as_str()).await,
            Some(Ok(Message::Ping(data))) => {
                if let Err(e) = sink.send(Message::Pong(data)).await {
                    self.transport_failed(e.to_string()).await;
                    return ControlFlow::Break(());
                }
                ControlFlow::Continue(())
            }
            Some(Ok(Message::Close(_))) | None => {
                info!(session_id = %self.session_id, "Socket closed by remote");
                self.transition(ConnectionState::Closed);
                if self.adapter.is_open() {
                    self.adapter.on_abort(REMOTE_CLOSED_REASON).await;
                }
                ControlFlow::Break(())
            }
            Some(Ok(_)) => ControlFlow::Continue(()),
            Some(Err(e)) => {
                self.transport_failed(e.to_string()).await;
                ControlFlow::Break(())
            }
        }
    }

    async fn dispatch(&mut self, text: &str) -> ControlFlow<()> {
        if self.state.read().is_terminal() {
            debug!(session_id = %self.session_id, "Ignoring frame after session end");
            return ControlFlow::Continue(());
        }

        let event = match decode(text) {
            Ok(event) => event,
            Err(err) => {
                warn!(session_id = %self.session_id, error = %err, "Ignoring malformed frame");
                return ControlFlow::Continue(());
            }
        };

        match event {
            InboundEvent::TextDelta { text } => {
                self.adapter.on_text_delta(text).await;
            }
            InboundEvent::End => {
                debug!(session_id = %self.session_id, "Response complete");
                self.adapter.on_end().await;
            }
            InboundEvent::Error { message } => {
                warn!(session_id = %self.session_id, %message, "Remote error");
                let rejected = *self.state.read() == ConnectionState::Authorizing;
                if rejected {
                    self.fail(RealtimeError::RemoteError(message.clone())).await;
                } else {
                    self.notify(RealtimeError::RemoteError(message.clone())).await;
                }
                self.adapter.on_abort(message).await;
                if rejected {
                    return ControlFlow::Break(());
                }
            }
            InboundEvent::SessionAck => self.promote_ready(),
            InboundEvent::Ignored => {
                debug!(session_id = %self.session_id, "Ignoring unhandled event type");
            }
        }
        ControlFlow::Continue(())
    }

    async fn transport_failed(&mut self, reason: String) {
        error!(session_id = %self.session_id, %reason, "Realtime transport error");
        self.fail(RealtimeError::TransportError(reason.clone())).await;
        self.adapter.on_abort(reason).await;
    }

    /// Move to `Failed` and report `err`, unless the session already ended.
    async fn fail(&self, err: RealtimeError) {
        if self.transition(ConnectionState::Failed) {
            self.notify(err).await;
        }
    }

    async fn notify(&self, err: RealtimeError) {
        let callback = self.error_callback.read().clone();
        if let Some(cb) = callback {
            cb(err).await;
        }
    }

    /// Set `next` unless the current state is terminal.
    fn transition(&self, next: ConnectionState) -> bool {
        let mut state = self.state.write();
        if state.is_terminal() {
            return false;
        }
        *state = next;
        true
    }

    fn promote_ready(&self) {
        let mut state = self.state.write();
        if *state == ConnectionState::Authorizing {
            *state = ConnectionState::Ready;
            info!(session_id = %self.session_id, "Realtime relay ready");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
