//! WebSocket connection driver for a room sync session.
//!
//! Owns the socket lifecycle: dial, handshake, inbound dispatch, keepalive,
//! and reconnection with capped exponential backoff. The connect future
//! resolves on the server's first authorization envelope — never on mere
//! physical open — and a pre-authorization failure rejects it instead of
//! retrying, so the caller stays in charge of the first dial.
//!
//! All socket logic is gated behind `#[cfg(feature = "hydrate")]` since it
//! requires a browser environment; URL construction and denial detection
//! are pure and tested natively.

#[cfg(test)]
#[path = "socket_test.rs"]
mod socket_test;

#[cfg(feature = "hydrate")]
use std::cell::{Cell, RefCell};
#[cfg(feature = "hydrate")]
use std::rc::Rc;

#[cfg(feature = "hydrate")]
use crate::config::SyncConfig;
#[cfg(feature = "hydrate")]
use crate::net::types::{ClientEnvelope, ServerEnvelope};
#[cfg(feature = "hydrate")]
use crate::session::bus::EventBus;
#[cfg(feature = "hydrate")]
use crate::session::gate::{SendGate, Submission};
#[cfg(feature = "hydrate")]
use crate::session::keepalive::ProbeTracker;
#[cfg(feature = "hydrate")]
use crate::session::backoff::ReconnectPolicy;
#[cfg(feature = "hydrate")]
use crate::session::{ConnectError, SessionSignals};
#[cfg(feature = "hydrate")]
use crate::state::connection::ConnectionState;
#[cfg(feature = "hydrate")]
use crate::state::notice::NoticeLevel;
#[cfg(feature = "hydrate")]
use crate::state::room::RoomSnapshot;
#[cfg(feature = "hydrate")]
use futures::channel::{mpsc, oneshot};
#[cfg(feature = "hydrate")]
use leptos::prelude::Update;

/// How to authenticate the room channel at connect time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credentials {
    /// Bearer-style user token.
    Bearer { token: String },
    /// Room-scoped share token, optionally password-protected.
    Share { token: String, password: Option<String> },
}

/// Everything needed to dial one room.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectOptions {
    pub room_id: String,
    pub credentials: Credentials,
}

/// Room-scoped sync endpoint path.
pub fn session_path(room_id: &str) -> String {
    format!("/api/rooms/{room_id}/sync")
}

/// Credentials encoded as connection-time query parameters.
pub fn session_query(credentials: &Credentials) -> String {
    match credentials {
        Credentials::Bearer { token } => {
            format!("access_token={}", encode_query_value(token))
        }
        Credentials::Share { token, password } => {
            let mut query = format!("share_token={}", encode_query_value(token));
            if let Some(password) = password {
                query.push_str("&password=");
                query.push_str(&encode_query_value(password));
            }
            query
        }
    }
}

/// Full WebSocket URL for a session, given an origin like `wss://host`.
pub fn session_url(origin: &str, options: &ConnectOptions) -> String {
    format!(
        "{origin}{}?{}",
        session_path(&options.room_id),
        session_query(&options.credentials)
    )
}

/// Percent-encode a query value. Unreserved characters pass through.
pub fn encode_query_value(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(char::from(byte));
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Whether a server error envelope is a credential rejection. The server
/// does not use a dedicated kind for these, so content decides. A denial
/// is terminal: reconnecting with the same stale credentials is pointless.
pub fn is_credential_denial(message: &str, code: Option<&str>) -> bool {
    if matches!(code, Some("unauthorized" | "invalid_credentials" | "bad_password")) {
        return true;
    }
    let lowered = message.to_lowercase();
    ["denied", "unauthorized", "invalid token", "invalid password", "wrong password", "credentials"]
        .iter()
        .any(|needle| lowered.contains(needle))
}

/// Messages accepted by the send task.
#[cfg(feature = "hydrate")]
pub(crate) enum Outbound {
    /// JSON text frame to put on the wire.
    Payload(String),
    /// Close the socket with a normal closure and end the session loop.
    Close,
}

/// Why a connection ended.
#[cfg(feature = "hydrate")]
enum CloseReason {
    /// Explicit `disconnect()`; no reconnection follows.
    Local,
    /// Credential rejection; terminal.
    Denied,
    /// Anything else: server close, network drop.
    Remote,
}

/// State shared between the driver loop and the command surface.
#[cfg(feature = "hydrate")]
pub(crate) struct EngineShared {
    pub gate: RefCell<SendGate>,
    pub probes: RefCell<ProbeTracker>,
    pub policy: RefCell<ReconnectPolicy>,
    /// Explicit disconnect requested; the loop must not redial.
    pub closed: Cell<bool>,
    denied: Cell<bool>,
    /// Client-generated id sent with identify replies so the server can
    /// correlate reconnects of the same client.
    client_ref: String,
}

#[cfg(feature = "hydrate")]
impl EngineShared {
    pub(crate) fn new(config: &SyncConfig) -> Self {
        Self {
            gate: RefCell::new(SendGate::new()),
            probes: RefCell::new(ProbeTracker::new()),
            policy: RefCell::new(ReconnectPolicy::new(
                config.reconnect_base_ms,
                config.reconnect_cap_ms,
                config.reconnect_max_attempts,
            )),
            closed: Cell::new(false),
            denied: Cell::new(false),
            client_ref: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// Serialize and hand an envelope to the send task.
#[cfg(feature = "hydrate")]
pub(crate) fn send_envelope(tx: &mpsc::UnboundedSender<Outbound>, envelope: &ClientEnvelope) {
    match envelope.encode() {
        Ok(json) => {
            if tx.unbounded_send(Outbound::Payload(json)).is_err() {
                leptos::logging::warn!("ws: dropping outbound envelope, session loop is gone");
            }
        }
        Err(e) => leptos::logging::warn!("ws: failed to encode outbound envelope: {e}"),
    }
}

/// Spawn the connection driver as a local task. Returns the outbound
/// channel and a receiver that resolves with the handshake outcome.
#[cfg(feature = "hydrate")]
pub(crate) fn spawn_room_client(
    signals: SessionSignals,
    bus: Rc<EventBus>,
    shared: Rc<EngineShared>,
    config: SyncConfig,
    options: ConnectOptions,
) -> (mpsc::UnboundedSender<Outbound>, oneshot::Receiver<Result<(), ConnectError>>) {
    let (tx, rx) = mpsc::unbounded::<Outbound>();
    let (ready_tx, ready_rx) = oneshot::channel();

    leptos::task::spawn_local(room_client_loop(
        signals,
        bus,
        shared,
        config,
        options,
        tx.clone(),
        rx,
        ready_tx,
    ));

    (tx, ready_rx)
}

/// Origin for the sync endpoint, derived from the page location.
#[cfg(feature = "hydrate")]
fn websocket_origin() -> String {
    let Some(window) = web_sys::window() else {
        return "ws://localhost:3000".to_owned();
    };
    let location = window.location();
    let proto = match location.protocol() {
        Ok(p) if p == "https:" => "wss",
        _ => "ws",
    };
    let host = match location.host() {
        Ok(h) if !h.is_empty() => h,
        _ => "localhost:3000".to_owned(),
    };
    format!("{proto}://{host}")
}

/// Main connection loop with reconnect logic.
#[cfg(feature = "hydrate")]
#[allow(clippy::too_many_arguments)]
async fn room_client_loop(
    signals: SessionSignals,
    bus: Rc<EventBus>,
    shared: Rc<EngineShared>,
    config: SyncConfig,
    options: ConnectOptions,
    tx: mpsc::UnboundedSender<Outbound>,
    rx: mpsc::UnboundedReceiver<Outbound>,
    ready: oneshot::Sender<Result<(), ConnectError>>,
) {
    let rx = Rc::new(RefCell::new(rx));
    let mut ready = Some(ready);
    let url = session_url(&websocket_origin(), &options);

    loop {
        if shared.closed.get() {
            break;
        }
        let attempt = shared.policy.borrow().attempt();
        signals.connection.update(|c| c.mark_connecting(attempt));

        let outcome =
            connect_and_run(&url, signals, &bus, &shared, &config, &tx, &rx, &mut ready).await;

        // Whatever happened, the session is untrusted again and the
        // snapshot is stale; consumers tolerate it being empty.
        shared.gate.borrow_mut().transport_closed();
        signals.room.update(RoomSnapshot::clear);

        let failure = match outcome {
            Ok(CloseReason::Local | CloseReason::Denied) => break,
            Ok(CloseReason::Remote) => None,
            Err(message) => Some(message),
        };
        if let Some(message) = &failure {
            leptos::logging::warn!("ws: connection error: {message}");
        }

        // A failure before the first authorization rejects the connect
        // future; the caller decides whether to retry.
        if let Some(resolver) = ready.take() {
            signals.connection.update(|c| c.mark_dropped(false));
            let message =
                failure.unwrap_or_else(|| "connection closed before authorization".to_owned());
            if resolver.send(Err(ConnectError::Transport(message))).is_err() {
                leptos::logging::warn!("ws: connect caller dropped before failure was reported");
            }
            break;
        }

        // Authorized at least once: reconnect silently per policy. The
        // borrow must not be held across the sleep — disconnect() can take
        // the policy mid-backoff.
        let delay = shared.policy.borrow_mut().next_delay();
        match delay {
            Some(delay) => {
                signals.connection.update(|c| c.mark_dropped(true));
                gloo_timers::future::sleep(delay).await;
            }
            None => {
                signals.connection.update(|c| c.mark_dropped(false));
                if shared.policy.borrow().is_enabled() {
                    signals.notices.update(|n| {
                        n.push(NoticeLevel::Warn, "Connection lost and retries are exhausted.");
                    });
                }
                break;
            }
        }
    }
}

/// Connect once and run the send/receive/keepalive tasks to completion.
#[cfg(feature = "hydrate")]
#[allow(clippy::too_many_arguments)]
async fn connect_and_run(
    url: &str,
    signals: SessionSignals,
    bus: &Rc<EventBus>,
    shared: &Rc<EngineShared>,
    config: &SyncConfig,
    tx: &mpsc::UnboundedSender<Outbound>,
    rx: &Rc<RefCell<mpsc::UnboundedReceiver<Outbound>>>,
    ready: &mut Option<oneshot::Sender<Result<(), ConnectError>>>,
) -> Result<CloseReason, String> {
    use futures::{SinkExt, StreamExt};
    use gloo_net::websocket::Message;
    use gloo_net::websocket::futures::WebSocket;

    let ws = WebSocket::open(url).map_err(|e| e.to_string())?;
    let (mut ws_write, mut ws_read) = ws.split();

    // Physically open but untrusted: only priority envelopes may pass
    // until the authorization envelope arrives.
    shared.gate.borrow_mut().transport_opened();

    let locally_closed = Rc::new(Cell::new(false));

    // Forward outgoing messages from the session channel to the socket.
    let mut rx_borrow = rx.borrow_mut();
    let closed_flag = Rc::clone(&locally_closed);
    let send_task = async move {
        while let Some(outbound) = rx_borrow.next().await {
            match outbound {
                Outbound::Payload(text) => {
                    if ws_write.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Outbound::Close => {
                    closed_flag.set(true);
                    if ws_write.close().await.is_err() {
                        leptos::logging::log!("ws: socket already gone on close");
                    }
                    break;
                }
            }
        }
    };

    // Process incoming frames strictly in arrival order.
    let recv_task = async {
        while let Some(msg) = ws_read.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    handle_inbound(&text, signals, bus, shared, tx, ready);
                    if shared.denied.get() {
                        break;
                    }
                }
                Ok(Message::Bytes(_)) => {}
                Err(e) => {
                    leptos::logging::warn!("ws: recv error: {e}");
                    break;
                }
            }
        }
    };

    // Liveness probes, only while authorized. Latency is observability
    // only; replies never touch the reconnection state machine.
    let keepalive_task = async {
        gloo_timers::future::sleep(std::time::Duration::from_millis(
            config.keepalive_initial_delay_ms,
        ))
        .await;
        loop {
            if shared.gate.borrow().is_authorized() {
                let probe = shared.probes.borrow_mut().begin(js_sys::Date::now());
                send_envelope(tx, &ClientEnvelope::Ping { probe });
            }
            gloo_timers::future::sleep(std::time::Duration::from_millis(
                config.keepalive_interval_ms,
            ))
            .await;
        }
    };

    // The keepalive loop never finishes; the connection is done when the
    // send or receive side does.
    futures::future::select(
        Box::pin(futures::future::select(Box::pin(send_task), Box::pin(recv_task))),
        Box::pin(keepalive_task),
    )
    .await;

    if locally_closed.get() || shared.closed.get() {
        return Ok(CloseReason::Local);
    }
    if shared.denied.get() {
        return Ok(CloseReason::Denied);
    }
    Ok(CloseReason::Remote)
}

/// Decode and process one inbound frame: handshake bookkeeping, then the
/// store fold, then bus dispatch.
#[cfg(feature = "hydrate")]
fn handle_inbound(
    text: &str,
    signals: SessionSignals,
    bus: &Rc<EventBus>,
    shared: &Rc<EngineShared>,
    tx: &mpsc::UnboundedSender<Outbound>,
    ready: &mut Option<oneshot::Sender<Result<(), ConnectError>>>,
) {
    let envelope = match ServerEnvelope::decode(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            leptos::logging::warn!("ws: dropping malformed envelope: {e}");
            return;
        }
    };

    match &envelope {
        ServerEnvelope::Authorized { connection_id, permissions, .. } => {
            // Authorization: open the gate, flush the queue in submission
            // order, and resolve the connect future exactly once. A repeat
            // authorization just refreshes permissions and the snapshot.
            let flushed = shared.gate.borrow_mut().authorize();
            shared.policy.borrow_mut().reset();
            signals
                .connection
                .update(|c| c.mark_authorized(connection_id.clone(), permissions.clone()));
            for queued in flushed {
                send_envelope(tx, &queued);
            }
            if let Some(resolver) = ready.take() {
                if resolver.send(Ok(())).is_err() {
                    leptos::logging::warn!("ws: connect caller dropped before authorization");
                }
            }
        }
        ServerEnvelope::Identify { nonce } => {
            // Must be answered immediately; the server may need it to
            // complete authorization, hence the priority path.
            let reply = ClientEnvelope::IdentifyReply {
                nonce: nonce.clone(),
                client_ref: shared.client_ref.clone(),
            };
            match shared.gate.borrow_mut().submit(reply) {
                Submission::Deliver(envelope) => send_envelope(tx, &envelope),
                Submission::Queued | Submission::Dropped => {}
            }
        }
        ServerEnvelope::Pong { probe } => {
            if let Some(rtt) = shared.probes.borrow_mut().complete(*probe, js_sys::Date::now()) {
                signals.connection.update(|c| c.latency_ms = Some(rtt));
            }
        }
        ServerEnvelope::Error { message, code } => {
            if is_credential_denial(message, code.as_deref()) {
                shared.denied.set(true);
                shared.policy.borrow_mut().disable();
                signals.connection.update(ConnectionState::mark_denied);
                if let Some(resolver) = ready.take() {
                    if resolver.send(Err(ConnectError::Denied(message.clone()))).is_err() {
                        leptos::logging::warn!("ws: connect caller dropped before denial was reported");
                    }
                }
            } else {
                leptos::logging::warn!("ws: server error: {message}");
            }
        }
        ServerEnvelope::TimerTick { .. }
        | ServerEnvelope::TimerState { .. }
        | ServerEnvelope::TimerSelected { .. }
        | ServerEnvelope::TimerList { .. }
        | ServerEnvelope::Roster { .. } => {}
    }

    signals.room.update(|room| room.apply(&envelope));
    bus.dispatch(&envelope);
}
