//! Session layer: the owned connection session, its command surface, and
//! the supporting gate/backoff/keepalive/bus machinery.
//!
//! DESIGN
//! ======
//! There is no module-level singleton. A [`RoomSession`] explicitly owns at
//! most one live connection per room subscription and hands consumers an
//! immutable reactive snapshot ([`SessionSignals`]) plus a command surface
//! ([`RoomController`]). Dialing again tears the previous connection down
//! first, so two sessions can never race on the same snapshot.

pub mod backoff;
pub mod bus;
pub mod gate;
pub mod keepalive;

#[cfg(feature = "hydrate")]
use std::cell::RefCell;
#[cfg(feature = "hydrate")]
use std::rc::Rc;

use leptos::prelude::{RwSignal, provide_context};
use thiserror::Error;

use crate::clock::PredictedValues;
use crate::state::connection::ConnectionState;
use crate::state::notice::NoticeState;
use crate::state::room::RoomSnapshot;

#[cfg(feature = "hydrate")]
use crate::config::SyncConfig;
#[cfg(feature = "hydrate")]
use crate::net::socket::{
    ConnectOptions, EngineShared, Outbound, send_envelope, spawn_room_client,
};
#[cfg(feature = "hydrate")]
use crate::net::types::ClientEnvelope;
#[cfg(feature = "hydrate")]
use crate::session::bus::EventBus;
#[cfg(feature = "hydrate")]
use crate::session::gate::Submission;
#[cfg(feature = "hydrate")]
use crate::state::actions::{self, TimerAction};
#[cfg(feature = "hydrate")]
use crate::state::notice::NoticeLevel;
#[cfg(feature = "hydrate")]
use futures::channel::mpsc;
#[cfg(feature = "hydrate")]
use leptos::prelude::{GetUntracked, Update};

/// The reactive handles consumers read. `RwSignal` is `Copy`, so this is a
/// cheap value to pass into components and tasks; the engine is the only
/// writer.
#[derive(Clone, Copy)]
pub struct SessionSignals {
    pub connection: RwSignal<ConnectionState>,
    pub room: RwSignal<RoomSnapshot>,
    pub notices: RwSignal<NoticeState>,
    pub predictions: RwSignal<PredictedValues>,
}

impl SessionSignals {
    pub fn new() -> Self {
        Self {
            connection: RwSignal::new(ConnectionState::default()),
            room: RwSignal::new(RoomSnapshot::default()),
            notices: RwSignal::new(NoticeState::default()),
            predictions: RwSignal::new(PredictedValues::default()),
        }
    }

    /// Make the handles available to child components via context.
    pub fn provide(self) {
        provide_context(self);
    }
}

impl Default for SessionSignals {
    fn default() -> Self {
        Self::new()
    }
}

/// Why `connect()` failed.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Transport failure before authorization completed. The caller
    /// decides whether to retry; failures after authorization are handled
    /// internally by the reconnection policy instead.
    #[error("transport failure before authorization: {0}")]
    Transport(String),
    /// The server rejected the supplied credentials. Terminal: retrying
    /// with the same credentials is pointless.
    #[error("authorization denied: {0}")]
    Denied(String),
}

/// Command surface for one live connection. Cheap to clone; all clones
/// drive the same underlying session.
#[cfg(feature = "hydrate")]
#[derive(Clone)]
pub struct RoomController {
    signals: SessionSignals,
    shared: Rc<EngineShared>,
    tx: mpsc::UnboundedSender<Outbound>,
}

#[cfg(feature = "hydrate")]
impl RoomController {
    /// Route an envelope through the authorization gate. Never fails from
    /// the caller's perspective: delivery is immediate, deferred until
    /// authorization, or (for priority envelopes on a closed transport)
    /// dropped best-effort.
    pub fn send(&self, envelope: ClientEnvelope) {
        match self.shared.gate.borrow_mut().submit(envelope) {
            Submission::Deliver(envelope) => send_envelope(&self.tx, &envelope),
            Submission::Queued => {}
            Submission::Dropped => {
                leptos::logging::warn!("sync: dropped priority envelope, transport closed");
            }
        }
    }

    pub fn start_timer(&self, timer_id: i64) {
        self.gated(TimerAction::Start, ClientEnvelope::TimerStart { timer_id });
    }

    pub fn pause_timer(&self, timer_id: i64) {
        self.gated(TimerAction::Pause, ClientEnvelope::TimerPause { timer_id });
    }

    pub fn stop_timer(&self, timer_id: i64) {
        self.gated(TimerAction::Stop, ClientEnvelope::TimerStop { timer_id });
    }

    pub fn select_timer(&self, timer_id: Option<i64>) {
        self.gated(TimerAction::Select, ClientEnvelope::TimerSelect { timer_id });
    }

    pub fn request_timer_list(&self) {
        self.gated(TimerAction::RequestList, ClientEnvelope::TimerListRequest {});
    }

    pub fn request_roster(&self) {
        self.gated(TimerAction::RequestRoster, ClientEnvelope::RosterRequest {});
    }

    /// Explicit disconnect: closes with a normal closure, disables
    /// reconnection, discards queued commands, and clears local state
    /// synchronously. Idempotent.
    pub fn disconnect(&self) {
        if self.shared.closed.replace(true) {
            return;
        }
        self.shared.policy.borrow_mut().disable();
        self.shared.gate.borrow_mut().discard();
        if self.tx.unbounded_send(Outbound::Close).is_err() {
            leptos::logging::log!("sync: session loop already ended");
        }
        self.signals.connection.update(ConnectionState::mark_disconnected);
        self.signals.room.update(RoomSnapshot::clear);
        self.signals.predictions.update(|p| p.clear());
    }

    /// Check permissions before constructing the envelope; a denied action
    /// never reaches the transport and surfaces exactly one notice.
    fn gated(&self, action: TimerAction, envelope: ClientEnvelope) {
        let permissions = self.signals.connection.get_untracked().permissions;
        match actions::check(&permissions, action) {
            Ok(()) => self.send(envelope),
            Err(message) => {
                self.signals.notices.update(|n| {
                    n.push(NoticeLevel::Warn, message);
                });
            }
        }
    }
}

/// Owned session for one room subscription.
#[cfg(feature = "hydrate")]
pub struct RoomSession {
    signals: SessionSignals,
    bus: Rc<EventBus>,
    config: SyncConfig,
    active: RefCell<Option<RoomController>>,
}

#[cfg(feature = "hydrate")]
impl RoomSession {
    pub fn new(config: SyncConfig) -> Self {
        let signals = SessionSignals::new();
        crate::clock::spawn_prediction_loop(
            signals.room,
            signals.predictions,
            config.prediction_interval_ms,
        );
        Self { signals, bus: Rc::new(EventBus::new()), config, active: RefCell::new(None) }
    }

    pub fn signals(&self) -> SessionSignals {
        self.signals
    }

    pub fn bus(&self) -> Rc<EventBus> {
        Rc::clone(&self.bus)
    }

    /// Make the reactive handles available to child components.
    pub fn provide_contexts(&self) {
        self.signals.provide();
    }

    /// Dial a room. Any existing connection is torn down first, so exactly
    /// one session ever mutates the snapshot. Resolves only once the
    /// server's authorization envelope arrives.
    ///
    /// # Errors
    ///
    /// `Transport` for pre-authorization failures, `Denied` when the
    /// credentials are rejected.
    pub async fn connect(&self, options: ConnectOptions) -> Result<RoomController, ConnectError> {
        if let Some(previous) = self.active.borrow_mut().take() {
            previous.disconnect();
        }
        self.signals.connection.update(|c| *c = ConnectionState::default());
        self.signals.room.update(RoomSnapshot::clear);

        let shared = Rc::new(EngineShared::new(&self.config));
        let (tx, ready) = spawn_room_client(
            self.signals,
            Rc::clone(&self.bus),
            Rc::clone(&shared),
            self.config.clone(),
            options,
        );
        let controller = RoomController { signals: self.signals, shared, tx };
        *self.active.borrow_mut() = Some(controller.clone());

        match ready.await {
            Ok(Ok(())) => Ok(controller),
            Ok(Err(e)) => {
                self.active.borrow_mut().take();
                Err(e)
            }
            Err(_cancelled) => {
                self.active.borrow_mut().take();
                Err(ConnectError::Transport("session loop ended before authorization".to_owned()))
            }
        }
    }

    pub fn controller(&self) -> Option<RoomController> {
        self.active.borrow().clone()
    }

    /// Idempotent; safe with no live connection.
    pub fn disconnect(&self) {
        if let Some(controller) = self.active.borrow_mut().take() {
            controller.disconnect();
        }
    }
}
