//! Wire protocol types for the room sync channel.
//!
//! Both directions speak JSON envelopes discriminated by a `kind` field.
//! Envelopes are modeled as serde-tagged enums so the room store can fold
//! them with an exhaustive `match` — adding a kind without handling it is a
//! compile error, not a silently ignored string.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};

/// What a connection is allowed to do in its room. All-false until the
/// server's authorization envelope says otherwise.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    #[serde(default)]
    pub can_view: bool,
    #[serde(default)]
    pub can_control: bool,
    #[serde(default)]
    pub can_modify: bool,
    #[serde(default)]
    pub can_view_connections: bool,
}

/// Room descriptor carried on the authorization envelope.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub time_zone: String,
}

/// One active connection in the room roster.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub connection_id: String,
    #[serde(default)]
    pub label: Option<String>,
}

/// Direction a timer runs in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    #[default]
    Countdown,
    Countup,
}

/// Server-authoritative timer entity.
///
/// `actual_start_ms`, `accumulated_seconds`, and `paused_at_ms` form the
/// prediction baseline. They are only trustworthy on `timer_state`
/// envelopes; raw `timer_tick` pushes must never overwrite them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimerRecord {
    pub id: i64,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub mode: TimerMode,
    #[serde(default)]
    pub duration_seconds: f64,
    #[serde(default)]
    pub current_seconds: f64,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub finished: bool,
    #[serde(default)]
    pub overtime: bool,
    #[serde(default)]
    pub overtime_seconds: f64,
    #[serde(default)]
    pub sort_order: i64,
    #[serde(default)]
    pub actual_start_ms: Option<f64>,
    #[serde(default)]
    pub accumulated_seconds: f64,
    #[serde(default)]
    pub paused_at_ms: Option<f64>,
}

impl TimerRecord {
    /// Running means the server considers the timer live and not paused.
    pub fn is_running(&self) -> bool {
        self.active && !self.paused
    }
}

/// Inbound envelope: everything the server can push to a room connection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServerEnvelope {
    /// Authorization success. The first one completes the handshake; later
    /// ones refresh permissions and the snapshot in place.
    Authorized {
        connection_id: String,
        room: RoomInfo,
        permissions: Permissions,
        #[serde(default)]
        timers: Option<Vec<TimerRecord>>,
        #[serde(default)]
        selected_timer_id: Option<i64>,
        #[serde(default)]
        connection_count: Option<u32>,
    },
    /// Raw authoritative value push for one timer. Patches the last-known
    /// value and flags only — the prediction baseline is not refreshed.
    TimerTick {
        timer_id: i64,
        current_seconds: f64,
        #[serde(default)]
        active: bool,
        #[serde(default)]
        paused: bool,
        #[serde(default)]
        finished: bool,
        #[serde(default)]
        overtime: bool,
        #[serde(default)]
        overtime_seconds: f64,
    },
    /// State transition (start/pause/resume/stop): a full record with a
    /// fresh baseline. Hard resync point for prediction.
    TimerState { timer: TimerRecord },
    /// Selection change broadcast.
    TimerSelected {
        #[serde(default)]
        timer_id: Option<i64>,
    },
    /// Wholesale timer-list refresh.
    TimerList {
        timers: Vec<TimerRecord>,
        #[serde(default)]
        selected_timer_id: Option<i64>,
    },
    /// Roster and/or connection-count update.
    Roster {
        #[serde(default)]
        connections: Option<Vec<ConnectionRecord>>,
        connection_count: u32,
    },
    /// Server-initiated identification challenge; must be answered
    /// immediately, even before authorization.
    Identify { nonce: String },
    /// Liveness reply echoing the probe id from our `ping`.
    Pong { probe: u64 },
    /// Server-side error. Credential failures are distinguished by message
    /// content and are terminal for the session.
    Error {
        message: String,
        #[serde(default)]
        code: Option<String>,
    },
}

impl ServerEnvelope {
    /// Decode one inbound text frame. Callers drop failures with a logged
    /// warning; a malformed envelope never reaches the dispatcher.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn kind(&self) -> EnvelopeKind {
        match self {
            Self::Authorized { .. } => EnvelopeKind::Authorized,
            Self::TimerTick { .. } => EnvelopeKind::TimerTick,
            Self::TimerState { .. } => EnvelopeKind::TimerState,
            Self::TimerSelected { .. } => EnvelopeKind::TimerSelected,
            Self::TimerList { .. } => EnvelopeKind::TimerList,
            Self::Roster { .. } => EnvelopeKind::Roster,
            Self::Identify { .. } => EnvelopeKind::Identify,
            Self::Pong { .. } => EnvelopeKind::Pong,
            Self::Error { .. } => EnvelopeKind::Error,
        }
    }
}

/// Discriminant of [`ServerEnvelope`], used as the subscription key in the
/// event bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnvelopeKind {
    Authorized,
    TimerTick,
    TimerState,
    TimerSelected,
    TimerList,
    Roster,
    Identify,
    Pong,
    Error,
}

/// Outbound envelope: everything a client can send to the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClientEnvelope {
    TimerStart { timer_id: i64 },
    TimerPause { timer_id: i64 },
    TimerStop { timer_id: i64 },
    TimerSelect {
        #[serde(default)]
        timer_id: Option<i64>,
    },
    TimerListRequest {},
    RosterRequest {},
    /// Answer to an identification challenge. The only kind exempt from the
    /// authorization gate: the server may need it to finish authorizing us.
    /// `client_ref` is a client-generated id, stable for one connection, so
    /// the server can correlate reconnects.
    IdentifyReply { nonce: String, client_ref: String },
    /// Liveness probe; the server echoes `probe` back in a `pong`.
    Ping { probe: u64 },
}

impl ClientEnvelope {
    /// Whitelist of kinds that bypass the authorization gate.
    pub fn is_priority(&self) -> bool {
        matches!(self, Self::IdentifyReply { .. })
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
