#[cfg(test)]
#[path = "connection_test.rs"]
mod connection_test;

use crate::net::types::Permissions;

/// Sync channel status, surfaced through the persistent status indicator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    /// Unexpected close; retries are being scheduled.
    Reconnecting,
    Connected,
    /// Credentials were rejected. Terminal — never auto-retried.
    Denied,
}

/// Session-scoped connection state.
///
/// Invariant: `connection_id` is `Some` exactly while `status` is
/// `Connected`, and permissions are all-false otherwise. Every transition
/// below maintains this.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConnectionState {
    pub status: ConnectionStatus,
    pub connection_id: Option<String>,
    pub permissions: Permissions,
    /// Round-trip latency from the last liveness probe, for observability.
    pub latency_ms: Option<f64>,
    pub reconnect_attempt: u32,
}

impl ConnectionState {
    pub fn is_authorized(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    /// A dial is starting: attempt 0 is the initial connect, anything above
    /// is a scheduled retry.
    pub fn mark_connecting(&mut self, attempt: u32) {
        self.status = if attempt == 0 {
            ConnectionStatus::Connecting
        } else {
            ConnectionStatus::Reconnecting
        };
        self.reconnect_attempt = attempt;
        self.connection_id = None;
        self.permissions = Permissions::default();
    }

    /// Authorization envelope accepted. Re-authorization on an already
    /// connected session just refreshes the id and permissions.
    pub fn mark_authorized(&mut self, connection_id: String, permissions: Permissions) {
        self.status = ConnectionStatus::Connected;
        self.connection_id = Some(connection_id);
        self.permissions = permissions;
        self.reconnect_attempt = 0;
    }

    /// Transport dropped out from under us. `will_retry` distinguishes the
    /// silent-reconnect path from retry exhaustion.
    pub fn mark_dropped(&mut self, will_retry: bool) {
        self.status = if will_retry {
            ConnectionStatus::Reconnecting
        } else {
            ConnectionStatus::Disconnected
        };
        self.connection_id = None;
        self.permissions = Permissions::default();
        self.latency_ms = None;
    }

    /// Credentials rejected: terminal state requiring new credentials.
    pub fn mark_denied(&mut self) {
        self.status = ConnectionStatus::Denied;
        self.connection_id = None;
        self.permissions = Permissions::default();
        self.latency_ms = None;
    }

    /// Explicit user-initiated disconnect.
    pub fn mark_disconnected(&mut self) {
        self.status = ConnectionStatus::Disconnected;
        self.connection_id = None;
        self.permissions = Permissions::default();
        self.latency_ms = None;
        self.reconnect_attempt = 0;
    }
}
