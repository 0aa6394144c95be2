//! Authorization gate for outbound commands.
//!
//! The "waiting for authorization" state is a first-class value: the gate
//! tracks whether the transport is physically open and whether the session
//! is authorized, and buffers non-priority envelopes until both hold.
//! `send()` therefore always succeeds from the caller's perspective —
//! delivery is deferred, never refused.

#[cfg(test)]
#[path = "gate_test.rs"]
mod gate_test;

use crate::net::types::ClientEnvelope;

/// What the gate decided to do with a submitted envelope.
#[derive(Debug, PartialEq)]
pub enum Submission {
    /// Send on the transport now.
    Deliver(ClientEnvelope),
    /// Buffered until authorization; flushed FIFO by [`SendGate::authorize`].
    Queued,
    /// Priority envelope with no open transport: best-effort, dropped.
    Dropped,
}

/// Two-state send gate with a FIFO buffer for pre-authorization commands.
#[derive(Debug, Default)]
pub struct SendGate {
    transport_open: bool,
    authorized: bool,
    queue: Vec<ClientEnvelope>,
}

impl SendGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authorized(&self) -> bool {
        self.authorized
    }

    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    /// Physical open: the session is "open but untrusted". Only priority
    /// envelopes may pass until [`SendGate::authorize`].
    pub fn transport_opened(&mut self) {
        self.transport_open = true;
    }

    /// Physical close. The buffer survives so commands queued during a
    /// reconnect window flush once the next authorization lands.
    pub fn transport_closed(&mut self) {
        self.transport_open = false;
        self.authorized = false;
    }

    /// Route one outbound envelope through the gate.
    pub fn submit(&mut self, envelope: ClientEnvelope) -> Submission {
        if self.authorized && self.transport_open {
            return Submission::Deliver(envelope);
        }
        if envelope.is_priority() {
            // Exempt from the authorization gate; the server may need it to
            // complete authorization itself.
            if self.transport_open {
                return Submission::Deliver(envelope);
            }
            return Submission::Dropped;
        }
        self.queue.push(envelope);
        Submission::Queued
    }

    /// Transition to authorized, draining the buffer in submission order.
    pub fn authorize(&mut self) -> Vec<ClientEnvelope> {
        self.authorized = true;
        std::mem::take(&mut self.queue)
    }

    /// Explicit disconnect: queued commands are not resumed across sessions.
    pub fn discard(&mut self) {
        self.transport_open = false;
        self.authorized = false;
        self.queue.clear();
    }
}
