//! Typed publish/subscribe registry for inbound envelopes.
//!
//! Consumers subscribe by [`EnvelopeKind`] or to the wildcard channel that
//! sees every envelope. The room store is NOT a subscriber — it folds
//! envelopes through an exhaustive `match` before the bus dispatches, so
//! coverage of new kinds is checked at compile time while ad-hoc consumers
//! stay decoupled here.
//!
//! Dispatch snapshots the handler list first: a subscriber that calls
//! `on`/`off`/`once` reentrantly cannot corrupt or block delivery to the
//! handlers registered after it.

#[cfg(test)]
#[path = "bus_test.rs"]
mod bus_test;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::net::types::{EnvelopeKind, ServerEnvelope};

pub type SubscriptionId = u64;

type Handler = Rc<dyn Fn(&ServerEnvelope)>;

struct Entry {
    id: SubscriptionId,
    once: bool,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    next_id: SubscriptionId,
    by_kind: HashMap<EnvelopeKind, Vec<Entry>>,
    wildcard: Vec<Entry>,
}

/// Single-threaded event bus. Shared by `Rc`; interior mutability keeps the
/// subscription API ergonomic from component callbacks.
#[derive(Default)]
pub struct EventBus {
    registry: RefCell<Registry>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to one envelope kind. Handlers for the same kind run in
    /// insertion order.
    pub fn on(&self, kind: EnvelopeKind, handler: impl Fn(&ServerEnvelope) + 'static) -> SubscriptionId {
        self.insert(Some(kind), false, Rc::new(handler))
    }

    /// Subscribe to one envelope kind for a single delivery.
    pub fn once(&self, kind: EnvelopeKind, handler: impl Fn(&ServerEnvelope) + 'static) -> SubscriptionId {
        self.insert(Some(kind), true, Rc::new(handler))
    }

    /// Subscribe to every envelope, dispatched after the kind-specific
    /// handlers.
    pub fn on_any(&self, handler: impl Fn(&ServerEnvelope) + 'static) -> SubscriptionId {
        self.insert(None, false, Rc::new(handler))
    }

    /// Remove a kind subscription. Returns whether anything was removed.
    pub fn off(&self, kind: EnvelopeKind, id: SubscriptionId) -> bool {
        let mut registry = self.registry.borrow_mut();
        if let Some(entries) = registry.by_kind.get_mut(&kind) {
            let before = entries.len();
            entries.retain(|e| e.id != id);
            return entries.len() != before;
        }
        false
    }

    /// Remove a wildcard subscription. Returns whether anything was removed.
    pub fn off_any(&self, id: SubscriptionId) -> bool {
        let mut registry = self.registry.borrow_mut();
        let before = registry.wildcard.len();
        registry.wildcard.retain(|e| e.id != id);
        registry.wildcard.len() != before
    }

    /// Deliver one envelope: kind-specific handlers first (insertion
    /// order), then wildcard handlers. `once` subscriptions are removed
    /// before invocation.
    pub fn dispatch(&self, envelope: &ServerEnvelope) {
        let kind = envelope.kind();
        let kind_handlers: Vec<Handler> = {
            let mut registry = self.registry.borrow_mut();
            match registry.by_kind.get_mut(&kind) {
                Some(entries) => {
                    let snapshot = entries.iter().map(|e| Rc::clone(&e.handler)).collect();
                    entries.retain(|e| !e.once);
                    snapshot
                }
                None => Vec::new(),
            }
        };
        for handler in kind_handlers {
            handler(envelope);
        }

        let wildcard_handlers: Vec<Handler> = self
            .registry
            .borrow()
            .wildcard
            .iter()
            .map(|e| Rc::clone(&e.handler))
            .collect();
        for handler in wildcard_handlers {
            handler(envelope);
        }
    }

    fn insert(&self, kind: Option<EnvelopeKind>, once: bool, handler: Handler) -> SubscriptionId {
        let mut registry = self.registry.borrow_mut();
        registry.next_id += 1;
        let id = registry.next_id;
        let entry = Entry { id, once, handler };
        match kind {
            Some(kind) => registry.by_kind.entry(kind).or_default().push(entry),
            None => registry.wildcard.push(entry),
        }
        id
    }
}
