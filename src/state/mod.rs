//! Shared client-side state modules.
//!
//! DESIGN
//! ======
//! State is split by domain (`connection`, `room`, `notice`) so individual
//! consumers can depend on small focused models. Everything here is a plain
//! struct with pure fold methods; reactive `RwSignal` wrappers are owned by
//! the session layer.

pub mod actions;
pub mod connection;
pub mod notice;
pub mod room;
