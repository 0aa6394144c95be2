//! # cuesync
//!
//! Real-time synchronization engine for shared room timers: browser clients
//! observe and control countdown/count-up timers owned by a server, with
//! sub-second visual smoothness between periodic authoritative updates.
//!
//! The engine owns the WebSocket lifecycle (handshake, authorization-gated
//! command queue, keepalive, capped-backoff reconnection), folds inbound
//! envelopes into a reactive room snapshot, and interpolates running timers
//! locally so displays never stutter on network-paced ticks. Presentation
//! beyond the status/notice boundary components is the embedder's job.
//!
//! Browser plumbing is gated behind the `hydrate` feature; protocol, state,
//! and prediction logic compile natively and are tested natively.

pub mod clock;
pub mod components;
pub mod config;
pub mod net;
pub mod session;
pub mod state;

/// Route engine logs to the browser console and install the panic hook.
/// Call once during hydration, before the first `connect()`.
#[cfg(feature = "hydrate")]
pub fn init_browser_logging() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        leptos::logging::warn!("browser logging was already initialized");
    }
}
