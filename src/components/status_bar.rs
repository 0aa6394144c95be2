//! Persistent connection status indicator.

use leptos::prelude::*;

use crate::session::SessionSignals;
use crate::state::connection::ConnectionStatus;

/// Non-blocking status bar: connection dot, label, and the latest probe
/// round-trip. Authorization denial renders as a terminal state asking for
/// new credentials rather than a retry spinner.
#[component]
pub fn StatusBar() -> impl IntoView {
    let signals = expect_context::<SessionSignals>();

    let status_class = move || {
        match signals.connection.get().status {
            ConnectionStatus::Connected => "status-bar__dot status-bar__dot--connected",
            ConnectionStatus::Connecting | ConnectionStatus::Reconnecting => {
                "status-bar__dot status-bar__dot--connecting"
            }
            ConnectionStatus::Disconnected | ConnectionStatus::Denied => {
                "status-bar__dot status-bar__dot--disconnected"
            }
        }
    };

    let status_label = move || {
        let state = signals.connection.get();
        match state.status {
            ConnectionStatus::Connected => "Connected".to_owned(),
            ConnectionStatus::Connecting => "Connecting...".to_owned(),
            ConnectionStatus::Reconnecting => {
                format!("Reconnecting (attempt {})...", state.reconnect_attempt)
            }
            ConnectionStatus::Disconnected => "Disconnected".to_owned(),
            ConnectionStatus::Denied => "Access denied - new credentials required".to_owned(),
        }
    };

    let latency = move || {
        signals
            .connection
            .get()
            .latency_ms
            .map(|ms| format!("{} ms", ms.round()))
            .unwrap_or_default()
    };

    let room_name = move || {
        signals
            .room
            .get()
            .room
            .map(|r| r.name)
            .unwrap_or_default()
    };

    view! {
        <div class="status-bar">
            <span class="status-bar__connection">
                <span class=status_class></span>
                {status_label}
            </span>
            <span class="status-bar__divider">"|"</span>
            <span class="status-bar__room-name">{room_name}</span>
            <span class="status-bar__spacer"></span>
            <span class="status-bar__latency">{latency}</span>
        </div>
    }
}
