//! Dismissable notice feed for permission denials and connection events.

use leptos::prelude::*;

use crate::session::SessionSignals;
use crate::state::notice::NoticeLevel;

/// Renders the notice feed; each notice carries its own dismiss control.
#[component]
pub fn NoticeList() -> impl IntoView {
    let signals = expect_context::<SessionSignals>();

    view! {
        <div class="notice-list">
            {move || {
                signals
                    .notices
                    .get()
                    .notices
                    .iter()
                    .map(|notice| {
                        let id = notice.id;
                        let message = notice.message.clone();
                        let class = match notice.level {
                            NoticeLevel::Info => "notice notice--info",
                            NoticeLevel::Warn => "notice notice--warn",
                        };
                        view! {
                            <div class=class>
                                <span class="notice__message">{message}</span>
                                <button
                                    class="notice__dismiss"
                                    on:click=move |_| {
                                        signals.notices.update(|n| n.dismiss(id));
                                    }
                                >
                                    "Dismiss"
                                </button>
                            </div>
                        }
                    })
                    .collect::<Vec<_>>()
            }}
        </div>
    }
}
