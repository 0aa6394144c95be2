//! Clock prediction: a continuously advancing display value for running
//! timers, interpolated between authoritative server pushes.
//!
//! The math is pure over a [`TimerRecord`]'s baseline so it can be sampled
//! at any instant. The hydrate-side loop recomputes the shared prediction
//! signal at a fixed cadence; raw ticks arriving in between are deliberately
//! not used to re-snap the value — irregular network spacing would read as
//! visible jitter. A `timer_state` transition replaces the record (and so
//! the baseline), which is the hard resync point.

#[cfg(test)]
#[path = "clock_test.rs"]
mod clock_test;

use std::collections::HashMap;

use crate::net::types::{TimerMode, TimerRecord};

/// What consumers render for one timer.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DisplayValue {
    /// Seconds to show. Already sign-flipped for countdown overtime.
    pub seconds: f64,
    /// A countdown has passed zero and is counting up into overtime.
    pub overtime: bool,
}

/// Predicted values keyed by timer id, refreshed at the prediction cadence.
pub type PredictedValues = HashMap<i64, DisplayValue>;

/// Raw predicted seconds for a timer at `now_ms` (epoch milliseconds).
///
/// Running: `elapsed = accumulated + (now - actual_start)`, countdown
/// predicts `duration - elapsed`, countup predicts `elapsed`. Paused,
/// stopped, or finished timers read the last authoritative value, frozen.
pub fn predicted_seconds(timer: &TimerRecord, now_ms: f64) -> f64 {
    if timer.is_running() {
        if let Some(start_ms) = timer.actual_start_ms {
            let elapsed = timer.accumulated_seconds + (now_ms - start_ms) / 1000.0;
            return match timer.mode {
                TimerMode::Countdown => timer.duration_seconds - elapsed,
                TimerMode::Countup => elapsed,
            };
        }
    }
    timer.current_seconds
}

/// Predicted seconds shaped for display: negative countdown values flip
/// sign and flag overtime instead of clamping to zero.
pub fn display_value(timer: &TimerRecord, now_ms: f64) -> DisplayValue {
    let predicted = predicted_seconds(timer, now_ms);
    if timer.mode == TimerMode::Countdown && predicted < 0.0 {
        return DisplayValue { seconds: -predicted, overtime: true };
    }
    DisplayValue { seconds: predicted, overtime: timer.overtime }
}

/// Compute the full prediction map for a timer list at one instant.
pub fn predict_all(timers: &[TimerRecord], now_ms: f64) -> PredictedValues {
    timers.iter().map(|t| (t.id, display_value(t, now_ms))).collect()
}

/// Spawn the prediction loop: recomputes the shared map at `interval_ms`
/// from the current room snapshot, writing only when something changed so
/// idle rooms cause no reactive churn.
#[cfg(feature = "hydrate")]
pub fn spawn_prediction_loop(
    room: leptos::prelude::RwSignal<crate::state::room::RoomSnapshot>,
    predictions: leptos::prelude::RwSignal<PredictedValues>,
    interval_ms: u64,
) {
    use leptos::prelude::{GetUntracked, Set};

    leptos::task::spawn_local(async move {
        loop {
            gloo_timers::future::sleep(std::time::Duration::from_millis(interval_ms)).await;
            let snapshot = room.get_untracked();
            let next = predict_all(&snapshot.timers, js_sys::Date::now());
            if next != predictions.get_untracked() {
                predictions.set(next);
            }
        }
    });
}
