//! Room state store: folds inbound envelopes into a [`RoomSnapshot`].
//!
//! The fold is one exhaustive `match` over [`ServerEnvelope`], so a new
//! envelope kind that should affect the snapshot cannot be forgotten
//! silently. Raw `timer_tick` pushes patch only the last-known value and
//! flags; the prediction baseline is refreshed exclusively by `timer_state`
//! transitions.

#[cfg(test)]
#[path = "room_test.rs"]
mod room_test;

use crate::net::types::{ConnectionRecord, RoomInfo, ServerEnvelope, TimerRecord};

/// Room-scoped state visible to consumers. Empty before authorization,
/// cleared wholesale on any close.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RoomSnapshot {
    pub room: Option<RoomInfo>,
    pub timers: Vec<TimerRecord>,
    pub selected_timer_id: Option<i64>,
    pub roster: Vec<ConnectionRecord>,
    pub connection_count: u32,
}

impl RoomSnapshot {
    /// Selection resolved against the current timer list. A selection id
    /// that references no known timer reads as "no selection" even though
    /// the store tolerates holding it transiently.
    pub fn effective_selection(&self) -> Option<&TimerRecord> {
        let id = self.selected_timer_id?;
        self.timers.iter().find(|t| t.id == id)
    }

    pub fn timer(&self, timer_id: i64) -> Option<&TimerRecord> {
        self.timers.iter().find(|t| t.id == timer_id)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Fold one inbound envelope into the snapshot.
    pub fn apply(&mut self, envelope: &ServerEnvelope) {
        match envelope {
            ServerEnvelope::Authorized {
                room,
                timers,
                selected_timer_id,
                connection_count,
                ..
            } => {
                self.room = Some(room.clone());
                if let Some(timers) = timers {
                    self.replace_timers(timers.clone());
                    self.selected_timer_id = *selected_timer_id;
                } else if selected_timer_id.is_some() {
                    self.selected_timer_id = *selected_timer_id;
                }
                if let Some(count) = connection_count {
                    self.connection_count = *count;
                }
            }
            ServerEnvelope::TimerTick {
                timer_id,
                current_seconds,
                active,
                paused,
                finished,
                overtime,
                overtime_seconds,
            } => {
                // Patch value and flags only; baseline fields stay put so a
                // late tick cannot discard smooth local interpolation.
                if let Some(timer) = self.timers.iter_mut().find(|t| t.id == *timer_id) {
                    timer.current_seconds = *current_seconds;
                    timer.active = *active;
                    timer.paused = *paused;
                    timer.finished = *finished;
                    timer.overtime = *overtime;
                    timer.overtime_seconds = *overtime_seconds;
                }
            }
            ServerEnvelope::TimerState { timer } => {
                // Transition envelope: replace wholesale, fresh baseline included.
                if let Some(existing) = self.timers.iter_mut().find(|t| t.id == timer.id) {
                    *existing = timer.clone();
                } else {
                    self.timers.push(timer.clone());
                }
                self.timers.sort_by_key(|t| (t.sort_order, t.id));
            }
            ServerEnvelope::TimerSelected { timer_id } => {
                self.selected_timer_id = *timer_id;
            }
            ServerEnvelope::TimerList { timers, selected_timer_id } => {
                self.replace_timers(timers.clone());
                self.selected_timer_id = *selected_timer_id;
            }
            ServerEnvelope::Roster { connections, connection_count } => {
                if let Some(connections) = connections {
                    self.roster = connections.clone();
                }
                self.connection_count = *connection_count;
            }
            // Session-level envelopes carry no room state.
            ServerEnvelope::Identify { .. }
            | ServerEnvelope::Pong { .. }
            | ServerEnvelope::Error { .. } => {}
        }
    }

    fn replace_timers(&mut self, mut timers: Vec<TimerRecord>) {
        timers.sort_by_key(|t| (t.sort_order, t.id));
        self.timers = timers;
    }
}
