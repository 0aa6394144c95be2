use super::*;
use crate::net::types::{Permissions, TimerMode};

fn timer(id: i64, sort_order: i64) -> TimerRecord {
    TimerRecord {
        id,
        label: format!("Timer {id}"),
        mode: TimerMode::Countdown,
        duration_seconds: 300.0,
        current_seconds: 300.0,
        sort_order,
        ..TimerRecord::default()
    }
}

fn authorized(timers: Option<Vec<TimerRecord>>, selected: Option<i64>) -> ServerEnvelope {
    ServerEnvelope::Authorized {
        connection_id: "c1".to_owned(),
        room: RoomInfo {
            id: "r1".to_owned(),
            name: "Main Hall".to_owned(),
            description: String::new(),
            time_zone: "Europe/Berlin".to_owned(),
        },
        permissions: Permissions::default(),
        timers,
        selected_timer_id: selected,
        connection_count: Some(2),
    }
}

#[test]
fn authorized_seeds_room_and_timer_list() {
    let mut snap = RoomSnapshot::default();
    snap.apply(&authorized(Some(vec![timer(2, 1), timer(1, 0)]), Some(2)));

    assert_eq!(snap.room.as_ref().map(|r| r.id.as_str()), Some("r1"));
    // List sorted by ordering key, not arrival order.
    assert_eq!(snap.timers.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(snap.selected_timer_id, Some(2));
    assert_eq!(snap.connection_count, 2);
}

#[test]
fn authorized_without_timer_list_keeps_existing_timers() {
    let mut snap = RoomSnapshot::default();
    snap.apply(&authorized(Some(vec![timer(1, 0)]), Some(1)));
    // Permission refresh mid-session carries no list.
    snap.apply(&authorized(None, None));
    assert_eq!(snap.timers.len(), 1);
    assert_eq!(snap.selected_timer_id, Some(1));
}

#[test]
fn tick_patches_value_and_flags_but_never_the_baseline() {
    let mut snap = RoomSnapshot::default();
    let mut t = timer(7, 0);
    t.active = true;
    t.actual_start_ms = Some(1_000.0);
    t.accumulated_seconds = 12.5;
    snap.apply(&ServerEnvelope::TimerState { timer: t });

    snap.apply(&ServerEnvelope::TimerTick {
        timer_id: 7,
        current_seconds: 287.0,
        active: true,
        paused: false,
        finished: false,
        overtime: false,
        overtime_seconds: 0.0,
    });

    let t = snap.timer(7).expect("timer present");
    assert_eq!(t.current_seconds, 287.0);
    assert!(t.active);
    // Baseline untouched by the raw value push.
    assert_eq!(t.actual_start_ms, Some(1_000.0));
    assert_eq!(t.accumulated_seconds, 12.5);
}

#[test]
fn tick_for_unknown_timer_is_ignored() {
    let mut snap = RoomSnapshot::default();
    snap.apply(&ServerEnvelope::TimerTick {
        timer_id: 404,
        current_seconds: 1.0,
        active: true,
        paused: false,
        finished: false,
        overtime: false,
        overtime_seconds: 0.0,
    });
    assert!(snap.timers.is_empty());
}

#[test]
fn timer_state_replaces_record_wholesale() {
    let mut snap = RoomSnapshot::default();
    snap.apply(&ServerEnvelope::TimerList { timers: vec![timer(7, 0)], selected_timer_id: None });

    let mut paused = timer(7, 0);
    paused.active = true;
    paused.paused = true;
    paused.current_seconds = 120.0;
    paused.actual_start_ms = Some(5_000.0);
    paused.accumulated_seconds = 180.0;
    paused.paused_at_ms = Some(185_000.0);
    snap.apply(&ServerEnvelope::TimerState { timer: paused.clone() });

    assert_eq!(snap.timer(7), Some(&paused));
    assert_eq!(snap.timers.len(), 1);
}

#[test]
fn timer_state_for_new_timer_inserts_in_order() {
    let mut snap = RoomSnapshot::default();
    snap.apply(&ServerEnvelope::TimerList { timers: vec![timer(1, 0), timer(3, 2)], selected_timer_id: None });
    snap.apply(&ServerEnvelope::TimerState { timer: timer(2, 1) });
    assert_eq!(snap.timers.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2, 3]);
}

#[test]
fn list_refresh_replaces_wholesale_and_rederives_selection() {
    let mut snap = RoomSnapshot::default();
    snap.apply(&ServerEnvelope::TimerList { timers: vec![timer(1, 0), timer(2, 1)], selected_timer_id: Some(2) });
    snap.apply(&ServerEnvelope::TimerList { timers: vec![timer(5, 0)], selected_timer_id: Some(5) });

    assert_eq!(snap.timers.iter().map(|t| t.id).collect::<Vec<_>>(), vec![5]);
    assert_eq!(snap.selected_timer_id, Some(5));
}

#[test]
fn selection_referencing_missing_timer_reads_as_none() {
    let mut snap = RoomSnapshot::default();
    snap.apply(&ServerEnvelope::TimerList { timers: vec![timer(1, 0)], selected_timer_id: None });
    snap.apply(&ServerEnvelope::TimerSelected { timer_id: Some(99) });

    // Stored as-is, resolved as no selection.
    assert_eq!(snap.selected_timer_id, Some(99));
    assert!(snap.effective_selection().is_none());

    snap.apply(&ServerEnvelope::TimerSelected { timer_id: Some(1) });
    assert_eq!(snap.effective_selection().map(|t| t.id), Some(1));
}

#[test]
fn roster_update_replaces_list_and_count() {
    let mut snap = RoomSnapshot::default();
    snap.apply(&ServerEnvelope::Roster {
        connections: Some(vec![ConnectionRecord { connection_id: "c1".to_owned(), label: None }]),
        connection_count: 4,
    });
    assert_eq!(snap.roster.len(), 1);
    assert_eq!(snap.connection_count, 4);

    // Count-only update keeps the roster list.
    snap.apply(&ServerEnvelope::Roster { connections: None, connection_count: 5 });
    assert_eq!(snap.roster.len(), 1);
    assert_eq!(snap.connection_count, 5);
}

#[test]
fn session_envelopes_do_not_touch_the_snapshot() {
    let mut snap = RoomSnapshot::default();
    snap.apply(&ServerEnvelope::TimerList { timers: vec![timer(1, 0)], selected_timer_id: Some(1) });
    let before = snap.clone();

    snap.apply(&ServerEnvelope::Identify { nonce: "n".to_owned() });
    snap.apply(&ServerEnvelope::Pong { probe: 9 });
    snap.apply(&ServerEnvelope::Error { message: "oops".to_owned(), code: None });

    assert_eq!(snap, before);
}

#[test]
fn clear_empties_everything() {
    let mut snap = RoomSnapshot::default();
    snap.apply(&authorized(Some(vec![timer(1, 0)]), Some(1)));
    snap.clear();
    assert_eq!(snap, RoomSnapshot::default());
}
