use super::*;

#[test]
fn round_trip_is_measured_against_the_send_instant() {
    let mut probes = ProbeTracker::new();
    let id = probes.begin(10_000.0);
    assert_eq!(probes.complete(id, 10_042.0), Some(42.0));
}

#[test]
fn probe_ids_are_monotonic() {
    let mut probes = ProbeTracker::new();
    let a = probes.begin(0.0);
    let b = probes.begin(1.0);
    assert!(b > a);
}

#[test]
fn stale_or_unknown_replies_are_ignored() {
    let mut probes = ProbeTracker::new();
    let first = probes.begin(0.0);
    // A newer probe supersedes the outstanding one.
    let second = probes.begin(30_000.0);

    assert_eq!(probes.complete(first, 30_100.0), None);
    assert_eq!(probes.complete(second, 30_050.0), Some(50.0));
    // Duplicate reply after completion is also ignored.
    assert_eq!(probes.complete(second, 30_060.0), None);
}

#[test]
fn reply_with_no_probe_in_flight_is_ignored() {
    let mut probes = ProbeTracker::new();
    assert_eq!(probes.complete(1, 5.0), None);
}
