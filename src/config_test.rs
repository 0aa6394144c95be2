use super::*;

#[test]
fn defaults_match_production_cadence() {
    let c = SyncConfig::default();
    assert_eq!(c.reconnect_base_ms, 1_000);
    assert_eq!(c.reconnect_cap_ms, 30_000);
    assert_eq!(c.keepalive_interval_ms, 30_000);
    assert_eq!(c.prediction_interval_ms, 100);
}

#[test]
fn partial_overrides_keep_remaining_defaults() {
    let c: SyncConfig = serde_json::from_str(r#"{"reconnect_max_attempts": 3}"#).expect("decodes");
    assert_eq!(c.reconnect_max_attempts, 3);
    assert_eq!(c.reconnect_base_ms, 1_000);
}
