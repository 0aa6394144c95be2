#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};

/// Engine tuning knobs. The defaults match production behavior; embedders
/// can deserialize overrides from their own settings payloads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// First retry delay after an unexpected close.
    pub reconnect_base_ms: u64,
    /// Upper bound on any single retry delay.
    pub reconnect_cap_ms: u64,
    /// Retries before the session gives up and reports Disconnected.
    pub reconnect_max_attempts: u32,
    /// Grace period after authorization before the first liveness probe,
    /// so probing does not race server-side session setup.
    pub keepalive_initial_delay_ms: u64,
    /// Interval between liveness probes while authorized.
    pub keepalive_interval_ms: u64,
    /// Cadence of the clock-prediction loop.
    pub prediction_interval_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            reconnect_base_ms: 1_000,
            reconnect_cap_ms: 30_000,
            reconnect_max_attempts: 12,
            keepalive_initial_delay_ms: 5_000,
            keepalive_interval_ms: 30_000,
            prediction_interval_ms: 100,
        }
    }
}
