//! Reconnection scheduling: capped exponential backoff with a bounded
//! attempt count. The connection driver is a single loop, so at most one
//! retry sleep is ever pending; the policy only decides whether and how
//! long the next one should be.

#[cfg(test)]
#[path = "backoff_test.rs"]
mod backoff_test;

use std::time::Duration;

/// Multiplier applied per attempt.
const GROWTH: f64 = 1.5;

#[derive(Debug)]
pub struct ReconnectPolicy {
    base_ms: u64,
    cap_ms: u64,
    max_attempts: u32,
    attempt: u32,
    enabled: bool,
}

impl ReconnectPolicy {
    pub fn new(base_ms: u64, cap_ms: u64, max_attempts: u32) -> Self {
        Self { base_ms, cap_ms, max_attempts, attempt: 0, enabled: true }
    }

    /// Attempts scheduled since the last successful authorization.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Schedule the next retry: increments the attempt counter and yields
    /// `min(base × 1.5^(attempt-1), cap)`. `None` once retries are
    /// exhausted or the policy is disabled.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if !self.enabled || self.attempt >= self.max_attempts {
            return None;
        }
        self.attempt += 1;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let delay_ms = {
            let scaled = (self.base_ms as f64) * GROWTH.powi(i32::try_from(self.attempt).unwrap_or(i32::MAX) - 1);
            (scaled.min(self.cap_ms as f64)) as u64
        };
        Some(Duration::from_millis(delay_ms))
    }

    /// Successful authorization: the next unexpected close starts over at
    /// attempt 1.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Explicit disconnect or credential denial: no further scheduling
    /// until [`ReconnectPolicy::enable`] on a fresh connect.
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn enable(&mut self) {
        self.enabled = true;
        self.attempt = 0;
    }
}
