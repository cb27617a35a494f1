//! Sliding-window rate limiting, per key.
//!
//! The limiter records request timestamps per key and admits a request iff
//! fewer than `max_requests` timestamps fall inside the trailing window.
//! `check_limit` tests and records under one lock acquisition, so the
//! check-then-act sequence is atomic.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::options::RateLimitConfig;

/// Per-key sliding-window admission control.
///
/// Default policy: 10 requests per 60 seconds per key (the orchestrator keys
/// by URL origin).
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    state: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: Duration::from_millis(config.window_ms),
            state: Mutex::new(HashMap::new()),
        }
    }

    /// Atomically test and record: returns `true` and records the current
    /// time iff the key has capacity left in the trailing window.
    pub fn check_limit(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut state = self.state.lock().unwrap();
        let timestamps = state.entry(key.to_string()).or_default();
        Self::prune(timestamps, now, self.window);

        if timestamps.len() < self.max_requests {
            timestamps.push(now);
            true
        } else {
            false
        }
    }

    /// Requests the key can still make in the current window. Prunes expired
    /// timestamps as a side effect but never records a new one.
    pub fn remaining_requests(&self, key: &str) -> usize {
        let now = Instant::now();
        let mut state = self.state.lock().unwrap();
        let Some(timestamps) = state.get_mut(key) else { return self.max_requests };
        Self::prune(timestamps, now, self.window);
        self.max_requests.saturating_sub(timestamps.len())
    }

    /// Milliseconds until the oldest recorded request leaves the window.
    /// Zero when the key has capacity now.
    pub fn retry_after_ms(&self, key: &str) -> u64 {
        let now = Instant::now();
        let mut state = self.state.lock().unwrap();
        let Some(timestamps) = state.get_mut(key) else { return 0 };
        Self::prune(timestamps, now, self.window);
        if timestamps.len() < self.max_requests {
            return 0;
        }
        let oldest = timestamps[0];
        let elapsed = now.duration_since(oldest);
        self.window.saturating_sub(elapsed).as_millis() as u64
    }

    fn prune(timestamps: &mut Vec<Instant>, now: Instant, window: Duration) {
        timestamps.retain(|t| now.duration_since(*t) < window);
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(&RateLimitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admits_up_to_the_limit_then_rejects() {
        let limiter = RateLimiter::new(&RateLimitConfig { max_requests: 3, window_ms: 60_000 });

        assert!(limiter.check_limit("origin-a"));
        assert!(limiter.check_limit("origin-a"));
        assert!(limiter.check_limit("origin-a"));
        assert!(!limiter.check_limit("origin-a"), "request N+1 inside the window must be rejected");
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new(&RateLimitConfig { max_requests: 1, window_ms: 60_000 });

        assert!(limiter.check_limit("origin-a"));
        assert!(limiter.check_limit("origin-b"));
        assert!(!limiter.check_limit("origin-a"));
    }

    #[test]
    fn test_window_expiry_restores_capacity() {
        let limiter = RateLimiter::new(&RateLimitConfig { max_requests: 1, window_ms: 30 });

        assert!(limiter.check_limit("origin-a"));
        assert!(!limiter.check_limit("origin-a"));

        std::thread::sleep(Duration::from_millis(40));
        assert!(limiter.check_limit("origin-a"), "capacity must return once the window elapses");
    }

    #[test]
    fn test_remaining_requests_never_records() {
        let limiter = RateLimiter::new(&RateLimitConfig { max_requests: 5, window_ms: 60_000 });

        assert_eq!(limiter.remaining_requests("origin-a"), 5);
        assert_eq!(limiter.remaining_requests("origin-a"), 5, "queries must not consume capacity");

        limiter.check_limit("origin-a");
        limiter.check_limit("origin-a");
        assert_eq!(limiter.remaining_requests("origin-a"), 3);
    }

    #[test]
    fn test_retry_after_is_zero_with_capacity() {
        let limiter = RateLimiter::new(&RateLimitConfig { max_requests: 2, window_ms: 60_000 });
        assert_eq!(limiter.retry_after_ms("origin-a"), 0);

        limiter.check_limit("origin-a");
        limiter.check_limit("origin-a");
        assert!(limiter.retry_after_ms("origin-a") > 0);
    }
}
