use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub const DEFAULT_MAX_REQUESTS: u32 = 5;
pub const DEFAULT_WINDOW_SECS: u64 = 60;

struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window request counter keyed by caller identity. Held in the
/// application state and injected into handlers rather than living in a
/// process global, so it can be replaced per instance and in tests.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    entries: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_env() -> Self {
        let max_requests = std::env::var("GENERATE_RATE_LIMIT")
            .ok()
            .and_then(|raw| raw.parse::<u32>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_MAX_REQUESTS);
        let window_secs = std::env::var("GENERATE_RATE_WINDOW_SECS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_WINDOW_SECS);

        Self::new(max_requests, Duration::from_secs(window_secs))
    }

    /// Returns true when the caller still has budget in the current window.
    pub fn try_acquire(&self, key: &str) -> bool {
        self.try_acquire_at(key, Instant::now())
    }

    fn try_acquire_at(&self, key: &str, now: Instant) -> bool {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // Expired windows are pruned on every call so the map stays bounded
        // by the number of distinct callers in one window.
        entries.retain(|_, window| now.duration_since(window.started) < self.window);

        let window = entries.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if window.count >= self.max_requests {
            return false;
        }
        window.count += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_is_enforced_per_key() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let now = Instant::now();

        assert!(limiter.try_acquire_at("10.0.0.1", now));
        assert!(limiter.try_acquire_at("10.0.0.1", now));
        assert!(!limiter.try_acquire_at("10.0.0.1", now));

        // A different caller has its own budget.
        assert!(limiter.try_acquire_at("10.0.0.2", now));
    }

    #[test]
    fn window_expiry_resets_the_budget() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(limiter.try_acquire_at("caller", now));
        assert!(!limiter.try_acquire_at("caller", now + Duration::from_secs(30)));
        assert!(limiter.try_acquire_at("caller", now + Duration::from_secs(61)));
    }
}
