use std::collections::HashMap;
use std::sync::Mutex;

const WINDOW_SECONDS: i64 = 60;

#[derive(Debug, Clone, Copy)]
struct RateLimitEntry {
    attempts: u32,
    window_start: i64,
}

/// Fixed one-minute windows of submissions per client key.
pub struct RateLimiter {
    per_minute: u32,
    entries: Mutex<HashMap<String, RateLimitEntry>>,
}

impl RateLimiter {
    pub fn new(per_minute: u32) -> Self {
        Self {
            per_minute: per_minute.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, chrono::Utc::now().timestamp())
    }

    /// Records an attempt at `now` and reports whether it is allowed.
    pub fn check_at(&self, key: &str, now: i64) -> bool {
        let Ok(mut entries) = self.entries.lock() else {
            return true;
        };
        entries.retain(|_, entry| now - entry.window_start < WINDOW_SECONDS);

        let entry = entries.entry(key.to_string()).or_insert(RateLimitEntry {
            attempts: 0,
            window_start: now,
        });
        if entry.attempts >= self.per_minute {
            return false;
        }
        entry.attempts += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_applies_per_key_and_resets() {
        let limiter = RateLimiter::new(2);
        assert!(limiter.check_at("1.2.3.4", 100));
        assert!(limiter.check_at("1.2.3.4", 110));
        assert!(!limiter.check_at("1.2.3.4", 120));
        assert!(limiter.check_at("5.6.7.8", 120));

        assert!(limiter.check_at("1.2.3.4", 160));
    }
}
