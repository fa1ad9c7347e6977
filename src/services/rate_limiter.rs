//! Multi-key fixed-window rate limiter.
//!
//! `MultiRateLimiter` holds multiple independent `RateLimiter` instances, each
//! identified by a string name (e.g. `"login"`, `"api"`). Every limiter has its
//! own `max_requests` and `window`, which allows fine-tuned throttling per
//! endpoint class.
//!
//! Rate limiting is in-memory and resets on process restart.
//! It is safe to share via `Arc<MultiRateLimiter>` across async tasks.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

// =============================================================================
// Core RateLimiter
// =============================================================================

/// Configuration for a single rate limiter bucket.
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    pub max_requests: u32,
    pub window: Duration,
}

/// One counter per key. Replaced wholesale when its window lapses.
#[derive(Debug)]
struct RateLimitEntry {
    count: u32,
    window_reset_at: Instant,
}

/// Outcome of a single rate-limit check. The checked request has already been
/// counted against quota by the time the caller sees this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed {
        limit: u32,
        remaining: u32,
        resets_in_secs: u64,
    },
    Denied {
        retry_after_secs: u64,
    },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed { .. })
    }

    /// Synthetic allow used when a bucket is misconfigured and we fail open.
    fn allowed_unbounded() -> Self {
        RateLimitDecision::Allowed {
            limit: 0,
            remaining: 0,
            resets_in_secs: 0,
        }
    }
}

/// In-memory fixed-window rate limiter — one counter per key.
pub struct RateLimiter {
    entries: Mutex<HashMap<String, RateLimitEntry>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_requests: config.max_requests,
            window: config.window,
        }
    }

    /// Check `key` against the limit and count this request against quota.
    /// A denied request still counts — there is no peek mode.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        let mut entries = self.entries.lock();
        let now = Instant::now();

        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| RateLimitEntry {
                count: 0,
                window_reset_at: now + self.window,
            });

        // Fixed window: the counter is replaced, never decayed.
        if now >= entry.window_reset_at {
            entry.count = 0;
            entry.window_reset_at = now + self.window;
        }

        entry.count += 1;

        let resets_in_secs = ceil_secs(entry.window_reset_at.saturating_duration_since(now));
        if entry.count > self.max_requests {
            RateLimitDecision::Denied {
                retry_after_secs: resets_in_secs,
            }
        } else {
            RateLimitDecision::Allowed {
                limit: self.max_requests,
                remaining: self.max_requests - entry.count,
                resets_in_secs,
            }
        }
    }

    /// Remove entries whose window has lapsed. Returns how many were pruned.
    pub fn cleanup(&self) -> usize {
        let mut entries = self.entries.lock();
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, entry| entry.window_reset_at > now);
        before - entries.len()
    }
}

/// Whole seconds, rounded up, so "retry after" never undershoots the window.
fn ceil_secs(duration: Duration) -> u64 {
    (duration.as_millis() as u64).div_ceil(1000)
}

// =============================================================================
// MultiRateLimiter
// =============================================================================

/// A collection of named `RateLimiter` instances with independent configurations.
pub struct MultiRateLimiter {
    limiters: HashMap<String, Arc<RateLimiter>>,
}

impl MultiRateLimiter {
    /// Build a `MultiRateLimiter` from a list of `(name, config)` pairs.
    pub fn new(configs: Vec<(&str, RateLimiterConfig)>) -> Self {
        let limiters = configs
            .into_iter()
            .map(|(name, cfg)| (name.to_string(), Arc::new(RateLimiter::new(cfg))))
            .collect();
        Self { limiters }
    }

    /// Check `key` against the named limiter.
    /// An unknown limiter name fails open — misconfiguration must not block traffic.
    pub fn check(&self, limiter: &str, key: &str) -> RateLimitDecision {
        match self.limiters.get(limiter) {
            Some(l) => l.check(key),
            None => {
                tracing::warn!("MultiRateLimiter: unknown limiter '{}'", limiter);
                RateLimitDecision::allowed_unbounded()
            }
        }
    }

    /// Sweep every bucket. Returns the total number of pruned entries.
    pub fn cleanup_all(&self) -> usize {
        self.limiters.values().map(|l| l.cleanup()).sum()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32, window: Duration) -> RateLimiter {
        RateLimiter::new(RateLimiterConfig {
            max_requests,
            window,
        })
    }

    #[test]
    fn allows_within_limit() {
        let l = limiter(3, Duration::from_secs(60));
        assert!(l.check("1.2.3.4").is_allowed());
        assert!(l.check("1.2.3.4").is_allowed());
        assert!(l.check("1.2.3.4").is_allowed());
    }

    #[test]
    fn denies_over_limit_with_ceil_retry_after() {
        let l = limiter(3, Duration::from_secs(60));
        l.check("1.2.3.4");
        l.check("1.2.3.4");
        l.check("1.2.3.4");
        match l.check("1.2.3.4") {
            RateLimitDecision::Denied { retry_after_secs } => {
                // Fractions of a second round up to the full window.
                assert_eq!(retry_after_secs, 60);
            }
            other => panic!("expected Denied, got {:?}", other),
        }
    }

    #[test]
    fn remaining_quota_counts_down() {
        let l = limiter(3, Duration::from_secs(60));
        for expected in [2u32, 1, 0] {
            match l.check("1.2.3.4") {
                RateLimitDecision::Allowed {
                    remaining, limit, ..
                } => {
                    assert_eq!(remaining, expected);
                    assert_eq!(limit, 3);
                }
                other => panic!("expected Allowed, got {:?}", other),
            }
        }
    }

    #[test]
    fn denied_request_still_counts() {
        let l = limiter(1, Duration::from_secs(60));
        assert!(l.check("1.2.3.4").is_allowed());
        assert!(!l.check("1.2.3.4").is_allowed());
        // The denial above incremented the counter in place.
        let entries = l.entries.lock();
        assert_eq!(entries.get("1.2.3.4").unwrap().count, 2);
    }

    #[test]
    fn fresh_window_after_expiry() {
        let l = limiter(1, Duration::from_millis(40));
        assert!(l.check("1.2.3.4").is_allowed());
        assert!(!l.check("1.2.3.4").is_allowed());

        std::thread::sleep(Duration::from_millis(50));
        match l.check("1.2.3.4") {
            RateLimitDecision::Allowed { remaining, .. } => assert_eq!(remaining, 0),
            other => panic!("expected Allowed after window reset, got {:?}", other),
        }
    }

    #[test]
    fn keys_are_independent() {
        let l = limiter(2, Duration::from_secs(60));
        l.check("10.0.0.1");
        l.check("10.0.0.1");
        assert!(!l.check("10.0.0.1").is_allowed()); // blocked

        assert!(l.check("10.0.0.2").is_allowed()); // independent
    }

    #[test]
    fn cleanup_prunes_only_expired_windows() {
        let l = limiter(5, Duration::from_millis(30));
        l.check("old-a");
        l.check("old-b");
        std::thread::sleep(Duration::from_millis(40));
        l.check("fresh");

        assert_eq!(l.cleanup(), 2);
        assert_eq!(l.entries.lock().len(), 1);
        // A second pass with nothing to do is a no-op.
        assert_eq!(l.cleanup(), 0);
    }

    #[test]
    fn multi_rate_limiter_independent_configs() {
        let m = MultiRateLimiter::new(vec![
            (
                "login",
                RateLimiterConfig {
                    max_requests: 2,
                    window: Duration::from_secs(60),
                },
            ),
            (
                "api",
                RateLimiterConfig {
                    max_requests: 5,
                    window: Duration::from_secs(60),
                },
            ),
        ]);

        // login allows 2, then blocks
        assert!(m.check("login", "1.2.3.4").is_allowed());
        assert!(m.check("login", "1.2.3.4").is_allowed());
        assert!(!m.check("login", "1.2.3.4").is_allowed());

        // api bucket has its own quota — still at 0 for this key
        assert!(m.check("api", "1.2.3.4").is_allowed());
    }

    #[test]
    fn multi_rate_limiter_unknown_limiter_fails_open() {
        let m = MultiRateLimiter::new(vec![]);
        // Unknown limiters should not block requests
        assert!(m.check("nonexistent", "1.2.3.4").is_allowed());
    }
}
