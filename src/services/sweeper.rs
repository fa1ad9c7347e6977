//! Background sweep of expired rate-limit windows and lockout entries.
//!
//! Purely a memory bound: both tables expire entries lazily on access, so the
//! sweep never changes the outcome of any decision — it only reclaims entries
//! nothing will touch again.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::services::lockout::LockoutStore;
use crate::services::rate_limiter::MultiRateLimiter;

/// One housekeeping pass over both tables.
pub fn sweep_once(limiters: &MultiRateLimiter, lockouts: &dyn LockoutStore) {
    let pruned_windows = limiters.cleanup_all();
    match lockouts.sweep() {
        Ok(pruned_accounts) => {
            if pruned_windows > 0 || pruned_accounts > 0 {
                debug!(
                    pruned_windows,
                    pruned_accounts, "sweep pass reclaimed expired entries"
                );
            }
        }
        Err(e) => warn!("lockout store sweep failed (will retry next pass): {e}"),
    }
}

/// Spawn the periodic sweep task. The handle can be aborted at shutdown;
/// there is nothing to flush.
pub fn spawn(
    interval: Duration,
    limiters: Arc<MultiRateLimiter>,
    lockouts: Arc<dyn LockoutStore>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it so a pass never races startup.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            sweep_once(&limiters, lockouts.as_ref());
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::lockout::{InMemoryLockoutStore, LockoutStore};
    use crate::services::rate_limiter::RateLimiterConfig;

    fn fixtures() -> (Arc<MultiRateLimiter>, Arc<InMemoryLockoutStore>) {
        let limiters = Arc::new(MultiRateLimiter::new(vec![(
            "login",
            RateLimiterConfig {
                max_requests: 5,
                window: Duration::from_millis(30),
            },
        )]));
        let lockouts = Arc::new(InMemoryLockoutStore::new(5, Duration::from_millis(30)));
        (limiters, lockouts)
    }

    #[test]
    fn sweep_commutes_with_decisions() {
        let (limiters, lockouts) = fixtures();
        limiters.check("login", "login:1.2.3.4");
        lockouts.record_failure("alice").unwrap();
        std::thread::sleep(Duration::from_millis(50));

        // Everything is expired; decisions after the sweep match decisions
        // the lazy expiry would have produced anyway.
        sweep_once(limiters.as_ref(), lockouts.as_ref());
        assert!(limiters.check("login", "login:1.2.3.4").is_allowed());
        assert_eq!(
            lockouts.status("alice").unwrap().remaining_attempts,
            Some(5)
        );
    }

    #[test]
    fn double_sweep_observationally_equal_to_single() {
        let (limiters, lockouts) = fixtures();
        limiters.check("login", "login:1.2.3.4");
        lockouts.record_failure("alice").unwrap();
        std::thread::sleep(Duration::from_millis(50));
        limiters.check("login", "login:5.6.7.8");
        lockouts.record_failure("bob").unwrap();

        sweep_once(limiters.as_ref(), lockouts.as_ref());
        let status_after_one = lockouts.status("bob").unwrap();

        sweep_once(limiters.as_ref(), lockouts.as_ref());
        assert_eq!(lockouts.status("bob").unwrap(), status_after_one);
        assert_eq!(
            lockouts.status("bob").unwrap().remaining_attempts,
            Some(4)
        );
        match limiters.check("login", "login:5.6.7.8") {
            crate::services::rate_limiter::RateLimitDecision::Allowed {
                remaining, ..
            } => assert_eq!(remaining, 3), // second request in a live window
            other => panic!("expected Allowed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn spawned_sweeper_prunes_in_background() {
        let (limiters, lockouts) = fixtures();
        limiters.check("login", "login:1.2.3.4");
        lockouts.record_failure("alice").unwrap();

        let handle = spawn(
            Duration::from_millis(40),
            Arc::clone(&limiters),
            Arc::clone(&lockouts) as Arc<dyn LockoutStore>,
        );

        tokio::time::sleep(Duration::from_millis(120)).await;
        handle.abort();

        assert!(lockouts.status("alice").unwrap().remaining_attempts == Some(5));
        // Nothing left for a manual pass to reclaim.
        assert_eq!(limiters.cleanup_all(), 0);
        assert_eq!(lockouts.sweep().unwrap(), 0);
    }
}
