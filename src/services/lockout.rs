//! Per-account progressive lockout tracking.
//!
//! Counts failed logins per normalized username, independent of source IP, and
//! locks the account once the threshold is reached. State is in-memory and
//! process-local: a restart clears all counters and lockouts, which is the
//! accepted trade-off for this deployment (horizontally scaled instances each
//! keep their own tables).
//!
//! `LockoutStore` is a trait so the same contract can later sit in front of an
//! external shared store; the coordinator fails open when an implementation
//! reports an error.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::warn;

use crate::audit::mask_username;

/// Failure reported by a lockout store implementation. The in-memory store
/// never produces one; external stores (network cache, database) can.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("lockout store unavailable: {0}")]
    Unavailable(String),
}

/// Read-only view of one account's lockout state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockoutStatus {
    pub locked: bool,
    pub locked_until: Option<DateTime<Utc>>,
    /// Failures left before the account locks. `None` while locked.
    pub remaining_attempts: Option<u32>,
}

impl LockoutStatus {
    fn clean(max_attempts: u32) -> Self {
        Self {
            locked: false,
            locked_until: None,
            remaining_attempts: Some(max_attempts),
        }
    }
}

/// What a recorded failure did to the account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureOutcome {
    pub locked: bool,
    pub locked_until: Option<DateTime<Utc>>,
}

/// Per-account failure tracking behind a narrow contract.
pub trait LockoutStore: Send + Sync {
    /// Current state. Side-effect-free except that a lapsed lock is expired
    /// in place (idempotent on repeated calls).
    fn status(&self, username: &str) -> Result<LockoutStatus, StoreError>;

    /// Count one failed login; locks the account on the threshold failure.
    fn record_failure(&self, username: &str) -> Result<FailureOutcome, StoreError>;

    /// Full reset — the entry is deleted unconditionally.
    fn record_success(&self, username: &str) -> Result<(), StoreError>;

    /// Prune stale and lapsed entries. Returns how many were removed.
    fn sweep(&self) -> Result<usize, StoreError>;
}

/// One tracked account.
#[derive(Debug)]
struct FailedLoginAttempt {
    count: u32,
    last_attempt_at: DateTime<Utc>,
    /// `Some` iff the account is currently locked.
    locked_until: Option<DateTime<Utc>>,
}

/// In-memory `LockoutStore` — a mutex-guarded map, one entry per username.
pub struct InMemoryLockoutStore {
    entries: Mutex<HashMap<String, FailedLoginAttempt>>,
    max_failed_attempts: u32,
    /// Lockout duration; also how long a failure streak stays relevant.
    lockout_window: Duration,
}

impl InMemoryLockoutStore {
    pub fn new(max_failed_attempts: u32, lockout_window: std::time::Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_failed_attempts,
            lockout_window: Duration::from_std(lockout_window)
                .unwrap_or_else(|_| Duration::seconds(crate::defaults::DEFAULT_LOCKOUT_SECS as i64)),
        }
    }

    fn remaining(&self, count: u32) -> u32 {
        self.max_failed_attempts.saturating_sub(count)
    }
}

impl LockoutStore for InMemoryLockoutStore {
    fn status(&self, username: &str) -> Result<LockoutStatus, StoreError> {
        let mut entries = self.entries.lock();
        let now = Utc::now();

        let Some(entry) = entries.get(username) else {
            return Ok(LockoutStatus::clean(self.max_failed_attempts));
        };

        if let Some(until) = entry.locked_until {
            if now >= until {
                // Lazy expiry: a lapsed lock transitions the account back to clean.
                entries.remove(username);
                return Ok(LockoutStatus::clean(self.max_failed_attempts));
            }
            return Ok(LockoutStatus {
                locked: true,
                locked_until: Some(until),
                remaining_attempts: None,
            });
        }

        Ok(LockoutStatus {
            locked: false,
            locked_until: None,
            remaining_attempts: Some(self.remaining(entry.count)),
        })
    }

    fn record_failure(&self, username: &str) -> Result<FailureOutcome, StoreError> {
        let mut entries = self.entries.lock();
        let now = Utc::now();

        let entry = entries
            .entry(username.to_string())
            .or_insert(FailedLoginAttempt {
                count: 0,
                last_attempt_at: now,
                locked_until: None,
            });

        let lock_lapsed = entry.locked_until.is_some_and(|until| now >= until);
        let stale = entry.locked_until.is_none()
            && now - entry.last_attempt_at > self.lockout_window;
        if lock_lapsed || stale {
            entry.count = 0;
            entry.locked_until = None;
        }

        entry.count += 1;
        entry.last_attempt_at = now;

        if entry.count >= self.max_failed_attempts {
            // A failure during an active lock lands here too and re-arms it.
            let until = now + self.lockout_window;
            entry.locked_until = Some(until);
            warn!(
                username = %mask_username(username),
                failures = entry.count,
                "account locked after repeated failed logins"
            );
            Ok(FailureOutcome {
                locked: true,
                locked_until: Some(until),
            })
        } else {
            Ok(FailureOutcome {
                locked: false,
                locked_until: None,
            })
        }
    }

    fn record_success(&self, username: &str) -> Result<(), StoreError> {
        self.entries.lock().remove(username);
        Ok(())
    }

    fn sweep(&self) -> Result<usize, StoreError> {
        let mut entries = self.entries.lock();
        let now = Utc::now();
        let before = entries.len();
        entries.retain(|_, entry| match entry.locked_until {
            Some(until) => until >= now,
            None => now - entry.last_attempt_at <= self.lockout_window,
        });
        Ok(before - entries.len())
    }
}
