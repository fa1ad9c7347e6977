//! Login-protection coordinator.
//!
//! Arbitrates between the account lockout tracker and the login rate limiter
//! for every authentication attempt. Lockout takes precedence: a locked
//! account is rejected before the rate limiter is ever consulted. The one
//! exception runs the other way — when an account is a single failure away
//! from locking, the attempt is passed through even if the rate limiter would
//! deny it, so the lockout transition is recorded with a real `locked_until`
//! instead of being silently absorbed as a 429.
//!
//! The coordinator never learns whether credentials were valid; the
//! credential-check handler reports back through [`record_failure`] and
//! [`record_success`].
//!
//! [`record_failure`]: LoginProtectionCoordinator::record_failure
//! [`record_success`]: LoginProtectionCoordinator::record_success

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, warn};

use crate::audit::{AuditEvent, AuditKind, AuditSink};
use crate::config::GuardConfig;
use crate::defaults::{API_LIMITER, LOGIN_LIMITER};
use crate::services::lockout::{
    FailureOutcome, InMemoryLockoutStore, LockoutStatus, LockoutStore,
};
use crate::services::rate_limiter::{MultiRateLimiter, RateLimitDecision, RateLimiterConfig};
use crate::types::AdmitDecision;

pub struct LoginProtectionCoordinator {
    limiters: Arc<MultiRateLimiter>,
    lockouts: Arc<dyn LockoutStore>,
    audit: Arc<dyn AuditSink>,
    login_limit: u32,
}

impl LoginProtectionCoordinator {
    pub fn new(
        limiters: Arc<MultiRateLimiter>,
        lockouts: Arc<dyn LockoutStore>,
        audit: Arc<dyn AuditSink>,
        login_limit: u32,
    ) -> Self {
        Self {
            limiters,
            lockouts,
            audit,
            login_limit,
        }
    }

    /// Assemble the coordinator with the standard `"login"` and `"api"`
    /// buckets and an in-memory lockout store.
    pub fn from_config(config: &GuardConfig, audit: Arc<dyn AuditSink>) -> Self {
        let limiters = Arc::new(MultiRateLimiter::new(vec![
            (
                LOGIN_LIMITER,
                RateLimiterConfig {
                    max_requests: config.login_rate_max_attempts,
                    window: config.login_rate_window,
                },
            ),
            (
                API_LIMITER,
                RateLimiterConfig {
                    max_requests: config.api_rate_max_requests,
                    window: config.api_rate_window,
                },
            ),
        ]));
        let lockouts = Arc::new(InMemoryLockoutStore::new(
            config.max_failed_logins,
            config.lockout_window,
        ));
        Self::new(limiters, lockouts, audit, config.login_rate_max_attempts)
    }

    /// Decide whether an authentication attempt may reach the
    /// credential-check handler.
    pub fn admit(&self, client_ip: &str, raw_username: &str) -> AdmitDecision {
        let username = normalize_username(raw_username);

        // A request that cannot be attributed to an account skips the lockout
        // logic entirely and is rate-limited by IP only.
        if let Some(user) = username.as_deref() {
            let status = self.status_fail_open(user);
            if status.locked {
                let locked_until = status.locked_until.unwrap_or_else(Utc::now);
                self.emit(
                    AuditEvent::new(AuditKind::LoginRejectedLocked)
                        .username(user)
                        .ip(client_ip),
                );
                // Precedence invariant: the rate limiter is never consulted
                // for an already-locked account.
                return AdmitDecision::Locked { locked_until };
            }
        }

        let key = format!("login:{client_ip}");
        match self.limiters.check(LOGIN_LIMITER, &key) {
            RateLimitDecision::Allowed {
                limit,
                remaining,
                resets_in_secs,
            } => AdmitDecision::Pass {
                limit,
                remaining,
                resets_in_secs,
            },
            RateLimitDecision::Denied { retry_after_secs } => {
                if let Some(user) = username.as_deref() {
                    // The lock may have appeared concurrently since the first
                    // check; a late-discovered lock still wins over a 429.
                    let status = self.status_fail_open(user);
                    if status.locked {
                        let locked_until = status.locked_until.unwrap_or_else(Utc::now);
                        self.emit(
                            AuditEvent::new(AuditKind::LoginRejectedLocked)
                                .username(user)
                                .ip(client_ip),
                        );
                        return AdmitDecision::Locked { locked_until };
                    }
                    // Tie-break: the attempt that would lock the account must
                    // reach the handler so the lockout is actually recorded.
                    if status.remaining_attempts == Some(1) {
                        return AdmitDecision::Pass {
                            limit: self.login_limit,
                            remaining: 0,
                            resets_in_secs: retry_after_secs,
                        };
                    }
                }

                let mut event =
                    AuditEvent::new(AuditKind::LoginRateLimited).ip(client_ip);
                if let Some(user) = username.as_deref() {
                    event = event.username(user);
                }
                self.emit(event);
                AdmitDecision::RateLimited { retry_after_secs }
            }
        }
    }

    /// Count a failed credential check against the account. Called by the
    /// credential-check handler after the password comparison fails.
    pub fn record_failure(&self, raw_username: &str) -> FailureOutcome {
        let not_locked = FailureOutcome {
            locked: false,
            locked_until: None,
        };
        let Some(username) = normalize_username(raw_username) else {
            warn!("failure for unattributable username ignored by lockout tracking");
            return not_locked;
        };

        let outcome = match self.lockouts.record_failure(&username) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("lockout store error on record_failure, failing open: {e}");
                not_locked
            }
        };

        let kind = if outcome.locked {
            AuditKind::LoginLockout
        } else {
            AuditKind::LoginFailure
        };
        self.emit(AuditEvent::new(kind).username(&username));
        outcome
    }

    /// Reset the account after a successful credential check.
    pub fn record_success(&self, raw_username: &str) {
        let Some(username) = normalize_username(raw_username) else {
            return;
        };
        if let Err(e) = self.lockouts.record_success(&username) {
            error!("lockout store error on record_success, failing open: {e}");
        }
        self.emit(AuditEvent::new(AuditKind::LoginSuccess).username(&username));
    }

    /// General API rate limit, keyed by bare client IP.
    pub fn check_api(&self, client_ip: &str) -> RateLimitDecision {
        self.limiters.check(API_LIMITER, client_ip)
    }

    pub fn limiters(&self) -> Arc<MultiRateLimiter> {
        Arc::clone(&self.limiters)
    }

    pub fn lockouts(&self) -> Arc<dyn LockoutStore> {
        Arc::clone(&self.lockouts)
    }

    /// Lockout lookup with the fail-open policy: if the store errors, the
    /// account is treated as not locked rather than blocking legitimate users
    /// over infrastructure trouble.
    fn status_fail_open(&self, username: &str) -> LockoutStatus {
        match self.lockouts.status(username) {
            Ok(status) => status,
            Err(e) => {
                error!("lockout store error on status, failing open: {e}");
                LockoutStatus {
                    locked: false,
                    locked_until: None,
                    remaining_attempts: None,
                }
            }
        }
    }

    fn emit(&self, event: AuditEvent) {
        if let Err(e) = self.audit.record(event) {
            warn!("audit sink error (ignored): {e}");
        }
    }
}

/// Trim, strip control characters, and lowercase a username.
/// Returns `None` when nothing usable is left.
pub fn normalize_username(raw: &str) -> Option<String> {
    let cleaned: String = raw.trim().chars().filter(|c| !c.is_control()).collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_lowercase())
    }
}
