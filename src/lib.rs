//! Rentora login protection — rate limiting and progressive account lockout.
//!
//! Two independent defenses guard the login endpoint: a fixed-window rate
//! limiter keyed by client IP and a per-account failure tracker that locks an
//! account after repeated bad credentials. The
//! [`LoginProtectionCoordinator`] arbitrates between them for every attempt,
//! with a strict precedence (locked beats rate-limited) and one deliberate
//! tie-break: the attempt that would lock an account is let through the rate
//! limiter so the lockout is recorded rather than swallowed.
//!
//! All state is in-memory and process-local; a restart clears every counter
//! and lockout. A background [`services::sweeper`] task keeps both tables
//! bounded.
//!
//! ```no_run
//! use std::sync::Arc;
//! use rentora_guard::{GuardConfig, LoginProtectionCoordinator, TracingAuditSink};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = GuardConfig::from_env()?;
//! let guard = Arc::new(LoginProtectionCoordinator::from_config(
//!     &config,
//!     Arc::new(TracingAuditSink),
//! ));
//! let _sweeper = rentora_guard::services::sweeper::spawn(
//!     config.sweep_interval,
//!     guard.limiters(),
//!     guard.lockouts(),
//! );
//!
//! let decision = guard.admit("203.0.113.7", "alice@example.com");
//! if decision.is_pass() {
//!     // run the credential check, then call guard.record_failure(..)
//!     // or guard.record_success(..)
//! }
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod config;
pub mod defaults;
pub mod services;
pub mod types;

pub use audit::{AuditEvent, AuditKind, AuditSink, NullAuditSink, TracingAuditSink};
pub use config::GuardConfig;
pub use services::lockout::{
    FailureOutcome, InMemoryLockoutStore, LockoutStatus, LockoutStore, StoreError,
};
pub use services::protection::{normalize_username, LoginProtectionCoordinator};
pub use services::rate_limiter::{
    MultiRateLimiter, RateLimitDecision, RateLimiter, RateLimiterConfig,
};
pub use types::{AdmitDecision, LockedResponse, RateLimitHeaders, RateLimitedResponse};
