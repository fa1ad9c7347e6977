//! Default thresholds and windows for the login-protection subsystem.
//!
//! Every value can be overridden through the environment (see `config.rs`);
//! these are the numbers used when nothing is set.

/// Failed login attempts allowed before an account is locked.
pub const DEFAULT_MAX_FAILED_LOGINS: u32 = 5;

/// Lockout duration and failure-tracking window, in seconds (15 minutes).
pub const DEFAULT_LOCKOUT_SECS: u64 = 15 * 60;

/// Login rate limit: attempts per IP per window.
pub const DEFAULT_LOGIN_RATE_MAX_ATTEMPTS: u32 = 5;

/// Login rate limit window, in seconds (15 minutes).
pub const DEFAULT_LOGIN_RATE_WINDOW_SECS: u64 = 15 * 60;

/// General API rate limit: requests per IP per window.
pub const DEFAULT_API_RATE_MAX_REQUESTS: u32 = 100;

/// General API rate limit window, in seconds.
pub const DEFAULT_API_RATE_WINDOW_SECS: u64 = 60;

/// Interval between background sweep passes, in seconds (2 minutes).
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 2 * 60;

/// Limiter bucket name for login attempts (keys look like `login:1.2.3.4`).
pub const LOGIN_LIMITER: &str = "login";

/// Limiter bucket name for general API traffic (keyed by bare IP).
pub const API_LIMITER: &str = "api";
