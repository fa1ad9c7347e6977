//! Configuration management

use std::time::Duration;

use anyhow::{bail, Result};

use crate::defaults;

/// Login-protection configuration, loaded from environment variables.
///
/// All values fall back to the constants in `defaults.rs`, so the subsystem
/// works without any configuration at all.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Failed logins before an account locks.
    pub max_failed_logins: u32,

    /// How long a lockout lasts; also the staleness window for failure counts.
    pub lockout_window: Duration,

    /// Login attempts allowed per IP within one rate-limit window.
    pub login_rate_max_attempts: u32,

    /// Login rate-limit window.
    pub login_rate_window: Duration,

    /// General API requests allowed per IP within one window.
    pub api_rate_max_requests: u32,

    /// General API rate-limit window.
    pub api_rate_window: Duration,

    /// Interval between background sweep passes.
    pub sweep_interval: Duration,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            max_failed_logins: defaults::DEFAULT_MAX_FAILED_LOGINS,
            lockout_window: Duration::from_secs(defaults::DEFAULT_LOCKOUT_SECS),
            login_rate_max_attempts: defaults::DEFAULT_LOGIN_RATE_MAX_ATTEMPTS,
            login_rate_window: Duration::from_secs(defaults::DEFAULT_LOGIN_RATE_WINDOW_SECS),
            api_rate_max_requests: defaults::DEFAULT_API_RATE_MAX_REQUESTS,
            api_rate_window: Duration::from_secs(defaults::DEFAULT_API_RATE_WINDOW_SECS),
            sweep_interval: Duration::from_secs(defaults::DEFAULT_SWEEP_INTERVAL_SECS),
        }
    }
}

impl GuardConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = Self {
            max_failed_logins: env_or("MAX_FAILED_LOGINS", defaults::DEFAULT_MAX_FAILED_LOGINS),
            lockout_window: Duration::from_secs(env_or(
                "LOCKOUT_SECS",
                defaults::DEFAULT_LOCKOUT_SECS,
            )),
            login_rate_max_attempts: env_or(
                "LOGIN_RATE_MAX_ATTEMPTS",
                defaults::DEFAULT_LOGIN_RATE_MAX_ATTEMPTS,
            ),
            login_rate_window: Duration::from_secs(env_or(
                "LOGIN_RATE_WINDOW_SECS",
                defaults::DEFAULT_LOGIN_RATE_WINDOW_SECS,
            )),
            api_rate_max_requests: env_or(
                "API_RATE_MAX_REQUESTS",
                defaults::DEFAULT_API_RATE_MAX_REQUESTS,
            ),
            api_rate_window: Duration::from_secs(env_or(
                "API_RATE_WINDOW_SECS",
                defaults::DEFAULT_API_RATE_WINDOW_SECS,
            )),
            sweep_interval: Duration::from_secs(env_or(
                "SWEEP_INTERVAL_SECS",
                defaults::DEFAULT_SWEEP_INTERVAL_SECS,
            )),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would disable protection or divide by zero downstream.
    pub fn validate(&self) -> Result<()> {
        if self.max_failed_logins == 0 {
            bail!("MAX_FAILED_LOGINS must be at least 1");
        }
        if self.login_rate_max_attempts == 0 {
            bail!("LOGIN_RATE_MAX_ATTEMPTS must be at least 1");
        }
        if self.api_rate_max_requests == 0 {
            bail!("API_RATE_MAX_REQUESTS must be at least 1");
        }
        if self.lockout_window.is_zero() {
            bail!("LOCKOUT_SECS must be at least 1");
        }
        if self.login_rate_window.is_zero() || self.api_rate_window.is_zero() {
            bail!("rate-limit windows must be at least 1 second");
        }
        if self.sweep_interval.is_zero() {
            bail!("SWEEP_INTERVAL_SECS must be at least 1");
        }
        Ok(())
    }
}

/// Read an env var, falling back to `default` when unset or unparseable.
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = GuardConfig::default();
        assert_eq!(config.max_failed_logins, 5);
        assert_eq!(config.lockout_window, Duration::from_secs(900));
        assert_eq!(config.login_rate_max_attempts, 5);
        assert_eq!(config.login_rate_window, Duration::from_secs(900));
        assert_eq!(config.api_rate_max_requests, 100);
        assert_eq!(config.api_rate_window, Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_max_failed_logins_rejected() {
        let config = GuardConfig {
            max_failed_logins: 0,
            ..GuardConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_window_rejected() {
        let config = GuardConfig {
            login_rate_window: Duration::ZERO,
            ..GuardConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_or_falls_back_on_garbage() {
        std::env::set_var("GUARD_TEST_GARBAGE", "not-a-number");
        assert_eq!(env_or("GUARD_TEST_GARBAGE", 7u32), 7);
        std::env::remove_var("GUARD_TEST_GARBAGE");
    }

    #[test]
    fn env_or_reads_valid_value() {
        std::env::set_var("GUARD_TEST_VALID", "42");
        assert_eq!(env_or("GUARD_TEST_VALID", 7u32), 42);
        std::env::remove_var("GUARD_TEST_VALID");
    }
}
