//! JSON bodies for rejected authentication attempts.
//!
//! The routing layer serializes these as-is: HTTP 423 for a locked account,
//! HTTP 429 for a rate-limited source.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Body for HTTP 423 (account locked).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockedResponse {
    pub message: String,
    pub error: String,
    /// ISO-8601 timestamp at which the lock lapses.
    pub locked_until: DateTime<Utc>,
}

impl LockedResponse {
    pub fn new(locked_until: DateTime<Utc>) -> Self {
        Self {
            message: "Account temporarily locked due to repeated failed login attempts."
                .to_string(),
            error: "ACCOUNT_LOCKED".to_string(),
            locked_until,
        }
    }
}

/// Body for HTTP 429 (rate limited).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitedResponse {
    pub message: String,
    pub error: String,
    /// Seconds the client should wait before retrying.
    pub retry_after: u64,
}

impl RateLimitedResponse {
    pub fn new(retry_after: u64) -> Self {
        Self {
            message: "Too many login attempts. Please try again later.".to_string(),
            error: "RATE_LIMITED".to_string(),
            retry_after,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locked_response_serializes_camel_case_iso8601() {
        let when = DateTime::parse_from_rfc3339("2026-08-24T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let body = serde_json::to_value(LockedResponse::new(when)).unwrap();
        assert_eq!(body["error"], "ACCOUNT_LOCKED");
        assert_eq!(body["lockedUntil"], "2026-08-24T12:00:00Z");
        assert!(body["message"].as_str().unwrap().contains("locked"));
    }

    #[test]
    fn rate_limited_response_serializes_retry_after() {
        let body = serde_json::to_value(RateLimitedResponse::new(42)).unwrap();
        assert_eq!(body["error"], "RATE_LIMITED");
        assert_eq!(body["retryAfter"], 42);
    }
}
