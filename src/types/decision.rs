//! Admission decisions and the header hints that travel with them.

use chrono::{DateTime, Utc};

/// Outcome of [`admit`](crate::services::protection::LoginProtectionCoordinator::admit)
/// for one authentication attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmitDecision {
    /// Forward to the credential-check handler. Carries the rate-limit quota
    /// snapshot for the informational `X-RateLimit-*` headers.
    Pass {
        limit: u32,
        remaining: u32,
        resets_in_secs: u64,
    },
    /// The account is locked; reject with HTTP 423.
    Locked { locked_until: DateTime<Utc> },
    /// The source exceeded the login rate limit; reject with HTTP 429.
    RateLimited { retry_after_secs: u64 },
}

impl AdmitDecision {
    /// HTTP status for rejections; `None` means "continue to the handler".
    pub fn http_status(&self) -> Option<u16> {
        match self {
            AdmitDecision::Pass { .. } => None,
            AdmitDecision::Locked { .. } => Some(423),
            AdmitDecision::RateLimited { .. } => Some(429),
        }
    }

    /// Header triple for a `Pass`, in emit order.
    pub fn rate_limit_headers(&self) -> Option<RateLimitHeaders> {
        match self {
            AdmitDecision::Pass {
                limit,
                remaining,
                resets_in_secs,
            } => Some(RateLimitHeaders {
                limit: *limit,
                remaining: *remaining,
                reset_secs: *resets_in_secs,
            }),
            _ => None,
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, AdmitDecision::Pass { .. })
    }
}

/// Values for the informational rate-limit response headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitHeaders {
    pub limit: u32,
    pub remaining: u32,
    /// Seconds until the current window resets.
    pub reset_secs: u64,
}

impl RateLimitHeaders {
    /// Name/value pairs ready to set on a response.
    pub fn pairs(&self) -> [(&'static str, String); 3] {
        [
            ("X-RateLimit-Limit", self.limit.to_string()),
            ("X-RateLimit-Remaining", self.remaining.to_string()),
            ("X-RateLimit-Reset", self.reset_secs.to_string()),
        ]
    }
}
