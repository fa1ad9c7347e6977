//! Security audit events for login decisions.
//!
//! The sink is best-effort by contract: callers log and swallow any error, so a
//! slow or broken sink can never fail or delay an admit/record decision. The
//! bundled `TracingAuditSink` writes to the log stream with masked identifiers;
//! a durable implementation (database, SIEM forwarder) can carry full detail.

use serde::Serialize;
use thiserror::Error;
use tracing::info;

/// What happened, from the protection subsystem's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditKind {
    /// Credentials checked and rejected.
    LoginFailure,
    /// A failed attempt crossed the threshold and locked the account.
    LoginLockout,
    /// Credentials checked and accepted.
    LoginSuccess,
    /// Attempt rejected up front because the account was already locked.
    LoginRejectedLocked,
    /// Attempt rejected up front by the rate limiter.
    LoginRateLimited,
}

/// One audit record. Optional fields are omitted when unknown.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub kind: AuditKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AuditEvent {
    pub fn new(kind: AuditKind) -> Self {
        Self {
            kind,
            username: None,
            ip: None,
            success: matches!(kind, AuditKind::LoginSuccess),
            details: None,
        }
    }

    pub fn username(mut self, username: &str) -> Self {
        self.username = Some(username.to_string());
        self
    }

    pub fn ip(mut self, ip: &str) -> Self {
        self.ip = Some(ip.to_string());
        self
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit sink unavailable: {0}")]
    Unavailable(String),
}

/// Destination for audit records. Implementations must not block on I/O for
/// longer than their own internal bound; callers treat failures as non-fatal.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent) -> Result<(), AuditError>;
}

/// Audit sink that writes to the `tracing` stream.
///
/// Log lines are a non-durable channel, so username and IP are masked here.
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        let username = event
            .username
            .as_deref()
            .map(mask_username)
            .unwrap_or_else(|| "-".to_string());
        let ip = event
            .ip
            .as_deref()
            .map(mask_ip)
            .unwrap_or_else(|| "-".to_string());
        info!(
            target: "audit",
            kind = ?event.kind,
            %username,
            %ip,
            success = event.success,
            details = event.details.as_deref().unwrap_or("-"),
            "login audit event"
        );
        Ok(())
    }
}

/// Audit sink that drops everything. Useful in tests and embedded setups.
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _event: AuditEvent) -> Result<(), AuditError> {
        Ok(())
    }
}

/// Mask all but the first two characters of a username.
pub fn mask_username(username: &str) -> String {
    let visible: String = username.chars().take(2).collect();
    let hidden = username.chars().count().saturating_sub(2);
    format!("{}{}", visible, "*".repeat(hidden))
}

/// Mask all but the first two octets of an IPv4 address. Anything that does
/// not look like dotted-quad is masked entirely.
pub fn mask_ip(ip: &str) -> String {
    let octets: Vec<&str> = ip.split('.').collect();
    if octets.len() == 4 {
        format!("{}.{}.*.*", octets[0], octets[1])
    } else {
        "*".repeat(ip.len())
    }
}
