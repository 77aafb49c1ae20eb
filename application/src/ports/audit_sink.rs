//! Port for the audit trail.
//!
//! Every state transition, consolidation and proxy mutation emits one
//! [`AuditEvent`]. Recording is synchronous and fallible, but callers treat
//! it as best-effort: a failure is logged and never undoes the operation
//! that produced the event.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures the
//! authoritative record in a machine-readable format (e.g. JSONL).

use chrono::{DateTime, Utc};
use gavel_domain::{ActorContext, TenantId, UserId};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// A structured audit event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEvent {
    /// Action identifier (e.g., "motion_opened", "proxy_revoked").
    pub action: &'static str,
    /// Kind of resource acted upon (e.g., "meeting", "motion", "proxy").
    pub resource_type: &'static str,
    pub resource_id: u64,
    pub tenant_id: TenantId,
    pub actor: UserId,
    /// JSON payload with action-specific data.
    pub payload: Value,
    pub at: DateTime<Utc>,
}

impl AuditEvent {
    /// Create an event attributed to `actor` with the current UTC timestamp.
    pub fn new(
        actor: &ActorContext,
        action: &'static str,
        resource_type: &'static str,
        resource_id: u64,
        payload: Value,
    ) -> Self {
        Self {
            action,
            resource_type,
            resource_id,
            tenant_id: actor.tenant_id,
            actor: actor.user_id,
            payload,
            at: Utc::now(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Audit I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Audit serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Audit sink unavailable: {0}")]
    Unavailable(String),
}

/// Port for recording audit events.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &AuditEvent) -> Result<(), AuditError>;
}

/// No-op implementation for tests and when auditing is disabled.
pub struct NoAuditSink;

impl AuditSink for NoAuditSink {
    fn record(&self, _event: &AuditEvent) -> Result<(), AuditError> {
        Ok(())
    }
}
