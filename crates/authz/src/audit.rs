//! Audit events for security-relevant engine operations.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use opsledger_core::{ActorId, TenantId};

use crate::{OrgRole, PermissionKey};

/// Why an impersonation session ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpersonationEndReason {
    /// The operator explicitly ended the session.
    Manual,
    /// The bounded session duration elapsed.
    Expired,
}

/// A security-relevant event the engine must leave a trail for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum AuditEvent {
    ImpersonationStarted {
        operator_id: ActorId,
        tenant_id: TenantId,
        at: DateTime<Utc>,
    },
    ImpersonationEnded {
        operator_id: ActorId,
        tenant_id: TenantId,
        at: DateTime<Utc>,
        reason: ImpersonationEndReason,
    },
    /// An override row was written (`is_enabled = Some`) or deleted (`None`).
    OverrideChanged {
        tenant_id: TenantId,
        changed_by: ActorId,
        role: OrgRole,
        key: PermissionKey,
        is_enabled: Option<bool>,
        at: DateTime<Utc>,
    },
}

impl AuditEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            AuditEvent::ImpersonationStarted { .. } => "authz.impersonation.started",
            AuditEvent::ImpersonationEnded { .. } => "authz.impersonation.ended",
            AuditEvent::OverrideChanged { .. } => "authz.override.changed",
        }
    }
}

/// Destination for audit events.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: &AuditEvent);
}

impl<S> AuditSink for Arc<S>
where
    S: AuditSink + ?Sized,
{
    fn record(&self, event: &AuditEvent) {
        (**self).record(event)
    }
}

/// Default sink: structured tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &AuditEvent) {
        let payload = serde_json::to_string(event).unwrap_or_else(|_| "<unserializable>".into());
        tracing::info!(event_type = event.event_type(), payload = %payload, "audit");
    }
}

/// Sink that retains events in memory, for tests.
#[derive(Debug, Default)]
pub struct RecordingAuditSink {
    events: std::sync::Mutex<Vec<AuditEvent>>,
}

impl RecordingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl AuditSink for RecordingAuditSink {
    fn record(&self, event: &AuditEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
