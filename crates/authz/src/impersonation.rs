//! Impersonation sessions: bounded, audited synthetic-owner grants.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use opsledger_core::{ActorId, Clock, DomainError, DomainResult, TenantId};

use crate::{Actor, AuditEvent, AuditSink, ImpersonationEndReason};

/// Hard ceiling on session lifetime. Enforced at every lookup, not advisory:
/// a session past this age is treated as ended wherever it is observed.
pub const MAX_SESSION_MINUTES: i64 = 60;

/// An active (or historical) impersonation grant for one tenant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct ImpersonationSession {
    pub operator_id: ActorId,
    pub tenant_id: TenantId,
    pub started_at: DateTime<Utc>,
    pub active: bool,
}

impl ImpersonationSession {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.started_at + Duration::minutes(MAX_SESSION_MINUTES)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.active && !self.is_expired(now)
    }
}

/// In-memory registry of active impersonation sessions.
///
/// An operator holds at most one session at a time; starting a second
/// requires explicitly ending the first. Start, manual end, and observed
/// expiry all emit audit events.
pub struct ImpersonationRegistry {
    clock: Arc<dyn Clock>,
    audit: Arc<dyn AuditSink>,
    sessions: RwLock<HashMap<ActorId, ImpersonationSession>>,
}

impl ImpersonationRegistry {
    pub fn new(clock: Arc<dyn Clock>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            clock,
            audit,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a session for `tenant_id`.
    ///
    /// Only platform operators may impersonate, and only with no other
    /// session active.
    pub fn start(&self, operator: &Actor, tenant_id: TenantId) -> DomainResult<ImpersonationSession> {
        if !operator.is_platform_operator {
            return Err(DomainError::Unauthorized);
        }
        if self.active_session(operator.actor_id).is_some() {
            return Err(DomainError::invariant(
                "an impersonation session is already active; end it first",
            ));
        }

        let session = ImpersonationSession {
            operator_id: operator.actor_id,
            tenant_id,
            started_at: self.clock.now(),
            active: true,
        };

        if let Ok(mut sessions) = self.sessions.write() {
            sessions.insert(operator.actor_id, session);
        }

        self.audit.record(&AuditEvent::ImpersonationStarted {
            operator_id: operator.actor_id,
            tenant_id,
            at: session.started_at,
        });

        Ok(session)
    }

    /// Explicitly end the operator's session.
    pub fn end(&self, operator_id: ActorId) -> DomainResult<ImpersonationSession> {
        let removed = self
            .sessions
            .write()
            .ok()
            .and_then(|mut sessions| sessions.remove(&operator_id));

        let Some(session) = removed else {
            return Err(DomainError::invariant("no impersonation session to end"));
        };

        let now = self.clock.now();
        let reason = if session.is_expired(now) {
            ImpersonationEndReason::Expired
        } else {
            ImpersonationEndReason::Manual
        };
        self.audit.record(&AuditEvent::ImpersonationEnded {
            operator_id,
            tenant_id: session.tenant_id,
            at: now,
            reason,
        });

        Ok(session)
    }

    /// The operator's session, if still within its bounded lifetime.
    ///
    /// An expired session is removed and its end is audited at the point of
    /// observation.
    pub fn active_session(&self, operator_id: ActorId) -> Option<ImpersonationSession> {
        let now = self.clock.now();

        let session = self
            .sessions
            .read()
            .ok()
            .and_then(|sessions| sessions.get(&operator_id).copied())?;

        if session.is_active(now) {
            return Some(session);
        }

        if let Ok(mut sessions) = self.sessions.write() {
            sessions.remove(&operator_id);
        }
        self.audit.record(&AuditEvent::ImpersonationEnded {
            operator_id,
            tenant_id: session.tenant_id,
            at: now,
            reason: ImpersonationEndReason::Expired,
        });

        None
    }

    /// Whether the operator currently impersonates exactly this tenant.
    pub fn is_impersonating(&self, operator_id: ActorId, tenant_id: TenantId) -> bool {
        self.active_session(operator_id)
            .is_some_and(|s| s.tenant_id == tenant_id)
    }
}
