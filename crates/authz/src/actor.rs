//! Actor identity and tenant memberships.

use serde::{Deserialize, Serialize};

use opsledger_core::{ActorId, DomainError, DomainResult, TenantId};

use crate::OrgRole;

/// An actor's membership in a tenant.
///
/// This is an authorization boundary object: it states *which tenant* the
/// actor may act within and the single org role granted there.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantMembership {
    pub tenant_id: TenantId,
    pub role: OrgRole,
}

/// A fully resolved actor for authorization decisions.
///
/// Construction is intentionally decoupled from storage and transport:
/// the boundary derives actors from a directory lookup, never from
/// client-asserted claims.
///
/// # Invariants
/// - At most one membership per tenant.
/// - A platform operator holds no tenant memberships by default; tenant
///   access only ever comes through an audited impersonation session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub actor_id: ActorId,
    pub is_platform_operator: bool,
    memberships: Vec<TenantMembership>,
}

impl Actor {
    /// An ordinary user with no memberships yet.
    pub fn user(actor_id: ActorId) -> Self {
        Self {
            actor_id,
            is_platform_operator: false,
            memberships: Vec::new(),
        }
    }

    /// A platform operator (console access, zero tenant memberships).
    pub fn platform_operator(actor_id: ActorId) -> Self {
        Self {
            actor_id,
            is_platform_operator: true,
            memberships: Vec::new(),
        }
    }

    /// Add a tenant membership, rejecting duplicates for the same tenant.
    pub fn with_membership(mut self, tenant_id: TenantId, role: OrgRole) -> DomainResult<Self> {
        if self.memberships.iter().any(|m| m.tenant_id == tenant_id) {
            return Err(DomainError::invariant(
                "actor already has a membership for this tenant",
            ));
        }
        self.memberships.push(TenantMembership { tenant_id, role });
        Ok(self)
    }

    pub fn membership_for(&self, tenant_id: TenantId) -> Option<&TenantMembership> {
        self.memberships.iter().find(|m| m.tenant_id == tenant_id)
    }

    pub fn memberships(&self) -> &[TenantMembership] {
        &self.memberships
    }
}
