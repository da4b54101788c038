//! Backing-store seams read fresh by the boundary enforcer.
//!
//! These are the engine's only I/O surfaces. Every method is a single
//! backing-store round trip; none of them may be cached at the boundary.

use async_trait::async_trait;
use std::sync::Arc;

use opsledger_core::{ActorId, TenantId};

use crate::{Actor, LimitKind, StoreError, Subscription};

/// Identity re-derivation seam.
///
/// The boundary never trusts a client-asserted role or tenant id: the actor
/// and its memberships are always looked up server-side by the credential's
/// subject.
#[async_trait]
pub trait ActorDirectory: Send + Sync {
    async fn lookup(&self, actor_id: ActorId) -> Result<Option<Actor>, StoreError>;
}

#[async_trait]
impl<S> ActorDirectory for Arc<S>
where
    S: ActorDirectory + ?Sized,
{
    async fn lookup(&self, actor_id: ActorId) -> Result<Option<Actor>, StoreError> {
        (**self).lookup(actor_id).await
    }
}

/// Subscription record store. Exactly one record per tenant.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn get(&self, tenant_id: TenantId) -> Result<Option<Subscription>, StoreError>;
}

#[async_trait]
impl<S> SubscriptionStore for Arc<S>
where
    S: SubscriptionStore + ?Sized,
{
    async fn get(&self, tenant_id: TenantId) -> Result<Option<Subscription>, StoreError> {
        (**self).get(tenant_id).await
    }
}

/// Current usage counts for limit-gated resources.
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Current count for a countable resource.
    async fn current(&self, tenant_id: TenantId, kind: LimitKind) -> Result<u64, StoreError>;

    /// Record consumption after a creation passes the gate.
    async fn record(
        &self,
        tenant_id: TenantId,
        kind: LimitKind,
        units: u64,
    ) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> UsageStore for Arc<S>
where
    S: UsageStore + ?Sized,
{
    async fn current(&self, tenant_id: TenantId, kind: LimitKind) -> Result<u64, StoreError> {
        (**self).current(tenant_id, kind).await
    }

    async fn record(
        &self,
        tenant_id: TenantId,
        kind: LimitKind,
        units: u64,
    ) -> Result<(), StoreError> {
        (**self).record(tenant_id, kind, units).await
    }
}
