//! In-memory store implementations for tests/dev.
//!
//! Not optimized for performance. All maps are tenant-keyed so cross-tenant
//! reads are structurally impossible.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use opsledger_authz::{
    Actor, ActorDirectory, LimitKind, OrgRole, OverrideStore, PermissionKey, PermissionOverride,
    StoreError, Subscription, SubscriptionStore, UsageStore,
};
use opsledger_core::{ActorId, TenantId};

fn poisoned(what: &str) -> StoreError {
    StoreError::Unavailable(format!("{what} lock poisoned"))
}

/// In-memory actor directory.
#[derive(Debug, Default)]
pub struct InMemoryActorDirectory {
    actors: RwLock<HashMap<ActorId, Actor>>,
}

impl InMemoryActorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an actor record.
    pub fn insert(&self, actor: Actor) {
        if let Ok(mut actors) = self.actors.write() {
            actors.insert(actor.actor_id, actor);
        }
    }
}

#[async_trait]
impl ActorDirectory for InMemoryActorDirectory {
    async fn lookup(&self, actor_id: ActorId) -> Result<Option<Actor>, StoreError> {
        let actors = self.actors.read().map_err(|_| poisoned("actor directory"))?;
        Ok(actors.get(&actor_id).cloned())
    }
}

/// In-memory override store, unique on `(tenant_id, role, key)`.
#[derive(Debug, Default)]
pub struct InMemoryOverrideStore {
    rows: RwLock<HashMap<(TenantId, OrgRole, PermissionKey), bool>>,
}

impl InMemoryOverrideStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OverrideStore for InMemoryOverrideStore {
    async fn list_for_tenant(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<PermissionOverride>, StoreError> {
        let rows = self.rows.read().map_err(|_| poisoned("override store"))?;
        Ok(rows
            .iter()
            .filter(|((t, _, _), _)| *t == tenant_id)
            .map(|((t, role, key), is_enabled)| PermissionOverride {
                tenant_id: *t,
                role: *role,
                key: *key,
                is_enabled: *is_enabled,
            })
            .collect())
    }

    async fn upsert(&self, row: PermissionOverride) -> Result<(), StoreError> {
        let mut rows = self.rows.write().map_err(|_| poisoned("override store"))?;
        rows.insert((row.tenant_id, row.role, row.key), row.is_enabled);
        Ok(())
    }

    async fn delete(
        &self,
        tenant_id: TenantId,
        role: OrgRole,
        key: PermissionKey,
    ) -> Result<bool, StoreError> {
        let mut rows = self.rows.write().map_err(|_| poisoned("override store"))?;
        Ok(rows.remove(&(tenant_id, role, key)).is_some())
    }
}

/// In-memory subscription store (one record per tenant).
#[derive(Debug, Default)]
pub struct InMemorySubscriptionStore {
    records: RwLock<HashMap<TenantId, Subscription>>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a tenant's subscription record.
    pub fn set(&self, tenant_id: TenantId, subscription: Subscription) {
        if let Ok(mut records) = self.records.write() {
            records.insert(tenant_id, subscription);
        }
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn get(&self, tenant_id: TenantId) -> Result<Option<Subscription>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| poisoned("subscription store"))?;
        Ok(records.get(&tenant_id).copied())
    }
}

/// In-memory usage counters.
#[derive(Debug, Default)]
pub struct InMemoryUsageStore {
    counts: RwLock<HashMap<(TenantId, LimitKind), u64>>,
}

impl InMemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a counter to an absolute value (test seeding).
    pub fn set(&self, tenant_id: TenantId, kind: LimitKind, count: u64) {
        if let Ok(mut counts) = self.counts.write() {
            counts.insert((tenant_id, kind), count);
        }
    }
}

#[async_trait]
impl UsageStore for InMemoryUsageStore {
    async fn current(&self, tenant_id: TenantId, kind: LimitKind) -> Result<u64, StoreError> {
        let counts = self.counts.read().map_err(|_| poisoned("usage store"))?;
        Ok(counts.get(&(tenant_id, kind)).copied().unwrap_or(0))
    }

    async fn record(
        &self,
        tenant_id: TenantId,
        kind: LimitKind,
        units: u64,
    ) -> Result<(), StoreError> {
        let mut counts = self.counts.write().map_err(|_| poisoned("usage store"))?;
        *counts.entry((tenant_id, kind)).or_insert(0) += units;
        Ok(())
    }
}
