//! Read-through permission override cache (UX path only).
//!
//! Keyed by tenant, TTL-bounded, with coarse whole-tenant invalidation: a
//! write to any override for a tenant drops that tenant's entire cached set.
//! Entries are replaced whole, never mutated in place, so concurrent readers
//! are safe. The boundary enforcer must not read through this cache —
//! staleness there is a security window, not a UX blemish.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use opsledger_core::{Clock, TenantId};

use crate::{OverrideStore, PermissionOverride, StoreError};

/// Default cache TTL. Staleness up to this window is acceptable for
/// UX-path decisions only.
pub const DEFAULT_TTL_SECONDS: i64 = 30;

#[derive(Debug, Clone)]
struct CacheEntry {
    fetched_at: DateTime<Utc>,
    overrides: Arc<Vec<PermissionOverride>>,
}

/// Read-through, invalidate-on-write cache over the override store.
pub struct PermissionCache {
    store: Arc<dyn OverrideStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entries: RwLock<HashMap<TenantId, CacheEntry>>,
}

impl PermissionCache {
    pub fn new(store: Arc<dyn OverrideStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(store, clock, Duration::seconds(DEFAULT_TTL_SECONDS))
    }

    pub fn with_ttl(store: Arc<dyn OverrideStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            store,
            clock,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// The tenant's override set, refetching on expiry or after invalidation.
    pub async fn get(&self, tenant_id: TenantId) -> Result<Arc<Vec<PermissionOverride>>, StoreError> {
        let now = self.clock.now();

        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(&tenant_id) {
                if now - entry.fetched_at < self.ttl {
                    return Ok(Arc::clone(&entry.overrides));
                }
            }
        }

        let fresh = Arc::new(self.store.list_for_tenant(tenant_id).await?);

        let mut entries = self.entries.write().await;
        entries.insert(
            tenant_id,
            CacheEntry {
                fetched_at: now,
                overrides: Arc::clone(&fresh),
            },
        );

        Ok(fresh)
    }

    /// Drop the tenant's cached set.
    ///
    /// Mutation paths call this synchronously before reporting the write as
    /// visible, so a write-then-read-own-write observes the new state. Other
    /// readers may still observe staleness up to the TTL.
    pub async fn invalidate(&self, tenant_id: TenantId) {
        let mut entries = self.entries.write().await;
        entries.remove(&tenant_id);
    }
}
