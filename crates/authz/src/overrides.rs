//! Per-tenant permission overrides and their store seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use opsledger_core::TenantId;

use crate::{OrgRole, PermissionKey};

/// An explicit per-tenant, per-role exception to the permission matrix.
///
/// Presence of a row overrides the matrix default for that exact tuple, in
/// both directions: `is_enabled = false` beats a matrix allow, and
/// `is_enabled = true` beats a matrix deny.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionOverride {
    pub tenant_id: TenantId,
    pub role: OrgRole,
    pub key: PermissionKey,
    pub is_enabled: bool,
}

/// Find the override for an exact (role, key) tuple in a tenant's set.
pub fn find_override(
    overrides: &[PermissionOverride],
    role: OrgRole,
    key: PermissionKey,
) -> Option<&PermissionOverride> {
    overrides.iter().find(|o| o.role == role && o.key == key)
}

/// Backing-store failure.
///
/// Store errors never fail open: callers translate them into an
/// `evaluation_unavailable` denial.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store could not be reached (transient).
    #[error("backing store unavailable: {0}")]
    Unavailable(String),

    /// The store rejected the operation (constraint or data fault).
    #[error("store rejected operation: {0}")]
    Rejected(String),
}

/// Persistence seam for permission overrides.
///
/// Implementations must enforce uniqueness on `(tenant_id, role, key)`:
/// `upsert` replaces an existing row for the same tuple.
#[async_trait]
pub trait OverrideStore: Send + Sync {
    /// All override rows for a tenant.
    async fn list_for_tenant(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<PermissionOverride>, StoreError>;

    /// Insert or replace the row for `(tenant_id, role, key)`.
    async fn upsert(&self, row: PermissionOverride) -> Result<(), StoreError>;

    /// Delete the row for the exact tuple. Returns whether a row existed.
    async fn delete(
        &self,
        tenant_id: TenantId,
        role: OrgRole,
        key: PermissionKey,
    ) -> Result<bool, StoreError>;
}

#[async_trait]
impl<S> OverrideStore for Arc<S>
where
    S: OverrideStore + ?Sized,
{
    async fn list_for_tenant(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<PermissionOverride>, StoreError> {
        (**self).list_for_tenant(tenant_id).await
    }

    async fn upsert(&self, row: PermissionOverride) -> Result<(), StoreError> {
        (**self).upsert(row).await
    }

    async fn delete(
        &self,
        tenant_id: TenantId,
        role: OrgRole,
        key: PermissionKey,
    ) -> Result<bool, StoreError> {
        (**self).delete(tenant_id, role, key).await
    }
}
