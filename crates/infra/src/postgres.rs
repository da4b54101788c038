//! Postgres-backed stores for overrides and subscriptions.
//!
//! Every query includes `tenant_id` in the WHERE clause, making cross-tenant
//! reads impossible at the query layer. Row-Level Security can be layered on
//! the same schema as an additional defense.
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError | Scenario |
//! |------------|-----------|----------|
//! | Database (unique violation `23505`) | `Rejected` | Concurrent upsert race (resolved by `ON CONFLICT`, should not surface) |
//! | Database (other) | `Rejected` | Constraint or data fault |
//! | PoolClosed / PoolTimedOut / Io | `Unavailable` | Backing store unreachable |
//! | Other | `Unavailable` | Network errors, connection failures |
//!
//! Callers fail closed on either variant; the split only affects logging.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::instrument;

use opsledger_authz::{
    OrgRole, OverrideStore, PermissionKey, PermissionOverride, Plan, StoreError, Subscription,
    SubscriptionStatus, SubscriptionStore,
};
use opsledger_core::TenantId;

/// Schema for the engine's two persistent tables.
///
/// Applied idempotently by [`ensure_schema`]; production deployments run the
/// same statements through their migration tooling.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS permission_overrides (
    tenant_id      UUID    NOT NULL,
    role           TEXT    NOT NULL,
    permission_key TEXT    NOT NULL,
    is_enabled     BOOLEAN NOT NULL,
    PRIMARY KEY (tenant_id, role, permission_key)
);

CREATE TABLE IF NOT EXISTS subscriptions (
    tenant_id     UUID        PRIMARY KEY,
    plan          TEXT        NOT NULL,
    status        TEXT        NOT NULL,
    trial_ends_at TIMESTAMPTZ NULL
);
"#;

/// Create the engine tables if they do not exist.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    for statement in SCHEMA.split(';').filter(|s| !s.trim().is_empty()) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
    }
    Ok(())
}

/// Postgres-backed permission override store.
///
/// Uniqueness on `(tenant_id, role, permission_key)` is enforced by the
/// primary key; `upsert` resolves races with `ON CONFLICT DO UPDATE`
/// (last-write-wins, which is sufficient for idempotent boolean flags).
#[derive(Debug, Clone)]
pub struct PostgresOverrideStore {
    pool: Arc<PgPool>,
}

impl PostgresOverrideStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl OverrideStore for PostgresOverrideStore {
    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    async fn list_for_tenant(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<PermissionOverride>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT role, permission_key, is_enabled
            FROM permission_overrides
            WHERE tenant_id = $1
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_for_tenant", e))?;

        let mut overrides = Vec::with_capacity(rows.len());
        for row in rows {
            let role: String = row
                .try_get("role")
                .map_err(|e| map_sqlx_error("list_for_tenant", e))?;
            let key: String = row
                .try_get("permission_key")
                .map_err(|e| map_sqlx_error("list_for_tenant", e))?;
            let is_enabled: bool = row
                .try_get("is_enabled")
                .map_err(|e| map_sqlx_error("list_for_tenant", e))?;

            overrides.push(PermissionOverride {
                tenant_id,
                role: OrgRole::from_str(&role)
                    .map_err(|e| StoreError::Rejected(e.to_string()))?,
                key: PermissionKey::from_str(&key)
                    .map_err(|e| StoreError::Rejected(e.to_string()))?,
                is_enabled,
            });
        }

        Ok(overrides)
    }

    #[instrument(skip(self), fields(tenant_id = %row.tenant_id, key = %row.key))]
    async fn upsert(&self, row: PermissionOverride) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO permission_overrides (tenant_id, role, permission_key, is_enabled)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (tenant_id, role, permission_key)
            DO UPDATE SET is_enabled = excluded.is_enabled
            "#,
        )
        .bind(row.tenant_id.as_uuid())
        .bind(row.role.as_str())
        .bind(row.key.to_string())
        .bind(row.is_enabled)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("upsert", e))?;

        Ok(())
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, key = %key))]
    async fn delete(
        &self,
        tenant_id: TenantId,
        role: OrgRole,
        key: PermissionKey,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM permission_overrides
            WHERE tenant_id = $1
              AND role = $2
              AND permission_key = $3
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role.as_str())
        .bind(key.to_string())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("delete", e))?;

        Ok(result.rows_affected() > 0)
    }
}

/// Postgres-backed subscription store.
#[derive(Debug, Clone)]
pub struct PostgresSubscriptionStore {
    pool: Arc<PgPool>,
}

impl PostgresSubscriptionStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl SubscriptionStore for PostgresSubscriptionStore {
    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    async fn get(&self, tenant_id: TenantId) -> Result<Option<Subscription>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT plan, status, trial_ends_at
            FROM subscriptions
            WHERE tenant_id = $1
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("subscription_get", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let plan: String = row
            .try_get("plan")
            .map_err(|e| map_sqlx_error("subscription_get", e))?;
        let status: String = row
            .try_get("status")
            .map_err(|e| map_sqlx_error("subscription_get", e))?;
        let trial_ends_at: Option<DateTime<Utc>> = row
            .try_get("trial_ends_at")
            .map_err(|e| map_sqlx_error("subscription_get", e))?;

        Ok(Some(Subscription {
            plan: Plan::from_str(&plan).map_err(|e| StoreError::Rejected(e.to_string()))?,
            status: SubscriptionStatus::from_str(&status)
                .map_err(|e| StoreError::Rejected(e.to_string()))?,
            trial_ends_at,
        }))
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => StoreError::Rejected(format!(
            "database error in {}: {}",
            operation,
            db_err.message()
        )),
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool timed out in {operation}"))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("io error in {operation}: {e}")),
        other => StoreError::Unavailable(format!("error in {operation}: {other}")),
    }
}
