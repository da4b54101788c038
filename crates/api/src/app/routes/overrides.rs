//! Override administration (owner-only mutation path).
//!
//! Every mutation invalidates the tenant's permission cache entry before the
//! response is sent, so an admin who writes and immediately re-reads
//! observes the new state.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use opsledger_authz::{AuditEvent, Decision, OrgRole, PermissionKey, PermissionOverride};
use opsledger_core::TenantId;

use crate::app::routes::common;
use crate::app::{dto, errors, AppServices};
use crate::context::CredentialContext;

/// GET /tenants/:tenant_id/overrides
pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cred): Extension<CredentialContext>,
    Path(tenant_id): Path<TenantId>,
) -> axum::response::Response {
    let actor = match common::load_actor(&services, &cred).await {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    if let Err(response) = common::require_owner(&services, &actor, tenant_id) {
        return response;
    }

    // Admin views read the store directly; staleness here would make the
    // admin UI lie about what was just saved.
    match services.overrides.list_for_tenant(tenant_id).await {
        Ok(rows) => Json(serde_json::json!({ "overrides": rows })).into_response(),
        Err(err) => errors::decision_response(&Decision::unavailable(err.to_string())),
    }
}

/// PUT /tenants/:tenant_id/overrides
pub async fn put(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cred): Extension<CredentialContext>,
    Path(tenant_id): Path<TenantId>,
    Json(body): Json<dto::OverridePutRequest>,
) -> axum::response::Response {
    let actor = match common::load_actor(&services, &cred).await {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    if let Err(response) = common::require_owner(&services, &actor, tenant_id) {
        return response;
    }

    let row = PermissionOverride {
        tenant_id,
        role: body.role,
        key: body.permission,
        is_enabled: body.is_enabled,
    };

    if let Err(err) = services.overrides.upsert(row).await {
        return errors::decision_response(&Decision::unavailable(err.to_string()));
    }

    services.audit.record(&AuditEvent::OverrideChanged {
        tenant_id,
        changed_by: actor.actor_id,
        role: body.role,
        key: body.permission,
        is_enabled: Some(body.is_enabled),
        at: services.clock.now(),
    });

    // The mutation is not visible until the cache entry is gone.
    services.cache.invalidate(tenant_id).await;

    (StatusCode::OK, Json(serde_json::json!({ "saved": true }))).into_response()
}

/// DELETE /tenants/:tenant_id/overrides/:role/:permission
pub async fn remove(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cred): Extension<CredentialContext>,
    Path((tenant_id, role, permission)): Path<(TenantId, OrgRole, PermissionKey)>,
) -> axum::response::Response {
    let actor = match common::load_actor(&services, &cred).await {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    if let Err(response) = common::require_owner(&services, &actor, tenant_id) {
        return response;
    }

    let deleted = match services.overrides.delete(tenant_id, role, permission).await {
        Ok(deleted) => deleted,
        Err(err) => return errors::decision_response(&Decision::unavailable(err.to_string())),
    };

    if deleted {
        services.audit.record(&AuditEvent::OverrideChanged {
            tenant_id,
            changed_by: actor.actor_id,
            role,
            key: permission,
            is_enabled: None,
            at: services.clock.now(),
        });
        services.cache.invalidate(tenant_id).await;
    }

    (
        StatusCode::OK,
        Json(serde_json::json!({ "deleted": deleted })),
    )
        .into_response()
}
