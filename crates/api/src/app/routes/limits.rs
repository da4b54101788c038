//! Per-tenant limit status for dashboard rendering.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::IntoResponse,
    Json,
};

use opsledger_authz::{
    resolve_outcome, usage_percentage, Decision, LimitKind, RoleOutcome, SOFT_WARNING_PERCENT,
};
use opsledger_core::TenantId;

use crate::app::routes::common;
use crate::app::{errors, AppServices};
use crate::context::CredentialContext;

/// GET /tenants/:tenant_id/limits
pub async fn limits(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cred): Extension<CredentialContext>,
    Path(tenant_id): Path<TenantId>,
) -> axum::response::Response {
    let actor = match common::load_actor(&services, &cred).await {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    // Any effective role may read its own tenant's limit status.
    let impersonating = services
        .registry
        .is_impersonating(actor.actor_id, tenant_id);
    if let RoleOutcome::Denied(decision) = resolve_outcome(&actor, tenant_id, impersonating) {
        return errors::decision_response(&decision);
    }

    let subscription = match services.subscriptions.get(tenant_id).await {
        Ok(Some(subscription)) => subscription,
        Ok(None) => {
            return errors::decision_response(&Decision::unavailable(
                "subscription record missing for tenant",
            ))
        }
        Err(err) => return errors::decision_response(&Decision::unavailable(err.to_string())),
    };

    let plan_limits = services.gate.table().limits(subscription.plan);

    let mut entries = Vec::with_capacity(LimitKind::ALL.len());
    for kind in LimitKind::ALL {
        let current = match services.usage.current(tenant_id, kind).await {
            Ok(current) => current,
            Err(err) => return errors::decision_response(&Decision::unavailable(err.to_string())),
        };

        let limit = plan_limits.limit_for(kind);
        let percentage = usage_percentage(current, limit);

        entries.push(serde_json::json!({
            "kind": kind,
            "current": current,
            "limit": percentage.map(|_| limit),
            "percentage": percentage,
            "warning": percentage.is_some_and(|p| p >= SOFT_WARNING_PERCENT),
        }));
    }

    Json(serde_json::json!({
        "plan": subscription.plan,
        "status": subscription.status,
        "limits": entries,
    }))
    .into_response()
}
