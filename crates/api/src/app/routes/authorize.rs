//! UX-path authorization probe and decision explanation.
//!
//! The probe runs the same pipeline as the boundary but reads overrides
//! through the TTL cache — its answers exist so clients can avoid rendering
//! controls the boundary would reject. Nothing here gates a mutation.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    response::IntoResponse,
    Json,
};

use opsledger_authz::{
    find_override, matrix, resolve_role, Decision, EffectiveRole, LimitCheck, LimitKind,
    SubscriptionGate,
};

use crate::app::routes::common;
use crate::app::{dto, errors, AppServices};
use crate::context::CredentialContext;

/// POST /authorize — advisory decision for the requesting actor.
pub async fn authorize(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cred): Extension<CredentialContext>,
    Json(body): Json<dto::AuthorizeRequest>,
) -> axum::response::Response {
    let actor = match common::load_actor(&services, &cred).await {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    let impersonating = services
        .registry
        .is_impersonating(actor.actor_id, body.tenant_id);

    let role_decision = services
        .resolver
        .check_permission(&actor, body.tenant_id, body.permission, impersonating)
        .await;

    let decision = gate_decision(&services, role_decision, &body).await;
    errors::decision_response(&decision)
}

/// GET /authorize/explain — the decision plus the evidence behind it.
pub async fn explain(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cred): Extension<CredentialContext>,
    Query(query): Query<dto::AuthorizeRequest>,
) -> axum::response::Response {
    let actor = match common::load_actor(&services, &cred).await {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    let impersonating = services
        .registry
        .is_impersonating(actor.actor_id, query.tenant_id);
    let effective_role = resolve_role(&actor, query.tenant_id, impersonating);

    let role_decision = services
        .resolver
        .check_permission(&actor, query.tenant_id, query.permission, impersonating)
        .await;
    let decision = gate_decision(&services, role_decision, &query).await;

    let matched_override = match services.cache.get(query.tenant_id).await {
        Ok(overrides) => match effective_role {
            EffectiveRole::Org(role) => {
                find_override(&overrides, role, query.permission).copied()
            }
            _ => None,
        },
        Err(_) => None,
    };

    let matrix_default = match effective_role {
        EffectiveRole::Org(role) => Some(matrix::default_allows(
            query.permission.module,
            query.permission.action,
            role,
        )),
        _ => None,
    };

    let required_plan = query
        .feature
        .and_then(|feature| services.gate.table().min_plan_for(feature));

    Json(serde_json::json!({
        "decision": decision,
        "effective_role": effective_role,
        "matched_override": matched_override,
        "matrix_default": matrix_default,
        "explicit_grant_required": query.permission.module.requires_explicit_grant(),
        "required_plan": required_plan,
    }))
    .into_response()
}

/// Subscription/feature/limit stages over an already-made role decision.
async fn gate_decision(
    services: &AppServices,
    role_decision: Decision,
    request: &dto::AuthorizeRequest,
) -> Decision {
    if !role_decision.is_allowed() {
        return role_decision;
    }

    let subscription = match services.subscriptions.get(request.tenant_id).await {
        Ok(Some(subscription)) => subscription,
        Ok(None) => return Decision::unavailable("subscription record missing for tenant"),
        Err(err) => return Decision::unavailable(err.to_string()),
    };

    let now = services.clock.now();
    if let Err(denial) =
        services
            .gate
            .check_access(&subscription, request.permission, request.feature, now)
    {
        return denial;
    }

    let mut warning = None;
    if let Some(kind) =
        LimitKind::for_creation(request.permission.module, request.permission.action)
    {
        let current = match services.usage.current(request.tenant_id, kind).await {
            Ok(current) => current,
            Err(err) => return Decision::unavailable(err.to_string()),
        };
        match services
            .gate
            .check_creation_limit(subscription.plan, kind, current)
        {
            LimitCheck::Exceeded { current, limit } => {
                return SubscriptionGate::limit_denial(kind, current, limit);
            }
            LimitCheck::Warning(w) => warning = Some(w),
            LimitCheck::Within => {}
        }
    }

    role_decision
        .with_plan(subscription.plan)
        .with_warning(warning)
}
