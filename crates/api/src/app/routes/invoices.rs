//! Representative guarded business route.
//!
//! The invoice documents themselves live in the invoicing service; these
//! handlers demonstrate the full boundary pipeline a business route runs:
//! context-isolation guard first, then the authoritative enforcement, then
//! usage recording for creations.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use opsledger_authz::{
    guard_table_read, operating_context, Action, BusinessTable, Decision, EnforceRequest, Module,
    PermissionKey,
};
use opsledger_core::TenantId;

use crate::app::routes::common;
use crate::app::{dto, errors, AppServices};
use crate::context::CredentialContext;

/// GET /tenants/:tenant_id/invoices
pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cred): Extension<CredentialContext>,
    Path(tenant_id): Path<TenantId>,
) -> axum::response::Response {
    let actor = match common::load_actor(&services, &cred).await {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    // Context isolation runs before any role logic: the invoices table is
    // unreachable from the console context no matter what roles say.
    let context = operating_context(&actor, &services.registry);
    if let Err(denial) = guard_table_read(context, BusinessTable::Invoices, tenant_id) {
        return errors::decision_response(&denial);
    }

    let request = EnforceRequest {
        tenant_id,
        permission: PermissionKey::new(Module::Invoices, Action::View),
        feature: None,
    };
    let decision = services.enforcer.enforce_for_actor(&actor, &request).await;
    if !decision.is_allowed() {
        return errors::decision_response(&decision);
    }

    // Document retrieval is owned by the invoicing read model.
    Json(serde_json::json!({
        "authorization": decision,
        "invoices": [],
    }))
    .into_response()
}

/// POST /tenants/:tenant_id/invoices
pub async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cred): Extension<CredentialContext>,
    Path(tenant_id): Path<TenantId>,
    Json(body): Json<dto::CreateInvoiceRequest>,
) -> axum::response::Response {
    let actor = match common::load_actor(&services, &cred).await {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    let context = operating_context(&actor, &services.registry);
    if let Err(denial) = guard_table_read(context, BusinessTable::Invoices, tenant_id) {
        return errors::decision_response(&denial);
    }

    let request = EnforceRequest {
        tenant_id,
        permission: PermissionKey::new(Module::Invoices, Action::Create),
        feature: None,
    };
    let decision = services.enforcer.enforce_for_actor(&actor, &request).await;
    if !decision.is_allowed() {
        return errors::decision_response(&decision);
    }

    if let Err(err) = services
        .enforcer
        .record_creation(tenant_id, request.permission)
        .await
    {
        tracing::warn!(%tenant_id, error = %err, "usage recording failed after creation");
    }

    let warning = match &decision {
        Decision::Allowed { warning, .. } => *warning,
        Decision::Denied { .. } => None,
    };

    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "created": true,
            "reference": body.reference,
            "warning": warning,
        })),
    )
        .into_response()
}
