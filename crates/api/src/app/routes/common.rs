use axum::http::StatusCode;

use opsledger_authz::{resolve_outcome, Actor, Decision, ReasonCode, RoleOutcome};
use opsledger_core::TenantId;

use crate::app::{errors, AppServices};
use crate::context::CredentialContext;

/// Re-derive the actor for a verified credential.
///
/// A valid token whose subject is not provisioned is treated the same as a
/// missing credential.
pub async fn load_actor(
    services: &AppServices,
    cred: &CredentialContext,
) -> Result<Actor, axum::response::Response> {
    match services.directory.lookup(cred.actor_id()).await {
        Ok(Some(actor)) => Ok(actor),
        Ok(None) => Err(errors::json_error(
            StatusCode::UNAUTHORIZED,
            "unknown_principal",
            "credential subject is not provisioned",
        )),
        Err(err) => Err(errors::decision_response(&Decision::unavailable(
            err.to_string(),
        ))),
    }
}

/// Require owner-level access (real or synthetic) for an administrative
/// mutation path.
pub fn require_owner(
    services: &AppServices,
    actor: &Actor,
    tenant_id: TenantId,
) -> Result<(), axum::response::Response> {
    let impersonating = services
        .registry
        .is_impersonating(actor.actor_id, tenant_id);

    match resolve_outcome(actor, tenant_id, impersonating) {
        RoleOutcome::Granted(_) => Ok(()),
        RoleOutcome::Denied(decision) => Err(errors::decision_response(&decision)),
        RoleOutcome::NeedsPolicy(_) => Err(errors::decision_response(&Decision::denied(
            ReasonCode::RoleInsufficient,
            "override administration is restricted to owners",
        ))),
    }
}
