//! Platform-operator console: impersonation session lifecycle.
//!
//! Start and end are explicit operator actions; both are audited by the
//! registry, as is expiry at the bounded ceiling.

use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use opsledger_core::DomainError;

use crate::app::routes::common;
use crate::app::{dto, errors, AppServices};
use crate::context::CredentialContext;

/// POST /console/impersonation
pub async fn start(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cred): Extension<CredentialContext>,
    Json(body): Json<dto::ImpersonationStartRequest>,
) -> axum::response::Response {
    let actor = match common::load_actor(&services, &cred).await {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match services.registry.start(&actor, body.tenant_id) {
        Ok(session) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "session": session })),
        )
            .into_response(),
        Err(DomainError::Unauthorized) => errors::json_error(
            StatusCode::FORBIDDEN,
            "not_platform_operator",
            "impersonation is restricted to platform operators",
        ),
        Err(err) => errors::json_error(StatusCode::CONFLICT, "session_active", err.to_string()),
    }
}

/// DELETE /console/impersonation
pub async fn stop(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cred): Extension<CredentialContext>,
) -> axum::response::Response {
    let actor = match common::load_actor(&services, &cred).await {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match services.registry.end(actor.actor_id) {
        Ok(session) => Json(serde_json::json!({ "ended": session })).into_response(),
        Err(err) => errors::json_error(StatusCode::NOT_FOUND, "no_active_session", err.to_string()),
    }
}
