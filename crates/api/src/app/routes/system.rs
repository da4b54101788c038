use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use opsledger_authz::operating_context;

use crate::app::routes::common;
use crate::app::AppServices;
use crate::context::CredentialContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cred): Extension<CredentialContext>,
) -> axum::response::Response {
    let actor = match common::load_actor(&services, &cred).await {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    let context = operating_context(&actor, &services.registry);

    Json(serde_json::json!({
        "actor_id": actor.actor_id.to_string(),
        "is_platform_operator": actor.is_platform_operator,
        "operating_context": context,
        "memberships": actor.memberships(),
    }))
    .into_response()
}
