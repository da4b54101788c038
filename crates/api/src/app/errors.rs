use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use opsledger_authz::{Decision, ReasonCode};

/// HTTP status for a denial reason.
///
/// Only `unauthenticated` maps to 401; every other denial is a 403.
pub fn status_for(reason: ReasonCode) -> StatusCode {
    match reason {
        ReasonCode::Unauthenticated => StatusCode::UNAUTHORIZED,
        _ => StatusCode::FORBIDDEN,
    }
}

/// Render an engine decision as the wire envelope.
///
/// Allow: `{allowed: true, effective_role, plan, warning?}` with 200.
/// Deny: `{allowed: false, reason_code, message, required_plan?}` with
/// 401/403 per the reason.
pub fn decision_response(decision: &Decision) -> axum::response::Response {
    match decision {
        Decision::Allowed {
            effective_role,
            plan,
            warning,
        } => {
            let mut body = json!({
                "allowed": true,
                "effective_role": effective_role,
            });
            if let Some(plan) = plan {
                body["plan"] = json!(plan);
            }
            if let Some(warning) = warning {
                body["warning"] = json!(warning);
            }
            (StatusCode::OK, axum::Json(body)).into_response()
        }
        Decision::Denied {
            reason,
            message,
            required_plan,
        } => {
            let mut body = json!({
                "allowed": false,
                "reason_code": reason,
                "message": message,
            });
            if let Some(plan) = required_plan {
                body["required_plan"] = json!(plan);
            }
            (status_for(*reason), axum::Json(body)).into_response()
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
