use axum::{
    routing::{delete, get, post},
    Router,
};

pub mod authorize;
pub mod common;
pub mod impersonation;
pub mod invoices;
pub mod limits;
pub mod overrides;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/authorize", post(authorize::authorize))
        .route("/authorize/explain", get(authorize::explain))
        .route(
            "/tenants/:tenant_id/overrides",
            get(overrides::list).put(overrides::put),
        )
        .route(
            "/tenants/:tenant_id/overrides/:role/:permission",
            delete(overrides::remove),
        )
        .route(
            "/tenants/:tenant_id/invoices",
            get(invoices::list).post(invoices::create),
        )
        .route("/tenants/:tenant_id/limits", get(limits::limits))
        .route(
            "/console/impersonation",
            post(impersonation::start).delete(impersonation::stop),
        )
}
