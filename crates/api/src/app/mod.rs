//! HTTP application wiring (Axum router + service wiring).
//!
//! Layout:
//! - `services.rs`-style wiring lives here in `AppServices`
//! - `routes/`: HTTP routes + handlers (one file per surface)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: decision → HTTP response mapping

use std::sync::Arc;

use axum::{routing::get, Extension, Router};

use opsledger_authz::{
    ActorDirectory, AuditSink, BoundaryEnforcer, ImpersonationRegistry, OverrideStore,
    PermissionCache, RoleResolver, SubscriptionGate, SubscriptionStore, TracingAuditSink,
    UsageStore,
};
use opsledger_core::{Clock, SystemClock};
use opsledger_infra::{
    InMemoryActorDirectory, InMemoryOverrideStore, InMemorySubscriptionStore, InMemoryUsageStore,
};

use crate::jwt::Hs256JwtValidator;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;

/// Shared engine services for the HTTP layer.
///
/// The UX-path resolver reads overrides through the cache; the boundary
/// enforcer is wired straight to the stores and never sees the cache.
pub struct AppServices {
    pub directory: Arc<dyn ActorDirectory>,
    pub overrides: Arc<dyn OverrideStore>,
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub usage: Arc<dyn UsageStore>,
    pub cache: Arc<PermissionCache>,
    pub resolver: RoleResolver,
    pub enforcer: BoundaryEnforcer,
    pub registry: Arc<ImpersonationRegistry>,
    pub gate: SubscriptionGate,
    pub audit: Arc<dyn AuditSink>,
    pub clock: Arc<dyn Clock>,
}

impl AppServices {
    pub fn new(
        directory: Arc<dyn ActorDirectory>,
        overrides: Arc<dyn OverrideStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
        usage: Arc<dyn UsageStore>,
        audit: Arc<dyn AuditSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let gate = SubscriptionGate::builtin();
        let registry = Arc::new(ImpersonationRegistry::new(clock.clone(), audit.clone()));
        let cache = Arc::new(PermissionCache::new(overrides.clone(), clock.clone()));
        let resolver = RoleResolver::new(cache.clone());
        let enforcer = BoundaryEnforcer::new(
            directory.clone(),
            overrides.clone(),
            subscriptions.clone(),
            usage.clone(),
            registry.clone(),
            gate.clone(),
            clock.clone(),
        );

        Self {
            directory,
            overrides,
            subscriptions,
            usage,
            cache,
            resolver,
            enforcer,
            registry,
            gate,
            audit,
            clock,
        }
    }

    /// In-memory wiring for dev and tests.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryActorDirectory::new()),
            Arc::new(InMemoryOverrideStore::new()),
            Arc::new(InMemorySubscriptionStore::new()),
            Arc::new(InMemoryUsageStore::new()),
            Arc::new(TracingAuditSink),
            Arc::new(SystemClock),
        )
    }
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: AppServices, jwt_secret: String) -> Router {
    let jwt = Arc::new(Hs256JwtValidator::new(jwt_secret.as_bytes()));
    let auth_state = middleware::AuthState { jwt };

    let services = Arc::new(services);

    // Protected routes: require a verified credential.
    let protected = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
}
