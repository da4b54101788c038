//! `opsledger-authz` — the authorization and tenant-isolation engine.
//!
//! Decides, for a given actor, tenant, module, and action, whether an
//! operation is allowed: static capability matrix, per-tenant overrides,
//! platform-operator impersonation, and subscription/plan gating. The same
//! pipeline is evaluated twice — advisorily near the view layer (cached) and
//! authoritatively at the trust boundary (fresh reads) — and the boundary
//! path only ever adds checks, never removes them.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod actor;
pub mod audit;
pub mod cache;
pub mod claims;
pub mod context;
pub mod decision;
pub mod enforcer;
pub mod gate;
pub mod impersonation;
pub mod matrix;
pub mod overrides;
pub mod permission;
pub mod plan;
pub mod resolver;
pub mod role;
pub mod stores;
pub mod subscription;

pub use actor::{Actor, TenantMembership};
pub use audit::{
    AuditEvent, AuditSink, ImpersonationEndReason, RecordingAuditSink, TracingAuditSink,
};
pub use cache::{PermissionCache, DEFAULT_TTL_SECONDS};
pub use claims::{validate_claims, JwtClaims, JwtValidator, TokenValidationError};
pub use context::{
    guard_table_read, operating_context, BusinessTable, ContextError, ContextGuard,
    OperatingContext,
};
pub use decision::{Decision, LimitWarning, ReasonCode};
pub use enforcer::{BoundaryEnforcer, EnforceRequest};
pub use gate::{usage_percentage, LimitCheck, SubscriptionGate};
pub use impersonation::{ImpersonationRegistry, ImpersonationSession, MAX_SESSION_MINUTES};
pub use matrix::{default_allows, MATRIX_VERSION};
pub use overrides::{find_override, OverrideStore, PermissionOverride, StoreError};
pub use permission::{Action, Module, PermissionKey};
pub use plan::{
    Feature, LimitKind, Plan, PlanFeatureTable, PlanLimits, PRACTICALLY_UNLIMITED,
    SOFT_WARNING_PERCENT,
};
pub use resolver::{
    check_permission, evaluate_role_policy, resolve_outcome, resolve_role, RoleOutcome,
    RoleResolver,
};
pub use role::{EffectiveRole, OrgRole};
pub use stores::{ActorDirectory, SubscriptionStore, UsageStore};
pub use subscription::{Subscription, SubscriptionStatus};
