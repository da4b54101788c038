//! The boundary enforcer: authoritative, non-cached re-evaluation.
//!
//! This is the only place a decision can actually gate a data mutation.
//! Identity is re-derived from a verified credential; override and
//! subscription state are read fresh on every call. The role logic is the
//! same single evaluation function the UX path uses — the boundary only ever
//! adds checks on top, so it can never be more permissive than the UX path
//! for the same logical inputs.

use std::sync::Arc;

use serde::Deserialize;
use tracing::instrument;

use opsledger_core::{Clock, TenantId};

use crate::{
    evaluate_role_policy, resolve_outcome, validate_claims, Actor, ActorDirectory, Decision,
    Feature, ImpersonationRegistry, JwtClaims, LimitCheck, LimitKind, OverrideStore,
    PermissionKey, ReasonCode, RoleOutcome, StoreError, SubscriptionGate, SubscriptionStore,
    UsageStore,
};

/// One boundary authorization request.
#[derive(Debug, Clone, Deserialize)]
pub struct EnforceRequest {
    pub tenant_id: TenantId,
    pub permission: PermissionKey,
    #[serde(default)]
    pub feature: Option<Feature>,
}

/// Authoritative decision point at the trust boundary.
pub struct BoundaryEnforcer {
    directory: Arc<dyn ActorDirectory>,
    overrides: Arc<dyn OverrideStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
    usage: Arc<dyn UsageStore>,
    registry: Arc<ImpersonationRegistry>,
    gate: SubscriptionGate,
    clock: Arc<dyn Clock>,
}

impl BoundaryEnforcer {
    pub fn new(
        directory: Arc<dyn ActorDirectory>,
        overrides: Arc<dyn OverrideStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
        usage: Arc<dyn UsageStore>,
        registry: Arc<ImpersonationRegistry>,
        gate: SubscriptionGate,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            directory,
            overrides,
            subscriptions,
            usage,
            registry,
            gate,
            clock,
        }
    }

    pub fn registry(&self) -> &ImpersonationRegistry {
        &self.registry
    }

    /// Evaluate a request against a (possibly absent) verified credential.
    ///
    /// Never trusts a client-asserted role or tenant id: the actor and its
    /// memberships come from the directory, keyed by the credential subject.
    #[instrument(skip(self, claims), fields(tenant_id = %request.tenant_id, permission = %request.permission))]
    pub async fn enforce(&self, claims: Option<&JwtClaims>, request: &EnforceRequest) -> Decision {
        let now = self.clock.now();

        let Some(claims) = claims else {
            return Decision::denied(ReasonCode::Unauthenticated, "missing credential");
        };
        if let Err(err) = validate_claims(claims, now) {
            return Decision::denied(ReasonCode::Unauthenticated, err.to_string());
        }

        let actor = match self.directory.lookup(claims.sub).await {
            Ok(Some(actor)) => actor,
            Ok(None) => {
                return Decision::denied(ReasonCode::Unauthenticated, "unknown principal");
            }
            Err(err) => return Self::fail_closed("actor directory", err),
        };

        self.enforce_for_actor(&actor, request).await
    }

    /// Evaluate a request for an already re-derived actor.
    pub async fn enforce_for_actor(&self, actor: &Actor, request: &EnforceRequest) -> Decision {
        let now = self.clock.now();
        let impersonating = self
            .registry
            .is_impersonating(actor.actor_id, request.tenant_id);

        // Role stage: identical policy function as the UX path, but with a
        // fresh, uncached override read.
        let role_decision = match resolve_outcome(actor, request.tenant_id, impersonating) {
            RoleOutcome::Granted(role) => Decision::allowed(role),
            RoleOutcome::Denied(decision) => return decision,
            RoleOutcome::NeedsPolicy(role) => {
                let overrides = match self.overrides.list_for_tenant(request.tenant_id).await {
                    Ok(overrides) => overrides,
                    Err(err) => return Self::fail_closed("override store", err),
                };
                let decision = evaluate_role_policy(role, request.permission, &overrides);
                if !decision.is_allowed() {
                    return decision;
                }
                decision
            }
        };

        // Subscription gate runs after the role check passes, for every
        // role including owner.
        let subscription = match self.subscriptions.get(request.tenant_id).await {
            Ok(Some(subscription)) => subscription,
            Ok(None) => {
                // Provisioning guarantees exactly one record per tenant; a
                // missing record is a fault, and faults deny.
                return Decision::unavailable("subscription record missing for tenant");
            }
            Err(err) => return Self::fail_closed("subscription store", err),
        };

        if let Err(denial) =
            self.gate
                .check_access(&subscription, request.permission, request.feature, now)
        {
            return denial;
        }

        let mut warning = None;
        if let Some(kind) =
            LimitKind::for_creation(request.permission.module, request.permission.action)
        {
            let current = match self.usage.current(request.tenant_id, kind).await {
                Ok(current) => current,
                Err(err) => return Self::fail_closed("usage store", err),
            };

            match self
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

    /// Record consumption for a creation that passed the gate and succeeded.
    pub async fn record_creation(
        &self,
        tenant_id: TenantId,
        permission: PermissionKey,
    ) -> Result<(), StoreError> {
        if let Some(kind) = LimitKind::for_creation(permission.module, permission.action) {
            self.usage.record(tenant_id, kind, 1).await?;
        }
        Ok(())
    }

    fn fail_closed(source: &str, err: StoreError) -> Decision {
        tracing::error!(source, error = %err, "boundary evaluation failed closed");
        Decision::unavailable(format!("{source} unreachable"))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::RwLock;

    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use opsledger_core::{ActorId, ManualClock};

    use super::*;
    use crate::{
        Action, Actor, EffectiveRole, Module, OrgRole, PermissionOverride, Plan,
        RecordingAuditSink, Subscription, SubscriptionStatus,
    };

    #[derive(Default)]
    struct FixtureStores {
        actors: RwLock<HashMap<ActorId, Actor>>,
        overrides: RwLock<Vec<PermissionOverride>>,
        subscriptions: RwLock<HashMap<TenantId, Subscription>>,
        usage: RwLock<HashMap<(TenantId, LimitKind), u64>>,
        fail: RwLock<bool>,
    }

    impl FixtureStores {
        fn check_fail(&self) -> Result<(), StoreError> {
            if *self.fail.read().unwrap() {
                Err(StoreError::Unavailable("fixture outage".into()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl ActorDirectory for FixtureStores {
        async fn lookup(&self, actor_id: ActorId) -> Result<Option<Actor>, StoreError> {
            self.check_fail()?;
            Ok(self.actors.read().unwrap().get(&actor_id).cloned())
        }
    }

    #[async_trait]
    impl OverrideStore for FixtureStores {
        async fn list_for_tenant(
            &self,
            tenant_id: TenantId,
        ) -> Result<Vec<PermissionOverride>, StoreError> {
            self.check_fail()?;
            Ok(self
                .overrides
                .read()
                .unwrap()
                .iter()
                .filter(|o| o.tenant_id == tenant_id)
                .copied()
                .collect())
        }

        async fn upsert(&self, row: PermissionOverride) -> Result<(), StoreError> {
            self.overrides.write().unwrap().push(row);
            Ok(())
        }

        async fn delete(
            &self,
            _tenant_id: TenantId,
            _role: OrgRole,
            _key: PermissionKey,
        ) -> Result<bool, StoreError> {
            Ok(false)
        }
    }

    #[async_trait]
    impl SubscriptionStore for FixtureStores {
        async fn get(&self, tenant_id: TenantId) -> Result<Option<Subscription>, StoreError> {
            self.check_fail()?;
            Ok(self.subscriptions.read().unwrap().get(&tenant_id).copied())
        }
    }

    #[async_trait]
    impl UsageStore for FixtureStores {
        async fn current(&self, tenant_id: TenantId, kind: LimitKind) -> Result<u64, StoreError> {
            self.check_fail()?;
            Ok(*self
                .usage
                .read()
                .unwrap()
                .get(&(tenant_id, kind))
                .unwrap_or(&0))
        }

        async fn record(
            &self,
            tenant_id: TenantId,
            kind: LimitKind,
            units: u64,
        ) -> Result<(), StoreError> {
            *self
                .usage
                .write()
                .unwrap()
                .entry((tenant_id, kind))
                .or_insert(0) += units;
            Ok(())
        }
    }

    struct Fixture {
        stores: Arc<FixtureStores>,
        clock: Arc<ManualClock>,
        enforcer: BoundaryEnforcer,
    }

    fn fixture() -> Fixture {
        let stores = Arc::new(FixtureStores::default());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let registry = Arc::new(ImpersonationRegistry::new(
            clock.clone(),
            Arc::new(RecordingAuditSink::new()),
        ));

        let enforcer = BoundaryEnforcer::new(
            stores.clone(),
            stores.clone(),
            stores.clone(),
            stores.clone(),
            registry,
            SubscriptionGate::builtin(),
            clock.clone(),
        );

        Fixture {
            stores,
            clock,
            enforcer,
        }
    }

    fn seed_member(fx: &Fixture, tenant_id: TenantId, role: OrgRole, plan: Plan) -> Actor {
        let actor = Actor::user(ActorId::new())
            .with_membership(tenant_id, role)
            .unwrap();
        fx.stores
            .actors
            .write()
            .unwrap()
            .insert(actor.actor_id, actor.clone());
        fx.stores.subscriptions.write().unwrap().insert(
            tenant_id,
            Subscription::new(plan, SubscriptionStatus::Active),
        );
        actor
    }

    fn claims_for(fx: &Fixture, actor: &Actor) -> JwtClaims {
        let now = fx.clock.now();
        JwtClaims {
            sub: actor.actor_id,
            issued_at: now - Duration::minutes(1),
            expires_at: now + Duration::minutes(10),
        }
    }

    fn request(tenant_id: TenantId, module: Module, action: Action) -> EnforceRequest {
        EnforceRequest {
            tenant_id,
            permission: PermissionKey::new(module, action),
            feature: None,
        }
    }

    #[tokio::test]
    async fn missing_credential_is_unauthenticated() {
        let fx = fixture();
        let decision = fx
            .enforcer
            .enforce(None, &request(TenantId::new(), Module::Invoices, Action::View))
            .await;
        assert_eq!(decision.reason(), Some(ReasonCode::Unauthenticated));
    }

    #[tokio::test]
    async fn expired_credential_is_unauthenticated() {
        let fx = fixture();
        let tenant_id = TenantId::new();
        let actor = seed_member(&fx, tenant_id, OrgRole::Manager, Plan::Pro);
        let claims = claims_for(&fx, &actor);

        fx.clock.advance(Duration::minutes(30));

        let decision = fx
            .enforcer
            .enforce(
                Some(&claims),
                &request(tenant_id, Module::Invoices, Action::View),
            )
            .await;
        assert_eq!(decision.reason(), Some(ReasonCode::Unauthenticated));
    }

    #[tokio::test]
    async fn member_with_matrix_capability_is_allowed_with_plan() {
        let fx = fixture();
        let tenant_id = TenantId::new();
        let actor = seed_member(&fx, tenant_id, OrgRole::Accounts, Plan::Pro);
        let claims = claims_for(&fx, &actor);

        let decision = fx
            .enforcer
            .enforce(
                Some(&claims),
                &request(tenant_id, Module::Invoices, Action::Update),
            )
            .await;

        assert_eq!(
            decision,
            Decision::allowed(EffectiveRole::Org(OrgRole::Accounts)).with_plan(Plan::Pro)
        );
    }

    #[tokio::test]
    async fn operator_without_session_must_impersonate() {
        let fx = fixture();
        let tenant_id = TenantId::new();
        let operator = Actor::platform_operator(ActorId::new());
        fx.stores
            .actors
            .write()
            .unwrap()
            .insert(operator.actor_id, operator.clone());
        let claims = claims_for(&fx, &operator);

        let decision = fx
            .enforcer
            .enforce(
                Some(&claims),
                &request(tenant_id, Module::Invoices, Action::Create),
            )
            .await;
        assert_eq!(decision.reason(), Some(ReasonCode::MustImpersonate));
    }

    #[tokio::test]
    async fn impersonation_lifecycle_grants_then_revokes_synthetic_owner() {
        let fx = fixture();
        let tenant_id = TenantId::new();
        let operator = Actor::platform_operator(ActorId::new());
        fx.stores
            .actors
            .write()
            .unwrap()
            .insert(operator.actor_id, operator.clone());
        fx.stores.subscriptions.write().unwrap().insert(
            tenant_id,
            Subscription::new(Plan::Pro, SubscriptionStatus::Active),
        );
        let claims = claims_for(&fx, &operator);
        let req = request(tenant_id, Module::Invoices, Action::Create);

        fx.enforcer.registry().start(&operator, tenant_id).unwrap();
        let decision = fx.enforcer.enforce(Some(&claims), &req).await;
        assert_eq!(
            decision,
            Decision::allowed(EffectiveRole::ImpersonatedOwner).with_plan(Plan::Pro)
        );

        fx.enforcer.registry().end(operator.actor_id).unwrap();
        let decision = fx.enforcer.enforce(Some(&claims), &req).await;
        assert_eq!(decision.reason(), Some(ReasonCode::MustImpersonate));
    }

    #[tokio::test]
    async fn expired_subscription_blocks_even_owner() {
        let fx = fixture();
        let tenant_id = TenantId::new();
        let owner = seed_member(&fx, tenant_id, OrgRole::Owner, Plan::Pro);
        fx.stores.subscriptions.write().unwrap().insert(
            tenant_id,
            Subscription::new(Plan::Pro, SubscriptionStatus::Expired),
        );
        let claims = claims_for(&fx, &owner);

        let decision = fx
            .enforcer
            .enforce(
                Some(&claims),
                &request(tenant_id, Module::Invoices, Action::Create),
            )
            .await;
        assert_eq!(decision.reason(), Some(ReasonCode::SubscriptionInactive));
    }

    #[tokio::test]
    async fn feature_blocked_names_the_required_plan() {
        let fx = fixture();
        let tenant_id = TenantId::new();
        let owner = seed_member(&fx, tenant_id, OrgRole::Owner, Plan::Free);
        let claims = claims_for(&fx, &owner);

        let mut req = request(tenant_id, Module::Reports, Action::View);
        req.feature = Some(Feature::Analytics);

        let decision = fx.enforcer.enforce(Some(&claims), &req).await;
        assert_eq!(
            decision,
            Decision::feature_blocked(
                "feature 'analytics' is not included in the free plan",
                Some(Plan::Pro)
            )
        );
    }

    #[tokio::test]
    async fn creation_at_the_limit_is_denied_and_near_limit_warns() {
        let fx = fixture();
        let tenant_id = TenantId::new();
        let owner = seed_member(&fx, tenant_id, OrgRole::Owner, Plan::Free);
        let claims = claims_for(&fx, &owner);
        let req = request(tenant_id, Module::Customers, Action::Create);

        // 21 of 25 customers: allowed with warning (84%).
        fx.stores
            .usage
            .write()
            .unwrap()
            .insert((tenant_id, LimitKind::Customers), 21);
        let decision = fx.enforcer.enforce(Some(&claims), &req).await;
        let Decision::Allowed { warning, .. } = &decision else {
            panic!("expected allow, got {decision:?}");
        };
        assert_eq!(warning.map(|w| w.percentage), Some(84));

        // At the ceiling: hard deny.
        fx.stores
            .usage
            .write()
            .unwrap()
            .insert((tenant_id, LimitKind::Customers), 25);
        let decision = fx.enforcer.enforce(Some(&claims), &req).await;
        assert_eq!(decision.reason(), Some(ReasonCode::LimitReached));
    }

    #[tokio::test]
    async fn store_outage_fails_closed() {
        let fx = fixture();
        let tenant_id = TenantId::new();
        let actor = seed_member(&fx, tenant_id, OrgRole::Manager, Plan::Pro);
        let claims = claims_for(&fx, &actor);

        *fx.stores.fail.write().unwrap() = true;

        let decision = fx
            .enforcer
            .enforce(
                Some(&claims),
                &request(tenant_id, Module::Invoices, Action::View),
            )
            .await;
        assert_eq!(decision.reason(), Some(ReasonCode::EvaluationUnavailable));
    }

    #[tokio::test]
    async fn record_creation_increments_only_limit_gated_keys() {
        let fx = fixture();
        let tenant_id = TenantId::new();

        fx.enforcer
            .record_creation(tenant_id, PermissionKey::new(Module::Invoices, Action::Create))
            .await
            .unwrap();
        fx.enforcer
            .record_creation(tenant_id, PermissionKey::new(Module::Reports, Action::Create))
            .await
            .unwrap();

        let usage = fx.stores.usage.read().unwrap();
        assert_eq!(
            usage.get(&(tenant_id, LimitKind::InvoicesPerMonth)),
            Some(&1)
        );
        assert_eq!(usage.len(), 1);
    }
}
