//! Property tests over the pure policy layer.
//!
//! The central contract: the boundary pipeline is the UX-path role decision
//! plus additional gates, so for the same logical inputs it can deny where
//! the UX path allows, but never the reverse.

use chrono::Utc;
use proptest::prelude::*;

use opsledger_authz::{
    check_permission, find_override, Action, Actor, Decision, LimitCheck, LimitKind, Module,
    OrgRole, PermissionKey, PermissionOverride, Plan, Subscription, SubscriptionGate,
    SubscriptionStatus,
};
use opsledger_core::{ActorId, TenantId};

fn org_role() -> impl Strategy<Value = OrgRole> {
    prop::sample::select(OrgRole::ALL.to_vec())
}

fn module() -> impl Strategy<Value = Module> {
    prop::sample::select(Module::ALL.to_vec())
}

fn action() -> impl Strategy<Value = Action> {
    prop::sample::select(Action::ALL.to_vec())
}

fn plan() -> impl Strategy<Value = Plan> {
    prop::sample::select(Plan::ALL.to_vec())
}

fn status() -> impl Strategy<Value = SubscriptionStatus> {
    prop::sample::select(vec![
        SubscriptionStatus::Trial,
        SubscriptionStatus::Active,
        SubscriptionStatus::Suspended,
        SubscriptionStatus::Expired,
        SubscriptionStatus::Cancelled,
    ])
}

type OverrideSpec = (OrgRole, Module, Action, bool);

fn override_rows(tenant_id: TenantId, specs: Vec<OverrideSpec>) -> Vec<PermissionOverride> {
    specs
        .into_iter()
        .map(|(role, module, action, is_enabled)| PermissionOverride {
            tenant_id,
            role,
            key: PermissionKey::new(module, action),
            is_enabled,
        })
        .collect()
}

/// The boundary's gate stages, composed over an already-made role decision.
fn apply_gates(
    role_decision: Decision,
    gate: &SubscriptionGate,
    subscription: &Subscription,
    key: PermissionKey,
    current_usage: u64,
) -> Decision {
    if !role_decision.is_allowed() {
        return role_decision;
    }

    if let Err(denial) = gate.check_access(subscription, key, None, Utc::now()) {
        return denial;
    }

    if let Some(kind) = LimitKind::for_creation(key.module, key.action) {
        match gate.check_creation_limit(subscription.plan, kind, current_usage) {
            LimitCheck::Exceeded { current, limit } => {
                return SubscriptionGate::limit_denial(kind, current, limit);
            }
            LimitCheck::Warning(warning) => {
                return role_decision.with_warning(Some(warning));
            }
            LimitCheck::Within => {}
        }
    }

    role_decision
}

proptest! {
    /// Boundary allowance is a subset of UX-path allowance.
    #[test]
    fn boundary_is_never_more_permissive_than_ux_path(
        role in org_role(),
        module in module(),
        action in action(),
        specs in prop::collection::vec((org_role(), module(), action(), any::<bool>()), 0..8),
        plan in plan(),
        status in status(),
        current_usage in 0u64..6_000,
    ) {
        let tenant_id = TenantId::new();
        let actor = Actor::user(ActorId::new())
            .with_membership(tenant_id, role)
            .unwrap();
        let key = PermissionKey::new(module, action);
        let rows = override_rows(tenant_id, specs);

        let ux = check_permission(&actor, tenant_id, key, false, &rows);

        let gate = SubscriptionGate::builtin();
        let subscription = Subscription::new(plan, status);
        let boundary = apply_gates(ux.clone(), &gate, &subscription, key, current_usage);

        prop_assert!(
            !(boundary.is_allowed() && !ux.is_allowed()),
            "boundary allowed what the UX path denied: {boundary:?} vs {ux:?}"
        );
    }

    /// An override row for the exact tuple is authoritative in both
    /// directions for non-owner roles.
    #[test]
    fn override_rows_are_authoritative(
        role in org_role(),
        module in module(),
        action in action(),
        specs in prop::collection::vec((org_role(), module(), action(), any::<bool>()), 0..8),
    ) {
        prop_assume!(role != OrgRole::Owner);

        let tenant_id = TenantId::new();
        let actor = Actor::user(ActorId::new())
            .with_membership(tenant_id, role)
            .unwrap();
        let key = PermissionKey::new(module, action);
        let rows = override_rows(tenant_id, specs);

        let decision = check_permission(&actor, tenant_id, key, false, &rows);

        if let Some(row) = find_override(&rows, role, key) {
            prop_assert_eq!(decision.is_allowed(), row.is_enabled);
        }
    }

    /// Owners are allowed every key regardless of override contents.
    #[test]
    fn owner_allowance_is_unconditional(
        module in module(),
        action in action(),
        specs in prop::collection::vec((org_role(), module(), action(), any::<bool>()), 0..8),
    ) {
        let tenant_id = TenantId::new();
        let owner = Actor::user(ActorId::new())
            .with_membership(tenant_id, OrgRole::Owner)
            .unwrap();
        let key = PermissionKey::new(module, action);
        let rows = override_rows(tenant_id, specs);

        prop_assert!(check_permission(&owner, tenant_id, key, false, &rows).is_allowed());
    }
}
