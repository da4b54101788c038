//! Role resolution and the single policy evaluation function.
//!
//! Every permission check in the product — UX-path or boundary — goes
//! through the one precedence chain in this module; the only behavioral
//! switch is `Module::requires_explicit_grant`. There are deliberately no
//! per-call-site fallback variations.
//!
//! - No IO in the pure functions
//! - No panics
//! - No business logic (pure policy check)

use std::sync::Arc;

use opsledger_core::TenantId;

use crate::{
    find_override, matrix, Actor, Decision, EffectiveRole, OrgRole, PermissionCache,
    PermissionKey, PermissionOverride, ReasonCode,
};

/// Resolve the single role an actor effectively holds for a tenant.
///
/// Strict precedence:
/// 1. Platform operator with an active impersonation session for the tenant
///    ⇒ synthetic owner.
/// 2. Platform operator without one ⇒ `None` for any tenant-scoped check —
///    never a fall-through to a default role.
/// 3. Tenant membership role, if any.
/// 4. Otherwise `None`.
pub fn resolve_role(
    actor: &Actor,
    tenant_id: TenantId,
    impersonation_active: bool,
) -> EffectiveRole {
    if actor.is_platform_operator {
        return if impersonation_active {
            EffectiveRole::ImpersonatedOwner
        } else {
            EffectiveRole::None
        };
    }

    match actor.membership_for(tenant_id) {
        Some(membership) => EffectiveRole::Org(membership.role),
        None => EffectiveRole::None,
    }
}

/// Result of the role-precedence stage, before any override lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleOutcome {
    /// Decided without consulting overrides (owner, real or synthetic).
    Granted(EffectiveRole),
    /// An ordinary org role: override/matrix policy must be evaluated.
    NeedsPolicy(OrgRole),
    /// Decided without consulting overrides (no effective role).
    Denied(Decision),
}

/// Role-precedence stage shared by the UX path and the boundary.
///
/// Owner-level roles are granted here, before any override lookup, so
/// callers can skip the store/cache round trip entirely.
pub fn resolve_outcome(
    actor: &Actor,
    tenant_id: TenantId,
    impersonation_active: bool,
) -> RoleOutcome {
    match resolve_role(actor, tenant_id, impersonation_active) {
        EffectiveRole::None => {
            if actor.is_platform_operator {
                RoleOutcome::Denied(Decision::denied(
                    ReasonCode::MustImpersonate,
                    "platform operators must start an impersonation session for tenant access",
                ))
            } else {
                RoleOutcome::Denied(Decision::denied(
                    ReasonCode::NotAMember,
                    "actor is not a member of this tenant",
                ))
            }
        }
        EffectiveRole::ImpersonatedOwner => RoleOutcome::Granted(EffectiveRole::ImpersonatedOwner),
        EffectiveRole::Org(OrgRole::Owner) => {
            RoleOutcome::Granted(EffectiveRole::Org(OrgRole::Owner))
        }
        EffectiveRole::Org(role) => RoleOutcome::NeedsPolicy(role),
        // Unreachable: resolve_role never yields PlatformOperator for
        // tenant-scoped checks, but deny closed if it ever does.
        EffectiveRole::PlatformOperator => RoleOutcome::Denied(Decision::denied(
            ReasonCode::MustImpersonate,
            "platform operators must start an impersonation session for tenant access",
        )),
    }
}

/// Override/matrix policy for a resolved org role.
///
/// An override row is authoritative in both directions. Absent a row,
/// explicit-grant modules deny; the rest fall back to the matrix default.
pub fn evaluate_role_policy(
    role: OrgRole,
    key: PermissionKey,
    overrides: &[PermissionOverride],
) -> Decision {
    if let Some(row) = find_override(overrides, role, key) {
        return if row.is_enabled {
            Decision::allowed(EffectiveRole::Org(role))
        } else {
            Decision::denied(
                ReasonCode::RoleInsufficient,
                format!("permission '{key}' is disabled for role '{role}' in this tenant"),
            )
        };
    }

    if key.module.requires_explicit_grant() {
        return Decision::denied(
            ReasonCode::NoExplicitGrant,
            format!("permission '{key}' requires an explicit grant for role '{role}'"),
        );
    }

    if matrix::default_allows(key.module, key.action, role) {
        Decision::allowed(EffectiveRole::Org(role))
    } else {
        Decision::denied(
            ReasonCode::RoleInsufficient,
            format!("role '{role}' is not permitted '{key}'"),
        )
    }
}

/// Full role-based permission check with overrides already in hand.
///
/// This is the one evaluation function both paths share; the UX path feeds
/// it cached overrides, the boundary feeds it a fresh read.
pub fn check_permission(
    actor: &Actor,
    tenant_id: TenantId,
    key: PermissionKey,
    impersonation_active: bool,
    overrides: &[PermissionOverride],
) -> Decision {
    match resolve_outcome(actor, tenant_id, impersonation_active) {
        RoleOutcome::Granted(role) => Decision::allowed(role),
        RoleOutcome::Denied(decision) => decision,
        RoleOutcome::NeedsPolicy(role) => evaluate_role_policy(role, key, overrides),
    }
}

/// UX-path permission evaluator, reading overrides through the cache.
///
/// Its decisions are advisory: they exist to avoid rendering controls the
/// boundary would reject, never to gate a mutation.
pub struct RoleResolver {
    cache: Arc<PermissionCache>,
}

impl RoleResolver {
    pub fn new(cache: Arc<PermissionCache>) -> Self {
        Self { cache }
    }

    pub async fn check_permission(
        &self,
        actor: &Actor,
        tenant_id: TenantId,
        key: PermissionKey,
        impersonation_active: bool,
    ) -> Decision {
        match resolve_outcome(actor, tenant_id, impersonation_active) {
            RoleOutcome::Granted(role) => Decision::allowed(role),
            RoleOutcome::Denied(decision) => decision,
            RoleOutcome::NeedsPolicy(role) => match self.cache.get(tenant_id).await {
                Ok(overrides) => evaluate_role_policy(role, key, &overrides),
                Err(err) => {
                    tracing::warn!(%tenant_id, error = %err, "override cache read failed; denying");
                    Decision::unavailable(err.to_string())
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use opsledger_core::ActorId;

    use super::*;
    use crate::{Action, Module, PermissionOverride};

    fn member(tenant_id: TenantId, role: OrgRole) -> Actor {
        Actor::user(ActorId::new())
            .with_membership(tenant_id, role)
            .unwrap()
    }

    #[test]
    fn owner_is_allowed_every_key_without_override_lookup() {
        let tenant_id = TenantId::new();
        let owner = member(tenant_id, OrgRole::Owner);

        // A poisoned override set proves the lookup is bypassed.
        let poison: Vec<PermissionOverride> = PermissionKey::all()
            .map(|key| PermissionOverride {
                tenant_id,
                role: OrgRole::Owner,
                key,
                is_enabled: false,
            })
            .collect();

        for key in PermissionKey::all() {
            let decision = check_permission(&owner, tenant_id, key, false, &poison);
            assert!(decision.is_allowed(), "owner denied {key}");
        }
    }

    #[test]
    fn impersonating_operator_is_synthetic_owner() {
        let tenant_id = TenantId::new();
        let operator = Actor::platform_operator(ActorId::new());

        let decision = check_permission(
            &operator,
            tenant_id,
            PermissionKey::new(Module::Invoices, Action::Create),
            true,
            &[],
        );

        assert_eq!(
            decision,
            Decision::allowed(EffectiveRole::ImpersonatedOwner)
        );
    }

    #[test]
    fn operator_without_session_gets_must_impersonate_for_every_key() {
        let tenant_id = TenantId::new();
        let operator = Actor::platform_operator(ActorId::new());

        for key in PermissionKey::all() {
            let decision = check_permission(&operator, tenant_id, key, false, &[]);
            assert_eq!(decision.reason(), Some(ReasonCode::MustImpersonate), "{key}");
        }
    }

    #[test]
    fn non_member_is_denied_not_a_member() {
        let other_tenant = TenantId::new();
        let actor = member(TenantId::new(), OrgRole::Manager);

        let decision = check_permission(
            &actor,
            other_tenant,
            PermissionKey::new(Module::Invoices, Action::View),
            false,
            &[],
        );

        assert_eq!(decision.reason(), Some(ReasonCode::NotAMember));
    }

    #[test]
    fn disabled_override_wins_over_matrix_allow() {
        let tenant_id = TenantId::new();
        let actor = member(tenant_id, OrgRole::Manager);
        let key = PermissionKey::new(Module::Invoices, Action::Create);
        assert!(matrix::default_allows(key.module, key.action, OrgRole::Manager));

        let overrides = [PermissionOverride {
            tenant_id,
            role: OrgRole::Manager,
            key,
            is_enabled: false,
        }];

        let decision = check_permission(&actor, tenant_id, key, false, &overrides);
        assert_eq!(decision.reason(), Some(ReasonCode::RoleInsufficient));
    }

    #[test]
    fn enabled_override_wins_over_matrix_deny() {
        let tenant_id = TenantId::new();
        let actor = member(tenant_id, OrgRole::Manager);
        let key = PermissionKey::new(Module::Customers, Action::Delete);
        assert!(!matrix::default_allows(key.module, key.action, OrgRole::Manager));

        let overrides = [PermissionOverride {
            tenant_id,
            role: OrgRole::Manager,
            key,
            is_enabled: true,
        }];

        let decision = check_permission(&actor, tenant_id, key, false, &overrides);
        assert!(decision.is_allowed());
    }

    #[test]
    fn matrix_deny_without_override_reads_role_insufficient() {
        let tenant_id = TenantId::new();
        let actor = member(tenant_id, OrgRole::Employee);
        let key = PermissionKey::new(Module::Customers, Action::Delete);

        let decision = check_permission(&actor, tenant_id, key, false, &[]);
        assert_eq!(decision.reason(), Some(ReasonCode::RoleInsufficient));
    }

    #[test]
    fn explicit_grant_module_denies_absent_override() {
        let tenant_id = TenantId::new();
        let actor = member(tenant_id, OrgRole::Accounts);
        let key = PermissionKey::new(Module::Payroll, Action::View);

        let decision = check_permission(&actor, tenant_id, key, false, &[]);
        assert_eq!(decision.reason(), Some(ReasonCode::NoExplicitGrant));

        let overrides = [PermissionOverride {
            tenant_id,
            role: OrgRole::Accounts,
            key,
            is_enabled: true,
        }];
        assert!(check_permission(&actor, tenant_id, key, false, &overrides).is_allowed());
    }
}
