//! Subscription gate: plan, feature, and usage-limit enforcement.
//!
//! Layered on top of the role decision. Role allowance never exempts an
//! actor from subscription gating — an owner on an expired subscription is
//! still blocked from non-read actions.

use chrono::{DateTime, Utc};

use opsledger_core::DomainResult;

use crate::{
    Action, Decision, Feature, LimitKind, LimitWarning, PermissionKey, Plan, PlanFeatureTable,
    ReasonCode, Subscription, PRACTICALLY_UNLIMITED, SOFT_WARNING_PERCENT,
};

/// Outcome of a usage-limit check for a creation action.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LimitCheck {
    /// Comfortably under the ceiling.
    Within,
    /// Allowed, but the caller should surface a non-blocking warning.
    Warning(LimitWarning),
    /// At or past the ceiling; the creation must be denied.
    Exceeded { current: u64, limit: u64 },
}

/// Usage as a percentage of the ceiling. `None` when the limit is at or
/// above the "practically unlimited" sentinel (no ceiling). A zero limit
/// reads as fully consumed, not as unlimited.
pub fn usage_percentage(current: u64, limit: u64) -> Option<u64> {
    if limit >= PRACTICALLY_UNLIMITED {
        return None;
    }
    if limit == 0 {
        return Some(100);
    }
    Some(current * 100 / limit)
}

/// Plan/feature/limit gate over a validated plan table.
#[derive(Debug, Clone)]
pub struct SubscriptionGate {
    table: PlanFeatureTable,
}

impl SubscriptionGate {
    /// Build the gate, validating the table at load time.
    pub fn new(table: PlanFeatureTable) -> DomainResult<Self> {
        table.validate()?;
        Ok(Self { table })
    }

    pub fn builtin() -> Self {
        // The builtin table is covered by tests; validation cannot fail.
        Self {
            table: PlanFeatureTable::builtin(),
        }
    }

    pub fn table(&self) -> &PlanFeatureTable {
        &self.table
    }

    /// Status and feature gating for one request.
    ///
    /// Non-view actions require an operational subscription; a requested
    /// feature must be in the tenant's plan tier, otherwise the denial
    /// carries the lowest tier that would satisfy it.
    pub fn check_access(
        &self,
        subscription: &Subscription,
        key: PermissionKey,
        feature: Option<Feature>,
        now: DateTime<Utc>,
    ) -> Result<(), Decision> {
        if key.action != Action::View && !subscription.is_operational(now) {
            return Err(Decision::denied(
                ReasonCode::SubscriptionInactive,
                format!(
                    "subscription is {}; only viewing is available",
                    subscription.status
                ),
            ));
        }

        if let Some(feature) = feature {
            if !self.table.allows(subscription.plan, feature) {
                let required = self.table.min_plan_for(feature);
                return Err(Decision::feature_blocked(
                    format!("feature '{feature}' is not included in the {} plan", subscription.plan),
                    required,
                ));
            }
        }

        Ok(())
    }

    /// Usage-limit gating for a creation action.
    pub fn check_creation_limit(&self, plan: Plan, kind: LimitKind, current: u64) -> LimitCheck {
        let limit = self.table.limits(plan).limit_for(kind);

        let Some(percentage) = usage_percentage(current, limit) else {
            return LimitCheck::Within;
        };

        if percentage >= 100 {
            LimitCheck::Exceeded { current, limit }
        } else if percentage >= SOFT_WARNING_PERCENT {
            LimitCheck::Warning(LimitWarning {
                kind,
                current,
                limit,
                percentage,
            })
        } else {
            LimitCheck::Within
        }
    }

    /// Map an exceeded limit to its denial.
    pub fn limit_denial(kind: LimitKind, current: u64, limit: u64) -> Decision {
        Decision::denied(
            ReasonCode::LimitReached,
            format!(
                "{} limit reached ({current}/{limit}); remove records or upgrade the plan",
                kind.as_str()
            ),
        )
    }
}

impl Default for SubscriptionGate {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use crate::{Module, SubscriptionStatus};

    use super::*;

    fn gate() -> SubscriptionGate {
        SubscriptionGate::builtin()
    }

    #[test]
    fn expired_subscription_blocks_non_view_actions_even_for_owner_paths() {
        let sub = Subscription::new(Plan::Pro, SubscriptionStatus::Expired);
        let key = PermissionKey::new(Module::Invoices, Action::Create);

        let denial = gate().check_access(&sub, key, None, Utc::now()).unwrap_err();
        assert_eq!(denial.reason(), Some(ReasonCode::SubscriptionInactive));
    }

    #[test]
    fn expired_subscription_still_permits_viewing() {
        let sub = Subscription::new(Plan::Pro, SubscriptionStatus::Expired);
        let key = PermissionKey::new(Module::Invoices, Action::View);

        assert!(gate().check_access(&sub, key, None, Utc::now()).is_ok());
    }

    #[test]
    fn feature_denial_carries_minimum_satisfying_plan() {
        let sub = Subscription::new(Plan::Free, SubscriptionStatus::Active);
        let key = PermissionKey::new(Module::Reports, Action::View);

        let denial = gate()
            .check_access(&sub, key, Some(Feature::Analytics), Utc::now())
            .unwrap_err();

        assert_eq!(denial.reason(), Some(ReasonCode::FeatureBlocked));
        let Decision::Denied { required_plan, .. } = denial else {
            unreachable!()
        };
        assert_eq!(required_plan, Some(Plan::Pro));
    }

    #[test]
    fn limit_warning_at_eighty_four_percent() {
        // 42 of 50 seats used: allowed, with a soft warning.
        let table = PlanFeatureTable::builtin();
        let gate = SubscriptionGate::new(table).unwrap();

        // Construct the check directly over current/limit arithmetic.
        assert_eq!(usage_percentage(42, 50), Some(84));

        match gate.check_creation_limit(Plan::Free, LimitKind::InvoicesPerMonth, 17) {
            LimitCheck::Warning(warning) => {
                assert_eq!(warning.current, 17);
                assert_eq!(warning.limit, 20);
                assert_eq!(warning.percentage, 85);
            }
            other => panic!("expected warning, got {other:?}"),
        }
    }

    #[test]
    fn limit_exceeded_at_the_ceiling() {
        match gate().check_creation_limit(Plan::Free, LimitKind::Customers, 25) {
            LimitCheck::Exceeded { current, limit } => {
                assert_eq!((current, limit), (25, 25));
            }
            other => panic!("expected exceeded, got {other:?}"),
        }
    }

    #[test]
    fn below_warning_threshold_is_silent() {
        assert_eq!(
            gate().check_creation_limit(Plan::Basic, LimitKind::Customers, 100),
            LimitCheck::Within
        );
    }

    #[test]
    fn unlimited_plans_have_no_ceiling() {
        assert_eq!(
            gate().check_creation_limit(
                Plan::Enterprise,
                LimitKind::InvoicesPerMonth,
                10 * PRACTICALLY_UNLIMITED
            ),
            LimitCheck::Within
        );
    }

    #[test]
    fn trial_within_window_is_operational() {
        let now = Utc::now();
        let sub = Subscription::trial(Plan::Basic, now + chrono::Duration::days(3));
        let key = PermissionKey::new(Module::Customers, Action::Create);

        assert!(gate().check_access(&sub, key, None, now).is_ok());

        let past_end = now + chrono::Duration::days(4);
        assert!(gate().check_access(&sub, key, None, past_end).is_err());
    }
}
