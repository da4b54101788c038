//! Typed authorization decisions.
//!
//! Every denial carries a machine-readable reason code, never a bare
//! boolean: user-facing surfaces render distinct copy per cause, and tests
//! assert on cause rather than outcome.

use serde::Serialize;

use crate::{EffectiveRole, LimitKind, Plan};

/// Machine-readable cause of a denial.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    Unauthenticated,
    NotAMember,
    MustImpersonate,
    RoleInsufficient,
    NoExplicitGrant,
    FeatureBlocked,
    LimitReached,
    SubscriptionInactive,
    CrossContextViolation,
    /// A backing store could not be reached; the engine fails closed.
    EvaluationUnavailable,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::Unauthenticated => "unauthenticated",
            ReasonCode::NotAMember => "not_a_member",
            ReasonCode::MustImpersonate => "must_impersonate",
            ReasonCode::RoleInsufficient => "role_insufficient",
            ReasonCode::NoExplicitGrant => "no_explicit_grant",
            ReasonCode::FeatureBlocked => "feature_blocked",
            ReasonCode::LimitReached => "limit_reached",
            ReasonCode::SubscriptionInactive => "subscription_inactive",
            ReasonCode::CrossContextViolation => "cross_context_violation",
            ReasonCode::EvaluationUnavailable => "evaluation_unavailable",
        }
    }
}

impl core::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-blocking notice that a countable resource is approaching its ceiling.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct LimitWarning {
    pub kind: LimitKind,
    pub current: u64,
    pub limit: u64,
    pub percentage: u64,
}

/// Outcome of an authorization evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum Decision {
    Allowed {
        effective_role: EffectiveRole,
        #[serde(skip_serializing_if = "Option::is_none")]
        plan: Option<Plan>,
        #[serde(skip_serializing_if = "Option::is_none")]
        warning: Option<LimitWarning>,
    },
    Denied {
        reason: ReasonCode,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        required_plan: Option<Plan>,
    },
}

impl Decision {
    pub fn allowed(effective_role: EffectiveRole) -> Self {
        Decision::Allowed {
            effective_role,
            plan: None,
            warning: None,
        }
    }

    pub fn denied(reason: ReasonCode, message: impl Into<String>) -> Self {
        Decision::Denied {
            reason,
            message: message.into(),
            required_plan: None,
        }
    }

    pub fn feature_blocked(message: impl Into<String>, required_plan: Option<Plan>) -> Self {
        Decision::Denied {
            reason: ReasonCode::FeatureBlocked,
            message: message.into(),
            required_plan,
        }
    }

    /// Fail-closed denial for an unreachable backing store.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Decision::denied(ReasonCode::EvaluationUnavailable, message)
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed { .. })
    }

    pub fn reason(&self) -> Option<ReasonCode> {
        match self {
            Decision::Allowed { .. } => None,
            Decision::Denied { reason, .. } => Some(*reason),
        }
    }

    /// Attach the tenant's plan to an allow (boundary output shape).
    pub fn with_plan(self, plan: Plan) -> Self {
        match self {
            Decision::Allowed {
                effective_role,
                warning,
                ..
            } => Decision::Allowed {
                effective_role,
                plan: Some(plan),
                warning,
            },
            denied => denied,
        }
    }

    /// Attach a soft limit warning to an allow.
    pub fn with_warning(self, warning: Option<LimitWarning>) -> Self {
        match self {
            Decision::Allowed {
                effective_role,
                plan,
                ..
            } => Decision::Allowed {
                effective_role,
                plan,
                warning,
            },
            denied => denied,
        }
    }
}
