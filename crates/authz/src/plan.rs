//! Subscription plans: feature sets and resource limits per tier.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use opsledger_core::{DomainError, DomainResult};

use crate::{Action, Module};

/// A limit at or above this value means "no ceiling" for the resource.
pub const PRACTICALLY_UNLIMITED: u64 = 1_000_000;

/// Usage percentage at which a non-blocking warning is surfaced to callers.
pub const SOFT_WARNING_PERCENT: u64 = 80;

/// Subscription plan tier. Derive ordering is the upgrade order
/// (`free < basic < pro < enterprise`) and is used to compute the minimum
/// tier that unlocks a feature.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Free,
    Basic,
    Pro,
    Enterprise,
}

impl Plan {
    pub const ALL: [Plan; 4] = [Plan::Free, Plan::Basic, Plan::Pro, Plan::Enterprise];

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Basic => "basic",
            Plan::Pro => "pro",
            Plan::Enterprise => "enterprise",
        }
    }
}

impl core::fmt::Display for Plan {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Plan {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Plan::Free),
            "basic" => Ok(Plan::Basic),
            "pro" => Ok(Plan::Pro),
            "enterprise" => Ok(Plan::Enterprise),
            other => Err(DomainError::validation(format!("unknown plan: {other}"))),
        }
    }
}

/// A plan-gated product feature.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    CsvImport,
    CustomBranding,
    RecurringInvoices,
    Analytics,
    ApiAccess,
    AuditLog,
    SsoLogin,
}

impl Feature {
    pub const ALL: [Feature; 7] = [
        Feature::CsvImport,
        Feature::CustomBranding,
        Feature::RecurringInvoices,
        Feature::Analytics,
        Feature::ApiAccess,
        Feature::AuditLog,
        Feature::SsoLogin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::CsvImport => "csv_import",
            Feature::CustomBranding => "custom_branding",
            Feature::RecurringInvoices => "recurring_invoices",
            Feature::Analytics => "analytics",
            Feature::ApiAccess => "api_access",
            Feature::AuditLog => "audit_log",
            Feature::SsoLogin => "sso_login",
        }
    }
}

impl core::fmt::Display for Feature {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Countable resource gated by per-plan limits.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitKind {
    Seats,
    Customers,
    InvoicesPerMonth,
}

impl LimitKind {
    pub const ALL: [LimitKind; 3] = [
        LimitKind::Seats,
        LimitKind::Customers,
        LimitKind::InvoicesPerMonth,
    ];

    /// The limit (if any) that gates a creation in `module`.
    ///
    /// Non-creation actions are never limit-gated.
    pub fn for_creation(module: Module, action: Action) -> Option<LimitKind> {
        if action != Action::Create {
            return None;
        }
        match module {
            Module::Team => Some(LimitKind::Seats),
            Module::Customers => Some(LimitKind::Customers),
            Module::Invoices => Some(LimitKind::InvoicesPerMonth),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LimitKind::Seats => "seats",
            LimitKind::Customers => "customers",
            LimitKind::InvoicesPerMonth => "invoices_per_month",
        }
    }
}

/// Numeric resource ceilings for one plan tier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    pub seats: u64,
    pub customers: u64,
    pub invoices_per_month: u64,
}

impl PlanLimits {
    pub fn limit_for(&self, kind: LimitKind) -> u64 {
        match kind {
            LimitKind::Seats => self.seats,
            LimitKind::Customers => self.customers,
            LimitKind::InvoicesPerMonth => self.invoices_per_month,
        }
    }
}

/// Static plan → (features, limits) table.
///
/// Kept as data (not a match) so the built-in table can be validated at load
/// time: every `Feature` referenced anywhere in the permission surface must
/// be unlockable by some tier, so a typo'd table cannot silently deny a
/// feature to everyone.
#[derive(Debug, Clone)]
pub struct PlanFeatureTable {
    entries: BTreeMap<Plan, PlanEntry>,
}

#[derive(Debug, Clone)]
struct PlanEntry {
    features: HashSet<Feature>,
    limits: PlanLimits,
}

impl PlanFeatureTable {
    /// The shipped table. Feature sets are cumulative across tiers.
    pub fn builtin() -> Self {
        let mut entries = BTreeMap::new();

        entries.insert(
            Plan::Free,
            PlanEntry {
                features: HashSet::new(),
                limits: PlanLimits {
                    seats: 3,
                    customers: 25,
                    invoices_per_month: 20,
                },
            },
        );

        let basic: HashSet<Feature> = [Feature::CsvImport, Feature::CustomBranding]
            .into_iter()
            .collect();
        entries.insert(
            Plan::Basic,
            PlanEntry {
                features: basic.clone(),
                limits: PlanLimits {
                    seats: 10,
                    customers: 500,
                    invoices_per_month: 200,
                },
            },
        );

        let mut pro = basic;
        pro.extend([
            Feature::RecurringInvoices,
            Feature::Analytics,
            Feature::ApiAccess,
        ]);
        entries.insert(
            Plan::Pro,
            PlanEntry {
                features: pro.clone(),
                limits: PlanLimits {
                    seats: 25,
                    customers: 5_000,
                    invoices_per_month: 2_000,
                },
            },
        );

        let mut enterprise = pro;
        enterprise.extend([Feature::AuditLog, Feature::SsoLogin]);
        entries.insert(
            Plan::Enterprise,
            PlanEntry {
                features: enterprise,
                limits: PlanLimits {
                    seats: PRACTICALLY_UNLIMITED,
                    customers: PRACTICALLY_UNLIMITED,
                    invoices_per_month: PRACTICALLY_UNLIMITED,
                },
            },
        );

        Self { entries }
    }

    /// Validate the table at load time.
    ///
    /// Every feature must be reachable from some tier, and feature sets must
    /// be monotone along the upgrade order (a higher tier never loses a
    /// feature a lower tier has).
    pub fn validate(&self) -> DomainResult<()> {
        for feature in Feature::ALL {
            if self.min_plan_for(feature).is_none() {
                return Err(DomainError::invariant(format!(
                    "feature '{feature}' is not unlockable by any plan tier"
                )));
            }
        }

        let mut previous: Option<(&Plan, &PlanEntry)> = None;
        for (plan, entry) in &self.entries {
            if let Some((prev_plan, prev_entry)) = previous {
                if !prev_entry.features.is_subset(&entry.features) {
                    return Err(DomainError::invariant(format!(
                        "plan '{plan}' loses features that '{prev_plan}' has"
                    )));
                }
            }
            previous = Some((plan, entry));
        }

        Ok(())
    }

    pub fn allows(&self, plan: Plan, feature: Feature) -> bool {
        self.entries
            .get(&plan)
            .is_some_and(|entry| entry.features.contains(&feature))
    }

    /// Lowest tier (in upgrade order) whose feature set contains `feature`.
    pub fn min_plan_for(&self, feature: Feature) -> Option<Plan> {
        self.entries
            .iter()
            .find(|(_, entry)| entry.features.contains(&feature))
            .map(|(plan, _)| *plan)
    }

    pub fn limits(&self, plan: Plan) -> PlanLimits {
        self.entries
            .get(&plan)
            .map(|entry| entry.limits)
            // Unknown tier cannot happen with the closed enum; fall back to
            // the most restrictive tier if the table is ever partial.
            .unwrap_or(PlanLimits {
                seats: 0,
                customers: 0,
                invoices_per_month: 0,
            })
    }
}

impl Default for PlanFeatureTable {
    fn default() -> Self {
        Self::builtin()
    }
}
