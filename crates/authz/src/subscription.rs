//! Tenant subscription record and status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use opsledger_core::{DomainError, DomainResult};

use crate::Plan;

/// Subscription lifecycle status.
///
/// Transitions: `trial → {active, expired, cancelled}`,
/// `active → {suspended, expired, cancelled}`. The remaining states are
/// terminal with respect to gating and require external reactivation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Trial,
    Active,
    Suspended,
    Expired,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Trial => "trial",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Suspended => "suspended",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Suspended
                | SubscriptionStatus::Expired
                | SubscriptionStatus::Cancelled
        )
    }

    pub fn can_transition_to(&self, next: SubscriptionStatus) -> bool {
        use SubscriptionStatus::*;
        match self {
            Trial => matches!(next, Active | Expired | Cancelled),
            Active => matches!(next, Suspended | Expired | Cancelled),
            Suspended | Expired | Cancelled => false,
        }
    }
}

impl core::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for SubscriptionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trial" => Ok(SubscriptionStatus::Trial),
            "active" => Ok(SubscriptionStatus::Active),
            "suspended" => Ok(SubscriptionStatus::Suspended),
            "expired" => Ok(SubscriptionStatus::Expired),
            "cancelled" => Ok(SubscriptionStatus::Cancelled),
            other => Err(DomainError::validation(format!(
                "unknown subscription status: {other}"
            ))),
        }
    }
}

/// A tenant's subscription. Exactly one per tenant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub plan: Plan,
    pub status: SubscriptionStatus,
    pub trial_ends_at: Option<DateTime<Utc>>,
}

impl Subscription {
    pub fn new(plan: Plan, status: SubscriptionStatus) -> Self {
        Self {
            plan,
            status,
            trial_ends_at: None,
        }
    }

    pub fn trial(plan: Plan, trial_ends_at: DateTime<Utc>) -> Self {
        Self {
            plan,
            status: SubscriptionStatus::Trial,
            trial_ends_at: Some(trial_ends_at),
        }
    }

    /// Whether non-read actions are permitted under this subscription.
    ///
    /// Active, or in a trial whose end has not passed. A trial with no
    /// recorded end date has no end to be past and counts as operational.
    pub fn is_operational(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            SubscriptionStatus::Active => true,
            SubscriptionStatus::Trial => self.trial_ends_at.is_none_or(|ends| now < ends),
            _ => false,
        }
    }

    /// Transition to a new status, enforcing the state machine.
    pub fn transition_to(&mut self, next: SubscriptionStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::invariant(format!(
                "subscription cannot transition from {} to {}",
                self.status, next
            )));
        }
        self.status = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn terminal_states_have_no_transitions() {
        use SubscriptionStatus::*;
        for terminal in [Suspended, Expired, Cancelled] {
            for next in [Trial, Active, Suspended, Expired, Cancelled] {
                assert!(!terminal.can_transition_to(next), "{terminal} -> {next}");
            }
        }
    }

    #[test]
    fn trial_is_operational_until_its_end() {
        let now = Utc::now();
        let sub = Subscription::trial(Plan::Basic, now + Duration::days(7));
        assert!(sub.is_operational(now));
        assert!(!sub.is_operational(now + Duration::days(8)));
    }

    #[test]
    fn expired_subscription_is_not_operational() {
        let sub = Subscription::new(Plan::Pro, SubscriptionStatus::Expired);
        assert!(!sub.is_operational(Utc::now()));
    }

    #[test]
    fn transition_guard_rejects_reactivation_of_terminal_states() {
        let mut sub = Subscription::new(Plan::Pro, SubscriptionStatus::Expired);
        assert!(sub.transition_to(SubscriptionStatus::Active).is_err());

        let mut sub = Subscription::new(Plan::Pro, SubscriptionStatus::Trial);
        sub.transition_to(SubscriptionStatus::Active).unwrap();
        sub.transition_to(SubscriptionStatus::Suspended).unwrap();
    }
}
