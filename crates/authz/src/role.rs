//! Org roles and effective roles.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use opsledger_core::DomainError;

/// Tenant-scoped organization role.
///
/// The derive ordering (owner first) is used only for display; permission is
/// determined by matrix/override membership, never by rank comparison.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum OrgRole {
    Owner,
    Manager,
    Accounts,
    SalesStaff,
    Designer,
    Employee,
}

impl OrgRole {
    pub const ALL: [OrgRole; 6] = [
        OrgRole::Owner,
        OrgRole::Manager,
        OrgRole::Accounts,
        OrgRole::SalesStaff,
        OrgRole::Designer,
        OrgRole::Employee,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrgRole::Owner => "owner",
            OrgRole::Manager => "manager",
            OrgRole::Accounts => "accounts",
            OrgRole::SalesStaff => "sales_staff",
            OrgRole::Designer => "designer",
            OrgRole::Employee => "employee",
        }
    }
}

impl core::fmt::Display for OrgRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrgRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(OrgRole::Owner),
            "manager" => Ok(OrgRole::Manager),
            "accounts" => Ok(OrgRole::Accounts),
            "sales_staff" => Ok(OrgRole::SalesStaff),
            "designer" => Ok(OrgRole::Designer),
            "employee" => Ok(OrgRole::Employee),
            other => Err(DomainError::validation(format!("unknown org role: {other}"))),
        }
    }
}

/// The role an actor effectively holds for one tenant-scoped evaluation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EffectiveRole {
    /// Platform operator acting in console scope (no tenant data access).
    PlatformOperator,
    /// Synthetic owner granted through an active impersonation session.
    ImpersonatedOwner,
    /// An ordinary tenant membership role.
    Org(OrgRole),
    /// No role for this tenant.
    None,
}

impl EffectiveRole {
    /// Owner-level access, real or synthetic. Bypasses override lookups.
    pub fn is_owner(&self) -> bool {
        matches!(
            self,
            EffectiveRole::Org(OrgRole::Owner) | EffectiveRole::ImpersonatedOwner
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EffectiveRole::PlatformOperator => "platform_operator",
            // Impersonation carries owner semantics on the wire; the
            // session itself is the audited artifact.
            EffectiveRole::ImpersonatedOwner => "owner",
            EffectiveRole::Org(role) => role.as_str(),
            EffectiveRole::None => "none",
        }
    }
}

impl core::fmt::Display for EffectiveRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EffectiveRole {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_strings_round_trip() {
        for role in OrgRole::ALL {
            assert_eq!(role.as_str().parse::<OrgRole>().unwrap(), role);
        }
    }

    #[test]
    fn owner_semantics_cover_real_and_synthetic_owner() {
        assert!(EffectiveRole::Org(OrgRole::Owner).is_owner());
        assert!(EffectiveRole::ImpersonatedOwner.is_owner());
        assert!(!EffectiveRole::Org(OrgRole::Manager).is_owner());
        assert!(!EffectiveRole::PlatformOperator.is_owner());
        assert!(!EffectiveRole::None.is_owner());
    }
}
