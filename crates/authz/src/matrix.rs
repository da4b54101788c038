//! Static permission matrix: default role capabilities per (module, action).
//!
//! Pure data, no runtime mutation. This is the single source for the default
//! capability table; both the UX-path resolver and the boundary enforcer are
//! compiled against this exact function, so the two copies cannot diverge.
//!
//! Explicit-grant modules (`Module::requires_explicit_grant`) are listed here
//! as owner-only: for those modules the resolver never consults the matrix
//! for non-owner roles — absence of an override row is already a deny.

use crate::{Action, Module, OrgRole};

/// Bumped whenever a default capability changes. Deploy tooling pins the
/// client bundle and the boundary to the same version.
pub const MATRIX_VERSION: u32 = 4;

/// Default capability table: is `role` allowed `module.action` absent any
/// per-tenant override?
pub fn default_allows(module: Module, action: Action, role: OrgRole) -> bool {
    use Action::*;
    use OrgRole::*;

    if role == Owner {
        return true;
    }

    match module {
        Module::Invoices => match action {
            View => true,
            Create | Update => matches!(role, Manager | Accounts | SalesStaff),
            Delete | Export => matches!(role, Manager | Accounts),
            Approve => role == Manager,
        },
        Module::Quotations => match action {
            View => true,
            Create | Update => matches!(role, Manager | SalesStaff | Designer),
            Delete => role == Manager,
            Export => matches!(role, Manager | SalesStaff),
            Approve => role == Manager,
        },
        Module::Customers => match action {
            View => true,
            Create | Update => matches!(role, Manager | Accounts | SalesStaff),
            // Destructive customer-record operations are owner-only by
            // default; tenants opt roles in through overrides.
            Delete => false,
            Export => matches!(role, Manager | Accounts),
            Approve => false,
        },
        Module::Team => match action {
            View => role == Manager,
            Create | Update | Delete | Export | Approve => false,
        },
        Module::Reports => match action {
            View | Export => matches!(role, Manager | Accounts),
            Create | Update | Delete | Approve => false,
        },
        // Explicit-grant modules: owner-only defaults.
        Module::Payroll | Module::Attendance | Module::Settings => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PermissionKey;

    #[test]
    fn owner_is_allowed_everything_by_default() {
        for key in PermissionKey::all() {
            assert!(
                default_allows(key.module, key.action, OrgRole::Owner),
                "owner denied {key}"
            );
        }
    }

    #[test]
    fn customers_delete_defaults_to_owner_only() {
        for role in OrgRole::ALL {
            let allowed = default_allows(Module::Customers, Action::Delete, role);
            assert_eq!(allowed, role == OrgRole::Owner, "{role}");
        }
    }

    #[test]
    fn every_role_can_view_core_business_modules() {
        for role in OrgRole::ALL {
            assert!(default_allows(Module::Invoices, Action::View, role));
            assert!(default_allows(Module::Quotations, Action::View, role));
            assert!(default_allows(Module::Customers, Action::View, role));
        }
    }

    #[test]
    fn explicit_grant_modules_default_deny_for_non_owner() {
        for module in [Module::Payroll, Module::Attendance, Module::Settings] {
            for action in Action::ALL {
                for role in OrgRole::ALL {
                    if role == OrgRole::Owner {
                        continue;
                    }
                    assert!(!default_allows(module, action, role), "{module}.{action} {role}");
                }
            }
        }
    }
}
