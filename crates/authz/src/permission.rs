//! Permission surface: modules, actions, and permission keys.
//!
//! The permission universe is a finite, enumerable set of (module, action)
//! pairs. Modules and actions are closed enums so that an invalid key is a
//! compile-time error, never a silent runtime default-deny.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use opsledger_core::DomainError;

/// Business module the permission applies to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Invoices,
    Quotations,
    Customers,
    Payroll,
    Attendance,
    Team,
    Reports,
    Settings,
}

impl Module {
    pub const ALL: [Module; 8] = [
        Module::Invoices,
        Module::Quotations,
        Module::Customers,
        Module::Payroll,
        Module::Attendance,
        Module::Team,
        Module::Reports,
        Module::Settings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Invoices => "invoices",
            Module::Quotations => "quotations",
            Module::Customers => "customers",
            Module::Payroll => "payroll",
            Module::Attendance => "attendance",
            Module::Team => "team",
            Module::Reports => "reports",
            Module::Settings => "settings",
        }
    }

    /// Whether this module requires an explicit per-tenant grant.
    ///
    /// For explicit-grant modules the absence of an override row is a deny;
    /// for the rest, absence falls back to the permission matrix default.
    /// This flag is the single switch for that behavior — there are no
    /// per-call-site fallback variations.
    pub fn requires_explicit_grant(&self) -> bool {
        matches!(self, Module::Payroll | Module::Attendance | Module::Settings)
    }
}

impl core::fmt::Display for Module {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Module {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "invoices" => Ok(Module::Invoices),
            "quotations" => Ok(Module::Quotations),
            "customers" => Ok(Module::Customers),
            "payroll" => Ok(Module::Payroll),
            "attendance" => Ok(Module::Attendance),
            "team" => Ok(Module::Team),
            "reports" => Ok(Module::Reports),
            "settings" => Ok(Module::Settings),
            other => Err(DomainError::validation(format!("unknown module: {other}"))),
        }
    }
}

/// Action performed within a module.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Create,
    Update,
    Delete,
    Export,
    Approve,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::View,
        Action::Create,
        Action::Update,
        Action::Delete,
        Action::Export,
        Action::Approve,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Export => "export",
            Action::Approve => "approve",
        }
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(Action::View),
            "create" => Ok(Action::Create),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            "export" => Ok(Action::Export),
            "approve" => Ok(Action::Approve),
            other => Err(DomainError::validation(format!("unknown action: {other}"))),
        }
    }
}

/// A (module, action) pair, e.g. `invoices.create`.
///
/// Serialized on the wire as the dotted string form.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PermissionKey {
    pub module: Module,
    pub action: Action,
}

impl PermissionKey {
    pub fn new(module: Module, action: Action) -> Self {
        Self { module, action }
    }

    /// Enumerate the full permission universe.
    pub fn all() -> impl Iterator<Item = PermissionKey> {
        Module::ALL.into_iter().flat_map(|module| {
            Action::ALL
                .into_iter()
                .map(move |action| PermissionKey { module, action })
        })
    }
}

impl core::fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}", self.module, self.action)
    }
}

impl FromStr for PermissionKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (module, action) = s
            .split_once('.')
            .ok_or_else(|| DomainError::validation(format!("malformed permission key: {s}")))?;

        Ok(Self {
            module: module.parse()?,
            action: action.parse()?,
        })
    }
}

impl Serialize for PermissionKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PermissionKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
