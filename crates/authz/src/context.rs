//! Operating contexts and the context-isolation guard.
//!
//! An actor is always in exactly one of three contexts: ordinary tenant
//! user, platform-operator console, or operator-impersonating-a-tenant.
//! Tenant business data is unreachable outside the first and third. The
//! table-read guard protects context isolation, a different invariant than
//! role-based authorization, and therefore runs unconditionally before the
//! role resolver is consulted.

use serde::Serialize;
use thiserror::Error;

use opsledger_core::TenantId;

use crate::{Actor, Decision, ImpersonationRegistry, ImpersonationSession, ReasonCode};

/// Which of the three mutually exclusive contexts the actor operates in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "context")]
pub enum OperatingContext {
    /// Ordinary tenant user.
    User,
    /// Platform-operator console (no tenant data reachable).
    Admin,
    /// Platform operator impersonating one tenant.
    Impersonating { tenant_id: TenantId },
}

/// Rejected context transition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("console entry requires a platform operator")]
    NotPlatformOperator,

    #[error("an active impersonation session must be ended before console entry")]
    SessionStillActive,

    #[error("impersonation can only be started from the console context")]
    NotInConsole,

    #[error("no active impersonation session")]
    NoActiveSession,
}

/// Derive the actor's current operating context from the session registry.
///
/// Ordinary users are always `User`. A platform operator is `Impersonating`
/// while a session is live (the registry enforces the bounded lifetime) and
/// `Admin` otherwise.
pub fn operating_context(actor: &Actor, registry: &ImpersonationRegistry) -> OperatingContext {
    if !actor.is_platform_operator {
        return OperatingContext::User;
    }

    match registry.active_session(actor.actor_id) {
        Some(session) => OperatingContext::Impersonating {
            tenant_id: session.tenant_id,
        },
        None => OperatingContext::Admin,
    }
}

/// Context state machine for one actor's console lifecycle.
///
/// Transition table:
/// - `User → Admin`: platform operators only, and only with no live session.
/// - `Admin → Impersonating`: starts an audited session for one tenant.
/// - `Impersonating → Admin`: explicit end (the registry also ends sessions
///   at the duration ceiling on observation).
///
/// Holding both a console-scoped and tenant-scoped capability at once is
/// unrepresentable: console entry is rejected while a session is live.
#[derive(Debug)]
pub struct ContextGuard {
    state: OperatingContext,
}

impl ContextGuard {
    pub fn new() -> Self {
        Self {
            state: OperatingContext::User,
        }
    }

    pub fn state(&self) -> OperatingContext {
        self.state
    }

    /// `User → Admin`.
    pub fn enter_console(
        &mut self,
        actor: &Actor,
        registry: &ImpersonationRegistry,
    ) -> Result<(), ContextError> {
        if !actor.is_platform_operator {
            self.state = OperatingContext::User;
            return Err(ContextError::NotPlatformOperator);
        }
        if registry.active_session(actor.actor_id).is_some() {
            return Err(ContextError::SessionStillActive);
        }

        self.state = OperatingContext::Admin;
        Ok(())
    }

    /// `Admin → Impersonating`.
    pub fn start_impersonation(
        &mut self,
        actor: &Actor,
        tenant_id: TenantId,
        registry: &ImpersonationRegistry,
    ) -> Result<ImpersonationSession, ContextError> {
        if self.state != OperatingContext::Admin {
            return Err(ContextError::NotInConsole);
        }

        let session = registry
            .start(actor, tenant_id)
            .map_err(|_| ContextError::SessionStillActive)?;

        self.state = OperatingContext::Impersonating { tenant_id };
        Ok(session)
    }

    /// `Impersonating → Admin`.
    pub fn end_impersonation(
        &mut self,
        actor: &Actor,
        registry: &ImpersonationRegistry,
    ) -> Result<(), ContextError> {
        let OperatingContext::Impersonating { .. } = self.state else {
            return Err(ContextError::NoActiveSession);
        };

        registry
            .end(actor.actor_id)
            .map_err(|_| ContextError::NoActiveSession)?;

        self.state = OperatingContext::Admin;
        Ok(())
    }
}

impl Default for ContextGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Tenant-scoped data categories that must never be reachable from the
/// console context.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessTable {
    Invoices,
    Quotations,
    Customers,
    Payroll,
    AttendanceRecords,
    Employees,
    Payments,
}

impl BusinessTable {
    pub const ALL: [BusinessTable; 7] = [
        BusinessTable::Invoices,
        BusinessTable::Quotations,
        BusinessTable::Customers,
        BusinessTable::Payroll,
        BusinessTable::AttendanceRecords,
        BusinessTable::Employees,
        BusinessTable::Payments,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BusinessTable::Invoices => "invoices",
            BusinessTable::Quotations => "quotations",
            BusinessTable::Customers => "customers",
            BusinessTable::Payroll => "payroll",
            BusinessTable::AttendanceRecords => "attendance_records",
            BusinessTable::Employees => "employees",
            BusinessTable::Payments => "payments",
        }
    }
}

/// Unconditional context-isolation check for a business-table read.
///
/// Fails closed from the console context regardless of any cached permission
/// decision, and restricts an impersonating operator to the impersonated
/// tenant. Runs before any role logic.
pub fn guard_table_read(
    context: OperatingContext,
    table: BusinessTable,
    tenant_id: TenantId,
) -> Result<(), Decision> {
    match context {
        OperatingContext::User => Ok(()),
        OperatingContext::Admin => Err(Decision::denied(
            ReasonCode::CrossContextViolation,
            format!(
                "table '{}' is tenant-scoped and unreachable from the console context",
                table.as_str()
            ),
        )),
        OperatingContext::Impersonating { tenant_id: session_tenant } => {
            if session_tenant == tenant_id {
                Ok(())
            } else {
                Err(Decision::denied(
                    ReasonCode::CrossContextViolation,
                    format!(
                        "impersonation session is scoped to another tenant; table '{}' is unreachable",
                        table.as_str()
                    ),
                ))
            }
        }
    }
}
