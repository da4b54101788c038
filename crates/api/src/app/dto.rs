//! Request/response DTOs for the authorization surfaces.

use serde::Deserialize;

use opsledger_authz::{Feature, OrgRole, PermissionKey};
use opsledger_core::TenantId;

/// Body of the UX-path authorization probe and the explain endpoint.
#[derive(Debug, Deserialize)]
pub struct AuthorizeRequest {
    pub tenant_id: TenantId,
    pub permission: PermissionKey,
    #[serde(default)]
    pub feature: Option<Feature>,
}

/// Body of an override upsert.
#[derive(Debug, Deserialize)]
pub struct OverridePutRequest {
    pub role: OrgRole,
    pub permission: PermissionKey,
    pub is_enabled: bool,
}

/// Body of an impersonation start.
#[derive(Debug, Deserialize)]
pub struct ImpersonationStartRequest {
    pub tenant_id: TenantId,
}

/// Body of an invoice creation (representative guarded route; the invoice
/// document itself is owned by the invoicing service).
#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    pub reference: String,
}
