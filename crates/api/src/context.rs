use opsledger_authz::JwtClaims;
use opsledger_core::ActorId;

/// Verified credential context for a request.
///
/// Carries identity only. Memberships, roles, and operating context are
/// re-derived server-side per request; nothing client-asserted rides along.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialContext {
    claims: JwtClaims,
}

impl CredentialContext {
    pub fn new(claims: JwtClaims) -> Self {
        Self { claims }
    }

    pub fn actor_id(&self) -> ActorId {
        self.claims.sub
    }

    pub fn claims(&self) -> &JwtClaims {
        &self.claims
    }
}
