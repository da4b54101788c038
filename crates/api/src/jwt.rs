//! HS256 JWT verification.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use opsledger_authz::{validate_claims, JwtClaims, JwtValidator, TokenValidationError};

/// HS256 validator over a shared secret.
///
/// Signature verification happens here; claim time-window rules live in
/// `opsledger_authz::validate_claims` so both sides of the boundary agree.
pub struct Hs256JwtValidator {
    key: DecodingKey,
}

impl Hs256JwtValidator {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: DecodingKey::from_secret(secret),
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError> {
        // Claims carry explicit RFC3339 timestamps instead of numeric
        // exp/iat, so the library's own time checks are disabled and
        // validate_claims is authoritative.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let decoded = jsonwebtoken::decode::<JwtClaims>(token, &self.key, &validation)
            .map_err(|e| TokenValidationError::Malformed(e.to_string()))?;

        validate_claims(&decoded.claims, now)?;
        Ok(decoded.claims)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header};
    use opsledger_core::ActorId;

    use super::*;

    fn mint(secret: &str, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> String {
        let claims = JwtClaims {
            sub: ActorId::new(),
            issued_at,
            expires_at,
        };
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("failed to encode jwt")
    }

    #[test]
    fn valid_token_round_trips() {
        let now = Utc::now();
        let token = mint("secret", now - Duration::minutes(1), now + Duration::minutes(10));

        let validator = Hs256JwtValidator::new(b"secret");
        assert!(validator.validate(&token, now).is_ok());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let now = Utc::now();
        let token = mint("secret", now - Duration::minutes(1), now + Duration::minutes(10));

        let validator = Hs256JwtValidator::new(b"other-secret");
        assert!(matches!(
            validator.validate(&token, now),
            Err(TokenValidationError::Malformed(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = Utc::now();
        let token = mint("secret", now - Duration::minutes(20), now - Duration::minutes(5));

        let validator = Hs256JwtValidator::new(b"secret");
        assert_eq!(
            validator.validate(&token, now),
            Err(TokenValidationError::Expired)
        );
    }
}
