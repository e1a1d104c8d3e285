//! JWT claims model and token validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JWT claims model.
///
/// The minimal set of claims the platform expects once a token has been
/// decoded. Token *issuance* lives with the identity service; this crate only
/// verifies and reads. Ids stay raw here: a signed token can still carry a
/// junk subject, and rejecting it is the authorization pipeline's job, not
/// the deserializer's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject / authenticated user id.
    pub sub: i64,

    /// Tenant context for the token, when the token is tenant-bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<i64>,

    /// Issued-at, seconds since epoch.
    pub iat: i64,

    /// Expiration, seconds since epoch.
    pub exp: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (iat is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,

    #[error("token rejected: {0}")]
    Invalid(String),
}

/// Deterministically validate the claims' time window against a caller
/// clock. Signature verification is the validator's job, not this function's.
pub fn validate_claims(
    claims: &JwtClaims,
    now: DateTime<Utc>,
) -> Result<(), TokenValidationError> {
    let ts = now.timestamp();
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if ts < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if ts >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

/// Verifies a bearer token and yields its claims.
///
/// Behind a trait so the API layer can hold an `Arc<dyn JwtValidator>` and
/// tests can substitute a stub.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError>;
}

/// HS256 shared-secret validator.
pub struct Hs256JwtValidator {
    decoding_key: jsonwebtoken::DecodingKey,
}

impl Hs256JwtValidator {
    pub fn new(secret: Vec<u8>) -> Self {
        Self {
            decoding_key: jsonwebtoken::DecodingKey::from_secret(&secret),
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<JwtClaims, TokenValidationError> {
        let mut validation = jsonwebtoken::Validation::new(jsonwebtoken::Algorithm::HS256);
        // The time window is checked against the caller's clock below, so it
        // stays deterministic and testable.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| TokenValidationError::Invalid(e.to_string()))?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}
