//! Caller token validation (HS256).
//!
//! Tokens are minted by the identity provider in front of the signer and
//! carry the caller's user id as `sub`. Only signature, `exp` and the
//! subject shape are checked here; key ownership is decided by the caller
//! extractor.

pub mod error;

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use error::JwtError;

/// Claims carried by a caller token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerClaims {
    /// User id of the caller
    pub sub: String,
    /// Expiry as a Unix timestamp
    pub exp: u64,
}

/// Validates caller tokens against a shared secret
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Creates a verifier for HS256 tokens signed with `secret`
    #[must_use]
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Validates `token` and returns its claims
    ///
    /// # Errors
    ///
    /// - `JwtError::ValidationError` for a bad signature, expired or malformed token
    /// - `JwtError::InvalidSubject` when `sub` is empty or contains a path separator
    pub fn validate(&self, token: &str) -> Result<CallerClaims, JwtError> {
        let claims = decode::<CallerClaims>(token, &self.decoding_key, &self.validation)?.claims;

        if claims.sub.is_empty()
            || claims.sub.contains('/')
            || claims.sub == "."
            || claims.sub == ".."
        {
            return Err(JwtError::InvalidSubject);
        }

        Ok(claims)
    }
}
