use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use upload_types::validate_key_segments;

use crate::{state::AppState, types::SignError};

/// Root of every per-user key prefix
pub const USER_KEY_ROOT: &str = "users";

/// Authenticated user information extracted from the bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// User id from the token subject
    pub user_id: String,
}

impl AuthenticatedUser {
    /// Key prefix this user may write under
    #[must_use]
    pub fn key_prefix(&self) -> String {
        format!("{USER_KEY_ROOT}/{}/", self.user_id)
    }
}

/// Identity of the party asking for a signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    /// Caller authentication is disabled (development only)
    Anonymous,
    /// Caller presented a valid token
    User(AuthenticatedUser),
}

impl Caller {
    /// Checks that this caller may write `key`
    ///
    /// # Errors
    ///
    /// Returns `SignError::ForbiddenKey` when an authenticated caller asks
    /// for a key outside `users/{user_id}/` or with empty, `.` or `..` segments
    pub fn authorize_key(&self, key: &str) -> Result<(), SignError> {
        let Self::User(user) = self else {
            return Ok(());
        };

        let owned = key
            .strip_prefix(&user.key_prefix())
            .is_some_and(|rest| !rest.is_empty());

        if !owned || validate_key_segments(key).is_err() {
            return Err(SignError::ForbiddenKey(key.to_string()));
        }

        Ok(())
    }
}

/// Axum extractor for the signing caller.
///
/// When the state carries no verifier every request is [`Caller::Anonymous`];
/// otherwise a valid `Authorization: Bearer` token is required.
impl FromRequestParts<AppState> for Caller {
    type Rejection = SignError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(verifier) = state.jwt_verifier.as_deref() else {
            return Ok(Self::Anonymous);
        };

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|header| header.to_str().ok())
            .and_then(|header| header.strip_prefix("Bearer "))
            .ok_or(SignError::Unauthorized("missing bearer token"))?;

        let claims = verifier
            .validate(token)
            .map_err(|_| SignError::Unauthorized("invalid or expired token"))?;

        Ok(Self::User(AuthenticatedUser {
            user_id: claims.sub,
        }))
    }
}
