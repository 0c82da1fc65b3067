//! JWT-related error types

use thiserror::Error;

/// Errors that can occur while validating a caller token
#[derive(Error, Debug)]
pub enum JwtError {
    /// Signature, expiry or structure check failed
    #[error("Invalid or expired token")]
    ValidationError(#[from] jsonwebtoken::errors::Error),

    /// Token carries an unusable subject
    #[error("Token subject is not a valid user id")]
    InvalidSubject,
}
