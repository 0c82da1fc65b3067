//! Universal error handling for the signer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use upload_types::ErrorBody;

use crate::object_storage::StorageError;

/// Errors raised while reading the signer configuration
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `APP_ENV` holds an unknown stage
    #[error("Invalid environment: {0}")]
    InvalidEnvironment(String),

    /// A variable could not be parsed
    #[error("Invalid value for {name}: {value}")]
    InvalidValue {
        /// Variable name
        name: &'static str,
        /// Offending value
        value: String,
    },

    /// Caller authentication is mandatory outside development
    #[error("SIGNER_JWT_SECRET must be set in the {0} environment")]
    MissingJwtSecret(&'static str),
}

/// Rejections of a signing request.
///
/// The `Display` text is exactly what the caller sees; details carried by
/// a variant are only logged.
#[derive(Error, Debug)]
pub enum SignError {
    /// Method other than POST or OPTIONS
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Key absent or empty
    #[error("Missing key")]
    MissingKey,

    /// Bearer token missing or invalid
    #[error("Unauthorized")]
    Unauthorized(&'static str),

    /// Key outside the caller's own prefix
    #[error("Forbidden key")]
    ForbiddenKey(String),

    /// No bucket configured on the server
    #[error("Bucket not configured")]
    BucketNotConfigured,

    /// The store client failed to produce a signature
    #[error("Sign error")]
    Signing(#[from] StorageError),
}

impl SignError {
    /// HTTP status the rejection maps to
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::MissingKey => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::ForbiddenKey(_) => StatusCode::FORBIDDEN,
            Self::BucketNotConfigured | Self::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code used in logs
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed => "method_not_allowed",
            Self::MissingKey => "missing_key",
            Self::Unauthorized(_) => "unauthorized",
            Self::ForbiddenKey(_) => "forbidden_key",
            Self::BucketNotConfigured => "bucket_not_configured",
            Self::Signing(_) => "sign_error",
        }
    }
}

impl IntoResponse for SignError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            Self::Unauthorized(reason) => {
                tracing::warn!(code = self.code(), reason, "Client error");
            }
            Self::ForbiddenKey(key) => {
                tracing::warn!(code = self.code(), key = key.as_str(), "Client error");
            }
            Self::Signing(err) => {
                tracing::error!(code = self.code(), error = %err, "Server error");
            }
            _ => match status.as_u16() {
                400..=499 => tracing::warn!(code = self.code(), "Client error"),
                500..=599 => tracing::error!(code = self.code(), "Server error"),
                _ => {}
            },
        }

        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
