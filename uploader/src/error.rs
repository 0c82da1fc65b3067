//! Error types for the two-step upload

use reqwest::StatusCode;
use thiserror::Error;

/// How the payload was sent to the object store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMethod {
    /// Raw body to a pre-signed URL
    Put,
    /// Multipart form with signed fields
    Post,
}

impl std::fmt::Display for TransferMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Put => f.write_str("PUT"),
            Self::Post => f.write_str("POST"),
        }
    }
}

/// Errors that can occur while uploading through the signer
#[derive(Error, Debug)]
pub enum UploadError {
    /// The signer answered with a non-success status
    #[error("signing endpoint returned {status}: {body}")]
    SigningFailed {
        /// Upstream status
        status: StatusCode,
        /// Upstream body, decoded best-effort
        body: String,
    },

    /// The object store rejected the transfer
    #[error("object store rejected the {method} upload with {status}: {body}")]
    UploadFailed {
        /// Transfer mode that was used
        method: TransferMethod,
        /// Upstream status
        status: StatusCode,
        /// Upstream body, decoded best-effort
        body: String,
    },

    /// The signer's answer matches neither transfer mode
    #[error("malformed signing response: {0}")]
    ProtocolError(String),

    /// Network-level failure talking to the signer or the store
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The caller passed something that cannot be uploaded
    #[error("invalid upload input: {0}")]
    InvalidInput(String),

    /// Local configuration is missing or unusable
    #[error("uploader misconfigured: {0}")]
    Misconfigured(String),
}

impl UploadError {
    /// Upstream HTTP status, for the variants that carry one
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::SigningFailed { status, .. } | Self::UploadFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}
