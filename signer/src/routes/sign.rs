use std::collections::BTreeMap;

use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use tracing::instrument;
use upload_types::{SigningRequest, SigningResponse};

use crate::{
    middleware::Caller,
    object_storage::PutTarget,
    state::AppState,
    types::SignError,
};

/// Issues a pre-signed PUT URL for a single object
///
/// Checks run in a fixed order so that callers get the most specific
/// rejection:
/// 1. caller identity (rejected by the `Caller` extractor)
/// 2. key presence
/// 3. key ownership
/// 4. bucket configuration
/// 5. signing
///
/// The body is decoded leniently; anything that does not yield a non-empty
/// `key` is answered with `Missing key`.
///
/// # Errors
///
/// - `SignError::MissingKey` - key absent, empty, or body not decodable
/// - `SignError::ForbiddenKey` - key outside the caller's prefix
/// - `SignError::BucketNotConfigured` - no target bucket
/// - `SignError::Signing` - the store client failed; detail is logged only
#[instrument(skip_all, fields(key = tracing::field::Empty))]
pub async fn sign_upload(
    State(state): State<AppState>,
    caller: Caller,
    body: Bytes,
) -> Result<Json<SigningResponse>, SignError> {
    let request = parse_signing_request(&body);
    let key = request.object_key().ok_or(SignError::MissingKey)?;
    tracing::Span::current().record("key", key);

    caller.authorize_key(key)?;

    let bucket = state
        .config
        .bucket
        .as_deref()
        .ok_or(SignError::BucketNotConfigured)?;

    let target = PutTarget {
        bucket,
        key,
        content_type: request.content_type_or_default(),
    };
    let presigned = state
        .presigner
        .presign_put(target, state.config.presigned_url_expiry())
        .await?;

    tracing::info!(
        expires_at = %presigned.expires_at,
        signed_headers = ?presigned.headers.keys().collect::<Vec<_>>(),
        "issued presigned upload url"
    );

    // Response headers stay empty; the client sets the signed Content-Type
    Ok(Json(SigningResponse::Put {
        url: presigned.url,
        headers: BTreeMap::new(),
        public_url: state.config.public_url_for(key),
    }))
}

/// Answers the browser pre-flight probe; never authenticated
#[allow(clippy::unused_async)]
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Rejects every verb other than POST and OPTIONS
#[allow(clippy::unused_async)]
pub async fn method_not_allowed() -> SignError {
    SignError::MethodNotAllowed
}

fn parse_signing_request(body: &[u8]) -> SigningRequest {
    if body.is_empty() {
        return SigningRequest::default();
    }

    serde_json::from_slice(body).unwrap_or_else(|err| {
        tracing::debug!(error = %err, "undecodable signing request body");
        SigningRequest::default()
    })
}
