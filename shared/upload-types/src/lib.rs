//! Wire contract shared by the upload signer and the uploader client.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Content type assumed when neither the caller nor the payload names one
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Lifetime of a signed write authorization, in seconds
pub const PRESIGNED_URL_EXPIRY_SECS: u64 = 10 * 60;

/// Multipart field name carrying the payload in a `post` transfer
pub const MULTIPART_FILE_FIELD: &str = "file";

/// Body sent by the uploader to request a write authorization.
///
/// Every field is lenient on the way in so that the signer can answer
/// a missing key with its own error instead of a decoding failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningRequest {
    /// Full object key within the bucket
    #[serde(default)]
    pub key: Option<String>,
    /// MIME type the object will be written with
    #[serde(default)]
    pub content_type: Option<String>,
    /// Opaque metadata, forwarded as-is; never interpreted by the signer
    #[serde(default, deserialize_with = "opaque_metadata")]
    pub metadata: BTreeMap<String, Value>,
}

/// Accepts any JSON for `metadata`; only an object is kept
fn opaque_metadata<'de, D>(deserializer: D) -> Result<BTreeMap<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => map.into_iter().collect(),
        _ => BTreeMap::new(),
    })
}

impl SigningRequest {
    /// Builds a request for `key` with an explicit content type
    #[must_use]
    pub fn new(key: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            content_type: Some(content_type.into()),
            metadata: BTreeMap::new(),
        }
    }

    /// Returns the key when it is present and non-empty
    #[must_use]
    pub fn object_key(&self) -> Option<&str> {
        self.key.as_deref().filter(|key| !key.is_empty())
    }

    /// Returns the requested content type, falling back to [`DEFAULT_CONTENT_TYPE`]
    #[must_use]
    pub fn content_type_or_default(&self) -> &str {
        self.content_type
            .as_deref()
            .filter(|ct| !ct.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
    }
}

/// Write authorization returned by the signer.
///
/// Serialized with a `type` tag of `put` or `post`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SigningResponse {
    /// Pre-signed URL accepting a single HTTP PUT of the raw payload
    Put {
        /// Pre-signed target URL
        url: String,
        /// Headers to send along with the PUT
        #[serde(default)]
        headers: BTreeMap<String, String>,
        /// Conventional public location of the object, if any
        #[serde(rename = "publicUrl", default)]
        public_url: Option<String>,
    },
    /// Form-based upload: `fields` go first, then the payload as `file`
    Post {
        /// Form target URL
        url: String,
        /// Form fields that must precede the payload
        fields: BTreeMap<String, String>,
        /// Conventional public location of the object, if any
        #[serde(rename = "publicUrl", default)]
        public_url: Option<String>,
    },
}

impl SigningResponse {
    /// Target URL of the transfer
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Put { url, .. } | Self::Post { url, .. } => url,
        }
    }

    /// Public URL advertised by the signer
    #[must_use]
    pub fn public_url(&self) -> Option<&str> {
        match self {
            Self::Put { public_url, .. } | Self::Post { public_url, .. } => public_url.as_deref(),
        }
    }
}

/// Body of every signer rejection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable reason
    pub error: String,
}

/// Reasons an object key cannot be turned into a public URL or owned path
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    /// Key is empty
    #[error("object key is empty")]
    Empty,
    /// Key contains an empty, `.` or `..` segment
    #[error("object key contains an invalid segment: {0}")]
    InvalidSegment(String),
}

/// Joins a public base URL and an object key.
///
/// A single trailing slash on the base is dropped, the key is appended
/// verbatim. Returns `None` when the base is empty.
#[must_use]
pub fn public_url_for(public_base: &str, key: &str) -> Option<String> {
    if public_base.is_empty() {
        return None;
    }
    let base = public_base.strip_suffix('/').unwrap_or(public_base);
    Some(format!("{base}/{key}"))
}

/// Rejects keys whose segments would escape a prefix once normalized.
///
/// # Errors
///
/// Returns [`KeyError`] for empty keys or keys with empty, `.` or `..` segments.
pub fn validate_key_segments(key: &str) -> Result<(), KeyError> {
    if key.is_empty() {
        return Err(KeyError::Empty);
    }
    if let Some(bad) = key
        .split('/')
        .find(|segment| segment.is_empty() || *segment == "." || *segment == "..")
    {
        return Err(KeyError::InvalidSegment(bad.to_string()));
    }
    Ok(())
}
