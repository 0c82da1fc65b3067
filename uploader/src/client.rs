//! Two-step direct upload: ask the signer, then send the bytes to the store

use std::collections::BTreeMap;

use bytes::Bytes;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    multipart::{Form, Part},
    Client, Response,
};
use serde::Serialize;
use tracing::instrument;
use upload_types::{
    public_url_for, SigningRequest, SigningResponse, DEFAULT_CONTENT_TYPE, MULTIPART_FILE_FIELD,
};

use crate::{
    config::UploaderConfig,
    error::{TransferMethod, UploadError},
};

/// Bytes to upload together with their content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPayload {
    /// Object content
    pub data: Bytes,
    /// MIME type of the content, if known
    pub content_type: Option<String>,
}

impl UploadPayload {
    /// Payload with no declared content type
    #[must_use]
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            content_type: None,
        }
    }

    /// Declares the payload's content type
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Payload size in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload has no bytes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Per-upload overrides
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOptions {
    /// Content type to sign and send instead of the payload's own
    pub content_type: Option<String>,
    /// Opaque metadata forwarded to the signer
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// Result of a completed upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    /// Key the object was written to
    pub object_key: String,
    /// Conventional public location, if one is known
    pub public_url: Option<String>,
}

/// Client for the signer + object store handoff.
///
/// Holds no per-upload state; concurrent uploads through one instance are
/// independent.
#[derive(Debug, Clone)]
pub struct Uploader {
    config: UploaderConfig,
    http_client: Client,
}

impl Uploader {
    /// Creates an uploader with a default HTTP client
    ///
    /// # Errors
    ///
    /// - `UploadError::Misconfigured` if the signing endpoint is unusable
    /// - `UploadError::Transport` if the HTTP client cannot be built
    pub fn new(config: UploaderConfig) -> Result<Self, UploadError> {
        let http_client = Client::builder()
            .user_agent(format!("report-uploader/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Self::with_client(config, http_client)
    }

    /// Creates an uploader on top of a caller-configured HTTP client
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Misconfigured` if the signing endpoint is unusable
    pub fn with_client(config: UploaderConfig, http_client: Client) -> Result<Self, UploadError> {
        config.validate()?;
        Ok(Self {
            config,
            http_client,
        })
    }

    /// Uploads `payload` to `object_key`.
    ///
    /// 1. Requests a write authorization from the signer
    /// 2. Sends the payload straight to the store, by PUT or multipart POST
    ///
    /// Nothing is retried; a failed attempt must be restarted from step 1.
    ///
    /// # Errors
    ///
    /// - `UploadError::InvalidInput` - empty object key
    /// - `UploadError::SigningFailed` - signer answered with a non-success status
    /// - `UploadError::ProtocolError` - signer answer matches no transfer mode
    /// - `UploadError::UploadFailed` - store rejected the transfer
    /// - `UploadError::Transport` - network failure on either step
    #[instrument(skip(self, payload, options), fields(size = payload.len()))]
    pub async fn upload(
        &self,
        payload: UploadPayload,
        object_key: &str,
        options: UploadOptions,
    ) -> Result<UploadOutcome, UploadError> {
        if object_key.is_empty() {
            return Err(UploadError::InvalidInput("object key is empty".to_string()));
        }

        let content_type = options
            .content_type
            .or_else(|| payload.content_type.clone())
            .filter(|ct| !ct.is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        let signing_request = SigningRequest {
            key: Some(object_key.to_string()),
            content_type: Some(content_type.clone()),
            metadata: options.metadata,
        };
        let authorization = self.request_signature(&signing_request).await?;

        if authorization.url().is_empty() {
            return Err(UploadError::ProtocolError(
                "signing response has an empty url".to_string(),
            ));
        }

        let public_url = authorization
            .public_url()
            .filter(|url| !url.is_empty())
            .map(ToString::to_string)
            .or_else(|| {
                self.config
                    .public_base_url
                    .as_deref()
                    .and_then(|base| public_url_for(base, object_key))
            });

        match authorization {
            SigningResponse::Put { url, headers, .. } => {
                self.put_object(&url, &headers, payload.data, &content_type)
                    .await?;
            }
            SigningResponse::Post { url, fields, .. } => {
                self.post_form(&url, fields, payload.data, &content_type, object_key)
                    .await?;
            }
        }

        tracing::info!(object_key, "upload completed");

        Ok(UploadOutcome {
            object_key: object_key.to_string(),
            public_url,
        })
    }

    async fn request_signature(
        &self,
        request: &SigningRequest,
    ) -> Result<SigningResponse, UploadError> {
        let mut builder = self
            .http_client
            .post(&self.config.sign_endpoint)
            .json(request);
        if let Some(token) = &self.config.bearer_token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = best_effort_text(response).await;
            tracing::warn!(%status, "signing request rejected");
            return Err(UploadError::SigningFailed { status, body });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| UploadError::ProtocolError(e.to_string()))
    }

    async fn put_object(
        &self,
        url: &str,
        signed_headers: &BTreeMap<String, String>,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), UploadError> {
        let mut headers = HeaderMap::with_capacity(signed_headers.len() + 1);
        for (name, value) in signed_headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                UploadError::ProtocolError(format!("invalid header name in signing response: {name}"))
            })?;
            let value = HeaderValue::from_str(value).map_err(|_| {
                UploadError::ProtocolError(format!("invalid header value for {name}"))
            })?;
            headers.insert(name, value);
        }

        // Header names are normalized, so this also catches `content-type`
        if !headers.contains_key(CONTENT_TYPE) {
            let value = HeaderValue::from_str(content_type).map_err(|_| {
                UploadError::InvalidInput(format!("invalid content type: {content_type}"))
            })?;
            headers.insert(CONTENT_TYPE, value);
        }

        let response = self
            .http_client
            .put(url)
            .headers(headers)
            .body(data)
            .send()
            .await?;

        ensure_stored(response, TransferMethod::Put).await
    }

    async fn post_form(
        &self,
        url: &str,
        fields: BTreeMap<String, String>,
        data: Bytes,
        content_type: &str,
        object_key: &str,
    ) -> Result<(), UploadError> {
        let file_name = object_key
            .rsplit('/')
            .next()
            .unwrap_or(object_key)
            .to_string();

        let length = data.len() as u64;
        let file = Part::stream_with_length(data, length)
            .file_name(file_name)
            .mime_str(content_type)
            .map_err(|_| UploadError::InvalidInput(format!("invalid content type: {content_type}")))?;

        // Signed fields must precede the file part
        let form = fields
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value))
            .part(MULTIPART_FILE_FIELD, file);

        let response = self.http_client.post(url).multipart(form).send().await?;

        ensure_stored(response, TransferMethod::Post).await
    }
}

async fn ensure_stored(response: Response, method: TransferMethod) -> Result<(), UploadError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = best_effort_text(response).await;
    tracing::warn!(%status, %method, "object store rejected upload");
    Err(UploadError::UploadFailed {
        method,
        status,
        body,
    })
}

async fn best_effort_text(response: Response) -> String {
    response.text().await.unwrap_or_default()
}
