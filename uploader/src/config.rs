//! Uploader configuration

use std::env;

use crate::error::UploadError;

/// Where to ask for signatures and how to derive public URLs
#[derive(Clone, PartialEq, Eq)]
pub struct UploaderConfig {
    /// Full URL of the signing endpoint
    pub sign_endpoint: String,
    /// Base URL used for `publicUrl` when the signer returns none
    pub public_base_url: Option<String>,
    /// Caller token sent as `Authorization: Bearer`
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for UploaderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploaderConfig")
            .field("sign_endpoint", &self.sign_endpoint)
            .field("public_base_url", &self.public_base_url)
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "** redacted **"),
            )
            .finish()
    }
}

impl UploaderConfig {
    /// Config pointing at `sign_endpoint`, with no public base and no token
    #[must_use]
    pub fn new(sign_endpoint: impl Into<String>) -> Self {
        Self {
            sign_endpoint: sign_endpoint.into(),
            public_base_url: None,
            bearer_token: None,
        }
    }

    /// Sets the local public base URL
    #[must_use]
    pub fn with_public_base_url(mut self, public_base_url: impl Into<String>) -> Self {
        self.public_base_url = Some(public_base_url.into());
        self
    }

    /// Sets the caller token
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Reads `SIGN_ENDPOINT`, `PUBLIC_BASE_URL` and `SIGN_TOKEN`
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Misconfigured` if `SIGN_ENDPOINT` is not set
    pub fn from_env() -> Result<Self, UploadError> {
        let sign_endpoint = var("SIGN_ENDPOINT")
            .ok_or_else(|| UploadError::Misconfigured("SIGN_ENDPOINT is not set".to_string()))?;

        Ok(Self {
            sign_endpoint,
            public_base_url: var("PUBLIC_BASE_URL"),
            bearer_token: var("SIGN_TOKEN"),
        })
    }

    /// Validates the endpoint before any request is made
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Misconfigured` if the endpoint is empty or not an http(s) URL
    pub fn validate(&self) -> Result<(), UploadError> {
        let endpoint = self.sign_endpoint.trim();
        if endpoint.is_empty() {
            return Err(UploadError::Misconfigured(
                "signing endpoint is empty".to_string(),
            ));
        }
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(UploadError::Misconfigured(format!(
                "signing endpoint is not an http(s) URL: {endpoint}"
            )));
        }
        Ok(())
    }
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}
