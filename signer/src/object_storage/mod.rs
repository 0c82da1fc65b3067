//! S3-compatible write authorizations
mod error;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::{presigning::PresigningConfig, Client as S3Client};
use chrono::{DateTime, Utc};

pub use error::{StorageError, StorageResult};

/// The single object a write authorization is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PutTarget<'a> {
    /// Bucket name
    pub bucket: &'a str,
    /// Object key within the bucket
    pub key: &'a str,
    /// Content type the upload must carry
    pub content_type: &'a str,
}

/// Presigned URL with expiration information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedUrl {
    /// The presigned URL for PUT operations
    pub url: String,
    /// Headers that were signed and must accompany the PUT
    pub headers: BTreeMap<String, String>,
    /// UTC timestamp when the URL expires
    pub expires_at: DateTime<Utc>,
}

/// Issues PUT authorizations without touching object bytes
#[async_trait]
pub trait PresignPut: Send + Sync {
    /// Signs a PUT of `target`, valid for `expires_in`
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store client cannot produce a signature
    async fn presign_put(
        &self,
        target: PutTarget<'_>,
        expires_in: Duration,
    ) -> StorageResult<PresignedUrl>;
}

/// Presigner backed by an explicitly constructed S3 client
pub struct ObjectStorage {
    s3_client: Arc<S3Client>,
}

impl ObjectStorage {
    /// Creates a new object storage client
    #[must_use]
    pub const fn new(s3_client: Arc<S3Client>) -> Self {
        Self { s3_client }
    }
}

#[async_trait]
impl PresignPut for ObjectStorage {
    async fn presign_put(
        &self,
        target: PutTarget<'_>,
        expires_in: Duration,
    ) -> StorageResult<PresignedUrl> {
        let presigned_config = PresigningConfig::expires_in(expires_in).map_err(|e| {
            StorageError::ConfigError(format!("Failed to create presigning config: {e}"))
        })?;

        let presigned_request = self
            .s3_client
            .put_object()
            .bucket(target.bucket)
            .key(target.key)
            .content_type(target.content_type)
            .presigned(presigned_config)
            .await?;

        let headers = presigned_request
            .headers()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();

        Ok(PresignedUrl {
            url: presigned_request.uri().to_string(),
            headers,
            expires_at: Utc::now() + expires_in,
        })
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    //! In-memory presigner for router tests

    use std::sync::Mutex;

    use super::{
        async_trait, BTreeMap, Duration, PresignPut, PresignedUrl, PutTarget, StorageError,
        StorageResult, Utc,
    };

    /// A signing call observed by [`MockPresigner`]
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RecordedCall {
        /// Bucket name
        pub bucket: String,
        /// Object key
        pub key: String,
        /// Content type
        pub content_type: String,
        /// Requested validity
        pub expires_in: Duration,
    }

    /// Presigner returning deterministic URLs, or a fixed failure
    #[derive(Default)]
    pub struct MockPresigner {
        failure: Option<StorageError>,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl MockPresigner {
        /// Presigner that always succeeds
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Presigner that always fails with `error`
        #[must_use]
        pub fn failing(error: StorageError) -> Self {
            Self {
                failure: Some(error),
                calls: Mutex::default(),
            }
        }

        /// Calls observed so far
        ///
        /// # Panics
        ///
        /// Panics if the call log mutex is poisoned
        #[must_use]
        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().expect("call log poisoned").clone()
        }
    }

    #[async_trait]
    impl PresignPut for MockPresigner {
        async fn presign_put(
            &self,
            target: PutTarget<'_>,
            expires_in: Duration,
        ) -> StorageResult<PresignedUrl> {
            self.calls
                .lock()
                .expect("call log poisoned")
                .push(RecordedCall {
                    bucket: target.bucket.to_string(),
                    key: target.key.to_string(),
                    content_type: target.content_type.to_string(),
                    expires_in,
                });

            if let Some(error) = &self.failure {
                return Err(error.clone());
            }

            Ok(PresignedUrl {
                url: format!(
                    "https://store.test/{}/{}?X-Amz-Expires={}&X-Amz-Signature=mock",
                    target.bucket,
                    target.key,
                    expires_in.as_secs()
                ),
                headers: BTreeMap::new(),
                expires_at: Utc::now() + expires_in,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{StaticCredentials, StoreConfig};

    async fn offline_storage() -> ObjectStorage {
        let store = StoreConfig {
            region: "us-east-005".to_string(),
            endpoint_url: Some("http://localhost:9000".to_string()),
            credentials: Some(StaticCredentials {
                access_key_id: "test-key-id".to_string(),
                secret_access_key: "test-app-key".to_string(),
            }),
            force_path_style: true,
        };
        let client = S3Client::from_conf(store.s3_client_config().await);
        ObjectStorage::new(Arc::new(client))
    }

    #[tokio::test]
    async fn test_presign_put_is_scoped_to_key_and_expiry() {
        let storage = offline_storage().await;
        let target = PutTarget {
            bucket: "laudos",
            key: "users/u1/laudos/laudo-p1.pdf",
            content_type: "application/pdf",
        };

        let before = Utc::now();
        let presigned = storage
            .presign_put(target, Duration::from_secs(600))
            .await
            .unwrap();

        assert!(presigned
            .url
            .starts_with("http://localhost:9000/laudos/users/u1/laudos/laudo-p1.pdf?"));
        assert!(presigned.url.contains("X-Amz-Expires=600"));
        assert!(presigned.url.contains("X-Amz-Signature="));
        assert!(presigned.expires_at >= before + Duration::from_secs(600));
        assert!(presigned.expires_at <= Utc::now() + Duration::from_secs(600));
    }

    #[tokio::test]
    async fn test_presign_put_signs_content_type() {
        let storage = offline_storage().await;
        let target = PutTarget {
            bucket: "laudos",
            key: "a.bin",
            content_type: "image/png",
        };

        let presigned = storage
            .presign_put(target, Duration::from_secs(600))
            .await
            .unwrap();

        assert_eq!(
            presigned.headers.get("content-type").map(String::as_str),
            Some("image/png")
        );
    }

    #[tokio::test]
    async fn test_presign_put_rejects_excessive_expiry() {
        let storage = offline_storage().await;
        let target = PutTarget {
            bucket: "laudos",
            key: "a.bin",
            content_type: "application/octet-stream",
        };

        // S3 caps presigned URLs at one week
        let result = storage
            .presign_put(target, Duration::from_secs(8 * 24 * 60 * 60))
            .await;

        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }
}
