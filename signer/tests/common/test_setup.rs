use std::sync::Arc;

use axum::{body::Body, http::Request, response::Response, Router};
use signer::{
    object_storage::{mock::MockPresigner, ObjectStorage, PresignPut, StorageError},
    routes,
    state::AppState,
    types::{SignerConfig, StaticCredentials, StoreConfig},
};
use tower::ServiceExt;

use super::TEST_JWT_SECRET;

/// Initialize tracing for tests
pub fn setup_test_env() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init()
        .ok();
}

/// Development config with a bucket and public base
pub fn test_config() -> SignerConfig {
    SignerConfig {
        bucket: Some("laudos".to_string()),
        public_base_url: Some("https://cdn.example.com/".to_string()),
        ..SignerConfig::development()
    }
}

/// Router plus the presigner it signs with
pub struct TestSetup {
    pub router: Router,
    pub presigner: Arc<MockPresigner>,
}

impl TestSetup {
    /// Router with the mock presigner and the given config
    pub fn new(config: SignerConfig) -> Self {
        Self::with_presigner(config, MockPresigner::new())
    }

    /// Default router: bucket configured, no caller auth
    pub fn default_setup() -> Self {
        Self::new(test_config())
    }

    /// Router requiring caller tokens signed with `TEST_JWT_SECRET`
    pub fn authenticated() -> Self {
        Self::new(SignerConfig {
            jwt_secret: Some(TEST_JWT_SECRET.to_string()),
            ..test_config()
        })
    }

    /// Router whose presigner always fails
    pub fn failing(error: StorageError) -> Self {
        Self::with_presigner(test_config(), MockPresigner::failing(error))
    }

    fn with_presigner(config: SignerConfig, presigner: MockPresigner) -> Self {
        setup_test_env();

        let presigner = Arc::new(presigner);
        let state = AppState::new(config, presigner.clone()).expect("valid test config");

        Self {
            router: routes::handler(state),
            presigner,
        }
    }

    pub async fn send_request(
        &self,
        method: &str,
        route: &str,
        headers: &[(&str, &str)],
        body: Body,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let mut builder = Request::builder().uri(route).method(method);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let response = self.router.clone().oneshot(builder.body(body)?).await?;
        Ok(response)
    }

    pub async fn send_post_request(
        &self,
        route: &str,
        payload: serde_json::Value,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        self.send_request(
            "POST",
            route,
            &[("Content-Type", "application/json")],
            Body::from(payload.to_string()),
        )
        .await
    }
}

/// Setup backed by a real S3 client with static credentials.
///
/// Presigning is computed locally, so no store needs to be reachable. The
/// returned mock presigner is never called.
pub async fn offline_s3_setup(config: SignerConfig) -> TestSetup {
    setup_test_env();

    let store = StoreConfig {
        region: "us-east-005".to_string(),
        endpoint_url: Some("http://localhost:9000".to_string()),
        credentials: Some(StaticCredentials {
            access_key_id: "test-key-id".to_string(),
            secret_access_key: "test-app-key".to_string(),
        }),
        force_path_style: true,
    };
    let s3_client = aws_sdk_s3::Client::from_conf(store.s3_client_config().await);
    let presigner: Arc<dyn PresignPut> = Arc::new(ObjectStorage::new(Arc::new(s3_client)));

    let state =
        AppState::new(SignerConfig { store, ..config }, presigner).expect("valid test config");

    TestSetup {
        router: routes::handler(state),
        presigner: Arc::new(MockPresigner::new()),
    }
}
