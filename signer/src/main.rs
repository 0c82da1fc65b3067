use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use signer::{object_storage::ObjectStorage, server, state::AppState, types::SignerConfig};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = SignerConfig::from_env()?;

    let env_filter = EnvFilter::builder()
        .with_default_directive(config.environment.tracing_level().into())
        .from_env_lossy();

    // JSON logs for staging/production, plain text for development
    if config.environment.json_logs() {
        fmt().json().with_env_filter(env_filter).init();
    } else {
        fmt().with_env_filter(env_filter).init();
    }

    if config.jwt_secret.is_none() {
        tracing::warn!("SIGNER_JWT_SECRET not set, signing requests are not authenticated");
    }
    if config.bucket.is_none() {
        tracing::warn!("S3_BUCKET not set, signing requests will fail");
    }

    let s3_client = Arc::new(S3Client::from_conf(config.store.s3_client_config().await));
    let presigner = Arc::new(ObjectStorage::new(s3_client));
    let state = AppState::new(config, presigner)?;

    server::start(state).await
}
