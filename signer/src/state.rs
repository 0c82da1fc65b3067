//! Application state management

use std::sync::Arc;

use crate::{
    jwt::JwtVerifier,
    middleware::CorsPolicy,
    object_storage::PresignPut,
    types::{ConfigError, SignerConfig},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Configuration read at startup
    pub config: Arc<SignerConfig>,
    /// Store client issuing PUT authorizations
    pub presigner: Arc<dyn PresignPut>,
    /// Caller token verifier; `None` when caller authentication is disabled
    pub jwt_verifier: Option<Arc<JwtVerifier>>,
    /// Cross-origin policy
    pub cors: Arc<CorsPolicy>,
}

impl AppState {
    /// Wires the state from an explicit config and presigner
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is inconsistent
    pub fn new(config: SignerConfig, presigner: Arc<dyn PresignPut>) -> Result<Self, ConfigError> {
        config.validate()?;

        let jwt_verifier = config
            .jwt_secret
            .as_deref()
            .map(|secret| Arc::new(JwtVerifier::new(secret)));
        let cors = CorsPolicy::new(config.allowed_origin.as_deref(), jwt_verifier.is_some())?;

        Ok(Self {
            config: Arc::new(config),
            presigner,
            jwt_verifier,
            cors: Arc::new(cors),
        })
    }
}
