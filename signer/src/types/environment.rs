//! Environment configuration for different deployment stages

use std::env;
use std::time::Duration;

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;
use tracing::Level;
use upload_types::{public_url_for, PRESIGNED_URL_EXPIRY_SECS};

use super::error::ConfigError;

/// Region used when `S3_REGION` is not set
pub const DEFAULT_REGION: &str = "us-east-005";

/// Endpoint used when `S3_ENDPOINT` is not set
pub const DEFAULT_ENDPOINT: &str = "https://s3.us-east-005.backblazeb2.com";

/// Application environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment
    Development {
        /// Optional override for presigned URL expiry in seconds
        presign_expiry_override: Option<u64>,
    },
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvironment` if `APP_ENV` holds an unknown value
    pub fn from_env() -> Result<Self, ConfigError> {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" => {
                let presign_expiry_override = env::var("PRESIGNED_URL_EXPIRY_SECS")
                    .ok()
                    .and_then(|val| val.parse::<u64>().ok());

                Ok(Self::Development {
                    presign_expiry_override,
                })
            }
            _ => Err(ConfigError::InvalidEnvironment(env)),
        }
    }

    /// Presigned URL expiry time in seconds
    #[must_use]
    pub fn presigned_url_expiry_secs(&self) -> u64 {
        match self {
            Self::Production | Self::Staging => PRESIGNED_URL_EXPIRY_SECS,
            Self::Development {
                presign_expiry_override,
            } => presign_expiry_override.unwrap_or(PRESIGNED_URL_EXPIRY_SECS),
        }
    }

    /// Whether signing requests may be served without caller authentication
    #[must_use]
    pub const fn allows_anonymous_signing(&self) -> bool {
        matches!(self, Self::Development { .. })
    }

    /// Whether logs should be emitted as JSON
    #[must_use]
    pub const fn json_logs(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }

    /// Default log level when `RUST_LOG` is not set
    #[must_use]
    pub fn tracing_level(&self) -> Level {
        env::var("TRACING_LEVEL")
            .ok()
            .and_then(|val| val.parse::<Level>().ok())
            .unwrap_or(match self {
                Self::Production | Self::Staging => Level::INFO,
                Self::Development { .. } => Level::DEBUG,
            })
    }

    const fn name(&self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Staging => "staging",
            Self::Development { .. } => "development",
        }
    }
}

/// Long-lived store credentials held by the signer
#[derive(Clone, PartialEq, Eq)]
pub struct StaticCredentials {
    /// Access key id
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .finish()
    }
}

/// Connection settings for the S3-compatible store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Store region
    pub region: String,
    /// Custom endpoint, `None` for the provider default
    pub endpoint_url: Option<String>,
    /// Static credentials; the default AWS chain is used when absent
    pub credentials: Option<StaticCredentials>,
    /// Use path-style addressing instead of virtual-hosted buckets
    pub force_path_style: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            endpoint_url: Some(DEFAULT_ENDPOINT.to_string()),
            credentials: None,
            force_path_style: false,
        }
    }
}

impl StoreConfig {
    /// AWS S3 service configuration.
    ///
    /// Static credentials produce a self-contained config; otherwise the
    /// shared AWS config chain is loaded with retry and timeout settings.
    pub async fn s3_client_config(&self) -> aws_sdk_s3::Config {
        if let Some(credentials) = &self.credentials {
            let mut builder = aws_sdk_s3::Config::builder()
                .behavior_version(BehaviorVersion::latest())
                .region(Region::new(self.region.clone()))
                .credentials_provider(Credentials::new(
                    credentials.access_key_id.clone(),
                    credentials.secret_access_key.clone(),
                    None,
                    None,
                    "signer-config",
                ))
                .force_path_style(self.force_path_style);
            builder.set_endpoint_url(self.endpoint_url.clone());
            return builder.build();
        }

        let retry_config = RetryConfig::standard()
            .with_max_attempts(3)
            .with_initial_backoff(Duration::from_millis(50));

        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(30))
            .build();

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()))
            .retry_config(retry_config)
            .timeout_config(timeout_config);

        if let Some(endpoint_url) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }

        let sdk_config = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        builder.set_force_path_style(Some(self.force_path_style));
        builder.build()
    }
}

/// Everything the signer needs, read once at startup and passed explicitly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerConfig {
    /// Deployment stage
    pub environment: Environment,
    /// Store connection settings
    pub store: StoreConfig,
    /// Target bucket; requests fail with a server error while unset
    pub bucket: Option<String>,
    /// Base URL objects are conventionally reachable under
    pub public_base_url: Option<String>,
    /// CORS origin override; the caller's origin is echoed when unset
    pub allowed_origin: Option<String>,
    /// HS256 secret for caller tokens; `None` disables caller authentication
    pub jwt_secret: Option<String>,
}

impl SignerConfig {
    /// Development config with no bucket, public base, origin override or auth
    #[must_use]
    pub fn development() -> Self {
        Self {
            environment: Environment::Development {
                presign_expiry_override: None,
            },
            store: StoreConfig::default(),
            bucket: None,
            public_base_url: None,
            allowed_origin: None,
            jwt_secret: None,
        }
    }

    /// Reads the configuration from the process environment
    ///
    /// # Errors
    ///
    /// - `ConfigError::InvalidEnvironment` for an unknown `APP_ENV`
    /// - `ConfigError::InvalidValue` for an unparseable `S3_FORCE_PATH_STYLE`
    /// - `ConfigError::MissingJwtSecret` when a non-development stage has no `SIGNER_JWT_SECRET`
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = Environment::from_env()?;

        let credentials = match (var("S3_ACCESS_KEY_ID"), var("S3_SECRET_ACCESS_KEY")) {
            (Some(access_key_id), Some(secret_access_key)) => Some(StaticCredentials {
                access_key_id,
                secret_access_key,
            }),
            _ => None,
        };

        let force_path_style = match var("S3_FORCE_PATH_STYLE") {
            Some(value) => value.parse::<bool>().map_err(|_| ConfigError::InvalidValue {
                name: "S3_FORCE_PATH_STYLE",
                value,
            })?,
            None => false,
        };

        let store = StoreConfig {
            region: var("S3_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            endpoint_url: Some(var("S3_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())),
            credentials,
            force_path_style,
        };

        let config = Self {
            environment,
            store,
            bucket: var("S3_BUCKET"),
            public_base_url: var("PUBLIC_BASE_URL"),
            allowed_origin: var("ALLOWED_ORIGIN"),
            jwt_secret: var("SIGNER_JWT_SECRET"),
        };
        config.validate()?;

        Ok(config)
    }

    /// Checks cross-field requirements
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingJwtSecret` when caller authentication is
    /// disabled outside development
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_none() && !self.environment.allows_anonymous_signing() {
            return Err(ConfigError::MissingJwtSecret(self.environment.name()));
        }
        Ok(())
    }

    /// Presigned URL expiry
    #[must_use]
    pub fn presigned_url_expiry(&self) -> Duration {
        Duration::from_secs(self.environment.presigned_url_expiry_secs())
    }

    /// Public URL of `key`, when a public base is configured
    #[must_use]
    pub fn public_url_for(&self, key: &str) -> Option<String> {
        self.public_base_url
            .as_deref()
            .and_then(|base| public_url_for(base, key))
    }
}

/// Reads an environment variable, treating empty values as unset
fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}
