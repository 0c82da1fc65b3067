mod environment;
mod error;

pub use environment::{
    Environment, SignerConfig, StaticCredentials, StoreConfig, DEFAULT_ENDPOINT, DEFAULT_REGION,
};
pub use error::{ConfigError, SignError};
