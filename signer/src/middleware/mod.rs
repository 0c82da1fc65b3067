pub mod auth;
pub mod cors;

pub use auth::{AuthenticatedUser, Caller};
pub use cors::{cors_headers, CorsPolicy};
