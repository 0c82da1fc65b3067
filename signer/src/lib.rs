//! Stateless signer issuing pre-signed S3 upload URLs

#![warn(clippy::all, clippy::pedantic, clippy::nursery, missing_docs)]

/// Caller token validation
pub mod jwt;

/// Request extractors and response middleware
pub mod middleware;

/// S3-compatible presigning
pub mod object_storage;

/// Route table and handlers
pub mod routes;

/// HTTP server bootstrap
pub mod server;

/// Application state
pub mod state;

/// Configuration and error types
pub mod types;
