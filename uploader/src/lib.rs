//! Client side of the direct-upload protocol

#![warn(clippy::all, clippy::pedantic, clippy::nursery, missing_docs)]

/// Signer handoff and transfer to the object store
pub mod client;

/// Uploader configuration
pub mod config;

/// Upload errors
pub mod error;

/// Report uploads under `users/{uid}/laudos/`
pub mod reports;

pub use client::{UploadOptions, UploadOutcome, UploadPayload, Uploader};
pub use config::UploaderConfig;
pub use error::{TransferMethod, UploadError};
pub use reports::{upload_report, ReportRecord, ReportUpload};
