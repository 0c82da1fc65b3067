//! Clinical report (laudo) uploads

use std::collections::BTreeMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    client::{UploadOptions, UploadPayload, Uploader},
    error::UploadError,
};

/// Content type of every generated report
pub const REPORT_CONTENT_TYPE: &str = "application/pdf";

const REPORT_FOLDER: &str = "laudos";
const ANONYMOUS_PATIENT: &str = "paciente";

/// Object key under which a user's report is stored
#[must_use]
pub fn report_object_key(user_id: &str, file_name: &str) -> String {
    format!("users/{user_id}/{REPORT_FOLDER}/{file_name}")
}

/// `laudo-{patient}-{timestamp}.pdf`, timestamp in UTC to the second with `-` for `:`
#[must_use]
pub fn default_report_file_name(patient_id: Option<&str>, now: DateTime<Utc>) -> String {
    let patient = patient_id
        .filter(|id| !id.is_empty())
        .unwrap_or(ANONYMOUS_PATIENT);
    format!("laudo-{patient}-{}.pdf", now.format("%Y-%m-%dT%H-%M-%S"))
}

/// Caller-supplied description of a report
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportUpload {
    /// Patient the report is about
    pub patient_id: Option<String>,
    /// File name override; generated when absent
    pub file_name: Option<String>,
    /// Extra fields copied onto the record
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Document describing a stored report, ready to be persisted
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRecord {
    /// Owner of the report
    pub user_id: String,
    /// Patient the report is about
    pub patient_id: Option<String>,
    /// File name within the report folder
    pub file_name: String,
    /// Full object key
    pub object_key: String,
    /// Public location, if known
    pub url: Option<String>,
    /// Upload time
    pub created_at: DateTime<Utc>,
    /// Caller-supplied fields
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Uploads a generated PDF under the user's report folder.
///
/// # Errors
///
/// - `UploadError::InvalidInput` for an empty PDF, an empty user id or a
///   file name or patient id containing `/`; no request is made in that case
/// - any error from [`Uploader::upload`]
#[tracing::instrument(skip(uploader, pdf, report), fields(patient_id = ?report.patient_id))]
pub async fn upload_report(
    uploader: &Uploader,
    user_id: &str,
    pdf: impl Into<Bytes>,
    report: ReportUpload,
) -> Result<ReportRecord, UploadError> {
    let pdf = pdf.into();
    if pdf.is_empty() {
        return Err(UploadError::InvalidInput("report PDF is empty".to_string()));
    }
    if user_id.is_empty() || user_id.contains('/') {
        return Err(UploadError::InvalidInput(format!(
            "invalid user id: {user_id:?}"
        )));
    }

    if let Some(patient_id) = report.patient_id.as_deref().filter(|id| id.contains('/')) {
        return Err(UploadError::InvalidInput(format!(
            "patient id must not contain '/': {patient_id}"
        )));
    }

    let created_at = Utc::now();
    let file_name = match report.file_name.filter(|name| !name.is_empty()) {
        Some(name) if name.contains('/') => {
            return Err(UploadError::InvalidInput(format!(
                "report file name must not contain '/': {name}"
            )));
        }
        Some(name) => name,
        None => default_report_file_name(report.patient_id.as_deref(), created_at),
    };
    let object_key = report_object_key(user_id, &file_name);

    let outcome = uploader
        .upload(
            UploadPayload::new(pdf).with_content_type(REPORT_CONTENT_TYPE),
            &object_key,
            UploadOptions::default(),
        )
        .await?;

    Ok(ReportRecord {
        user_id: user_id.to_string(),
        patient_id: report.patient_id,
        file_name,
        object_key: outcome.object_key,
        url: outcome.public_url,
        created_at,
        extra: report.extra,
    })
}
