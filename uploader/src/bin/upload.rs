use std::{collections::BTreeMap, path::{Path, PathBuf}};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uploader::{
    upload_report, ReportUpload, UploadOptions, UploadPayload, Uploader, UploaderConfig,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Upload files through the pre-signed URL signer")]
struct Args {
    /// Signing endpoint URL
    #[arg(long, env = "SIGN_ENDPOINT")]
    sign_endpoint: String,

    /// Base URL used for publicUrl when the signer returns none
    #[arg(long, env = "PUBLIC_BASE_URL")]
    public_base_url: Option<String>,

    /// Bearer token for the signer
    #[arg(long, env = "SIGN_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload any file to an explicit object key
    File {
        /// File to upload
        path: PathBuf,

        /// Target object key
        #[arg(long)]
        key: String,

        /// Content type; guessed from the extension when omitted
        #[arg(long)]
        content_type: Option<String>,

        /// Metadata forwarded to the signer, as key=value
        #[arg(long = "metadata", value_parser = parse_metadata)]
        metadata: Vec<(String, String)>,
    },
    /// Upload a PDF report under users/{user}/laudos/
    Report {
        /// PDF to upload
        path: PathBuf,

        /// Owner of the report
        #[arg(long)]
        user: String,

        /// Patient the report is about
        #[arg(long)]
        patient: Option<String>,

        /// File name override
        #[arg(long)]
        file_name: Option<String>,
    },
}

fn parse_metadata(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got {raw:?}")),
    }
}

/// Maps the extensions the report tooling produces; anything else is sent as
/// `application/octet-stream` unless `--content-type` is given.
fn content_type_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let content_type = match extension.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "json" => "application/json",
        "txt" => "text/plain",
        "html" => "text/html",
        _ => return None,
    };
    Some(content_type)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = UploaderConfig::new(args.sign_endpoint);
    config.public_base_url = args.public_base_url;
    config.bearer_token = args.token;
    let uploader = Uploader::new(config)?;

    let output = match args.command {
        Command::File {
            path,
            key,
            content_type,
            metadata,
        } => {
            let data = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;

            let mut payload = UploadPayload::new(data);
            if let Some(guessed) = content_type_for(&path) {
                payload = payload.with_content_type(guessed);
            }
            let options = UploadOptions {
                content_type,
                metadata: metadata
                    .into_iter()
                    .map(|(key, value)| (key, serde_json::Value::String(value)))
                    .collect::<BTreeMap<_, _>>(),
            };

            let outcome = uploader.upload(payload, &key, options).await?;
            serde_json::to_string_pretty(&outcome)?
        }
        Command::Report {
            path,
            user,
            patient,
            file_name,
        } => {
            if content_type_for(&path) != Some("application/pdf") {
                bail!("{} is not a PDF", path.display());
            }
            let pdf = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;

            let report = ReportUpload {
                patient_id: patient,
                file_name,
                ..ReportUpload::default()
            };
            let record = upload_report(&uploader, &user, pdf, report).await?;
            serde_json::to_string_pretty(&record)?
        }
    };

    println!("{output}");
    Ok(())
}
