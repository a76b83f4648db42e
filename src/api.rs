//! HTTP surface for the analysis pipeline.
//!
//! A single endpoint drives the request path:
//!
//! - `POST /analyze` – Multipart form describing one sustainability report.
//!   Required fields: `companyName`, `reportYear`, `sector`, `materialTopics`
//!   (comma-separated). Optional: `reportFile` (a PDF, stored under the upload
//!   directory) and `enableOCR` (accepted and echoed back, currently unused).
//!   The handler mints a job id, persists the upload, runs chunk extraction
//!   and prompt-batch generation, and returns a summary of the produced
//!   artifacts.
//!
//! Field validation failures return `400` with a message naming the missing
//! field; oversized uploads are rejected with `413` by the body limit layer.

use crate::config::Config;
use crate::job::{self, Job, UPLOAD_TIMESTAMP_FORMAT};
use crate::processing::{AnalysisApi, AnalysisError, PdfInfo};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::OffsetDateTime;

/// Shared handler state: configuration plus the pipeline service.
pub struct AppState<S> {
    /// Loaded runtime configuration.
    pub config: Arc<Config>,
    /// Pipeline implementation behind the [`AnalysisApi`] seam.
    pub service: Arc<S>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            service: Arc::clone(&self.service),
        }
    }
}

/// Build the HTTP router exposing the analysis API surface.
pub fn create_router<S>(config: Arc<Config>, service: Arc<S>) -> Router
where
    S: AnalysisApi + 'static,
{
    let body_limit = config.max_upload_mb * 1024 * 1024;
    Router::new()
        .route("/analyze", post(analyze::<S>))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(AppState { config, service })
}

/// Success response for `POST /analyze`.
#[derive(Serialize)]
struct AnalyzeResponse {
    status: &'static str,
    job_id: String,
    message: String,
    result: AnalyzeResult,
}

/// Echo of the submitted form plus pointers to the produced artifacts.
#[derive(Serialize)]
struct AnalyzeResult {
    company_name: String,
    report_year: String,
    sector: String,
    enable_ocr: bool,
    material_topics: Vec<String>,
    file_saved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_path: Option<String>,
    pdf_info: PdfInfo,
    chunk_count: usize,
    prompt_file_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    chunks_file_path: Option<String>,
}

/// Collected multipart form fields before validation.
#[derive(Default)]
struct AnalyzeForm {
    company_name: Option<String>,
    report_year: Option<String>,
    sector: Option<String>,
    material_topics: Option<String>,
    enable_ocr: bool,
    report_file: Option<(String, Vec<u8>)>,
}

/// Handle one analysis request end to end.
async fn analyze<S>(
    State(state): State<AppState<S>>,
    multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError>
where
    S: AnalysisApi,
{
    let form = read_form(multipart).await?;

    let company_name = required_field(form.company_name, "Company Name")?;
    let report_year = required_field(form.report_year, "Report Year")?;
    let sector = required_field(form.sector, "Sector")?;
    let raw_topics = required_field(form.material_topics, "Material Topics")?;
    let material_topics = job::parse_material_topics(&raw_topics);
    if material_topics.is_empty() {
        return Err(AppError::BadRequest("Material Topics is required".into()));
    }

    let job_id = job::generate_job_id();
    tracing::info!(
        job_id = %job_id,
        company = %company_name,
        topics = material_topics.len(),
        has_file = form.report_file.is_some(),
        "Analyze request received"
    );

    let source_document = match form.report_file {
        Some((name, bytes)) => Some(save_upload(&state.config.upload_dir, &name, &bytes).await?),
        None => None,
    };
    let file_saved = source_document.is_some();
    let file_path = source_document
        .as_ref()
        .map(|path| path.display().to_string());

    let job = Job {
        job_id: job_id.clone(),
        company_name: company_name.clone(),
        report_year: report_year.clone(),
        sector: sector.clone(),
        material_topics: material_topics.clone(),
        source_document,
    };

    let outcome = state.service.run_analysis(&job).await?;

    Ok(Json(AnalyzeResponse {
        status: "success",
        job_id,
        message: "Analysis request accepted; prompt batch generated".to_string(),
        result: AnalyzeResult {
            company_name,
            report_year,
            sector,
            enable_ocr: form.enable_ocr,
            material_topics,
            file_saved,
            file_path,
            pdf_info: outcome.pdf_info,
            chunk_count: outcome.chunk_count,
            prompt_file_path: outcome.prompt_file.display().to_string(),
            chunks_file_path: outcome
                .chunks_file
                .map(|path| path.display().to_string()),
        },
    }))
}

/// Drain the multipart stream into an [`AnalyzeForm`].
async fn read_form(mut multipart: Multipart) -> Result<AnalyzeForm, AppError> {
    let mut form = AnalyzeForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(AppError::Multipart)?
    {
        let Some(name) = field.name().map(ToString::to_string) else {
            continue;
        };
        match name.as_str() {
            "companyName" => form.company_name = Some(read_text(field).await?),
            "reportYear" => form.report_year = Some(read_text(field).await?),
            "sector" => form.sector = Some(read_text(field).await?),
            "materialTopics" => form.material_topics = Some(read_text(field).await?),
            "enableOCR" => {
                let value = read_text(field).await?;
                form.enable_ocr =
                    matches!(value.to_ascii_lowercase().as_str(), "true" | "on" | "1" | "yes");
            }
            "reportFile" => {
                let file_name = field.file_name().map(ToString::to_string);
                let bytes = field.bytes().await.map_err(AppError::Multipart)?;
                if let Some(file_name) = file_name {
                    if !bytes.is_empty() {
                        if !file_name.to_ascii_lowercase().ends_with(".pdf") {
                            return Err(AppError::BadRequest(
                                "Only PDF report files are accepted".into(),
                            ));
                        }
                        form.report_file = Some((file_name, bytes.to_vec()));
                    }
                }
            }
            other => {
                tracing::debug!(field = other, "Ignoring unknown form field");
            }
        }
    }
    Ok(form)
}

/// Read a text field, surfacing stream errors as `400`.
async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field.text().await.map_err(AppError::Multipart)
}

/// Validate presence of a required text field.
fn required_field(value: Option<String>, label: &str) -> Result<String, AppError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(AppError::BadRequest(format!("{label} is required"))),
    }
}

/// Persist an uploaded report under the configured upload directory.
///
/// The stored name is the original file name (directories stripped) prefixed
/// with a request timestamp, so repeated uploads of the same report never
/// collide within one second of each other.
async fn save_upload(upload_dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, AppError> {
    let base_name = Path::new(file_name)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report.pdf".to_string());
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let prefix = now
        .format(UPLOAD_TIMESTAMP_FORMAT)
        .unwrap_or_else(|_| "00000000-000000".to_string());
    let target = upload_dir.join(format!("{prefix}_{base_name}"));

    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(AppError::Upload)?;
    tokio::fs::write(&target, bytes)
        .await
        .map_err(AppError::Upload)?;
    tracing::info!(path = %target.display(), size = bytes.len(), "Stored uploaded report");
    Ok(target)
}

/// Error envelope returned for failed requests.
#[derive(Serialize)]
struct ErrorResponse {
    status: &'static str,
    message: String,
}

enum AppError {
    BadRequest(String),
    Multipart(axum::extract::multipart::MultipartError),
    Upload(std::io::Error),
    Pipeline(AnalysisError),
}

impl From<AnalysisError> for AppError {
    fn from(inner: AnalysisError) -> Self {
        Self::Pipeline(inner)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            // Keeps the 413 produced when the body limit trips mid-stream.
            Self::Multipart(err) => (err.status(), format!("Malformed multipart body: {err}")),
            Self::Upload(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to store uploaded file: {err}"),
            ),
            Self::Pipeline(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        };
        if status.is_server_error() {
            tracing::error!(%status, message = %message, "Request failed");
        }
        (
            status,
            Json(ErrorResponse {
                status: "error",
                message,
            }),
        )
            .into_response()
    }
}
