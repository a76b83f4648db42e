//! Request-path orchestration: PDF info, chunk extraction, prompt batch.

use crate::config::Config;
use crate::job::Job;
use crate::pdf::PdfReport;
use crate::processing::{
    normalize::normalize_page_text,
    splitter::{ChunkParams, split_page},
    store::ChunkStore,
    types::{AnalysisOutcome, Chunk, PdfInfo},
};
use crate::prompts::{PromptBatchBuilder, PromptError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced from the request-path pipeline.
///
/// Chunk extraction is best-effort and never appears here; only a failure to
/// produce the prompt batch file fails the request.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The prompt batch file could not be written.
    #[error("Failed to build prompt batch: {0}")]
    Prompt(#[from] PromptError),
}

/// Abstraction over the analysis pipeline consumed by the HTTP surface.
#[async_trait]
pub trait AnalysisApi: Send + Sync {
    /// Run the full request-path pipeline for one job.
    async fn run_analysis(&self, job: &Job) -> Result<AnalysisOutcome, AnalysisError>;
}

/// Coordinates the request-path pipeline: PDF reading, normalization,
/// chunk splitting, chunk persistence, and prompt batch generation.
///
/// Construct the service once near process start and share it through an
/// `Arc`; it owns no mutable state.
pub struct AnalysisService {
    config: Arc<Config>,
    store: ChunkStore,
    prompts: PromptBatchBuilder,
}

impl AnalysisService {
    /// Build a new analysis service from the loaded configuration.
    pub fn new(config: Arc<Config>) -> Self {
        let store = ChunkStore::new(config.chunks_dir.clone());
        let prompts = PromptBatchBuilder::new(config.prompts_dir.clone(), config.batch_model.clone());
        Self {
            config,
            store,
            prompts,
        }
    }

    /// Run the pipeline: PDF info and chunks (both best-effort), then the
    /// prompt batch file (required).
    pub async fn run_analysis(&self, job: &Job) -> Result<AnalysisOutcome, AnalysisError> {
        tracing::info!(job_id = %job.job_id, topics = job.material_topics.len(), "Processing analysis request");

        let (pdf_info, chunks_file, chunk_count) = match job.source_document.as_deref() {
            Some(path) => self.process_document(&job.job_id, path),
            None => (PdfInfo::default(), None, 0),
        };

        let prompt_file = self.prompts.build(job)?;

        tracing::info!(
            job_id = %job.job_id,
            chunks = chunk_count,
            prompt_file = %prompt_file.display(),
            "Analysis request completed"
        );

        Ok(AnalysisOutcome {
            chunk_count,
            chunks_file,
            prompt_file,
            pdf_info,
        })
    }

    /// Read the PDF and extract/persist chunks.
    ///
    /// Failures here are downgraded to an empty result with a diagnostic log;
    /// the request still succeeds with no chunks recorded.
    fn process_document(&self, job_id: &str, path: &Path) -> (PdfInfo, Option<PathBuf>, usize) {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());

        let report = match PdfReport::load(path) {
            Ok(report) => report,
            Err(err) => {
                tracing::warn!(job_id, path = %path.display(), error = %err, "Failed to parse PDF; continuing without chunks");
                return (
                    PdfInfo {
                        file_name,
                        num_pages: None,
                        sample_excerpt: Some(format!("PDF parsing error (ignored): {err}")),
                    },
                    None,
                    0,
                );
            }
        };

        let pdf_info = PdfInfo {
            file_name,
            num_pages: Some(report.page_count()),
            sample_excerpt: report.first_page_excerpt(),
        };

        let params = ChunkParams {
            max_chars: self.config.chunk_max_chars,
            overlap: self.config.chunk_overlap,
        };
        let chunks = match extract_chunks(&report, job_id, &params) {
            Ok(chunks) => chunks,
            Err(err) => {
                tracing::warn!(job_id, error = %err, "Chunk extraction failed; continuing without chunks");
                return (pdf_info, None, 0);
            }
        };

        if chunks.is_empty() {
            tracing::warn!(job_id, "Document produced no text chunks");
            return (pdf_info, None, 0);
        }

        let chunk_count = chunks.len();
        match self.store.save(job_id, &chunks) {
            Ok(path) => (pdf_info, Some(path), chunk_count),
            Err(err) => {
                tracing::warn!(job_id, error = %err, "Failed to persist chunk artifact; continuing without chunks");
                (pdf_info, None, 0)
            }
        }
    }
}

/// Normalize each page and split it into overlapping chunks.
///
/// Pages whose normalized text is empty are skipped entirely; sequence
/// numbers restart on every page.
fn extract_chunks(
    report: &PdfReport,
    job_id: &str,
    params: &ChunkParams,
) -> Result<Vec<Chunk>, crate::processing::types::ChunkingError> {
    let mut chunks = Vec::new();
    for (page, raw_text) in report.page_texts() {
        let text = normalize_page_text(&raw_text);
        if text.is_empty() {
            continue;
        }
        chunks.extend(split_page(&text, job_id, page, params)?);
    }
    Ok(chunks)
}

#[async_trait]
impl AnalysisApi for AnalysisService {
    async fn run_analysis(&self, job: &Job) -> Result<AnalysisOutcome, AnalysisError> {
        AnalysisService::run_analysis(self, job).await
    }
}
