//! Batch-prompt JSONL builder.
//!
//! For each material topic of a job this module renders one batch request
//! record — system and user messages instructing the model to map the topic
//! to GRI/SASB/ISSB indicators and answer in JSON only — and appends it as a
//! line of `<prompts_dir>/<job_id>_prompts.jsonl`. Nothing here talks to the
//! network; the file is submitted out of process.

use crate::job::Job;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while writing the batch request file.
#[derive(Debug, Error)]
pub enum PromptError {
    /// Filesystem operation failed.
    #[error("prompt file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// A record could not be serialized.
    #[error("prompt record serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Slug used when a topic contains no alphanumeric characters at all.
const EMPTY_SLUG_PLACEHOLDER: &str = "topic";

/// One line of the batch request file.
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchRequestRecord {
    /// Identifier tying the eventual response back to `(job, topic)`.
    pub custom_id: String,
    /// Fixed HTTP method of the batched call.
    pub method: String,
    /// Fixed endpoint path of the batched call.
    pub url: String,
    /// Rendered request body.
    pub body: RequestBody,
}

/// Body of one batched model call.
#[derive(Debug, Serialize, Deserialize)]
pub struct RequestBody {
    /// Model identifier the batch should run against.
    pub model: String,
    /// Structured-output request flag.
    pub response_format: ResponseFormat,
    /// System and user messages, in order.
    pub input: Vec<Message>,
    /// Job attributes echoed for traceability.
    pub metadata: RecordMetadata,
}

/// Structured-output flag (`{"type": "json_object"}`).
#[derive(Debug, Serialize, Deserialize)]
pub struct ResponseFormat {
    /// Requested response shape.
    #[serde(rename = "type")]
    pub format_type: String,
}

/// A single chat message.
#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    /// Message role (`system` or `user`).
    pub role: String,
    /// Rendered message content.
    pub content: String,
}

/// Job attributes mirrored into each record.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Owning job identifier.
    pub job_id: String,
    /// Company under analysis.
    pub company_name: String,
    /// Reporting year.
    pub report_year: String,
    /// Sector or industry.
    pub sector: String,
    /// The topic this record analyzes.
    pub material_topic: String,
}

/// Turn a material topic into a slug safe for use inside a `custom_id`.
///
/// Lowercases, replaces every run of non-alphanumeric characters with a
/// single `-`, and strips leading/trailing separators. A topic with no
/// alphanumeric content maps to the fixed placeholder `"topic"`.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_separator = false;
    for ch in value.trim().to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(ch);
        } else {
            pending_separator = true;
        }
    }
    if slug.is_empty() {
        EMPTY_SLUG_PLACEHOLDER.to_string()
    } else {
        slug
    }
}

/// Writes one batch request file per job.
pub struct PromptBatchBuilder {
    prompts_dir: PathBuf,
    model: String,
}

impl PromptBatchBuilder {
    /// Create a builder writing under `prompts_dir` with the given model id.
    pub fn new(prompts_dir: impl Into<PathBuf>, model: impl Into<String>) -> Self {
        Self {
            prompts_dir: prompts_dir.into(),
            model: model.into(),
        }
    }

    /// Build the batch request file for a job, one record per material topic
    /// in input order. Overwrites any prior file for the same job.
    ///
    /// Two distinct topics can slugify to the same string and therefore share
    /// a `custom_id`; collisions are reported with a warning but both records
    /// are kept verbatim.
    pub fn build(&self, job: &Job) -> Result<PathBuf, PromptError> {
        fs::create_dir_all(&self.prompts_dir)?;
        let path = self.prompts_dir.join(format!("{}_prompts.jsonl", job.job_id));
        let mut file = fs::File::create(&path)?;

        let mut seen_ids: HashSet<String> = HashSet::new();
        for topic in &job.material_topics {
            let custom_id = format!("{}-{}", job.job_id, slugify(topic));
            if !seen_ids.insert(custom_id.clone()) {
                tracing::warn!(
                    job_id = %job.job_id,
                    custom_id = %custom_id,
                    topic = %topic,
                    "Duplicate custom_id in batch file; topics slugify identically"
                );
            }

            let record = BatchRequestRecord {
                custom_id,
                method: "POST".to_string(),
                url: "/v1/responses".to_string(),
                body: RequestBody {
                    model: self.model.clone(),
                    response_format: ResponseFormat {
                        format_type: "json_object".to_string(),
                    },
                    input: vec![
                        Message {
                            role: "system".to_string(),
                            content: system_instruction(),
                        },
                        Message {
                            role: "user".to_string(),
                            content: user_instruction(job, topic),
                        },
                    ],
                    metadata: RecordMetadata {
                        job_id: job.job_id.clone(),
                        company_name: job.company_name.clone(),
                        report_year: job.report_year.clone(),
                        sector: job.sector.clone(),
                        material_topic: topic.clone(),
                    },
                },
            };

            let line = serde_json::to_string(&record)?;
            writeln!(file, "{line}")?;
        }

        tracing::debug!(
            job_id = %job.job_id,
            topics = job.material_topics.len(),
            path = %path.display(),
            "Prompt batch file written"
        );
        Ok(path)
    }
}

/// Fixed system instruction constraining the assistant to ESG indicator
/// mapping with JSON-only output.
fn system_instruction() -> String {
    "You are an ESG expert assistant helping map a company's material topics \
     to the GRI, SASB, and ISSB reporting standards. Your answer MUST always \
     be JSON conforming to the requested schema, with no explanatory text \
     outside the JSON."
        .to_string()
}

/// User instruction embedding the job attributes, the topic, and the
/// response schema the model must conform to.
fn user_instruction(job: &Job, topic: &str) -> String {
    format!(
        "Here is the context for this material topic analysis.\n\n\
         Company information:\n\
         - Company name: {company}\n\
         - Report year: {year}\n\
         - Sector / industry: {sector}\n\
         - Material topic under analysis: {topic}\n\n\
         Your task:\n\
         1. Based on your knowledge of the GRI, SASB, and ISSB standards, \
         select the indicators most relevant to this material topic.\n\
         2. For each relevant indicator, set an initial coverage_status as one of:\n\
         \x20  - \"Covered\"\n\
         \x20  - \"Partially Covered\"\n\
         \x20  - \"Not Covered\"\n\
         \x20  (Treat coverage_status as a rough prior based on sector best \
         practice; the full report text is not included in this prompt.)\n\
         3. Provide short notes explaining why each indicator was selected.\n\n\
         Return the output AS JSON with the following schema:\n\
         {{\n\
         \x20 \"material_topic\": string,\n\
         \x20 \"framework\": string,              // e.g. \"GRI\", \"SASB\", \"ISSB\"\n\
         \x20 \"candidates\": [\n\
         \x20   {{\n\
         \x20     \"code\": string,              // e.g. \"GRI 302-1\", \"IF-WU-110a.1\"\n\
         \x20     \"title\": string,\n\
         \x20     \"coverage_status\": string,   // \"Covered\" | \"Partially Covered\" | \"Not Covered\"\n\
         \x20     \"notes\": string              // short, max ~2 sentences\n\
         \x20   }}\n\
         \x20 ]\n\
         }}\n\
         Do NOT add any text outside the JSON.",
        company = job.company_name,
        year = job.report_year,
        sector = job.sector,
        topic = topic,
    )
}
