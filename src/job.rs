//! Job identity and request metadata.
//!
//! A job represents one analysis run. Its identifier is derived from the
//! request wall-clock time (`JOB-YYYYMMDD-HHMMSS`), so ids are unique per run
//! and sort in submission order. Jobs are immutable once created.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use time::OffsetDateTime;
use time::format_description::FormatItem;
use time::macros::format_description;

const JOB_ID_FORMAT: &[FormatItem<'_>] =
    format_description!("JOB-[year][month][day]-[hour][minute][second]");

/// Timestamp format used for uploaded-file prefixes.
pub const UPLOAD_TIMESTAMP_FORMAT: &[FormatItem<'_>] =
    format_description!("[year][month][day]-[hour][minute][second]");

/// One end-to-end analysis request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Time-derived identifier, unique per run.
    pub job_id: String,
    /// Company the report belongs to.
    pub company_name: String,
    /// Reporting year as supplied by the caller.
    pub report_year: String,
    /// Sector or industry of the company.
    pub sector: String,
    /// User-declared material topics, in input order. Never empty;
    /// duplicates are allowed.
    pub material_topics: Vec<String>,
    /// Path of the uploaded source document, when one was provided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_document: Option<PathBuf>,
}

/// Generate a fresh job identifier from the current local time.
///
/// Falls back to UTC when the local offset cannot be determined (common in
/// multi-threaded processes on Unix).
pub fn generate_job_id() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    now.format(JOB_ID_FORMAT)
        .unwrap_or_else(|_| "JOB-19700101-000000".to_string())
}

/// Parse the comma-separated `materialTopics` form field into a topic list.
///
/// Blank entries are discarded; order is preserved and duplicates are kept.
pub fn parse_material_topics(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|topic| !topic.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_id_matches_documented_format() {
        let id = generate_job_id();
        assert!(id.starts_with("JOB-"), "unexpected id: {id}");
        let rest = id.strip_prefix("JOB-").unwrap();
        let (date, clock) = rest.split_once('-').expect("date-time separator");
        assert_eq!(date.len(), 8);
        assert_eq!(clock.len(), 6);
        assert!(date.chars().all(|c| c.is_ascii_digit()));
        assert!(clock.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn topics_are_trimmed_and_blank_entries_dropped() {
        let topics = parse_material_topics(" Energy , ,GHG Emissions,  Waste ");
        assert_eq!(topics, vec!["Energy", "GHG Emissions", "Waste"]);
    }

    #[test]
    fn duplicate_topics_are_preserved() {
        let topics = parse_material_topics("Energy,Energy");
        assert_eq!(topics.len(), 2);
    }
}
