//! End-to-end coverage of the request path without any network services:
//! normalization, splitting, chunk persistence, and prompt batch output.

use esgpipe::config::Config;
use esgpipe::job::Job;
use esgpipe::processing::{
    AnalysisService, ChunkParams, ChunkStore, normalize_page_text, split_page,
};
use esgpipe::prompts::BatchRequestRecord;
use std::path::Path;
use std::sync::Arc;

fn test_config(base: &Path) -> Config {
    Config {
        milvus_uri: "http://127.0.0.1:19530".into(),
        milvus_token: None,
        milvus_db: "default".into(),
        milvus_collection: "sr_chunks".into(),
        gemini_api_key: "test-key".into(),
        gemini_embed_model: "text-embedding-004".into(),
        gemini_base_url: "https://generativelanguage.googleapis.com".into(),
        batch_model: "gpt-4.1-mini".into(),
        upload_dir: base.join("uploads"),
        prompts_dir: base.join("prompts"),
        chunks_dir: base.join("chunks"),
        max_upload_mb: 50,
        chunk_max_chars: 1000,
        chunk_overlap: 200,
        server_port: None,
    }
}

fn sample_job(topics: &[&str], document: Option<&Path>) -> Job {
    Job {
        job_id: "JOB-20250301-091500".to_string(),
        company_name: "Acme Utilities".to_string(),
        report_year: "2024".to_string(),
        sector: "Water Utilities".to_string(),
        material_topics: topics.iter().map(ToString::to_string).collect(),
        source_document: document.map(Path::to_path_buf),
    }
}

#[test]
fn page_chunks_survive_a_store_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let params = ChunkParams {
        max_chars: 1000,
        overlap: 200,
    };

    let pages = [
        (1u32, "water  stewardship\t".repeat(80)),
        (2u32, "emissions reporting\n".repeat(90)),
    ];

    let mut chunks = Vec::new();
    for (page, raw) in &pages {
        let text = normalize_page_text(raw);
        assert!(!text.contains('\t'));
        assert!(!text.contains('\n'));
        chunks.extend(split_page(&text, "JOB-20250301-091500", *page, &params).expect("split"));
    }
    assert!(chunks.len() >= 2, "expected multi-chunk pages");

    let store = ChunkStore::new(dir.path());
    store.save("JOB-20250301-091500", &chunks).expect("save");
    let loaded = store.load("JOB-20250301-091500").expect("load");

    assert_eq!(loaded.job_id, "JOB-20250301-091500");
    assert_eq!(loaded.chunks, chunks);
    for chunk in &loaded.chunks {
        assert!(
            chunk
                .chunk_id
                .starts_with(&format!("JOB-20250301-091500-p{}-c", chunk.page)),
            "unexpected chunk id: {}",
            chunk.chunk_id
        );
        assert!(chunk.text.chars().count() <= 1000);
    }
}

#[tokio::test]
async fn analysis_without_a_document_still_produces_the_prompt_batch() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = Arc::new(test_config(dir.path()));
    let service = AnalysisService::new(Arc::clone(&config));
    let job = sample_job(&["Energy", "Waste"], None);

    let outcome = service.run_analysis(&job).await.expect("analysis");

    assert_eq!(outcome.chunk_count, 0);
    assert!(outcome.chunks_file.is_none());
    assert!(outcome.prompt_file.exists());

    let contents = std::fs::read_to_string(&outcome.prompt_file).expect("prompt file");
    let records: Vec<BatchRequestRecord> = contents
        .lines()
        .map(|line| serde_json::from_str(line).expect("jsonl record"))
        .collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].custom_id, "JOB-20250301-091500-energy");
    assert_eq!(records[1].custom_id, "JOB-20250301-091500-waste");
    assert_eq!(records[0].body.metadata.company_name, "Acme Utilities");
}

#[tokio::test]
async fn unparseable_document_degrades_to_zero_chunks() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = Arc::new(test_config(dir.path()));
    let service = AnalysisService::new(Arc::clone(&config));

    let bogus = dir.path().join("not_really_a.pdf");
    std::fs::write(&bogus, b"this is not a pdf").expect("write bogus file");
    let job = sample_job(&["Energy"], Some(&bogus));

    let outcome = service.run_analysis(&job).await.expect("analysis");

    assert_eq!(outcome.chunk_count, 0);
    assert!(outcome.chunks_file.is_none());
    assert!(outcome.prompt_file.exists());
    let excerpt = outcome.pdf_info.sample_excerpt.expect("excerpt");
    assert!(excerpt.contains("PDF parsing error"), "{excerpt}");
    assert_eq!(outcome.pdf_info.file_name.as_deref(), Some("not_really_a.pdf"));
}
