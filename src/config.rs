use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the analysis server and the embedding worker.
///
/// Constructed once at process start and passed explicitly to each component
/// constructor; business logic never reads ambient process state.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URI of the Milvus/Zilliz endpoint hosting the vector collection.
    pub milvus_uri: String,
    /// Optional bearer token for the Milvus endpoint.
    pub milvus_token: Option<String>,
    /// Database name passed on each Milvus request.
    pub milvus_db: String,
    /// Name of the collection storing report chunks.
    pub milvus_collection: String,
    /// API key for the Gemini embedding service.
    pub gemini_api_key: String,
    /// Gemini embedding model identifier.
    pub gemini_embed_model: String,
    /// Base URL of the Gemini API.
    pub gemini_base_url: String,
    /// Model identifier written into each batch request record.
    pub batch_model: String,
    /// Directory receiving uploaded report PDFs.
    pub upload_dir: PathBuf,
    /// Directory receiving per-job prompt JSONL files.
    pub prompts_dir: PathBuf,
    /// Base directory for per-job chunk artifacts.
    pub chunks_dir: PathBuf,
    /// Maximum accepted upload size in megabytes.
    pub max_upload_mb: usize,
    /// Maximum characters per chunk.
    pub chunk_max_chars: usize,
    /// Character overlap between consecutive chunks of a page.
    pub chunk_overlap: usize,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_GEMINI_EMBED_MODEL: &str = "text-embedding-004";
const DEFAULT_BATCH_MODEL: &str = "gpt-4.1-mini";
const DEFAULT_MAX_UPLOAD_MB: usize = 50;
const DEFAULT_CHUNK_MAX_CHARS: usize = 1000;
const DEFAULT_CHUNK_OVERLAP: usize = 200;

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            milvus_uri: load_env("MILVUS_URI")?,
            milvus_token: load_env_optional("MILVUS_TOKEN"),
            milvus_db: load_env_optional("MILVUS_DB").unwrap_or_else(|| "default".to_string()),
            milvus_collection: load_env_optional("MILVUS_COLLECTION")
                .unwrap_or_else(|| "sr_chunks".to_string()),
            gemini_api_key: load_env("GEMINI_API_KEY")?,
            gemini_embed_model: load_env_optional("GEMINI_EMBED_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_EMBED_MODEL.to_string()),
            gemini_base_url: load_env_optional("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            batch_model: load_env_optional("BATCH_MODEL")
                .unwrap_or_else(|| DEFAULT_BATCH_MODEL.to_string()),
            upload_dir: load_env_optional("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads")),
            prompts_dir: load_env_optional("PROMPTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("jobs/prompts")),
            chunks_dir: load_env_optional("CHUNKS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/processed")),
            max_upload_mb: parse_optional("MAX_UPLOAD_MB")?.unwrap_or(DEFAULT_MAX_UPLOAD_MB),
            chunk_max_chars: parse_optional("CHUNK_MAX_CHARS")?.unwrap_or(DEFAULT_CHUNK_MAX_CHARS),
            chunk_overlap: parse_optional("CHUNK_OVERLAP")?.unwrap_or(DEFAULT_CHUNK_OVERLAP),
            server_port: parse_optional("SERVER_PORT")?,
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

/// Build a configuration suitable for tests without touching process env.
#[cfg(test)]
pub(crate) fn test_config(base: &std::path::Path) -> Config {
    Config {
        milvus_uri: "http://127.0.0.1:19530".into(),
        milvus_token: None,
        milvus_db: "default".into(),
        milvus_collection: "sr_chunks".into(),
        gemini_api_key: "test-key".into(),
        gemini_embed_model: DEFAULT_GEMINI_EMBED_MODEL.into(),
        gemini_base_url: DEFAULT_GEMINI_BASE_URL.into(),
        batch_model: DEFAULT_BATCH_MODEL.into(),
        upload_dir: base.join("uploads"),
        prompts_dir: base.join("prompts"),
        chunks_dir: base.join("chunks"),
        max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
        chunk_max_chars: DEFAULT_CHUNK_MAX_CHARS,
        chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        server_port: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_pipeline_parameters() {
        let config = test_config(std::path::Path::new("/tmp/esgpipe-test"));
        assert_eq!(config.chunk_max_chars, 1000);
        assert_eq!(config.chunk_overlap, 200);
        assert_eq!(config.max_upload_mb, 50);
        assert_eq!(config.milvus_collection, "sr_chunks");
    }
}
