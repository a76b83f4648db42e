//! Embedding client abstraction and the Gemini adapter.
//!
//! The vector dimension is a property of the remote model and is not known in
//! advance; callers treat the length of the first returned vector as a
//! run-time constant for the rest of the ingestion run. Calls are issued one
//! at a time and are never retried here.

use crate::config::Config;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by embedding providers.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// HTTP layer failed before receiving a response.
    #[error("embedding request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The service responded with a non-success status.
    #[error("unexpected embedding service response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the service.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// The service answered 200 but without a usable vector.
    #[error("embedding service returned no vector values")]
    MalformedResponse,
}

/// Interface implemented by embedding backends.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Produce one embedding vector for the supplied text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Client for the Gemini `embedContent` endpoint.
pub struct GeminiEmbeddingClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct EmbedContentRequest<'a> {
    model: String,
    content: ContentPayload<'a>,
}

#[derive(Serialize)]
struct ContentPayload<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    #[serde(default)]
    values: Vec<f32>,
}

impl GeminiEmbeddingClient {
    /// Construct a client from the loaded configuration.
    pub fn new(config: &Config) -> Result<Self, EmbeddingError> {
        let client = Client::builder().user_agent("esgpipe/0.1").build()?;
        Ok(Self {
            client,
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_embed_model.clone(),
        })
    }
}

#[async_trait]
impl EmbeddingClient for GeminiEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let url = format!("{}/v1beta/models/{}:embedContent", self.base_url, self.model);
        let request = EmbedContentRequest {
            model: format!("models/{}", self.model),
            content: ContentPayload {
                parts: vec![TextPart { text }],
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = EmbeddingError::UnexpectedStatus { status, body };
            tracing::error!(model = %self.model, error = %error, "Embedding request failed");
            return Err(error);
        }

        let payload: EmbedContentResponse = response.json().await?;
        if payload.embedding.values.is_empty() {
            return Err(EmbeddingError::MalformedResponse);
        }
        Ok(payload.embedding.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    fn client_for(server: &MockServer) -> GeminiEmbeddingClient {
        let base = tempfile::tempdir().expect("tempdir");
        let mut config = crate::config::test_config(base.path());
        config.gemini_base_url = server.base_url();
        config.gemini_embed_model = "text-embedding-004".into();
        GeminiEmbeddingClient::new(&config).expect("client")
    }

    #[tokio::test]
    async fn embed_parses_vector_values() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/text-embedding-004:embedContent")
                    .header("x-goog-api-key", "test-key");
                then.status(200).json_body(serde_json::json!({
                    "embedding": { "values": [0.1, 0.2, 0.3] }
                }));
            })
            .await;

        let client = client_for(&server);
        let vector = client.embed("report chunk").await.expect("vector");
        mock.assert();
        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn non_success_status_is_surfaced_with_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(429).body("quota exhausted");
            })
            .await;

        let client = client_for(&server);
        let err = client.embed("report chunk").await.unwrap_err();
        match err {
            EmbeddingError::UnexpectedStatus { status, body } => {
                assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
                assert!(body.contains("quota"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_vector_is_a_malformed_response() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200)
                    .json_body(serde_json::json!({ "embedding": { "values": [] } }));
            })
            .await;

        let client = client_for(&server);
        let err = client.embed("report chunk").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::MalformedResponse));
    }
}
