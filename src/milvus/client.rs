//! HTTP client wrapper for the Milvus/Zilliz REST surface.

use crate::config::Config;
use crate::milvus::types::{
    ChunkRow, HasCollectionData, InsertData, MilvusError, ResponseEnvelope,
};
use reqwest::Client;
use serde_json::{Value, json};

/// Upper bound on stored text length, fixed at collection creation.
const TEXT_MAX_LENGTH: u32 = 8192;
/// Upper bound on id/job_id length, fixed at collection creation.
const ID_MAX_LENGTH: u32 = 64;
/// Candidate-list parameter of the inverted-file index.
const IVF_NLIST: u32 = 128;

/// Lightweight HTTP client for vector-collection operations.
pub struct MilvusService {
    client: Client,
    base_url: String,
    token: Option<String>,
    db_name: String,
    collection: String,
}

impl MilvusService {
    /// Construct a new client from the loaded configuration.
    pub fn new(config: &Config) -> Result<Self, MilvusError> {
        let client = Client::builder().user_agent("esgpipe/0.1").build()?;
        let base_url = normalize_base_url(&config.milvus_uri).map_err(MilvusError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            db = %config.milvus_db,
            collection = %config.milvus_collection,
            has_token = config.milvus_token.as_deref().is_some_and(|t| !t.is_empty()),
            "Initialized Milvus HTTP client"
        );
        Ok(Self {
            client,
            base_url,
            token: config.milvus_token.clone(),
            db_name: config.milvus_db.clone(),
            collection: config.milvus_collection.clone(),
        })
    }

    /// Name of the collection this service manages.
    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    /// Ensure the chunk collection exists and is loaded for serving.
    ///
    /// Idempotent: when the collection already exists this is a no-op and
    /// `dim` is NOT validated against the existing schema — a mismatch will
    /// only surface as an insert-time error.
    pub async fn ensure_collection(&self, dim: usize) -> Result<(), MilvusError> {
        if self.has_collection().await? {
            tracing::debug!(collection = %self.collection, "Collection already exists");
            return Ok(());
        }

        tracing::info!(collection = %self.collection, dim, "Creating collection");
        self.create_collection(dim).await?;
        self.load_collection().await
    }

    /// Check whether the collection exists.
    pub async fn has_collection(&self) -> Result<bool, MilvusError> {
        let body = json!({
            "dbName": self.db_name,
            "collectionName": self.collection,
        });
        let data: Option<HasCollectionData> = self.post("/v2/vectordb/collections/has", &body).await?;
        Ok(data.is_some_and(|payload| payload.has))
    }

    /// Create the collection with the fixed five-field schema and a cosine
    /// IVF_FLAT index on the embedding field.
    async fn create_collection(&self, dim: usize) -> Result<(), MilvusError> {
        let body = json!({
            "dbName": self.db_name,
            "collectionName": self.collection,
            "schema": {
                "autoId": false,
                "enableDynamicField": false,
                "fields": [
                    {
                        "fieldName": "id",
                        "dataType": "VarChar",
                        "isPrimary": true,
                        "elementTypeParams": { "max_length": ID_MAX_LENGTH }
                    },
                    {
                        "fieldName": "embedding",
                        "dataType": "FloatVector",
                        "elementTypeParams": { "dim": dim }
                    },
                    {
                        "fieldName": "text",
                        "dataType": "VarChar",
                        "elementTypeParams": { "max_length": TEXT_MAX_LENGTH }
                    },
                    {
                        "fieldName": "job_id",
                        "dataType": "VarChar",
                        "elementTypeParams": { "max_length": ID_MAX_LENGTH }
                    },
                    {
                        "fieldName": "page",
                        "dataType": "Int64"
                    }
                ]
            },
            "indexParams": [
                {
                    "fieldName": "embedding",
                    "indexName": "embedding_index",
                    "metricType": "COSINE",
                    "params": { "index_type": "IVF_FLAT", "nlist": IVF_NLIST }
                }
            ]
        });

        let _: Option<Value> = self.post("/v2/vectordb/collections/create", &body).await?;
        tracing::debug!(collection = %self.collection, dim, "Collection created");
        Ok(())
    }

    /// Load the collection into serving state.
    async fn load_collection(&self) -> Result<(), MilvusError> {
        let body = json!({
            "dbName": self.db_name,
            "collectionName": self.collection,
        });
        let _: Option<Value> = self.post("/v2/vectordb/collections/load", &body).await?;
        tracing::debug!(collection = %self.collection, "Collection loaded");
        Ok(())
    }

    /// Bulk-append rows to the collection.
    ///
    /// The server-reported insert count is checked against the submitted row
    /// count; a shortfall is an error, and the collection may then hold a
    /// partial batch (the store gives no atomicity guarantee).
    pub async fn insert_rows(&self, rows: &[ChunkRow]) -> Result<usize, MilvusError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let body = json!({
            "dbName": self.db_name,
            "collectionName": self.collection,
            "data": rows,
        });
        let data: Option<InsertData> = self.post("/v2/vectordb/entities/insert", &body).await?;
        let inserted = data.map(|payload| payload.insert_count).unwrap_or(0);
        if inserted != rows.len() {
            return Err(MilvusError::InsertCountMismatch {
                submitted: rows.len(),
                inserted,
            });
        }
        tracing::debug!(collection = %self.collection, rows = inserted, "Rows inserted");
        Ok(inserted)
    }

    /// Flush the collection, making inserted rows visible to queries.
    pub async fn flush(&self) -> Result<(), MilvusError> {
        let body = json!({
            "dbName": self.db_name,
            "collectionName": self.collection,
        });
        let _: Option<Value> = self.post("/v2/vectordb/collections/flush", &body).await?;
        tracing::debug!(collection = %self.collection, "Collection flushed");
        Ok(())
    }

    /// POST a request, unwrap the `{code, message, data}` envelope, and map
    /// logical failures to typed errors.
    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<Option<T>, MilvusError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.post(url).json(body);
        if let Some(token) = self.token.as_deref().filter(|t| !t.is_empty()) {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = MilvusError::UnexpectedStatus { status, body };
            tracing::error!(collection = %self.collection, error = %error, "Milvus request failed");
            return Err(error);
        }

        let envelope: ResponseEnvelope<T> = response.json().await?;
        if envelope.code != 0 {
            let error = MilvusError::Server {
                code: envelope.code,
                message: envelope.message.unwrap_or_default(),
            };
            tracing::error!(collection = %self.collection, error = %error, "Milvus reported a logical failure");
            return Err(error);
        }
        Ok(envelope.data)
    }
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    Ok(parsed.to_string().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    fn service_for(server: &MockServer) -> MilvusService {
        let base = tempfile::tempdir().expect("tempdir");
        let mut config = crate::config::test_config(base.path());
        config.milvus_uri = server.base_url();
        MilvusService::new(&config).expect("service")
    }

    #[tokio::test]
    async fn ensure_collection_is_a_noop_when_collection_exists() {
        let server = MockServer::start_async().await;
        let has = server
            .mock_async(|when, then| {
                when.method(POST).path("/v2/vectordb/collections/has");
                then.status(200)
                    .json_body(serde_json::json!({ "code": 0, "data": { "has": true } }));
            })
            .await;
        let create = server
            .mock_async(|when, then| {
                when.method(POST).path("/v2/vectordb/collections/create");
                then.status(200).json_body(serde_json::json!({ "code": 0 }));
            })
            .await;

        let service = service_for(&server);
        service.ensure_collection(768).await.expect("ensure");
        service.ensure_collection(768).await.expect("ensure again");

        has.assert_hits(2);
        create.assert_hits(0);
    }

    #[tokio::test]
    async fn ensure_collection_creates_and_loads_when_absent() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v2/vectordb/collections/has");
                then.status(200)
                    .json_body(serde_json::json!({ "code": 0, "data": { "has": false } }));
            })
            .await;
        let create = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v2/vectordb/collections/create")
                    .json_body_partial(
                        serde_json::json!({
                            "collectionName": "sr_chunks",
                            "indexParams": [
                                {
                                    "fieldName": "embedding",
                                    "metricType": "COSINE",
                                    "params": { "index_type": "IVF_FLAT", "nlist": 128 }
                                }
                            ]
                        })
                        .to_string(),
                    );
                then.status(200).json_body(serde_json::json!({ "code": 0 }));
            })
            .await;
        let load = server
            .mock_async(|when, then| {
                when.method(POST).path("/v2/vectordb/collections/load");
                then.status(200).json_body(serde_json::json!({ "code": 0 }));
            })
            .await;

        let service = service_for(&server);
        service.ensure_collection(768).await.expect("ensure");

        create.assert();
        load.assert();
    }

    #[tokio::test]
    async fn logical_failure_maps_to_server_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v2/vectordb/collections/has");
                then.status(200).json_body(
                    serde_json::json!({ "code": 1100, "message": "database not found" }),
                );
            })
            .await;

        let service = service_for(&server);
        let err = service.has_collection().await.unwrap_err();
        assert!(matches!(err, MilvusError::Server { code: 1100, .. }));
    }

    #[tokio::test]
    async fn insert_count_shortfall_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v2/vectordb/entities/insert");
                then.status(200).json_body(
                    serde_json::json!({ "code": 0, "data": { "insertCount": 1 } }),
                );
            })
            .await;

        let service = service_for(&server);
        let rows = vec![
            ChunkRow {
                id: "a".into(),
                embedding: vec![0.0, 1.0],
                text: "one".into(),
                job_id: "JOB-1".into(),
                page: 1,
            },
            ChunkRow {
                id: "b".into(),
                embedding: vec![1.0, 0.0],
                text: "two".into(),
                job_id: "JOB-1".into(),
                page: 1,
            },
        ];
        let err = service.insert_rows(&rows).await.unwrap_err();
        assert!(matches!(
            err,
            MilvusError::InsertCountMismatch {
                submitted: 2,
                inserted: 1
            }
        ));
    }
}
