use crate::{
    config::Config,
    error::{ApiError, Result},
    models::RetrievedDocument,
    services::{Embedder, VectorIndex},
};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{header::HeaderMap, header::HeaderValue, Client};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tracing::{debug, info};

/// Metadata key holding the embedded text of each vector.
pub const TEXT_METADATA_KEY: &str = "text";

/// REST client for a single Pinecone index (data plane).
#[derive(Debug, Clone)]
pub struct PineconeClient {
    client: Client,
    base_url: String,
    namespace: Option<String>,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<&'a str>,
    pub vector: &'a [f32],
    pub top_k: usize,
    pub include_values: bool,
    pub include_metadata: bool,
}

#[derive(Debug, Deserialize)]
pub struct QueryMatch {
    pub id: String,
    #[serde(default)]
    pub score: f32,
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub matches: Vec<QueryMatch>,
}

#[derive(Debug, Serialize)]
pub struct UpsertRequest<'a> {
    pub vectors: &'a [Vector],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertResponse {
    #[serde(default)]
    pub upserted_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vector {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    #[serde(default)]
    pub dimension: usize,
    #[serde(default)]
    pub index_fullness: f32,
    #[serde(default)]
    pub namespaces: HashMap<String, NamespaceStats>,
    #[serde(default)]
    pub total_vector_count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceStats {
    pub vector_count: usize,
}

impl PineconeClient {
    /// `host` is the index host shown in the Pinecone console, with or
    /// without the `https://` scheme.
    pub fn new(
        api_key: &str,
        host: &str,
        namespace: Option<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Api-Key",
            HeaderValue::from_str(api_key).context("Invalid Pinecone API key")?,
        );
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        let host = host.trim_end_matches('/');
        let base_url = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        };

        Ok(Self {
            client,
            base_url,
            namespace: namespace.filter(|ns| !ns.is_empty()),
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::new(
            &config.pinecone_api_key,
            &config.pinecone_host,
            config.pinecone_namespace.clone(),
            config.search_timeout(),
        )
    }

    pub async fn query(&self, vector: &[f32], top_k: usize) -> anyhow::Result<QueryResponse> {
        let request = QueryRequest {
            namespace: self.namespace.as_deref(),
            vector,
            top_k,
            include_values: false,
            include_metadata: true,
        };

        let response = self
            .client
            .post(format!("{}/query", self.base_url))
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            anyhow::bail!("Pinecone query failed ({}): {}", status, error_text);
        }

        let query_response = response.json().await?;
        Ok(query_response)
    }

    pub async fn upsert(&self, vectors: &[Vector]) -> anyhow::Result<usize> {
        let request = UpsertRequest {
            vectors,
            namespace: self.namespace.as_deref(),
        };

        let response = self
            .client
            .post(format!("{}/vectors/upsert", self.base_url))
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            anyhow::bail!("Pinecone upsert failed ({}): {}", status, error_text);
        }

        let upserted: UpsertResponse = response.json().await?;
        Ok(upserted.upserted_count)
    }

    pub async fn describe_index_stats(&self) -> anyhow::Result<IndexStats> {
        let response = self
            .client
            .post(format!("{}/describe_index_stats", self.base_url))
            .timeout(self.timeout)
            .json(&serde_json::json!({}))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            anyhow::bail!(
                "Pinecone describe index stats failed ({}): {}",
                status,
                error_text
            );
        }

        let stats = response.json().await?;
        Ok(stats)
    }
}

/// Query-by-text over Pinecone: embed the query, then nearest-neighbour
/// search.
#[derive(Clone)]
pub struct PineconeIndex {
    embedder: Arc<dyn Embedder>,
    pinecone: PineconeClient,
}

impl PineconeIndex {
    pub fn new(embedder: Arc<dyn Embedder>, pinecone: PineconeClient) -> Self {
        Self { embedder, pinecone }
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<RetrievedDocument>> {
        let embeddings = self.embedder.embed(&[query.to_string()]).await?;
        let embedding = embeddings
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::ExternalServiceError("Empty embedding response".into()))?;

        let response = self
            .pinecone
            .query(&embedding, k)
            .await
            .map_err(|e| ApiError::ExternalServiceError(e.to_string()))?;

        debug!(
            "Pinecone returned {} matches, best: {:?}",
            response.matches.len(),
            response.matches.first().map(|m| (&m.id, m.score))
        );

        Ok(response.matches.into_iter().map(into_document).collect())
    }
}

/// Split a match into the embedded text and the remaining metadata.
fn into_document(found: QueryMatch) -> RetrievedDocument {
    let mut metadata = found.metadata.unwrap_or_default();
    let content = match metadata.remove(TEXT_METADATA_KEY) {
        Some(Value::String(text)) => text,
        _ => String::new(),
    };

    RetrievedDocument { content, metadata }
}

/// Metadata stored alongside each ingested vector.
pub fn book_metadata(title: &str, text: &str) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("title".to_string(), Value::String(title.to_string()));
    metadata.insert(TEXT_METADATA_KEY.to_string(), Value::String(text.to_string()));
    metadata
}

impl IndexStats {
    pub fn log_summary(&self) {
        info!(
            "Index: dimension {}, {} vectors, fullness {:.4}",
            self.dimension, self.total_vector_count, self.index_fullness
        );
        for (name, ns) in &self.namespaces {
            let name = if name.is_empty() { "(default)" } else { name };
            info!("  namespace {}: {} vectors", name, ns.vector_count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FixedEmbedder;

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.1, 0.2, 0.3]).collect())
        }
    }

    fn client_for(server: &MockServer, namespace: Option<&str>) -> PineconeClient {
        PineconeClient::new(
            "pc-test",
            &server.uri(),
            namespace.map(str::to_string),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_host_without_scheme_gets_https() {
        let client =
            PineconeClient::new("k", "books-abc.svc.pinecone.io/", None, Duration::from_secs(1))
                .unwrap();
        assert_eq!(client.base_url, "https://books-abc.svc.pinecone.io");
    }

    #[tokio::test]
    async fn test_similarity_search_maps_text_metadata_to_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .and(header("api-key", "pc-test"))
            .and(body_partial_json(json!({
                "topK": 4,
                "includeMetadata": true,
                "namespace": "books"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "matches": [
                    {"id": "dune", "score": 0.91, "metadata": {"title": "Dune", "text": "Spice and sand."}},
                    {"id": "emma", "score": 0.42, "metadata": {"title": "Emma"}}
                ],
                "namespace": "books"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let index = PineconeIndex::new(Arc::new(FixedEmbedder), client_for(&server, Some("books")));
        let documents = index.similarity_search("desert planet", 4).await.unwrap();

        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].content, "Spice and sand.");
        assert_eq!(documents[0].metadata_str("title"), Some("Dune"));
        assert!(documents[0].metadata.get("text").is_none());
        assert_eq!(documents[1].content, "");
    }

    #[tokio::test]
    async fn test_query_failure_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let index = PineconeIndex::new(Arc::new(FixedEmbedder), client_for(&server, None));
        let result = index.similarity_search("anything", 4).await;
        assert!(matches!(result, Err(ApiError::ExternalServiceError(_))));
    }

    #[tokio::test]
    async fn test_upsert_returns_count() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/vectors/upsert"))
            .and(body_partial_json(json!({
                "vectors": [{"id": "dune", "metadata": {"title": "Dune", "text": "Spice."}}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"upsertedCount": 1})))
            .mount(&server)
            .await;

        let vectors = vec![Vector {
            id: "dune".to_string(),
            values: vec![0.5, 0.5],
            metadata: Some(book_metadata("Dune", "Spice.")),
        }];
        let count = client_for(&server, None).upsert(&vectors).await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_describe_index_stats() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/describe_index_stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "namespaces": {"": {"vectorCount": 12}},
                "dimension": 1536,
                "indexFullness": 0.0,
                "totalVectorCount": 12
            })))
            .mount(&server)
            .await;

        let stats = client_for(&server, None).describe_index_stats().await.unwrap();
        assert_eq!(stats.dimension, 1536);
        assert_eq!(stats.total_vector_count, 12);
        assert_eq!(stats.namespaces[""].vector_count, 12);
    }
}
