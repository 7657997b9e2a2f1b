//! HTTP adapters for the external service contracts.
//!
//! Transient failures (429, 5xx, connection errors) are retried with
//! exponential backoff inside the adapter; anything that survives the
//! retries surfaces as a stage failure upstream.

use super::{
    EmbeddingProvider, LlmReviewClient, LlmReviewRequest, LlmReviewResponse, MetadataRegistry,
    VectorStore,
};
use crate::chunk::NormalizedChunk;
use crate::error::{EmbeddingError, VectorStoreError};
use crate::facets::DiscoveredFacet;
use crate::identity::DocumentIdentity;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const MAX_RETRIES: u32 = 3;

fn build_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("Failed to build HTTP client")
}

async fn backoff(attempt: u32) {
    if attempt > 0 {
        // Exponential backoff: 1s, 2s, 4s, ...
        let delay = Duration::from_secs(1 << (attempt - 1).min(5));
        tokio::time::sleep(delay).await;
    }
}

/// POSTs a JSON body, retrying transient failures. Returns the successful
/// response or the last error.
async fn post_with_retries<B: Serialize>(
    client: &reqwest::Client,
    url: &str,
    api_key: Option<&str>,
    body: &B,
) -> Result<reqwest::Response> {
    let mut last_err = None;

    for attempt in 0..=MAX_RETRIES {
        backoff(attempt).await;

        let mut request = client.post(url).json(body);
        if let Some(key) = api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return Ok(response);
                }
                if status.as_u16() == 429 || status.is_server_error() {
                    let text = response.text().await.unwrap_or_default();
                    last_err = Some(anyhow::anyhow!("{} returned {}: {}", url, status, text));
                    continue;
                }
                let text = response.text().await.unwrap_or_default();
                bail!("{} returned {}: {}", url, status, text);
            }
            Err(e) => {
                last_err = Some(e.into());
                continue;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Request to {} failed after retries", url)))
}

/// OpenAI-compatible embeddings endpoint.
pub struct HttpEmbeddingClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl HttpEmbeddingClient {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            client: build_client(DEFAULT_TIMEOUT_SECS)?,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingClient {
    async fn get_embedding(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let body = serde_json::json!({
            "model": self.model,
            "input": [text],
        });

        let response = post_with_retries(&self.client, &self.endpoint, self.api_key.as_deref(), &body)
            .await
            .map_err(|e| EmbeddingError::RequestFailed(e.to_string()))?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| EmbeddingError::MalformedResponse(e.to_string()))?;

        let data = json
            .get("data")
            .and_then(|d| d.as_array())
            .ok_or_else(|| EmbeddingError::MalformedResponse("missing data array".to_string()))?;

        let first = data.first().ok_or(EmbeddingError::EmptyResponse)?;
        let values = first
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| EmbeddingError::MalformedResponse("missing embedding field".to_string()))?;

        let vector: Vec<f32> = values
            .iter()
            .map(|v| v.as_f64().map(|f| f as f32))
            .collect::<Option<Vec<f32>>>()
            .ok_or_else(|| EmbeddingError::MalformedResponse("non-numeric embedding value".to_string()))?;

        if vector.is_empty() {
            return Err(EmbeddingError::EmptyResponse);
        }
        Ok(vector)
    }
}

#[derive(Serialize)]
struct ChunkPayload<'a> {
    chunk_id: Option<&'a str>,
    section_key: Option<&'a str>,
    text: &'a str,
    sub_kind: Option<&'a str>,
    embedding: Option<&'a [f32]>,
    metadata: &'a std::collections::BTreeMap<String, String>,
}

#[derive(Serialize)]
struct IndexRequest<'a> {
    doc_id: &'a str,
    org_id: &'a str,
    repo_id: &'a str,
    relative_path: &'a str,
    chunks: Vec<ChunkPayload<'a>>,
    facets: Vec<FacetPayload<'a>>,
}

#[derive(Serialize)]
struct FacetPayload<'a> {
    facet_type: &'a str,
    value: &'a str,
}

/// Vector store spoken to over a small JSON API: POST /documents to
/// upsert, DELETE /documents/{doc_id} to remove.
pub struct HttpVectorStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpVectorStore {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            client: build_client(DEFAULT_TIMEOUT_SECS)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl VectorStore for HttpVectorStore {
    async fn index_chunks(
        &self,
        identity: &DocumentIdentity,
        chunks: &[NormalizedChunk],
        facets: &[DiscoveredFacet],
    ) -> Result<(), VectorStoreError> {
        let request = IndexRequest {
            doc_id: &identity.doc_id,
            org_id: &identity.org_id,
            repo_id: &identity.repo_id,
            relative_path: &identity.relative_path,
            chunks: chunks
                .iter()
                .map(|c| ChunkPayload {
                    chunk_id: c.identity.chunk_id.as_deref(),
                    section_key: c.identity.section_key.as_deref(),
                    text: &c.normalized_text,
                    sub_kind: c.sub_kind.as_deref(),
                    embedding: c.embedding.as_deref(),
                    metadata: &c.metadata,
                })
                .collect(),
            facets: facets
                .iter()
                .map(|f| FacetPayload {
                    facet_type: &f.facet.facet_type,
                    value: &f.facet.value,
                })
                .collect(),
        };

        let url = format!("{}/documents", self.base_url);
        post_with_retries(&self.client, &url, self.api_key.as_deref(), &request)
            .await
            .map_err(|e| VectorStoreError::UpsertFailed(e.to_string()))?;
        Ok(())
    }

    async fn delete_document(&self, identity: &DocumentIdentity) -> Result<(), VectorStoreError> {
        let url = format!("{}/documents/{}", self.base_url, identity.doc_id);
        let mut request = self.client.delete(&url);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await.map_err(|e| VectorStoreError::RequestFailed(e.to_string()))?;
        let status = response.status();

        // Idempotent: a document that is already gone is fine
        if status.is_success() || status.as_u16() == 404 {
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        Err(VectorStoreError::DeleteFailed {
            doc_id: identity.doc_id.clone(),
            reason: format!("{}: {}", status, text),
        })
    }
}

/// Metadata registry reached over POST /facets.
pub struct HttpMetadataRegistry {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpMetadataRegistry {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            client: build_client(DEFAULT_TIMEOUT_SECS)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl MetadataRegistry for HttpMetadataRegistry {
    async fn report_facets(
        &self,
        org_id: &str,
        project_id: Option<&str>,
        repo_id: &str,
        facets: &[DiscoveredFacet],
    ) -> Result<()> {
        let body = serde_json::json!({
            "org_id": org_id,
            "project_id": project_id,
            "repo_id": repo_id,
            "facets": facets
                .iter()
                .map(|f| serde_json::json!({
                    "doc_id": f.doc_id,
                    "facet_type": f.facet.facet_type,
                    "value": f.facet.value,
                }))
                .collect::<Vec<_>>(),
        });

        let url = format!("{}/facets", self.base_url);
        post_with_retries(&self.client, &url, self.api_key.as_deref(), &body).await?;
        Ok(())
    }
}

/// LLM review endpoint used by the optional enrichment tier.
pub struct HttpLlmReviewClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpLlmReviewClient {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            client: build_client(DEFAULT_TIMEOUT_SECS * 2)?,
            endpoint: endpoint.into(),
            api_key,
        })
    }
}

#[async_trait]
impl LlmReviewClient for HttpLlmReviewClient {
    async fn review(&self, request: &LlmReviewRequest) -> Result<LlmReviewResponse> {
        let response =
            post_with_retries(&self.client, &self.endpoint, self.api_key.as_deref(), request).await?;
        let parsed: LlmReviewResponse = response
            .json()
            .await
            .context("Failed to parse LLM review response")?;
        Ok(parsed)
    }
}
