//! External service contracts: embedding, vector store, metadata registry
//! and the LLM review client. The pipeline only sees these traits; HTTP
//! adapters live in [`http`].

pub mod http;

pub use http::{HttpEmbeddingClient, HttpLlmReviewClient, HttpMetadataRegistry, HttpVectorStore};

use crate::chunk::NormalizedChunk;
use crate::error::{EmbeddingError, VectorStoreError};
use crate::facets::DiscoveredFacet;
use crate::identity::DocumentIdentity;
use async_trait::async_trait;

/// Produces an embedding vector for a piece of text.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn get_embedding(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Vector store keyed by document identity.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Upload all chunks for one document together with its facets. Must
    /// be all-or-nothing from the caller's perspective.
    async fn index_chunks(
        &self,
        identity: &DocumentIdentity,
        chunks: &[NormalizedChunk],
        facets: &[DiscoveredFacet],
    ) -> Result<(), VectorStoreError>;

    /// Remove every chunk belonging to a document. Deleting a document
    /// that does not exist is not an error.
    async fn delete_document(&self, identity: &DocumentIdentity) -> Result<(), VectorStoreError>;
}

/// Receives the deduplicated facet set once per run.
#[async_trait]
pub trait MetadataRegistry: Send + Sync {
    async fn report_facets(
        &self,
        org_id: &str,
        project_id: Option<&str>,
        repo_id: &str,
        facets: &[DiscoveredFacet],
    ) -> anyhow::Result<()>;
}

/// What kind of artifact an LLM review request concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewKind {
    Model,
    Domain,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct LlmReviewRequest {
    pub kind: ReviewKind,
    pub symbol_name: String,
    pub title: String,
    pub description: String,
    pub help: String,
    pub domain_context: String,
    pub field_metadata: Vec<String>,
    /// Blended context blob assembled by the caller
    pub context: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct LlmReviewResponse {
    pub title: String,
    pub description: String,
    pub help: String,
    #[serde(default)]
    pub rationale: String,
}

/// Optional enrichment tier: one rewrite attempt for descriptions the
/// quality gate rejected.
#[async_trait]
pub trait LlmReviewClient: Send + Sync {
    async fn review(&self, request: &LlmReviewRequest) -> anyhow::Result<LlmReviewResponse>;
}
