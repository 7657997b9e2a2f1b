//! Per-file indexing pipeline.
//!
//! A strictly ordered sequence of stages executed for one file. Any stage
//! failure aborts the remaining stages and surfaces to the orchestrator;
//! the local index record is only touched by the caller after the upload
//! stage confirms, so a failed file is simply retried on the next run.

use crate::catalog::DomainModelCatalog;
use crate::chunk::{ChunkKind, NormalizedChunk};
use crate::classify::{classify_symbol, Classification, SubKind};
use crate::describe::{DescriptionBuilder, ThreeLensDescription};
use crate::describe::DescriptionContext;
use crate::error::PipelineError;
use crate::facets::{DiscoveredFacet, FacetValue};
use crate::identity::DocumentIdentity;
use crate::quality::{QualityScorer, ScoreGate};
use crate::registry::ProcessorRegistry;
use crate::services::{
    EmbeddingProvider, LlmReviewClient, LlmReviewRequest, ReviewKind, VectorStore,
};
use crate::symbols::{SymbolSpan, SymbolSplitter};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Pipeline progress for one file, recorded on the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    ExtractSymbols,
    CategorizeContent,
    SegmentContent,
    BuildDescription,
    UploadContent,
    Done,
    Failed,
}

impl PipelineState {
    pub fn stage_name(&self) -> &'static str {
        match self {
            PipelineState::Start => "start",
            PipelineState::ExtractSymbols => "extract-symbols",
            PipelineState::CategorizeContent => "categorize-content",
            PipelineState::SegmentContent => "segment-content",
            PipelineState::BuildDescription => "build-description",
            PipelineState::UploadContent => "upload-content",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        }
    }
}

/// One symbol moving through the stages.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub symbol: SymbolSpan,
    pub classification: Option<Classification>,
    pub lenses: Option<ThreeLensDescription>,
    /// True when the quality gate suppressed the generated description
    pub description_rejected: bool,
}

/// Everything the pipeline owns while processing one file.
pub struct IndexFileContext {
    pub identity: DocumentIdentity,
    pub relative_path: String,
    pub content: String,
    pub content_hash: String,
    /// Document type key for splitter dispatch, usually the file extension
    pub document_type: String,
    pub items: Vec<WorkItem>,
    /// Primary sub-kind for the file, from the first classified symbol
    pub sub_kind: Option<SubKind>,
    pub facets: Vec<FacetValue>,
    chunks_uploaded: usize,
}

impl IndexFileContext {
    pub fn new(
        identity: DocumentIdentity,
        relative_path: impl Into<String>,
        content: impl Into<String>,
        content_hash: impl Into<String>,
    ) -> Self {
        let relative_path = relative_path.into();
        let document_type = relative_path
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_string();
        Self {
            identity,
            relative_path,
            content: content.into(),
            content_hash: content_hash.into(),
            document_type,
            items: Vec::new(),
            sub_kind: None,
            facets: Vec::new(),
            chunks_uploaded: 0,
        }
    }
}

/// Successful pipeline result for one file.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub doc_id: String,
    pub sub_kind: Option<SubKind>,
    pub facets: Vec<FacetValue>,
    pub chunks_uploaded: usize,
    pub descriptions_rejected: usize,
}

/// The five-stage pipeline, shared across files within one run.
pub struct IndexingPipeline {
    splitters: ProcessorRegistry<dyn SymbolSplitter>,
    builders: ProcessorRegistry<dyn DescriptionBuilder>,
    scorer: QualityScorer,
    gate: ScoreGate,
    embedding: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    /// Optional enrichment tier: gate-rejected descriptions get one rewrite
    /// attempt before the rejection stands
    reviewer: Option<Arc<dyn LlmReviewClient>>,
}

impl IndexingPipeline {
    pub fn new(
        splitters: ProcessorRegistry<dyn SymbolSplitter>,
        builders: ProcessorRegistry<dyn DescriptionBuilder>,
        scorer: QualityScorer,
        gate: ScoreGate,
        embedding: Arc<dyn EmbeddingProvider>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            splitters,
            builders,
            scorer,
            gate,
            embedding,
            vector_store,
            reviewer: None,
        }
    }

    pub fn with_reviewer(mut self, reviewer: Arc<dyn LlmReviewClient>) -> Self {
        self.reviewer = Some(reviewer);
        self
    }

    /// Run all stages for one file. On failure the context is dropped and
    /// no local-index bookkeeping happens.
    pub async fn run(
        &self,
        mut ctx: IndexFileContext,
        catalog: &DomainModelCatalog,
        cancel: &CancellationToken,
    ) -> Result<PipelineOutcome, PipelineError> {
        let path = ctx.relative_path.clone();

        for stage in [
            PipelineState::ExtractSymbols,
            PipelineState::CategorizeContent,
            PipelineState::SegmentContent,
            PipelineState::BuildDescription,
            PipelineState::UploadContent,
        ] {
            if cancel.is_cancelled() {
                tracing::debug!(path, stage = stage.stage_name(), "Pipeline cancelled");
                return Err(PipelineError::Cancelled);
            }

            let result = match stage {
                PipelineState::ExtractSymbols => self.extract_symbols(&mut ctx),
                PipelineState::CategorizeContent => self.categorize_content(&mut ctx),
                PipelineState::SegmentContent => self.segment_content(&mut ctx),
                PipelineState::BuildDescription => {
                    self.build_description(&mut ctx, catalog, cancel).await
                }
                PipelineState::UploadContent => self.upload_content(&mut ctx, cancel).await,
                _ => unreachable!(),
            };

            if let Err(e) = result {
                tracing::warn!(path, stage = stage.stage_name(), error = %e, "Pipeline stage failed");
                return Err(e);
            }
        }

        let descriptions_rejected = ctx.items.iter().filter(|i| i.description_rejected).count();

        Ok(PipelineOutcome {
            doc_id: ctx.identity.doc_id.clone(),
            sub_kind: ctx.sub_kind,
            facets: ctx.facets,
            chunks_uploaded: ctx.chunks_uploaded,
            descriptions_rejected,
        })
    }

    /// Stage 1: dispatch to a splitter keyed by document type. A missing
    /// splitter is not an error, there is simply nothing to extract.
    fn extract_symbols(&self, ctx: &mut IndexFileContext) -> Result<(), PipelineError> {
        let Some(splitter) = self.splitters.get_or_default(&ctx.document_type) else {
            tracing::debug!(
                path = ctx.relative_path,
                document_type = ctx.document_type,
                "No splitter registered, skipping symbol extraction"
            );
            return Ok(());
        };

        ctx.items = splitter
            .split(&ctx.content)
            .into_iter()
            .map(|symbol| WorkItem {
                symbol,
                classification: None,
                lenses: None,
                description_rejected: false,
            })
            .collect();
        Ok(())
    }

    /// Stage 2: classify every extracted symbol; the first classification
    /// becomes the file's primary sub-kind.
    fn categorize_content(&self, ctx: &mut IndexFileContext) -> Result<(), PipelineError> {
        for item in &mut ctx.items {
            let classification = classify_symbol(&item.symbol, &ctx.relative_path);
            if ctx.sub_kind.is_none() {
                ctx.sub_kind = Some(classification.sub_kind);
            }
            item.classification = Some(classification);
        }
        Ok(())
    }

    /// Stage 3: reserved for sub-splitting oversized symbols. Deliberately
    /// a separate stage even though it does nothing yet.
    fn segment_content(&self, _ctx: &mut IndexFileContext) -> Result<(), PipelineError> {
        Ok(())
    }

    /// Stage 4: build the three lenses per symbol via the builder registry,
    /// then run the quality gate over the model summary. A missing builder
    /// leaves the item unlensed; raw text still flows downstream. When a
    /// reviewer is configured, a gate rejection gets one rewrite attempt
    /// before it stands.
    async fn build_description(
        &self,
        ctx: &mut IndexFileContext,
        catalog: &DomainModelCatalog,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError> {
        let relative_path = ctx.relative_path.clone();
        for (index, item) in ctx.items.iter_mut().enumerate() {
            let key = item
                .classification
                .as_ref()
                .map(|c| c.sub_kind.key())
                .unwrap_or("");
            let Some(builder) = self.builders.get_or_default(key) else {
                continue;
            };

            let dctx = DescriptionContext {
                symbol: &item.symbol,
                relative_path: &relative_path,
                catalog,
            };
            let lenses = builder.build(&dctx);

            let snippet_id = format!("{}#{}", ctx.identity.doc_id, index);
            let score = self.scorer.score(&lenses.model_summary, catalog);
            let gated = self.gate.handle(&snippet_id, &lenses.model_summary, &score);

            if gated.should_publish {
                item.lenses = Some(lenses);
            } else if let Some(reviewer) = &self.reviewer {
                match Self::review_rejected(
                    reviewer.as_ref(),
                    &snippet_id,
                    item,
                    lenses,
                    catalog,
                    cancel,
                )
                .await?
                {
                    Some(reviewed) => item.lenses = Some(reviewed),
                    None => item.description_rejected = true,
                }
            } else {
                item.description_rejected = true;
            }
        }

        self.collect_facets(ctx, catalog);
        Ok(())
    }

    /// One rewrite attempt for a gate-rejected description. A usable
    /// response replaces the lenses; a failure or empty response leaves
    /// the rejection in place rather than failing the file.
    async fn review_rejected(
        reviewer: &dyn LlmReviewClient,
        snippet_id: &str,
        item: &WorkItem,
        mut lenses: ThreeLensDescription,
        catalog: &DomainModelCatalog,
        cancel: &CancellationToken,
    ) -> Result<Option<ThreeLensDescription>, PipelineError> {
        let kind = match item.classification.as_ref().map(|c| c.sub_kind) {
            Some(SubKind::Model) => ReviewKind::Model,
            _ => ReviewKind::Domain,
        };
        let field_metadata = crate::describe::parse::parse_properties(&item.symbol.text)
            .into_iter()
            .map(|p| format!("{}: {}", p.name, p.type_name))
            .collect();
        let request = LlmReviewRequest {
            kind,
            symbol_name: item.symbol.name.clone(),
            title: item.symbol.name.clone(),
            description: lenses.model_summary.clone(),
            help: lenses.user_detail.clone(),
            domain_context: catalog
                .domain_for_model(&item.symbol.name)
                .map(|d| d.name.clone())
                .unwrap_or_default(),
            field_metadata,
            context: item.symbol.text.clone(),
        };

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            result = reviewer.review(&request) => result,
        };

        match response {
            Ok(reviewed) if !reviewed.description.trim().is_empty() => {
                tracing::info!(snippet_id, "Review rewrote a rejected description");
                lenses.model_summary = reviewed.description;
                if !reviewed.help.trim().is_empty() {
                    lenses.user_detail = reviewed.help;
                }
                Ok(Some(lenses))
            }
            Ok(_) => {
                tracing::debug!(snippet_id, "Review returned no usable description");
                Ok(None)
            }
            Err(e) => {
                tracing::warn!(snippet_id, error = %e, "Review call failed, rejection stands");
                Ok(None)
            }
        }
    }

    fn collect_facets(&self, ctx: &mut IndexFileContext, catalog: &DomainModelCatalog) {
        ctx.facets.push(FacetValue::new("kind", ChunkKind::SourceCode.key()));
        if let Some(sub_kind) = ctx.sub_kind {
            ctx.facets.push(FacetValue::new("sub-kind", sub_kind.key()));
        }
        for item in &ctx.items {
            if !item.symbol.name.is_empty()
                && let Some(domain) = catalog.domain_for_model(&item.symbol.name)
            {
                ctx.facets.push(FacetValue::new("domain", &domain.key));
            }
        }
    }

    /// Stage 5: embed and upload every chunk for this file in one call.
    /// Atomic from the local index's perspective: the caller only marks
    /// the record indexed after this returns Ok.
    async fn upload_content(
        &self,
        ctx: &mut IndexFileContext,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError> {
        let mut chunks = Vec::new();

        if ctx.items.is_empty() {
            // Nothing extracted: the raw file still gets indexed as one chunk
            let chunk = NormalizedChunk::new(ctx.identity.clone(), ChunkKind::SourceCode, ctx.content.clone());
            chunks.push(chunk);
        } else {
            for (index, item) in ctx.items.iter().enumerate() {
                let section_key = if item.symbol.name.is_empty() {
                    format!("s{}", index)
                } else {
                    item.symbol.name.to_lowercase()
                };
                let identity = ctx
                    .identity
                    .with_section(&section_key)
                    .with_symbol(&item.symbol.name, &item.symbol.kind);

                let text = item
                    .lenses
                    .as_ref()
                    .map(|l| l.embed_snippet.clone())
                    .unwrap_or_else(|| item.symbol.text.clone());

                let mut chunk = NormalizedChunk::new(identity, ChunkKind::SourceCode, text);
                chunk.sub_kind = item.classification.as_ref().map(|c| c.sub_kind.key().to_string());
                if let Some(lenses) = &item.lenses {
                    chunk = chunk
                        .with_metadata("model_summary", lenses.model_summary.clone())
                        .with_metadata("user_detail", lenses.user_detail.clone());
                }
                chunks.push(chunk);
            }
        }

        for chunk in &mut chunks {
            let embed = tokio::select! {
                _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
                result = self.embedding.get_embedding(&chunk.normalized_text) => result,
            };
            let vector = embed.map_err(|e| PipelineError::StageFailed {
                stage: "upload-content",
                path: ctx.relative_path.clone(),
                reason: e.to_string(),
            })?;
            chunk.embedding = Some(vector);
        }

        let facets: Vec<DiscoveredFacet> = ctx
            .facets
            .iter()
            .map(|f| DiscoveredFacet {
                doc_id: ctx.identity.doc_id.clone(),
                facet: f.clone(),
            })
            .collect();

        let upload = tokio::select! {
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            result = self.vector_store.index_chunks(&ctx.identity, &chunks, &facets) => result,
        };
        upload.map_err(|e| PipelineError::StageFailed {
            stage: "upload-content",
            path: ctx.relative_path.clone(),
            reason: e.to_string(),
        })?;

        ctx.chunks_uploaded = chunks.len();
        Ok(())
    }
}
