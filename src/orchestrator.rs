//! Per-repository run coordination.
//!
//! For each configured repository the orchestrator discovers files, diffs
//! them against the local index snapshot, runs the pipeline over the
//! workload, replays deletions against the vector store, and reports the
//! deduplicated facet set once at the end of the run. The snapshot is
//! saved after every completed file so an interrupted run resumes where
//! it stopped instead of re-uploading finished work.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use crate::catalog::DomainModelCatalog;
use crate::config::{Config, RepoConfig};
use crate::discovery::{DiscoveredFile, FileWalker};
use crate::error::{DiscoveryError, PipelineError};
use crate::facets::FacetAccumulator;
use crate::identity::DocumentIdentity;
use crate::local_index::LocalIndexStore;
use crate::pipeline::{IndexFileContext, IndexingPipeline};
use crate::planner::{PlanAction, build_plan};
use crate::services::{MetadataRegistry, VectorStore};
use crate::symbols::DeclarationSplitter;

/// Counters for one repository run.
#[derive(Debug, Default, Clone)]
pub struct RepoRunSummary {
    pub repo_id: String,
    pub discovered: usize,
    pub indexed: usize,
    pub unchanged: usize,
    pub deleted: usize,
    pub failed: usize,
    pub chunks_uploaded: usize,
    pub descriptions_rejected: usize,
    pub facets_reported: usize,
    pub cancelled: bool,
}

/// Counters for a full run across all configured repositories.
#[derive(Debug, Default, Clone)]
pub struct RunSummary {
    pub repos: Vec<RepoRunSummary>,
    pub duration: std::time::Duration,
}

impl RunSummary {
    pub fn total_indexed(&self) -> usize {
        self.repos.iter().map(|r| r.indexed).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.repos.iter().map(|r| r.failed).sum()
    }

    pub fn was_cancelled(&self) -> bool {
        self.repos.iter().any(|r| r.cancelled)
    }
}

pub struct Orchestrator {
    config: Config,
    pipeline: Arc<IndexingPipeline>,
    vector_store: Arc<dyn VectorStore>,
    metadata_registry: Option<Arc<dyn MetadataRegistry>>,
}

impl Orchestrator {
    pub fn new(
        config: Config,
        pipeline: Arc<IndexingPipeline>,
        vector_store: Arc<dyn VectorStore>,
        metadata_registry: Option<Arc<dyn MetadataRegistry>>,
    ) -> Self {
        Self {
            config,
            pipeline,
            vector_store,
            metadata_registry,
        }
    }

    /// Run every configured repository in order. A cancellation stops the
    /// current repository after its in-flight file and skips the rest.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<RunSummary> {
        let started = std::time::Instant::now();
        let mut summary = RunSummary::default();

        for repo in &self.config.repos {
            if cancel.is_cancelled() {
                tracing::info!(repo_id = %repo.repo_id, "Run cancelled, skipping repository");
                break;
            }

            let repo_summary = self
                .run_repo(repo, cancel)
                .await
                .with_context(|| format!("Indexing repository '{}' failed", repo.repo_id))?;

            tracing::info!(
                repo_id = %repo.repo_id,
                discovered = repo_summary.discovered,
                indexed = repo_summary.indexed,
                unchanged = repo_summary.unchanged,
                deleted = repo_summary.deleted,
                failed = repo_summary.failed,
                chunks = repo_summary.chunks_uploaded,
                "Repository run complete"
            );
            let cancelled = repo_summary.cancelled;
            summary.repos.push(repo_summary);
            if cancelled {
                break;
            }
        }

        summary.duration = started.elapsed();
        Ok(summary)
    }

    async fn run_repo(
        &self,
        repo: &RepoConfig,
        cancel: &CancellationToken,
    ) -> Result<RepoRunSummary> {
        let mut summary = RepoRunSummary {
            repo_id: repo.repo_id.clone(),
            ..Default::default()
        };

        let files = match self.discover(repo, cancel).await {
            Ok(files) => files,
            Err(e)
                if e.downcast_ref::<DiscoveryError>()
                    .is_some_and(|d| matches!(d, DiscoveryError::Cancelled)) =>
            {
                summary.cancelled = true;
                return Ok(summary);
            }
            Err(e) => return Err(e),
        };
        summary.discovered = files.len();

        let index_dir = self.config.indexing.index_dir.clone();
        let mut store = LocalIndexStore::load(&index_dir, &repo.repo_id)?;
        let plan = build_plan(&files, &store, self.config.indexing.reindex);
        summary.unchanged = plan.count(PlanAction::Unchanged);

        tracing::info!(
            repo_id = %repo.repo_id,
            new = plan.count(PlanAction::New),
            changed = plan.count(PlanAction::Changed),
            unchanged = summary.unchanged,
            deleted = plan.count(PlanAction::Deleted),
            "Ingestion plan ready"
        );

        // The catalog is built from the full discovery set, not just the
        // workload, so descriptions can reference unchanged sibling models.
        let catalog = DomainModelCatalog::build(&files, &DeclarationSplitter);

        let by_path: HashMap<&str, &DiscoveredFile> = files
            .iter()
            .map(|f| (f.relative_path.as_str(), f))
            .collect();

        let mut facets = FacetAccumulator::new();

        for entry in plan.workload() {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let Some(file) = by_path.get(entry.relative_path.as_str()) else {
                // Plan entries for New/Changed always come from discovery.
                continue;
            };

            let mut identity = DocumentIdentity::for_file(
                &self.config.identity.org_id,
                self.config.identity.project_id.as_deref(),
                &repo.repo_id,
                &entry.relative_path,
            );
            if !entry.doc_id.is_empty() {
                identity.doc_id = entry.doc_id.clone();
            }
            let doc_id = identity.doc_id.clone();

            // Record what is about to go out before the pipeline runs, so a
            // crash mid-file is visible as active != indexed on resume.
            store.update_active_hash(&entry.relative_path, &doc_id, &entry.hash);
            store.save(&index_dir, &repo.repo_id)?;

            let ctx = IndexFileContext::new(
                identity,
                entry.relative_path.clone(),
                file.content.clone(),
                entry.hash.clone(),
            );

            match self.pipeline.run(ctx, &catalog, cancel).await {
                Ok(outcome) => {
                    store.mark_indexed(
                        &entry.relative_path,
                        &outcome.doc_id,
                        &entry.hash,
                        outcome.sub_kind.map(|k| k.key()),
                        &outcome.facets,
                    );
                    store.save(&index_dir, &repo.repo_id)?;
                    facets.add_facets(&outcome.doc_id, outcome.facets);
                    summary.indexed += 1;
                    summary.chunks_uploaded += outcome.chunks_uploaded;
                    summary.descriptions_rejected += outcome.descriptions_rejected;
                }
                Err(PipelineError::Cancelled) => {
                    summary.cancelled = true;
                    break;
                }
                Err(e) => {
                    // The record keeps its mismatched active hash, so the
                    // next run re-plans this file.
                    tracing::warn!(
                        repo_id = %repo.repo_id,
                        path = %entry.relative_path,
                        error = %e,
                        "File failed, continuing with remaining files"
                    );
                    summary.failed += 1;
                }
            }
        }

        if !summary.cancelled {
            for entry in plan.deletions() {
                if cancel.is_cancelled() {
                    summary.cancelled = true;
                    break;
                }

                let mut identity = DocumentIdentity::for_file(
                    &self.config.identity.org_id,
                    self.config.identity.project_id.as_deref(),
                    &repo.repo_id,
                    &entry.relative_path,
                );
                if !entry.doc_id.is_empty() {
                    identity.doc_id = entry.doc_id.clone();
                }

                match self.vector_store.delete_document(&identity).await {
                    Ok(()) => {
                        store.remove(&entry.relative_path);
                        store.save(&index_dir, &repo.repo_id)?;
                        summary.deleted += 1;
                    }
                    Err(e) => {
                        tracing::warn!(
                            repo_id = %repo.repo_id,
                            path = %entry.relative_path,
                            error = %e,
                            "Deletion failed, record kept for the next run"
                        );
                        summary.failed += 1;
                    }
                }
            }
        }

        if let Some(registry) = &self.metadata_registry
            && !facets.is_empty()
        {
            match registry
                .report_facets(
                    &self.config.identity.org_id,
                    self.config.identity.project_id.as_deref(),
                    &repo.repo_id,
                    facets.get_all(),
                )
                .await
            {
                Ok(()) => summary.facets_reported = facets.len(),
                Err(e) => {
                    // Facets are rediscovered on the next run; not fatal.
                    tracing::warn!(repo_id = %repo.repo_id, error = %e, "Facet report failed");
                }
            }
        }

        store.save(&index_dir, &repo.repo_id)?;
        Ok(summary)
    }

    /// Discovery is blocking (rayon under the hood), so it runs on the
    /// blocking pool with the token bridged to the walker's atomic flag.
    async fn discover(
        &self,
        repo: &RepoConfig,
        cancel: &CancellationToken,
    ) -> Result<Vec<DiscoveredFile>> {
        let flag = Arc::new(AtomicBool::new(false));
        let bridge = {
            let flag = Arc::clone(&flag);
            let token = cancel.clone();
            tokio::spawn(async move {
                token.cancelled().await;
                flag.store(true, Ordering::Relaxed);
            })
        };

        let walker = FileWalker::new(&repo.source_root, self.config.indexing.max_file_size)
            .with_patterns(
                self.config.indexing.include_patterns.clone(),
                self.config.indexing.exclude_patterns.clone(),
            )
            .with_cancellation_flag(flag);

        let result = tokio::task::spawn_blocking(move || walker.walk())
            .await
            .context("Discovery task panicked")?;
        bridge.abort();

        Ok(result?)
    }
}

#[cfg(test)]
mod tests;
