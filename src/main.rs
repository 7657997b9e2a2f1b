use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use rag_indexer::config::Config;
use rag_indexer::describe::default_builders;
use rag_indexer::discovery::FileWalker;
use rag_indexer::identity::compute_file_hash;
use rag_indexer::local_index::LocalIndexStore;
use rag_indexer::orchestrator::Orchestrator;
use rag_indexer::pipeline::IndexingPipeline;
use rag_indexer::planner::{PlanAction, build_plan};
use rag_indexer::quality::{QualityScorer, ScoreGate, ScoringOptions};
use rag_indexer::services::MetadataRegistry;
use rag_indexer::services::http::{
    HttpEmbeddingClient, HttpLlmReviewClient, HttpMetadataRegistry, HttpVectorStore,
};
use rag_indexer::symbols::default_splitters;

#[derive(Parser, Debug)]
#[command(name = "rag-indexer")]
#[command(about = "Incremental source-code indexing engine for retrieval")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Path to the configuration file
    #[arg(
        long,
        short = 'c',
        env = "RAG_INDEXER_CONFIG",
        default_value = "rag-indexer.toml",
        global = true
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Index all configured repositories
    Index {
        /// Force re-processing of every known file
        #[arg(long)]
        reindex: bool,
    },

    /// Show what an index run would do, without touching any service
    Plan,

    /// Print the normalized content hash of a file
    Hash {
        /// File to hash; a missing file prints an empty hash
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Run failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Index { reindex } => {
            let mut config = Config::from_file(&cli.config)
                .with_context(|| format!("Loading {}", cli.config.display()))?;
            if reindex {
                config.indexing.reindex = true;
            }
            index(config).await
        }
        Command::Plan => {
            let config = Config::from_file(&cli.config)
                .with_context(|| format!("Loading {}", cli.config.display()))?;
            plan(config).await
        }
        Command::Hash { path } => {
            let hash = compute_file_hash(&path).await?;
            println!("{hash}");
            Ok(())
        }
    }
}

async fn index(config: Config) -> Result<()> {
    let api_key = config.api_key();

    let embedding = Arc::new(HttpEmbeddingClient::new(
        &config.services.embedding_endpoint,
        &config.services.embedding_model,
        api_key.clone(),
    )?);
    let vector_store = Arc::new(HttpVectorStore::new(
        &config.services.vector_store_url,
        api_key.clone(),
    )?);
    let metadata_registry: Option<Arc<dyn MetadataRegistry>> =
        match &config.services.metadata_registry_url {
            Some(url) => Some(Arc::new(HttpMetadataRegistry::new(url, api_key.clone())?)),
            None => None,
        };

    let mut pipeline = IndexingPipeline::new(
        default_splitters(),
        default_builders(),
        QualityScorer::new(ScoringOptions::default()),
        ScoreGate::new(config.quality.min_publish_score),
        embedding,
        vector_store.clone(),
    );
    if let Some(url) = &config.services.llm_review_url {
        pipeline = pipeline.with_reviewer(Arc::new(HttpLlmReviewClient::new(url, api_key)?));
    }
    let pipeline = Arc::new(pipeline);

    let orchestrator = Orchestrator::new(config, pipeline, vector_store, metadata_registry);

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, finishing the in-flight file");
            signal_cancel.cancel();
        }
    });

    let summary = orchestrator.run(&cancel).await?;
    tracing::info!(
        indexed = summary.total_indexed(),
        failed = summary.total_failed(),
        cancelled = summary.was_cancelled(),
        duration_ms = summary.duration.as_millis() as u64,
        "Run finished"
    );

    if summary.total_failed() > 0 {
        anyhow::bail!("{} file(s) failed to index", summary.total_failed());
    }
    Ok(())
}

/// Dry run: discover, diff against the snapshot, print the plan.
async fn plan(config: Config) -> Result<()> {
    for repo in &config.repos {
        let walker = FileWalker::new(&repo.source_root, config.indexing.max_file_size)
            .with_patterns(
                config.indexing.include_patterns.clone(),
                config.indexing.exclude_patterns.clone(),
            );
        let files = tokio::task::spawn_blocking(move || walker.walk())
            .await
            .context("Discovery task panicked")??;

        let store = LocalIndexStore::load(&config.indexing.index_dir, &repo.repo_id)?;
        let plan = build_plan(&files, &store, config.indexing.reindex);

        println!(
            "{}: {} new, {} changed, {} unchanged, {} deleted",
            repo.repo_id,
            plan.count(PlanAction::New),
            plan.count(PlanAction::Changed),
            plan.count(PlanAction::Unchanged),
            plan.count(PlanAction::Deleted),
        );
        for entry in &plan.entries {
            if entry.action == PlanAction::Unchanged {
                continue;
            }
            let marker = match entry.action {
                PlanAction::New => "+",
                PlanAction::Changed => "~",
                PlanAction::Deleted => "-",
                PlanAction::Unchanged => unreachable!(),
            };
            let forced = if entry.forced { " (forced)" } else { "" };
            println!("  {marker} {}{forced}", entry.relative_path);
        }
    }
    Ok(())
}
