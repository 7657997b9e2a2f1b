use super::*;
use crate::config::{IdentityConfig, IndexingConfig, QualityConfig, ServicesConfig};
use crate::describe::default_builders;
use crate::error::{EmbeddingError, VectorStoreError};
use crate::facets::DiscoveredFacet;
use crate::quality::{QualityScorer, ScoreGate, ScoringOptions};
use crate::services::EmbeddingProvider;
use crate::symbols::default_splitters;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use tempfile::TempDir;

struct FixedEmbedding;

#[async_trait]
impl EmbeddingProvider for FixedEmbedding {
    async fn get_embedding(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(vec![0.5, 0.5])
    }
}

#[derive(Default)]
struct RecordingStore {
    uploads: Mutex<Vec<String>>,
    deletes: Mutex<Vec<String>>,
}

#[async_trait]
impl crate::services::VectorStore for RecordingStore {
    async fn index_chunks(
        &self,
        identity: &DocumentIdentity,
        _chunks: &[crate::chunk::NormalizedChunk],
        _facets: &[DiscoveredFacet],
    ) -> Result<(), VectorStoreError> {
        self.uploads.lock().unwrap().push(identity.doc_id.clone());
        Ok(())
    }

    async fn delete_document(&self, identity: &DocumentIdentity) -> Result<(), VectorStoreError> {
        self.deletes.lock().unwrap().push(identity.doc_id.clone());
        Ok(())
    }
}

#[derive(Default)]
struct RecordingRegistry {
    reports: AtomicUsize,
    facet_count: AtomicUsize,
}

#[async_trait]
impl MetadataRegistry for RecordingRegistry {
    async fn report_facets(
        &self,
        _org_id: &str,
        _project_id: Option<&str>,
        _repo_id: &str,
        facets: &[DiscoveredFacet],
    ) -> anyhow::Result<()> {
        self.reports.fetch_add(1, Ordering::SeqCst);
        self.facet_count.store(facets.len(), Ordering::SeqCst);
        Ok(())
    }
}

fn write_file(root: &Path, name: &str, content: &str) {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

fn test_config(source_root: &Path, index_dir: &Path) -> Config {
    Config {
        identity: IdentityConfig {
            org_id: "acme".to_string(),
            project_id: None,
        },
        repos: vec![RepoConfig {
            repo_id: "core".to_string(),
            source_root: source_root.to_path_buf(),
        }],
        indexing: IndexingConfig {
            index_dir: index_dir.to_path_buf(),
            ..Default::default()
        },
        quality: QualityConfig::default(),
        services: ServicesConfig::default(),
    }
}

fn orchestrator_with(
    config: Config,
    vector_store: Arc<RecordingStore>,
    registry: Option<Arc<RecordingRegistry>>,
) -> Orchestrator {
    let pipeline = Arc::new(IndexingPipeline::new(
        default_splitters(),
        default_builders(),
        QualityScorer::new(ScoringOptions::default()),
        ScoreGate::new(0.0),
        Arc::new(FixedEmbedding),
        vector_store.clone(),
    ));
    Orchestrator::new(
        config,
        pipeline,
        vector_store,
        registry.map(|r| r as Arc<dyn MetadataRegistry>),
    )
}

const MANAGER_SOURCE: &str = "public class DeviceManager\n\
                              {\n\
                                  public Task<Device> GetDeviceAsync(string id) { }\n\
                              }\n";

#[tokio::test]
async fn first_run_indexes_everything_and_persists_the_snapshot() {
    let source = TempDir::new().unwrap();
    let index = TempDir::new().unwrap();
    write_file(source.path(), "managers/DeviceManager.cs", MANAGER_SOURCE);

    let store = Arc::new(RecordingStore::default());
    let orchestrator = orchestrator_with(test_config(source.path(), index.path()), store.clone(), None);

    let summary = orchestrator.run(&CancellationToken::new()).await.unwrap();
    assert_eq!(summary.total_indexed(), 1);
    assert_eq!(summary.total_failed(), 0);
    assert_eq!(store.uploads.lock().unwrap().len(), 1);

    let snapshot = LocalIndexStore::load(index.path(), "core").unwrap();
    let record = snapshot.get("managers/devicemanager.cs").unwrap();
    assert!(record.is_active());
    assert_eq!(record.sub_kind.as_deref(), Some("manager"));
}

#[tokio::test]
async fn second_run_over_unchanged_files_uploads_nothing() {
    let source = TempDir::new().unwrap();
    let index = TempDir::new().unwrap();
    write_file(source.path(), "managers/DeviceManager.cs", MANAGER_SOURCE);

    let store = Arc::new(RecordingStore::default());
    let config = test_config(source.path(), index.path());

    orchestrator_with(config.clone(), store.clone(), None)
        .run(&CancellationToken::new())
        .await
        .unwrap();
    let summary = orchestrator_with(config, store.clone(), None)
        .run(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.total_indexed(), 0);
    assert_eq!(summary.repos[0].unchanged, 1);
    assert_eq!(store.uploads.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn removed_files_are_deleted_from_the_vector_store() {
    let source = TempDir::new().unwrap();
    let index = TempDir::new().unwrap();
    write_file(source.path(), "a.cs", MANAGER_SOURCE);
    write_file(source.path(), "b.cs", "public class OrderManager { }\n");

    let store = Arc::new(RecordingStore::default());
    let config = test_config(source.path(), index.path());

    orchestrator_with(config.clone(), store.clone(), None)
        .run(&CancellationToken::new())
        .await
        .unwrap();

    std::fs::remove_file(source.path().join("b.cs")).unwrap();
    let summary = orchestrator_with(config, store.clone(), None)
        .run(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.repos[0].deleted, 1);
    assert_eq!(store.deletes.lock().unwrap().len(), 1);

    let snapshot = LocalIndexStore::load(index.path(), "core").unwrap();
    assert!(snapshot.get("b.cs").is_none());
    assert!(snapshot.get("a.cs").is_some());
}

#[tokio::test]
async fn cancelled_token_stops_before_any_upload() {
    let source = TempDir::new().unwrap();
    let index = TempDir::new().unwrap();
    write_file(source.path(), "a.cs", MANAGER_SOURCE);

    let store = Arc::new(RecordingStore::default());
    let orchestrator = orchestrator_with(test_config(source.path(), index.path()), store.clone(), None);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let summary = orchestrator.run(&cancel).await.unwrap();

    assert_eq!(summary.total_indexed(), 0);
    assert!(store.uploads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn facets_are_reported_once_per_repository() {
    let source = TempDir::new().unwrap();
    let index = TempDir::new().unwrap();
    write_file(source.path(), "managers/DeviceManager.cs", MANAGER_SOURCE);

    let store = Arc::new(RecordingStore::default());
    let registry = Arc::new(RecordingRegistry::default());
    let orchestrator = orchestrator_with(
        test_config(source.path(), index.path()),
        store,
        Some(registry.clone()),
    );

    let summary = orchestrator.run(&CancellationToken::new()).await.unwrap();
    assert_eq!(registry.reports.load(Ordering::SeqCst), 1);
    assert!(registry.facet_count.load(Ordering::SeqCst) >= 1);
    assert_eq!(
        summary.repos[0].facets_reported,
        registry.facet_count.load(Ordering::SeqCst)
    );
}
