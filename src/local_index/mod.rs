//! Durable per-repository record of what has been indexed.
//!
//! One snapshot file per repository, keyed by the repository's safe id.
//! The store is loaded whole, mutated in memory during a run, and upserted
//! back to disk after each successfully indexed file so a crash never loses
//! more than the file in flight.

use crate::error::StoreError;
use crate::facets::{merge_facets, FacetValue};
use crate::paths::{normalize_relative_path, safe_repo_id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Manual re-processing override persisted on a record. It survives across
/// runs until cleared by a successful index of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReindexMode {
    /// Re-chunk and re-embed, keeping prior descriptions where possible
    Chunk,
    /// Full re-processing from scratch
    Full,
}

/// Per-file indexing state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalIndexRecord {
    /// Stable document id for every chunk originating from this file
    pub doc_id: String,
    /// Hash of the content last successfully indexed
    #[serde(default)]
    pub content_hash: String,
    /// Hash of the content currently on disk
    #[serde(default)]
    pub active_content_hash: String,
    /// Classification label assigned during the last index
    #[serde(default)]
    pub sub_kind: Option<String>,
    #[serde(default)]
    pub last_indexed_utc: Option<DateTime<Utc>>,
    #[serde(default)]
    pub flag_for_review: bool,
    /// Manual override: absent | chunk | full
    #[serde(default)]
    pub reindex: Option<ReindexMode>,
    /// Facet snapshot from the last successful index. Persisted so a failed
    /// run can rebuild the registry report without reprocessing files.
    #[serde(default)]
    pub facets: Vec<FacetValue>,
}

impl LocalIndexRecord {
    fn new(doc_id: String) -> Self {
        Self {
            doc_id,
            content_hash: String::new(),
            active_content_hash: String::new(),
            sub_kind: None,
            last_indexed_utc: None,
            flag_for_review: false,
            reindex: None,
            facets: Vec::new(),
        }
    }

    /// True when the on-disk content differs from the last indexed content.
    /// Both hashes must be non-empty.
    pub fn is_active(&self) -> bool {
        !self.content_hash.is_empty()
            && !self.active_content_hash.is_empty()
            && !self
                .content_hash
                .eq_ignore_ascii_case(&self.active_content_hash)
    }

    /// True if the file has been indexed at least once.
    pub fn has_indexed_before(&self) -> bool {
        !self.content_hash.is_empty()
    }
}

/// Serialized snapshot layout.
#[derive(Debug, Serialize, Deserialize)]
struct StoreSnapshot {
    repo_id: String,
    #[serde(default)]
    project_root: String,
    #[serde(default)]
    records: HashMap<String, LocalIndexRecord>,
}

/// In-memory local index for one repository.
///
/// At most one record per normalized relative path; lookups are
/// case-insensitive via path normalization.
#[derive(Debug, Clone, Default)]
pub struct LocalIndexStore {
    pub repo_id: String,
    pub project_root: String,
    records: HashMap<String, LocalIndexRecord>,
}

impl LocalIndexStore {
    pub fn new(repo_id: impl Into<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
            project_root: String::new(),
            records: HashMap::new(),
        }
    }

    /// Load the snapshot for a repository from `index_dir`.
    ///
    /// A missing snapshot is not an error: it yields an empty store carrying
    /// the requested repo id. A corrupt snapshot is renamed with a
    /// `.corrupt-<timestamp>` suffix (best effort) and treated as missing;
    /// content hashes make re-indexing safe.
    pub fn load(index_dir: &Path, repo_id: &str) -> Result<Self, StoreError> {
        if repo_id.trim().is_empty() {
            return Err(StoreError::EmptyRepoId);
        }

        let path = Self::snapshot_path(index_dir, repo_id);
        if !path.exists() {
            tracing::debug!(repo_id, "No index snapshot found, starting empty");
            return Ok(Self::new(repo_id));
        }

        let content = fs::read_to_string(&path).map_err(|e| StoreError::LoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        match serde_json::from_str::<StoreSnapshot>(&content) {
            Ok(snapshot) => {
                let mut records = HashMap::new();
                for (raw_path, record) in snapshot.records {
                    let key = normalize_relative_path(&raw_path);
                    if key.is_empty() {
                        continue;
                    }
                    records.entry(key).or_insert(record);
                }

                tracing::info!(repo_id, count = records.len(), "Loaded index snapshot");
                Ok(Self {
                    repo_id: repo_id.to_string(),
                    project_root: snapshot.project_root,
                    records,
                })
            }
            Err(e) => {
                tracing::warn!(repo_id, error = %e, "Index snapshot is corrupt, starting empty");
                quarantine_corrupt_snapshot(&path);
                Ok(Self::new(repo_id))
            }
        }
    }

    /// Persist the store to `index_dir`, creating the directory as needed.
    ///
    /// The store's repo id is always stamped to the requested id before
    /// persisting, overriding any mismatch. Written atomically via a temp
    /// file so a crash mid-write cannot corrupt the previous snapshot.
    pub fn save(&mut self, index_dir: &Path, repo_id: &str) -> Result<(), StoreError> {
        if repo_id.trim().is_empty() {
            return Err(StoreError::EmptyRepoId);
        }
        self.repo_id = repo_id.to_string();

        let path = Self::snapshot_path(index_dir, repo_id);
        let save_failed = |e: &dyn std::fmt::Display| StoreError::SaveFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        fs::create_dir_all(index_dir).map_err(|e| save_failed(&e))?;

        let snapshot = StoreSnapshot {
            repo_id: self.repo_id.clone(),
            project_root: self.project_root.clone(),
            records: self.records.clone(),
        };

        let content = serde_json::to_string_pretty(&snapshot).map_err(|e| save_failed(&e))?;

        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, content).map_err(|e| save_failed(&e))?;
        fs::rename(&temp_path, &path).map_err(|e| save_failed(&e))?;

        tracing::debug!(repo_id, count = self.records.len(), "Saved index snapshot");
        Ok(())
    }

    /// Snapshot file location for a repository id.
    pub fn snapshot_path(index_dir: &Path, repo_id: &str) -> PathBuf {
        index_dir.join(format!("{}.json", safe_repo_id(repo_id)))
    }

    /// All records, unordered.
    pub fn get_all(&self) -> impl Iterator<Item = (&String, &LocalIndexRecord)> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by relative path (case-insensitive).
    pub fn get(&self, relative_path: &str) -> Option<&LocalIndexRecord> {
        self.records.get(&normalize_relative_path(relative_path))
    }

    /// Get an existing record or create a new one with the given doc id.
    /// An existing record is returned unchanged.
    pub fn get_or_add(&mut self, relative_path: &str, doc_id: &str) -> &mut LocalIndexRecord {
        let key = normalize_relative_path(relative_path);
        self.records
            .entry(key)
            .or_insert_with(|| LocalIndexRecord::new(doc_id.to_string()))
    }

    /// Remove a record by relative path. Returns the removed record if any.
    pub fn remove(&mut self, relative_path: &str) -> Option<LocalIndexRecord> {
        self.records.remove(&normalize_relative_path(relative_path))
    }

    /// Record the hash of the current on-disk content for a path.
    pub fn update_active_hash(&mut self, relative_path: &str, doc_id: &str, hash: &str) {
        let record = self.get_or_add(relative_path, doc_id);
        record.active_content_hash = hash.to_string();
    }

    /// Mark a file as successfully indexed: both hashes become the uploaded
    /// content hash, the timestamp is stamped, facets are merged in, the
    /// sub-kind is filled only if previously unset, and any reindex
    /// override is cleared.
    pub fn mark_indexed(
        &mut self,
        relative_path: &str,
        doc_id: &str,
        content_hash: &str,
        sub_kind: Option<&str>,
        facets: &[FacetValue],
    ) {
        let record = self.get_or_add(relative_path, doc_id);
        record.doc_id = doc_id.to_string();
        record.content_hash = content_hash.to_string();
        record.active_content_hash = content_hash.to_string();
        record.last_indexed_utc = Some(Utc::now());

        if record.sub_kind.is_none() {
            if let Some(kind) = sub_kind {
                if !kind.trim().is_empty() {
                    record.sub_kind = Some(kind.to_string());
                }
            }
        }

        if !facets.is_empty() {
            record.facets = merge_facets(&record.facets, facets);
        }

        record.reindex = None;
    }

    /// Set or clear the manual reindex override for a path.
    pub fn set_reindex(&mut self, relative_path: &str, doc_id: &str, mode: Option<ReindexMode>) {
        let record = self.get_or_add(relative_path, doc_id);
        record.reindex = mode;
    }

    /// Records whose path is absent from the given set of discovered paths.
    /// Returned sorted by path for deterministic deletion order.
    pub fn missing_from<'a>(
        &'a self,
        discovered: &std::collections::HashSet<String>,
    ) -> Vec<(&'a String, &'a LocalIndexRecord)> {
        let mut missing: Vec<_> = self
            .records
            .iter()
            .filter(|(path, _)| !discovered.contains(*path))
            .collect();
        missing.sort_by(|a, b| a.0.cmp(b.0));
        missing
    }
}

fn quarantine_corrupt_snapshot(path: &Path) {
    let stamp = Utc::now().format("%Y%m%d%H%M%S");
    let corrupt_path = path.with_extension(format!("corrupt-{}", stamp));
    if let Err(e) = fs::rename(path, &corrupt_path) {
        tracing::warn!(?path, error = %e, "Failed to quarantine corrupt snapshot");
    }
}
