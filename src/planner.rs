//! Ingestion planning: a pure diff of discovered files against the local
//! index. No IO happens here; the plan is data the orchestrator executes.

use crate::discovery::DiscoveredFile;
use crate::local_index::{LocalIndexStore, ReindexMode};
use std::collections::HashSet;

/// What to do with one file this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanAction {
    /// Never indexed before
    New,
    /// Content hash differs from the last indexed hash, or reprocessing
    /// was forced by a reindex override
    Changed,
    /// Hash matches and no override is set; skip
    Unchanged,
    /// Present in the index but absent on disk; remove from downstream stores
    Deleted,
}

#[derive(Debug, Clone)]
pub struct PlanEntry {
    pub relative_path: String,
    /// Existing doc id for known files; empty for new files, assigned later
    pub doc_id: String,
    pub action: PlanAction,
    /// Hash of the current on-disk content; empty for deletions
    pub hash: String,
    /// True when the action was forced by a reindex override rather than
    /// a hash difference
    pub forced: bool,
}

#[derive(Debug, Clone, Default)]
pub struct IngestionPlan {
    pub entries: Vec<PlanEntry>,
}

impl IngestionPlan {
    pub fn count(&self, action: PlanAction) -> usize {
        self.entries.iter().filter(|e| e.action == action).count()
    }

    /// Entries that require pipeline work, in discovery order.
    pub fn workload(&self) -> impl Iterator<Item = &PlanEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.action, PlanAction::New | PlanAction::Changed))
    }

    pub fn deletions(&self) -> impl Iterator<Item = &PlanEntry> {
        self.entries
            .iter()
            .filter(|e| e.action == PlanAction::Deleted)
    }
}

/// Diff discovered files against the store.
///
/// Precedence per file: a full reindex (global flag or per-record override)
/// beats a matching hash; otherwise the hash decides. Files in the store
/// but not on disk become deletions, sorted by path.
pub fn build_plan(
    discovered: &[DiscoveredFile],
    store: &LocalIndexStore,
    global_reindex: bool,
) -> IngestionPlan {
    let mut entries = Vec::with_capacity(discovered.len());
    let mut seen: HashSet<String> = HashSet::with_capacity(discovered.len());

    for file in discovered {
        seen.insert(file.relative_path.clone());

        let Some(record) = store.get(&file.relative_path) else {
            entries.push(PlanEntry {
                relative_path: file.relative_path.clone(),
                doc_id: String::new(),
                action: PlanAction::New,
                hash: file.hash.clone(),
                forced: false,
            });
            continue;
        };

        // A record can exist without a completed index (e.g. a prior
        // failed run recorded the active hash only)
        if !record.has_indexed_before() {
            entries.push(PlanEntry {
                relative_path: file.relative_path.clone(),
                doc_id: record.doc_id.clone(),
                action: PlanAction::New,
                hash: file.hash.clone(),
                forced: false,
            });
            continue;
        }

        let forced = global_reindex
            || matches!(record.reindex, Some(ReindexMode::Full) | Some(ReindexMode::Chunk));
        let hash_changed = !record.content_hash.eq_ignore_ascii_case(&file.hash);

        let action = if forced || hash_changed {
            PlanAction::Changed
        } else {
            PlanAction::Unchanged
        };

        entries.push(PlanEntry {
            relative_path: file.relative_path.clone(),
            doc_id: record.doc_id.clone(),
            action,
            hash: file.hash.clone(),
            forced: forced && !hash_changed,
        });
    }

    for (path, record) in store.missing_from(&seen) {
        entries.push(PlanEntry {
            relative_path: path.clone(),
            doc_id: record.doc_id.clone(),
            action: PlanAction::Deleted,
            hash: String::new(),
            forced: false,
        });
    }

    IngestionPlan { entries }
}
