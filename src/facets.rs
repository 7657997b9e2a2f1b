//! Facet values and run-scoped accumulation.
//!
//! A facet is a typed, discrete metadata value discovered about a document
//! (e.g. `Kind=SourceCode`). The accumulator collects facets for one
//! indexing run and is flushed to the metadata registry in a single report
//! at run end.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single facet entry: property name plus concrete value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetValue {
    /// Name of the metadata property, e.g. "Kind", "SubKind", "Repo"
    pub facet_type: String,
    /// Concrete value of the property, e.g. "SourceCode", "Manager"
    pub value: String,
}

impl FacetValue {
    pub fn new(facet_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            facet_type: facet_type.into(),
            value: value.into(),
        }
    }
}

/// A facet associated with the document it was discovered on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredFacet {
    /// DocId of the owning document
    pub doc_id: String,
    pub facet: FacetValue,
}

/// Collects facets for one indexing run, de-duplicated on
/// (type, value, owning document) regardless of insertion order or whether
/// entries arrive one at a time or in batches.
#[derive(Debug, Default)]
pub struct FacetAccumulator {
    entries: Vec<DiscoveredFacet>,
    seen: HashSet<String>,
}

impl FacetAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single facet for a document. Duplicates are silently ignored.
    pub fn add_facet(&mut self, doc_id: &str, facet: FacetValue) {
        if facet.facet_type.trim().is_empty() || facet.value.trim().is_empty() {
            return;
        }

        let key = dedup_key(doc_id, &facet);
        if self.seen.insert(key) {
            self.entries.push(DiscoveredFacet {
                doc_id: doc_id.to_string(),
                facet,
            });
        }
    }

    /// Add a batch of facets for the same document.
    pub fn add_facets(&mut self, doc_id: &str, facets: impl IntoIterator<Item = FacetValue>) {
        for facet in facets {
            self.add_facet(doc_id, facet);
        }
    }

    /// All accumulated facets in insertion order.
    pub fn get_all(&self) -> &[DiscoveredFacet] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reset the accumulator for a new run.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.seen.clear();
    }
}

fn dedup_key(doc_id: &str, facet: &FacetValue) -> String {
    format!(
        "{}|{}|{}",
        doc_id.trim().to_lowercase(),
        facet.facet_type.trim().to_lowercase(),
        facet.value.trim().to_lowercase()
    )
}

/// Merge two facet lists for one record, de-duplicated on (type, value).
/// Used by the local index when refreshing a record's facet snapshot.
pub fn merge_facets(existing: &[FacetValue], incoming: &[FacetValue]) -> Vec<FacetValue> {
    let mut result = Vec::new();
    let mut seen = HashSet::new();

    for facet in existing.iter().chain(incoming.iter()) {
        if facet.facet_type.trim().is_empty() || facet.value.trim().is_empty() {
            continue;
        }
        let key = format!(
            "{}|{}",
            facet.facet_type.trim().to_lowercase(),
            facet.value.trim().to_lowercase()
        );
        if seen.insert(key) {
            result.push(facet.clone());
        }
    }

    result
}
