//! Run-scoped domain model catalog.
//!
//! Built once from the full discovered file set before any per-file
//! processing starts, then shared read-only with every description builder.
//! It lets a builder say which domain a model belongs to and which sibling
//! models live alongside it.

use crate::classify::{classify_symbol, SubKind};
use crate::discovery::DiscoveredFile;
use crate::symbols::SymbolSplitter;
use std::collections::BTreeMap;

/// One model class known to the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelClassEntry {
    pub class_name: String,
    pub domain_key: String,
    pub relative_path: String,
}

/// A domain and the model classes grouped under it.
#[derive(Debug, Clone, Default)]
pub struct DomainEntry {
    pub key: String,
    pub name: String,
    pub tagline: String,
    pub models: Vec<ModelClassEntry>,
}

/// Immutable snapshot mapping domain key to its entry.
#[derive(Debug, Clone, Default)]
pub struct DomainModelCatalog {
    domains: BTreeMap<String, DomainEntry>,
}

impl DomainModelCatalog {
    /// Build the catalog by splitting and classifying every discovered file.
    /// Model symbols are grouped by a domain key derived from the path; the
    /// first occurrence of a domain names it.
    pub fn build(files: &[DiscoveredFile], splitter: &dyn SymbolSplitter) -> Self {
        let mut domains: BTreeMap<String, DomainEntry> = BTreeMap::new();

        for file in files {
            for symbol in splitter.split(&file.content) {
                let classification = classify_symbol(&symbol, &file.relative_path);
                if classification.sub_kind != SubKind::Model {
                    continue;
                }

                let key = domain_key_for_path(&file.relative_path);
                let entry = domains.entry(key.clone()).or_insert_with(|| DomainEntry {
                    key: key.clone(),
                    name: title_case(&key),
                    tagline: format!("{} domain", title_case(&key)),
                    models: Vec::new(),
                });

                let class_name = if symbol.name.is_empty() {
                    file_stem(&file.relative_path)
                } else {
                    symbol.name.clone()
                };

                if entry
                    .models
                    .iter()
                    .any(|m| m.class_name.eq_ignore_ascii_case(&class_name))
                {
                    continue;
                }

                entry.models.push(ModelClassEntry {
                    class_name,
                    domain_key: key,
                    relative_path: file.relative_path.clone(),
                });
            }
        }

        for entry in domains.values_mut() {
            entry.models.sort_by(|a, b| a.class_name.cmp(&b.class_name));
        }

        tracing::debug!(
            domains = domains.len(),
            models = domains.values().map(|d| d.models.len()).sum::<usize>(),
            "Built domain model catalog"
        );

        Self { domains }
    }

    pub fn get_domain(&self, key: &str) -> Option<&DomainEntry> {
        self.domains.get(&key.trim().to_lowercase())
    }

    pub fn domains(&self) -> impl Iterator<Item = &DomainEntry> {
        self.domains.values()
    }

    /// Find the domain that owns a model class, by class name.
    pub fn domain_for_model(&self, class_name: &str) -> Option<&DomainEntry> {
        self.domains.values().find(|d| {
            d.models
                .iter()
                .any(|m| m.class_name.eq_ignore_ascii_case(class_name))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

/// Domain key = the directory that holds the file, skipping generic
/// container segments; "general" when nothing usable remains.
fn domain_key_for_path(relative_path: &str) -> String {
    const GENERIC: &[&str] = &["src", "lib", "models", "entities", "dto", "dtos"];
    let segments: Vec<&str> = relative_path.split('/').collect();
    segments
        .iter()
        .rev()
        .skip(1)
        .find(|s| !s.is_empty() && !GENERIC.contains(&s.to_lowercase().as_str()))
        .map(|s| s.to_lowercase())
        .unwrap_or_else(|| "general".to_string())
}

fn file_stem(relative_path: &str) -> String {
    relative_path
        .rsplit('/')
        .next()
        .and_then(|f| f.split('.').next())
        .unwrap_or_default()
        .to_string()
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
