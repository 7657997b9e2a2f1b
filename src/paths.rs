//! Path normalization utilities shared by the local index and the planner.

use std::path::PathBuf;

/// Normalize a repo-relative path for use as an index key.
///
/// Backslashes become forward slashes, repeated slashes collapse, a leading
/// `./` is stripped, and the result is lowercased so lookups are
/// case-insensitive across platforms.
pub fn normalize_relative_path(path: &str) -> String {
    if path.trim().is_empty() {
        return String::new();
    }

    let mut p = path.replace('\\', "/");
    while p.contains("//") {
        p = p.replace("//", "/");
    }

    if let Some(stripped) = p.strip_prefix("./") {
        p = stripped.to_string();
    }

    p.trim_matches('/').to_lowercase()
}

/// Turn an arbitrary repository id into a filesystem-safe file stem.
pub fn safe_repo_id(repo_id: &str) -> String {
    repo_id
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Default directory holding one snapshot file per repository.
pub fn default_index_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rag-indexer")
        .join("index")
}
