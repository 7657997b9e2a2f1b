//! Canonical document identity and content hashing.
//!
//! Everything in this module is deterministic: the same inputs always yield
//! the same ids and hashes, which is what makes re-runs idempotent and lets
//! the planner detect "no real change".

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Maximum characters of a single line that participate in the content hash.
/// Longer lines are truncated so minified or generated single-line blobs do
/// not dominate hashing cost.
const HASH_LINE_LIMIT: usize = 500;

/// Canonical identity of an indexed unit.
///
/// The optional fields stay empty for file-level identities and get filled
/// in as symbols and sections are carved out of a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentIdentity {
    /// Owning organization id
    pub org_id: String,
    /// Optional project id (multi-project orgs)
    #[serde(default)]
    pub project_id: Option<String>,
    /// Repository id, e.g. "co.core"
    pub repo_id: String,
    /// Repo-relative path, forward slashes
    pub relative_path: String,
    /// Stable per-document id derived from org/repo/path
    pub doc_id: String,
    /// Symbol name when the unit is a single symbol
    #[serde(default)]
    pub symbol: Option<String>,
    /// Symbol kind label ("interface", "class", ...)
    #[serde(default)]
    pub symbol_type: Option<String>,
    /// Chunk id computed by `compute_chunk_id`
    #[serde(default)]
    pub chunk_id: Option<String>,
    /// Section discriminator within a document ("structure", "metadata", ...)
    #[serde(default)]
    pub section_key: Option<String>,
}

impl DocumentIdentity {
    /// Build a file-level identity. `doc_id` and `chunk_id` are derived
    /// deterministically from the other fields.
    pub fn for_file(
        org_id: &str,
        project_id: Option<&str>,
        repo_id: &str,
        relative_path: &str,
    ) -> Self {
        let mut identity = DocumentIdentity {
            org_id: org_id.to_string(),
            project_id: project_id.map(str::to_string),
            repo_id: repo_id.to_string(),
            relative_path: relative_path.to_string(),
            doc_id: compute_doc_id(org_id, repo_id, relative_path),
            ..Default::default()
        };
        identity.chunk_id = Some(compute_chunk_id(&identity));
        identity
    }

    /// Derive a section-scoped identity from this one. The chunk id is
    /// recomputed so the section key participates in it.
    pub fn with_section(&self, section_key: &str) -> Self {
        let mut identity = self.clone();
        identity.section_key = Some(section_key.to_string());
        identity.chunk_id = Some(compute_chunk_id(&identity));
        identity
    }

    /// Derive a symbol-scoped identity from this one.
    pub fn with_symbol(&self, symbol: &str, symbol_type: &str) -> Self {
        let mut identity = self.clone();
        identity.symbol = Some(symbol.to_string());
        identity.symbol_type = Some(symbol_type.to_string());
        identity
    }
}

/// Compute the chunk id by joining the non-empty members of
/// {org, project, repo, relative path, section key} with `:`.
///
/// Each member is trimmed and lowercased; empty members are skipped
/// entirely so the id never contains doubled separators. This is pure and
/// does no I/O.
pub fn compute_chunk_id(identity: &DocumentIdentity) -> String {
    let parts: [&str; 5] = [
        &identity.org_id,
        identity.project_id.as_deref().unwrap_or(""),
        &identity.repo_id,
        &identity.relative_path,
        identity.section_key.as_deref().unwrap_or(""),
    ];

    parts
        .iter()
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(":")
}

/// Compute the stable per-document id: 32 uppercase hex characters derived
/// from `<org>|<repo>|<relative-path>` (all lowercased).
pub fn compute_doc_id(org_id: &str, repo_id: &str, relative_path: &str) -> String {
    let canonical = format!(
        "{}|{}|{}",
        org_id.trim().to_lowercase(),
        repo_id.trim().to_lowercase(),
        crate::paths::normalize_relative_path(relative_path),
    );

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let digest = hasher.finalize();

    // 16 bytes of digest -> 32 hex chars, uppercase for readability.
    digest[..16]
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect()
}

/// Compute the normalized content hash of a block of text.
///
/// Line endings are converted to `\n` and each line is truncated to 500
/// characters before hashing with SHA-256; the result is lowercase hex.
/// Never fails: empty input hashes to the hash of the empty string.
pub fn compute_text_hash(text: &str) -> String {
    let mut hasher = Sha256::new();

    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut first = true;
    for line in normalized.split('\n') {
        if !first {
            hasher.update(b"\n");
        }
        first = false;

        let truncated: String = line.chars().take(HASH_LINE_LIMIT).collect();
        hasher.update(truncated.as_bytes());
    }

    format!("{:x}", hasher.finalize())
}

/// Compute the normalized content hash of a file on disk.
///
/// A missing file is not an error: it yields an empty string, the "nothing
/// to hash" signal consumed by the planner.
pub async fn compute_file_hash(path: impl AsRef<Path>) -> anyhow::Result<String> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(String::new());
    }

    let content = tokio::fs::read_to_string(path).await?;
    Ok(compute_text_hash(&content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_hash_deterministic() {
        let text = "fn main() {\n    println!(\"hello\");\n}\n";
        assert_eq!(compute_text_hash(text), compute_text_hash(text));
    }

    #[test]
    fn test_text_hash_line_ending_invariant() {
        let lf = "line one\nline two\nline three";
        let crlf = "line one\r\nline two\r\nline three";
        let cr = "line one\rline two\rline three";
        assert_eq!(compute_text_hash(lf), compute_text_hash(crlf));
        assert_eq!(compute_text_hash(lf), compute_text_hash(cr));
    }

    #[test]
    fn test_text_hash_truncates_long_lines() {
        let base: String = "a".repeat(500);
        let long_a = format!("{}b", base);
        let long_b = format!("{}cdef", base);
        // Both differ only beyond the 500-char truncation limit.
        assert_eq!(compute_text_hash(&long_a), compute_text_hash(&long_b));

        // A difference inside the limit must change the hash.
        let short = format!("{}x", &base[..400]);
        assert_ne!(compute_text_hash(&short), compute_text_hash(&base));
    }

    #[test]
    fn test_text_hash_empty() {
        assert_eq!(compute_text_hash(""), compute_text_hash(""));
        assert_ne!(compute_text_hash(""), compute_text_hash("x"));
    }

    #[test]
    fn test_chunk_id_join_rule() {
        let identity = DocumentIdentity {
            org_id: "Acme".to_string(),
            project_id: None,
            repo_id: "Core".to_string(),
            relative_path: "Models/Device.cs".to_string(),
            ..Default::default()
        };
        assert_eq!(compute_chunk_id(&identity), "acme:core:models/device.cs");
    }

    #[test]
    fn test_chunk_id_skips_empty_and_trims() {
        let identity = DocumentIdentity {
            org_id: "  Acme  ".to_string(),
            project_id: Some("   ".to_string()),
            repo_id: "Core".to_string(),
            relative_path: "src/lib.rs".to_string(),
            section_key: Some("Structure".to_string()),
            ..Default::default()
        };
        assert_eq!(compute_chunk_id(&identity), "acme:core:src/lib.rs:structure");
    }

    #[test]
    fn test_chunk_id_all_parts() {
        let identity = DocumentIdentity {
            org_id: "acme".to_string(),
            project_id: Some("iot".to_string()),
            repo_id: "core".to_string(),
            relative_path: "a.rs".to_string(),
            section_key: Some("meta".to_string()),
            ..Default::default()
        };
        assert_eq!(compute_chunk_id(&identity), "acme:iot:core:a.rs:meta");
    }

    #[test]
    fn test_doc_id_stable_and_case_insensitive() {
        let a = compute_doc_id("Acme", "Core", "Models/Device.cs");
        let b = compute_doc_id("acme", "core", "models/device.cs");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(a, a.to_uppercase());
    }

    #[test]
    fn test_doc_id_distinct_paths() {
        let a = compute_doc_id("acme", "core", "models/device.cs");
        let b = compute_doc_id("acme", "core", "models/alert.cs");
        assert_ne!(a, b);
    }

    #[test]
    fn test_for_file_populates_derived_fields() {
        let identity = DocumentIdentity::for_file("Acme", None, "Core", "src/lib.rs");
        assert!(!identity.doc_id.is_empty());
        assert_eq!(identity.chunk_id.as_deref(), Some("acme:core:src/lib.rs"));
        assert!(identity.section_key.is_none());

        let section = identity.with_section("structure");
        assert_eq!(
            section.chunk_id.as_deref(),
            Some("acme:core:src/lib.rs:structure")
        );
    }

    #[tokio::test]
    async fn test_file_hash_missing_file_is_empty() {
        let hash = compute_file_hash("/nonexistent/path/to/file.rs").await.unwrap();
        assert_eq!(hash, "");
    }

    #[tokio::test]
    async fn test_file_hash_matches_text_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.rs");
        std::fs::write(&path, "fn main() {}\n").unwrap();

        let from_file = compute_file_hash(&path).await.unwrap();
        assert_eq!(from_file, compute_text_hash("fn main() {}\n"));
    }
}
