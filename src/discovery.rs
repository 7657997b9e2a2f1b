//! Source file discovery for a repository root.
//!
//! Walks the tree with gitignore-aware filtering, applies include/exclude
//! globs, skips binaries and oversized files, and hashes the survivors in
//! parallel. Discovery never mutates anything; it produces the candidate
//! set the planner diffs against the local index.

use crate::error::DiscoveryError;
use crate::identity::compute_text_hash;
use crate::paths::normalize_relative_path;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A candidate source file with its current content hash.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub full_path: PathBuf,
    /// Path relative to the walk root, normalized (forward slashes, lowercase)
    pub relative_path: String,
    pub content: String,
    pub hash: String,
}

pub struct FileWalker {
    root: PathBuf,
    max_file_size: usize,
    include_patterns: Vec<String>,
    exclude_patterns: Vec<String>,
    /// Optional cancellation flag - if set to true, walk() will exit early
    cancelled: Option<Arc<AtomicBool>>,
}

impl FileWalker {
    pub fn new(root: impl AsRef<Path>, max_file_size: usize) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            max_file_size,
            include_patterns: vec![],
            exclude_patterns: vec![],
            cancelled: None,
        }
    }

    /// Set a cancellation flag that will be checked during the walk.
    pub fn with_cancellation_flag(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = Some(cancelled);
        self
    }

    pub fn with_patterns(
        mut self,
        include_patterns: Vec<String>,
        exclude_patterns: Vec<String>,
    ) -> Self {
        self.include_patterns = include_patterns;
        self.exclude_patterns = exclude_patterns;
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Walk the root and collect all eligible files with their hashes.
    pub fn walk(&self) -> Result<Vec<DiscoveredFile>, DiscoveryError> {
        if !self.root.exists() {
            return Err(DiscoveryError::RootNotFound(
                self.root.display().to_string(),
            ));
        }
        if !self.root.is_dir() {
            return Err(DiscoveryError::NotADirectory(
                self.root.display().to_string(),
            ));
        }

        let include = build_glob_set(&self.include_patterns)?;
        let exclude = build_glob_set(&self.exclude_patterns)?;

        let mut candidates = Vec::new();

        let walker = WalkBuilder::new(&self.root)
            .standard_filters(true)
            .hidden(false)
            .git_ignore(true)
            .git_exclude(true)
            .git_global(true)
            .require_git(false)
            .build();

        for entry in walker {
            if self.is_cancelled() {
                tracing::info!(found = candidates.len(), "File walk cancelled");
                return Err(DiscoveryError::Cancelled);
            }

            let entry = entry.map_err(|e| DiscoveryError::WalkFailed(e.to_string()))?;
            let path = entry.path();

            if path.is_dir() {
                continue;
            }

            // Explicitly skip .git directory contents
            if path.components().any(|c| c.as_os_str() == ".git") {
                continue;
            }

            if let Ok(metadata) = fs::metadata(path)
                && metadata.len() > self.max_file_size as u64
            {
                tracing::debug!("Skipping large file: {:?}", path);
                continue;
            }

            let relative = path.strip_prefix(&self.root).unwrap_or(path);
            let relative_path = normalize_relative_path(&relative.to_string_lossy());

            if !matches_patterns(&relative_path, &include, &exclude) {
                continue;
            }

            candidates.push((path.to_path_buf(), relative_path));
        }

        // Read and hash in parallel; unreadable or binary files drop out here
        let mut files: Vec<DiscoveredFile> = candidates
            .into_par_iter()
            .filter_map(|(full_path, relative_path)| {
                if !is_text_file(&full_path) {
                    tracing::debug!("Skipping binary file: {:?}", full_path);
                    return None;
                }
                let content = match fs::read_to_string(&full_path) {
                    Ok(c) => c,
                    Err(e) => {
                        tracing::debug!(
                            "Skipping file that can't be read as UTF-8: {:?}: {}",
                            full_path,
                            e
                        );
                        return None;
                    }
                };
                let hash = compute_text_hash(&content);
                Some(DiscoveredFile {
                    full_path,
                    relative_path,
                    content,
                    hash,
                })
            })
            .collect();

        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

        tracing::info!(count = files.len(), root = ?self.root, "Discovered source files");
        Ok(files)
    }
}

fn build_glob_set(patterns: &[String]) -> Result<Option<GlobSet>, DiscoveryError> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| DiscoveryError::InvalidPattern {
            pattern: pattern.clone(),
            reason: e.to_string(),
        })?;
        builder.add(glob);
    }
    let set = builder
        .build()
        .map_err(|e| DiscoveryError::WalkFailed(e.to_string()))?;
    Ok(Some(set))
}

fn matches_patterns(relative_path: &str, include: &Option<GlobSet>, exclude: &Option<GlobSet>) -> bool {
    if let Some(include) = include
        && !include.is_match(relative_path)
    {
        return false;
    }
    if let Some(exclude) = exclude
        && exclude.is_match(relative_path)
    {
        return false;
    }
    true
}

/// Simple heuristic: if more than 30% of bytes are non-printable, it's binary
fn is_text_file(path: &Path) -> bool {
    let Ok(content) = fs::read(path) else {
        return false;
    };
    if content.is_empty() {
        return true;
    }
    let non_printable = content
        .iter()
        .filter(|&&b| b < 0x20 && b != b'\n' && b != b'\r' && b != b'\t')
        .count();
    (non_printable as f64 / content.len() as f64) < 0.3
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use tempfile::TempDir;

    fn write_file(dir: &Path, rel: &str, content: &[u8]) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn walk_finds_text_files_with_normalized_paths() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "Src/Main.rs", b"fn main() {}\n");
        write_file(dir.path(), "README.md", b"# hello\n");

        let files = FileWalker::new(dir.path(), 1024 * 1024).walk().unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["readme.md", "src/main.rs"]);
        assert!(!files[0].hash.is_empty());
    }

    #[test]
    fn walk_skips_binary_and_oversized_files() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "blob.bin", &[0u8, 1, 2, 3, 0, 0, 0, 0]);
        write_file(dir.path(), "big.txt", &vec![b'a'; 2048]);
        write_file(dir.path(), "ok.txt", b"small\n");

        let files = FileWalker::new(dir.path(), 1024).walk().unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["ok.txt"]);
    }

    #[test]
    fn include_and_exclude_globs_apply_to_relative_paths() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "src/lib.rs", b"pub fn x() {}\n");
        write_file(dir.path(), "src/gen/out.rs", b"pub fn y() {}\n");
        write_file(dir.path(), "notes.txt", b"notes\n");

        let files = FileWalker::new(dir.path(), 1024 * 1024)
            .with_patterns(vec!["**/*.rs".to_string()], vec!["src/gen/**".to_string()])
            .walk()
            .unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["src/lib.rs"]);
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let dir = TempDir::new().unwrap();
        let err = FileWalker::new(dir.path(), 1024)
            .with_patterns(vec!["[".to_string()], vec![])
            .walk()
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::InvalidPattern { .. }));
    }

    #[test]
    fn missing_root_is_an_error() {
        let err = FileWalker::new("/does/not/exist", 1024).walk().unwrap_err();
        assert!(matches!(err, DiscoveryError::RootNotFound(_)));
    }

    #[test]
    fn cancellation_flag_stops_the_walk() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.txt", b"a\n");

        let cancelled = Arc::new(AtomicBool::new(true));
        let err = FileWalker::new(dir.path(), 1024)
            .with_cancellation_flag(cancelled)
            .walk()
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::Cancelled));
    }

    #[test]
    fn identical_content_hashes_equal_across_files() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.txt", b"same content\n");
        write_file(dir.path(), "b.txt", b"same content\n");

        let files = FileWalker::new(dir.path(), 1024).walk().unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].hash, files[1].hash);
    }
}
