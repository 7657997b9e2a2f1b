/// Configuration for an indexing run
///
/// Supports loading from multiple sources with priority:
/// CLI args > Environment variables > Config file > Defaults
use crate::error::{ConfigError, IndexerError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Identity of the indexed corpus
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Repositories to index
    #[serde(default)]
    pub repos: Vec<RepoConfig>,

    /// Discovery and hashing configuration
    #[serde(default)]
    pub indexing: IndexingConfig,

    /// Quality gate configuration
    #[serde(default)]
    pub quality: QualityConfig,

    /// External service endpoints
    #[serde(default)]
    pub services: ServicesConfig,
}

/// Organization and project scoping for all generated identities
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IdentityConfig {
    #[serde(default)]
    pub org_id: String,

    #[serde(default)]
    pub project_id: Option<String>,
}

/// One repository to index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoConfig {
    pub repo_id: String,

    /// Root directory that discovery walks
    pub source_root: PathBuf,
}

/// Discovery and change-detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    /// Directory holding the per-repository index snapshots
    #[serde(default = "default_index_dir")]
    pub index_dir: PathBuf,

    /// Maximum file size to index (in bytes)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,

    /// Default include patterns (globs over relative paths)
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// Default exclude patterns
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,

    /// Force re-processing of every known file this run
    #[serde(default)]
    pub reindex: bool,
}

/// Quality gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Composite score at or above which a description publishes
    #[serde(default = "default_min_publish_score")]
    pub min_publish_score: f64,
}

/// External service endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    /// OpenAI-compatible embeddings endpoint
    #[serde(default = "default_embedding_endpoint")]
    pub embedding_endpoint: String,

    /// Embedding model name
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Vector store base URL
    #[serde(default = "default_vector_store_url")]
    pub vector_store_url: String,

    /// Metadata registry base URL; facet reporting is skipped when unset
    #[serde(default)]
    pub metadata_registry_url: Option<String>,

    /// LLM review endpoint for rewriting gate-rejected descriptions;
    /// rejections are final when unset
    #[serde(default)]
    pub llm_review_url: Option<String>,

    /// Environment variable holding the API key for outbound calls
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

// Default value functions
fn default_index_dir() -> PathBuf {
    crate::paths::default_index_dir()
}

fn default_max_file_size() -> usize {
    1_048_576 // 1 MB
}

fn default_exclude_patterns() -> Vec<String> {
    vec![
        "target/**".to_string(),
        "node_modules/**".to_string(),
        "bin/**".to_string(),
        "obj/**".to_string(),
        "dist/**".to_string(),
        "build/**".to_string(),
    ]
}

fn default_min_publish_score() -> f64 {
    60.0
}

fn default_embedding_endpoint() -> String {
    "https://api.openai.com/v1/embeddings".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_vector_store_url() -> String {
    "http://localhost:6333".to_string()
}

fn default_api_key_env() -> String {
    "RAG_INDEXER_API_KEY".to_string()
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            index_dir: default_index_dir(),
            max_file_size: default_max_file_size(),
            include_patterns: Vec::new(),
            exclude_patterns: default_exclude_patterns(),
            reindex: false,
        }
    }
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_publish_score: default_min_publish_score(),
        }
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            embedding_endpoint: default_embedding_endpoint(),
            embedding_model: default_embedding_model(),
            vector_store_url: default_vector_store_url(),
            metadata_registry_url: None,
            llm_review_url: None,
            api_key_env: default_api_key_env(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self, IndexerError> {
        if !path.exists() {
            return Err(ConfigError::LoadFailed(format!(
                "Config file not found: {}",
                path.display()
            ))
            .into());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed(format!("Invalid TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Resolve the API key from the configured environment variable, if set
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.services.api_key_env).ok().filter(|k| !k.is_empty())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), IndexerError> {
        if self.identity.org_id.trim().is_empty() {
            return Err(ConfigError::MissingRequired("identity.org_id".to_string()).into());
        }

        for repo in &self.repos {
            if repo.repo_id.trim().is_empty() {
                return Err(ConfigError::MissingRequired("repos.repo_id".to_string()).into());
            }
        }

        if self.indexing.max_file_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "indexing.max_file_size".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if !(0.0..=100.0).contains(&self.quality.min_publish_score) {
            return Err(ConfigError::InvalidValue {
                key: "quality.min_publish_score".to_string(),
                reason: format!(
                    "must be between 0 and 100, got {}",
                    self.quality.min_publish_score
                ),
            }
            .into());
        }

        Ok(())
    }
}
