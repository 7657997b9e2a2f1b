/// Centralized error types for rag-indexer using thiserror
///
/// Provides domain-specific error types for better error handling and user-facing messages.
use thiserror::Error;

/// Main error type for the indexing engine
#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Local index store error: {0}")]
    Store(#[from] StoreError),

    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {0}")]
    LoadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Errors related to the persisted local index
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read index snapshot '{path}': {reason}")]
    LoadFailed { path: String, reason: String },

    #[error("Failed to write index snapshot '{path}': {reason}")]
    SaveFailed { path: String, reason: String },

    #[error("Repository id must not be empty")]
    EmptyRepoId,
}

/// Errors related to file discovery
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Source root not found: {0}")]
    RootNotFound(String),

    #[error("Source root is not a directory: {0}")]
    NotADirectory(String),

    #[error("Failed to walk directory: {0}")]
    WalkFailed(String),

    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Discovery was cancelled")]
    Cancelled,
}

/// Errors raised by a pipeline stage while processing one file
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Stage {stage} failed for '{path}': {reason}")]
    StageFailed {
        stage: &'static str,
        path: String,
        reason: String,
    },

    #[error("Failed to read file '{path}': {reason}")]
    FileReadFailed { path: String, reason: String },

    #[error("Pipeline was cancelled")]
    Cancelled,
}

/// Errors from the external embedding service
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Embedding request failed: {0}")]
    RequestFailed(String),

    #[error("Embedding response was malformed: {0}")]
    MalformedResponse(String),

    #[error("Embedding response contained no vectors")]
    EmptyResponse,
}

/// Errors from the external vector store
#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("Failed to upsert chunks: {0}")]
    UpsertFailed(String),

    #[error("Failed to delete document '{doc_id}': {reason}")]
    DeleteFailed { doc_id: String, reason: String },

    #[error("Vector store request failed: {0}")]
    RequestFailed(String),
}

// Conversion from anyhow::Error to IndexerError
impl From<anyhow::Error> for IndexerError {
    fn from(err: anyhow::Error) -> Self {
        IndexerError::Other(format!("{:#}", err))
    }
}

impl IndexerError {
    /// Create a new error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        IndexerError::Other(msg.into())
    }

    /// Check if this is a user error (bad configuration) vs system error
    pub fn is_user_error(&self) -> bool {
        matches!(self, IndexerError::Config(_))
    }

    /// Check if this error is retryable on a later run
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            IndexerError::Embedding(_)
                | IndexerError::VectorStore(_)
                | IndexerError::Io(_)
                | IndexerError::Pipeline(PipelineError::StageFailed { .. })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IndexerError::Config(ConfigError::MissingRequired("repo_id".to_string()));
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing required configuration: repo_id"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: IndexerError = io_err.into();
        assert!(matches!(err, IndexerError::Io(_)));
    }

    #[test]
    fn test_error_from_anyhow() {
        let anyhow_err = anyhow::anyhow!("test error");
        let err: IndexerError = anyhow_err.into();
        assert!(matches!(err, IndexerError::Other(_)));
    }

    #[test]
    fn test_is_user_error() {
        let user_err = IndexerError::Config(ConfigError::MissingRequired("org_id".to_string()));
        assert!(user_err.is_user_error());

        let system_err =
            IndexerError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "test"));
        assert!(!system_err.is_user_error());
    }

    #[test]
    fn test_is_retryable() {
        let retryable =
            IndexerError::Embedding(EmbeddingError::RequestFailed("timeout".to_string()));
        assert!(retryable.is_retryable());

        let not_retryable =
            IndexerError::Config(ConfigError::MissingRequired("repo_id".to_string()));
        assert!(!not_retryable.is_retryable());
    }

    #[test]
    fn test_stage_failed_display() {
        let err = PipelineError::StageFailed {
            stage: "UploadContent",
            path: "src/device.rs".to_string(),
            reason: "connection refused".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Stage UploadContent failed for 'src/device.rs': connection refused"
        );
    }

    #[test]
    fn test_error_chain() {
        let store_err = StoreError::LoadFailed {
            path: "/tmp/index.json".to_string(),
            reason: "permission denied".to_string(),
        };
        let err: IndexerError = store_err.into();
        assert_eq!(
            err.to_string(),
            "Local index store error: Failed to read index snapshot '/tmp/index.json': permission denied"
        );
    }
}
