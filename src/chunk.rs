//! Normalized text chunks prepared for embedding and upload.

use crate::identity::DocumentIdentity;
use std::collections::BTreeMap;

/// Coarse content type of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    SourceCode,
    Documentation,
    Configuration,
}

impl ChunkKind {
    pub fn key(&self) -> &'static str {
        match self {
            ChunkKind::SourceCode => "source-code",
            ChunkKind::Documentation => "documentation",
            ChunkKind::Configuration => "configuration",
        }
    }
}

/// A unit of text ready for the embedding and upload stages.
#[derive(Debug, Clone)]
pub struct NormalizedChunk {
    pub identity: DocumentIdentity,
    pub kind: ChunkKind,
    pub sub_kind: Option<String>,
    /// Final text fed downstream
    pub normalized_text: String,
    pub estimated_tokens: Option<usize>,
    /// Populated after the embedding stage
    pub embedding: Option<Vec<f32>>,
    /// Open key/value bag for store-specific payload fields
    pub metadata: BTreeMap<String, String>,
}

impl NormalizedChunk {
    pub fn new(identity: DocumentIdentity, kind: ChunkKind, text: impl Into<String>) -> Self {
        let normalized_text = text.into();
        let estimated_tokens = estimate_tokens(&normalized_text);
        Self {
            identity,
            kind,
            sub_kind: None,
            normalized_text,
            estimated_tokens,
            embedding: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_sub_kind(mut self, sub_kind: impl Into<String>) -> Self {
        self.sub_kind = Some(sub_kind.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Rough token count: four characters per token, rounded up. None for
/// empty text.
pub fn estimate_tokens(text: &str) -> Option<usize> {
    let chars = text.chars().count();
    if chars == 0 {
        None
    } else {
        Some(chars.div_ceil(4))
    }
}
