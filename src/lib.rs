//! # RAG Indexer - Incremental Source-Code Indexing for Retrieval
//!
//! An incremental indexing engine that turns a source tree into
//! retrieval-ready embedded chunks. Files are discovered, hashed, diffed
//! against a persistent local index, and only new or changed files flow
//! through the processing pipeline.
//!
//! ## Overview
//!
//! Each file that needs work passes through five stages: symbol
//! extraction, classification, segmentation, description building, and
//! upload. Descriptions are written in three lenses (an embedding
//! snippet, a model-facing summary, and a human-readable detail) and are
//! quality-scored before publication; rejected descriptions never reach
//! the vector store, but the raw content still does.
//!
//! ## Key Features
//!
//! - **Incremental by default**: SHA-256 content hashing with a
//!   crash-safe JSON snapshot per repository
//! - **Deterministic identity**: stable document and chunk ids derived
//!   from org, repo, and normalized relative path
//! - **Sub-kind classification**: interfaces, models, managers,
//!   repositories, controllers, services, and tests drive specialized
//!   description builders
//! - **Domain catalog**: model classes grouped by directory give
//!   descriptions their domain vocabulary
//! - **Quality gate**: six-dimension scoring with a configurable publish
//!   threshold
//! - **Facet reporting**: deduplicated document facets reported once per
//!   run to a metadata registry
//!
//! ## Modules
//!
//! - [`orchestrator`]: per-repository run coordination
//! - [`discovery`]: file walking, filtering, and content hashing
//! - [`planner`]: pure diff of discovered files against the local index
//! - [`local_index`]: persistent per-repository snapshot store
//! - [`pipeline`]: the five-stage per-file processing pipeline
//! - [`identity`]: document and chunk id derivation
//! - [`classify`]: symbol sub-kind classification
//! - [`symbols`]: symbol extraction seam and built-in splitters
//! - [`catalog`]: domain model catalog built from classified symbols
//! - [`describe`]: three-lens description builders per sub-kind
//! - [`quality`]: description scoring and the publish gate
//! - [`facets`]: facet accumulation and deduplication
//! - [`services`]: embedding, vector store, and registry adapters
//! - [`config`]: configuration loading and validation
//! - [`error`]: error types and utilities

/// Domain model catalog built from classified symbols
pub mod catalog;

/// Normalized chunk payloads sent to the vector store
pub mod chunk;

/// Symbol sub-kind classification
pub mod classify;

/// Configuration loading and validation
pub mod config;

/// Three-lens description builders per sub-kind
pub mod describe;

/// File walking, filtering, and content hashing
pub mod discovery;

/// Error types and utilities
pub mod error;

/// Facet accumulation and deduplication
pub mod facets;

/// Document and chunk identity derivation
pub mod identity;

/// Persistent per-repository snapshot store
pub mod local_index;

/// Per-repository run coordination
pub mod orchestrator;

/// Path normalization and utility functions
pub mod paths;

/// The five-stage per-file processing pipeline
pub mod pipeline;

/// Pure diff of discovered files against the local index
pub mod planner;

/// Description scoring and the publish gate
pub mod quality;

/// Case-insensitive keyed processor registry
pub mod registry;

/// Embedding, vector store, and metadata registry adapters
pub mod services;

/// Symbol extraction seam and built-in splitters
pub mod symbols;
