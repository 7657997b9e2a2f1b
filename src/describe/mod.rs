//! Three-lens description generation.
//!
//! Every published chunk carries three textual views of the same symbol:
//! an embedding-oriented snippet, a compact model-facing summary, and a
//! verbose human-facing narrative. Builders are keyed by sub-kind through
//! the processor registry; a missing builder is not an error, the raw
//! text flows downstream unlensed.

pub mod parse;
pub mod verbs;

mod default_builder;
mod interface;
mod manager;
mod model;

pub use default_builder::DefaultDescriptionBuilder;
pub use interface::InterfaceDescriptionBuilder;
pub use manager::ManagerDescriptionBuilder;
pub use model::ModelDescriptionBuilder;

use crate::catalog::DomainModelCatalog;
use crate::classify::SubKind;
use crate::registry::ProcessorRegistry;
use crate::symbols::SymbolSpan;
use std::sync::Arc;

/// The three text lenses produced for one symbol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThreeLensDescription {
    /// Dense, anchor-heavy text optimized for embedding similarity
    pub embed_snippet: String,
    /// Compact structured summary for model consumption
    pub model_summary: String,
    /// Verbose narrative for human readers
    pub user_detail: String,
}

/// Everything a builder may consult. The catalog is a run-scoped,
/// read-only snapshot.
pub struct DescriptionContext<'a> {
    pub symbol: &'a SymbolSpan,
    pub relative_path: &'a str,
    pub catalog: &'a DomainModelCatalog,
}

/// Per-sub-kind description generator. Implementations must be
/// deterministic: identical symbol text and catalog snapshot always
/// produce identical output.
pub trait DescriptionBuilder: Send + Sync {
    fn build_summary_for_embedding(&self, ctx: &DescriptionContext<'_>) -> String;
    fn build_summary_for_model(&self, ctx: &DescriptionContext<'_>) -> String;
    fn build_summary_for_human(&self, ctx: &DescriptionContext<'_>) -> String;

    fn build(&self, ctx: &DescriptionContext<'_>) -> ThreeLensDescription {
        ThreeLensDescription {
            embed_snippet: self.build_summary_for_embedding(ctx),
            model_summary: self.build_summary_for_model(ctx),
            user_detail: self.build_summary_for_human(ctx),
        }
    }
}

/// Standard builder registry: one builder per recognized sub-kind, with
/// the raw-passthrough builder as the fallback.
pub fn default_builders() -> ProcessorRegistry<dyn DescriptionBuilder> {
    let mut registry: ProcessorRegistry<dyn DescriptionBuilder> = ProcessorRegistry::new();
    registry.register(SubKind::Interface.key(), Arc::new(InterfaceDescriptionBuilder));
    registry.register(SubKind::Model.key(), Arc::new(ModelDescriptionBuilder));
    registry.register(SubKind::Manager.key(), Arc::new(ManagerDescriptionBuilder));
    registry.register(SubKind::Service.key(), Arc::new(ManagerDescriptionBuilder));
    registry.register(SubKind::Repository.key(), Arc::new(ManagerDescriptionBuilder));
    registry.register_default(Arc::new(DefaultDescriptionBuilder));
    registry
}
