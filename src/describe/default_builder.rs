//! Raw-passthrough builder used when no sub-kind-specific builder exists.

use super::{DescriptionBuilder, DescriptionContext};
use std::fmt::Write;

const MAX_SNIPPET_CHARS: usize = 2000;

pub struct DefaultDescriptionBuilder;

impl DescriptionBuilder for DefaultDescriptionBuilder {
    /// The raw text itself, capped, so unclassified code still embeds.
    fn build_summary_for_embedding(&self, ctx: &DescriptionContext<'_>) -> String {
        let text = ctx.symbol.text.trim();
        if text.chars().count() <= MAX_SNIPPET_CHARS {
            return text.to_string();
        }
        text.chars().take(MAX_SNIPPET_CHARS).collect()
    }

    fn build_summary_for_model(&self, ctx: &DescriptionContext<'_>) -> String {
        let mut out = String::new();
        let label = if ctx.symbol.name.is_empty() {
            ctx.relative_path.to_string()
        } else {
            ctx.symbol.name.clone()
        };
        let _ = writeln!(out, "Code block: {}", label);
        let _ = writeln!(out, "Path: {}", ctx.relative_path);
        let _ = writeln!(out, "Lines: {}-{}", ctx.symbol.start_line, ctx.symbol.end_line);
        out.trim_end().to_string()
    }

    fn build_summary_for_human(&self, ctx: &DescriptionContext<'_>) -> String {
        let label = if ctx.symbol.name.is_empty() {
            format!("the file {}", ctx.relative_path)
        } else {
            ctx.symbol.name.clone()
        };
        format!(
            "Unclassified code block from {} spanning lines {} to {}.",
            label, ctx.symbol.start_line, ctx.symbol.end_line
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DomainModelCatalog;
    use crate::symbols::SymbolSpan;

    #[test]
    fn embedding_snippet_is_raw_text_capped() {
        let catalog = DomainModelCatalog::default();
        let symbol = SymbolSpan {
            name: String::new(),
            kind: "file".to_string(),
            start_line: 1,
            end_line: 1,
            text: "x".repeat(3000),
        };
        let ctx = DescriptionContext {
            symbol: &symbol,
            relative_path: "notes.txt",
            catalog: &catalog,
        };
        let snippet = DefaultDescriptionBuilder.build_summary_for_embedding(&ctx);
        assert_eq!(snippet.chars().count(), MAX_SNIPPET_CHARS);
    }

    #[test]
    fn summaries_fall_back_to_path_when_unnamed() {
        let catalog = DomainModelCatalog::default();
        let symbol = SymbolSpan {
            name: String::new(),
            kind: "file".to_string(),
            start_line: 1,
            end_line: 12,
            text: "content".to_string(),
        };
        let ctx = DescriptionContext {
            symbol: &symbol,
            relative_path: "scripts/build.sh",
            catalog: &catalog,
        };
        let summary = DefaultDescriptionBuilder.build_summary_for_model(&ctx);
        assert!(summary.contains("Code block: scripts/build.sh"));
        let detail = DefaultDescriptionBuilder.build_summary_for_human(&ctx);
        assert!(detail.contains("the file scripts/build.sh"));
        assert!(detail.contains("lines 1 to 12"));
    }
}
