//! Symbol extraction seam.
//!
//! The real language-aware splitter lives outside this crate; the pipeline
//! only depends on the [`SymbolSplitter`] trait. Two built-in splitters are
//! provided: one that treats the whole file as a single span, and a
//! line-oriented one that splits on top-level type declarations, which is
//! enough to key classification for common object-oriented sources.

/// One extracted symbol span.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolSpan {
    pub name: String,
    /// Raw declaration kind as reported by the splitter (class, trait, ...)
    pub kind: String,
    /// 1-based, inclusive
    pub start_line: usize,
    pub end_line: usize,
    pub text: String,
}

/// Splits raw source text into symbol spans.
pub trait SymbolSplitter: Send + Sync {
    fn split(&self, source_text: &str) -> Vec<SymbolSpan>;
}

/// Fallback splitter: the entire file is one span named after nothing in
/// particular. Used when no language-specific splitter is registered.
pub struct WholeFileSplitter;

impl SymbolSplitter for WholeFileSplitter {
    fn split(&self, source_text: &str) -> Vec<SymbolSpan> {
        if source_text.trim().is_empty() {
            return Vec::new();
        }
        let line_count = source_text.lines().count().max(1);
        vec![SymbolSpan {
            name: String::new(),
            kind: "file".to_string(),
            start_line: 1,
            end_line: line_count,
            text: source_text.to_string(),
        }]
    }
}

/// Line-oriented splitter for curly-brace languages. Each top-level type
/// declaration (class, struct, record, interface, trait, enum, impl) opens
/// a new span; everything before the first declaration is dropped unless
/// no declaration exists at all.
pub struct DeclarationSplitter;

const DECLARATION_KEYWORDS: &[&str] = &[
    "class", "struct", "record", "interface", "trait", "enum", "impl",
];

impl SymbolSplitter for DeclarationSplitter {
    fn split(&self, source_text: &str) -> Vec<SymbolSpan> {
        let lines: Vec<&str> = source_text.lines().collect();
        let mut declarations: Vec<(usize, String, String)> = Vec::new();

        for (idx, line) in lines.iter().enumerate() {
            if let Some((kind, name)) = parse_declaration(line) {
                declarations.push((idx, kind, name));
            }
        }

        if declarations.is_empty() {
            return WholeFileSplitter.split(source_text);
        }

        let mut spans = Vec::with_capacity(declarations.len());
        for (i, (start_idx, kind, name)) in declarations.iter().enumerate() {
            let end_idx = declarations
                .get(i + 1)
                .map(|(next, _, _)| next - 1)
                .unwrap_or(lines.len() - 1);
            let text = lines[*start_idx..=end_idx].join("\n");
            spans.push(SymbolSpan {
                name: name.clone(),
                kind: kind.clone(),
                start_line: start_idx + 1,
                end_line: end_idx + 1,
                text,
            });
        }
        spans
    }
}

/// Recognize `... class Name ...` style declarations at any indentation,
/// skipping comment lines.
fn parse_declaration(line: &str) -> Option<(String, String)> {
    let trimmed = line.trim_start();
    if trimmed.starts_with("//") || trimmed.starts_with('*') || trimmed.starts_with('#') {
        return None;
    }

    let tokens: Vec<&str> = trimmed
        .split(|c: char| c.is_whitespace() || c == '(' || c == '{' || c == ':' || c == '<')
        .filter(|t| !t.is_empty())
        .collect();

    for (i, token) in tokens.iter().enumerate() {
        if DECLARATION_KEYWORDS.contains(token) {
            let name = tokens.get(i + 1)?;
            if name.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_') {
                return Some((token.to_string(), name.to_string()));
            }
            return None;
        }
        // Only leading modifiers may precede the keyword
        if !matches!(
            *token,
            "public" | "private" | "protected" | "internal" | "static" | "sealed"
                | "abstract" | "partial" | "pub" | "export" | "final"
        ) {
            return None;
        }
    }
    None
}

/// Splitter registry used by the default wiring: declaration splitting for
/// common object-oriented source extensions, whole-file for everything else.
pub fn default_splitters() -> crate::registry::ProcessorRegistry<dyn SymbolSplitter> {
    use std::sync::Arc;

    let mut registry: crate::registry::ProcessorRegistry<dyn SymbolSplitter> =
        crate::registry::ProcessorRegistry::new();
    let declaration: Arc<dyn SymbolSplitter> = Arc::new(DeclarationSplitter);
    for ext in ["cs", "rs", "java", "ts", "kt", "scala"] {
        registry.register(ext, Arc::clone(&declaration));
    }
    registry.register_default(Arc::new(WholeFileSplitter));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_file_splitter_yields_single_span() {
        let spans = WholeFileSplitter.split("line one\nline two\n");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].start_line, 1);
        assert_eq!(spans[0].end_line, 2);
        assert_eq!(spans[0].kind, "file");
    }

    #[test]
    fn whole_file_splitter_skips_blank_input() {
        assert!(WholeFileSplitter.split("   \n  ").is_empty());
    }

    #[test]
    fn declaration_splitter_splits_per_type() {
        let source = "using System;\n\
                      public class Device {\n\
                          public string Name { get; set; }\n\
                      }\n\
                      public interface IDeviceManager {\n\
                          Device Get(string id);\n\
                      }\n";
        let spans = DeclarationSplitter.split(source);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].name, "Device");
        assert_eq!(spans[0].kind, "class");
        assert_eq!(spans[1].name, "IDeviceManager");
        assert_eq!(spans[1].kind, "interface");
        assert_eq!(spans[1].start_line, 5);
        assert!(spans[1].text.contains("Device Get(string id);"));
    }

    #[test]
    fn declaration_splitter_handles_rust_traits() {
        let source = "pub trait Splitter {\n    fn split(&self);\n}\n";
        let spans = DeclarationSplitter.split(source);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, "Splitter");
        assert_eq!(spans[0].kind, "trait");
    }

    #[test]
    fn declaration_splitter_falls_back_to_whole_file() {
        let spans = DeclarationSplitter.split("just some text\nno declarations\n");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, "file");
    }

    #[test]
    fn commented_declarations_are_ignored() {
        let source = "// class NotReal\npublic class Real {}\n";
        let spans = DeclarationSplitter.split(source);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, "Real");
    }
}
