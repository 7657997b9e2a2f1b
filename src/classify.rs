//! Sub-kind classification of extracted symbols.
//!
//! Heuristics work purely from the symbol's name, its raw text, and the
//! file's relative path. The resulting key drives every downstream
//! processor lookup, so detection must be deterministic.

use crate::symbols::SymbolSpan;

/// Fine-grained classification of a source symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubKind {
    Model,
    Manager,
    Repository,
    Controller,
    Service,
    Interface,
    Test,
    /// Generic code block, nothing more specific detected
    Block,
}

impl SubKind {
    /// Stable lowercase key used for registry dispatch and persistence.
    pub fn key(&self) -> &'static str {
        match self {
            SubKind::Model => "model",
            SubKind::Manager => "manager",
            SubKind::Repository => "repository",
            SubKind::Controller => "controller",
            SubKind::Service => "service",
            SubKind::Interface => "interface",
            SubKind::Test => "test",
            SubKind::Block => "block",
        }
    }

    pub fn from_key(key: &str) -> Option<SubKind> {
        match key.trim().to_lowercase().as_str() {
            "model" => Some(SubKind::Model),
            "manager" => Some(SubKind::Manager),
            "repository" => Some(SubKind::Repository),
            "controller" => Some(SubKind::Controller),
            "service" => Some(SubKind::Service),
            "interface" => Some(SubKind::Interface),
            "test" => Some(SubKind::Test),
            "block" => Some(SubKind::Block),
            _ => None,
        }
    }
}

impl std::fmt::Display for SubKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Classification outcome with the evidence that produced it.
#[derive(Debug, Clone)]
pub struct Classification {
    pub sub_kind: SubKind,
    pub reason: String,
}

/// Classify one extracted symbol.
///
/// Rules are evaluated in priority order. Tests come first so that test
/// code referencing models or managers still classifies as Test; the
/// name-suffix rules follow, then structural signals in the text, then
/// path segments, and finally the generic Block fallback.
pub fn classify_symbol(symbol: &SymbolSpan, relative_path: &str) -> Classification {
    let name = symbol.name.to_lowercase();
    let text = symbol.text.to_lowercase();
    let segments: Vec<String> = relative_path
        .replace('\\', "/")
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect();

    if is_test(&name, &text, &segments) {
        return found(SubKind::Test, "test naming or test attributes present");
    }
    if is_interface(&symbol.name, &symbol.kind, &text) {
        return found(SubKind::Interface, "interface or trait declaration");
    }
    if ends_with_any(&name, &["manager"]) || in_segments(&segments, &["managers"]) {
        return found(SubKind::Manager, "manager name or path segment");
    }
    if ends_with_any(&name, &["repo", "repository"]) || in_segments(&segments, &["repositories", "repos"]) {
        return found(SubKind::Repository, "repository name or path segment");
    }
    if is_controller(&name, &text, &segments) {
        return found(SubKind::Controller, "controller name, route attributes or path");
    }
    if ends_with_any(&name, &["service", "services"]) || in_segments(&segments, &["services"]) {
        return found(SubKind::Service, "service name or path segment");
    }
    if is_model(&text, &segments) {
        return found(SubKind::Model, "data-shaped type or models path segment");
    }

    Classification {
        sub_kind: SubKind::Block,
        reason: "no specific rule matched".to_string(),
    }
}

fn found(sub_kind: SubKind, reason: &str) -> Classification {
    Classification {
        sub_kind,
        reason: reason.to_string(),
    }
}

fn ends_with_any(name: &str, suffixes: &[&str]) -> bool {
    suffixes.iter().any(|s| name.ends_with(s))
}

fn in_segments(segments: &[String], wanted: &[&str]) -> bool {
    segments
        .iter()
        .any(|seg| wanted.iter().any(|w| seg == w))
}

fn is_test(name: &str, text: &str, segments: &[String]) -> bool {
    name.ends_with("test")
        || name.ends_with("tests")
        || in_segments(segments, &["test", "tests"])
        || text.contains("#[test]")
        || text.contains("[testmethod]")
        || text.contains("[fact]")
        || text.contains("[testclass]")
}

fn is_interface(name: &str, kind: &str, text: &str) -> bool {
    if kind.eq_ignore_ascii_case("interface") || kind.eq_ignore_ascii_case("trait") {
        return true;
    }
    // C#-style I-prefix: "IDeviceManager" but not "Inventory"
    let i_prefixed = name.len() >= 2
        && name.starts_with('I')
        && name.chars().nth(1).is_some_and(|c| c.is_ascii_uppercase());
    i_prefixed || text.contains("public interface ") || text.contains("pub trait ")
}

fn is_controller(name: &str, text: &str, segments: &[String]) -> bool {
    name.ends_with("controller")
        || in_segments(segments, &["controllers"])
        || text.contains("[apicontroller]")
        || text.contains("[httpget")
        || text.contains("[httppost")
        || text.contains("[route(")
}

fn is_model(text: &str, segments: &[String]) -> bool {
    if in_segments(segments, &["models", "entities", "dto", "dtos"]) {
        return true;
    }
    // Data-shaped: properties or fields dominate, few or no method bodies
    let property_count = text.matches("{ get; set; }").count() + text.matches("pub ").count();
    let has_entity_marker = text.contains("[entitydescription")
        || text.contains("#[derive(")
        || text.contains(": tableentity")
        || text.contains(": entitybase");
    has_entity_marker && property_count > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolSpan;

    fn span(name: &str, kind: &str, text: &str) -> SymbolSpan {
        SymbolSpan {
            name: name.to_string(),
            kind: kind.to_string(),
            start_line: 1,
            end_line: 1,
            text: text.to_string(),
        }
    }

    #[test]
    fn manager_suffix_classifies_as_manager() {
        let c = classify_symbol(&span("DeviceManager", "class", "class DeviceManager {}"), "src/device.cs");
        assert_eq!(c.sub_kind, SubKind::Manager);
    }

    #[test]
    fn test_rule_beats_manager_suffix_path() {
        let c = classify_symbol(
            &span("DeviceManagerTests", "class", "[TestMethod] void Adds() {}"),
            "tests/device_manager_tests.cs",
        );
        assert_eq!(c.sub_kind, SubKind::Test);
    }

    #[test]
    fn i_prefixed_name_is_interface() {
        let c = classify_symbol(
            &span("IDeviceManager", "class", "public interface IDeviceManager {}"),
            "src/idevicemanager.cs",
        );
        assert_eq!(c.sub_kind, SubKind::Interface);
    }

    #[test]
    fn inventory_is_not_interface() {
        let c = classify_symbol(&span("Inventory", "class", "class Inventory {}"), "src/inventory.cs");
        assert_ne!(c.sub_kind, SubKind::Interface);
    }

    #[test]
    fn trait_kind_is_interface() {
        let c = classify_symbol(&span("Splitter", "trait", "pub trait Splitter {}"), "src/splitter.rs");
        assert_eq!(c.sub_kind, SubKind::Interface);
    }

    #[test]
    fn models_path_segment_classifies_as_model() {
        let c = classify_symbol(
            &span("Device", "class", "class Device { public string Name { get; set; } }"),
            "Models/Device.cs",
        );
        assert_eq!(c.sub_kind, SubKind::Model);
    }

    #[test]
    fn entity_marker_classifies_as_model() {
        let c = classify_symbol(
            &span(
                "Device",
                "class",
                "[EntityDescription] class Device { public string Name { get; set; } }",
            ),
            "src/device.cs",
        );
        assert_eq!(c.sub_kind, SubKind::Model);
    }

    #[test]
    fn controller_attributes_classify_as_controller() {
        let c = classify_symbol(
            &span("DeviceApi", "class", "[ApiController] class DeviceApi {}"),
            "src/deviceapi.cs",
        );
        assert_eq!(c.sub_kind, SubKind::Controller);
    }

    #[test]
    fn repository_suffix_classifies_as_repository() {
        let c = classify_symbol(&span("DeviceRepo", "class", "class DeviceRepo {}"), "src/devicerepo.cs");
        assert_eq!(c.sub_kind, SubKind::Repository);
    }

    #[test]
    fn unmatched_symbol_falls_back_to_block() {
        let c = classify_symbol(&span("Helpers", "class", "static class Helpers {}"), "src/helpers.cs");
        assert_eq!(c.sub_kind, SubKind::Block);
    }

    #[test]
    fn keys_round_trip() {
        for kind in [
            SubKind::Model,
            SubKind::Manager,
            SubKind::Repository,
            SubKind::Controller,
            SubKind::Service,
            SubKind::Interface,
            SubKind::Test,
            SubKind::Block,
        ] {
            assert_eq!(SubKind::from_key(kind.key()), Some(kind));
        }
        assert_eq!(SubKind::from_key("unknown"), None);
    }
}
