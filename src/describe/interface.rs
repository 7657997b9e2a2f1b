//! Interface descriptions built from structural signals only.

use super::parse::{parse_methods, parse_properties, parse_type_name, primary_entity};
use super::verbs::{method_atom, strip_async_suffix, verb_class, map_verb, split_leading_token, VerbClass};
use super::{DescriptionBuilder, DescriptionContext};
use std::collections::HashSet;
use std::fmt::Write;

const MAX_METHODS: usize = 50;
const MAX_PROPERTIES: usize = 30;

pub struct InterfaceDescriptionBuilder;

impl InterfaceDescriptionBuilder {
    fn interface_name(ctx: &DescriptionContext<'_>) -> String {
        if !ctx.symbol.name.is_empty() {
            return ctx.symbol.name.clone();
        }
        parse_type_name(&ctx.symbol.text).unwrap_or_else(|| "interface".to_string())
    }

    fn role(name: &str) -> Option<&'static str> {
        let lowered = name.to_lowercase();
        if lowered.contains("repo") {
            Some("repository")
        } else if lowered.contains("manager") {
            Some("manager")
        } else if lowered.contains("service") {
            Some("service")
        } else if lowered.contains("validator") {
            Some("validator")
        } else {
            None
        }
    }
}

impl DescriptionBuilder for InterfaceDescriptionBuilder {
    /// Dense anchor text: name, role, entity, then one atom per method,
    /// deduplicated across overloads.
    fn build_summary_for_embedding(&self, ctx: &DescriptionContext<'_>) -> String {
        let name = Self::interface_name(ctx);
        let entity = primary_entity(&name);

        let mut out = String::new();
        out.push_str(&name);
        if let Some(role) = Self::role(&name) {
            let _ = write!(out, " {}", role);
        }
        if entity != name {
            let _ = write!(out, " {}", entity);
        }
        out.push('\n');

        let mut seen = HashSet::new();
        for method in parse_methods(&ctx.symbol.text).iter().take(MAX_METHODS) {
            let atom = method_atom(&method.name, method.return_type.as_deref(), &method.parameters);
            if atom.is_empty() || !seen.insert(atom.to_lowercase()) {
                continue;
            }
            out.push_str(&atom);
            out.push('\n');
        }
        out.trim_end().to_string()
    }

    /// Compact structured summary: header lines then a dash list of
    /// `Name :: atom` entries, overloads collapsed.
    fn build_summary_for_model(&self, ctx: &DescriptionContext<'_>) -> String {
        let name = Self::interface_name(ctx);
        let mut out = String::new();

        let _ = writeln!(
            out,
            "Interface: {}{}",
            name,
            Self::role(&name).map(|r| format!(" ({})", r)).unwrap_or_default()
        );
        let _ = writeln!(out, "Path: {}", ctx.relative_path);
        let _ = writeln!(out, "Lines: {}-{}", ctx.symbol.start_line, ctx.symbol.end_line);

        let methods = parse_methods(&ctx.symbol.text);
        if !methods.is_empty() {
            out.push('\n');
            out.push_str("Methods:\n");
            let mut seen = HashSet::new();
            let mut emitted = 0usize;
            for method in &methods {
                if emitted >= MAX_METHODS {
                    break;
                }
                let atom = method_atom(&method.name, method.return_type.as_deref(), &method.parameters);
                if atom.is_empty() || !seen.insert(atom.to_lowercase()) {
                    continue;
                }
                let _ = writeln!(out, "- {} :: {}", method.name, atom);
                emitted += 1;
            }
            if methods.len() > emitted {
                let _ = writeln!(out, "({} more methods omitted)", methods.len() - emitted);
            }
        }

        let properties = parse_properties(&ctx.symbol.text);
        if !properties.is_empty() {
            out.push('\n');
            out.push_str("Properties:\n");
            for prop in properties.iter().take(MAX_PROPERTIES) {
                let _ = writeln!(out, "- {}: {}", prop.name, prop.type_name);
            }
        }

        out.trim_end().to_string()
    }

    /// Narrative view: what the contract is for, split into queries and
    /// commands.
    fn build_summary_for_human(&self, ctx: &DescriptionContext<'_>) -> String {
        let name = Self::interface_name(ctx);
        let entity = primary_entity(&name);
        let methods = parse_methods(&ctx.symbol.text);

        let mut queries = Vec::new();
        let mut commands = Vec::new();
        for method in &methods {
            let stem = strip_async_suffix(&method.name);
            let (lead, _) = split_leading_token(stem);
            let verb = map_verb(lead);
            match verb_class(&verb) {
                VerbClass::Query => queries.push(method.name.clone()),
                VerbClass::Command => commands.push(method.name.clone()),
            }
        }

        let mut out = String::new();
        let _ = write!(
            out,
            "{} is a contract for working with {} records",
            name, entity
        );
        if let Some(role) = Self::role(&name) {
            let _ = write!(out, " in a {} role", role);
        }
        out.push('.');

        if !queries.is_empty() {
            let _ = write!(out, " Query operations: {}.", queries.join(", "));
        }
        if !commands.is_empty() {
            let _ = write!(out, " Command operations: {}.", commands.join(", "));
        }
        if let Some(domain) = ctx.catalog.domain_for_model(&entity) {
            let _ = write!(out, " {} belongs to the {} domain.", entity, domain.name);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DomainModelCatalog;
    use crate::discovery::DiscoveredFile;
    use crate::symbols::{DeclarationSplitter, SymbolSpan};

    const TEXT: &str = "public interface IDeviceManager\n\
                        {\n\
                            Task<InvokeResult<Device>> AddDeviceAsync(Device device);\n\
                            Task<Device> GetDeviceByIdAsync(string id);\n\
                            Task<Device> GetDeviceByIdAsync(string id, bool refresh);\n\
                            Task DeleteDeviceAsync(string id);\n\
                        }\n";

    fn ctx_symbol() -> SymbolSpan {
        SymbolSpan {
            name: "IDeviceManager".to_string(),
            kind: "interface".to_string(),
            start_line: 10,
            end_line: 16,
            text: TEXT.to_string(),
        }
    }

    #[test]
    fn model_summary_lists_methods_with_atoms() {
        let catalog = DomainModelCatalog::default();
        let symbol = ctx_symbol();
        let ctx = DescriptionContext {
            symbol: &symbol,
            relative_path: "managers/idevicemanager.cs",
            catalog: &catalog,
        };
        let summary = InterfaceDescriptionBuilder.build_summary_for_model(&ctx);

        assert!(summary.starts_with("Interface: IDeviceManager (manager)"));
        assert!(summary.contains("Lines: 10-16"));
        assert!(summary.contains("- AddDeviceAsync :: create device -> Device"));
        assert!(summary.contains("- GetDeviceByIdAsync :: read device by id -> Device"));
        assert!(summary.contains("- DeleteDeviceAsync :: delete device"));
        // overload collapses to one atom
        assert_eq!(summary.matches("GetDeviceByIdAsync").count(), 1);
    }

    #[test]
    fn embedding_snippet_is_anchor_dense() {
        let catalog = DomainModelCatalog::default();
        let symbol = ctx_symbol();
        let ctx = DescriptionContext {
            symbol: &symbol,
            relative_path: "managers/idevicemanager.cs",
            catalog: &catalog,
        };
        let snippet = InterfaceDescriptionBuilder.build_summary_for_embedding(&ctx);
        let first_line = snippet.lines().next().unwrap();
        assert!(first_line.contains("IDeviceManager"));
        assert!(first_line.contains("manager"));
        assert!(first_line.contains("Device"));
        assert!(snippet.contains("create device -> Device"));
    }

    #[test]
    fn human_detail_mentions_owning_domain() {
        let files = vec![DiscoveredFile {
            full_path: "devices/models/device.cs".into(),
            relative_path: "devices/models/device.cs".to_string(),
            content: "public class Device {\n    public string Name { get; set; }\n}\n".to_string(),
            hash: String::new(),
        }];
        let catalog = DomainModelCatalog::build(&files, &DeclarationSplitter);

        let symbol = ctx_symbol();
        let ctx = DescriptionContext {
            symbol: &symbol,
            relative_path: "managers/idevicemanager.cs",
            catalog: &catalog,
        };
        let detail = InterfaceDescriptionBuilder.build_summary_for_human(&ctx);
        assert!(detail.contains("Query operations: GetDeviceByIdAsync"));
        assert!(detail.contains("Command operations: AddDeviceAsync"));
        assert!(detail.contains("Device belongs to the Devices domain."));
    }
}
