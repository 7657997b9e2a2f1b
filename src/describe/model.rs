//! Descriptions for data model classes.

use super::parse::{parse_properties, parse_type_name};
use super::verbs::humanize_camel;
use super::{DescriptionBuilder, DescriptionContext};
use std::fmt::Write;

const MAX_PROPERTIES: usize = 40;

pub struct ModelDescriptionBuilder;

impl ModelDescriptionBuilder {
    fn model_name(ctx: &DescriptionContext<'_>) -> String {
        if !ctx.symbol.name.is_empty() {
            return ctx.symbol.name.clone();
        }
        parse_type_name(&ctx.symbol.text).unwrap_or_else(|| "model".to_string())
    }
}

impl DescriptionBuilder for ModelDescriptionBuilder {
    fn build_summary_for_embedding(&self, ctx: &DescriptionContext<'_>) -> String {
        let name = Self::model_name(ctx);
        let mut out = String::new();
        out.push_str(&name);
        let _ = write!(out, " {}", humanize_camel(&name));

        if let Some(domain) = ctx.catalog.domain_for_model(&name) {
            let _ = write!(out, " {}", domain.name);
        }
        out.push('\n');

        for prop in parse_properties(&ctx.symbol.text).iter().take(MAX_PROPERTIES) {
            let _ = writeln!(out, "{} {}", humanize_camel(&prop.name), prop.type_name);
        }
        out.trim_end().to_string()
    }

    fn build_summary_for_model(&self, ctx: &DescriptionContext<'_>) -> String {
        let name = Self::model_name(ctx);
        let mut out = String::new();
        let _ = writeln!(out, "Model: {}", name);
        let _ = writeln!(out, "Path: {}", ctx.relative_path);
        if let Some(domain) = ctx.catalog.domain_for_model(&name) {
            let _ = writeln!(out, "Domain: {}", domain.name);
        }

        let properties = parse_properties(&ctx.symbol.text);
        if !properties.is_empty() {
            out.push('\n');
            out.push_str("Fields:\n");
            for prop in properties.iter().take(MAX_PROPERTIES) {
                let _ = writeln!(out, "- {}: {}", prop.name, prop.type_name);
            }
            if properties.len() > MAX_PROPERTIES {
                let _ = writeln!(out, "({} more fields omitted)", properties.len() - MAX_PROPERTIES);
            }
        }
        out.trim_end().to_string()
    }

    fn build_summary_for_human(&self, ctx: &DescriptionContext<'_>) -> String {
        let name = Self::model_name(ctx);
        let properties = parse_properties(&ctx.symbol.text);

        let mut out = String::new();
        let _ = write!(out, "{} is a data model", name);
        if let Some(domain) = ctx.catalog.domain_for_model(&name) {
            let _ = write!(out, " in the {} domain", domain.name);
            let siblings: Vec<&str> = domain
                .models
                .iter()
                .filter(|m| !m.class_name.eq_ignore_ascii_case(&name))
                .map(|m| m.class_name.as_str())
                .collect();
            out.push('.');
            if !siblings.is_empty() {
                let _ = write!(out, " Related models: {}.", siblings.join(", "));
            }
        } else {
            out.push('.');
        }

        if !properties.is_empty() {
            let names: Vec<&str> = properties.iter().map(|p| p.name.as_str()).collect();
            let _ = write!(out, " It carries {} fields: {}.", names.len(), names.join(", "));
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

    const DEVICE: &str = "public class Device {\n\
                          public string Name { get; set; }\n\
                          public string SerialNumber { get; set; }\n\
                          }\n";

    fn catalog() -> DomainModelCatalog {
        let files = vec![
            DiscoveredFile {
                full_path: "devices/models/device.cs".into(),
                relative_path: "devices/models/device.cs".to_string(),
                content: DEVICE.to_string(),
                hash: String::new(),
            },
            DiscoveredFile {
                full_path: "devices/models/sensor.cs".into(),
                relative_path: "devices/models/sensor.cs".to_string(),
                content: "public class Sensor {\n    public string Id { get; set; }\n}\n"
                    .to_string(),
                hash: String::new(),
            },
        ];
        DomainModelCatalog::build(&files, &DeclarationSplitter)
    }

    fn device_span() -> SymbolSpan {
        SymbolSpan {
            name: "Device".to_string(),
            kind: "class".to_string(),
            start_line: 1,
            end_line: 4,
            text: DEVICE.to_string(),
        }
    }

    #[test]
    fn model_summary_lists_fields_and_domain() {
        let catalog = catalog();
        let symbol = device_span();
        let ctx = DescriptionContext {
            symbol: &symbol,
            relative_path: "devices/models/device.cs",
            catalog: &catalog,
        };
        let summary = ModelDescriptionBuilder.build_summary_for_model(&ctx);
        assert!(summary.starts_with("Model: Device"));
        assert!(summary.contains("Domain: Devices"));
        assert!(summary.contains("- Name: string"));
        assert!(summary.contains("- SerialNumber: string"));
    }

    #[test]
    fn human_detail_names_sibling_models() {
        let catalog = catalog();
        let symbol = device_span();
        let ctx = DescriptionContext {
            symbol: &symbol,
            relative_path: "devices/models/device.cs",
            catalog: &catalog,
        };
        let detail = ModelDescriptionBuilder.build_summary_for_human(&ctx);
        assert!(detail.contains("Device is a data model in the Devices domain."));
        assert!(detail.contains("Related models: Sensor."));
        assert!(detail.contains("It carries 2 fields: Name, SerialNumber."));
    }

    #[test]
    fn embedding_snippet_humanizes_field_names() {
        let catalog = DomainModelCatalog::default();
        let symbol = device_span();
        let ctx = DescriptionContext {
            symbol: &symbol,
            relative_path: "devices/models/device.cs",
            catalog: &catalog,
        };
        let snippet = ModelDescriptionBuilder.build_summary_for_embedding(&ctx);
        assert!(snippet.contains("serial number string"));
    }
}
