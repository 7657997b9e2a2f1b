//! Descriptions for manager, service and repository classes: behavior
//! first, shaped around method atoms like the interface builder.

use super::parse::{parse_methods, parse_type_name, primary_entity};
use super::verbs::{map_verb, method_atom, split_leading_token, strip_async_suffix, verb_class, VerbClass};
use super::{DescriptionBuilder, DescriptionContext};
use std::collections::HashSet;
use std::fmt::Write;

const MAX_METHODS: usize = 50;

pub struct ManagerDescriptionBuilder;

impl ManagerDescriptionBuilder {
    fn type_name(ctx: &DescriptionContext<'_>) -> String {
        if !ctx.symbol.name.is_empty() {
            return ctx.symbol.name.clone();
        }
        parse_type_name(&ctx.symbol.text).unwrap_or_else(|| "component".to_string())
    }

    fn role(name: &str) -> &'static str {
        let lowered = name.to_lowercase();
        if lowered.contains("repo") {
            "repository"
        } else if lowered.contains("service") {
            "service"
        } else {
            "manager"
        }
    }
}

impl DescriptionBuilder for ManagerDescriptionBuilder {
    fn build_summary_for_embedding(&self, ctx: &DescriptionContext<'_>) -> String {
        let name = Self::type_name(ctx);
        let entity = primary_entity(&name);

        let mut out = format!("{} {} {}", name, Self::role(&name), entity);
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

    fn build_summary_for_model(&self, ctx: &DescriptionContext<'_>) -> String {
        let name = Self::type_name(ctx);
        let mut out = String::new();
        let _ = writeln!(out, "{}: {}", capitalize(Self::role(&name)), name);
        let _ = writeln!(out, "Path: {}", ctx.relative_path);
        let _ = writeln!(out, "OperatesOn: {}", primary_entity(&name));

        let methods = parse_methods(&ctx.symbol.text);
        if !methods.is_empty() {
            out.push('\n');
            out.push_str("Operations:\n");
            let mut seen = HashSet::new();
            for method in methods.iter().take(MAX_METHODS) {
                let atom = method_atom(&method.name, method.return_type.as_deref(), &method.parameters);
                if atom.is_empty() || !seen.insert(atom.to_lowercase()) {
                    continue;
                }
                let _ = writeln!(out, "- {} :: {}", method.name, atom);
            }
        }
        out.trim_end().to_string()
    }

    fn build_summary_for_human(&self, ctx: &DescriptionContext<'_>) -> String {
        let name = Self::type_name(ctx);
        let entity = primary_entity(&name);
        let role = Self::role(&name);
        let methods = parse_methods(&ctx.symbol.text);

        let (mut reads, mut writes) = (0usize, 0usize);
        for method in &methods {
            let (lead, _) = split_leading_token(strip_async_suffix(&method.name));
            match verb_class(&map_verb(lead)) {
                VerbClass::Query => reads += 1,
                VerbClass::Command => writes += 1,
            }
        }

        let mut out = format!(
            "{} is the {} responsible for {} records, exposing {} operations ({} read, {} write).",
            name,
            role,
            entity,
            methods.len(),
            reads,
            writes
        );
        if let Some(domain) = ctx.catalog.domain_for_model(&entity) {
            let _ = write!(out, " {} belongs to the {} domain.", entity, domain.name);
        }
        out
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
