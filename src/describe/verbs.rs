//! Operation-semantics detection from method names.
//!
//! Purely structural: a method name is split on camel-case boundaries, its
//! leading token is mapped through a fixed verb table, and the remainder
//! becomes the subject. No language model involved at this tier.

/// Canonical verb plus whether it reads or mutates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbClass {
    Query,
    Command,
}

const VERB_MAP: &[(&str, &str)] = &[
    // CRUD-ish
    ("create", "create"),
    ("add", "create"),
    ("insert", "create"),
    ("register", "create"),
    ("get", "read"),
    ("find", "read"),
    ("fetch", "read"),
    ("load", "read"),
    ("read", "read"),
    ("update", "update"),
    ("set", "update"),
    ("save", "update"),
    ("rename", "update"),
    ("mark", "mark"),
    ("approve", "approve"),
    ("disable", "disable"),
    ("enable", "enable"),
    ("clear", "clear"),
    ("reset", "reset"),
    ("delete", "delete"),
    ("remove", "delete"),
    ("revoke", "delete"),
    ("list", "list"),
    ("search", "search"),
    ("query", "query"),
    ("count", "count"),
    // Workflow verbs keep their own identity, not coerced into CRUD
    ("begin", "begin"),
    ("complete", "complete"),
    ("handle", "handle"),
    ("confirm", "confirm"),
    ("verify", "verify"),
    ("accept", "accept"),
    ("consume", "consume"),
    ("rotate", "rotate"),
];

const QUERY_VERBS: &[&str] = &["read", "list", "search", "query", "count", "verify"];

/// Strip a trailing `Async` suffix, common in ported interface names.
pub fn strip_async_suffix(name: &str) -> &str {
    name.strip_suffix("Async").unwrap_or(name)
}

/// Split a camel-case name into its leading token and the remainder:
/// "GetUserById" -> ("Get", "UserById").
pub fn split_leading_token(name: &str) -> (&str, &str) {
    let mut boundary = name.len();
    for (i, c) in name.char_indices().skip(1) {
        if c.is_ascii_uppercase() {
            boundary = i;
            break;
        }
    }
    name.split_at(boundary)
}

/// Map a leading token to its canonical verb; unknown tokens pass through
/// lowercased.
pub fn map_verb(lead_token: &str) -> String {
    let lowered = lead_token.to_lowercase();
    VERB_MAP
        .iter()
        .find(|(from, _)| *from == lowered)
        .map(|(_, to)| to.to_string())
        .unwrap_or(lowered)
}

pub fn verb_class(verb: &str) -> VerbClass {
    if QUERY_VERBS.contains(&verb) {
        VerbClass::Query
    } else {
        VerbClass::Command
    }
}

/// Space out a camel-case remainder: "UserById" -> "user by id".
pub fn humanize_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.char_indices() {
        if c.is_ascii_uppercase() && i > 0 {
            out.push(' ');
        }
        out.push(c.to_ascii_lowercase());
    }
    out.trim().to_string()
}

/// Compact "verb subject -> return-shape" line for one method.
///
/// Subject preference: the name remainder after the verb token, then the
/// first parameter's type, then the de-Async'd stem. A name containing
/// "Count" forces the count verb regardless of its leading token.
pub fn method_atom(name: &str, return_type: Option<&str>, parameters: &[String]) -> String {
    let stem = strip_async_suffix(name);
    if stem.is_empty() {
        return String::new();
    }

    let (lead, remainder) = split_leading_token(stem);
    let mut verb = map_verb(lead);

    if verb != "count" && stem.to_lowercase().contains("count") {
        verb = "count".to_string();
    }

    let subject = if !remainder.is_empty() {
        humanize_camel(remainder)
    } else if let Some(param_type) = first_parameter_type(parameters) {
        humanize_camel(&param_type)
    } else {
        humanize_camel(stem)
    };

    let mut atom = format!("{} {}", verb, subject);
    if let Some(shape) = return_type.map(normalize_return_shape).filter(|s| !s.is_empty()) {
        atom.push_str(" -> ");
        atom.push_str(&shape);
    }
    atom.trim().to_string()
}

/// Type token of the first parameter, generics stripped: "List<Device> devices" -> "List".
fn first_parameter_type(parameters: &[String]) -> Option<String> {
    let first = parameters.first()?;
    let token = first.split_whitespace().next()?;
    let base = token.split('<').next().unwrap_or(token).trim();
    if base.is_empty() {
        None
    } else {
        Some(base.to_string())
    }
}

/// Reduce a return type to its interesting core: wrapper types like
/// Task<...> and InvokeResult<...> are peeled, void-ish shapes vanish.
pub fn normalize_return_shape(return_type: &str) -> String {
    let mut shape = return_type.trim();
    loop {
        let lowered = shape.to_lowercase();
        if lowered.is_empty() || lowered == "void" || lowered == "task" || lowered == "()" {
            return String::new();
        }
        let peeled = peel_wrapper(shape, &["Task", "ValueTask", "InvokeResult", "Result", "Option"]);
        if peeled == shape {
            break;
        }
        shape = peeled;
    }
    shape.to_string()
}

fn peel_wrapper<'a>(shape: &'a str, wrappers: &[&str]) -> &'a str {
    for wrapper in wrappers {
        if let Some(rest) = shape.strip_prefix(wrapper)
            && let Some(inner) = rest.strip_prefix('<')
            && let Some(inner) = inner.strip_suffix('>')
        {
            return inner.trim();
        }
    }
    shape
}
