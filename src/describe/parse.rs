//! Lightweight structural parsing of symbol text.
//!
//! Good enough to recover method and property signatures from C#-style
//! declarations without a real parser; the description builders only need
//! names, return types, and property shapes.

/// A parsed method signature.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSig {
    pub name: String,
    pub return_type: Option<String>,
    pub parameters: Vec<String>,
}

/// A parsed property.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySig {
    pub name: String,
    pub type_name: String,
}

const CONTROL_KEYWORDS: &[&str] = &[
    "if", "for", "foreach", "while", "switch", "return", "using", "catch", "lock", "throw", "new",
];

const MODIFIERS: &[&str] = &[
    "public", "private", "protected", "internal", "static", "virtual", "override", "abstract",
    "async", "sealed", "partial", "pub", "fn", "readonly",
];

/// Extract method signatures from symbol text, one per declaration line.
pub fn parse_methods(symbol_text: &str) -> Vec<MethodSig> {
    let mut methods = Vec::new();
    for line in symbol_text.lines() {
        if let Some(sig) = parse_method_line(line) {
            methods.push(sig);
        }
    }
    methods
}

fn parse_method_line(line: &str) -> Option<MethodSig> {
    let trimmed = line.trim();
    if trimmed.starts_with("//") || trimmed.starts_with('*') || trimmed.starts_with('[') {
        return None;
    }

    let open = trimmed.find('(')?;
    let close = trimmed.rfind(')')?;
    if close < open {
        return None;
    }

    let head = &trimmed[..open];
    let mut tokens: Vec<&str> = head.split_whitespace().collect();
    tokens.retain(|t| !MODIFIERS.contains(&t.to_lowercase().as_str()));
    if tokens.is_empty() {
        return None;
    }

    let name = clean_generic(tokens[tokens.len() - 1]);
    if name.is_empty()
        || !name.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_')
        || CONTROL_KEYWORDS.contains(&name.to_lowercase().as_str())
    {
        return None;
    }

    // C# style: the token before the name is the return type. A single
    // token means a constructor or a typeless declaration; skip those.
    let return_type = if tokens.len() >= 2 {
        Some(tokens[tokens.len() - 2].to_string())
    } else {
        return None;
    };
    if return_type
        .as_deref()
        .is_some_and(|t| CONTROL_KEYWORDS.contains(&t.to_lowercase().as_str()))
    {
        return None;
    }

    let parameters = trimmed[open + 1..close]
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();

    Some(MethodSig {
        name,
        return_type,
        parameters,
    })
}

/// Extract `Type Name { get; ... }` style properties.
pub fn parse_properties(symbol_text: &str) -> Vec<PropertySig> {
    let mut props = Vec::new();
    for line in symbol_text.lines() {
        let trimmed = line.trim();
        if !trimmed.contains("{ get") {
            continue;
        }
        let head = match trimmed.find('{') {
            Some(idx) => &trimmed[..idx],
            None => continue,
        };
        let mut tokens: Vec<&str> = head.split_whitespace().collect();
        tokens.retain(|t| !MODIFIERS.contains(&t.to_lowercase().as_str()));
        if tokens.len() < 2 {
            continue;
        }
        props.push(PropertySig {
            name: tokens[tokens.len() - 1].to_string(),
            type_name: tokens[tokens.len() - 2].to_string(),
        });
    }
    props
}

/// Pull the declared name out of an interface/class header line, if any.
pub fn parse_type_name(symbol_text: &str) -> Option<String> {
    for line in symbol_text.lines() {
        let tokens: Vec<&str> = line
            .split(|c: char| c.is_whitespace() || c == '{' || c == ':' || c == '<')
            .filter(|t| !t.is_empty())
            .collect();
        for (i, token) in tokens.iter().enumerate() {
            if matches!(*token, "interface" | "class" | "struct" | "record" | "trait") {
                return tokens.get(i + 1).map(|s| s.to_string());
            }
        }
    }
    None
}

fn clean_generic(token: &str) -> String {
    token.split('<').next().unwrap_or(token).to_string()
}

/// Strip the conventional I-prefix and role suffixes to get the primary
/// entity name: "IDeviceManager" -> "Device".
pub fn primary_entity(type_name: &str) -> String {
    let mut name = type_name;
    if name.len() >= 2
        && name.starts_with('I')
        && name.chars().nth(1).is_some_and(|c| c.is_ascii_uppercase())
    {
        name = &name[1..];
    }
    for suffix in ["Manager", "Repository", "Repo", "Service", "Controller"] {
        if let Some(stripped) = name.strip_suffix(suffix)
            && !stripped.is_empty()
        {
            name = stripped;
            break;
        }
    }
    name.to_string()
}
