//! Table naming helpers.
//!
//! Pure functions deriving a table name from a model name: snake case, then
//! pluralise the last word.

use convert_case::{Case, Casing};

const IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("mouse", "mice"),
];

/// Converts `BlogPost` or `Admin::HTTPRequest` to `blog_post` / `admin_http_request`.
pub fn snake_case(name: &str) -> String {
    name.replace("::", "_").to_case(Case::Snake)
}

/// Pluralises the last word of a snake_case name.
pub fn pluralize(word: &str) -> String {
    let (head, last) = match word.rfind('_') {
        Some(pos) => word.split_at(pos + 1),
        None => ("", word),
    };

    if let Some((_, plural)) = IRREGULAR_PLURALS.iter().find(|(s, _)| *s == last) {
        return format!("{head}{plural}");
    }

    let plural = if ["s", "x", "z", "ch", "sh"].iter().any(|s| last.ends_with(s)) {
        format!("{last}es")
    } else if let Some(stem) = last.strip_suffix('y') {
        if stem.ends_with(['a', 'e', 'i', 'o', 'u']) {
            format!("{last}s")
        } else {
            format!("{stem}ies")
        }
    } else {
        format!("{last}s")
    };

    format!("{head}{plural}")
}

/// Derives the table name for a model, optionally prefixed by a namespace.
pub fn table_name(model: &str, namespace: Option<&str>) -> String {
    let base = pluralize(&snake_case(model));
    match namespace.filter(|ns| !ns.is_empty()) {
        Some(ns) => format!("{ns}_{base}"),
        None => base,
    }
}
