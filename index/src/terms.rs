use std::collections::BTreeSet;
use serde_json::Value;

/// Expands `value` into the set of terms it is indexed under: the raw value, its lowercase form
/// if that differs, the domain part of any `@`-separated value, and every whitespace-token beyond
/// the first.
pub fn expand_terms(value: &str) -> BTreeSet<String> {
    let mut terms = BTreeSet::new();
    terms.insert(value.to_owned());

    let lower = value.to_lowercase();
    if lower != value {
        terms.insert(lower);
    }

    if let Some(at) = value.find('@') {
        let domain = &value[at + 1..];
        if !domain.is_empty() {
            terms.insert(domain.to_owned());
        }
    }

    let mut tokens = value.split_whitespace();
    tokens.next();
    for token in tokens {
        terms.insert(token.to_owned());
    }

    terms
}

/// Navigates `doc` along a dotted `field_path` (e.g. `props.name`) and returns the string value
/// found there, if any.
pub fn extract_field<'a>(doc: &'a Value, field_path: &str) -> Option<&'a str> {
    let mut current = doc;
    for segment in field_path.split('.') {
        current = current.get(segment)?;
    }
    current.as_str()
}
