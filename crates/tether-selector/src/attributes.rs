//! Attribute name extraction.
//!
//! Scans a selector for `[name]`, `[name=value]`, `[name|=value]` and friends,
//! keeping only the attribute names.

use std::sync::LazyLock;

use regex::Regex;

/// Quoted attribute values, removed before scanning so brackets inside
/// strings never look like predicates.
static QUOTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'"#).unwrap());

/// Opening bracket followed by the attribute name, up to the first operator,
/// whitespace or closing bracket. Backslash escapes belong to the name.
static ATTRIBUTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[\s*((?:\\.|[^\s\]=~|^$*!"'\[\\])+)"#).unwrap());

/// Extract attribute names referenced by a selector's attribute predicates.
///
/// Names are returned in order of first occurrence without duplicates.
/// Operators and values are ignored. Selectors without attribute predicates
/// yield an empty list, which callers treat as "observe every attribute".
///
/// The function never fails: malformed input yields whatever well-formed
/// predicates can be recognized.
///
/// # Example
///
/// ```
/// use tether_selector::extract_attributes;
///
/// assert_eq!(extract_attributes("[open], details[open][lang|=en]"), vec!["open", "lang"]);
/// assert!(extract_attributes("div.card").is_empty());
/// ```
#[must_use]
pub fn extract_attributes(selector: &str) -> Vec<String> {
    let stripped = QUOTED_RE.replace_all(selector, "\"\"");
    let mut names: Vec<String> = Vec::new();

    for caps in ATTRIBUTE_RE.captures_iter(&stripped) {
        let name = unescape(&caps[1]);
        if !names.contains(&name) {
            names.push(name);
        }
    }

    names
}

/// Drop CSS backslash escapes, keeping the escaped character.
fn unescape(raw: &str) -> String {
    let mut name = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => name.extend(chars.next()),
            c => name.push(c),
        }
    }
    name
}
