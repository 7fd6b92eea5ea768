//! Shortcode attribute parsing.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use agnstk_sdk::RenderArgs;
use regex::Regex;

/// One `key="value"` or `key='value'` pair at the start of the input.
#[allow(clippy::expect_used)]
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^([\w-]+)\s*=\s*(?:"((?:[^"\\]|\\.)*)"|'((?:[^'\\]|\\.)*)')"#)
        .expect("attribute pattern")
});

/// Parse a shortcode attribute string.
///
/// Returns `None` when the string is not entirely made of whitespace
/// separated, quoted pairs. Later duplicates win.
pub fn parse_attributes(input: &str) -> Option<BTreeMap<String, String>> {
    let mut attributes = BTreeMap::new();
    let mut rest = input.trim_start();

    while !rest.is_empty() {
        let caps = ATTRIBUTE.captures(rest)?;
        let whole = caps.get(0)?;
        let key = caps.get(1)?.as_str();
        let raw = caps.get(2).or_else(|| caps.get(3))?.as_str();
        attributes.insert(key.to_string(), unescape(raw));

        rest = &rest[whole.end()..];
        // Pairs must be separated by whitespace
        if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
            return None;
        }
        rest = rest.trim_start();
    }

    Some(attributes)
}

/// Parse an attribute string into render arguments.
///
/// `class` is a wrapper attribute and goes to `attributes`; everything else
/// is a parameter.
pub fn parse_args(input: &str) -> Option<RenderArgs> {
    let mut args = RenderArgs::new();
    for (key, value) in parse_attributes(input)? {
        if key == "class" {
            args.attributes.insert(key, value);
        } else {
            args.params.insert(key, value);
        }
    }
    Some(args)
}

/// Undo the entity escaping the markdown converter applies to text.
pub fn decode_entities(input: &str) -> String {
    input
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Drop the backslash from escaped characters.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}
