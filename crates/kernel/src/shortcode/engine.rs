//! Single-pass shortcode substitution.
//!
//! HTML sources are expanded in place. Markdown sources are stashed first:
//! each registered token is swapped for an opaque placeholder before
//! conversion and expanded from its original text afterwards, so the
//! converter never touches attribute values.

use std::borrow::Cow;
use std::sync::{Arc, LazyLock};

use agnstk_sdk::{RenderArgs, RenderError, Renderable};
use regex::{Captures, Regex};
use tracing::{debug, warn};

use super::parser::{decode_entities, parse_args};
use super::registry::ShortcodeRegistry;
use crate::content::SourceFormat;

/// `{{name attrs}}`. Attribute strings may not contain braces.
#[allow(clippy::expect_used)]
static BRACE_ONLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{(?P<brace>[A-Za-z0-9_]+)(?P<brace_attrs>\s[^{}]*)?\}\}")
        .expect("brace shortcode pattern")
});

/// `{{name attrs}}` or `[name attrs]`, matched in one scan so that output of
/// one syntax is never rescanned by the other.
#[allow(clippy::expect_used)]
static BRACE_OR_BRACKET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\{\{(?P<brace>[A-Za-z0-9_]+)(?P<brace_attrs>\s[^{}]*)?\}\}|\[(?P<bracket>[A-Za-z0-9_]+)(?P<bracket_attrs>\s[^\[\]]*)?\]",
    )
    .expect("shortcode pattern")
});

/// A hex-encoded token between two private-use characters. Markdown,
/// sanitising and escaping all leave it alone.
#[allow(clippy::expect_used)]
static STASHED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x{E000}(?P<hex>(?:[0-9a-f]{2})+)\x{E001}").expect("stash pattern")
});

const STASH_OPEN: char = '\u{E000}';
const STASH_CLOSE: char = '\u{E001}';

/// Expand every registered shortcode in `content`.
///
/// Markdown-sourced content only honours the brace syntax, since
/// `[text](url)` would otherwise be read as a shortcode. Tokens with an
/// unknown name or a malformed attribute string are left untouched. Handler
/// output is inserted as-is and never scanned again. Handler errors are
/// logged and replaced by an inline marker; they never reach the caller.
pub fn process_shortcodes(
    content: &str,
    registry: &ShortcodeRegistry,
    format: SourceFormat,
) -> String {
    if registry.is_empty() {
        return content.to_string();
    }

    let pattern = match format {
        SourceFormat::Markdown => &*BRACE_ONLY,
        SourceFormat::Html => &*BRACE_OR_BRACKET,
    };

    pattern
        .replace_all(content, |caps: &Captures<'_>| {
            expand(caps, registry, format)
        })
        .into_owned()
}

/// Replace each registered, well-formed brace shortcode in markdown source
/// with a placeholder.
///
/// Unregistered and malformed tokens stay in the text. The placeholders are
/// rendered by [`expand_stashed`] once the markdown has been converted.
pub fn stash_shortcodes(content: &str, registry: &ShortcodeRegistry) -> String {
    if registry.is_empty() {
        return content.to_string();
    }

    BRACE_ONLY
        .replace_all(content, |caps: &Captures<'_>| {
            let token = caps.get(0).map_or("", |m| m.as_str());
            match lookup(caps, registry, false) {
                Some(_) => stash(token),
                None => token.to_string(),
            }
        })
        .into_owned()
}

/// Render the placeholders left by [`stash_shortcodes`].
///
/// Each token is parsed from its original source text. Handler output is
/// inserted as-is and never scanned again.
pub fn expand_stashed(html: &str, registry: &ShortcodeRegistry) -> String {
    STASHED
        .replace_all(html, |caps: &Captures<'_>| {
            let placeholder = caps.get(0).map_or("", |m| m.as_str());
            let Some(token) = caps.name("hex").and_then(|m| unstash(m.as_str())) else {
                return placeholder.to_string();
            };
            // Anything that is not a whole registered token stays opaque.
            let Some(inner) = BRACE_ONLY.captures(&token) else {
                return placeholder.to_string();
            };
            if inner.get(0).map(|m| m.as_str()) != Some(token.as_str()) {
                return placeholder.to_string();
            }
            match lookup(&inner, registry, false) {
                Some((name, handler, args)) => {
                    render_with(name, handler, &args, SourceFormat::Markdown)
                }
                None => placeholder.to_string(),
            }
        })
        .into_owned()
}

fn stash(token: &str) -> String {
    let mut out = String::with_capacity(token.len() * 2 + 8);
    out.push(STASH_OPEN);
    for byte in token.bytes() {
        out.push_str(&format!("{byte:02x}"));
    }
    out.push(STASH_CLOSE);
    out
}

fn unstash(hex: &str) -> Option<String> {
    let bytes = hex
        .as_bytes()
        .chunks(2)
        .map(|pair| {
            let pair = std::str::from_utf8(pair).ok()?;
            u8::from_str_radix(pair, 16).ok()
        })
        .collect::<Option<Vec<u8>>>()?;
    String::from_utf8(bytes).ok()
}

/// Render a shortcode by name, for templates.
///
/// Returns `None` when no handler is registered under `name`.
pub fn render_shortcode(
    name: &str,
    args: &RenderArgs,
    registry: &ShortcodeRegistry,
) -> Option<Result<String, RenderError>> {
    registry.get(name).map(|handler| handler.render(args))
}

/// The inline marker substituted for a failed handler.
pub fn error_marker(name: &str, format: SourceFormat) -> String {
    match format {
        SourceFormat::Markdown => format!("**[shortcode error: {name}]**"),
        SourceFormat::Html => "[shortcode error]".to_string(),
    }
}

fn expand(caps: &Captures<'_>, registry: &ShortcodeRegistry, format: SourceFormat) -> String {
    // Markdown output has its quotes entity-escaped.
    match lookup(caps, registry, format == SourceFormat::Markdown) {
        Some((name, handler, args)) => render_with(name, handler, &args, format),
        None => caps.get(0).map_or("", |m| m.as_str()).to_string(),
    }
}

/// Name, handler and arguments for a matched token, or `None` when the
/// token must be left verbatim.
fn lookup<'c, 'r>(
    caps: &Captures<'c>,
    registry: &'r ShortcodeRegistry,
    decode: bool,
) -> Option<(&'c str, &'r Arc<dyn Renderable>, RenderArgs)> {
    let (name, attrs) = match (caps.name("brace"), caps.name("bracket")) {
        (Some(name), _) => (name.as_str(), caps.name("brace_attrs")),
        (None, Some(name)) => (name.as_str(), caps.name("bracket_attrs")),
        (None, None) => return None,
    };
    let attrs = attrs.map_or("", |m| m.as_str());

    let Some(handler) = registry.get(name) else {
        debug!(shortcode = %name, "unregistered shortcode left in place");
        return None;
    };

    let attrs: Cow<'_, str> = if decode {
        Cow::Owned(decode_entities(attrs))
    } else {
        Cow::Borrowed(attrs)
    };

    let Some(args) = parse_args(&attrs) else {
        debug!(shortcode = %name, attributes = %attrs, "malformed shortcode left in place");
        return None;
    };

    Some((name, handler, args))
}

fn render_with(
    name: &str,
    handler: &Arc<dyn Renderable>,
    args: &RenderArgs,
    format: SourceFormat,
) -> String {
    match handler.render(args) {
        Ok(html) => html,
        Err(e) => {
            warn!(shortcode = %name, error = %e, "shortcode handler failed");
            error_marker(name, format)
        }
    }
}
