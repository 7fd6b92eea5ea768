//! Inline rendering used when a theme has no template for a block or page.

use std::collections::BTreeMap;

use crate::content::{Block, html_escape};
use crate::menu::MenuRegistry;

/// Render a block wrapper without a template.
///
/// `<div class="service-block {class}" {attrs}><h4 class="block-title">...`
pub fn block_html(block: &Block) -> String {
    let class = block
        .class()
        .map(|c| format!("service-block {}", html_escape(c)))
        .unwrap_or_else(|| "service-block".to_string());

    let mut html = format!(
        "<div class=\"{class}\"{}>",
        extra_attrs(&block.attributes)
    );
    if block.show_title
        && let Some(title) = &block.title
    {
        html.push_str(&format!(
            "<h4 class=\"block-title\">{}</h4>",
            html_escape(title)
        ));
    }
    html.push_str(&block.content);
    html.push_str("</div>");
    html
}

/// Render a minimal page document without a template.
pub fn page_html(title: &str, content: &str, menus: &MenuRegistry) -> String {
    let mut nav = String::new();
    for menu_id in menus.menu_ids() {
        nav.push_str(&format!(
            "<nav class=\"menu menu--{}\"><ul>",
            html_escape(menu_id)
        ));
        for item in menus.menu(menu_id) {
            nav.push_str(&format!(
                "<li><a href=\"{}\">{}</a></li>",
                html_escape(&item.uri),
                html_escape(&item.label)
            ));
        }
        nav.push_str("</ul></nav>");
    }

    let title = html_escape(title);
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n</head>\n<body>\n{nav}\n<main>\n<h1>{title}</h1>\n{content}\n\
         </main>\n</body>\n</html>\n"
    )
}

/// Attributes other than `class`, with unusable names dropped.
fn extra_attrs(attributes: &BTreeMap<String, String>) -> String {
    attributes
        .iter()
        .filter(|(k, _)| *k != "class" && is_attribute_name(k))
        .map(|(k, v)| format!(" {}=\"{}\"", k, html_escape(v)))
        .collect()
}

fn is_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'))
}
