//! Shortcode expansion.
//!
//! Shortcodes are inline tokens (`{{name key="value"}}`, or `[name ...]` in
//! HTML sources) that are replaced by the output of a registered service.

mod engine;
mod parser;
mod registry;

pub use engine::{
    error_marker, expand_stashed, process_shortcodes, render_shortcode, stash_shortcodes,
};
pub use parser::{decode_entities, parse_args, parse_attributes};
pub use registry::ShortcodeRegistry;
