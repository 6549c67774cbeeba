use std::env;

use relay_core::llm::{Message, Role};
use textwrap::{wrap, Options};
use unicode_width::UnicodeWidthStr;

use crate::strings::{PREFIX_ASSISTANT, PREFIX_SYSTEM, PREFIX_USER};

const FALLBACK_WIDTH: usize = 100;

/// Width to wrap output at: `COLUMNS` when set, otherwise a fixed fallback.
pub fn terminal_width() -> usize {
    env::var("COLUMNS")
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|w| *w > 0)
        .unwrap_or(FALLBACK_WIDTH)
}

pub fn prefix_for(role: &Role) -> &'static str {
    match role {
        Role::User => PREFIX_USER,
        Role::Assistant => PREFIX_ASSISTANT,
        Role::System => PREFIX_SYSTEM,
    }
}

/// Wraps `text` behind `prefix`; continuation lines are indented to line up.
pub fn wrap_prefixed(prefix: &str, text: &str, width: usize) -> Vec<String> {
    let indent_width = UnicodeWidthStr::width(prefix);
    let width = width.max(indent_width + 1);
    let full = format!("{}{}", prefix, text);
    let indent = " ".repeat(indent_width);
    let opts = Options::new(width).subsequent_indent(&indent);
    wrap(&full, opts)
        .into_iter()
        .map(|c| c.into_owned())
        .collect()
}

pub fn wrap_message(m: &Message, width: usize) -> Vec<String> {
    wrap_prefixed(prefix_for(&m.role), &m.content, width)
}
