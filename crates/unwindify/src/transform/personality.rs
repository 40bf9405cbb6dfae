//! Personality attachment.
//!
//! A header without a personality clause gets one naming
//! `rust_eh_personality`, placed right before the opening brace. A trailing
//! `!dbg !N` attachment stays in front of the inserted clause.

use crate::ir::PointerStyle;
use regex::Regex;
use std::sync::LazyLock;

static PERSONALITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bpersonality\b").expect("personality pattern is valid"));

/// Whether the header already names a personality routine.
pub fn has_personality(header: &str) -> bool {
    PERSONALITY.is_match(header)
}

/// Returns the header with a personality clause inserted, or `None` when the
/// header already has one or does not end in `{`.
pub fn attach(header: &str, style: PointerStyle) -> Option<String> {
    if has_personality(header) {
        return None;
    }

    let trimmed = header.trim_end();
    if !trimmed.ends_with('{') {
        log::warn!("no opening brace at end of header, personality not attached: {header}");
        return None;
    }
    let brace = trimmed.len() - 1;
    let (before, brace_and_rest) = header.split_at(brace);

    let mut rewritten = String::with_capacity(header.len() + 128);
    rewritten.push_str(before);
    if !before.ends_with(char::is_whitespace) {
        rewritten.push(' ');
    }
    rewritten.push_str(style.personality_clause());
    rewritten.push(' ');
    rewritten.push_str(brace_and_rest);
    Some(rewritten)
}
