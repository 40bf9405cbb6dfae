//! Module splitter.
//!
//! Partitions module text into opaque text and function definitions by
//! looking for two literal delimiters: `define ` at the start of a line, and
//! a line holding nothing but `}`. This is a structural split, not an IR
//! parser. Nested functions, or a body containing a lone `}` line inside a
//! string or metadata, are not supported and split arbitrarily.

use crate::ir::{FunctionBlock, Segment};

const DEFINE: &str = "define ";
const CLOSING: &str = "\n}";

/// Split `text` into segments whose concatenation equals `text`.
///
/// The newline in front of a `define` and the newline after its closing `}`
/// stay in the surrounding opaque segments.
pub fn split_module(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut opaque_start = 0;

    while let Some(start) = find_define(text, opaque_start) {
        let Some(end) = find_closing(text, start) else {
            break;
        };
        if start > opaque_start {
            segments.push(Segment::Opaque(text[opaque_start..start].to_string()));
        }
        segments.push(Segment::Function(FunctionBlock::from_text(&text[start..end])));
        opaque_start = end;
    }

    if opaque_start < text.len() {
        segments.push(Segment::Opaque(text[opaque_start..].to_string()));
    }
    segments
}

/// Byte offset of the next `define ` that begins a line, searching from `from`.
fn find_define(text: &str, from: usize) -> Option<usize> {
    if from == 0 && text.starts_with(DEFINE) {
        return Some(0);
    }
    let needle = "\ndefine ";
    text[from..].find(needle).map(|pos| from + pos + 1)
}

/// Byte offset just past the `}` of the first lone-brace line after `start`.
fn find_closing(text: &str, start: usize) -> Option<usize> {
    let mut cursor = start;
    while let Some(pos) = text[cursor..].find(CLOSING) {
        let end = cursor + pos + CLOSING.len();
        match text.as_bytes().get(end) {
            None | Some(b'\n') => return Some(end),
            Some(_) => cursor = cursor + pos + 1,
        }
    }
    None
}
