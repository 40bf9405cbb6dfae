//! Module serializer.
//!
//! Puts the segments back together in order and appends the epilogue
//! declaration, which is also the marker the idempotency guard looks for.

use crate::guard;
use crate::ir::{EpilogueSymbol, Segment};

/// Concatenate `segments` and append the declaration of `epilogue` once.
pub fn generate_module(segments: &[Segment], epilogue: &EpilogueSymbol) -> String {
    let declaration = guard::declaration(epilogue);
    let mut text = String::with_capacity(
        segments.iter().map(segment_len).sum::<usize>() + declaration.len(),
    );

    for segment in segments {
        match segment {
            Segment::Opaque(raw) => text.push_str(raw),
            Segment::Function(func) => {
                for (idx, line) in func.lines.iter().enumerate() {
                    if idx > 0 {
                        text.push('\n');
                    }
                    text.push_str(line);
                }
            }
        }
    }

    text.push_str(&declaration);
    text
}

fn segment_len(segment: &Segment) -> usize {
    match segment {
        Segment::Opaque(raw) => raw.len(),
        Segment::Function(func) => func.lines.iter().map(|l| l.len() + 1).sum(),
    }
}
