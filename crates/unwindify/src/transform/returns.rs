//! Return-site instrumentation and cleanup landing-pad synthesis.
//!
//! One forward pass over the body builds a fresh line list. Every `ret` is
//! preceded by an `invoke` of the epilogue routine and a label the invoke
//! continues to:
//!
//! ```text
//!   invoke void @"llvm.donothing"() to label %lsda.ret4 unwind label %cleanup
//! lsda.ret4:
//!   ret void
//! ```
//!
//! If no `cleanup:` block exists afterwards, one is appended before the
//! closing brace. A function is assumed to hold at most one `cleanup:` label.

use crate::ir::{EpilogueSymbol, Label, LineKind, PointerStyle, CLEANUP_LABEL};

/// Value name bound by the synthesized `landingpad`.
const EXCEPTION_VALUE: &str = "%lsda.exn";

/// Result of scanning one function body.
#[derive(Debug, Default)]
pub struct ScanOutput {
    pub lines: Vec<String>,
    pub returns_instrumented: usize,
    pub landing_pad_added: bool,
}

/// Rewrite `body` (every line after the header, closing brace included),
/// appending to `lines`, which already holds the rewritten header.
pub fn instrument(
    mut lines: Vec<String>,
    body: &[String],
    epilogue: &EpilogueSymbol,
    pointers: PointerStyle,
) -> ScanOutput {
    let mut returns_instrumented = 0;
    let mut has_cleanup = false;

    for line in body {
        match LineKind::classify(line) {
            LineKind::Return => {
                // Index of the invoke line in the output; it already accounts
                // for every line inserted earlier in this scan.
                let label = Label(lines.len());
                let indent = &line[..line.len() - line.trim_start().len()];
                lines.push(format!(
                    "{indent}invoke void {epilogue}() to label %{label} unwind label %{CLEANUP_LABEL}"
                ));
                lines.push(label.definition());
                returns_instrumented += 1;
            }
            LineKind::Cleanup => has_cleanup = true,
            _ => {}
        }
        lines.push(line.clone());
    }

    let landing_pad_added = !has_cleanup;
    if landing_pad_added {
        let ends_with_brace = lines
            .last()
            .is_some_and(|last| LineKind::classify(last) == LineKind::Closing);
        let closing = if ends_with_brace { lines.pop() } else { None };
        lines.extend(landing_pad(pointers));
        lines.extend(closing);
    }

    ScanOutput {
        lines,
        returns_instrumented,
        landing_pad_added,
    }
}

/// The three lines of the shared cleanup-only landing pad.
pub fn landing_pad(pointers: PointerStyle) -> [String; 3] {
    let ty = pointers.landing_pad_type();
    [
        format!("{CLEANUP_LABEL}:"),
        format!("  {EXCEPTION_VALUE} = landingpad {ty} cleanup"),
        format!("  resume {ty} {EXCEPTION_VALUE}"),
    ]
}
