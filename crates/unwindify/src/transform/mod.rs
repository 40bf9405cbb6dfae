//! Function transformer.
//!
//! Rewrites one function so that the code generator has to emit an LSDA for
//! it: the header gains a personality clause, every return goes through an
//! `invoke` of the epilogue routine, and a cleanup landing pad catches the
//! unwind edge of those invokes. Input is trusted; malformed lines pass
//! through unchanged.

use crate::ir::FunctionBlock;
use crate::RewriteOptions;

// ── Steps ────────────────────────────────────────────────────────────────────
pub mod personality;
pub mod returns;

/// A rewritten function and what was done to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    pub block: FunctionBlock,
    pub personality_attached: bool,
    pub returns_instrumented: usize,
    pub landing_pad_added: bool,
}

/// Rewrite `func` for the epilogue routine and pointer style in `options`.
pub fn transform_function(func: &FunctionBlock, options: &RewriteOptions) -> Transformed {
    let Some((header, body)) = func.lines.split_first() else {
        return Transformed {
            block: func.clone(),
            personality_attached: false,
            returns_instrumented: 0,
            landing_pad_added: false,
        };
    };

    let attached = personality::attach(header, options.pointers);
    let personality_attached = attached.is_some();

    let mut lines = Vec::with_capacity(func.lines.len() + 8);
    lines.push(attached.unwrap_or_else(|| header.clone()));

    let scan = returns::instrument(lines, body, &options.epilogue, options.pointers);

    Transformed {
        block: FunctionBlock { lines: scan.lines },
        personality_attached,
        returns_instrumented: scan.returns_instrumented,
        landing_pad_added: scan.landing_pad_added,
    }
}

// ── transform_function tests ─────────────────────────────────────────────────
