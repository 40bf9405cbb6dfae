//! unwindify — force an LSDA for every function of a textual LLVM IR module.
//!
//! The code generator only emits unwind tables for functions that might
//! unwind. This crate rewrites a `.ll` module so that every function looks
//! like it can: each gets a personality routine, each return is routed
//! through an `invoke` of an epilogue routine, and each gains a cleanup
//! landing pad for the unwind edge of that invoke. A declaration of the
//! epilogue routine is appended and marks the module as processed.

pub mod codegen;
pub mod guard;
pub mod ir;
pub mod parser;
pub mod transform;

use codegen::generate_module;
use ir::{EpilogueSymbol, PointerStyle, Segment};
use parser::split_module;
use transform::transform_function;

/// Configuration options for a rewrite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Routine invoked in front of every `ret`
    pub epilogue: EpilogueSymbol,
    /// Spelling of pointer types in the synthesized personality and landing pad
    pub pointers: PointerStyle,
}

/// Counters describing what a rewrite changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    pub functions: usize,
    pub personalities_attached: usize,
    pub returns_instrumented: usize,
    pub landing_pads_added: usize,
}

/// Result of [`rewrite`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The module was rewritten; `text` replaces the original.
    Rewritten { text: String, stats: RewriteStats },
    /// The module already carries the declaration for this epilogue routine
    /// and must be left as is.
    AlreadyProcessed,
}

/// Rewrite a textual LLVM IR module.
///
/// This is the main entry point: idempotency check, split, per-function
/// transform, then serialization.
///
/// # Example
/// ```
/// use unwindify::{rewrite, Outcome, RewriteOptions};
///
/// let ll = "define void @f() {\nstart:\n  ret void\n}\n";
/// let Outcome::Rewritten { text, .. } = rewrite(ll, &RewriteOptions::default()) else {
///     panic!("fresh module");
/// };
/// assert!(text.ends_with("\ndeclare void @\"llvm.donothing\"()"));
/// assert_eq!(rewrite(&text, &RewriteOptions::default()), Outcome::AlreadyProcessed);
/// ```
pub fn rewrite(text: &str, options: &RewriteOptions) -> Outcome {
    if guard::is_processed(text, &options.epilogue) {
        log::debug!("module already declares {}", options.epilogue);
        return Outcome::AlreadyProcessed;
    }

    let mut stats = RewriteStats::default();
    let segments: Vec<Segment> = split_module(text)
        .into_iter()
        .map(|segment| match segment {
            Segment::Function(func) => {
                let out = transform_function(&func, options);
                log::debug!(
                    "{}: personality {}, {} return(s) instrumented, landing pad {}",
                    func.name(),
                    if out.personality_attached { "attached" } else { "kept" },
                    out.returns_instrumented,
                    if out.landing_pad_added { "added" } else { "kept" },
                );
                stats.functions += 1;
                stats.personalities_attached += usize::from(out.personality_attached);
                stats.returns_instrumented += out.returns_instrumented;
                stats.landing_pads_added += usize::from(out.landing_pad_added);
                Segment::Function(out.block)
            }
            opaque => opaque,
        })
        .collect();

    let text = generate_module(&segments, &options.epilogue);
    Outcome::Rewritten { text, stats }
}
