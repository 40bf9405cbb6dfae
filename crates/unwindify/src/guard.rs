//! Idempotency guard.
//!
//! The declaration appended for the epilogue symbol doubles as the marker of
//! an already rewritten module. [`declaration`] is the single source of that
//! text, used both here and by the serializer.

use crate::ir::EpilogueSymbol;

/// Declaration line appended to every rewritten module, leading newline
/// included.
pub fn declaration(epilogue: &EpilogueSymbol) -> String {
    format!("\ndeclare void {epilogue}()")
}

/// Whether `text` was already rewritten for `epilogue`.
pub fn is_processed(text: &str, epilogue: &EpilogueSymbol) -> bool {
    text.contains(&declaration(epilogue))
}
