//! Line-level view of a textual LLVM IR module.
//!
//! The rewrite never parses instructions. A module is a sequence of
//! [`Segment`]s, and a function is a sequence of lines whose role is inferred
//! from a handful of literal patterns (see [`LineKind`]).

mod types;
pub use types::*;
