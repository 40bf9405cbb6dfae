//! Segment, line and symbol types shared by the splitter, the transformer and
//! the serializer.

use anyhow::{bail, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Epilogue routine invoked when no other symbol is configured. It is an LLVM
/// intrinsic that lowers to nothing.
pub const DEFAULT_EPILOGUE: &str = "llvm.donothing";

/// Prefix of the labels synthesized in front of each instrumented `ret`.
pub const LABEL_PREFIX: &str = "lsda.ret";

/// Name of the shared unwind destination of every instrumented return.
pub const CLEANUP_LABEL: &str = "cleanup";

// ── Segments ─────────────────────────────────────────────────────────────────

/// One piece of a module. Concatenating the raw text of every segment, in
/// order, reproduces the module exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Preamble, declarations, metadata and the newlines framing functions.
    Opaque(String),
    /// A function definition from its `define` line through its closing `}`.
    Function(FunctionBlock),
}

impl Segment {
    /// Raw text of the segment as it would be written back.
    pub fn to_text(&self) -> String {
        match self {
            Segment::Opaque(text) => text.clone(),
            Segment::Function(func) => func.to_text(),
        }
    }
}

/// Lines of one function definition, without their line terminators.
///
/// The first line is always the `define` header and the last is always the
/// closing `}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionBlock {
    pub lines: Vec<String>,
}

impl FunctionBlock {
    /// Split function text (header through closing brace) into lines.
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.split('\n').map(str::to_owned).collect(),
        }
    }

    pub fn header(&self) -> &str {
        self.lines.first().map(String::as_str).unwrap_or_default()
    }

    /// Symbol name of the function, `@` sigil included, for diagnostics.
    pub fn name(&self) -> &str {
        let header = self.header();
        header
            .find('@')
            .map(|at| {
                let rest = &header[at..];
                let end = rest.find('(').unwrap_or(rest.len());
                &rest[..end]
            })
            .unwrap_or("<anonymous>")
    }

    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }
}

// ── Line roles ───────────────────────────────────────────────────────────────

/// Role of a line inside a function, inferred by pattern only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// The `define ... {` line.
    Header,
    /// A line starting with the `cleanup:` label.
    Cleanup,
    /// Any other basic-block label definition.
    Label,
    /// A `ret` instruction.
    Return,
    /// The closing `}` of the function.
    Closing,
    /// Everything else: instructions, blank lines, comments.
    Instruction,
}

static LABEL_DEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:[-a-zA-Z$._0-9]+|"[^"]*"):"#).expect("label pattern is valid")
});

static RETURN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*ret\b").expect("return pattern is valid"));

impl LineKind {
    pub fn classify(line: &str) -> Self {
        if line.starts_with("define ") {
            LineKind::Header
        } else if line.starts_with("cleanup:") {
            LineKind::Cleanup
        } else if LABEL_DEF.is_match(line) {
            LineKind::Label
        } else if RETURN.is_match(line) {
            LineKind::Return
        } else if line == "}" {
            LineKind::Closing
        } else {
            LineKind::Instruction
        }
    }
}

// ── Labels ───────────────────────────────────────────────────────────────────

/// Synthetic basic-block label, derived from the output line index at which
/// its `invoke` is emitted. Indices only grow during a scan, so labels are
/// unique within a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(pub usize);

impl Label {
    /// Text of the label definition line, e.g. `lsda.ret4:`.
    pub fn definition(&self) -> String {
        format!("{self}:")
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", LABEL_PREFIX, self.0)
    }
}

// ── Configuration values ─────────────────────────────────────────────────────

/// Name of the routine invoked at every return site.
///
/// The name is always emitted quoted (`@"name"`), so it may contain dots and
/// other characters that bare LLVM identifiers reject.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EpilogueSymbol(String);

impl EpilogueSymbol {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EpilogueSymbol {
    fn default() -> Self {
        Self(DEFAULT_EPILOGUE.to_string())
    }
}

impl FromStr for EpilogueSymbol {
    type Err = anyhow::Error;

    fn from_str(name: &str) -> Result<Self> {
        if name.is_empty() {
            bail!("epilogue function name must not be empty");
        }
        if let Some(bad) = name.chars().find(|c| matches!(c, '"' | '\\' | '\n' | '\r')) {
            bail!("epilogue function name {name:?} contains {bad:?}, which cannot appear in a quoted LLVM name");
        }
        Ok(Self(name.to_string()))
    }
}

impl fmt::Display for EpilogueSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@\"{}\"", self.0)
    }
}

/// How pointer types are spelled in the synthesized personality clause and
/// landing pad.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PointerStyle {
    /// Typed pointers (`i8*`), as accepted by LLVM up to release 16.
    #[default]
    Typed,
    /// Opaque `ptr`, mandatory from LLVM 17 on.
    Opaque,
}

impl PointerStyle {
    /// Type of the value produced by the synthesized `landingpad`.
    pub fn landing_pad_type(self) -> &'static str {
        match self {
            PointerStyle::Typed => "{ i8*, i32 }",
            PointerStyle::Opaque => "{ ptr, i32 }",
        }
    }

    /// Personality clause naming `rust_eh_personality`.
    pub fn personality_clause(self) -> &'static str {
        match self {
            PointerStyle::Typed => concat!(
                "personality i32 (",
                "i32, ",
                "i32, ",
                "i64, ",
                "%\"unwind::libunwind::_Unwind_Exception\"*, ",
                "%\"unwind::libunwind::_Unwind_Context\"*",
                ")* @rust_eh_personality",
            ),
            PointerStyle::Opaque => "personality ptr @rust_eh_personality",
        }
    }
}
