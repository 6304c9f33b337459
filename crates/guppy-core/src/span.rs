//! Source locations.
//!
//! The surface parser is an external collaborator: it hands us
//! an AST whose nodes already carry `line`/`col_offset`/`end_line`/
//! `end_col_offset`. We additionally track a byte `TextRange` per node so
//! diagnostics can be rendered with `annotate-snippets` without re-deriving
//! offsets from line/column pairs.

use rowan::{TextRange, TextSize};

/// A source location, as handed to us by the surface parser.
///
/// Carries both the line/column quadruple the external AST exposes and the
/// byte range used internally by the diagnostics renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub range: TextRange,
    pub line: u32,
    pub col_offset: u32,
    pub end_line: u32,
    pub end_col_offset: u32,
}

impl Span {
    pub fn new(range: TextRange, line: u32, col_offset: u32, end_line: u32, end_col_offset: u32) -> Self {
        Self {
            range,
            line,
            col_offset,
            end_line,
            end_col_offset,
        }
    }

    /// A zero-width span at the given byte offset, for synthesized nodes
    /// (e.g. CFG-introduced temporaries) that have no real source location.
    pub fn synthetic(offset: u32) -> Self {
        Self {
            range: TextRange::empty(TextSize::from(offset)),
            line: 0,
            col_offset: 0,
            end_line: 0,
            end_col_offset: 0,
        }
    }

    /// Ordering used by row-reconciliation diagnostics to decide which
    /// definition site is mentioned first ("by source location order").
    pub fn line_col(&self) -> (u32, u32) {
        (self.line, self.col_offset)
    }
}

impl PartialOrd for Span {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Span {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.line_col().cmp(&other.line_col())
    }
}
