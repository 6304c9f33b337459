use crate::span::Span;
use std::fmt;

/// Severity of a single diagnostic.
///
/// This pipeline never downgrades an error to a warning after the fact;
/// the variant chosen at `.error()`/`.warning()` time is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A suggested textual replacement attached to a diagnostic.
#[derive(Debug, Clone)]
pub struct Fix {
    pub message: String,
    pub span: Span,
    pub replacement: String,
}

/// A secondary span with its own message, e.g. "first use was here".
#[derive(Debug, Clone)]
pub struct RelatedInfo {
    pub message: String,
    pub span: Span,
}

/// A single compiler diagnostic.
#[derive(Debug, Clone)]
pub struct DiagnosticMessage {
    pub severity: Severity,
    pub message: String,
    pub span: Span,
    pub related: Vec<RelatedInfo>,
    pub fix: Option<Fix>,
    /// Set for internal invariant violations, so bug
    /// reports can be filtered from ordinary user-facing diagnostics.
    pub internal: bool,
}

impl fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {:?}: {}",
            self.severity, self.span.range, self.message
        )?;
        if let Some(fix) = &self.fix {
            write!(f, " (fix: {})", fix.message)?;
        }
        for rel in &self.related {
            write!(f, " ({})", rel.message)?;
        }
        Ok(())
    }
}
