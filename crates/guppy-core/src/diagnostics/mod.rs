//! The single diagnostic channel every pass reports through.

mod message;
mod printer;

pub use message::{DiagnosticMessage, Fix, RelatedInfo, Severity};
pub use printer::DiagnosticsPrinter;

use crate::span::Span;

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    messages: Vec<DiagnosticMessage>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn error(&mut self, message: impl Into<String>, span: Span) -> DiagnosticBuilder<'_> {
        DiagnosticBuilder::new(self, Severity::Error, message.into(), span)
    }

    #[must_use]
    pub fn warning(&mut self, message: impl Into<String>, span: Span) -> DiagnosticBuilder<'_> {
        DiagnosticBuilder::new(self, Severity::Warning, message.into(), span)
    }

    /// Records an internal invariant violation, kept
    /// in the same channel but flagged so it can be filtered out of
    /// user-facing error listings.
    #[must_use]
    pub fn bug(&mut self, message: impl Into<String>, span: Span) -> DiagnosticBuilder<'_> {
        let mut builder = DiagnosticBuilder::new(self, Severity::Error, message.into(), span);
        builder.internal = true;
        builder
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|m| m.severity == Severity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.messages.iter().any(|m| m.severity == Severity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.messages.iter().filter(|m| m.severity == Severity::Error).count()
    }

    pub fn warning_count(&self) -> usize {
        self.messages.iter().filter(|m| m.severity == Severity::Warning).count()
    }

    /// Diagnostics that are not internal-bug reports.
    pub fn user_facing(&self) -> impl Iterator<Item = &DiagnosticMessage> {
        self.messages.iter().filter(|m| !m.internal)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiagnosticMessage> {
        self.messages.iter()
    }

    pub fn printer<'d, 's>(&'d self) -> DiagnosticsPrinter<'d, 's> {
        DiagnosticsPrinter::new(self)
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.messages.extend(other.messages);
    }
}

/// Builder returned by [`Diagnostics::error`]/[`Diagnostics::warning`].
/// Dropping it without calling [`DiagnosticBuilder::emit`] discards the
/// message, hence `#[must_use]`.
#[must_use]
pub struct DiagnosticBuilder<'a> {
    diagnostics: &'a mut Diagnostics,
    severity: Severity,
    message: String,
    span: Span,
    related: Vec<RelatedInfo>,
    fix: Option<Fix>,
    internal: bool,
}

impl<'a> DiagnosticBuilder<'a> {
    fn new(diagnostics: &'a mut Diagnostics, severity: Severity, message: String, span: Span) -> Self {
        Self {
            diagnostics,
            severity,
            message,
            span,
            related: Vec::new(),
            fix: None,
            internal: false,
        }
    }

    pub fn related_to(mut self, message: impl Into<String>, span: Span) -> Self {
        self.related.push(RelatedInfo {
            message: message.into(),
            span,
        });
        self
    }

    pub fn fix(mut self, message: impl Into<String>, span: Span, replacement: impl Into<String>) -> Self {
        self.fix = Some(Fix {
            message: message.into(),
            span,
            replacement: replacement.into(),
        });
        self
    }

    pub fn emit(self) {
        self.diagnostics.messages.push(DiagnosticMessage {
            severity: self.severity,
            message: self.message,
            span: self.span,
            related: self.related,
            fix: self.fix,
            internal: self.internal,
        });
    }
}
