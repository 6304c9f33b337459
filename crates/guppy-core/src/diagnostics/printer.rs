use super::{Diagnostics, Severity};
use annotate_snippets::{AnnotationKind, Group, Level, Renderer, Snippet};

/// Renders a [`Diagnostics`] collection as human-readable text, optionally
/// with source-snippet context: a primary span, secondary spans, and notes.
pub struct DiagnosticsPrinter<'d, 's> {
    diagnostics: &'d Diagnostics,
    source: Option<&'s str>,
    path: Option<&'s str>,
    colored: bool,
}

impl<'d, 's> DiagnosticsPrinter<'d, 's> {
    pub fn new(diagnostics: &'d Diagnostics) -> Self {
        Self {
            diagnostics,
            source: None,
            path: None,
            colored: false,
        }
    }

    pub fn source(mut self, source: &'s str) -> Self {
        self.source = Some(source);
        self
    }

    pub fn path(mut self, path: &'s str) -> Self {
        self.path = Some(path);
        self
    }

    pub fn colored(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    pub fn format(&self) -> String {
        let Some(source) = self.source else {
            return self.format_plain();
        };
        let path = self.path.unwrap_or("<input>");
        let renderer = if self.colored {
            Renderer::styled()
        } else {
            Renderer::plain()
        };

        let mut out = String::new();
        for msg in self.diagnostics.iter() {
            let level = severity_to_level(msg.severity);
            let range = adjust_range(
                usize::from(msg.span.range.start()),
                usize::from(msg.span.range.end()),
                source.len(),
            );
            let mut snippet = Snippet::source(source)
                .path(path)
                .annotation(AnnotationKind::Primary.span(range).label(&msg.message));
            for rel in &msg.related {
                let r = adjust_range(
                    usize::from(rel.span.range.start()),
                    usize::from(rel.span.range.end()),
                    source.len(),
                );
                snippet = snippet.annotation(AnnotationKind::Context.span(r).label(&rel.message));
            }
            let mut group = Group::with_title(level.primary_title(&msg.message)).element(snippet);
            if let Some(fix) = &msg.fix {
                group = group.element(Level::HELP.message(&fix.message));
            }
            out.push_str(&renderer.render(&[group]));
            out.push('\n');
        }
        out
    }

    fn format_plain(&self) -> String {
        let mut out = String::new();
        for msg in self.diagnostics.iter() {
            out.push_str(&msg.to_string());
            out.push('\n');
        }
        out
    }
}

fn severity_to_level(severity: Severity) -> Level<'static> {
    match severity {
        Severity::Error => Level::ERROR,
        Severity::Warning => Level::WARNING,
    }
}

/// `annotate-snippets` rejects a zero-width annotation range; widen it by
/// one byte (clamped to the source length) so CFG-introduced synthetic
/// spans still render.
fn adjust_range(start: usize, end: usize, limit: usize) -> std::ops::Range<usize> {
    if start == end {
        start..(start + 1).min(limit)
    } else {
        start..end
    }
}
