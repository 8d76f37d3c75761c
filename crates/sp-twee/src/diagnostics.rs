use ariadne::{Color, Label, Report, ReportKind, Source};
use std::collections::HashSet;
use std::fmt;
use std::ops::Range;

use crate::document::TweeDocument;
use crate::error::TweeError;
use crate::lexer::scan;
use crate::passage::{Passage, title_key};

/// How bad a finding in a Twee document is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The story cannot be built: no tree, no assembled document.
    Error,
    /// The story builds but a branch is cut short, e.g. a link to a passage
    /// nobody has written yet.
    Warning,
}

impl Severity {
    /// Lower-case name used when printing a finding on one line.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

/// One finding about a Twee document, anchored to a byte range of the
/// document source (not of the passage it came from).
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Error or warning.
    pub severity: Severity,
    /// Source range to underline; `0..0` when no passage is to blame.
    pub span: Range<usize>,
    /// One-line summary naming the passage or link.
    pub message: String,
    /// Note printed under the underlined range.
    pub label: Option<String>,
}

impl Diagnostic {
    fn new(severity: Severity, span: Range<usize>, message: impl Into<String>) -> Self {
        Self {
            severity,
            span,
            message: message.into(),
            label: None,
        }
    }

    /// A finding that stops the story from being built.
    pub fn error(span: Range<usize>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, span, message)
    }

    /// A finding the story can be built with.
    pub fn warning(span: Range<usize>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, span, message)
    }

    /// Add the note shown under the underlined range.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity.as_str(), self.message)
    }
}

/// Whether any diagnostic is an error.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(|d| d.severity == Severity::Error)
}

/// Check a document's passages, start passage, and links.
///
/// Bad prefixes, bracket imbalance, and a missing or repeated start passage
/// are errors. Links to passages that do not exist are warnings: the missing
/// passage can still be written later.
pub fn check_document(doc: &TweeDocument) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for passage in doc.passages() {
        let validity = passage.validity();
        if !validity.valid_prefix {
            diagnostics.push(
                Diagnostic::error(
                    title_span(passage),
                    format!("passage \"{}\" has no `::` prefix", passage.title_line()),
                )
                .with_label("title lines start with `::`"),
            );
        }
        if let Some(imbalance) = validity.imbalance {
            diagnostics.push(
                Diagnostic::error(
                    mapped(passage, imbalance.span.clone()),
                    format!("unbalanced brackets in passage \"{}\"", passage.name()),
                )
                .with_label(imbalance.to_string()),
            );
        }
    }

    match doc.start() {
        Ok(_) => {}
        Err(TweeError::NoStart) => {
            diagnostics.push(Diagnostic::error(0..0, TweeError::NoStart.to_string()));
        }
        Err(err @ TweeError::MultipleStarts { .. }) => {
            for passage in doc.passages().iter().filter(|p| p.is_start()) {
                diagnostics.push(
                    Diagnostic::error(title_span(passage), err.to_string())
                        .with_label("start passage"),
                );
            }
        }
    }

    let known: HashSet<String> = doc.passages().iter().map(Passage::key).collect();
    for passage in doc.story_passages() {
        let text = passage.raw_text();
        let markup = scan(text);
        let targets = markup
            .links
            .iter()
            .map(|l| l.target_range(text))
            .chain(markup.choices.iter().map(|c| c.target.clone()));
        for range in targets {
            let target = &text[range.clone()];
            if target.trim().is_empty() || known.contains(&title_key(target)) {
                continue;
            }
            diagnostics.push(
                Diagnostic::warning(
                    mapped(passage, range),
                    format!("passage {target} does not exist"),
                )
                .with_label(format!("linked from \"{}\"", passage.name())),
            );
        }
    }

    diagnostics
}

fn title_span(passage: &Passage) -> Range<usize> {
    mapped(passage, 0..passage.title_line().len())
}

fn mapped(passage: &Passage, span: Range<usize>) -> Range<usize> {
    match (
        passage.source_offset(span.start),
        passage.source_offset(span.end),
    ) {
        (Some(start), Some(end)) => start..end,
        _ => 0..0,
    }
}

/// Render findings against the document source as ariadne reports, one
/// after another, in the order given.
///
/// `filename` is only used as the report header.
pub fn render_diagnostics(source: &str, filename: &str, diagnostics: &[Diagnostic]) -> String {
    let mut rendered = Vec::new();

    for diagnostic in diagnostics {
        let (kind, color) = match diagnostic.severity {
            Severity::Error => (ReportKind::Error, Color::Red),
            Severity::Warning => (ReportKind::Warning, Color::Yellow),
        };
        let note = diagnostic.label.as_deref().unwrap_or(&diagnostic.message);

        Report::build(kind, (filename, diagnostic.span.clone()))
            .with_message(&diagnostic.message)
            .with_label(
                Label::new((filename, diagnostic.span.clone()))
                    .with_message(note)
                    .with_color(color),
            )
            .finish()
            .write((filename, Source::from(source)), &mut rendered)
            .ok();
    }

    String::from_utf8(rendered).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn findings_print_on_one_line() {
        let missing = Diagnostic::warning(3..7, "passage cave does not exist")
            .with_label("linked from \"Start\"");
        assert_eq!(missing.to_string(), "warning: passage cave does not exist");
        assert_eq!(
            Diagnostic::error(0..0, TweeError::NoStart.to_string()).to_string(),
            "error: no start passage found"
        );
        assert!(has_errors(&[missing.clone(), Diagnostic::error(0..0, "x")]));
        assert!(!has_errors(&[missing]));
    }

    #[test]
    fn clean_document_has_no_diagnostics() {
        let doc = TweeDocument::parse(":: Start\n[[Go|cave]]\n:: cave\nDark.");
        assert!(check_document(&doc).is_empty());
    }

    #[test]
    fn imbalance_points_at_the_bracket() {
        let source = ":: Start\nsends jolts up your [[spine].";
        let doc = TweeDocument::parse(source);
        let diags = check_document(&doc);
        let err = diags
            .iter()
            .find(|d| d.severity == Severity::Error)
            .cloned()
            .unwrap_or_else(|| Diagnostic::warning(0..0, "missing"));
        assert_eq!(&source[err.span.clone()], "[");
        assert_eq!(err.label.as_deref(), Some("unclosed `[`"));
        assert!(has_errors(&diags));
    }

    #[test]
    fn missing_start_is_an_error() {
        let doc = TweeDocument::parse(":: cave\nDark.");
        let diags = check_document(&doc);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "no start passage found");
    }

    #[test]
    fn unresolved_links_are_warnings() {
        let source = ":: Start\nGo [[down|the cellar]].";
        let doc = TweeDocument::parse(source);
        let diags = check_document(&doc);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Warning);
        assert_eq!(&source[diags[0].span.clone()], "the cellar");
        assert!(!has_errors(&diags));
    }

    #[test]
    fn render_produces_output() {
        let source = ":: Start\n[[oops]";
        let doc = TweeDocument::parse(source);
        let output = render_diagnostics(source, "story.tw", &check_document(&doc));
        assert!(!output.is_empty());
        assert!(output.contains("unbalanced brackets"));
    }
}
