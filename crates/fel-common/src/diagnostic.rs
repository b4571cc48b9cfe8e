use crate::span::Span;

/// How serious a [`Diagnostic`] is.
///
/// `Fatal` corresponds to spec.md §7's "scanner fatal" / "parser fatal"
/// errors: the stage that produced it stops immediately rather than
/// continuing to collect further diagnostics. `Error` diagnostics are
/// collected and reported at the end of the relevant pass; they gate
/// evaluation (spec.md §5: "if parsing or type-checking reports any
/// diagnostic, the evaluator does not run").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Fatal,
}

/// A secondary source location attached to a diagnostic, e.g. the first
/// declaration site when reporting a redeclaration.
#[derive(Debug, Clone)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

impl Label {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

/// A single diagnostic produced by the scanner, parser, type checker, or
/// evaluator.
///
/// Diagnostics are plain data: no crate in the pipeline prints anything
/// itself. Rendering (to a terminal via `ariadne`, or to JSON) is the
/// CLI's job, matching the teacher's separation between `snow-typeck`
/// (produces `TypeError`s) and `snowc` (renders them).
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: Span,
    pub labels: Vec<Label>,
    /// Which source file `span` is relative to. `None` until the owning
    /// pass knows (a single-file parse stamps nothing; a multi-file pass
    /// like the type checker stamps it as it moves between files) or until
    /// the CLI fills it in for a diagnostic it knows the origin of.
    pub file: Option<std::rc::Rc<str>>,
}

impl Diagnostic {
    pub fn error(span: Span, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            span,
            labels: Vec::new(),
            file: None,
        }
    }

    pub fn fatal(span: Span, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Fatal,
            message: message.into(),
            span,
            labels: Vec::new(),
            file: None,
        }
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    pub fn with_file(mut self, file: std::rc::Rc<str>) -> Self {
        self.file = Some(file);
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}
