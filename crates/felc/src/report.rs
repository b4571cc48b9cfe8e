//! Renders [`Diagnostic`]s to stderr with `ariadne`, or to stdout as JSON
//! (source: `snowc`'s `report_diagnostics`, generalized from a single-file
//! `snow_typeck::TypeckResult` to the multi-file [`crate::Diagnostics`]
//! bundle every FEL stage can now produce).

use std::ops::Range;

use ariadne::{Config, Label, Report, ReportKind, Source};
use fel_common::{Diagnostic, Severity};
use serde::Serialize;

use crate::Diagnostics;

/// Prints every diagnostic to stderr using `ariadne`, each against the
/// source text of the file it was stamped with. A diagnostic with no file
/// (should not happen once [`crate::load_project`] stamps everything, but
/// cheaper to handle than to `unwrap`) falls back to an empty source.
pub fn render_to_stderr(bundle: &Diagnostics) {
    for diag in &bundle.diagnostics {
        let file = diag.file.as_deref().unwrap_or("<unknown>");
        let source = bundle.sources.get(file).map(String::as_str).unwrap_or("");
        let kind = match diag.severity {
            Severity::Fatal => ReportKind::Error,
            Severity::Error => ReportKind::Error,
        };

        eprintln!("{file}:");
        let range = clamp(diag.span.start as usize..diag.span.end as usize, source.len());
        let mut builder = Report::<Range<usize>>::build(kind, range.clone()).with_message(&diag.message).with_config(Config::default().with_color(false));
        builder.add_label(Label::new(range.clone()).with_message(&diag.message));
        for label in &diag.labels {
            let label_range = clamp(label.span.start as usize..label.span.end as usize, source.len());
            builder.add_label(Label::new(label_range).with_message(&label.message));
        }
        let report = builder.finish();
        let _ = report.eprint(Source::from(source));
    }
}

fn clamp(range: Range<usize>, len: usize) -> Range<usize> {
    let start = range.start.min(len);
    let end = range.end.min(len).max(start);
    if start == end {
        start..end.saturating_add(1).min(len.max(1))
    } else {
        start..end
    }
}

#[derive(Serialize)]
struct JsonDiagnostic<'a> {
    severity: &'a str,
    message: &'a str,
    file: Option<&'a str>,
    line: u32,
    column: u32,
}

/// Prints every diagnostic to stdout as a JSON array (`--json-diagnostics`,
/// for editors/CI that want structured output instead of `ariadne`'s
/// terminal rendering).
pub fn render_json(bundle: &Diagnostics) {
    let entries: Vec<JsonDiagnostic> = bundle
        .diagnostics
        .iter()
        .map(|diag| {
            let file = diag.file.as_deref();
            let source = file.and_then(|f| bundle.sources.get(f));
            let (line, column) = match source {
                Some(src) => fel_common::LineIndex::new(src).line_col(diag.span.start),
                None => (0, 0),
            };
            JsonDiagnostic {
                severity: severity_name(diag),
                message: &diag.message,
                file,
                line,
                column,
            }
        })
        .collect();
    match serde_json::to_string_pretty(&entries) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("failed to serialize diagnostics: {e}"),
    }
}

fn severity_name(diag: &Diagnostic) -> &'static str {
    match diag.severity {
        Severity::Fatal => "fatal",
        Severity::Error => "error",
    }
}
