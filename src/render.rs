//! Diagnostic renderer: turns a [`Diagnostic`] plus the [`Source`] it refers
//! to into a source excerpt with a line/column gutter and a caret span,
//! matching the shape of `examples/original_source/src/diag.c`'s reports
//! (primary message, underlined primary span, secondary annotations, notes)
//! rather than its exact column widths.

use std::fmt::Write as _;

use crate::diagnostic::{Diagnostic, Severity};
use crate::source::Source;

fn color_for(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "\x1b[31m",
        Severity::Warning => "\x1b[33m",
        Severity::Note => "\x1b[36m",
    }
}

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Renders one diagnostic as a multi-line source excerpt.
///
/// ```text
/// error: `x` is not defined
///  --> t.mpl:3:10
///   |
/// 3 | y := x + 1;
///   |      ^
/// ```
pub fn render(diag: &Diagnostic, source: &Source, color: bool) -> String {
    let mut out = String::new();
    let loc = source.location(diag.primary_offset);
    let gutter_width = loc.line.to_string().len();

    let head = format!("{}: {}", diag.severity, diag.message);
    if color {
        let _ = writeln!(out, "{}{}{}{}", color_for(diag.severity), BOLD, head, RESET);
    } else {
        let _ = writeln!(out, "{head}");
    }
    let _ = writeln!(out, "{:width$} --> {}:{}:{}", "", source.path().display(), loc.line, loc.column, width = gutter_width);
    render_span(&mut out, source, diag.primary_offset, diag.primary_offset + 1, gutter_width, color);

    for annotation in &diag.annotations {
        render_span(&mut out, source, annotation.start, annotation.end, gutter_width, color);
        if let Some(label) = &annotation.label {
            let _ = writeln!(out, "{:width$} = note: {label}", "", width = gutter_width);
        }
    }

    for note in &diag.notes {
        let _ = writeln!(out, "{:width$} = note: {note}", "", width = gutter_width);
    }

    out
}

fn render_span(out: &mut String, source: &Source, start: usize, end: usize, gutter_width: usize, color: bool) {
    let loc = source.location(start);
    if loc.line > source.line_count() {
        return;
    }
    let line_text = source.line_text(loc.line);
    let _ = writeln!(out, "{:width$} |", "", width = gutter_width);
    let _ = writeln!(out, "{:>width$} | {line_text}", loc.line, width = gutter_width);

    let caret_len = end.saturating_sub(start).max(1);
    let caret = "^".repeat(caret_len);
    let padding = " ".repeat(loc.column.saturating_sub(1));
    if color {
        let _ = writeln!(out, "{:width$} | {padding}\x1b[31m{caret}{RESET}", "", width = gutter_width);
    } else {
        let _ = writeln!(out, "{:width$} | {padding}{caret}", "", width = gutter_width);
    }
}

/// Renders every diagnostic in `diagnostics`, in order, separated by a blank
/// line.
pub fn render_all(diagnostics: &[Diagnostic], source: &Source, color: bool) -> String {
    diagnostics.iter().map(|d| render(d, source, color)).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::builders;

    #[test]
    fn renders_gutter_and_caret_for_not_defined() {
        let source = Source::new("t.mpl", "begin\n  x := y;\nend.\n");
        let diag = builders::not_defined(13, 1, "y");
        let text = render(&diag, &source, false);
        assert!(text.contains("t.mpl:2:"));
        assert!(text.contains("x := y;"));
        assert!(text.contains('^'));
    }

    #[test]
    fn color_wraps_message_in_ansi_codes() {
        let source = Source::new("t.mpl", "x\n");
        let diag = builders::not_defined(0, 1, "x");
        let text = render(&diag, &source, true);
        assert!(text.contains("\x1b[31m"));
    }
}
