//! Diagnostic model.
//!
//! A `Diagnostic` is built once at the point an error/warning/note is
//! discovered and carries everything the renderer needs later: a primary
//! offset, a message, zero or more labeled span annotations, and free-form
//! notes. Diagnostics never abort a compiler pass; callers push them onto a
//! `Vec<Diagnostic>` and keep going (`spec.md` §7, "error handling design").
//!
//! Grounded on the original compiler's `Report`/`ReportAnnotation`
//! (`report.h`: kind, offset, annotation start/end, notes) and on
//! `error.rs`'s `Span`/`ErrorKind`/`AsmError` shape for the Rust-idiomatic
//! rendering (`Display` impl, closed `enum` of kinds).

use std::fmt;

/// Severity of a diagnostic. Ordered so warnings/errors can be counted by
/// comparison if a caller wants a worst-severity summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Note,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Note => write!(f, "note"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// The closed set of diagnostic kinds a compilation can produce, one per
/// `diag_*_error` function in the original compiler's `diag.h`, plus the
/// ambient `InternalError` variant for conditions the rest of this crate
/// treats as compiler bugs rather than source errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    // Lexer
    StrayChar { found: char },
    NongraphicChar { found: u8 },
    UnterminatedString,
    UnterminatedComment,
    TooBigNumber,

    // Parser
    UnexpectedToken { found: String, expected: Vec<String> },
    ExpectedExpression,
    MissingSemicolon,
    BreakOutsideLoop,

    // Resolver
    MultipleDefinition { name: String, previous_offset: usize },
    NotDefined { name: String },

    // Checker
    ZeroSizedArray,
    NonArraySubscript,
    RecursiveCall { name: String },
    MismatchedType { expected: String, found: String },
    NonStandardType { found: String },
    NonLvalueAssignment,
    MismatchedArgumentsCount { expected: usize, found: usize },
    NonProcedureInvocation,
    InvalidInput,
    InvalidOutput,
    InvalidOutputValue,

    /// A compiler-internal invariant failure: not a source error, but still
    /// reported through the diagnostic pipeline rather than a panic so the
    /// CLI can print it and exit cleanly.
    InternalError { detail: String },
}

/// A labeled span within a diagnostic, e.g. "previous definition here".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub start: usize,
    pub end: usize,
    pub label: Option<String>,
}

/// A single diagnostic message, carrying enough structure for both a plain
/// one-line renderer and a source-snippet renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub primary_offset: usize,
    pub message: String,
    pub annotations: Vec<Annotation>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, primary_offset: usize, message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            kind,
            primary_offset,
            message: message.into(),
            annotations: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn warning(kind: DiagnosticKind, primary_offset: usize, message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            kind,
            primary_offset,
            message: message.into(),
            annotations: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Attach a labeled span, e.g. pointing at a previous declaration.
    pub fn with_annotation(mut self, start: usize, end: usize, label: impl Into<String>) -> Self {
        self.annotations.push(Annotation {
            start,
            end,
            label: Some(label.into()),
        });
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Constructors mirroring the original compiler's `diag_*_error` functions,
/// one per `DiagnosticKind` variant, each producing the exact message text
/// the checker/resolver/lexer/parser modules are written against.
pub mod builders {
    use super::*;

    pub fn stray_char(offset: usize, found: char) -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::StrayChar { found },
            offset,
            format!("stray character `{found}` in program"),
        )
    }

    pub fn nongraphic_char(offset: usize, found: u8) -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::NongraphicChar { found },
            offset,
            format!("non-graphic character (0x{found:02x}) in program"),
        )
    }

    pub fn unterminated_string(offset: usize, len: usize) -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::UnterminatedString,
            offset,
            "unterminated string literal",
        )
        .with_annotation(offset, offset + len, "string starts here")
    }

    pub fn unterminated_comment(offset: usize, len: usize) -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::UnterminatedComment,
            offset,
            "unterminated comment",
        )
        .with_annotation(offset, offset + len, "comment starts here")
    }

    pub fn too_big_number(offset: usize, len: usize) -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::TooBigNumber,
            offset,
            "number literal is too large",
        )
        .with_annotation(offset, offset + len, "exceeds 32767")
    }

    pub fn unexpected_token(offset: usize, len: usize, found: &str, expected: Vec<String>) -> Diagnostic {
        let expected_list = expected.join(", ");
        Diagnostic::error(
            DiagnosticKind::UnexpectedToken {
                found: found.to_string(),
                expected,
            },
            offset,
            format!("expected {expected_list}, found `{found}`"),
        )
        .with_annotation(offset, offset + len, "unexpected token")
    }

    pub fn expected_expression(offset: usize) -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::ExpectedExpression,
            offset,
            "expected an expression",
        )
    }

    pub fn missing_semicolon(offset: usize) -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::MissingSemicolon,
            offset,
            "missing `;`",
        )
    }

    pub fn break_outside_loop(offset: usize, len: usize) -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::BreakOutsideLoop,
            offset,
            "`break` outside of a loop",
        )
        .with_annotation(offset, offset + len, "not inside a `while` statement")
    }

    pub fn multiple_definition(offset: usize, len: usize, name: &str, previous_offset: usize) -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::MultipleDefinition {
                name: name.to_string(),
                previous_offset,
            },
            offset,
            format!("`{name}` is already defined"),
        )
        .with_annotation(offset, offset + len, "redefined here")
        .with_annotation(previous_offset, previous_offset, "previous definition here")
    }

    pub fn not_defined(offset: usize, len: usize, name: &str) -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::NotDefined {
                name: name.to_string(),
            },
            offset,
            format!("`{name}` is not defined"),
        )
        .with_annotation(offset, offset + len, "not found in this scope")
    }

    pub fn zero_sized_array(offset: usize, len: usize) -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::ZeroSizedArray,
            offset,
            "array size must be greater than zero",
        )
        .with_annotation(offset, offset + len, "zero-sized array")
    }

    pub fn non_array_subscript(offset: usize, len: usize) -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::NonArraySubscript,
            offset,
            "subscripted value is not an array",
        )
        .with_annotation(offset, offset + len, "not an array")
    }

    pub fn recursive_call(offset: usize, len: usize, name: &str) -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::RecursiveCall {
                name: name.to_string(),
            },
            offset,
            format!("procedure `{name}` cannot call itself"),
        )
        .with_annotation(offset, offset + len, "recursive call")
    }

    pub fn mismatched_type(offset: usize, len: usize, expected: &str, found: &str) -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::MismatchedType {
                expected: expected.to_string(),
                found: found.to_string(),
            },
            offset,
            format!("expected type `{expected}`, found `{found}`"),
        )
        .with_annotation(offset, offset + len, "mismatched type")
    }

    pub fn non_standard_type(offset: usize, len: usize, found: &str) -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::NonStandardType {
                found: found.to_string(),
            },
            offset,
            format!("type `{found}` is not a standard type"),
        )
        .with_annotation(offset, offset + len, "non-standard type")
    }

    pub fn non_lvalue_assignment(offset: usize, len: usize) -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::NonLvalueAssignment,
            offset,
            "left-hand side of assignment is not an lvalue",
        )
        .with_annotation(offset, offset + len, "not assignable")
    }

    pub fn mismatched_arguments_count(offset: usize, len: usize, expected: usize, found: usize) -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::MismatchedArgumentsCount { expected, found },
            offset,
            format!("expected {expected} argument(s), found {found}"),
        )
        .with_annotation(offset, offset + len, "wrong number of arguments")
    }

    pub fn non_procedure_invocation(offset: usize, len: usize) -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::NonProcedureInvocation,
            offset,
            "called value is not a procedure",
        )
        .with_annotation(offset, offset + len, "not a procedure")
    }

    pub fn invalid_input(offset: usize, len: usize) -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::InvalidInput,
            offset,
            "input target must be an lvalue of a standard type",
        )
        .with_annotation(offset, offset + len, "invalid input target")
    }

    pub fn invalid_output(offset: usize, len: usize) -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::InvalidOutput,
            offset,
            "output value must be a standard type or a string",
        )
        .with_annotation(offset, offset + len, "invalid output value")
    }

    pub fn invalid_output_value(offset: usize, len: usize) -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::InvalidOutputValue,
            offset,
            "output format specifier is invalid",
        )
        .with_annotation(offset, offset + len, "invalid format specifier")
    }

    pub fn internal_error(offset: usize, detail: impl Into<String>) -> Diagnostic {
        let detail = detail.into();
        Diagnostic::error(
            DiagnosticKind::InternalError {
                detail: detail.clone(),
            },
            offset,
            format!("internal compiler error: {detail}"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_error_above_warning_above_note() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Note);
    }

    #[test]
    fn display_includes_severity_and_message() {
        let diag = builders::not_defined(10, 3, "foo");
        assert_eq!(diag.to_string(), "error: `foo` is not defined");
    }

    #[test]
    fn multiple_definition_carries_both_spans() {
        let diag = builders::multiple_definition(20, 3, "x", 5);
        assert_eq!(diag.annotations.len(), 2);
        assert_eq!(diag.annotations[1].start, 5);
    }

    #[test]
    fn builder_messages_name_the_offending_identifier() {
        let diag = builders::recursive_call(0, 4, "proc1");
        assert!(diag.message.contains("proc1"));
    }
}
