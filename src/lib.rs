//! mpplc — a compiler for MPPL (Mini-Pascal-Plus-Like).
//!
//! Lexes, parses (into a lossless CST), resolves names, type-checks, lowers
//! to an intermediate representation, and emits either CASL2 assembly or
//! LLVM IR text. Also exposes a cross-reference printer and pretty-printer
//! over the same front end.
//!
//! # Embedding
//!
//! Host code drives the pipeline through [`compile_to_casl2`]/
//! [`compile_to_llvm`] rather than re-parsing CLI flags, configuring
//! behavior with [`CompilerConfig`]:
//!
//! ```rust,ignore
//! use mpplc::config::CompilerConfig;
//! use mpplc::compile_to_casl2;
//!
//! let config = CompilerConfig::default();
//! let result = compile_to_casl2(source, &config);
//! ```

pub mod ast;
pub mod checker;
pub mod codegen;
pub mod config;
pub mod cst;
pub mod diagnostic;
pub mod interner;
pub mod ir;
pub mod lexer;
pub mod lower;
pub mod llvm;
pub mod parser;
pub mod pretty;
pub mod render;
pub mod resolver;
pub mod source;
pub mod syntax_kind;
pub mod types;
pub mod xref;

pub use config::{ColorMode, CompilerConfig};
pub use diagnostic::{Diagnostic, Severity};
pub use source::Source;

use ast::AstNode;
use interner::StringInterner;
use types::TypeTable;

/// Everything a caller might want out of one run of the front end: the
/// diagnostics collected across every stage, plus the lowered IR when
/// compilation got that far (front-end stages keep running after errors
/// where later stages can tolerate it, but lowering and codegen are skipped
/// once any stage reports an error, since their input invariants no longer
/// hold).
pub struct FrontEndResult {
    pub diagnostics: Vec<Diagnostic>,
    pub lowered: Option<lower::LowerResult>,
    pub types: TypeTable,
    pub intern: StringInterner,
}

impl FrontEndResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }
}

/// Runs lex → parse → resolve → check → lower over `source`, stopping short
/// of lowering if any stage reported an error.
#[tracing::instrument(skip_all)]
pub fn run_front_end(source: &str) -> FrontEndResult {
    let mut diagnostics = Vec::new();
    let mut intern = StringInterner::new();
    let mut types = TypeTable::new();

    let (tree, parse_diags) = parser::parse(source);
    diagnostics.extend(parse_diags);

    let resolved = resolver::resolve(&tree, source, &mut |s| intern.intern(s));
    diagnostics.extend(resolved.diagnostics);

    let Some(program) = ast::Program::cast(tree) else {
        return FrontEndResult { diagnostics, lowered: None, types, intern };
    };

    let checked = checker::check(&program, source, &resolved.events, &mut types);
    diagnostics.extend(checked.diagnostics.clone());

    if diagnostics.iter().any(|d| d.severity == Severity::Error) {
        return FrontEndResult { diagnostics, lowered: None, types, intern };
    }

    let lowered = lower::lower(&program, source, &resolved.events, &mut types, &checked, &mut |s| intern.intern(s));

    FrontEndResult { diagnostics, lowered: Some(lowered), types, intern }
}

/// Runs the full pipeline and emits CASL2 assembly text.
#[tracing::instrument(skip_all)]
pub fn compile_to_casl2(source: &str) -> Result<String, Vec<Diagnostic>> {
    let result = run_front_end(source);
    let Some(lowered) = result.lowered else {
        return Err(result.diagnostics);
    };
    codegen::generate(&lowered.arena, lowered.program_item, &result.types, &result.intern)
        .map_err(|e| vec![diagnostic::builders::internal_error(0, e.to_string())])
}

/// Runs the full pipeline and emits LLVM IR text.
#[tracing::instrument(skip_all)]
pub fn compile_to_llvm(source: &str) -> Result<String, Vec<Diagnostic>> {
    let result = run_front_end(source);
    let Some(lowered) = result.lowered else {
        return Err(result.diagnostics);
    };
    Ok(llvm::generate(&lowered.arena, lowered.program_item, &result.types, &result.intern))
}
