//! CASL2 code generator: turns one lowered [`crate::ir::IrArena`] into
//! CASL2 assembly text.
//!
//! Ported in spirit from the original compiler's `casl2_codegen.c`: a
//! program's items (global variables, procedures) are emitted top to
//! bottom, each procedure's control-flow graph is walked depth-first with
//! forward edges inlined rather than jumped (`control_flow`), arithmetic
//! and I/O statements lower to GR1/GR2-based instruction sequences
//! (`statements`), and the builtin read/write routines plus the overflow,
//! division, and range-check traps are only emitted if something in the
//! program actually exercises them (`runtime`).
//!
//! Addresses — `Lnnnn` labels for blocks, constants, and most items — are
//! handed out lazily on first reference rather than precomputed, which is
//! why every submodule takes `&mut CodeGen` instead of writing to a shared
//! label table up front.

mod control_flow;
mod error;
mod globals;
mod program;
mod runtime;
mod state;
mod statements;

pub use error::CodeGenError;

use crate::interner::StringInterner;
use crate::ir::{IrArena, ItemId, ItemKind};
use crate::types::TypeTable;

/// Generates CASL2 assembly text for the program rooted at `program`.
///
/// `program` must name an `ItemKind::Program` item with a body; every other
/// item the generated code touches is reached by walking that item's own
/// body, not passed in separately.
pub fn generate(
    arena: &IrArena,
    program: ItemId,
    types: &TypeTable,
    intern: &StringInterner,
) -> Result<String, CodeGenError> {
    if arena.item(program).kind != ItemKind::Program {
        return Err(CodeGenError::Logic("generate() requires the top-level Program item".to_string()));
    }
    if arena.item(program).body.is_none() {
        return Err(CodeGenError::Logic("program item has no body".to_string()));
    }
    Ok(program::generate_program(arena, program, types, intern))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::AstNode;
    use crate::checker::check;
    use crate::interner::StringInterner;
    use crate::lower::lower;
    use crate::parser::parse;
    use crate::resolver::resolve;
    use crate::types::TypeTable;

    fn compile(src: &str) -> String {
        let (tree, parse_diags) = parse(src);
        assert!(parse_diags.is_empty(), "{parse_diags:?}");
        let mut intern = StringInterner::new();
        let resolved = resolve(&tree, src, &mut |s| intern.intern(s));
        assert!(resolved.diagnostics.is_empty(), "{:?}", resolved.diagnostics);
        let program = crate::ast::Program::cast(tree).expect("top-level node is a Program");
        let mut types = TypeTable::new();
        let checked = check(&program, src, &resolved.events, &mut types);
        assert!(checked.diagnostics.is_empty(), "{:?}", checked.diagnostics);
        let lowered = lower(&program, src, &resolved.events, &mut types, &checked, &mut |s| intern.intern(s));
        generate(&lowered.arena, lowered.program_item, &types, &intern).expect("codegen succeeds")
    }

    #[test]
    fn minimal_program_calls_writeln_and_exits() {
        let out = compile("program p; begin writeln end.");
        assert!(out.starts_with("PROGRAM"));
        assert!(out.contains("START"));
        assert!(out.contains("SVC       0"));
        assert!(out.contains("CALL"));
        assert!(out.contains("BSCHAR"));
        assert!(out.contains("END"));
    }

    #[test]
    fn arithmetic_assignment_uses_gr1_gr2_and_checks_overflow() {
        let out = compile("program p; var x: integer; begin x := 1 + 2 * 3 end.");
        assert!(out.contains("MULA"));
        assert!(out.contains("ADDA"));
        assert!(out.contains("JOV"));
        assert!(out.contains("EOV"));
    }

    #[test]
    fn array_access_emits_range_check() {
        let out = compile("program p; var a: array[4] of integer; begin a[1] := 0 end.");
        assert!(out.contains("ERNG"));
        assert!(out.contains("JMI"));
        assert!(out.contains("JPL"));
    }

    #[test]
    fn division_emits_zero_check() {
        let out = compile("program p; var x: integer; begin x := 4 div 2 end.");
        assert!(out.contains("DIVA"));
        assert!(out.contains("EDIV0"));
    }

    #[test]
    fn unused_builtins_are_never_emitted() {
        let out = compile("program p; var x: integer; begin x := 1 end.");
        assert!(!out.contains("BRINT"));
        assert!(!out.contains("BSBOOL"));
        assert!(!out.contains("EDIV0"));
    }
}
