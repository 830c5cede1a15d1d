//! Walks one procedure/program body's control-flow graph, emitting blocks
//! depth-first and inlining a successor in place the first time it's
//! reached rather than jumping to it.
//!
//! Ported from `casl2_codegen.c`'s `codegen_block`: a `Goto` to a
//! not-yet-emitted block falls straight through into it; a `Goto` to an
//! already-emitted block becomes a `JUMP`. `If` picks whichever arm hasn't
//! been emitted yet to fall through into, so at most one of the two arms
//! ever needs an explicit jump.

use crate::ir::{BlockId, IrArena, Terminator};
use crate::types::TypeTable;

use super::state::CodeGen;
use super::statements::{codegen_stmt, load};

pub(super) fn codegen_block(cg: &mut CodeGen, arena: &IrArena, types: &TypeTable, id: BlockId) {
    let label = cg.block_label(id);
    cg.set_label(&label);
    cg.mark_block_emitted(id);

    let block = arena.block(id);
    for stmt in &block.stmts {
        codegen_stmt(cg, arena, types, stmt);
    }

    match block.terminator.expect("every block has a terminator once lowering finishes") {
        Terminator::Goto(next) => goto_or_inline(cg, arena, types, next),
        Terminator::If(cond, then_blk, else_blk) => codegen_if(cg, arena, types, cond, then_blk, else_blk),
        Terminator::Return => cg.emit("RET", None),
    }
}

fn goto_or_inline(cg: &mut CodeGen, arena: &IrArena, types: &TypeTable, target: BlockId) {
    if cg.block_emitted(target) {
        let label = cg.block_label(target);
        cg.emit("JUMP", Some(&label));
    } else {
        codegen_block(cg, arena, types, target);
    }
}

fn codegen_if(
    cg: &mut CodeGen,
    arena: &IrArena,
    types: &TypeTable,
    cond: crate::ir::Operand,
    then_blk: BlockId,
    else_blk: BlockId,
) {
    load(cg, arena, types, "GR1", &cond);
    cg.emit("LD", Some("GR1, GR1"));

    if cg.block_emitted(then_blk) {
        let then_label = cg.block_label(then_blk);
        cg.emit("JNZ", Some(&then_label));
        goto_or_inline(cg, arena, types, else_blk);
    } else if cg.block_emitted(else_blk) {
        let else_label = cg.block_label(else_blk);
        cg.emit("JZE", Some(&else_label));
        codegen_block(cg, arena, types, then_blk);
    } else {
        let else_label = cg.block_label(else_blk);
        cg.emit("JZE", Some(&else_label));
        codegen_block(cg, arena, types, then_blk);
        codegen_block(cg, arena, types, else_blk);
    }
}
