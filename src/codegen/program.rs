//! Top-level item traversal: programs, procedures, and their storage.
//!
//! Ported from `casl2_codegen.c`'s `codegen_item`. One naming difference
//! from that source: there, a procedure's callable label is keyed off its
//! `ir_body_t*` (a separate heap object from the `ir_item_t` that declares
//! it); here every item already carries a stable [`crate::ir::ItemId`], so
//! that same id is used as the label key for both the call site and the
//! procedure's own entry, with no need for a second identity.

use crate::interner::StringInterner;
use crate::ir::{Body, IrArena, Item, ItemId, ItemKind};
use crate::types::TypeTable;

use super::control_flow::codegen_block;
use super::globals::{emit_constants, emit_storage_item};
use super::runtime::emit_builtins;
use super::state::CodeGen;

pub(super) fn generate_program(
    arena: &IrArena,
    program: ItemId,
    types: &TypeTable,
    intern: &StringInterner,
) -> String {
    let mut cg = CodeGen::new();
    let item = arena.item(program);
    let body = item
        .body
        .as_ref()
        .unwrap_or_else(|| unreachable!("program item has no body"));

    cg.set_label("PROGRAM");
    cg.emit("START", None);
    let entry_label = cg.block_label(body.entry_block);
    cg.emit("CALL", Some(&entry_label));
    cg.emit("SVC", Some("0"));

    codegen_items(&mut cg, arena, types, &body.items);
    codegen_block(&mut cg, arena, types, body.entry_block);

    emit_builtins(&mut cg);
    emit_constants(&mut cg, arena, intern);
    cg.emit("END", None);

    cg.finish()
}

fn codegen_items(cg: &mut CodeGen, arena: &IrArena, types: &TypeTable, items: &[ItemId]) {
    for &id in items {
        codegen_item(cg, arena, types, id);
    }
}

fn codegen_item(cg: &mut CodeGen, arena: &IrArena, types: &TypeTable, id: ItemId) {
    let item: &Item = arena.item(id);
    match item.kind {
        ItemKind::Proc => codegen_proc(cg, arena, types, id, item.body.as_ref()),
        ItemKind::Var | ItemKind::LocalVar | ItemKind::Param => emit_storage_item(cg, arena, types, id),
        ItemKind::Program => unreachable!("a program never nests another program"),
    }
}

fn codegen_proc(cg: &mut CodeGen, arena: &IrArena, types: &TypeTable, id: ItemId, body: Option<&Body>) {
    let body = body.unwrap_or_else(|| unreachable!("procedure item has no body"));

    codegen_items(cg, arena, types, &body.items);

    let label = cg.item_label(id, false);
    cg.set_label(&label);
    cg.emit("POP", Some("GR2"));
    for &param_id in &body.items {
        if arena.item(param_id).kind == ItemKind::Param {
            let param_label = cg.item_label(param_id, false);
            cg.emit("POP", Some("GR1"));
            cg.emit("ST", Some(&format!("GR1, {param_label}")));
        }
    }
    cg.emit("PUSH", Some("0, GR2"));
    codegen_block(cg, arena, types, body.entry_block);
}
