//! Storage declarations: `DS` for variables, formal parameters, and
//! procedure locals; `DC` for interned string constants.
//!
//! Ported from `casl2_codegen.c`'s `codegen_item` (the `IR_ITEM_VAR` /
//! `IR_ITEM_LOCAL_VAR` / `IR_ITEM_ARG_VAR` arms) and `codegen_constant`.

use crate::interner::StringInterner;
use crate::ir::{Constant, IrArena, ItemId, ItemKind};
use crate::types::TypeTable;

use super::state::CodeGen;

/// A formal parameter is passed by reference: its cell holds the caller's
/// address, not the value, so it is always one word regardless of the
/// parameter's declared type.
pub(super) fn emit_storage_item(cg: &mut CodeGen, arena: &IrArena, types: &TypeTable, id: ItemId) {
    let item = arena.item(id);
    let label = cg.item_label(id, false);
    cg.set_label(&label);
    match item.kind {
        ItemKind::Param => cg.emit("DS", Some("1")),
        ItemKind::Var | ItemKind::LocalVar => match types.array_parts(item.ty) {
            Some((_, length)) => cg.emit("DS", Some(&length.to_string())),
            None => cg.emit("DS", Some("1")),
        },
        ItemKind::Program | ItemKind::Proc => unreachable!("not a storage item: {:?}", item.kind),
    }
}

/// Only string constants need a data declaration; number/boolean/char
/// constants are always materialized with `LAD` immediates at their use
/// site and never get their own label here.
pub(super) fn emit_constants(cg: &mut CodeGen, arena: &IrArena, intern: &StringInterner) {
    for (id, constant) in arena.constants() {
        if let Constant::String(sym, _) = constant {
            let label = cg.constant_label(id);
            cg.set_label(&label);
            cg.emit("DC", Some(&format!("'{}'", intern.resolve(*sym))));
        }
    }
}
