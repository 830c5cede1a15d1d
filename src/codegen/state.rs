//! Output buffer, lazy address interning, and builtin usage counters shared
//! by every file in this module.
//!
//! Ported in spirit from the original compiler's `casl2_codegen.c`: that
//! generator keys a single address table by the pointer identity of
//! whichever `ir_item_t`/`ir_block_t`/`ir_constant_t`/`NULL` it was asked to
//! label, minting a fresh `Lnnnn` the first time a given key is seen. Rust
//! has no pointer-keyed hash table to borrow here, so [`Labels`] keeps one
//! counter shared across three typed maps (one per id kind) plus a
//! `fresh` path for the anonymous local-jump labels the original gets by
//! passing `NULL`.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use crate::ir::{BlockId, ConstantId, ItemId};

#[derive(Default)]
pub(super) struct BuiltinUsage {
    pub(super) e_ov: bool,
    pub(super) e_div0: bool,
    pub(super) e_rng: bool,
    pub(super) r_int: bool,
    pub(super) r_char: bool,
    pub(super) r_ln: bool,
    pub(super) w_int: bool,
    pub(super) w_bool: bool,
    pub(super) w_char: bool,
    pub(super) w_str: bool,
}

struct Labels {
    next: u32,
    items: HashMap<u32, String>,
    blocks: HashMap<u32, String>,
    constants: HashMap<u32, String>,
}

impl Labels {
    fn new() -> Self {
        Labels {
            next: 1,
            items: HashMap::new(),
            blocks: HashMap::new(),
            constants: HashMap::new(),
        }
    }

    fn mint(&mut self) -> String {
        let label = format!("L{:04}", self.next);
        self.next += 1;
        label
    }
}

pub(super) struct CodeGen {
    out: String,
    pending_label: Option<String>,
    labels: Labels,
    emitted_blocks: HashSet<u32>,
    pub(super) builtins: BuiltinUsage,
}

impl CodeGen {
    pub(super) fn new() -> Self {
        CodeGen {
            out: String::new(),
            pending_label: None,
            labels: Labels::new(),
            emitted_blocks: HashSet::new(),
            builtins: BuiltinUsage::default(),
        }
    }

    pub(super) fn finish(self) -> String {
        self.out
    }

    /// The program's entry label is fixed, not minted; every other label is
    /// assigned lazily on first reference.
    pub(super) fn item_label(&mut self, id: ItemId, is_program: bool) -> String {
        if is_program {
            return "PROGRAM".to_string();
        }
        if let Some(label) = self.labels.items.get(&id.index()) {
            return label.clone();
        }
        let label = self.labels.mint();
        self.labels.items.insert(id.index(), label.clone());
        label
    }

    pub(super) fn block_label(&mut self, id: BlockId) -> String {
        if let Some(label) = self.labels.blocks.get(&id.index()) {
            return label.clone();
        }
        let label = self.labels.mint();
        self.labels.blocks.insert(id.index(), label.clone());
        label
    }

    pub(super) fn constant_label(&mut self, id: ConstantId) -> String {
        if let Some(label) = self.labels.constants.get(&id.index()) {
            return label.clone();
        }
        let label = self.labels.mint();
        self.labels.constants.insert(id.index(), label.clone());
        label
    }

    /// A label with no backing id, used for local jump targets and inline
    /// temp storage that codegen needs only once, never looked up again.
    pub(super) fn fresh_label(&mut self) -> String {
        self.labels.mint()
    }

    pub(super) fn block_emitted(&self, id: BlockId) -> bool {
        self.emitted_blocks.contains(&id.index())
    }

    pub(super) fn mark_block_emitted(&mut self, id: BlockId) {
        self.emitted_blocks.insert(id.index());
    }

    /// Queues `label` to prefix the next emitted instruction. Mirrors the
    /// original's `codegen_set_label`: if a label is already queued and
    /// unused, it gets its own `DS 0` line first so it isn't lost.
    pub(super) fn set_label(&mut self, label: &str) {
        if self.pending_label.is_some() {
            self.emit("DS", Some("0"));
        }
        self.pending_label = Some(label.to_string());
    }

    /// Writes one CASL2 line: a 10-column label field, an 8-column opcode
    /// field (omitted entirely when `operand` is `None`, matching
    /// label-only lines like `RET`), and the operand text.
    pub(super) fn emit(&mut self, op: &str, operand: Option<&str>) {
        let label = self.pending_label.take().unwrap_or_default();
        match operand {
            Some(operand) => {
                let _ = writeln!(self.out, "{label:<10}{op:<8}{operand}");
            }
            None => {
                let _ = writeln!(self.out, "{label:<10}{op}");
            }
        }
    }

}
