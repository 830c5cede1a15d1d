//! The IR data model lowered from the typed syntax view: a small
//! three-address-ish representation with explicit control-flow blocks, no
//! SSA, grounded on `spec.md` §3's IR section.
//!
//! Items and blocks are owned by an [`IrArena`]; locals and places reference
//! items by [`ItemId`], operands reference constants by [`ConstantId`].
//! Constants are structurally interned the same way `types.rs` interns
//! `TypeData` — equal constants share one pool slot.
//!
//! One deliberate departure from the literal data model: the `Arg` terminator
//! described there (a chain of single-argument pseudo-blocks feeding a call)
//! is not its own IR node here. `Stmt::Call` holds its argument list directly
//! as `Vec<Operand>`; the lowerer still builds that list right-to-left, it
//! just never materializes the intermediate blocks. Likewise a call's callee
//! is carried as an `ItemId`, not a `Place` — procedures are never addressable
//! storage in MPPL (no function values, no procedure variables), so there is
//! no `Local` for one to occupy.

use crate::interner::{fnv1a, HopscotchTable, Symbol};
use crate::types::{StandardType, TypeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstantId(u32);

impl ItemId {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl BlockId {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl ConstantId {
    pub fn index(self) -> u32 {
        self.0
    }
}

/// A storage location a value can be read from or written to.
///
/// `Temp` carries a [`StandardType`] rather than a bare `TypeId`: a temporary
/// only ever exists to hold an intermediate value on its way into another
/// place or a CASL2 register, and MPPL has no way to write a `String` into
/// any storage location, so excluding it here means the lowerer can't
/// construct a temp the codegen would have nowhere to put.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Local {
    Var(ItemId),
    Arg(ItemId),
    Temp(StandardType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Place {
    Plain(Local),
    Indexed(Local, Operand),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Place(Place),
    Constant(ConstantId),
}

/// Interned so equal constants share one pool slot; strings live in the same
/// pool, keyed by their interned text plus the declared literal length
/// (`spec.md`'s Char/String split means the same text can appear as either,
/// so length is part of the key, not just a display hint).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constant {
    Number(i16),
    Boolean(bool),
    Char(u8),
    String(Symbol, u32),
}

fn hash_constant(c: &Constant) -> u64 {
    let mut bytes = Vec::new();
    match c {
        Constant::Number(n) => {
            bytes.push(0u8);
            bytes.extend_from_slice(&n.to_le_bytes());
        }
        Constant::Boolean(b) => {
            bytes.push(1);
            bytes.push(*b as u8);
        }
        Constant::Char(c) => {
            bytes.push(2);
            bytes.push(*c);
        }
        Constant::String(sym, len) => {
            bytes.push(3);
            bytes.extend_from_slice(&sym.as_u32().to_le_bytes());
            bytes.extend_from_slice(&len.to_le_bytes());
        }
    }
    fnv1a(&bytes)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
}

#[derive(Debug, Clone, Copy)]
pub enum RValue {
    Use(Operand),
    Binary(BinOp, Operand, Operand),
    Not(Operand),
    Cast(TypeId, Operand),
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Assign(Place, RValue),
    Call(ItemId, Vec<Operand>),
    Read(Place),
    ReadLn,
    Write(Operand, Option<Operand>),
    WriteLn,
}

#[derive(Debug, Clone, Copy)]
pub enum Terminator {
    Goto(BlockId),
    If(Operand, BlockId, BlockId),
    Return,
}

/// An ordered list of statements followed by exactly one terminator. No
/// block is shared between procedures; `terminator` is `None` only while
/// the lowerer is still filling the block in.
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub terminator: Option<Terminator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Program,
    Proc,
    Var,
    Param,
    LocalVar,
}

/// Code owned by an item that has a body of its own (`Program`, `Proc`).
#[derive(Debug, Clone)]
pub struct Body {
    pub entry_block: BlockId,
    pub items: Vec<ItemId>,
    pub locals: Vec<Local>,
}

/// A top-level or procedure-local declaration. Mirrors the resolver's
/// `Definition` plus an IR-only `use_sites` list the cross-reference printer
/// consumes directly instead of re-deriving it from semantic events.
#[derive(Debug, Clone)]
pub struct Item {
    pub kind: ItemKind,
    pub name: Symbol,
    pub ty: TypeId,
    pub definition_site: usize,
    pub use_sites: Vec<usize>,
    pub body: Option<Body>,
}

/// Owns every item, block, and constant produced while lowering one
/// compilation unit. Released together with the IR when the compilation
/// ends (`spec.md`'s "IR factory's arena is released together with the IR").
pub struct IrArena {
    items: Vec<Item>,
    blocks: Vec<Block>,
    constants: Vec<Constant>,
    constant_index: HopscotchTable<u32, ()>,
}

impl IrArena {
    pub fn new() -> Self {
        IrArena {
            items: Vec::new(),
            blocks: Vec::new(),
            constants: Vec::new(),
            constant_index: HopscotchTable::new(|_| 0, |_, _| false),
        }
    }

    pub fn alloc_item(&mut self, kind: ItemKind, name: Symbol, ty: TypeId, definition_site: usize) -> ItemId {
        let id = ItemId(self.items.len() as u32);
        self.items.push(Item {
            kind,
            name,
            ty,
            definition_site,
            use_sites: Vec::new(),
            body: None,
        });
        id
    }

    pub fn item(&self, id: ItemId) -> &Item {
        &self.items[id.0 as usize]
    }

    pub fn item_mut(&mut self, id: ItemId) -> &mut Item {
        &mut self.items[id.0 as usize]
    }

    pub fn record_use(&mut self, id: ItemId, use_site: usize) {
        self.items[id.0 as usize].use_sites.push(use_site);
    }

    pub fn set_body(&mut self, id: ItemId, body: Body) {
        self.items[id.0 as usize].body = Some(body);
    }

    pub fn alloc_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(Block::default());
        id
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.0 as usize]
    }

    pub fn push_stmt(&mut self, id: BlockId, stmt: Stmt) {
        self.blocks[id.0 as usize].stmts.push(stmt);
    }

    pub fn set_terminator(&mut self, id: BlockId, terminator: Terminator) {
        self.blocks[id.0 as usize].terminator = Some(terminator);
    }

    /// Interns `constant`, returning the same id for an equal constant on
    /// every call.
    pub fn intern_constant(&mut self, constant: Constant) -> ConstantId {
        let hash = hash_constant(&constant);
        if let Some(idx) = self
            .constant_index
            .find_hashed_pub(hash, |&idx| self.constants[idx as usize] == constant)
        {
            return ConstantId(idx);
        }
        let idx = self.constants.len() as u32;
        self.constants.push(constant);
        self.constant_index.insert_hashed_pub(hash, idx);
        ConstantId(idx)
    }

    pub fn constant(&self, id: ConstantId) -> &Constant {
        &self.constants[id.0 as usize]
    }

    /// Every interned constant paired with the id `intern_constant` handed
    /// back for it, in allocation order.
    pub fn constants(&self) -> impl Iterator<Item = (ConstantId, &Constant)> {
        self.constants.iter().enumerate().map(|(i, c)| (ConstantId(i as u32), c))
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

impl Default for IrArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interner::StringInterner;
    use crate::types::TypeTable;

    fn setup() -> (IrArena, TypeTable, StringInterner) {
        (IrArena::new(), TypeTable::new(), StringInterner::new())
    }

    #[test]
    fn interning_equal_constants_shares_one_id() {
        let (mut ir, _types, _interner) = setup();
        let a = ir.intern_constant(Constant::Number(7));
        let b = ir.intern_constant(Constant::Number(7));
        let c = ir.intern_constant(Constant::Number(8));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn string_constants_key_on_symbol_and_length() {
        let (mut ir, _types, mut interner) = setup();
        let sym = interner.intern("ab");
        let a = ir.intern_constant(Constant::String(sym, 2));
        let b = ir.intern_constant(Constant::String(sym, 2));
        let c = ir.intern_constant(Constant::String(sym, 3));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn items_record_definition_and_use_sites() {
        let (mut ir, mut types, mut interner) = setup();
        let int_ty = types.integer();
        let name = interner.intern("x");
        let item = ir.alloc_item(ItemKind::Var, name, int_ty, 10);
        ir.record_use(item, 20);
        ir.record_use(item, 30);
        assert_eq!(ir.item(item).use_sites, vec![20, 30]);
        assert_eq!(ir.item(item).definition_site, 10);
    }

    #[test]
    fn blocks_accumulate_statements_and_one_terminator() {
        let (mut ir, mut types, mut interner) = setup();
        let int_ty = types.integer();
        let name = interner.intern("x");
        let item = ir.alloc_item(ItemKind::Var, name, int_ty, 0);
        let local = Local::Var(item);
        let block = ir.alloc_block();
        let seven = ir.intern_constant(Constant::Number(7));
        ir.push_stmt(
            block,
            Stmt::Assign(Place::Plain(local), RValue::Use(Operand::Constant(seven))),
        );
        ir.set_terminator(block, Terminator::Return);
        assert_eq!(ir.block(block).stmts.len(), 1);
        assert!(matches!(ir.block(block).terminator, Some(Terminator::Return)));
    }

    #[test]
    fn proc_item_carries_a_body_with_its_own_locals() {
        let (mut ir, mut types, mut interner) = setup();
        let proc_ty = types.proc(vec![]);
        let name = interner.intern("p");
        let proc_item = ir.alloc_item(ItemKind::Proc, name, proc_ty, 0);
        let entry = ir.alloc_block();
        ir.set_terminator(entry, Terminator::Return);
        ir.set_body(
            proc_item,
            Body {
                entry_block: entry,
                items: Vec::new(),
                locals: Vec::new(),
            },
        );
        assert!(ir.item(proc_item).body.is_some());
        assert_eq!(ir.item(proc_item).body.as_ref().unwrap().entry_block, entry);
    }

    #[test]
    fn call_stmt_names_its_callee_by_item_not_place() {
        let (mut ir, mut types, mut interner) = setup();
        let proc_ty = types.proc(vec![]);
        let name = interner.intern("q");
        let callee = ir.alloc_item(ItemKind::Proc, name, proc_ty, 0);
        let block = ir.alloc_block();
        ir.push_stmt(block, Stmt::Call(callee, Vec::new()));
        assert!(matches!(&ir.block(block).stmts[0], Stmt::Call(id, args) if *id == callee && args.is_empty()));
    }
}
