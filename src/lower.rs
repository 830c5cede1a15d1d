//! Lowers a checked typed syntax view into per-item control-flow graphs in
//! an [`IrArena`], grounded line-for-line on the original compiler's
//! `lower.c`: same short-circuit `and`/`or` block shape, same if/else join
//! reuse when there is no `else`, same while-loop condition/body/join
//! blocks with a saved-and-restored break target, same right-to-left
//! argument lowering order, same implicit `Return` appended to every body.
//!
//! Unlike the checker, the lowerer does not re-validate types or emit
//! diagnostics: it trusts the [`CheckResult`] it is handed, the same way
//! `lower.c` trusts its own `ir_type_t` bookkeeping once a node is reached
//! (the original aborts the process on a type mismatch at lowering time,
//! which can't happen here because the checker already rejected the
//! program before `lower` is ever called).

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::{self, AstNode, Expr, Stmt};
use crate::checker::{node_id, CheckResult, Value};
use crate::cst::SyntaxTree;
use crate::interner::Symbol;
use crate::ir::{
    BinOp, BlockId, Body, Constant, IrArena, ItemId, ItemKind, Local, Operand, Place, RValue, Stmt as IrStmt,
    Terminator,
};
use crate::resolver::SemanticEvent;
use crate::syntax_kind::SyntaxKind;
use crate::types::{StandardType, TypeId, TypeTable};

pub struct LowerResult {
    pub arena: IrArena,
    pub program_item: ItemId,
}

/// Strips a Pascal-style quoted string literal's delimiters and collapses
/// `''` escapes into a single `'`, so callers see the string's actual
/// content rather than its source spelling.
fn string_literal_content(text: &str) -> String {
    let inner = &text[1..text.len().saturating_sub(1)];
    inner.replace("''", "'")
}

struct Lowerer<'a> {
    arena: IrArena,
    types: &'a mut TypeTable,
    full_text: &'a str,
    use_to_decl: HashMap<usize, usize>,
    decl_to_item: HashMap<usize, ItemId>,
    bind_types: &'a HashMap<usize, TypeId>,
    expr_types: &'a HashMap<usize, Value>,
    intern: &'a mut dyn FnMut(&str) -> Symbol,
    break_target: Option<BlockId>,
    locals: Vec<Local>,
}

impl<'a> Lowerer<'a> {
    fn text_of(&self, node: &Rc<SyntaxTree>) -> &'a str {
        match node.token_span() {
            Some((start, end)) => &self.full_text[start..end],
            None => "",
        }
    }

    fn expr_ty(&self, node: &Rc<SyntaxTree>) -> Option<TypeId> {
        self.expr_types.get(&node_id(node)).and_then(|v| v.ty)
    }

    fn kw_type(&mut self, kw: &Rc<SyntaxTree>) -> TypeId {
        match kw.kind() {
            SyntaxKind::BooleanKw => self.types.boolean(),
            SyntaxKind::CharKw => self.types.char(),
            _ => self.types.integer(),
        }
    }

    fn fresh_block(&mut self) -> BlockId {
        self.arena.alloc_block()
    }

    fn push_stmt(&mut self, block: BlockId, stmt: IrStmt) {
        self.arena.push_stmt(block, stmt);
    }

    /// Allocates a stack-resident temporary of `ty`, falling back to
    /// `integer` if the checker somehow left a non-standard type on an
    /// rvalue (can't happen for a program that passed the checker, but
    /// `fresh_temp` stays total rather than panicking).
    fn fresh_temp(&mut self, ty: TypeId) -> Local {
        let std = match StandardType::new(self.types, ty) {
            Some(s) => s,
            None => {
                let int_ty = self.types.integer();
                StandardType::new(self.types, int_ty).expect("integer is always standard")
            }
        };
        let local = Local::Temp(std);
        self.locals.push(local);
        local
    }

    fn fallback_constant(&mut self) -> Operand {
        Operand::Constant(self.arena.intern_constant(Constant::Number(0)))
    }

    fn item_for_name(&self, name: &Rc<SyntaxTree>) -> Option<ItemId> {
        let (start, _) = name.token_span()?;
        let declared_at = *self.use_to_decl.get(&start)?;
        self.decl_to_item.get(&declared_at).copied()
    }

    fn local_for_item(&self, item: ItemId) -> Local {
        match self.arena.item(item).kind {
            ItemKind::Param => Local::Arg(item),
            _ => Local::Var(item),
        }
    }

    /// Registers a declared name as a fresh item, typed from the checker's
    /// `bind_types` (keyed by the same declaration offset), and records it
    /// in `decl_to_item` so later uses resolve to it.
    fn register_name(&mut self, name: &Rc<SyntaxTree>, kind: ItemKind) -> Option<ItemId> {
        let (start, _) = name.token_span()?;
        let ty = *self.bind_types.get(&start)?;
        let text = self.text_of(name);
        let sym = (self.intern)(text);
        let item = self.arena.alloc_item(kind, sym, ty, start);
        self.decl_to_item.insert(start, item);
        Some(item)
    }

    fn register_proc(&mut self, proc: &ast::ProcDecl) -> Option<ItemId> {
        let name = proc.name()?;
        self.register_name(&name, ItemKind::Proc)
    }

    // -- expressions --------------------------------------------------

    fn lower_place(&mut self, expr: &Expr, block: &mut BlockId) -> Option<Place> {
        match expr {
            Expr::EntireVar(v) => {
                let name = v.name()?;
                let item = self.item_for_name(&name)?;
                if let Some(offset) = name.token_span().map(|(s, _)| s) {
                    self.arena.record_use(item, offset);
                }
                Some(Place::Plain(self.local_for_item(item)))
            }
            Expr::IndexedVar(v) => {
                let name = v.name()?;
                let item = self.item_for_name(&name)?;
                if let Some(offset) = name.token_span().map(|(s, _)| s) {
                    self.arena.record_use(item, offset);
                }
                let local = self.local_for_item(item);
                let index_expr = v.index()?;
                let index_operand = self.lower_operand(&index_expr, block);
                Some(Place::Indexed(local, index_operand))
            }
            Expr::Paren(p) => self.lower_place(&p.inner()?, block),
            _ => None,
        }
    }

    fn lower_literal(&mut self, tree: &Rc<SyntaxTree>) -> Operand {
        match tree.kind() {
            SyntaxKind::NumberLit => {
                let n: i16 = self.text_of(tree).parse().unwrap_or(0);
                Operand::Constant(self.arena.intern_constant(Constant::Number(n)))
            }
            SyntaxKind::TrueKw => Operand::Constant(self.arena.intern_constant(Constant::Boolean(true))),
            SyntaxKind::FalseKw => Operand::Constant(self.arena.intern_constant(Constant::Boolean(false))),
            SyntaxKind::StringLit => {
                let content = string_literal_content(self.text_of(tree));
                if content.chars().count() == 1 {
                    let ch = content.bytes().next().unwrap_or(b' ');
                    Operand::Constant(self.arena.intern_constant(Constant::Char(ch)))
                } else {
                    let len = content.chars().count() as u32;
                    let sym = (self.intern)(&content);
                    Operand::Constant(self.arena.intern_constant(Constant::String(sym, len)))
                }
            }
            _ => self.fallback_constant(),
        }
    }

    fn lower_operand(&mut self, expr: &Expr, block: &mut BlockId) -> Operand {
        match expr {
            Expr::EntireVar(_) | Expr::IndexedVar(_) => match self.lower_place(expr, block) {
                Some(place) => Operand::Place(place),
                None => self.fallback_constant(),
            },
            Expr::Paren(p) => match p.inner() {
                Some(inner) => self.lower_operand(&inner, block),
                None => self.fallback_constant(),
            },
            Expr::Literal(tree) => self.lower_literal(tree),
            Expr::Binary(b) => self.lower_binary(b, block),
            Expr::Not(u) => self.lower_unary(u, block),
            Expr::Cast(c) => self.lower_cast(c, block),
        }
    }

    fn lower_binary(&mut self, b: &ast::BinaryExpr, block: &mut BlockId) -> Operand {
        let op_kind = b.op().map(|o| o.kind());
        if matches!(op_kind, Some(SyntaxKind::AndKw | SyntaxKind::OrKw)) {
            return self.lower_and_or(b, op_kind.unwrap(), block);
        }

        let lhs = b.lhs().map(|e| self.lower_operand(&e, block));
        let rhs = b.rhs().map(|e| self.lower_operand(&e, block));
        let (Some(lhs), Some(rhs)) = (lhs, rhs) else {
            return self.fallback_constant();
        };

        let bin_op = match op_kind {
            Some(SyntaxKind::PlusToken) => BinOp::Add,
            Some(SyntaxKind::MinusToken) => BinOp::Sub,
            Some(SyntaxKind::StarToken) => BinOp::Mul,
            Some(SyntaxKind::DivKw) => BinOp::Div,
            Some(SyntaxKind::EqualToken) => BinOp::Eq,
            Some(SyntaxKind::NotEqToken) => BinOp::NotEq,
            Some(SyntaxKind::LessToken) => BinOp::Less,
            Some(SyntaxKind::LessEqToken) => BinOp::LessEq,
            Some(SyntaxKind::GreaterToken) => BinOp::Greater,
            Some(SyntaxKind::GreaterEqToken) => BinOp::GreaterEq,
            _ => return self.fallback_constant(),
        };

        let result_ty = self.expr_ty(b.syntax()).unwrap_or_else(|| self.types.integer());
        let temp = self.fresh_temp(result_ty);
        self.push_stmt(*block, IrStmt::Assign(Place::Plain(temp), RValue::Binary(bin_op, lhs, rhs)));
        Operand::Place(Place::Plain(temp))
    }

    /// `lhs` is evaluated eagerly; `rhs` is only reached through the branch
    /// that needs it. Both paths assign into the same `result` temp before
    /// joining at `shortcircuit`.
    fn lower_and_or(&mut self, b: &ast::BinaryExpr, op: SyntaxKind, block: &mut BlockId) -> Operand {
        let Some(lhs_expr) = b.lhs() else { return self.fallback_constant() };
        let lhs = self.lower_operand(&lhs_expr, block);

        let mut rhs_block = self.fresh_block();
        let shortcircuit = self.fresh_block();
        let bool_ty = self.types.boolean();
        let result = self.fresh_temp(bool_ty);

        self.push_stmt(*block, IrStmt::Assign(Place::Plain(result), RValue::Use(lhs)));
        let result_operand = Operand::Place(Place::Plain(result));
        match op {
            SyntaxKind::OrKw => self.arena.set_terminator(*block, Terminator::If(result_operand, shortcircuit, rhs_block)),
            SyntaxKind::AndKw => self.arena.set_terminator(*block, Terminator::If(result_operand, rhs_block, shortcircuit)),
            _ => unreachable!("lower_and_or only dispatched for and/or"),
        }

        if let Some(rhs_expr) = b.rhs() {
            let rhs = self.lower_operand(&rhs_expr, &mut rhs_block);
            self.push_stmt(rhs_block, IrStmt::Assign(Place::Plain(result), RValue::Use(rhs)));
        }
        self.arena.set_terminator(rhs_block, Terminator::Goto(shortcircuit));
        *block = shortcircuit;
        result_operand
    }

    fn lower_unary(&mut self, u: &ast::NotExpr, block: &mut BlockId) -> Operand {
        let Some(operand_expr) = u.operand() else { return self.fallback_constant() };
        let operand = self.lower_operand(&operand_expr, block);

        match u.op().map(|o| o.kind()) {
            // Unary `+` is a no-op at the value level; the checker already
            // required an integer operand.
            Some(SyntaxKind::PlusToken) => operand,
            Some(SyntaxKind::MinusToken) => {
                let zero = Operand::Constant(self.arena.intern_constant(Constant::Number(0)));
                let int_ty = self.types.integer();
                let temp = self.fresh_temp(int_ty);
                self.push_stmt(*block, IrStmt::Assign(Place::Plain(temp), RValue::Binary(BinOp::Sub, zero, operand)));
                Operand::Place(Place::Plain(temp))
            }
            Some(SyntaxKind::NotKw) => {
                let bool_ty = self.types.boolean();
                let temp = self.fresh_temp(bool_ty);
                self.push_stmt(*block, IrStmt::Assign(Place::Plain(temp), RValue::Not(operand)));
                Operand::Place(Place::Plain(temp))
            }
            _ => self.fallback_constant(),
        }
    }

    fn lower_cast(&mut self, c: &ast::CastExpr, block: &mut BlockId) -> Operand {
        let Some(operand_expr) = c.operand() else { return self.fallback_constant() };
        let operand = self.lower_operand(&operand_expr, block);
        let target_ty = match c.target_type_kw() {
            Some(kw) => self.kw_type(&kw),
            None => self.types.integer(),
        };
        let temp = self.fresh_temp(target_ty);
        self.push_stmt(*block, IrStmt::Assign(Place::Plain(temp), RValue::Cast(target_ty, operand)));
        Operand::Place(Place::Plain(temp))
    }

    // -- statements ---------------------------------------------------

    fn lower_stmt(&mut self, stmt: &Stmt, block: &mut BlockId) {
        match stmt {
            Stmt::Assign(s) => self.lower_assign(s, block),
            Stmt::If(s) => self.lower_if(s, block),
            Stmt::While(s) => self.lower_while(s, block),
            Stmt::Break(_) => {
                if let Some(target) = self.break_target {
                    self.arena.set_terminator(*block, Terminator::Goto(target));
                }
                *block = self.fresh_block();
            }
            Stmt::Call(s) => self.lower_call(s, block),
            Stmt::Return(_) => {
                self.arena.set_terminator(*block, Terminator::Return);
                *block = self.fresh_block();
            }
            Stmt::Input(s) => self.lower_input(s, block),
            Stmt::Output(s) => self.lower_output(s, block),
            Stmt::Comp(s) => {
                for inner in s.statements() {
                    self.lower_stmt(&inner, block);
                }
            }
        }
    }

    fn lower_assign(&mut self, s: &ast::AssignStmt, block: &mut BlockId) {
        let Some(lhs_expr) = s.lhs() else { return };
        let Some(place) = self.lower_place(&lhs_expr, block) else { return };
        let Some(rhs_expr) = s.rhs() else { return };
        let rhs = self.lower_operand(&rhs_expr, block);
        self.push_stmt(*block, IrStmt::Assign(place, RValue::Use(rhs)));
    }

    /// `if` without `else` reuses the else block as the join: nothing runs
    /// on the false path, so there is no reason to allocate a third block.
    fn lower_if(&mut self, s: &ast::IfStmt, block: &mut BlockId) {
        let cond = match s.condition() {
            Some(c) => self.lower_operand(&c, block),
            None => self.fallback_constant(),
        };
        let mut then_block = self.fresh_block();
        let mut else_block = self.fresh_block();
        self.arena.set_terminator(*block, Terminator::If(cond, then_block, else_block));

        if let Some(then_stmt) = s.then_stmt() {
            self.lower_stmt(&then_stmt, &mut then_block);
        }

        let join = if let Some(else_stmt) = s.else_stmt() {
            let join = self.fresh_block();
            self.lower_stmt(&else_stmt, &mut else_block);
            self.arena.set_terminator(else_block, Terminator::Goto(join));
            join
        } else {
            else_block
        };

        self.arena.set_terminator(then_block, Terminator::Goto(join));
        *block = join;
    }

    /// `break` targets the nested-most while's join block, tracked via
    /// `break_target` saved before entering the loop body and restored
    /// after, so a loop inside this one doesn't leak its own target out.
    fn lower_while(&mut self, s: &ast::WhileStmt, block: &mut BlockId) {
        let cond_begin = self.fresh_block();
        let mut cond_end = cond_begin;
        let cond = match s.condition() {
            Some(c) => self.lower_operand(&c, &mut cond_end),
            None => self.fallback_constant(),
        };

        let previous_break = self.break_target;
        let mut do_block = self.fresh_block();
        let join = self.fresh_block();
        self.break_target = Some(join);

        self.arena.set_terminator(cond_end, Terminator::If(cond, do_block, join));
        if let Some(body) = s.body() {
            self.lower_stmt(&body, &mut do_block);
        }
        self.arena.set_terminator(*block, Terminator::Goto(cond_begin));
        self.arena.set_terminator(do_block, Terminator::Goto(cond_begin));

        *block = join;
        self.break_target = previous_break;
    }

    fn lower_call(&mut self, s: &ast::CallStmt, block: &mut BlockId) {
        let Some(name) = s.name() else { return };
        let Some(callee) = self.item_for_name(&name) else { return };
        if let Some(offset) = name.token_span().map(|(start, _)| start) {
            self.arena.record_use(callee, offset);
        }
        let args = s.args();
        let operands = self.lower_call_args(&args, block);
        self.push_stmt(*block, IrStmt::Call(callee, operands));
    }

    /// Lowers right-to-left (recurse to the tail first, then the head),
    /// matching the order the original compiler pushes argument addresses
    /// onto the CASL2 call stack, while still returning them left-to-right.
    fn lower_call_args(&mut self, args: &[Expr], block: &mut BlockId) -> Vec<Operand> {
        match args.split_first() {
            None => Vec::new(),
            Some((first, rest)) => {
                let mut tail = self.lower_call_args(rest, block);
                let head = self.lower_operand(first, block);
                tail.insert(0, head);
                tail
            }
        }
    }

    fn lower_input(&mut self, s: &ast::InputStmt, block: &mut BlockId) {
        for target in s.targets() {
            if let Some(place) = self.lower_place(&target, block) {
                self.push_stmt(*block, IrStmt::Read(place));
            }
        }
        if s.is_readln() {
            self.push_stmt(*block, IrStmt::ReadLn);
        }
    }

    fn lower_output(&mut self, s: &ast::OutputStmt, block: &mut BlockId) {
        for value in s.values() {
            let Some(expr) = value.expr() else { continue };

            if let Expr::Literal(tree) = &expr {
                if tree.kind() == SyntaxKind::StringLit {
                    let content = string_literal_content(self.text_of(tree));
                    if content.chars().count() != 1 {
                        let len = content.chars().count() as u32;
                        let sym = (self.intern)(&content);
                        let constant = self.arena.intern_constant(Constant::String(sym, len));
                        self.push_stmt(*block, IrStmt::Write(Operand::Constant(constant), None));
                        continue;
                    }
                }
            }

            let operand = self.lower_operand(&expr, block);
            let width = value.width_lit().map(|lit| {
                let n: i16 = self.text_of(&lit).parse().unwrap_or(0);
                Operand::Constant(self.arena.intern_constant(Constant::Number(n)))
            });
            self.push_stmt(*block, IrStmt::Write(operand, width));
        }
        if s.is_writeln() {
            self.push_stmt(*block, IrStmt::WriteLn);
        }
    }

    fn lower_proc_body(&mut self, proc: &ast::ProcDecl, proc_item: ItemId) {
        let outer_locals = std::mem::take(&mut self.locals);
        let mut body_items = Vec::new();

        if let Some(params) = proc.fml_params() {
            for sec in params.sections() {
                for name in sec.names() {
                    if let Some(item) = self.register_name(&name, ItemKind::Param) {
                        self.locals.push(Local::Arg(item));
                        body_items.push(item);
                    }
                }
            }
        }
        if let Some(part) = proc.var_decl_part() {
            for decl in part.decls() {
                for name in decl.names() {
                    if let Some(item) = self.register_name(&name, ItemKind::LocalVar) {
                        self.locals.push(Local::Var(item));
                        body_items.push(item);
                    }
                }
            }
        }

        let entry = self.fresh_block();
        let mut cursor = entry;
        if let Some(body) = proc.body() {
            self.lower_stmt(&Stmt::Comp(body), &mut cursor);
        }
        self.arena.set_terminator(cursor, Terminator::Return);

        let proc_locals = std::mem::replace(&mut self.locals, outer_locals);
        self.arena.set_body(proc_item, Body { entry_block: entry, items: body_items, locals: proc_locals });
    }
}

/// Lowers a checked `Program` into an [`IrArena`], given the resolver's
/// event stream (to follow name uses back to their declarations) and the
/// checker's result (for every declaration's and expression's type).
/// `intern` is the caller's symbol interner, shared with the resolver so
/// item names and string constants land in the same table as identifiers.
pub fn lower(
    program: &ast::Program,
    full_text: &str,
    events: &[SemanticEvent],
    types: &mut TypeTable,
    checked: &CheckResult,
    intern: &mut dyn FnMut(&str) -> Symbol,
) -> LowerResult {
    let mut use_to_decl = HashMap::new();
    for event in events {
        if let SemanticEvent::Use { declared_at, used_at } = event {
            use_to_decl.insert(*used_at, *declared_at);
        }
    }

    let program_ty = types.proc(Vec::new());
    let mut lowerer = Lowerer {
        arena: IrArena::new(),
        types,
        full_text,
        use_to_decl,
        decl_to_item: HashMap::new(),
        bind_types: &checked.bind_types,
        expr_types: &checked.expr_types,
        intern,
        break_target: None,
        locals: Vec::new(),
    };

    let program_name = program.name();
    let program_offset = program_name.as_ref().and_then(|n| n.token_span()).map(|(s, _)| s).unwrap_or(0);
    let program_sym = match &program_name {
        Some(n) => {
            let text = lowerer.text_of(n);
            (lowerer.intern)(text)
        }
        None => (lowerer.intern)(""),
    };
    let program_item = lowerer.arena.alloc_item(ItemKind::Program, program_sym, program_ty, program_offset);

    let mut body_items = Vec::new();
    if let Some(part) = program.var_decl_part() {
        for decl in part.decls() {
            for name in decl.names() {
                if let Some(item) = lowerer.register_name(&name, ItemKind::Var) {
                    lowerer.locals.push(Local::Var(item));
                    body_items.push(item);
                }
            }
        }
    }

    // Every procedure's item is registered before any body is lowered, so
    // a forward reference or a self-recursive call resolves through
    // `decl_to_item` regardless of source order.
    let procs = program.proc_decls();
    let mut proc_items: Vec<Option<ItemId>> = Vec::new();
    for proc in &procs {
        let item = lowerer.register_proc(proc);
        if let Some(item) = item {
            body_items.push(item);
        }
        proc_items.push(item);
    }

    let entry = lowerer.fresh_block();
    let mut cursor = entry;
    if let Some(body) = program.body() {
        lowerer.lower_stmt(&Stmt::Comp(body), &mut cursor);
    }
    lowerer.arena.set_terminator(cursor, Terminator::Return);

    let program_locals = std::mem::take(&mut lowerer.locals);
    lowerer.arena.set_body(program_item, Body { entry_block: entry, items: body_items, locals: program_locals });

    for (proc, item) in procs.iter().zip(proc_items.iter()) {
        if let Some(item) = item {
            lowerer.lower_proc_body(proc, *item);
        }
    }

    LowerResult { arena: lowerer.arena, program_item }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker;
    use crate::cst::{token, tree, Slot, Trivia};
    use crate::interner::StringInterner;
    use crate::resolver;

    fn ident(text: &str) -> Rc<crate::cst::RawNode> {
        token(SyntaxKind::IdentToken, text.len(), Trivia::default(), Trivia::default())
    }

    fn num(text: &str) -> Rc<crate::cst::RawNode> {
        token(SyntaxKind::NumberLit, text.len(), Trivia::default(), Trivia::default())
    }

    fn build(program: Rc<crate::cst::RawNode>, text: &str) -> LowerResult {
        let root = SyntaxTree::new_root(program);
        let mut interner = StringInterner::new();
        let resolved = resolver::resolve(&root, text, &mut |s| interner.intern(s));
        assert!(resolved.diagnostics.is_empty(), "{:?}", resolved.diagnostics);
        let ast_program = ast::Program::cast(root).expect("root casts to Program");
        let mut types = TypeTable::new();
        let checked = checker::check(&ast_program, text, &resolved.events, &mut types);
        assert!(checked.diagnostics.is_empty(), "{:?}", checked.diagnostics);
        lower(&ast_program, text, &resolved.events, &mut types, &checked, &mut |s| interner.intern(s))
    }

    /// `program p; var x: integer; begin x := 1 end.`
    #[test]
    fn assign_lowers_to_single_block_ending_in_return() {
        let decl_name = ident("x");
        let var_decl = tree(
            SyntaxKind::VarDecl,
            vec![Slot::Node(decl_name), Slot::Node(token(SyntaxKind::IntegerKw, 7, Trivia::default(), Trivia::default()))],
        );
        let var_decl_part = tree(SyntaxKind::VarDeclPart, vec![Slot::Node(var_decl)]);

        let use_name = ident("x");
        let entire_var = tree(SyntaxKind::EntireVar, vec![Slot::Node(use_name)]);
        let rhs = num("1");
        let assign = tree(SyntaxKind::AssignStmt, vec![Slot::Node(entire_var), Slot::Node(rhs)]);
        let comp = tree(SyntaxKind::CompStmt, vec![Slot::Node(assign)]);

        let prog_name = ident("p");
        let program = tree(
            SyntaxKind::Program,
            vec![Slot::Node(prog_name), Slot::Node(var_decl_part), Slot::Empty, Slot::Node(comp)],
        );
        let text = "pxintegerx1";
        let result = build(program, text);

        let entry = result.arena.item(result.program_item).body.as_ref().unwrap().entry_block;
        let block = result.arena.block(entry);
        assert_eq!(block.stmts.len(), 1);
        assert!(matches!(block.stmts[0], IrStmt::Assign(_, RValue::Use(_))));
        assert!(matches!(block.terminator, Some(Terminator::Return)));
    }

    /// `program p; begin if true then begin end end.` — no else branch
    /// reuses the else block as the join target.
    #[test]
    fn if_without_else_reuses_else_block_as_join() {
        let cond = token(SyntaxKind::TrueKw, 4, Trivia::default(), Trivia::default());
        let then_branch = tree(SyntaxKind::CompStmt, vec![]);
        let if_stmt = tree(SyntaxKind::IfStmt, vec![Slot::Node(cond), Slot::Node(then_branch)]);
        let comp = tree(SyntaxKind::CompStmt, vec![Slot::Node(if_stmt)]);
        let prog_name = ident("p");
        let program = tree(SyntaxKind::Program, vec![Slot::Node(prog_name), Slot::Empty, Slot::Empty, Slot::Node(comp)]);
        let text = "ptrue";
        let result = build(program, text);

        let entry = result.arena.item(result.program_item).body.as_ref().unwrap().entry_block;
        let entry_block = result.arena.block(entry);
        let Some(Terminator::If(_, then_id, else_id)) = entry_block.terminator else {
            panic!("expected an If terminator");
        };
        let then_block = result.arena.block(then_id);
        let Some(Terminator::Goto(join_from_then)) = then_block.terminator else {
            panic!("expected then block to end in Goto")
        };
        assert_eq!(join_from_then, else_id);
    }

    /// `program p; begin while true do begin break end end.`
    #[test]
    fn break_targets_the_while_loops_join_block() {
        let cond = token(SyntaxKind::TrueKw, 4, Trivia::default(), Trivia::default());
        let break_stmt = tree(SyntaxKind::BreakStmt, vec![]);
        let do_body = tree(SyntaxKind::CompStmt, vec![Slot::Node(break_stmt)]);
        let while_stmt = tree(SyntaxKind::WhileStmt, vec![Slot::Node(cond), Slot::Node(do_body)]);
        let comp = tree(SyntaxKind::CompStmt, vec![Slot::Node(while_stmt)]);
        let prog_name = ident("p");
        let program = tree(SyntaxKind::Program, vec![Slot::Node(prog_name), Slot::Empty, Slot::Empty, Slot::Node(comp)]);
        let text = "ptrue";
        let result = build(program, text);

        let entry = result.arena.item(result.program_item).body.as_ref().unwrap().entry_block;
        let entry_block = result.arena.block(entry);
        let Some(Terminator::Goto(cond_begin)) = entry_block.terminator else {
            panic!("expected entry to Goto the condition block")
        };
        let cond_block = result.arena.block(cond_begin);
        let Some(Terminator::If(_, do_block, join)) = cond_block.terminator else {
            panic!("expected condition block to end in If")
        };
        let do_block = result.arena.block(do_block);
        let Some(Terminator::Goto(break_target)) = do_block.terminator else {
            panic!("expected break to Goto somewhere")
        };
        assert_eq!(break_target, join);
    }

    /// `program p; procedure q(a: integer; b: integer); begin end; begin call q(1, 2) end.`
    #[test]
    fn call_args_are_returned_in_source_order() {
        let a_name = ident("a");
        let a_sec = tree(
            SyntaxKind::FmlParamSec,
            vec![Slot::Node(a_name), Slot::Node(token(SyntaxKind::IntegerKw, 7, Trivia::default(), Trivia::default()))],
        );
        let b_name = ident("b");
        let b_sec = tree(
            SyntaxKind::FmlParamSec,
            vec![Slot::Node(b_name), Slot::Node(token(SyntaxKind::IntegerKw, 7, Trivia::default(), Trivia::default()))],
        );
        let fml_list = tree(SyntaxKind::FmlParamList, vec![Slot::Node(a_sec), Slot::Node(b_sec)]);
        let proc_name = ident("q");
        let proc_body = tree(SyntaxKind::CompStmt, vec![]);
        let proc_decl = tree(
            SyntaxKind::ProcDecl,
            vec![Slot::Node(proc_name), Slot::Node(fml_list), Slot::Empty, Slot::Node(proc_body)],
        );

        let call_name = ident("q");
        let arg1 = num("1");
        let arg2 = num("2");
        let act_params = tree(SyntaxKind::ActParamList, vec![Slot::Node(arg1), Slot::Node(arg2)]);
        let call_stmt = tree(SyntaxKind::CallStmt, vec![Slot::Node(call_name), Slot::Node(act_params)]);
        let outer_comp = tree(SyntaxKind::CompStmt, vec![Slot::Node(call_stmt)]);

        let prog_name = ident("p");
        let program = tree(
            SyntaxKind::Program,
            vec![Slot::Node(prog_name), Slot::Empty, Slot::Node(proc_decl), Slot::Node(outer_comp)],
        );
        let text = "pqaintegerbintegerq12";
        let result = build(program, text);

        let entry = result.arena.item(result.program_item).body.as_ref().unwrap().entry_block;
        let mut block_id = entry;
        loop {
            let block = result.arena.block(block_id);
            if let Some(IrStmt::Call(_, args)) = block.stmts.first() {
                assert_eq!(args.len(), 2);
                match (&args[0], &args[1]) {
                    (Operand::Constant(c1), Operand::Constant(c2)) => {
                        assert_eq!(*result.arena.constant(*c1), Constant::Number(1));
                        assert_eq!(*result.arena.constant(*c2), Constant::Number(2));
                    }
                    _ => panic!("expected constant args"),
                }
                break;
            }
            match block.terminator {
                Some(Terminator::Goto(next)) => block_id = next,
                _ => panic!("call statement not found"),
            }
        }
    }
}
