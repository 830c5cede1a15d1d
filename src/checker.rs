//! Type checking: walks the typed syntax view top-down, assigning each
//! expression a [`Value`] (an lvalue/rvalue-or-error tag plus a type) and
//! each declared name a [`TypeId`], pushing a diagnostic for every rule
//! violation along the way.
//!
//! Grounded on the original compiler's `mppl_checker.c`: same `Value`
//! kind/type split, same per-operator-class rule groups in
//! `check_binary_expr`/`check_unary_expr`, same string-literal length/escape
//! rule for Char vs. String, same declaration-to-bound-name wiring in
//! `check_var_decl`/`check_proc_heading`. Declaration types are threaded
//! through a `declared_at offset -> TypeId` map built while walking
//! `VarDecl`/`FmlParamSec`/`ProcDecl` nodes, and a use site's declared type is
//! found by following the resolver's `Use { declared_at, used_at }` events
//! rather than re-walking scopes (the checker only needs "what does this
//! identifier refer to", which the resolver already computed).
//!
//! One rule has no counterpart in the original: `spec.md`'s "a procedure
//! calling itself through any depth of the current scope stack" is enforced
//! here via a stack of the declaration offsets of procedures currently being
//! checked (`active_procs`); a call whose target offset appears on that stack
//! is a `recursive-call`, and skips the usual proc-type/argument checks.

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::{self, AstNode, Expr, Stmt};
use crate::cst::SyntaxTree;
use crate::diagnostic::{builders, Diagnostic};
use crate::resolver::SemanticEvent;
use crate::syntax_kind::SyntaxKind;
use crate::types::{TypeId, TypeTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Error,
    Lvalue,
    Rvalue,
}

/// The type (if any) and assignability of one expression, computed bottom-up
/// the way `mppl_checker.c`'s `Value` is.
#[derive(Debug, Clone, Copy)]
pub struct Value {
    pub kind: ValueKind,
    pub ty: Option<TypeId>,
}

impl Value {
    fn error() -> Value {
        Value { kind: ValueKind::Error, ty: None }
    }

    fn rvalue(ty: TypeId) -> Value {
        Value { kind: ValueKind::Rvalue, ty: Some(ty) }
    }

    fn lvalue(ty: TypeId) -> Value {
        Value { kind: ValueKind::Lvalue, ty: Some(ty) }
    }
}

pub struct CheckResult {
    pub diagnostics: Vec<Diagnostic>,
    /// Every checked expression's computed type, keyed by the raw node's
    /// identity (`Rc::as_ptr`), for the lowerer to reuse without re-deriving.
    pub expr_types: HashMap<usize, Value>,
    /// Every declared name's type, keyed by the identifier's own start
    /// offset (matches `SemanticEvent::{Define,Use}`'s `declared_at`).
    pub bind_types: HashMap<usize, TypeId>,
}

/// Keys `expr_types`/`bind_types` by the underlying raw node's identity.
/// Shared with the lowerer, which looks the same expressions back up by the
/// same key rather than re-deriving their types.
pub(crate) fn node_id(node: &Rc<SyntaxTree>) -> usize {
    Rc::as_ptr(&node.raw) as usize
}

fn parse_array_length(text: &str) -> u32 {
    text.parse().unwrap_or(0)
}

struct Checker<'a> {
    types: &'a mut TypeTable,
    full_text: &'a str,
    use_to_decl: HashMap<usize, usize>,
    bind_types: HashMap<usize, TypeId>,
    expr_types: HashMap<usize, Value>,
    active_procs: Vec<usize>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Checker<'a> {
    fn text_of(&self, node: &Rc<SyntaxTree>) -> &'a str {
        match node.token_span() {
            Some((start, end)) => &self.full_text[start..end],
            None => "",
        }
    }

    fn span_of(&self, node: &Rc<SyntaxTree>) -> (usize, usize) {
        node.token_span().unwrap_or((node.absolute_offset, node.end_offset()))
    }

    fn bind(&mut self, name: &Rc<SyntaxTree>, ty: TypeId) {
        let (start, _) = self.span_of(name);
        self.bind_types.insert(start, ty);
    }

    fn lookup_use(&self, name: &Rc<SyntaxTree>) -> Option<TypeId> {
        let (start, _) = name.token_span()?;
        let declared_at = *self.use_to_decl.get(&start)?;
        self.bind_types.get(&declared_at).copied()
    }

    fn lookup_decl_offset(&self, name: &Rc<SyntaxTree>) -> Option<usize> {
        let (start, _) = name.token_span()?;
        self.use_to_decl.get(&start).copied()
    }

    fn record_expr(&mut self, node: &Rc<SyntaxTree>, value: Value) -> Value {
        self.expr_types.insert(node_id(node), value);
        value
    }

    fn kw_type(&mut self, kw: &Rc<SyntaxTree>) -> TypeId {
        match kw.kind() {
            SyntaxKind::BooleanKw => self.types.boolean(),
            SyntaxKind::CharKw => self.types.char(),
            _ => self.types.integer(),
        }
    }

    fn declared_type_of_array(&mut self, array_ty: &ast::ArrayType) -> TypeId {
        let base = match array_ty.elem_type_kw() {
            Some(kw) => self.kw_type(&kw),
            None => self.types.integer(),
        };
        let length = array_ty
            .size_lit()
            .map(|lit| parse_array_length(self.text_of(&lit)))
            .unwrap_or(0);
        if length == 0 {
            let (start, end) = self.span_of(array_ty.syntax());
            self.diagnostics.push(builders::zero_sized_array(start, end - start));
        }
        self.types.array(base, length)
    }

    fn declared_type_of_var_decl(&mut self, decl: &ast::VarDecl) -> TypeId {
        if let Some(array_ty) = decl.array_type() {
            self.declared_type_of_array(&array_ty)
        } else if let Some(kw) = decl.scalar_type_kw() {
            self.kw_type(&kw)
        } else {
            self.types.integer()
        }
    }

    fn declared_type_of_fml_param_sec(&mut self, sec: &ast::FmlParamSec) -> TypeId {
        if let Some(array_ty) = sec.array_type() {
            self.declared_type_of_array(&array_ty)
        } else if let Some(kw) = sec.scalar_type_kw() {
            self.kw_type(&kw)
        } else {
            self.types.integer()
        }
    }

    fn check_var_decl_part(&mut self, part: &ast::VarDeclPart) {
        for decl in part.decls() {
            let ty = self.declared_type_of_var_decl(&decl);
            for name in decl.names() {
                self.bind(&name, ty);
            }
        }
    }

    fn check_proc_decl(&mut self, proc: &ast::ProcDecl) {
        let mut param_tys = Vec::new();
        if let Some(params) = proc.fml_params() {
            for sec in params.sections() {
                let ty = self.declared_type_of_fml_param_sec(&sec);
                for name in sec.names() {
                    self.bind(&name, ty);
                    param_tys.push(ty);
                }
            }
        }
        let proc_ty = self.types.proc(param_tys);
        let decl_offset = proc.name().map(|name| {
            self.bind(&name, proc_ty);
            self.span_of(&name).0
        });

        if let Some(part) = proc.var_decl_part() {
            self.check_var_decl_part(&part);
        }
        if let Some(offset) = decl_offset {
            self.active_procs.push(offset);
        }
        if let Some(body) = proc.body() {
            self.check_stmt(&Stmt::Comp(body));
        }
        if decl_offset.is_some() {
            self.active_procs.pop();
        }
    }

    fn check_literal(&mut self, tree: &Rc<SyntaxTree>) -> Value {
        let value = match tree.kind() {
            SyntaxKind::NumberLit => Value::rvalue(self.types.integer()),
            SyntaxKind::TrueKw | SyntaxKind::FalseKw => Value::rvalue(self.types.boolean()),
            SyntaxKind::StringLit => {
                let text = self.text_of(tree);
                let ty = if text.len() == 3 || text == "''''" {
                    self.types.char()
                } else {
                    self.types.string()
                };
                Value::rvalue(ty)
            }
            _ => Value::error(),
        };
        self.record_expr(tree, value)
    }

    fn check_entire_var(&mut self, v: &ast::EntireVar) -> Value {
        let value = match v.name().and_then(|name| self.lookup_use(&name)) {
            Some(ty) => Value::lvalue(ty),
            None => Value::error(),
        };
        self.record_expr(v.syntax(), value)
    }

    fn check_indexed_var(&mut self, v: &ast::IndexedVar) -> Value {
        let base_ty = v.name().and_then(|name| self.lookup_use(&name));

        let index_value = v.index().map(|idx| self.check_expr(&idx));
        if let (Some(index_expr), Some(index_value)) = (v.index(), index_value) {
            if let Some(ty) = index_value.ty {
                if !self.types.is_integer(ty) {
                    let (start, end) = self.span_of(index_expr.syntax());
                    self.diagnostics
                        .push(builders::mismatched_type(start, end - start, "integer", &self.types.display(ty)));
                }
            }
        }

        let value = match base_ty.and_then(|ty| self.types.array_parts(ty)) {
            Some((elem, _len)) => Value::lvalue(elem),
            None => {
                let (start, end) = v
                    .name()
                    .map(|n| self.span_of(&n))
                    .unwrap_or_else(|| self.span_of(v.syntax()));
                self.diagnostics.push(builders::non_array_subscript(start, end - start));
                Value::error()
            }
        };
        self.record_expr(v.syntax(), value)
    }

    fn check_arith_operand(&mut self, operand: &Option<Expr>, ty: Option<TypeId>) {
        let (Some(operand), Some(ty)) = (operand, ty) else { return };
        if !self.types.is_integer(ty) {
            let (start, end) = self.span_of(operand.syntax());
            self.diagnostics
                .push(builders::mismatched_type(start, end - start, "integer", &self.types.display(ty)));
        }
    }

    fn check_bool_operand(&mut self, operand: &Option<Expr>, ty: Option<TypeId>) {
        let (Some(operand), Some(ty)) = (operand, ty) else { return };
        if !self.types.is_boolean(ty) {
            let (start, end) = self.span_of(operand.syntax());
            self.diagnostics
                .push(builders::mismatched_type(start, end - start, "boolean", &self.types.display(ty)));
        }
    }

    fn check_relational_operand(&mut self, operand: &Option<Expr>, ty: Option<TypeId>) -> bool {
        let (Some(operand), Some(ty)) = (operand, ty) else { return true };
        if !self.types.is_standard(ty) {
            let (start, end) = self.span_of(operand.syntax());
            self.diagnostics
                .push(builders::non_standard_type(start, end - start, &self.types.display(ty)));
            false
        } else {
            true
        }
    }

    fn check_binary(&mut self, b: &ast::BinaryExpr) -> Value {
        let lhs_expr = b.lhs();
        let rhs_expr = b.rhs();
        let lhs = lhs_expr.as_ref().map(|e| self.check_expr(e));
        let rhs = rhs_expr.as_ref().map(|e| self.check_expr(e));
        let lhs_ty = lhs.and_then(|v| v.ty);
        let rhs_ty = rhs.and_then(|v| v.ty);

        let value = match b.op().map(|op| op.kind()) {
            Some(SyntaxKind::PlusToken | SyntaxKind::MinusToken | SyntaxKind::StarToken | SyntaxKind::DivKw) => {
                self.check_arith_operand(&lhs_expr, lhs_ty);
                self.check_arith_operand(&rhs_expr, rhs_ty);
                Value::rvalue(self.types.integer())
            }
            Some(SyntaxKind::AndKw | SyntaxKind::OrKw) => {
                self.check_bool_operand(&lhs_expr, lhs_ty);
                self.check_bool_operand(&rhs_expr, rhs_ty);
                Value::rvalue(self.types.boolean())
            }
            Some(
                SyntaxKind::EqualToken
                | SyntaxKind::NotEqToken
                | SyntaxKind::LessToken
                | SyntaxKind::LessEqToken
                | SyntaxKind::GreaterToken
                | SyntaxKind::GreaterEqToken,
            ) => {
                let lhs_std = self.check_relational_operand(&lhs_expr, lhs_ty);
                let rhs_std = self.check_relational_operand(&rhs_expr, rhs_ty);
                if lhs_std && rhs_std {
                    if let (Some(l), Some(r)) = (lhs_ty, rhs_ty) {
                        if l != r {
                            if let Some(rhs_expr) = &rhs_expr {
                                let (start, end) = self.span_of(rhs_expr.syntax());
                                self.diagnostics.push(builders::mismatched_type(
                                    start,
                                    end - start,
                                    &self.types.display(l),
                                    &self.types.display(r),
                                ));
                            }
                        }
                    }
                }
                Value::rvalue(self.types.boolean())
            }
            _ => Value::error(),
        };
        self.record_expr(b.syntax(), value)
    }

    fn check_unary(&mut self, u: &ast::NotExpr) -> Value {
        let operand_expr = u.operand();
        let operand = operand_expr.as_ref().map(|e| self.check_expr(e));
        let operand_ty = operand.and_then(|v| v.ty);

        let value = match u.op().map(|op| op.kind()) {
            Some(SyntaxKind::PlusToken | SyntaxKind::MinusToken) => {
                self.check_arith_operand(&operand_expr, operand_ty);
                Value::rvalue(self.types.integer())
            }
            Some(SyntaxKind::NotKw) => {
                self.check_bool_operand(&operand_expr, operand_ty);
                Value::rvalue(self.types.boolean())
            }
            _ => Value::error(),
        };
        self.record_expr(u.syntax(), value)
    }

    fn check_cast(&mut self, c: &ast::CastExpr) -> Value {
        let ty = match c.target_type_kw() {
            Some(kw) => self.kw_type(&kw),
            None => self.types.integer(),
        };
        if let Some(operand) = c.operand() {
            let operand_value = self.check_expr(&operand);
            if let Some(operand_ty) = operand_value.ty {
                if !self.types.is_standard(operand_ty) {
                    let (start, end) = self.span_of(operand.syntax());
                    self.diagnostics
                        .push(builders::non_standard_type(start, end - start, &self.types.display(operand_ty)));
                }
            }
        }
        self.record_expr(c.syntax(), Value::rvalue(ty))
    }

    fn check_expr(&mut self, expr: &Expr) -> Value {
        match expr {
            Expr::Literal(tree) => self.check_literal(tree),
            Expr::EntireVar(v) => self.check_entire_var(v),
            Expr::IndexedVar(v) => self.check_indexed_var(v),
            Expr::Binary(b) => self.check_binary(b),
            Expr::Paren(p) => match p.inner() {
                Some(inner) => {
                    let value = self.check_expr(&inner);
                    self.record_expr(p.syntax(), value)
                }
                None => self.record_expr(p.syntax(), Value::error()),
            },
            Expr::Not(u) => self.check_unary(u),
            Expr::Cast(c) => self.check_cast(c),
        }
    }

    fn check_assign_stmt(&mut self, stmt: &ast::AssignStmt) {
        let lhs_expr = stmt.lhs();
        let rhs_expr = stmt.rhs();
        let lhs = lhs_expr.as_ref().map(|e| self.check_expr(e));
        let rhs = rhs_expr.as_ref().map(|e| self.check_expr(e));

        let Some(lhs) = lhs else { return };
        match lhs.kind {
            ValueKind::Error => {}
            ValueKind::Rvalue => {
                if let Some(lhs_expr) = &lhs_expr {
                    let (start, end) = self.span_of(lhs_expr.syntax());
                    self.diagnostics.push(builders::non_lvalue_assignment(start, end - start));
                }
            }
            ValueKind::Lvalue => {
                let Some(lhs_ty) = lhs.ty else { return };
                if !self.types.is_standard(lhs_ty) {
                    if let Some(lhs_expr) = &lhs_expr {
                        let (start, end) = self.span_of(lhs_expr.syntax());
                        self.diagnostics
                            .push(builders::non_standard_type(start, end - start, &self.types.display(lhs_ty)));
                    }
                } else if let Some(rhs) = rhs {
                    if let Some(rhs_ty) = rhs.ty {
                        if rhs_ty != lhs_ty {
                            if let Some(rhs_expr) = &rhs_expr {
                                let (start, end) = self.span_of(rhs_expr.syntax());
                                self.diagnostics.push(builders::mismatched_type(
                                    start,
                                    end - start,
                                    &self.types.display(lhs_ty),
                                    &self.types.display(rhs_ty),
                                ));
                            }
                        }
                    }
                }
            }
        }
    }

    fn check_condition(&mut self, cond: Option<Expr>) {
        let Some(cond) = cond else { return };
        let value = self.check_expr(&cond);
        if let Some(ty) = value.ty {
            if !self.types.is_boolean(ty) {
                let (start, end) = self.span_of(cond.syntax());
                self.diagnostics
                    .push(builders::mismatched_type(start, end - start, "boolean", &self.types.display(ty)));
            }
        }
    }

    fn check_call_stmt(&mut self, stmt: &ast::CallStmt) {
        let Some(name) = stmt.name() else { return };
        let args = stmt.args();

        if let Some(decl_offset) = self.lookup_decl_offset(&name) {
            if self.active_procs.contains(&decl_offset) {
                let (start, end) = self.span_of(&name);
                self.diagnostics.push(builders::recursive_call(start, end - start, self.text_of(&name)));
                for arg in &args {
                    self.check_expr(arg);
                }
                return;
            }
        }

        let Some(ty) = self.lookup_use(&name) else {
            for arg in &args {
                self.check_expr(arg);
            }
            return;
        };

        let Some(params) = self.types.proc_params(ty).map(|p| p.to_vec()) else {
            let (start, end) = self.span_of(&name);
            self.diagnostics.push(builders::non_procedure_invocation(start, end - start));
            for arg in &args {
                self.check_expr(arg);
            }
            return;
        };

        if params.len() != args.len() {
            let (start, end) = self.span_of(&name);
            self.diagnostics
                .push(builders::mismatched_arguments_count(start, end - start, params.len(), args.len()));
        }

        for (i, arg) in args.iter().enumerate() {
            let value = self.check_expr(arg);
            if params.len() != args.len() {
                continue;
            }
            if let (Some(param_ty), Some(arg_ty)) = (params.get(i).copied(), value.ty) {
                if arg_ty != param_ty {
                    let (start, end) = self.span_of(arg.syntax());
                    self.diagnostics.push(builders::mismatched_type(
                        start,
                        end - start,
                        &self.types.display(param_ty),
                        &self.types.display(arg_ty),
                    ));
                }
            }
        }
    }

    fn check_input_stmt(&mut self, stmt: &ast::InputStmt) {
        for target in stmt.targets() {
            let value = self.check_expr(&target);
            if !matches!(value.kind, ValueKind::Error | ValueKind::Lvalue) {
                let (start, end) = self.span_of(target.syntax());
                self.diagnostics.push(builders::invalid_input(start, end - start));
            }
        }
    }

    /// A plain output value (no format width) accepts a standard type or a
    /// `string`; one with a width accepts only a standard type (the width
    /// only makes sense for a fixed-size rendering), and reports through a
    /// different diagnostic kind than the plain case.
    fn check_output_stmt(&mut self, stmt: &ast::OutputStmt) {
        for value in stmt.values() {
            let Some(expr) = value.expr() else { continue };
            let computed = self.check_expr(&expr);
            let Some(ty) = computed.ty else { continue };

            if value.width_lit().is_some() {
                if !self.types.is_standard(ty) {
                    let (start, end) = self.span_of(expr.syntax());
                    self.diagnostics
                        .push(builders::non_standard_type(start, end - start, &self.types.display(ty)));
                }
            } else if !(self.types.is_standard(ty) || self.types.is_string(ty)) {
                let (start, end) = self.span_of(expr.syntax());
                self.diagnostics.push(builders::invalid_output(start, end - start));
            }
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Assign(s) => self.check_assign_stmt(s),
            Stmt::If(s) => {
                self.check_condition(s.condition());
                if let Some(then_stmt) = s.then_stmt() {
                    self.check_stmt(&then_stmt);
                }
                if let Some(else_stmt) = s.else_stmt() {
                    self.check_stmt(&else_stmt);
                }
            }
            Stmt::While(s) => {
                self.check_condition(s.condition());
                if let Some(body) = s.body() {
                    self.check_stmt(&body);
                }
            }
            Stmt::Break(_) => {}
            Stmt::Call(s) => self.check_call_stmt(s),
            Stmt::Return(_) => {}
            Stmt::Input(s) => self.check_input_stmt(s),
            Stmt::Output(s) => self.check_output_stmt(s),
            Stmt::Comp(s) => {
                for stmt in s.statements() {
                    self.check_stmt(&stmt);
                }
            }
        }
    }
}

/// Type-checks `program`, threading the resolver's `events` through to
/// resolve use-site types. `full_text` lets the checker read literal lexemes
/// (string-literal length, array-size digits) without the tree storing
/// copies of them.
pub fn check(program: &ast::Program, full_text: &str, events: &[SemanticEvent], types: &mut TypeTable) -> CheckResult {
    let mut use_to_decl = HashMap::new();
    for event in events {
        if let SemanticEvent::Use { declared_at, used_at } = event {
            use_to_decl.insert(*used_at, *declared_at);
        }
    }

    let mut checker = Checker {
        types,
        full_text,
        use_to_decl,
        bind_types: HashMap::new(),
        expr_types: HashMap::new(),
        active_procs: Vec::new(),
        diagnostics: Vec::new(),
    };

    if let Some(part) = program.var_decl_part() {
        checker.check_var_decl_part(&part);
    }
    for proc in program.proc_decls() {
        checker.check_proc_decl(&proc);
    }
    if let Some(body) = program.body() {
        checker.check_stmt(&Stmt::Comp(body));
    }

    CheckResult {
        diagnostics: checker.diagnostics,
        expr_types: checker.expr_types,
        bind_types: checker.bind_types,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::{token, tree, Slot, Trivia};
    use crate::interner::StringInterner;

    fn ident(text: &str) -> Rc<crate::cst::RawNode> {
        token(SyntaxKind::IdentToken, text.len(), Trivia::default(), Trivia::default())
    }

    fn num(text: &str) -> Rc<crate::cst::RawNode> {
        token(SyntaxKind::NumberLit, text.len(), Trivia::default(), Trivia::default())
    }

    fn build_and_check(
        full_text: &str,
        program_raw: Rc<crate::cst::RawNode>,
    ) -> (CheckResult, Vec<Diagnostic>) {
        let root = SyntaxTree::new_root(program_raw);
        let mut interner = StringInterner::new();
        let resolved = crate::resolver::resolve(&root, full_text, &mut |s| interner.intern(s));
        let program = ast::Program::cast(root).expect("program");
        let mut types = TypeTable::new();
        let result = check(&program, full_text, &resolved.events, &mut types);
        let diags = result.diagnostics.clone();
        (result, diags)
    }

    /// `program p; var x: integer; begin x := 1 end.`
    #[test]
    fn assign_of_matching_type_reports_nothing() {
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
            vec![Slot::Node(prog_name), Slot::Node(var_decl_part), Slot::Node(comp)],
        );
        let (_, diags) = build_and_check("pxinteger x1", program);
        assert!(diags.is_empty());
    }

    /// `program p; var x: boolean; begin x := 1 end.`
    #[test]
    fn assign_of_mismatched_type_is_diagnosed() {
        let decl_name = ident("x");
        let var_decl = tree(
            SyntaxKind::VarDecl,
            vec![Slot::Node(decl_name), Slot::Node(token(SyntaxKind::BooleanKw, 7, Trivia::default(), Trivia::default()))],
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
            vec![Slot::Node(prog_name), Slot::Node(var_decl_part), Slot::Node(comp)],
        );
        let (_, diags) = build_and_check("pxboolean x1", program);
        assert_eq!(diags.len(), 1);
        assert!(matches!(diags[0].kind, crate::diagnostic::DiagnosticKind::MismatchedType { .. }));
    }

    /// `program p; begin x := 1 end.` where `x` was never declared: resolver
    /// already reports `not-defined`, the checker must not pile on.
    #[test]
    fn assign_to_undefined_name_emits_no_checker_diagnostic() {
        let use_name = ident("x");
        let entire_var = tree(SyntaxKind::EntireVar, vec![Slot::Node(use_name)]);
        let rhs = num("1");
        let assign = tree(SyntaxKind::AssignStmt, vec![Slot::Node(entire_var), Slot::Node(rhs)]);
        let comp = tree(SyntaxKind::CompStmt, vec![Slot::Node(assign)]);
        let prog_name = ident("p");
        let program = tree(
            SyntaxKind::Program,
            vec![Slot::Node(prog_name), Slot::Empty, Slot::Node(comp)],
        );
        let (_, diags) = build_and_check("px1", program);
        assert!(diags.is_empty());
    }

    /// `program p; procedure q; begin call q end; begin call q end.`
    #[test]
    fn procedure_calling_itself_is_recursive_call() {
        let proc_name = ident("q");
        let call_name = ident("q");
        let call_stmt = tree(SyntaxKind::CallStmt, vec![Slot::Node(call_name)]);
        let inner_comp = tree(SyntaxKind::CompStmt, vec![Slot::Node(call_stmt)]);
        let proc_decl = tree(
            SyntaxKind::ProcDecl,
            vec![Slot::Node(proc_name), Slot::Empty, Slot::Empty, Slot::Node(inner_comp)],
        );

        let outer_call_name = ident("q");
        let outer_call = tree(SyntaxKind::CallStmt, vec![Slot::Node(outer_call_name)]);
        let outer_comp = tree(SyntaxKind::CompStmt, vec![Slot::Node(outer_call)]);

        let prog_name = ident("p");
        let program = tree(
            SyntaxKind::Program,
            vec![Slot::Node(prog_name), Slot::Empty, Slot::Node(proc_decl), Slot::Node(outer_comp)],
        );
        let (_, diags) = build_and_check("pqqq", program);
        assert_eq!(diags.len(), 1);
        assert!(matches!(diags[0].kind, crate::diagnostic::DiagnosticKind::RecursiveCall { .. }));
    }
}
