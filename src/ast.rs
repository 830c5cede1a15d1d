//! Typed syntax view: a thin, read-only projection over the raw CST.
//!
//! Each production kind gets a wrapper struct holding the untyped
//! `Rc<SyntaxTree>` plus named accessors for its children. The projection is
//! total on the grammar: an accessor on a node whose corresponding slot is
//! `Empty` (because the parser recovered from missing input) just returns
//! `None`, it never panics.

use std::rc::Rc;

use crate::cst::SyntaxTree;
use crate::syntax_kind::SyntaxKind;

/// Implemented by every typed wrapper: casts an untyped node to this type if
/// its syntax kind matches.
pub trait AstNode: Sized {
    fn kind() -> SyntaxKind;

    fn cast(tree: Rc<SyntaxTree>) -> Option<Self>;

    fn syntax(&self) -> &Rc<SyntaxTree>;
}

macro_rules! ast_node {
    ($name:ident, $kind:expr) => {
        #[derive(Debug, Clone)]
        pub struct $name(Rc<SyntaxTree>);

        impl AstNode for $name {
            fn kind() -> SyntaxKind {
                $kind
            }

            fn cast(tree: Rc<SyntaxTree>) -> Option<Self> {
                if tree.kind() == $kind {
                    Some($name(tree))
                } else {
                    None
                }
            }

            fn syntax(&self) -> &Rc<SyntaxTree> {
                &self.0
            }
        }
    };
}

/// Finds the first child of `tree` castable to `N`, skipping `Empty` slots
/// and slots of the wrong kind. This is the one primitive every named
/// accessor below is built from.
fn find_child<N: AstNode>(tree: &Rc<SyntaxTree>) -> Option<N> {
    tree.children().find_map(N::cast)
}

fn nth_of_kind(tree: &Rc<SyntaxTree>, kind: SyntaxKind, n: usize) -> Option<Rc<SyntaxTree>> {
    tree.children().filter(|c| c.kind() == kind).nth(n)
}

fn all_of_kind<N: AstNode>(tree: &Rc<SyntaxTree>) -> Vec<N> {
    tree.children().filter_map(N::cast).collect()
}

ast_node!(Program, SyntaxKind::Program);
ast_node!(VarDeclPart, SyntaxKind::VarDeclPart);
ast_node!(VarDecl, SyntaxKind::VarDecl);
ast_node!(ArrayType, SyntaxKind::ArrayType);
ast_node!(ProcDecl, SyntaxKind::ProcDecl);
ast_node!(FmlParamList, SyntaxKind::FmlParamList);
ast_node!(FmlParamSec, SyntaxKind::FmlParamSec);
ast_node!(AssignStmt, SyntaxKind::AssignStmt);
ast_node!(IfStmt, SyntaxKind::IfStmt);
ast_node!(WhileStmt, SyntaxKind::WhileStmt);
ast_node!(BreakStmt, SyntaxKind::BreakStmt);
ast_node!(CallStmt, SyntaxKind::CallStmt);
ast_node!(ActParamList, SyntaxKind::ActParamList);
ast_node!(ReturnStmt, SyntaxKind::ReturnStmt);
ast_node!(InputStmt, SyntaxKind::InputStmt);
ast_node!(InputList, SyntaxKind::InputList);
ast_node!(OutputStmt, SyntaxKind::OutputStmt);
ast_node!(OutputList, SyntaxKind::OutputList);
ast_node!(OutputValue, SyntaxKind::OutputValue);
ast_node!(CompStmt, SyntaxKind::CompStmt);
ast_node!(EntireVar, SyntaxKind::EntireVar);
ast_node!(IndexedVar, SyntaxKind::IndexedVar);
ast_node!(BinaryExpr, SyntaxKind::BinaryExpr);
ast_node!(ParenExpr, SyntaxKind::ParenExpr);
ast_node!(NotExpr, SyntaxKind::NotExpr);
ast_node!(CastExpr, SyntaxKind::CastExpr);

/// Any node that stands for an expression, variable reference included
/// (assignable expressions are expressions too).
#[derive(Debug, Clone)]
pub enum Expr {
    EntireVar(EntireVar),
    IndexedVar(IndexedVar),
    Binary(BinaryExpr),
    Paren(ParenExpr),
    Not(NotExpr),
    Cast(CastExpr),
    Literal(Rc<SyntaxTree>),
}

impl Expr {
    pub fn cast(tree: Rc<SyntaxTree>) -> Option<Expr> {
        match tree.kind() {
            SyntaxKind::EntireVar => EntireVar::cast(tree).map(Expr::EntireVar),
            SyntaxKind::IndexedVar => IndexedVar::cast(tree).map(Expr::IndexedVar),
            SyntaxKind::BinaryExpr => BinaryExpr::cast(tree).map(Expr::Binary),
            SyntaxKind::ParenExpr => ParenExpr::cast(tree).map(Expr::Paren),
            SyntaxKind::NotExpr => NotExpr::cast(tree).map(Expr::Not),
            SyntaxKind::CastExpr => CastExpr::cast(tree).map(Expr::Cast),
            SyntaxKind::NumberLit | SyntaxKind::StringLit | SyntaxKind::TrueKw | SyntaxKind::FalseKw => {
                Some(Expr::Literal(tree))
            }
            _ => None,
        }
    }

    pub fn syntax(&self) -> &Rc<SyntaxTree> {
        match self {
            Expr::EntireVar(n) => n.syntax(),
            Expr::IndexedVar(n) => n.syntax(),
            Expr::Binary(n) => n.syntax(),
            Expr::Paren(n) => n.syntax(),
            Expr::Not(n) => n.syntax(),
            Expr::Cast(n) => n.syntax(),
            Expr::Literal(t) => t,
        }
    }

    /// Whether this expression denotes an assignable storage location
    /// (checked downstream against `Value::Lvalue`).
    pub fn is_variable(&self) -> bool {
        matches!(self, Expr::EntireVar(_) | Expr::IndexedVar(_))
    }
}

/// Any node that stands for a statement.
#[derive(Debug, Clone)]
pub enum Stmt {
    Assign(AssignStmt),
    If(IfStmt),
    While(WhileStmt),
    Break(BreakStmt),
    Call(CallStmt),
    Return(ReturnStmt),
    Input(InputStmt),
    Output(OutputStmt),
    Comp(CompStmt),
}

impl Stmt {
    pub fn cast(tree: Rc<SyntaxTree>) -> Option<Stmt> {
        match tree.kind() {
            SyntaxKind::AssignStmt => AssignStmt::cast(tree).map(Stmt::Assign),
            SyntaxKind::IfStmt => IfStmt::cast(tree).map(Stmt::If),
            SyntaxKind::WhileStmt => WhileStmt::cast(tree).map(Stmt::While),
            SyntaxKind::BreakStmt => BreakStmt::cast(tree).map(Stmt::Break),
            SyntaxKind::CallStmt => CallStmt::cast(tree).map(Stmt::Call),
            SyntaxKind::ReturnStmt => ReturnStmt::cast(tree).map(Stmt::Return),
            SyntaxKind::InputStmt => InputStmt::cast(tree).map(Stmt::Input),
            SyntaxKind::OutputStmt => OutputStmt::cast(tree).map(Stmt::Output),
            SyntaxKind::CompStmt => CompStmt::cast(tree).map(Stmt::Comp),
            _ => None,
        }
    }

    pub fn syntax(&self) -> &Rc<SyntaxTree> {
        match self {
            Stmt::Assign(n) => n.syntax(),
            Stmt::If(n) => n.syntax(),
            Stmt::While(n) => n.syntax(),
            Stmt::Break(n) => n.syntax(),
            Stmt::Call(n) => n.syntax(),
            Stmt::Return(n) => n.syntax(),
            Stmt::Input(n) => n.syntax(),
            Stmt::Output(n) => n.syntax(),
            Stmt::Comp(n) => n.syntax(),
        }
    }
}

impl Program {
    pub fn name(&self) -> Option<Rc<SyntaxTree>> {
        nth_of_kind(self.syntax(), SyntaxKind::IdentToken, 0)
    }

    pub fn var_decl_part(&self) -> Option<VarDeclPart> {
        find_child(self.syntax())
    }

    pub fn proc_decls(&self) -> Vec<ProcDecl> {
        all_of_kind(self.syntax())
    }

    pub fn body(&self) -> Option<CompStmt> {
        find_child(self.syntax())
    }
}

impl VarDeclPart {
    pub fn decls(&self) -> Vec<VarDecl> {
        all_of_kind(self.syntax())
    }
}

impl VarDecl {
    pub fn names(&self) -> Vec<Rc<SyntaxTree>> {
        self.syntax()
            .children()
            .filter(|c| c.kind() == SyntaxKind::IdentToken)
            .collect()
    }

    pub fn array_type(&self) -> Option<ArrayType> {
        find_child(self.syntax())
    }

    pub fn scalar_type_kw(&self) -> Option<Rc<SyntaxTree>> {
        self.syntax().children().find(|c| {
            matches!(
                c.kind(),
                SyntaxKind::IntegerKw | SyntaxKind::BooleanKw | SyntaxKind::CharKw
            )
        })
    }
}

impl ArrayType {
    pub fn size_lit(&self) -> Option<Rc<SyntaxTree>> {
        nth_of_kind(self.syntax(), SyntaxKind::NumberLit, 0)
    }

    pub fn elem_type_kw(&self) -> Option<Rc<SyntaxTree>> {
        self.syntax().children().find(|c| {
            matches!(
                c.kind(),
                SyntaxKind::IntegerKw | SyntaxKind::BooleanKw | SyntaxKind::CharKw
            )
        })
    }
}

impl ProcDecl {
    pub fn name(&self) -> Option<Rc<SyntaxTree>> {
        nth_of_kind(self.syntax(), SyntaxKind::IdentToken, 0)
    }

    pub fn fml_params(&self) -> Option<FmlParamList> {
        find_child(self.syntax())
    }

    pub fn var_decl_part(&self) -> Option<VarDeclPart> {
        find_child(self.syntax())
    }

    pub fn body(&self) -> Option<CompStmt> {
        find_child(self.syntax())
    }
}

impl FmlParamList {
    pub fn sections(&self) -> Vec<FmlParamSec> {
        all_of_kind(self.syntax())
    }
}

impl FmlParamSec {
    pub fn names(&self) -> Vec<Rc<SyntaxTree>> {
        self.syntax()
            .children()
            .filter(|c| c.kind() == SyntaxKind::IdentToken)
            .collect()
    }

    pub fn array_type(&self) -> Option<ArrayType> {
        find_child(self.syntax())
    }

    pub fn scalar_type_kw(&self) -> Option<Rc<SyntaxTree>> {
        self.syntax().children().find(|c| {
            matches!(
                c.kind(),
                SyntaxKind::IntegerKw | SyntaxKind::BooleanKw | SyntaxKind::CharKw
            )
        })
    }
}

impl AssignStmt {
    pub fn lhs(&self) -> Option<Expr> {
        self.syntax().children().find_map(Expr::cast)
    }

    pub fn rhs(&self) -> Option<Expr> {
        self.syntax().children().filter_map(Expr::cast).nth(1)
    }
}

impl IfStmt {
    pub fn condition(&self) -> Option<Expr> {
        self.syntax().children().find_map(Expr::cast)
    }

    pub fn then_stmt(&self) -> Option<Stmt> {
        self.syntax().children().filter_map(Stmt::cast).next()
    }

    pub fn else_stmt(&self) -> Option<Stmt> {
        self.syntax().children().filter_map(Stmt::cast).nth(1)
    }
}

impl WhileStmt {
    pub fn condition(&self) -> Option<Expr> {
        self.syntax().children().find_map(Expr::cast)
    }

    pub fn body(&self) -> Option<Stmt> {
        self.syntax().children().find_map(Stmt::cast)
    }
}

impl CallStmt {
    pub fn name(&self) -> Option<Rc<SyntaxTree>> {
        nth_of_kind(self.syntax(), SyntaxKind::IdentToken, 0)
    }

    pub fn args(&self) -> Vec<Expr> {
        self.syntax()
            .children()
            .find(|c| c.kind() == SyntaxKind::ActParamList)
            .map(|list| list.children().filter_map(Expr::cast).collect())
            .unwrap_or_default()
    }
}

impl ReturnStmt {}

impl InputStmt {
    pub fn targets(&self) -> Vec<Expr> {
        self.syntax()
            .children()
            .find(|c| c.kind() == SyntaxKind::InputList)
            .map(|list| list.children().filter_map(Expr::cast).collect())
            .unwrap_or_default()
    }

    pub fn is_readln(&self) -> bool {
        self.syntax()
            .children()
            .any(|c| c.kind() == SyntaxKind::ReadLnKw)
    }
}

impl OutputStmt {
    pub fn values(&self) -> Vec<OutputValue> {
        self.syntax()
            .children()
            .find(|c| c.kind() == SyntaxKind::OutputList)
            .map(|list| list.children().filter_map(OutputValue::cast).collect())
            .unwrap_or_default()
    }

    pub fn is_writeln(&self) -> bool {
        self.syntax()
            .children()
            .any(|c| c.kind() == SyntaxKind::WriteLnKw)
    }
}

impl OutputValue {
    pub fn expr(&self) -> Option<Expr> {
        self.syntax().children().find_map(Expr::cast)
    }

    /// The literal immediately after a `:` width specifier. Deliberately
    /// not `nth_of_kind(..., NumberLit, 0)`: the printed expression itself
    /// may be a bare number literal, which would otherwise be mistaken for
    /// its own width.
    pub fn width_lit(&self) -> Option<Rc<SyntaxTree>> {
        let mut children = self.syntax().children();
        while let Some(c) = children.next() {
            if c.kind() == SyntaxKind::ColonToken {
                return children.next().filter(|c| c.kind() == SyntaxKind::NumberLit);
            }
        }
        None
    }
}

impl CompStmt {
    pub fn statements(&self) -> Vec<Stmt> {
        self.syntax().children().filter_map(Stmt::cast).collect()
    }
}

impl EntireVar {
    pub fn name(&self) -> Option<Rc<SyntaxTree>> {
        nth_of_kind(self.syntax(), SyntaxKind::IdentToken, 0)
    }
}

impl IndexedVar {
    pub fn name(&self) -> Option<Rc<SyntaxTree>> {
        nth_of_kind(self.syntax(), SyntaxKind::IdentToken, 0)
    }

    pub fn index(&self) -> Option<Expr> {
        self.syntax().children().find_map(Expr::cast)
    }
}

impl BinaryExpr {
    pub fn lhs(&self) -> Option<Expr> {
        self.syntax().children().find_map(Expr::cast)
    }

    pub fn rhs(&self) -> Option<Expr> {
        self.syntax().children().filter_map(Expr::cast).nth(1)
    }

    /// The operator token: one of the arithmetic/relational/boolean
    /// punctuation or keyword kinds.
    pub fn op(&self) -> Option<Rc<SyntaxTree>> {
        self.syntax().children().find(|c| {
            matches!(
                c.kind(),
                SyntaxKind::PlusToken
                    | SyntaxKind::MinusToken
                    | SyntaxKind::StarToken
                    | SyntaxKind::DivKw
                    | SyntaxKind::AndKw
                    | SyntaxKind::OrKw
                    | SyntaxKind::EqualToken
                    | SyntaxKind::NotEqToken
                    | SyntaxKind::LessToken
                    | SyntaxKind::LessEqToken
                    | SyntaxKind::GreaterToken
                    | SyntaxKind::GreaterEqToken
            )
        })
    }
}

impl ParenExpr {
    pub fn inner(&self) -> Option<Expr> {
        self.syntax().children().find_map(Expr::cast)
    }
}

impl NotExpr {
    pub fn operand(&self) -> Option<Expr> {
        self.syntax().children().find_map(Expr::cast)
    }

    /// The prefix operator token. Despite the node's name, this covers
    /// unary `+`/`-` as well as `not` — the grammar has one unary-expression
    /// production, not three.
    pub fn op(&self) -> Option<Rc<SyntaxTree>> {
        self.syntax().children().find(|c| {
            matches!(
                c.kind(),
                SyntaxKind::PlusToken | SyntaxKind::MinusToken | SyntaxKind::NotKw
            )
        })
    }
}

impl CastExpr {
    pub fn target_type_kw(&self) -> Option<Rc<SyntaxTree>> {
        self.syntax().children().find(|c| {
            matches!(
                c.kind(),
                SyntaxKind::IntegerKw | SyntaxKind::BooleanKw | SyntaxKind::CharKw
            )
        })
    }

    pub fn operand(&self) -> Option<Expr> {
        self.syntax().children().find_map(Expr::cast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::{token, tree, Slot, SyntaxTree, Trivia};

    #[test]
    fn cast_rejects_wrong_kind() {
        let raw = token(SyntaxKind::IdentToken, 3, Trivia::default(), Trivia::default());
        let view = SyntaxTree::new_root(raw);
        assert!(Program::cast(view).is_none());
    }

    #[test]
    fn assign_stmt_exposes_lhs_and_rhs() {
        let lhs = token(SyntaxKind::IdentToken, 1, Trivia::default(), Trivia::default());
        let entire = tree(SyntaxKind::EntireVar, vec![Slot::Node(lhs)]);
        let assign_tok = token(SyntaxKind::AssignToken, 2, Trivia::default(), Trivia::default());
        let rhs_lit = token(SyntaxKind::NumberLit, 1, Trivia::default(), Trivia::default());
        let assign = tree(
            SyntaxKind::AssignStmt,
            vec![Slot::Node(entire), Slot::Node(assign_tok), Slot::Node(rhs_lit)],
        );
        let view = SyntaxTree::new_root(assign);
        let node = AssignStmt::cast(view).unwrap();
        assert!(node.lhs().is_some());
        assert!(node.rhs().is_some());
    }

    #[test]
    fn missing_else_returns_none_without_panicking() {
        let cond = token(SyntaxKind::TrueKw, 4, Trivia::default(), Trivia::default());
        let then_comp = tree(SyntaxKind::CompStmt, vec![]);
        let if_tree = tree(
            SyntaxKind::IfStmt,
            vec![Slot::Node(cond), Slot::Node(then_comp), Slot::Empty],
        );
        let view = SyntaxTree::new_root(if_tree);
        let node = IfStmt::cast(view).unwrap();
        assert!(node.else_stmt().is_none());
    }
}
