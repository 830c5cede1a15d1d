//! Recursive-descent parser: turns the lexer's flat token stream into a
//! lossless [`crate::cst::SyntaxTree`].
//!
//! Ported in spirit from the original compiler's `mppl_parser.c`: one
//! `parse_*` function per production in the MPPL grammar, and the same
//! error-recovery shape — a missing required token is reported and the slot
//! it would have occupied is left `Empty` rather than aborting the parse, so
//! one syntax error never stops the rest of the file from being parsed (and,
//! downstream, from still being resolved/checked as far as it can be).
//!
//! Trivia handling: every run of whitespace/comment tokens the lexer emits
//! is attached as the *leading* trivia of the next real token (this parser
//! never produces trailing trivia). The one exception is trivia trailing the
//! very last real token in the file, which has nowhere to lead into; it is
//! attached to a synthetic `EofToken` appended as `Program`'s last child so
//! that `SyntaxTree::render` can still reconstruct the source exactly.

use std::rc::Rc;

use crate::cst::{token, tree, RawNode, Slot, Trivia, TriviaPiece};
use crate::diagnostic::{builders, Diagnostic};
use crate::lexer::{self, RawToken};
use crate::syntax_kind::SyntaxKind;

/// One real (non-trivia) token plus the trivia that led into it.
struct Lexeme {
    kind: SyntaxKind,
    offset: usize,
    len: usize,
    leading: Trivia,
}

/// Groups a raw lexer token stream into `Lexeme`s, folding every trivia
/// token onto the next real token's leading trivia.
fn group_trivia(tokens: Vec<RawToken>) -> Vec<Lexeme> {
    let mut lexemes = Vec::new();
    let mut pending = Vec::new();
    for tok in tokens {
        if tok.kind.is_trivia() {
            pending.push(TriviaPiece { kind: tok.kind, len: tok.len });
            continue;
        }
        lexemes.push(Lexeme {
            kind: tok.kind,
            offset: tok.offset,
            len: tok.len,
            leading: Trivia { pieces: std::mem::take(&mut pending) },
        });
    }
    lexemes
}

struct Parser<'a> {
    text: &'a str,
    lexemes: Vec<Lexeme>,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
}

const RELATIONAL_OPS: &[SyntaxKind] = &[
    SyntaxKind::EqualToken,
    SyntaxKind::NotEqToken,
    SyntaxKind::LessToken,
    SyntaxKind::LessEqToken,
    SyntaxKind::GreaterToken,
    SyntaxKind::GreaterEqToken,
];
const ADDITIVE_OPS: &[SyntaxKind] = &[SyntaxKind::PlusToken, SyntaxKind::MinusToken, SyntaxKind::OrKw];
const MULTIPLICATIVE_OPS: &[SyntaxKind] = &[SyntaxKind::StarToken, SyntaxKind::DivKw, SyntaxKind::AndKw];
const STANDARD_TYPE_KWS: &[SyntaxKind] = &[SyntaxKind::IntegerKw, SyntaxKind::BooleanKw, SyntaxKind::CharKw];

/// Tokens a caller skipping over a malformed declaration/statement should
/// stop at, so panic-mode recovery never eats the start of the next
/// well-formed construct.
const DECL_SYNC: &[SyntaxKind] = &[SyntaxKind::ProcedureKw, SyntaxKind::BeginKw, SyntaxKind::EofToken];
const STMT_SYNC: &[SyntaxKind] = &[SyntaxKind::SemiToken, SyntaxKind::EndKw, SyntaxKind::EofToken];

impl<'a> Parser<'a> {
    fn new(text: &'a str, tokens: Vec<RawToken>) -> Self {
        Parser {
            text,
            lexemes: group_trivia(tokens),
            pos: 0,
            diagnostics: Vec::new(),
        }
    }

    fn current(&self) -> &Lexeme {
        let idx = self.pos.min(self.lexemes.len() - 1);
        &self.lexemes[idx]
    }

    fn peek(&self) -> SyntaxKind {
        self.current().kind
    }

    fn at(&self, kind: SyntaxKind) -> bool {
        self.peek() == kind
    }

    fn at_any(&self, kinds: &[SyntaxKind]) -> bool {
        kinds.contains(&self.peek())
    }

    fn text_of_current(&self) -> &'a str {
        let lex = self.current();
        self.text.get(lex.offset..lex.offset + lex.len).unwrap_or("")
    }

    /// Consumes the current lexeme and turns it into a leaf `RawNode`,
    /// advancing past it unless it's the trailing `EofToken` (which is never
    /// consumed here; callers attach it once, at the very end of the file).
    fn bump(&mut self) -> Rc<RawNode> {
        let idx = self.pos.min(self.lexemes.len() - 1);
        let lex = &self.lexemes[idx];
        let node = token(lex.kind, lex.len, lex.leading.clone(), Trivia::default());
        if lex.kind != SyntaxKind::EofToken {
            self.pos += 1;
        }
        node
    }

    fn expect_slot(&mut self, kind: SyntaxKind) -> Slot {
        if self.at(kind) {
            Slot::Node(self.bump())
        } else {
            self.report_unexpected(&[describe(kind)]);
            Slot::Empty
        }
    }

    fn report_unexpected(&mut self, expected: &[String]) {
        let lex = self.current();
        let found = if lex.kind == SyntaxKind::EofToken {
            "end of file".to_string()
        } else {
            self.text_of_current().to_string()
        };
        self.diagnostics.push(builders::unexpected_token(lex.offset, lex.len, &found, expected.to_vec()));
    }

    fn report_expected_expr(&mut self) {
        self.diagnostics.push(builders::expected_expression(self.current().offset));
    }

    /// Panic-mode recovery: if a production made no progress at all, skip
    /// exactly one token (reporting it) so list parsers always terminate.
    fn recover_if_stuck(&mut self, before: usize, sync: &[SyntaxKind]) {
        if self.pos != before || self.at(SyntaxKind::EofToken) {
            return;
        }
        if !self.at_any(sync) {
            self.report_unexpected(&["a declaration or statement".to_string()]);
            self.bump();
        }
    }

    // ---- expressions ----

    fn parse_expr(&mut self) -> Slot {
        let mut lhs = self.parse_simple_expr();
        while self.at_any(RELATIONAL_OPS) {
            let op = self.bump();
            let rhs = self.parse_simple_expr();
            lhs = Slot::Node(tree(SyntaxKind::BinaryExpr, vec![lhs, Slot::Node(op), rhs]));
        }
        lhs
    }

    fn parse_simple_expr(&mut self) -> Slot {
        let sign = if self.at(SyntaxKind::PlusToken) || self.at(SyntaxKind::MinusToken) {
            Some(self.bump())
        } else {
            None
        };
        let mut lhs = self.parse_term();
        if let Some(sign) = sign {
            lhs = Slot::Node(tree(SyntaxKind::NotExpr, vec![Slot::Node(sign), lhs]));
        }
        while self.at_any(ADDITIVE_OPS) {
            let op = self.bump();
            let rhs = self.parse_term();
            lhs = Slot::Node(tree(SyntaxKind::BinaryExpr, vec![lhs, Slot::Node(op), rhs]));
        }
        lhs
    }

    fn parse_term(&mut self) -> Slot {
        let mut lhs = self.parse_factor();
        while self.at_any(MULTIPLICATIVE_OPS) {
            let op = self.bump();
            let rhs = self.parse_factor();
            lhs = Slot::Node(tree(SyntaxKind::BinaryExpr, vec![lhs, Slot::Node(op), rhs]));
        }
        lhs
    }

    fn parse_factor(&mut self) -> Slot {
        match self.peek() {
            SyntaxKind::IdentToken => self.parse_variable(),
            SyntaxKind::NumberLit | SyntaxKind::StringLit | SyntaxKind::TrueKw | SyntaxKind::FalseKw => {
                Slot::Node(self.bump())
            }
            SyntaxKind::LParenToken => {
                let lparen = self.bump();
                let inner = self.parse_expr();
                let rparen = self.expect_slot(SyntaxKind::RParenToken);
                Slot::Node(tree(SyntaxKind::ParenExpr, vec![Slot::Node(lparen), inner, rparen]))
            }
            SyntaxKind::NotKw => {
                let kw = self.bump();
                let operand = self.parse_factor();
                Slot::Node(tree(SyntaxKind::NotExpr, vec![Slot::Node(kw), operand]))
            }
            k if STANDARD_TYPE_KWS.contains(&k) => {
                let kw = self.bump();
                let lparen = self.expect_slot(SyntaxKind::LParenToken);
                let inner = self.parse_expr();
                let rparen = self.expect_slot(SyntaxKind::RParenToken);
                Slot::Node(tree(SyntaxKind::CastExpr, vec![Slot::Node(kw), lparen, inner, rparen]))
            }
            _ => {
                self.report_expected_expr();
                Slot::Empty
            }
        }
    }

    fn parse_variable(&mut self) -> Slot {
        let name = self.expect_slot(SyntaxKind::IdentToken);
        if self.at(SyntaxKind::LBracketToken) {
            let lbracket = self.bump();
            let index = self.parse_expr();
            let rbracket = self.expect_slot(SyntaxKind::RBracketToken);
            Slot::Node(tree(SyntaxKind::IndexedVar, vec![name, Slot::Node(lbracket), index, rbracket]))
        } else {
            Slot::Node(tree(SyntaxKind::EntireVar, vec![name]))
        }
    }

    // ---- statements ----

    /// Parses one statement if the current token can start one, `None` for
    /// an empty statement (the grammar's `empty_statement` production, which
    /// consumes nothing).
    fn parse_stmt_opt(&mut self) -> Option<Slot> {
        Some(match self.peek() {
            SyntaxKind::IdentToken => self.parse_assign_stmt(),
            SyntaxKind::IfKw => self.parse_if_stmt(),
            SyntaxKind::WhileKw => self.parse_while_stmt(),
            SyntaxKind::BreakKw => Slot::Node(tree(SyntaxKind::BreakStmt, vec![Slot::Node(self.bump())])),
            SyntaxKind::CallKw => self.parse_call_stmt(),
            SyntaxKind::ReturnKw => Slot::Node(tree(SyntaxKind::ReturnStmt, vec![Slot::Node(self.bump())])),
            SyntaxKind::ReadKw | SyntaxKind::ReadLnKw => self.parse_input_stmt(),
            SyntaxKind::WriteKw | SyntaxKind::WriteLnKw => self.parse_output_stmt(),
            SyntaxKind::BeginKw => self.parse_comp_stmt(),
            _ => return None,
        })
    }

    /// A statement the grammar requires (the then/else branch of an `if`,
    /// the body of a `while`): still tolerates an empty statement, but
    /// reports one if the current token can't start anything at all.
    fn parse_stmt_required(&mut self) -> Slot {
        match self.parse_stmt_opt() {
            Some(slot) => slot,
            None => {
                self.report_unexpected(&["a statement".to_string()]);
                Slot::Empty
            }
        }
    }

    fn parse_assign_stmt(&mut self) -> Slot {
        let lhs = self.parse_variable();
        let assign = self.expect_slot(SyntaxKind::AssignToken);
        let rhs = self.parse_expr();
        Slot::Node(tree(SyntaxKind::AssignStmt, vec![lhs, assign, rhs]))
    }

    fn parse_if_stmt(&mut self) -> Slot {
        let if_kw = self.bump();
        let cond = self.parse_expr();
        let then_kw = self.expect_slot(SyntaxKind::ThenKw);
        let then_stmt = self.parse_stmt_required();
        let mut children = vec![Slot::Node(if_kw), cond, then_kw, then_stmt];
        if self.at(SyntaxKind::ElseKw) {
            children.push(Slot::Node(self.bump()));
            children.push(self.parse_stmt_required());
        }
        Slot::Node(tree(SyntaxKind::IfStmt, children))
    }

    fn parse_while_stmt(&mut self) -> Slot {
        let while_kw = self.bump();
        let cond = self.parse_expr();
        let do_kw = self.expect_slot(SyntaxKind::DoKw);
        let body = self.parse_stmt_required();
        Slot::Node(tree(SyntaxKind::WhileStmt, vec![Slot::Node(while_kw), cond, do_kw, body]))
    }

    fn parse_call_stmt(&mut self) -> Slot {
        let call_kw = self.bump();
        let name = self.expect_slot(SyntaxKind::IdentToken);
        let mut children = vec![Slot::Node(call_kw), name];
        if self.at(SyntaxKind::LParenToken) {
            children.push(self.parse_act_param_list());
        }
        Slot::Node(tree(SyntaxKind::CallStmt, children))
    }

    fn parse_act_param_list(&mut self) -> Slot {
        let lparen = self.bump();
        let mut children = vec![Slot::Node(lparen), self.parse_expr()];
        while self.at(SyntaxKind::CommaToken) {
            children.push(Slot::Node(self.bump()));
            children.push(self.parse_expr());
        }
        children.push(self.expect_slot(SyntaxKind::RParenToken));
        Slot::Node(tree(SyntaxKind::ActParamList, children))
    }

    fn parse_input_stmt(&mut self) -> Slot {
        let kw = self.bump();
        let mut children = vec![Slot::Node(kw)];
        if self.at(SyntaxKind::LParenToken) {
            children.push(self.parse_input_list());
        }
        Slot::Node(tree(SyntaxKind::InputStmt, children))
    }

    fn parse_input_list(&mut self) -> Slot {
        let lparen = self.bump();
        let mut children = vec![Slot::Node(lparen), self.parse_variable()];
        while self.at(SyntaxKind::CommaToken) {
            children.push(Slot::Node(self.bump()));
            children.push(self.parse_variable());
        }
        children.push(self.expect_slot(SyntaxKind::RParenToken));
        Slot::Node(tree(SyntaxKind::InputList, children))
    }

    fn parse_output_stmt(&mut self) -> Slot {
        let kw = self.bump();
        let mut children = vec![Slot::Node(kw)];
        if self.at(SyntaxKind::LParenToken) {
            children.push(self.parse_output_list());
        }
        Slot::Node(tree(SyntaxKind::OutputStmt, children))
    }

    fn parse_output_list(&mut self) -> Slot {
        let lparen = self.bump();
        let mut children = vec![Slot::Node(lparen), self.parse_output_value()];
        while self.at(SyntaxKind::CommaToken) {
            children.push(Slot::Node(self.bump()));
            children.push(self.parse_output_value());
        }
        children.push(self.expect_slot(SyntaxKind::RParenToken));
        Slot::Node(tree(SyntaxKind::OutputList, children))
    }

    fn parse_output_value(&mut self) -> Slot {
        let mut children = vec![self.parse_expr()];
        if self.at(SyntaxKind::ColonToken) {
            children.push(Slot::Node(self.bump()));
            children.push(self.expect_slot(SyntaxKind::NumberLit));
        }
        Slot::Node(tree(SyntaxKind::OutputValue, children))
    }

    fn parse_comp_stmt(&mut self) -> Slot {
        let begin_kw = self.bump();
        let mut children = vec![Slot::Node(begin_kw)];
        if let Some(s) = self.parse_stmt_opt() {
            children.push(s);
        }
        while self.at(SyntaxKind::SemiToken) {
            let before = self.pos;
            children.push(Slot::Node(self.bump()));
            if let Some(s) = self.parse_stmt_opt() {
                children.push(s);
            }
            self.recover_if_stuck(before, STMT_SYNC);
        }
        children.push(self.expect_slot(SyntaxKind::EndKw));
        Slot::Node(tree(SyntaxKind::CompStmt, children))
    }

    // ---- declarations ----

    fn at_standard_type(&self) -> bool {
        STANDARD_TYPE_KWS.contains(&self.peek())
    }

    fn parse_type(&mut self) -> Slot {
        if self.at(SyntaxKind::ArrayKw) {
            self.parse_array_type()
        } else if self.at_standard_type() {
            Slot::Node(self.bump())
        } else {
            self.report_unexpected(&["array".to_string(), "integer".to_string(), "boolean".to_string(), "char".to_string()]);
            Slot::Empty
        }
    }

    fn parse_array_type(&mut self) -> Slot {
        let array_kw = self.bump();
        let lbracket = self.expect_slot(SyntaxKind::LBracketToken);
        let size = self.expect_slot(SyntaxKind::NumberLit);
        let rbracket = self.expect_slot(SyntaxKind::RBracketToken);
        let of_kw = self.expect_slot(SyntaxKind::OfKw);
        let elem = if self.at_standard_type() {
            Slot::Node(self.bump())
        } else {
            self.report_unexpected(&["integer".to_string(), "boolean".to_string(), "char".to_string()]);
            Slot::Empty
        };
        Slot::Node(tree(
            SyntaxKind::ArrayType,
            vec![Slot::Node(array_kw), lbracket, size, rbracket, of_kw, elem],
        ))
    }

    /// `variable_names_and_type`: one or more comma-separated names, a
    /// colon, a type, and (for top-level `var` entries only) a terminating
    /// semicolon.
    fn parse_names_and_type(&mut self, kind: SyntaxKind, trailing_semi: bool) -> Slot {
        let mut children = vec![self.expect_slot(SyntaxKind::IdentToken)];
        while self.at(SyntaxKind::CommaToken) {
            children.push(Slot::Node(self.bump()));
            children.push(self.expect_slot(SyntaxKind::IdentToken));
        }
        children.push(self.expect_slot(SyntaxKind::ColonToken));
        children.push(self.parse_type());
        if trailing_semi {
            children.push(self.expect_slot(SyntaxKind::SemiToken));
        }
        Slot::Node(tree(kind, children))
    }

    fn parse_var_decl_part(&mut self) -> Slot {
        if !self.at(SyntaxKind::VarKw) {
            return Slot::Empty;
        }
        let var_kw = self.bump();
        let mut children = vec![Slot::Node(var_kw), self.parse_names_and_type(SyntaxKind::VarDecl, true)];
        while self.at(SyntaxKind::IdentToken) {
            let before = self.pos;
            children.push(self.parse_names_and_type(SyntaxKind::VarDecl, true));
            self.recover_if_stuck(before, DECL_SYNC);
        }
        Slot::Node(tree(SyntaxKind::VarDeclPart, children))
    }

    fn parse_fml_param_list(&mut self) -> Slot {
        if !self.at(SyntaxKind::LParenToken) {
            return Slot::Empty;
        }
        let lparen = self.bump();
        let mut children = vec![Slot::Node(lparen), self.parse_names_and_type(SyntaxKind::FmlParamSec, false)];
        while self.at(SyntaxKind::SemiToken) {
            children.push(Slot::Node(self.bump()));
            children.push(self.parse_names_and_type(SyntaxKind::FmlParamSec, false));
        }
        children.push(self.expect_slot(SyntaxKind::RParenToken));
        Slot::Node(tree(SyntaxKind::FmlParamList, children))
    }

    fn parse_proc_decl(&mut self) -> Rc<RawNode> {
        let procedure_kw = self.bump();
        let mut children = vec![Slot::Node(procedure_kw)];
        children.push(self.expect_slot(SyntaxKind::IdentToken));
        children.push(self.parse_fml_param_list());
        children.push(self.expect_slot(SyntaxKind::SemiToken));
        children.push(self.parse_var_decl_part());
        children.push(self.parse_comp_stmt());
        children.push(self.expect_slot(SyntaxKind::SemiToken));
        tree(SyntaxKind::ProcDecl, children)
    }

    fn parse_program(&mut self) -> Rc<RawNode> {
        let mut children = vec![
            self.expect_slot(SyntaxKind::ProgramKw),
            self.expect_slot(SyntaxKind::IdentToken),
            self.expect_slot(SyntaxKind::SemiToken),
            self.parse_var_decl_part(),
        ];
        while self.at(SyntaxKind::ProcedureKw) {
            let before = self.pos;
            children.push(Slot::Node(self.parse_proc_decl()));
            self.recover_if_stuck(before, &[SyntaxKind::BeginKw, SyntaxKind::EofToken]);
        }
        children.push(self.parse_comp_stmt());
        children.push(self.expect_slot(SyntaxKind::DotToken));
        // Attach whatever trailing trivia led into EOF so the tree still
        // reconstructs the exact source text; `ast::Program` never looks
        // for this child so it's invisible to every later stage.
        children.push(Slot::Node(self.bump()));
        tree(SyntaxKind::Program, children)
    }
}

fn describe(kind: SyntaxKind) -> String {
    match kind.fixed_text() {
        Some(text) => format!("`{text}`"),
        None => format!("{kind:?}"),
    }
}

/// Parses MPPL source text into a lossless syntax tree, plus every
/// diagnostic raised while lexing and parsing it. Never panics and never
/// stops partway through the file: a malformed construct leaves `Empty`
/// slots behind and parsing resumes at the next token it recognizes.
pub fn parse(text: &str) -> (Rc<crate::cst::SyntaxTree>, Vec<Diagnostic>) {
    let (tokens, lex_diagnostics) = lexer::lex(text);
    let mut parser = Parser::new(text, tokens);
    let root = parser.parse_program();
    let mut diagnostics = lex_diagnostics;
    diagnostics.extend(parser.diagnostics);
    (crate::cst::SyntaxTree::new_root(root), diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{self, AstNode};

    fn parse_ok(text: &str) -> Rc<crate::cst::SyntaxTree> {
        let (tree, diags) = parse(text);
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
        tree
    }

    #[test]
    fn minimal_program_round_trips_through_render() {
        let src = "program p;\nbegin\nend.\n";
        let tree = parse_ok(src);
        assert_eq!(tree.render(0, src), src);
    }

    #[test]
    fn var_decl_part_collects_multiple_declarations() {
        let src = "program p;\nvar x, y: integer;\n    z: array[3] of char;\nbegin\nend.";
        let tree = parse_ok(src);
        let program = ast::Program::cast(tree).unwrap();
        let decls = program.var_decl_part().unwrap().decls();
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].names().len(), 2);
        assert!(decls[1].array_type().is_some());
    }

    #[test]
    fn proc_decl_carries_formal_params_and_body() {
        let src = "program p;\nprocedure q(a: integer; b: boolean);\nbegin\nend;\nbegin\n  call q(1, true)\nend.";
        let tree = parse_ok(src);
        let program = ast::Program::cast(tree).unwrap();
        let procs = program.proc_decls();
        assert_eq!(procs.len(), 1);
        assert_eq!(procs[0].fml_params().unwrap().sections().len(), 2);
    }

    #[test]
    fn assignment_and_if_and_while_parse_into_expected_shapes() {
        let src = "program p;\nvar x: integer;\nbegin\n  if x = 1 then x := x + 1 else x := 0;\n  while x < 10 do x := x + 1\nend.";
        let tree = parse_ok(src);
        let program = ast::Program::cast(tree).unwrap();
        let stmts = program.body().unwrap().statements();
        assert_eq!(stmts.len(), 2);
        match &stmts[0] {
            ast::Stmt::If(s) => {
                assert!(s.condition().is_some());
                assert!(s.else_stmt().is_some());
            }
            other => panic!("expected if statement, got {other:?}"),
        }
    }

    #[test]
    fn unary_sign_and_not_lower_through_not_expr() {
        let src = "program p;\nvar x: boolean;\nbegin\n  x := not (x = x)\nend.";
        let tree = parse_ok(src);
        let program = ast::Program::cast(tree).unwrap();
        let stmts = program.body().unwrap().statements();
        match &stmts[0] {
            ast::Stmt::Assign(s) => match s.rhs().unwrap() {
                ast::Expr::Not(n) => assert!(n.operand().is_some()),
                other => panic!("expected not-expr, got {other:?}"),
            },
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn output_value_separates_expr_from_width() {
        let src = "program p;\nvar x: integer;\nbegin\n  write(x: 5, 'hi')\nend.";
        let tree = parse_ok(src);
        let program = ast::Program::cast(tree).unwrap();
        let stmts = program.body().unwrap().statements();
        match &stmts[0] {
            ast::Stmt::Output(s) => {
                let values = s.values();
                assert_eq!(values.len(), 2);
                assert!(values[0].width_lit().is_some());
                assert!(values[1].width_lit().is_none());
            }
            other => panic!("expected output statement, got {other:?}"),
        }
    }

    #[test]
    fn missing_closing_paren_recovers_with_diagnostic() {
        let src = "program p;\nvar x: integer;\nbegin\n  x := (1 + 2\nend.";
        let (tree, diags) = parse(src);
        assert!(!diags.is_empty());
        let program = ast::Program::cast(tree).unwrap();
        assert!(program.body().is_some());
    }

    #[test]
    fn missing_semicolon_between_statements_still_parses_both() {
        let src = "program p;\nvar x: integer;\nbegin\n  x := 1\n  x := 2\nend.";
        let (tree, diags) = parse(src);
        assert!(!diags.is_empty());
        let program = ast::Program::cast(tree).unwrap();
        assert!(!program.body().unwrap().statements().is_empty());
    }

    #[test]
    fn call_statement_without_parens_has_no_act_param_list() {
        let src = "program p;\nprocedure q;\nbegin\nend;\nbegin\n  call q\nend.";
        let tree = parse_ok(src);
        let program = ast::Program::cast(tree).unwrap();
        let stmts = program.body().unwrap().statements();
        match &stmts[0] {
            ast::Stmt::Call(s) => assert!(s.args().is_empty()),
            other => panic!("expected call statement, got {other:?}"),
        }
    }
}
