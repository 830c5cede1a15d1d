//! Pretty-printer: re-emits source either verbatim (exact round-trip) or
//! reformatted from the typed AST with normalized indentation.
//!
//! The verbatim path is a one-liner over [`crate::cst::SyntaxTree::render`]
//! (the lossless CST already stores every byte of trivia, so there is
//! nothing to reconstruct). The normalized path walks [`crate::ast`] instead
//! of the raw CST, the same typed accessors the checker and lowerer use,
//! re-indenting by nesting depth and collapsing comments/whitespace into a
//! fixed house style. Keyword/literal coloring is shared between both paths.

use std::fmt::Write as _;
use std::rc::Rc;

use crate::ast::{Expr, Program, Stmt};
use crate::cst::SyntaxTree;
use crate::syntax_kind::SyntaxKind;

const INDENT: &str = "    ";

/// Re-emits `root`'s exact source text, trivia included.
pub fn render_verbatim(root: &Rc<SyntaxTree>, full_text: &str) -> String {
    root.render(0, full_text)
}

fn lexeme<'a>(node: &Rc<SyntaxTree>, full_text: &'a str) -> &'a str {
    match node.token_span() {
        Some((start, end)) => &full_text[start..end],
        None => "",
    }
}

fn colorize(kind: SyntaxKind, text: &str, color: bool) -> String {
    if !color {
        return text.to_string();
    }
    if kind.is_keyword() {
        format!("\x1b[34m{text}\x1b[0m")
    } else if matches!(kind, SyntaxKind::NumberLit | SyntaxKind::StringLit | SyntaxKind::TrueKw | SyntaxKind::FalseKw) {
        format!("\x1b[32m{text}\x1b[0m")
    } else {
        text.to_string()
    }
}

struct Printer<'a> {
    full_text: &'a str,
    color: bool,
    out: String,
}

impl<'a> Printer<'a> {
    fn kw(&mut self, node: &Option<Rc<SyntaxTree>>) -> &mut Self {
        if let Some(n) = node {
            let text = colorize(n.kind(), lexeme(n, self.full_text), self.color);
            let _ = write!(self.out, "{text}");
        }
        self
    }

    fn raw(&mut self, text: &str) -> &mut Self {
        self.out.push_str(text);
        self
    }

    fn indent(&mut self, depth: usize) -> &mut Self {
        for _ in 0..depth {
            self.out.push_str(INDENT);
        }
        self
    }

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::EntireVar(v) => self.kw(&v.name()).raw(""),
            Expr::IndexedVar(v) => {
                self.kw(&v.name());
                self.raw("[");
                if let Some(idx) = v.index() {
                    self.expr(&idx);
                }
                self.raw("]")
            }
            Expr::Binary(b) => {
                if let Some(lhs) = b.lhs() {
                    self.expr(&lhs);
                }
                self.raw(" ");
                self.kw(&b.op());
                self.raw(" ");
                if let Some(rhs) = b.rhs() {
                    self.expr(&rhs);
                }
                self
            }
            Expr::Paren(p) => {
                self.raw("(");
                if let Some(inner) = p.inner() {
                    self.expr(&inner);
                }
                self.raw(")")
            }
            Expr::Not(n) => {
                self.kw(&n.op());
                if matches!(n.op().map(|o| o.kind()), Some(SyntaxKind::NotKw)) {
                    self.raw(" ");
                }
                if let Some(operand) = n.operand() {
                    self.expr(&operand);
                }
                self
            }
            Expr::Cast(c) => {
                self.kw(&c.target_type_kw());
                self.raw("(");
                if let Some(operand) = c.operand() {
                    self.expr(&operand);
                }
                self.raw(")")
            }
            Expr::Literal(lit) => {
                let text = colorize(lit.kind(), lexeme(lit, self.full_text), self.color);
                self.raw(&text)
            }
        };
    }

    fn stmt(&mut self, stmt: &Stmt, depth: usize) {
        self.indent(depth);
        match stmt {
            Stmt::Assign(a) => {
                if let Some(lhs) = a.lhs() {
                    self.expr(&lhs);
                }
                self.raw(" := ");
                if let Some(rhs) = a.rhs() {
                    self.expr(&rhs);
                }
            }
            Stmt::If(i) => {
                self.raw("if ");
                if let Some(cond) = i.condition() {
                    self.expr(&cond);
                }
                self.raw(" then\n");
                if let Some(then_stmt) = i.then_stmt() {
                    self.stmt(&then_stmt, depth + 1);
                }
                if let Some(else_stmt) = i.else_stmt() {
                    self.raw("\n");
                    self.indent(depth);
                    self.raw("else\n");
                    self.stmt(&else_stmt, depth + 1);
                }
            }
            Stmt::While(w) => {
                self.raw("while ");
                if let Some(cond) = w.condition() {
                    self.expr(&cond);
                }
                self.raw(" do\n");
                if let Some(body) = w.body() {
                    self.stmt(&body, depth + 1);
                }
            }
            Stmt::Break(_) => {
                self.raw("break");
            }
            Stmt::Call(c) => {
                self.raw("call ");
                self.kw(&c.name());
                let args = c.args();
                if !args.is_empty() {
                    self.raw("(");
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            self.raw(", ");
                        }
                        self.expr(arg);
                    }
                    self.raw(")");
                }
            }
            Stmt::Return(_) => {
                self.raw("return");
            }
            Stmt::Input(input) => {
                self.raw(if input.is_readln() { "readln" } else { "read" });
                let targets = input.targets();
                if !targets.is_empty() {
                    self.raw("(");
                    for (i, t) in targets.iter().enumerate() {
                        if i > 0 {
                            self.raw(", ");
                        }
                        self.expr(t);
                    }
                    self.raw(")");
                }
            }
            Stmt::Output(output) => {
                self.raw(if output.is_writeln() { "writeln" } else { "write" });
                let values = output.values();
                if !values.is_empty() {
                    self.raw("(");
                    for (i, v) in values.iter().enumerate() {
                        if i > 0 {
                            self.raw(", ");
                        }
                        if let Some(e) = v.expr() {
                            self.expr(&e);
                        }
                        if let Some(w) = v.width_lit() {
                            self.raw(":");
                            self.raw(lexeme(&w, self.full_text));
                        }
                    }
                    self.raw(")");
                }
            }
            Stmt::Comp(comp) => {
                self.raw("begin\n");
                let statements = comp.statements();
                for (i, s) in statements.iter().enumerate() {
                    if i > 0 {
                        self.raw(";\n");
                    }
                    self.stmt(s, depth + 1);
                }
                self.raw("\n");
                self.indent(depth);
                self.raw("end");
            }
        }
    }
}

/// Re-renders `program` in a normalized house style: four-space indents per
/// nesting level, one statement per line, a single space around binary
/// operators.
pub fn render_normalized(program: &Program, full_text: &str, color: bool) -> String {
    let mut p = Printer { full_text, color, out: String::new() };

    p.raw("program ");
    p.kw(&program.name());
    p.raw(";\n");

    if let Some(var_decls) = program.var_decl_part() {
        for decl in var_decls.decls() {
            p.raw("var ");
            let names = decl.names();
            for (i, n) in names.iter().enumerate() {
                if i > 0 {
                    p.raw(", ");
                }
                p.kw(&Some(n.clone()));
            }
            p.raw(": ");
            if let Some(arr) = decl.array_type() {
                p.raw("array[");
                if let Some(size) = arr.size_lit() {
                    p.raw(lexeme(&size, full_text));
                }
                p.raw("] of ");
                p.kw(&arr.elem_type_kw());
            } else {
                p.kw(&decl.scalar_type_kw());
            }
            p.raw(";\n");
        }
    }

    for proc in program.proc_decls() {
        p.raw("\nprocedure ");
        p.kw(&proc.name());
        if let Some(params) = proc.fml_params() {
            let sections = params.sections();
            if !sections.is_empty() {
                p.raw("(");
                for (i, sec) in sections.iter().enumerate() {
                    if i > 0 {
                        p.raw("; ");
                    }
                    let names = sec.names();
                    for (j, n) in names.iter().enumerate() {
                        if j > 0 {
                            p.raw(", ");
                        }
                        p.kw(&Some(n.clone()));
                    }
                    p.raw(": ");
                    p.kw(&sec.scalar_type_kw());
                }
                p.raw(")");
            }
        }
        p.raw(";\n");
        if let Some(body) = proc.body() {
            p.stmt(&Stmt::Comp(body), 0);
            p.raw(";\n");
        }
    }

    p.raw("\n");
    if let Some(body) = program.body() {
        p.stmt(&Stmt::Comp(body), 0);
    }
    p.raw(".\n");

    p.out
}
