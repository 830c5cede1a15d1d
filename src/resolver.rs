//! Name resolution: a depth-first walk over the CST maintaining a stack of
//! lexical scopes, emitting an ordered stream of semantic events.
//!
//! Grounded line-for-line on the original compiler's `mppl_resolver.c`:
//! same `Binding{name, depth, declared_at}` record, same shadow-list
//! restoration on scope pop, same dispatch on an identifier token's parent
//! kind to decide decl vs. use, same decoupling of "which idents are
//! bindings" from "what does each resolve to" (the event stream is a pure
//! function of the syntax tree; nothing here mutates the tree itself). Also
//! matches its choice of exactly where a scope boundary sits: a new scope
//! opens around a procedure's local declarations and body, not around the
//! procedure as a whole, so the procedure's own name and its parameters
//! resolve as if declared in the enclosing scope (see `walk_proc_decl`).

use std::collections::HashMap;
use std::rc::Rc;

use crate::cst::SyntaxTree;
use crate::diagnostic::{builders, Diagnostic};
use crate::interner::Symbol;
use crate::syntax_kind::SyntaxKind;

#[derive(Debug, Clone, Copy)]
struct Binding {
    name: Symbol,
    depth: usize,
    declared_at: usize,
}

struct Scope {
    depth: usize,
    bindings: Vec<Binding>,
    shadowed: Vec<Binding>,
}

/// One entry in the resolver's output stream, in tree-walk order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticEvent {
    Define { declared_at: usize },
    Use { declared_at: usize, used_at: usize },
    NotFound { used_at: usize },
}

pub struct ResolveResult {
    pub events: Vec<SemanticEvent>,
    pub diagnostics: Vec<Diagnostic>,
}

struct Resolver<'a> {
    scopes: Vec<Scope>,
    bindings: HashMap<Symbol, Binding>,
    events: Vec<SemanticEvent>,
    diagnostics: Vec<Diagnostic>,
    intern: &'a mut dyn FnMut(&str) -> Symbol,
}

impl<'a> Resolver<'a> {
    fn push_scope(&mut self) {
        let depth = self.scopes.last().map(|s| s.depth + 1).unwrap_or(0);
        self.scopes.push(Scope {
            depth,
            bindings: Vec::new(),
            shadowed: Vec::new(),
        });
    }

    fn pop_scope(&mut self) {
        let scope = self.scopes.pop().expect("pop_scope without matching push");
        for binding in &scope.bindings {
            self.bindings.remove(&binding.name);
        }
        for binding in scope.shadowed {
            self.bindings.insert(binding.name, binding);
        }
    }

    fn enter_binding_use(&mut self, name: Symbol, used_at: usize) {
        match self.bindings.get(&name) {
            Some(binding) => self.events.push(SemanticEvent::Use {
                declared_at: binding.declared_at,
                used_at,
            }),
            None => {
                self.events.push(SemanticEvent::NotFound { used_at });
            }
        }
    }

    fn enter_binding_decl(&mut self, name: Symbol, text: &str, offset: usize, len: usize, is_program: bool) {
        if !is_program {
            let depth = self.scopes.last().map(|s| s.depth).unwrap_or(0);
            let binding = Binding {
                name,
                depth,
                declared_at: offset,
            };
            if let Some(shadowed) = self.bindings.get(&name).copied() {
                if shadowed.depth == depth {
                    self.diagnostics.push(builders::multiple_definition(
                        offset,
                        len,
                        text,
                        shadowed.declared_at,
                    ));
                } else {
                    self.scopes.last_mut().unwrap().shadowed.push(shadowed);
                    self.scopes.last_mut().unwrap().bindings.push(binding);
                    self.bindings.insert(name, binding);
                }
            } else {
                self.scopes.last_mut().unwrap().bindings.push(binding);
                self.bindings.insert(name, binding);
            }
        }
        self.events.push(SemanticEvent::Define { declared_at: offset });
    }

    fn enter_ident(&mut self, ident: &Rc<SyntaxTree>, text: &str) {
        let name = (self.intern)(text);
        let (offset, len) = ident.token_span().unwrap_or((ident.absolute_offset, ident.text_len()));
        let mut parent = ident.parent.clone();
        while let Some(p) = parent {
            match p.kind() {
                SyntaxKind::EntireVar | SyntaxKind::IndexedVar | SyntaxKind::CallStmt => {
                    self.enter_binding_use(name, offset);
                    return;
                }
                kind @ (SyntaxKind::Program
                | SyntaxKind::VarDecl
                | SyntaxKind::ProcDecl
                | SyntaxKind::FmlParamSec) => {
                    let is_program = kind == SyntaxKind::Program;
                    self.enter_binding_decl(name, text, offset, len, is_program);
                    return;
                }
                _ => parent = p.parent.clone(),
            }
        }
    }

    fn walk(&mut self, node: &Rc<SyntaxTree>, full_text: &str) {
        if node.kind() == SyntaxKind::ProcDecl {
            self.walk_proc_decl(node, full_text);
            return;
        }
        let pushes_scope = node.kind() == SyntaxKind::Program;
        if pushes_scope {
            self.push_scope();
        }
        for child in node.children() {
            if child.kind() == SyntaxKind::IdentToken {
                if let Some((start, end)) = child.token_span() {
                    let text = &full_text[start..end];
                    self.enter_ident(&child, text);
                }
            } else {
                self.walk(&child, full_text);
            }
        }
        if pushes_scope {
            self.pop_scope();
        }
    }

    /// A procedure's name and formal parameters live in the *enclosing*
    /// scope (so a call to the procedure, or a reference to a parameter from
    /// within its own body, resolves the ordinary way); only its local
    /// variable declarations and body statements get a fresh nested scope.
    /// Mirrors the original resolver pushing a scope around `PROC_BODY`
    /// specifically, not around the whole `PROC_DECL`.
    fn walk_proc_decl(&mut self, node: &Rc<SyntaxTree>, full_text: &str) {
        let mut body_scope_open = false;
        for child in node.children() {
            if child.kind() == SyntaxKind::IdentToken {
                if let Some((start, end)) = child.token_span() {
                    let text = &full_text[start..end];
                    self.enter_ident(&child, text);
                }
                continue;
            }
            if !body_scope_open && matches!(child.kind(), SyntaxKind::VarDeclPart | SyntaxKind::CompStmt) {
                self.push_scope();
                body_scope_open = true;
            }
            self.walk(&child, full_text);
        }
        if body_scope_open {
            self.pop_scope();
        }
    }
}

/// Walk `root` and produce the ordered semantic event stream plus any
/// `multiple-definition`/`not-defined` diagnostics. `full_text` is the whole
/// source (the raw tree only stores offsets/lengths, not copies of
/// lexemes) and `intern` is the caller's symbol interner.
pub fn resolve(
    root: &Rc<SyntaxTree>,
    full_text: &str,
    intern: &mut dyn FnMut(&str) -> Symbol,
) -> ResolveResult {
    let mut resolver = Resolver {
        scopes: Vec::new(),
        bindings: HashMap::new(),
        events: Vec::new(),
        diagnostics: Vec::new(),
        intern,
    };
    resolver.walk(root, full_text);
    ResolveResult {
        events: resolver.events,
        diagnostics: resolver.diagnostics,
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

    #[test]
    fn use_before_decl_in_same_program_resolves() {
        // program p; var x: integer; begin x := x end.
        let decl_name = ident("x");
        let var_decl = tree(SyntaxKind::VarDecl, vec![Slot::Node(decl_name)]);
        let var_decl_part = tree(SyntaxKind::VarDeclPart, vec![Slot::Node(var_decl)]);

        let use_name = ident("x");
        let entire_var = tree(SyntaxKind::EntireVar, vec![Slot::Node(use_name)]);
        let assign = tree(SyntaxKind::AssignStmt, vec![Slot::Node(entire_var)]);
        let comp = tree(SyntaxKind::CompStmt, vec![Slot::Node(assign)]);

        let prog_name = ident("p");
        let program = tree(
            SyntaxKind::Program,
            vec![
                Slot::Node(prog_name),
                Slot::Node(var_decl_part),
                Slot::Node(comp),
            ],
        );
        let root = SyntaxTree::new_root(program);
        let mut interner = StringInterner::new();
        let text = "pxx";
        let result = resolve(&root, text, &mut |s| interner.intern(s));
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.events.len(), 3);
    }

    #[test]
    fn undefined_use_emits_not_found() {
        let use_name = ident("y");
        let entire_var = tree(SyntaxKind::EntireVar, vec![Slot::Node(use_name)]);
        let assign = tree(SyntaxKind::AssignStmt, vec![Slot::Node(entire_var)]);
        let comp = tree(SyntaxKind::CompStmt, vec![Slot::Node(assign)]);
        let prog_name = ident("p");
        let program = tree(
            SyntaxKind::Program,
            vec![Slot::Node(prog_name), Slot::Empty, Slot::Node(comp)],
        );
        let root = SyntaxTree::new_root(program);
        let mut interner = StringInterner::new();
        let text = "py";
        let result = resolve(&root, text, &mut |s| interner.intern(s));
        assert_eq!(result.diagnostics.len(), 1);
        assert!(matches!(result.events[1], SemanticEvent::NotFound { .. }));
    }

    #[test]
    fn same_depth_redefinition_reports_multiple_definition() {
        let d1 = ident("x");
        let d2 = ident("x");
        let decl1 = tree(SyntaxKind::VarDecl, vec![Slot::Node(d1)]);
        let decl2 = tree(SyntaxKind::VarDecl, vec![Slot::Node(d2)]);
        let part = tree(
            SyntaxKind::VarDeclPart,
            vec![Slot::Node(decl1), Slot::Node(decl2)],
        );
        let prog_name = ident("p");
        let program = tree(
            SyntaxKind::Program,
            vec![Slot::Node(prog_name), Slot::Node(part), Slot::Empty],
        );
        let root = SyntaxTree::new_root(program);
        let mut interner = StringInterner::new();
        let text = "pxx";
        let result = resolve(&root, text, &mut |s| interner.intern(s));
        assert_eq!(result.diagnostics.len(), 1);
    }

    /// `program p; procedure q(n: integer); begin x := n end; begin call q end.`
    /// `n` resolves inside `q`'s own body, and `q` itself resolves from the
    /// outer call — both bound in the enclosing scope, not `q`'s nested one.
    #[test]
    fn proc_name_and_params_resolve_in_enclosing_scope() {
        let param_name = ident("n");
        let fml_sec = tree(SyntaxKind::FmlParamSec, vec![Slot::Node(param_name)]);
        let fml_list = tree(SyntaxKind::FmlParamList, vec![Slot::Node(fml_sec)]);

        let param_use = ident("n");
        let entire_var = tree(SyntaxKind::EntireVar, vec![Slot::Node(param_use)]);
        let assign = tree(SyntaxKind::AssignStmt, vec![Slot::Node(entire_var)]);
        let inner_comp = tree(SyntaxKind::CompStmt, vec![Slot::Node(assign)]);

        let proc_name = ident("q");
        let proc_decl = tree(
            SyntaxKind::ProcDecl,
            vec![Slot::Node(proc_name), Slot::Node(fml_list), Slot::Empty, Slot::Node(inner_comp)],
        );

        let outer_call_name = ident("q");
        let outer_call = tree(SyntaxKind::CallStmt, vec![Slot::Node(outer_call_name)]);
        let outer_comp = tree(SyntaxKind::CompStmt, vec![Slot::Node(outer_call)]);

        let prog_name = ident("p");
        let program = tree(
            SyntaxKind::Program,
            vec![Slot::Node(prog_name), Slot::Empty, Slot::Node(proc_decl), Slot::Node(outer_comp)],
        );
        let root = SyntaxTree::new_root(program);
        let mut interner = StringInterner::new();
        let text = "pqnnq";
        let result = resolve(&root, text, &mut |s| interner.intern(s));
        assert!(result.diagnostics.is_empty());
        let uses: Vec<_> = result
            .events
            .iter()
            .filter(|e| matches!(e, SemanticEvent::Use { .. }))
            .collect();
        assert_eq!(uses.len(), 2);
    }
}
