//! Cross-reference printer: for every declared name, its type, definition
//! site, and ordered use sites.
//!
//! Grounded on `examples/original_source/cross_ref.c`'s `print_cross_ref`:
//! same `Name | Type | Def. | Ref.` record shape, same recursive walk down
//! through a program's nested procedure bodies, printed depth-first in
//! declaration order.

use std::fmt::Write as _;

use crate::interner::StringInterner;
use crate::ir::{IrArena, ItemId};
use crate::source::Source;
use crate::types::TypeTable;

/// Prints one record per declared item reachable from `program`'s body, in
/// declaration order, recursing into nested procedure bodies depth-first.
pub fn generate(arena: &IrArena, program: ItemId, types: &TypeTable, intern: &StringInterner, source: &Source) -> String {
    let mut out = String::new();
    print_body_items(&mut out, arena, program, types, intern, source);
    out
}

fn print_body_items(out: &mut String, arena: &IrArena, id: ItemId, types: &TypeTable, intern: &StringInterner, source: &Source) {
    let Some(body) = arena.item(id).body.as_ref() else {
        return;
    };
    for &inner_id in &body.items {
        let inner = arena.item(inner_id);

        let _ = writeln!(out, "Name | {}", intern.resolve(inner.name));
        let _ = writeln!(out, "Type | {}", types.display(inner.ty));
        let def_loc = source.location(inner.definition_site);
        let _ = writeln!(out, "Def. | {}:{}", def_loc.line, def_loc.column);

        let refs: Vec<String> = inner
            .use_sites
            .iter()
            .map(|&offset| {
                let loc = source.location(offset);
                format!("{}:{}", loc.line, loc.column)
            })
            .collect();
        let _ = writeln!(out, "Ref. | {}", refs.join(", "));
        let _ = writeln!(out);

        print_body_items(out, arena, inner_id, types, intern, source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::AstNode;
    use crate::checker::check;
    use crate::lower::lower;
    use crate::parser::parse;
    use crate::resolver::resolve;

    #[test]
    fn records_one_entry_per_declared_variable() {
        let src = "program p; var x: integer; begin x := 1 end.";
        let (tree, _) = parse(src);
        let mut intern = StringInterner::new();
        let resolved = resolve(&tree, src, &mut |s| intern.intern(s));
        let program = crate::ast::Program::cast(tree).unwrap();
        let mut types = TypeTable::new();
        let checked = check(&program, src, &resolved.events, &mut types);
        let lowered = lower(&program, src, &resolved.events, &mut types, &checked, &mut |s| intern.intern(s));
        let source = Source::new("t.mpl", src);

        let out = generate(&lowered.arena, lowered.program_item, &types, &intern, &source);
        assert!(out.contains("Name | x"));
        assert!(out.contains("Type | integer"));
        assert!(out.contains("Ref. |"));
    }
}
