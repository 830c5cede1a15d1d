//! The lossless concrete syntax tree: an owned, immutable tree of tokens,
//! trivia, and interior nodes, plus a reference-counted `SyntaxTree` view
//! that layers parent pointers and absolute offsets over the shared raw
//! tree.
//!
//! This is an owned tree (`Rc`-linked, not a `rowan` green/red tree): nodes
//! carry their children directly rather than through an interned "green"
//! layer, following the simpler shape in
//! `rdaum-moor`'s `CSTNode`/`CSTNodeKind` design rather than pulling in
//! `rowan` for a crate this size.

use std::rc::Rc;

use crate::syntax_kind::SyntaxKind;

/// One piece of trivia (a run of whitespace, or a single comment) attached
/// to a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriviaPiece {
    pub kind: SyntaxKind,
    pub len: usize,
}

/// Trivia attached to one side of a token: ordered pieces plus their total
/// length, so a token's full span (leading trivia + lexeme + trailing
/// trivia) can be reconstructed without rescanning.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Trivia {
    pub pieces: Vec<TriviaPiece>,
}

impl Trivia {
    pub fn len(&self) -> usize {
        self.pieces.iter().map(|p| p.len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }
}

/// A leaf: a token's kind, its own lexeme length (excluding trivia), and the
/// trivia immediately before/after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: SyntaxKind,
    pub len: usize,
    pub leading: Trivia,
    pub trailing: Trivia,
}

impl Token {
    /// Full span length including attached trivia.
    pub fn full_len(&self) -> usize {
        self.leading.len() + self.len + self.trailing.len()
    }
}

/// One child slot of a `Tree`. `Empty` keeps position-stable: a production
/// that's missing still occupies a slot, so indexed accessors on the typed
/// view never shift.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Empty,
    Node(Rc<RawNode>),
}

impl Slot {
    pub fn as_node(&self) -> Option<&Rc<RawNode>> {
        match self {
            Slot::Node(n) => Some(n),
            Slot::Empty => None,
        }
    }

    fn text_len(&self) -> usize {
        match self {
            Slot::Empty => 0,
            Slot::Node(n) => n.text_len(),
        }
    }
}

/// A raw node: either a leaf token or an interior tree with ordered child
/// slots.
#[derive(Debug, Clone, PartialEq)]
pub enum RawNode {
    Token(Token),
    Tree { kind: SyntaxKind, children: Vec<Slot> },
}

impl RawNode {
    pub fn kind(&self) -> SyntaxKind {
        match self {
            RawNode::Token(t) => t.kind,
            RawNode::Tree { kind, .. } => *kind,
        }
    }

    /// Total text length, trivia included: the invariant that a tree's
    /// length equals the sum of its children's lengths holds by
    /// construction here.
    pub fn text_len(&self) -> usize {
        match self {
            RawNode::Token(t) => t.full_len(),
            RawNode::Tree { children, .. } => children.iter().map(Slot::text_len).sum(),
        }
    }

    pub fn children(&self) -> &[Slot] {
        match self {
            RawNode::Token(_) => &[],
            RawNode::Tree { children, .. } => children,
        }
    }
}

/// A reference-counted, position-aware view over a raw node: `absolute_offset`
/// is this node's start in the source, `parent` links back up the tree. This
/// is the handle every later stage (resolver, checker, lowerer) actually
/// walks; the raw tree underneath is shared and never mutated.
#[derive(Clone)]
pub struct SyntaxTree {
    pub raw: Rc<RawNode>,
    pub absolute_offset: usize,
    pub parent: Option<Rc<SyntaxTree>>,
}

impl SyntaxTree {
    pub fn new_root(raw: Rc<RawNode>) -> Rc<SyntaxTree> {
        Rc::new(SyntaxTree {
            raw,
            absolute_offset: 0,
            parent: None,
        })
    }

    pub fn kind(&self) -> SyntaxKind {
        self.raw.kind()
    }

    pub fn text_len(&self) -> usize {
        self.raw.text_len()
    }

    pub fn end_offset(&self) -> usize {
        self.absolute_offset + self.text_len()
    }

    /// The token's own lexeme span, excluding attached trivia.
    pub fn token_span(&self) -> Option<(usize, usize)> {
        match &*self.raw {
            RawNode::Token(t) => {
                let start = self.absolute_offset + t.leading.len();
                Some((start, start + t.len))
            }
            RawNode::Tree { .. } => None,
        }
    }

    /// Build the child view at `index`, computing its absolute offset by
    /// summing the lengths of preceding sibling slots. Returns `None` for an
    /// out-of-range index or an `Empty` slot.
    pub fn child(self: &Rc<Self>, index: usize) -> Option<Rc<SyntaxTree>> {
        let children = self.raw.children();
        let slot = children.get(index)?;
        let node = slot.as_node()?;
        let offset = self.absolute_offset
            + children[..index].iter().map(Slot::text_len).sum::<usize>();
        Some(Rc::new(SyntaxTree {
            raw: node.clone(),
            absolute_offset: offset,
            parent: Some(self.clone()),
        }))
    }

    pub fn children(self: &Rc<Self>) -> impl Iterator<Item = Rc<SyntaxTree>> + '_ {
        (0..self.raw.children().len()).filter_map(move |i| self.child(i))
    }

    /// Re-emit this subtree's exact source text: tokens contribute their
    /// leading trivia + lexeme + trailing trivia; interior nodes recurse.
    /// Requires a byte slice of the whole source text to read lexemes from,
    /// since raw nodes store lengths rather than copies of the text.
    pub fn render(&self, source_from: usize, full_text: &str) -> String {
        let start = self.absolute_offset;
        let end = start + self.text_len();
        full_text
            .get(source_from + start..source_from + end)
            .unwrap_or_default()
            .to_string()
    }
}

/// Builds a `RawNode::Tree` from child slots, verifying nothing about
/// content (the parser is the only caller and is trusted to keep slots in
/// grammar order).
pub fn tree(kind: SyntaxKind, children: Vec<Slot>) -> Rc<RawNode> {
    Rc::new(RawNode::Tree { kind, children })
}

pub fn token(kind: SyntaxKind, len: usize, leading: Trivia, trailing: Trivia) -> Rc<RawNode> {
    Rc::new(RawNode::Token(Token {
        kind,
        len,
        leading,
        trailing,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(kind: SyntaxKind, text: &str) -> Rc<RawNode> {
        token(kind, text.len(), Trivia::default(), Trivia::default())
    }

    #[test]
    fn tree_text_len_sums_children() {
        let a = leaf(SyntaxKind::IdentToken, "foo");
        let b = leaf(SyntaxKind::AssignToken, ":=");
        let t = tree(SyntaxKind::AssignStmt, vec![Slot::Node(a), Slot::Node(b)]);
        assert_eq!(t.text_len(), 5);
    }

    #[test]
    fn empty_slot_keeps_position_stable() {
        let a = leaf(SyntaxKind::IdentToken, "foo");
        let t = tree(
            SyntaxKind::VarDecl,
            vec![Slot::Node(a), Slot::Empty, Slot::Empty],
        );
        let view = SyntaxTree::new_root(t);
        assert!(view.child(0).is_some());
        assert!(view.child(1).is_none());
        assert!(view.child(2).is_none());
    }

    #[test]
    fn child_offsets_accumulate_sibling_lengths() {
        let a = leaf(SyntaxKind::IdentToken, "foo");
        let b = leaf(SyntaxKind::AssignToken, ":=");
        let t = tree(SyntaxKind::AssignStmt, vec![Slot::Node(a), Slot::Node(b)]);
        let view = SyntaxTree::new_root(t);
        let second = view.child(1).unwrap();
        assert_eq!(second.absolute_offset, 3);
    }

    #[test]
    fn trivia_attaches_to_token_not_tree() {
        let leading = Trivia {
            pieces: vec![TriviaPiece {
                kind: SyntaxKind::SpaceTrivia,
                len: 1,
            }],
        };
        let tok = token(SyntaxKind::IdentToken, 3, leading, Trivia::default());
        assert_eq!(tok.text_len(), 4);
    }
}
