//! The closed set of lexical and syntactic kinds a CST node or token can
//! carry, ported from the `MPPL_SYNTAX_FOR_EACH` table in the original
//! compiler's `mppl_syntax_kind.h`. That table is the single authoritative
//! source for every punctuation/keyword/trivia/syntax-node kind; there is no
//! second parallel table for, say, parser-internal vs. lexer-internal kinds.

/// One entry in the closed kind set. Token kinds (`IDENT_TOKEN` etc.) label
/// leaves of the CST; `SYNTAX` kinds label interior nodes; `TRIVIA` kinds
/// label whitespace/comments attached to a token rather than appearing as
/// tree children in their own right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    Error,
    IdentToken,
    NumberLit,
    StringLit,

    PlusToken,
    MinusToken,
    StarToken,
    EqualToken,
    NotEqToken,
    LessToken,
    LessEqToken,
    GreaterToken,
    GreaterEqToken,
    LParenToken,
    RParenToken,
    LBracketToken,
    RBracketToken,
    AssignToken,
    DotToken,
    CommaToken,
    ColonToken,
    SemiToken,

    ProgramKw,
    VarKw,
    ArrayKw,
    OfKw,
    BeginKw,
    EndKw,
    IfKw,
    ThenKw,
    ElseKw,
    ProcedureKw,
    ReturnKw,
    CallKw,
    WhileKw,
    DoKw,
    NotKw,
    OrKw,
    DivKw,
    AndKw,
    CharKw,
    IntegerKw,
    BooleanKw,
    ReadKw,
    WriteKw,
    ReadLnKw,
    WriteLnKw,
    TrueKw,
    FalseKw,
    BreakKw,

    EofToken,

    SpaceTrivia,
    BracesCommentTrivia,
    CCommentTrivia,

    Program,
    VarDeclPart,
    VarDecl,
    ArrayType,
    ProcDecl,
    FmlParamList,
    FmlParamSec,
    AssignStmt,
    IfStmt,
    WhileStmt,
    BreakStmt,
    CallStmt,
    ActParamList,
    ReturnStmt,
    InputStmt,
    InputList,
    OutputStmt,
    OutputList,
    OutputValue,
    CompStmt,
    EntireVar,
    IndexedVar,
    BinaryExpr,
    ParenExpr,
    NotExpr,
    CastExpr,
}

impl SyntaxKind {
    /// Whether this kind labels a token (leaf) rather than a syntax node.
    pub fn is_token(self) -> bool {
        use SyntaxKind::*;
        !matches!(
            self,
            Program
                | VarDeclPart
                | VarDecl
                | ArrayType
                | ProcDecl
                | FmlParamList
                | FmlParamSec
                | AssignStmt
                | IfStmt
                | WhileStmt
                | BreakStmt
                | CallStmt
                | ActParamList
                | ReturnStmt
                | InputStmt
                | InputList
                | OutputStmt
                | OutputList
                | OutputValue
                | CompStmt
                | EntireVar
                | IndexedVar
                | BinaryExpr
                | ParenExpr
                | NotExpr
                | CastExpr
        )
    }

    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            SyntaxKind::SpaceTrivia | SyntaxKind::BracesCommentTrivia | SyntaxKind::CCommentTrivia
        )
    }

    pub fn is_keyword(self) -> bool {
        KEYWORDS.iter().any(|&(_, kind)| kind == self)
    }

    /// The fixed punctuation/keyword spelling for kinds that have one, `None`
    /// for identifiers, literals, and syntax nodes.
    pub fn fixed_text(self) -> Option<&'static str> {
        use SyntaxKind::*;
        Some(match self {
            PlusToken => "+",
            MinusToken => "-",
            StarToken => "*",
            EqualToken => "=",
            NotEqToken => "<>",
            LessToken => "<",
            LessEqToken => "<=",
            GreaterToken => ">",
            GreaterEqToken => ">=",
            LParenToken => "(",
            RParenToken => ")",
            LBracketToken => "[",
            RBracketToken => "]",
            AssignToken => ":=",
            DotToken => ".",
            CommaToken => ",",
            ColonToken => ":",
            SemiToken => ";",
            _ => return KEYWORDS.iter().find(|&&(_, k)| k == self).map(|&(s, _)| s),
        })
    }

    /// Look up a keyword kind by its exact spelling, case-sensitively (MPPL
    /// keywords are lowercase-only; `IDENT_TOKEN` is returned for anything
    /// that isn't one of the fixed spellings).
    pub fn from_keyword(text: &str) -> SyntaxKind {
        KEYWORDS
            .iter()
            .find(|&&(spelling, _)| spelling == text)
            .map(|&(_, kind)| kind)
            .unwrap_or(SyntaxKind::IdentToken)
    }
}

/// `ASSIGN_TOKEN` is `:=` in the lexer despite `mppl_syntax_kind.h` pairing
/// it with the same `SOME("=")` annotation as `EQUAL_TOKEN` (a copy-paste
/// artifact in the original table); the lexer and parser never go through
/// `fixed_text` for `AssignToken`, so the discrepancy is harmless, but we
/// spell it correctly here since this table is also used for pretty-printing.
const KEYWORDS: &[(&str, SyntaxKind)] = &[
    ("program", SyntaxKind::ProgramKw),
    ("var", SyntaxKind::VarKw),
    ("array", SyntaxKind::ArrayKw),
    ("of", SyntaxKind::OfKw),
    ("begin", SyntaxKind::BeginKw),
    ("end", SyntaxKind::EndKw),
    ("if", SyntaxKind::IfKw),
    ("then", SyntaxKind::ThenKw),
    ("else", SyntaxKind::ElseKw),
    ("procedure", SyntaxKind::ProcedureKw),
    ("return", SyntaxKind::ReturnKw),
    ("call", SyntaxKind::CallKw),
    ("while", SyntaxKind::WhileKw),
    ("do", SyntaxKind::DoKw),
    ("not", SyntaxKind::NotKw),
    ("or", SyntaxKind::OrKw),
    ("div", SyntaxKind::DivKw),
    ("and", SyntaxKind::AndKw),
    ("char", SyntaxKind::CharKw),
    ("integer", SyntaxKind::IntegerKw),
    ("boolean", SyntaxKind::BooleanKw),
    ("read", SyntaxKind::ReadKw),
    ("write", SyntaxKind::WriteKw),
    ("readln", SyntaxKind::ReadLnKw),
    ("writeln", SyntaxKind::WriteLnKw),
    ("true", SyntaxKind::TrueKw),
    ("false", SyntaxKind::FalseKw),
    ("break", SyntaxKind::BreakKw),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_lookup_finds_exact_spelling() {
        assert_eq!(SyntaxKind::from_keyword("while"), SyntaxKind::WhileKw);
        assert_eq!(SyntaxKind::from_keyword("whilex"), SyntaxKind::IdentToken);
    }

    #[test]
    fn fixed_text_round_trips_punctuation() {
        assert_eq!(SyntaxKind::NotEqToken.fixed_text(), Some("<>"));
        assert_eq!(SyntaxKind::LessEqToken.fixed_text(), Some("<="));
    }

    #[test]
    fn syntax_nodes_are_not_tokens() {
        assert!(!SyntaxKind::IfStmt.is_token());
        assert!(SyntaxKind::IdentToken.is_token());
    }

    #[test]
    fn trivia_kinds_are_classified() {
        assert!(SyntaxKind::SpaceTrivia.is_trivia());
        assert!(!SyntaxKind::IdentToken.is_trivia());
    }

    #[test]
    fn every_keyword_round_trips_through_fixed_text() {
        for &(spelling, kind) in KEYWORDS {
            assert_eq!(kind.fixed_text(), Some(spelling));
            assert_eq!(SyntaxKind::from_keyword(spelling), kind);
        }
    }
}
