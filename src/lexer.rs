//! Lexer: turns source bytes into a flat stream of raw tokens (including
//! trivia). Errors are recorded as diagnostics and lexing continues past
//! them by treating the offending run of bytes as an `Error`-kind token, so a
//! single bad character never aborts the rest of the file.
//!
//! Ported byte-for-byte in spirit from the original compiler's
//! `mppl_lexer.c`: the `first`/`bump`/`eat`/`eat_if` lookahead primitives,
//! one `token_*` function per lexical category, and the same dispatch order
//! in `mpplc_lex`.

use crate::diagnostic::{builders, Diagnostic};
use crate::syntax_kind::SyntaxKind;

/// One lexed token: its kind and byte span. Trivia tokens (`SpaceTrivia`,
/// `BracesCommentTrivia`, `CCommentTrivia`) appear in this stream exactly
/// like real tokens; the CST builder is what later folds them onto an
/// adjacent token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawToken {
    pub kind: SyntaxKind,
    pub offset: usize,
    pub len: usize,
}

impl RawToken {
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

struct Lexer<'a> {
    text: &'a [u8],
    offset: usize,
    index: usize,
}

const EOF: i32 = -1;

impl<'a> Lexer<'a> {
    fn new(text: &'a [u8], offset: usize) -> Self {
        Lexer {
            text,
            offset,
            index: 0,
        }
    }

    fn first(&self) -> i32 {
        self.text
            .get(self.offset + self.index)
            .map(|&b| b as i32)
            .unwrap_or(EOF)
    }

    fn bump(&mut self) {
        if self.offset + self.index < self.text.len() {
            self.index += 1;
        }
    }

    fn eat(&mut self, c: u8) -> bool {
        let matched = self.first() == c as i32;
        if matched {
            self.bump();
        }
        matched
    }

    fn eat_if(&mut self, predicate: impl Fn(i32) -> bool) -> bool {
        let matched = predicate(self.first());
        if matched {
            self.bump();
        }
        matched
    }

    fn current_text(&self) -> &'a [u8] {
        &self.text[self.offset..self.offset + self.index]
    }

    fn finish(&mut self, kind: SyntaxKind) -> RawToken {
        let token = RawToken {
            kind,
            offset: self.offset,
            len: self.index,
        };
        self.offset += self.index;
        self.index = 0;
        token
    }
}

fn is_alphabet(c: i32) -> bool {
    (b'A' as i32..=b'Z' as i32).contains(&c) || (b'a' as i32..=b'z' as i32).contains(&c)
}

fn is_number(c: i32) -> bool {
    (b'0' as i32..=b'9' as i32).contains(&c)
}

fn is_space(c: i32) -> bool {
    matches!(c, 0x20 | 0x09 | 0x0d | 0x0a)
}

fn is_graphic(c: i32) -> bool {
    is_alphabet(c)
        || is_number(c)
        || is_space(c)
        || (c >= 0 && c <= 0x7f && br##"!"#$%&'()*+,-./:;<=>?@[\]^_`{|}~"##.contains(&(c as u8)))
}

/// The outcome of lexing a single token starting at a given offset.
enum LexOutcome {
    Token(RawToken),
    TokenWithDiagnostic(RawToken, Diagnostic),
    Eof(RawToken),
}

fn lex_one(lexer: &mut Lexer) -> LexOutcome {
    let start = lexer.offset;
    match lexer.first() {
        EOF => LexOutcome::Eof(lexer.finish(SyntaxKind::EofToken)),
        c if is_alphabet(c) => lex_identifier_or_keyword(lexer),
        c if is_number(c) => lex_integer(lexer, start),
        c if c == b'\'' as i32 => lex_string(lexer, start),
        c if is_space(c) => lex_whitespace(lexer),
        c if c == b'{' as i32 || c == b'/' as i32 => lex_comment(lexer, start),
        _ => lex_symbol(lexer, start),
    }
}

fn lex_unexpected(lexer: &mut Lexer, start: usize) -> LexOutcome {
    let found = lexer.first();
    lexer.bump();
    let token = lexer.finish(SyntaxKind::Error);
    let found_char = char::from_u32(found.max(0) as u32).unwrap_or('\u{fffd}');
    LexOutcome::TokenWithDiagnostic(token, builders::stray_char(start, found_char))
}

fn lex_identifier_or_keyword(lexer: &mut Lexer) -> LexOutcome {
    let start = lexer.offset;
    if lexer.eat_if(is_alphabet) {
        while lexer.eat_if(is_alphabet) || lexer.eat_if(is_number) {}
        let text = lexer.current_text();
        let kind = std::str::from_utf8(text)
            .map(SyntaxKind::from_keyword)
            .unwrap_or(SyntaxKind::IdentToken);
        LexOutcome::Token(lexer.finish(kind))
    } else {
        lex_unexpected(lexer, start)
    }
}

fn lex_integer(lexer: &mut Lexer, start: usize) -> LexOutcome {
    if lexer.eat_if(is_number) {
        while lexer.eat_if(is_number) {}
        let text = std::str::from_utf8(lexer.current_text()).unwrap_or("0");
        // Literals up to 32767 are legal; 32768 and above are rejected, since
        // CASL2's GR range for a positive literal is 0..=32767.
        match text.parse::<u64>() {
            Ok(value) if value >= 32768 => {
                let token = lexer.finish(SyntaxKind::Error);
                LexOutcome::TokenWithDiagnostic(token, builders::too_big_number(start, token.len))
            }
            _ => LexOutcome::Token(lexer.finish(SyntaxKind::NumberLit)),
        }
    } else {
        lex_unexpected(lexer, start)
    }
}

fn lex_string(lexer: &mut Lexer, start: usize) -> LexOutcome {
    if lexer.eat(b'\'') {
        let mut contains_nongraphic = false;
        loop {
            if lexer.eat(b'\'') && !lexer.eat(b'\'') {
                let token = lexer.finish(SyntaxKind::StringLit);
                return if contains_nongraphic {
                    LexOutcome::TokenWithDiagnostic(
                        token,
                        builders::nongraphic_char(start, 0),
                    )
                } else {
                    LexOutcome::Token(token)
                };
            } else if matches!(lexer.first(), c if c == b'\r' as i32 || c == b'\n' as i32 || c == EOF)
            {
                let token = lexer.finish(SyntaxKind::Error);
                return LexOutcome::TokenWithDiagnostic(
                    token,
                    builders::unterminated_string(start, token.len),
                );
            } else if !lexer.eat_if(is_graphic) {
                contains_nongraphic = true;
                lexer.bump();
            }
        }
    } else {
        lex_unexpected(lexer, start)
    }
}

fn lex_whitespace(lexer: &mut Lexer) -> LexOutcome {
    let start = lexer.offset;
    if lexer.eat_if(is_space) {
        while lexer.eat_if(is_space) {}
        LexOutcome::Token(lexer.finish(SyntaxKind::SpaceTrivia))
    } else {
        lex_unexpected(lexer, start)
    }
}

fn lex_comment(lexer: &mut Lexer, start: usize) -> LexOutcome {
    if lexer.eat(b'{') {
        loop {
            if lexer.eat(b'}') {
                return LexOutcome::Token(lexer.finish(SyntaxKind::BracesCommentTrivia));
            } else if lexer.first() == EOF {
                let token = lexer.finish(SyntaxKind::Error);
                return LexOutcome::TokenWithDiagnostic(
                    token,
                    builders::unterminated_comment(start, token.len),
                );
            } else {
                lexer.bump();
            }
        }
    } else if lexer.eat(b'/') {
        if lexer.eat(b'*') {
            loop {
                if lexer.eat(b'*') && lexer.eat(b'/') {
                    return LexOutcome::Token(lexer.finish(SyntaxKind::CCommentTrivia));
                } else if lexer.first() == EOF {
                    let token = lexer.finish(SyntaxKind::Error);
                    return LexOutcome::TokenWithDiagnostic(
                        token,
                        builders::unterminated_comment(start, token.len),
                    );
                } else {
                    lexer.bump();
                }
            }
        } else {
            lex_unexpected(lexer, start)
        }
    } else {
        lex_unexpected(lexer, start)
    }
}

fn lex_symbol(lexer: &mut Lexer, start: usize) -> LexOutcome {
    let kind = if lexer.eat(b'+') {
        SyntaxKind::PlusToken
    } else if lexer.eat(b'-') {
        SyntaxKind::MinusToken
    } else if lexer.eat(b'*') {
        SyntaxKind::StarToken
    } else if lexer.eat(b'=') {
        SyntaxKind::EqualToken
    } else if lexer.eat(b'<') {
        if lexer.eat(b'>') {
            SyntaxKind::NotEqToken
        } else if lexer.eat(b'=') {
            SyntaxKind::LessEqToken
        } else {
            SyntaxKind::LessToken
        }
    } else if lexer.eat(b'>') {
        if lexer.eat(b'=') {
            SyntaxKind::GreaterEqToken
        } else {
            SyntaxKind::GreaterToken
        }
    } else if lexer.eat(b'(') {
        SyntaxKind::LParenToken
    } else if lexer.eat(b')') {
        SyntaxKind::RParenToken
    } else if lexer.eat(b'[') {
        SyntaxKind::LBracketToken
    } else if lexer.eat(b']') {
        SyntaxKind::RBracketToken
    } else if lexer.eat(b':') {
        if lexer.eat(b'=') {
            SyntaxKind::AssignToken
        } else {
            SyntaxKind::ColonToken
        }
    } else if lexer.eat(b'.') {
        SyntaxKind::DotToken
    } else if lexer.eat(b',') {
        SyntaxKind::CommaToken
    } else if lexer.eat(b';') {
        SyntaxKind::SemiToken
    } else {
        return lex_unexpected(lexer, start);
    };
    LexOutcome::Token(lexer.finish(kind))
}

/// Lex the whole source text, returning every token (trivia included) in
/// order plus any diagnostics raised along the way. Never stops early: a
/// lexical error just yields an `Error` token covering the offending bytes
/// and lexing resumes from the next byte.
pub fn lex(text: &str) -> (Vec<RawToken>, Vec<Diagnostic>) {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut diagnostics = Vec::new();
    let mut offset = 0;
    loop {
        let mut lexer = Lexer::new(bytes, offset);
        match lex_one(&mut lexer) {
            LexOutcome::Token(token) => {
                offset = token.end();
                tokens.push(token);
            }
            LexOutcome::TokenWithDiagnostic(token, diag) => {
                offset = token.end();
                tokens.push(token);
                diagnostics.push(diag);
            }
            LexOutcome::Eof(token) => {
                tokens.push(token);
                break;
            }
        }
    }
    (tokens, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<SyntaxKind> {
        lex(text).0.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_keyword_vs_identifier() {
        assert_eq!(
            kinds("while x"),
            vec![
                SyntaxKind::WhileKw,
                SyntaxKind::SpaceTrivia,
                SyntaxKind::IdentToken,
                SyntaxKind::EofToken
            ]
        );
    }

    #[test]
    fn lexes_multi_char_operators() {
        assert_eq!(
            kinds("<> <= >= :="),
            vec![
                SyntaxKind::NotEqToken,
                SyntaxKind::SpaceTrivia,
                SyntaxKind::LessEqToken,
                SyntaxKind::SpaceTrivia,
                SyntaxKind::GreaterEqToken,
                SyntaxKind::SpaceTrivia,
                SyntaxKind::AssignToken,
                SyntaxKind::EofToken,
            ]
        );
    }

    #[test]
    fn lexes_braces_and_c_style_comments() {
        assert_eq!(
            kinds("{ c1 } /* c2 */"),
            vec![
                SyntaxKind::BracesCommentTrivia,
                SyntaxKind::SpaceTrivia,
                SyntaxKind::CCommentTrivia,
                SyntaxKind::EofToken,
            ]
        );
    }

    #[test]
    fn unterminated_comment_reports_diagnostic() {
        let (_, diags) = lex("{ unterminated");
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn string_with_doubled_quote_escape() {
        let (tokens, diags) = lex("'it''s'");
        assert!(diags.is_empty());
        assert_eq!(tokens[0].kind, SyntaxKind::StringLit);
        assert_eq!(tokens[0].len, 7);
    }

    #[test]
    fn unterminated_string_reports_diagnostic() {
        let (_, diags) = lex("'abc");
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn number_over_threshold_reports_diagnostic() {
        let (_, diags) = lex("99999");
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn number_at_threshold_is_accepted() {
        let (_, diags) = lex("32767");
        assert!(diags.is_empty());
    }

    #[test]
    fn number_one_past_threshold_is_rejected() {
        let (_, diags) = lex("32768");
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn stray_char_reports_diagnostic_and_resumes() {
        let (tokens, diags) = lex("$ x");
        assert_eq!(diags.len(), 1);
        assert_eq!(tokens[0].kind, SyntaxKind::Error);
        assert_eq!(tokens.last().unwrap().kind, SyntaxKind::EofToken);
    }
}
