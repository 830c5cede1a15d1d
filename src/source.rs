//! Source text and byte-offset <-> (line, column) mapping.
//!
//! A `Source` is loaded once per compilation and handed around by reference
//! (or cheaply cloned `Rc`) to every later stage. `offset` is authoritative;
//! `(line, column)` is derived for display only.

use std::path::{Path, PathBuf};
use std::rc::Rc;

/// A single line's byte span within the source text, not including its
/// terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineSpan {
    start: usize,
    len: usize,
}

/// A loaded MPPL source file.
#[derive(Debug)]
pub struct Source {
    path: PathBuf,
    text: String,
    lines: Vec<LineSpan>,
}

/// A 1-indexed line/column position for display purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCol {
    pub line: usize,
    pub column: usize,
}

impl Source {
    /// Build a `Source` from an in-memory string (tests, and the CLI after
    /// reading the file).
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Rc<Source> {
        let text = text.into();
        let lines = compute_line_spans(&text);
        Rc::new(Source {
            path: path.into(),
            text,
            lines,
        })
    }

    pub fn from_file(path: &Path) -> std::io::Result<Rc<Source>> {
        let text = std::fs::read_to_string(path)?;
        Ok(Source::new(path.to_path_buf(), text))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Byte at `offset`, or `None` past the end (our lexer's EOF sentinel).
    pub fn byte_at(&self, offset: usize) -> Option<u8> {
        self.text.as_bytes().get(offset).copied()
    }

    pub fn slice(&self, start: usize, end: usize) -> &str {
        &self.text[start..end]
    }

    /// Binary search over precomputed line starts to find the `(line,
    /// column)` of a byte offset. 1-indexed, matching conventional editor
    /// display.
    pub fn location(&self, offset: usize) -> LineCol {
        let idx = match self
            .lines
            .binary_search_by(|span| span.start.cmp(&offset))
        {
            Ok(i) => i,
            Err(0) => 0,
            Err(i) => i - 1,
        };
        let span = self.lines[idx];
        let column = offset.saturating_sub(span.start);
        LineCol {
            line: idx + 1,
            column: column + 1,
        }
    }

    /// The full text of the line containing `offset`, without its line
    /// terminator. Used by the diagnostic renderer.
    pub fn line_text(&self, line: usize) -> &str {
        let span = self.lines[line - 1];
        &self.text[span.start..span.start + span.len]
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

fn compute_line_spans(text: &str) -> Vec<LineSpan> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(LineSpan {
                    start,
                    len: i - start,
                });
                i += 1;
                start = i;
            }
            b'\r' => {
                lines.push(LineSpan {
                    start,
                    len: i - start,
                });
                i += 1;
                if i < bytes.len() && bytes[i] == b'\n' {
                    i += 1;
                }
                start = i;
            }
            _ => i += 1,
        }
    }
    lines.push(LineSpan {
        start,
        len: bytes.len() - start,
    });
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_first_line() {
        let src = Source::new("t.mpl", "abc\ndef\n");
        assert_eq!(src.location(0), LineCol { line: 1, column: 1 });
        assert_eq!(src.location(2), LineCol { line: 1, column: 3 });
    }

    #[test]
    fn location_second_line() {
        let src = Source::new("t.mpl", "abc\ndef\n");
        assert_eq!(src.location(4), LineCol { line: 2, column: 1 });
        assert_eq!(src.location(6), LineCol { line: 2, column: 3 });
    }

    #[test]
    fn location_handles_crlf() {
        let src = Source::new("t.mpl", "ab\r\ncd");
        assert_eq!(src.location(4), LineCol { line: 2, column: 1 });
    }

    #[test]
    fn line_text_excludes_terminator() {
        let src = Source::new("t.mpl", "first\nsecond");
        assert_eq!(src.line_text(1), "first");
        assert_eq!(src.line_text(2), "second");
    }
}
