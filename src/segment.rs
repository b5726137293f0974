//! Statement segmentation.
//!
//! Splits raw SQL text into [`Statement`]s. A single character scan blanks
//! out `--` line comments and `/* ... */` block comments (non-nesting),
//! tracks single and double quoted literals with backslash escapes, and
//! splits on every `;` outside a literal.
//!
//! Comments are replaced by spaces rather than removed, and newlines are
//! always kept, so byte offsets and line numbers inside a statement still
//! point at the original document.
//!
//! An unterminated quote swallows the rest of the input as literal content.
//! Segmentation never fails.
//!
//! # Example
//!
//! ```
//! use sql_lens::segment::segment;
//!
//! let statements = segment("SELECT ';' ; -- trailing\nSELECT 1");
//!
//! assert_eq!(statements.len(), 2);
//! assert_eq!(statements[0].text, "SELECT ';'");
//! assert!(statements[0].terminated);
//! assert_eq!(statements[1].line, 2);
//! assert!(!statements[1].terminated);
//! ```

use serde::Serialize;

/// One semicolon-delimited statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statement {
    /// Zero-based position in document order
    pub index:      usize,
    /// 1-based line of the first non-whitespace character
    pub line:       usize,
    /// 1-based column of the first non-whitespace character
    pub column:     usize,
    /// 1-based line of the last character
    pub end_line:   usize,
    /// Byte offset of the statement in the source document
    pub offset:     usize,
    /// Statement text with comments blanked, trimmed, without the `;`
    pub text:       String,
    /// Same as `text` with the contents of quoted literals blanked
    #[serde(skip)]
    pub masked:     String,
    /// Whether the statement was closed by a `;`
    pub terminated: bool
}

impl Statement {
    /// Translate a byte offset within `text` into a document line and column.
    pub fn position(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.text.len());
        let before = &self.text[..offset];
        match before.rfind('\n') {
            Some(nl) => (
                self.line + before.matches('\n').count(),
                before[nl + 1..].chars().count() + 1
            ),
            None => (self.line, self.column + before.chars().count())
        }
    }

    /// Line numbers paired with the statement's line slices.
    pub fn lines(&self) -> impl Iterator<Item = (usize, &str)> {
        self.text
            .split('\n')
            .enumerate()
            .map(move |(i, line)| (self.line + i, line.trim_end_matches('\r')))
    }

    /// Last line of the statement, right-trimmed.
    pub fn last_line(&self) -> &str {
        self.text
            .rsplit('\n')
            .next()
            .unwrap_or_default()
            .trim_end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Code,
    SingleQuote,
    DoubleQuote,
    LineComment,
    BlockComment
}

/// Output of the character scan, byte-aligned with the input.
struct Scan {
    cleaned:     String,
    masked:      String,
    terminators: Vec<usize>,
    /// Per line, whether it starts in code
    line_starts: Vec<bool>
}

fn push_blank(out: &mut String, c: char) {
    if c == '\n' {
        out.push('\n');
    } else {
        for _ in 0..c.len_utf8() {
            out.push(' ');
        }
    }
}

fn scan(text: &str) -> Scan {
    let bytes = text.as_bytes();
    let mut cleaned = String::with_capacity(text.len());
    let mut masked = String::with_capacity(text.len());
    let mut terminators = Vec::new();
    let mut line_starts = vec![true];
    let mut state = ScanState::Code;
    let mut escaped = false;
    let mut skip_next = false;

    for (i, c) in text.char_indices() {
        if skip_next {
            // second character of a two-character comment delimiter
            skip_next = false;
            push_blank(&mut cleaned, c);
            push_blank(&mut masked, c);
            continue;
        }
        let next = bytes.get(i + 1).copied();
        match state {
            ScanState::Code => match c {
                '-' if next == Some(b'-') => {
                    state = ScanState::LineComment;
                    skip_next = true;
                    push_blank(&mut cleaned, c);
                    push_blank(&mut masked, c);
                }
                '/' if next == Some(b'*') => {
                    state = ScanState::BlockComment;
                    skip_next = true;
                    push_blank(&mut cleaned, c);
                    push_blank(&mut masked, c);
                }
                '\'' | '"' => {
                    state = if c == '\'' {
                        ScanState::SingleQuote
                    } else {
                        ScanState::DoubleQuote
                    };
                    cleaned.push(c);
                    masked.push(c);
                }
                ';' => {
                    terminators.push(i);
                    cleaned.push(c);
                    masked.push(c);
                }
                _ => {
                    cleaned.push(c);
                    masked.push(c);
                }
            },
            ScanState::SingleQuote | ScanState::DoubleQuote => {
                let quote = if state == ScanState::SingleQuote {
                    '\''
                } else {
                    '"'
                };
                cleaned.push(c);
                if escaped {
                    escaped = false;
                    push_blank(&mut masked, c);
                } else if c == '\\' {
                    escaped = true;
                    push_blank(&mut masked, c);
                } else if c == quote {
                    state = ScanState::Code;
                    masked.push(c);
                } else {
                    push_blank(&mut masked, c);
                }
            }
            ScanState::LineComment => {
                if c == '\n' {
                    state = ScanState::Code;
                }
                push_blank(&mut cleaned, c);
                push_blank(&mut masked, c);
            }
            ScanState::BlockComment => {
                if c == '*' && next == Some(b'/') {
                    state = ScanState::Code;
                    skip_next = true;
                }
                push_blank(&mut cleaned, c);
                push_blank(&mut masked, c);
            }
        }
        if c == '\n' {
            line_starts.push(state == ScanState::Code);
        }
    }

    Scan {
        cleaned,
        masked,
        terminators,
        line_starts
    }
}

/// Split SQL text into statements in document order.
///
/// Empty or whitespace-only fragments (including fragments that held only
/// comments) are dropped. A trailing fragment without a `;` is still
/// returned, with `terminated` set to `false`.
pub fn segment(text: &str) -> Vec<Statement> {
    let scan = scan(text);
    let mut statements = Vec::new();
    let mut start = 0;
    let bounds = scan
        .terminators
        .iter()
        .map(|&end| (end, true))
        .chain(std::iter::once((scan.cleaned.len(), false)));

    for (end, terminated) in bounds {
        let fragment = &scan.cleaned[start..end];
        let trimmed = fragment.trim();
        if !trimmed.is_empty() {
            let lead = fragment.len() - fragment.trim_start().len();
            let offset = start + lead;
            let len = trimmed.len();
            let prefix = &scan.cleaned[..offset];
            let line = prefix.matches('\n').count() + 1;
            let column = match prefix.rfind('\n') {
                Some(nl) => prefix[nl + 1..].chars().count() + 1,
                None => prefix.chars().count() + 1
            };
            statements.push(Statement {
                index: statements.len(),
                line,
                column,
                end_line: line + trimmed.matches('\n').count(),
                offset,
                text: trimmed.to_string(),
                masked: scan.masked[offset..offset + len].to_string(),
                terminated
            });
        }
        start = end + 1;
    }

    statements
}

/// Blank the contents of quoted literals, keeping the quote characters.
///
/// The result has the same byte length as the input.
pub fn mask_literals(text: &str) -> String {
    scan(text).masked
}

/// For each line of `text`, whether it starts outside any quoted literal
/// or block comment.
///
/// Text inserted in front of such a line cannot end up inside a literal.
pub fn code_line_starts(text: &str) -> Vec<bool> {
    scan(text).line_starts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_is_byte_aligned() {
        let text = "SELECT 'é;x' /* ü */ FROM t -- ß\n;";
        let scan = scan(text);
        assert_eq!(scan.cleaned.len(), text.len());
        assert_eq!(scan.masked.len(), text.len());
        assert_eq!(scan.terminators, vec![text.len() - 1]);
    }

    #[test]
    fn test_escaped_quote_does_not_close_literal() {
        let statements = segment(r"SELECT 'a\';b'; SELECT 2;");
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].text, r"SELECT 'a\';b'");
    }

    #[test]
    fn test_position_on_later_line() {
        let statements = segment("\n  SELECT a,\n    b FROM t;");
        let stmt = &statements[0];
        assert_eq!((stmt.line, stmt.column), (2, 3));
        let b = stmt.text.find('b').unwrap();
        assert_eq!(stmt.position(b), (3, 5));
        assert_eq!(stmt.position(0), (2, 3));
    }

    #[test]
    fn test_mask_literals() {
        assert_eq!(mask_literals("a = 'xy' AND \"q\""), "a = '  ' AND \" \"");
    }
}
