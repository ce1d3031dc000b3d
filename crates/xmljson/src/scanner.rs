//! Two-mode XML scanner
//!
//! Turns the input buffer into a lazy, single-pass token stream. The scanner
//! is a small finite-state machine with two modes:
//!
//! ```text
//!   DATA ──'<'──▶ TAG
//!    ▲             │
//!    └──'>' / '/>'─┘
//! ```
//!
//! Within a mode the rules are tried in a fixed priority order and the first
//! rule that matches at the current offset wins (not the longest one), so a
//! `<?` always starts a processing instruction before a lone `<` is tried.
//! When no rule matches the scanner fails with a lexical error and stops.

use crate::error::{ConversionError, Result};
use crate::types::{Token, TokenKind};
use memchr::{memchr, memchr2, memmem};

const PROC_INSTR_OPEN: &[u8] = b"<?";
const PROC_INSTR_CLOSE: &[u8] = b"?>";
const COMMENT_OPEN: &[u8] = b"<!--";
const COMMENT_CLOSE: &[u8] = b"-->";
const CDATA_OPEN: &[u8] = b"<![CDATA[";
const CDATA_CLOSE: &[u8] = b"]]>";
const DOCTYPE_OPEN: &[u8] = b"<!DOCTYPE";
const BYTE_ORDER_MARK: char = '\u{feff}';

/// Scanner mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Outside of tags
    Data,
    /// Between `<` and `>`
    Tag,
}

/// Lazy token source over one input buffer.
///
/// Consuming it is destructive; to scan again, build a new scanner.
#[derive(Debug)]
pub struct Scanner<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    mode: Mode,
    failed: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str) -> Self {
        // A leading byte order mark is not content; offsets still index `input`
        let pos = if input.starts_with(BYTE_ORDER_MARK) {
            BYTE_ORDER_MARK.len_utf8()
        } else {
            0
        };
        Self {
            input,
            pos,
            line: 1,
            column: 1,
            mode: Mode::Data,
            failed: false,
        }
    }

    /// Scan the whole input eagerly
    pub fn tokenize(input: &'a str) -> Result<Vec<Token<'a>>> {
        Scanner::new(input).collect()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Current byte offset
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Produce the next token, `Ok(None)` at end of input
    pub fn next_token(&mut self) -> Result<Option<Token<'a>>> {
        loop {
            if self.pos >= self.input.len() {
                return Ok(None);
            }

            let matched = match self.mode {
                Mode::Data => self.match_data(),
                Mode::Tag => self.match_tag(),
            };

            let Some((kind, len)) = matched else {
                return Err(self.unexpected());
            };

            let token = self.advance(kind, len);

            match (self.mode, kind) {
                (Mode::Tag, TokenKind::Whitespace) => continue,
                (Mode::Data, TokenKind::LessThan) => self.mode = Mode::Tag,
                (Mode::Tag, TokenKind::GreaterThan | TokenKind::SlashGreaterThan) => {
                    self.mode = Mode::Data
                }
                _ => {}
            }

            return Ok(Some(token));
        }
    }

    /// DATA mode rules, in priority order
    fn match_data(&self) -> Option<(TokenKind, usize)> {
        let rest = &self.input.as_bytes()[self.pos..];

        if let Some(len) = delimited(rest, PROC_INSTR_OPEN, PROC_INSTR_CLOSE) {
            return Some((TokenKind::ProcInstr, len));
        }
        if let Some(len) = delimited(rest, COMMENT_OPEN, COMMENT_CLOSE) {
            return Some((TokenKind::Comment, len));
        }
        if let Some(len) = delimited(rest, CDATA_OPEN, CDATA_CLOSE) {
            return Some((TokenKind::CData, len));
        }
        if rest.len() >= DOCTYPE_OPEN.len()
            && rest[..DOCTYPE_OPEN.len()].eq_ignore_ascii_case(DOCTYPE_OPEN)
        {
            if let Some(idx) = memchr(b'>', &rest[DOCTYPE_OPEN.len()..]) {
                return Some((TokenKind::Doctype, DOCTYPE_OPEN.len() + idx + 1));
            }
        }
        if rest[0] == b'<' {
            return Some((TokenKind::LessThan, 1));
        }
        if let Some(len) = entity_len(rest) {
            return Some((TokenKind::Entity, len));
        }

        let len = memchr2(b'<', b'&', rest).unwrap_or(rest.len());
        if len > 0 {
            return Some((TokenKind::Text, len));
        }

        None
    }

    /// TAG mode rules, in priority order
    fn match_tag(&self) -> Option<(TokenKind, usize)> {
        let rest = &self.input[self.pos..];
        let bytes = rest.as_bytes();

        let ws: usize = rest
            .chars()
            .take_while(|c| c.is_whitespace())
            .map(char::len_utf8)
            .sum();
        if ws > 0 {
            return Some((TokenKind::Whitespace, ws));
        }

        if is_name_start(bytes[0]) {
            let len = 1 + bytes[1..].iter().take_while(|&&b| is_name_char(b)).count();
            return Some((TokenKind::TagName, len));
        }

        match bytes[0] {
            b'=' => Some((TokenKind::Equal, 1)),
            b'"' => memchr(b'"', &bytes[1..]).map(|idx| (TokenKind::AttrValueDouble, idx + 2)),
            b'\'' => memchr(b'\'', &bytes[1..]).map(|idx| (TokenKind::AttrValueSingle, idx + 2)),
            b'/' if bytes.get(1) == Some(&b'>') => Some((TokenKind::SlashGreaterThan, 2)),
            b'/' => Some((TokenKind::Slash, 1)),
            b'>' => Some((TokenKind::GreaterThan, 1)),
            _ => None,
        }
    }

    /// Consume `len` bytes as one token, updating line/column
    fn advance(&mut self, kind: TokenKind, len: usize) -> Token<'a> {
        let start = self.pos;
        let end = start + len;
        let text = &self.input[start..end];
        let (line, column) = (self.line, self.column);

        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\r' => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    self.line += 1;
                    self.column = 1;
                }
                '\n' => {
                    self.line += 1;
                    self.column = 1;
                }
                _ => self.column += 1,
            }
        }
        self.pos = end;

        Token {
            kind,
            text,
            start,
            end,
            line,
            column,
        }
    }

    fn unexpected(&mut self) -> ConversionError {
        self.failed = true;
        let ch = self.input[self.pos..].chars().next().unwrap_or('\0');
        tracing::debug!(
            "No {:?} rule matches at {}:{} ({:?})",
            self.mode,
            self.line,
            self.column,
            ch
        );
        ConversionError::Lexical {
            offset: self.pos,
            line: self.line,
            column: self.column,
            ch,
        }
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        self.next_token().transpose()
    }
}

/// Length of `open ... close` at the start of `rest` (shortest match)
fn delimited(rest: &[u8], open: &[u8], close: &[u8]) -> Option<usize> {
    if !rest.starts_with(open) {
        return None;
    }
    memmem::find(&rest[open.len()..], close).map(|idx| open.len() + idx + close.len())
}

/// `&name;`, `&#123;`, with the trailing `;` optional
fn entity_len(rest: &[u8]) -> Option<usize> {
    if rest[0] != b'&' {
        return None;
    }
    let mut len = 1;
    if rest.get(len) == Some(&b'#') {
        len += 1;
    }
    let word = rest[len..].iter().take_while(|&&b| is_word(b)).count();
    if word == 0 {
        return None;
    }
    len += word;
    if rest.get(len) == Some(&b';') {
        len += 1;
    }
    Some(len)
}

fn is_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b':'
}

fn is_name_char(b: u8) -> bool {
    is_word(b) || matches!(b, b':' | b'.' | b'-')
}
