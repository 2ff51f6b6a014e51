//! Formatted string literals
//!
//!     An f-string (or t-string) is not one token. Its literal parts are scanned here, one
//!     segment at a time, and every replacement field in between is lexed by the ordinary
//!     lexer as if it were code inside a `{` bracket. Fields can hold further f-strings,
//!     so the lexer keeps a stack of frames, one per f-string being scanned.
//!
//!     A segment stops right after the `{` that opens a field, or after the closing quote.
//!     The lexer hands control back here when it meets the `}` or `:` that ends the field's
//!     expression at the field's own bracket level. A format spec after `:` is literal text
//!     again, except that `{` opens a nested field and `}` closes the field it belongs to.

use super::common::LexErrorKind;
use crate::token::Position;

/// How many f-strings may be nested inside each other's fields.
pub const MAX_FSTRING_NESTING: usize = 16;

/// An open replacement field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Bracket stack length with the field's own `{` pushed.
    pub depth: usize,
    /// Past the `:` that starts the format spec.
    pub in_spec: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FStringFrame {
    pub quote: u8,
    pub triple: bool,
    pub raw: bool,
    /// Where the prefix starts; unterminated f-strings are reported here.
    pub position: Position,
    pub fields: Vec<Field>,
}

impl FStringFrame {
    /// A frame for an f-string opened by `prefix` (prefix letters and the first quote).
    pub fn new(prefix: &str, triple: bool, position: Position) -> Self {
        let bytes = prefix.as_bytes();
        FStringFrame {
            quote: bytes.last().copied().unwrap_or(b'"'),
            triple,
            raw: bytes.iter().any(|b| b.eq_ignore_ascii_case(&b'r')),
            position,
            fields: Vec::new(),
        }
    }

    /// The field whose expression is being lexed, if any.
    pub fn expression_field(&self) -> Option<&Field> {
        self.fields.last().filter(|field| !field.in_spec)
    }

    pub fn in_spec(&self) -> bool {
        self.fields.last().is_some_and(|field| field.in_spec)
    }

    pub fn unterminated(&self) -> LexErrorKind {
        if self.triple {
            LexErrorKind::UnterminatedTripleString
        } else {
            LexErrorKind::UnterminatedString
        }
    }

    /// Scan literal text from the start of `rest`.
    pub fn scan_literal(&self, rest: &str) -> Result<(usize, LiteralStop), LiteralError> {
        scan_literal(rest, self.quote, self.triple, self.raw, self.in_spec())
    }
}

/// Why a literal scan stopped. The length returned alongside includes the stop character(s).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralStop {
    /// Closing quote(s) reached.
    Closed,
    /// A `{` opened a replacement field.
    FieldOpened,
    /// A `}` ended the format spec and with it the field.
    FieldClosed,
}

/// A literal scan failure and the byte offset, relative to the scan start, it points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiteralError {
    pub kind: LexErrorKind,
    pub offset: usize,
}

impl LiteralError {
    fn at(kind: LexErrorKind, offset: usize) -> Self {
        LiteralError { kind, offset }
    }
}

pub fn scan_literal(
    rest: &str,
    quote: u8,
    triple: bool,
    raw: bool,
    in_spec: bool,
) -> Result<(usize, LiteralStop), LiteralError> {
    let unterminated = if triple {
        LexErrorKind::UnterminatedTripleString
    } else {
        LexErrorKind::UnterminatedString
    };
    let bytes = rest.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                if !raw && bytes[i + 1..].starts_with(b"N{") {
                    match bytes[i + 3..].iter().position(|&b| b == b'}') {
                        Some(close) => i += 3 + close + 1,
                        None => i = bytes.len(),
                    }
                    continue;
                }
                i += match bytes.get(i + 1) {
                    // The brace still opens or closes a field.
                    Some(b'{' | b'}') => 1,
                    Some(b'\r') if bytes.get(i + 2) == Some(&b'\n') => 3,
                    Some(_) => 2,
                    None => 1,
                };
            }
            b'{' => {
                if !in_spec && bytes.get(i + 1) == Some(&b'{') {
                    i += 2;
                    continue;
                }
                return Ok((i + 1, LiteralStop::FieldOpened));
            }
            b'}' => {
                if in_spec {
                    return Ok((i + 1, LiteralStop::FieldClosed));
                }
                if bytes.get(i + 1) == Some(&b'}') {
                    i += 2;
                    continue;
                }
                return Err(LiteralError::at(LexErrorKind::UnmatchedBracket('}'), i));
            }
            b if b == quote => {
                let closes =
                    !triple || (bytes.get(i + 1) == Some(&quote) && bytes.get(i + 2) == Some(&quote));
                if !closes {
                    i += 1;
                    continue;
                }
                if in_spec {
                    return Err(LiteralError::at(LexErrorKind::UnclosedBracket('{'), i));
                }
                return Ok((i + if triple { 3 } else { 1 }, LiteralStop::Closed));
            }
            b'\n' | b'\r' if !triple => return Err(LiteralError::at(unterminated, i)),
            _ => i += 1,
        }
    }

    Err(LiteralError::at(unterminated, bytes.len()))
}
