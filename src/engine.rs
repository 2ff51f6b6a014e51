//! Engine entry points
//!
//! Wires a fresh [`Lexer`] to a fresh [`Emitter`] for every call. Nothing is cached between
//! calls, so formatting an edited buffer again is as correct as formatting it the first
//! time.

use crate::formatting::{Emitter, FormatOptions};
use crate::lexing::{LexError, LexErrorKind, Lexer};
use crate::token::{Position, Token, TokenKind};
use std::io::{self, Write};
use thiserror::Error;

const BYTE_ORDER_MARK: &str = "\u{FEFF}";

#[derive(Debug, Error)]
pub enum FormatError {
    #[error(transparent)]
    Lexical(#[from] LexError),
    #[error("cannot write formatted output: {0}")]
    Io(#[from] io::Error),
}

impl FormatError {
    /// Source position of a lexical error.
    pub fn position(&self) -> Option<Position> {
        match self {
            FormatError::Lexical(error) => Some(error.position),
            FormatError::Io(_) => None,
        }
    }
}

/// Format `source` into `sink` and hand the sink back.
///
/// The source is lexed once up front without emitting, so a lexical error leaves the sink
/// untouched. The second pass streams tokens straight into the sink.
pub fn format<W: Write>(
    source: &[u8],
    mut sink: W,
    options: &FormatOptions,
) -> Result<W, FormatError> {
    let text = decode(source)?;
    tracing::debug!(bytes = source.len(), "formatting");
    Lexer::new(text).try_for_each(|token| token.map(drop))?;

    if text.starts_with(BYTE_ORDER_MARK) {
        sink.write_all(BYTE_ORDER_MARK.as_bytes())?;
    }

    let mut lexer = Lexer::new(text);
    let mut emitter = Emitter::new(sink, *options);
    let mut count = 0usize;
    loop {
        let token = lexer.next_token()?;
        emitter.emit(&token)?;
        count += 1;
        if token.kind == TokenKind::EndOfInput {
            break;
        }
    }
    tracing::debug!(tokens = count, "formatted");
    Ok(emitter.finish()?)
}

/// Format a string with the default options.
pub fn format_str(source: &str) -> Result<String, FormatError> {
    format_str_with_options(source, &FormatOptions::default())
}

/// Format a string; the output exists only if the whole input formatted.
pub fn format_str_with_options(
    source: &str,
    options: &FormatOptions,
) -> Result<String, FormatError> {
    let buffer = Vec::with_capacity(source.len() + source.len() / 8);
    let bytes = format(source.as_bytes(), buffer, options)?;
    String::from_utf8(bytes)
        .map_err(|error| FormatError::Io(io::Error::new(io::ErrorKind::InvalidData, error)))
}

/// Source bytes as text; invalid UTF-8 is a lexical error at the first bad byte.
pub fn decode(source: &[u8]) -> Result<&str, LexError> {
    std::str::from_utf8(source).map_err(|error| {
        let valid = &source[..error.valid_up_to()];
        let position = std::str::from_utf8(valid).map_or_else(|_| Position::start(), end_position);
        LexError::new(LexErrorKind::InvalidUtf8, position)
    })
}

/// Collect the token stream of `source`, EndOfInput included.
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, LexError> {
    Lexer::new(source).collect()
}

/// Position just past the end of `text`.
fn end_position(text: &str) -> Position {
    let mut line = 1;
    let mut line_start = 0;
    let bytes = text.as_bytes();
    for (i, &byte) in bytes.iter().enumerate() {
        let line_break = byte == b'\n' || (byte == b'\r' && bytes.get(i + 1) != Some(&b'\n'));
        if line_break {
            line += 1;
            line_start = i + 1;
        }
    }
    Position::new(line, text[line_start..].chars().count() + 1)
}
