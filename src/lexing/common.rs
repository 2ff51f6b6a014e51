//! Lexer errors
//!
//! Every lexical error is fatal: the lexer stops at the first one and reports where it
//! happened. There is no recovery and no partial token stream.

use crate::token::Position;
use thiserror::Error;

/// What went wrong while lexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Error)]
pub enum LexErrorKind {
    /// Raised by the base tokenizer for input it has no rule for. The lexer replaces it with
    /// [`LexErrorKind::UnexpectedCharacter`] once it knows which character it was.
    #[default]
    #[error("unrecognized input")]
    Unrecognized,
    #[error("unexpected character {0:?}")]
    UnexpectedCharacter(char),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated triple-quoted string literal")]
    UnterminatedTripleString,
    #[error("unmatched '{0}'")]
    UnmatchedBracket(char),
    #[error("closing '{close}' does not match opening '{open}'")]
    MismatchedBracket { open: char, close: char },
    #[error("'{0}' was never closed")]
    UnclosedBracket(char),
    #[error("unindent does not match any outer indentation level")]
    InconsistentDedent,
    #[error("unexpected character after line continuation")]
    StrayBackslash,
    #[error("formatted string literals are nested too deeply")]
    FStringTooDeep,
    #[error("source is not valid UTF-8")]
    InvalidUtf8,
}

/// A fatal lexical error and the position it points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{position}: {kind}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub position: Position,
}

impl LexError {
    pub fn new(kind: LexErrorKind, position: Position) -> Self {
        Self { kind, position }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_position() {
        let error = LexError::new(LexErrorKind::UnterminatedTripleString, Position::new(4, 9));
        assert_eq!(
            error.to_string(),
            "4:9: unterminated triple-quoted string literal"
        );
    }

    #[test]
    fn test_bracket_messages() {
        let mismatch = LexErrorKind::MismatchedBracket {
            open: '(',
            close: ']',
        };
        assert_eq!(
            mismatch.to_string(),
            "closing ']' does not match opening '('"
        );
        assert_eq!(
            LexErrorKind::UnclosedBracket('[').to_string(),
            "'[' was never closed"
        );
    }
}
