//! Spacing between adjacent tokens on a line.
//!
//!     The emitter never looks further back than the previous token. Each code token is
//!     reduced to a [`Class`] and the gap between two classes is decided by an ordered list
//!     of rules; the first one that matches wins. The only wider context is the innermost
//!     open bracket, which tells keyword-argument `=` and slice `:` apart from their
//!     statement-level spellings.
//!
//!     Word-like tokens are always separated, so two names, numbers or strings can never
//!     run together and re-lex as something else. A decimal integer followed by `.` keeps
//!     a space too, or `1 .real` would turn into the float `1.` followed by `real`.

use crate::token::{Fixity, Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    Open,
    Close,
    Comma,
    Semicolon,
    Colon,
    /// `.` and `...`
    Dot,
    /// Plain `=`.
    Assign,
    /// Names, strings, formatted strings and numbers other than decimal integers.
    Word,
    DecimalInt,
    Unary,
    Binary,
    Keyword,
}

/// Bracket context of the token being placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Context {
    /// The innermost bracket is the `[` of a subscript.
    pub in_subscript: bool,
    pub in_brackets: bool,
}

/// Spacing class of a code token; `None` for comments and layout tokens.
pub fn classify(token: &Token<'_>) -> Option<Class> {
    let class = match token.kind {
        TokenKind::Identifier | TokenKind::StringLiteral | TokenKind::FStringSegment(_) => {
            Class::Word
        }
        TokenKind::NumericLiteral => {
            if token.text.bytes().all(|b| b.is_ascii_digit() || b == b'_') {
                Class::DecimalInt
            } else {
                Class::Word
            }
        }
        TokenKind::Keyword => Class::Keyword,
        TokenKind::Operator(Fixity::Unary) => Class::Unary,
        TokenKind::Operator(Fixity::Binary) => {
            if token.text == "=" {
                Class::Assign
            } else {
                Class::Binary
            }
        }
        TokenKind::Delimiter => match token.text {
            "(" | "[" | "{" => Class::Open,
            ")" | "]" | "}" => Class::Close,
            "," => Class::Comma,
            ";" => Class::Semicolon,
            ":" => Class::Colon,
            _ => Class::Dot,
        },
        TokenKind::Comment(_)
        | TokenKind::NewlineLogical
        | TokenKind::NewlinePhysical
        | TokenKind::IndentIncrease
        | TokenKind::IndentDecrease
        | TokenKind::EndOfInput => return None,
    };
    Some(class)
}

/// Whether a single space goes between `prev` and `next`.
pub fn space_between(prev: Class, next: Class, context: Context) -> bool {
    use Class::*;

    match (prev, next) {
        (Open, _) | (_, Close) => false,
        (_, Comma | Semicolon) => false,
        (Comma | Semicolon, _) => true,
        (Unary, _) => false,
        // Keyword arguments and parameter defaults.
        (Assign, _) | (_, Assign) => !context.in_brackets,
        (Colon, Unary) => !context.in_subscript,
        (_, Unary) => true,
        (_, Colon) => false,
        (Colon, _) => !context.in_subscript,
        (Binary, _) | (_, Binary) => true,
        (Keyword | DecimalInt, Dot) => true,
        (_, Dot) => false,
        (Dot, Keyword) => true,
        (Dot, _) => false,
        (Keyword, _) | (_, Keyword) => true,
        (_, Open) => false,
        _ => true,
    }
}
