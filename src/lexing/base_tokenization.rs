//! Base tokenization using the logos lexer library
//!
//! This module recognises the context-free lexemes of Python source: names, numbers,
//! quoted strings, operators, delimiters, comments, whitespace and newlines. It knows
//! nothing about indentation, bracket depth or formatted-string fields; those live in the
//! stateful [`Lexer`](super::lexer::Lexer) that drives this tokenizer one lexeme at a time.
//!
//! Strings and numbers are recognised by their first characters and finished by callbacks
//! that scan the remainder by hand. Escapes, triple quotes, exponents and radix prefixes are
//! easier to get right that way than with a single regular expression.

use super::common::LexErrorKind;
use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(error = LexErrorKind)]
pub enum RawToken {
    #[regex(r"[ \t\x0C]+")]
    Whitespace,

    #[regex(r"\r\n|\n|\r")]
    Newline,

    /// Only valid right before a newline; the lexer checks that.
    #[token("\\")]
    Backslash,

    #[regex(r"#[^\r\n]*")]
    Comment,

    #[regex(r"[a-zA-Z_\x{80}-\x{10FFFF}][a-zA-Z0-9_\x{80}-\x{10FFFF}]*")]
    Name,

    #[regex(r"[0-9]", lex_number)]
    #[regex(r"\.[0-9]", lex_number)]
    Number,

    /// A complete plain, raw or bytes literal, single or triple quoted.
    #[regex(r#"(?i:[rub]|br|rb)?["']"#, lex_string)]
    String,

    /// Prefix and opening quote of a formatted or template string. The body is scanned by
    /// the lexer, which has to re-enter itself for replacement fields.
    #[regex(r#"(?i:[ft]|fr|rf|tr|rt)["']"#)]
    FStringStart,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    /// A single dot; the lexer merges three of them into an ellipsis.
    #[token(".")]
    Dot,

    #[token("+")]
    #[token("-")]
    #[token("*")]
    #[token("**")]
    #[token("/")]
    #[token("//")]
    #[token("%")]
    #[token("@")]
    #[token("<<")]
    #[token(">>")]
    #[token("&")]
    #[token("|")]
    #[token("^")]
    #[token("~")]
    #[token("<")]
    #[token(">")]
    #[token("<=")]
    #[token(">=")]
    #[token("==")]
    #[token("!=")]
    #[token("!")]
    #[token("=")]
    #[token("+=")]
    #[token("-=")]
    #[token("*=")]
    #[token("/=")]
    #[token("//=")]
    #[token("%=")]
    #[token("@=")]
    #[token("&=")]
    #[token("|=")]
    #[token("^=")]
    #[token(">>=")]
    #[token("<<=")]
    #[token("**=")]
    #[token("->")]
    #[token(":=")]
    Operator,
}

/// Length of the run of bytes at the start of `bytes` that satisfy `pred`.
fn take_while(bytes: &[u8], pred: impl Fn(u8) -> bool) -> usize {
    bytes.iter().take_while(|&&b| pred(b)).count()
}

fn is_digit_part(b: u8) -> bool {
    b.is_ascii_digit() || b == b'_'
}

/// Length of an exponent (`e`, optional sign, digits) at the start of `rest`, or 0.
fn exponent(rest: &[u8]) -> usize {
    if !matches!(rest.first(), Some(b'e' | b'E')) {
        return 0;
    }
    let mut i = 1;
    if matches!(rest.get(i), Some(b'+' | b'-')) {
        i += 1;
    }
    match rest.get(i) {
        Some(b) if b.is_ascii_digit() => i + take_while(&rest[i..], is_digit_part),
        _ => 0,
    }
}

fn imaginary(rest: &[u8]) -> usize {
    usize::from(matches!(rest.first(), Some(b'j' | b'J')))
}

/// Bytes following the first digit of an integer or float literal.
fn number_tail(first: u8, rest: &[u8]) -> usize {
    if first == b'0' {
        let radix: Option<fn(u8) -> bool> = match rest.first() {
            Some(b'x' | b'X') => Some(|b: u8| b.is_ascii_hexdigit() || b == b'_'),
            Some(b'o' | b'O') => Some(|b: u8| (b'0'..=b'7').contains(&b) || b == b'_'),
            Some(b'b' | b'B') => Some(|b: u8| b == b'0' || b == b'1' || b == b'_'),
            _ => None,
        };
        if let Some(is_radix_digit) = radix {
            return 1 + take_while(&rest[1..], is_radix_digit);
        }
    }

    let mut i = take_while(rest, is_digit_part);
    if rest.get(i) == Some(&b'.') {
        i += 1;
        i += take_while(&rest[i..], is_digit_part);
    }
    i += exponent(&rest[i..]);
    i + imaginary(&rest[i..])
}

/// Bytes following `.d` of a float written without an integer part.
fn fraction_tail(rest: &[u8]) -> usize {
    let mut i = take_while(rest, is_digit_part);
    i += exponent(&rest[i..]);
    i + imaginary(&rest[i..])
}

fn lex_number(lex: &mut logos::Lexer<RawToken>) {
    let slice = lex.slice().as_bytes();
    let rest = lex.remainder().as_bytes();
    let len = if slice[0] == b'.' {
        fraction_tail(rest)
    } else {
        number_tail(slice[0], rest)
    };
    lex.bump(len);
}

/// Scan the body of a plain string after its opening quote(s).
///
/// Returns the number of bytes up to and including the closing quote(s). A backslash
/// always protects the next character from ending the literal, raw strings included.
pub(crate) fn scan_string_body(body: &str, quote: u8, triple: bool) -> Result<usize, LexErrorKind> {
    let bytes = body.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += if bytes.get(i + 1) == Some(&b'\r') && bytes.get(i + 2) == Some(&b'\n') {
                    3
                } else {
                    2
                };
            }
            b if b == quote => {
                if !triple {
                    return Ok(i + 1);
                }
                if bytes.get(i + 1) == Some(&quote) && bytes.get(i + 2) == Some(&quote) {
                    return Ok(i + 3);
                }
                i += 1;
            }
            b'\n' | b'\r' if !triple => return Err(LexErrorKind::UnterminatedString),
            _ => i += 1,
        }
    }
    Err(if triple {
        LexErrorKind::UnterminatedTripleString
    } else {
        LexErrorKind::UnterminatedString
    })
}

/// Whether the opening quote just matched is the first of three. Consumes the other two.
pub(crate) fn take_triple_quote(lex: &mut logos::Lexer<RawToken>, quote: u8) -> bool {
    let rest = lex.remainder().as_bytes();
    let triple = rest.len() >= 2 && rest[0] == quote && rest[1] == quote;
    if triple {
        lex.bump(2);
    }
    triple
}

fn lex_string(lex: &mut logos::Lexer<RawToken>) -> Result<(), LexErrorKind> {
    let quote = lex.slice().as_bytes()[lex.slice().len() - 1];
    let triple = take_triple_quote(lex, quote);
    let len = scan_string_body(lex.remainder(), quote, triple)?;
    lex.bump(len);
    Ok(())
}

/// Tokenize source code with location information
///
/// Raw tokenization only: no indentation, no bracket tracking, no formatted-string fields.
/// Useful to inspect how the base layer splits a buffer; the formatter itself drives the
/// logos lexer through [`Lexer`](super::lexer::Lexer).
pub fn tokenize(source: &str) -> Vec<(Result<RawToken, LexErrorKind>, logos::Span)> {
    let mut lexer = RawToken::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        tokens.push((result, lexer.span()));
    }

    tokens
}
