//! Testing utilities for formatter assertions
//!
//! Formatter tests should check properties, not just outputs. Two properties hold for every
//! valid input and are cheap to check on any source string:
//!
//! 1. **[assert_preserves_tokens]** - the output lexes to the same significant tokens as the
//!    input. Comments and blank lines may move; nothing that changes meaning may.
//! 2. **[assert_idempotent]** - formatting the output again changes nothing.
//!
//! [assert_formats_to] combines both with an exact comparison against the expected text,
//! so a test that pins down a layout decision also proves it is stable.
//!
//! ```rust-example
//! use pyfmt::testing::assert_formats_to;
//!
//! assert_formats_to("x=[1,2]", "x = [1, 2]\n");
//! ```

use crate::engine::{format_str_with_options, tokenize};
use crate::formatting::FormatOptions;
use crate::lexing::LexError;
use crate::token::TokenKind;

/// Kind and text of every token that carries meaning, in order.
///
/// Comments and NewlinePhysical are dropped. Line endings inside token text are normalised,
/// because the formatter writes `\n` everywhere.
pub fn significant_tokens(source: &str) -> Result<Vec<(TokenKind, String)>, LexError> {
    Ok(tokenize(source)?
        .into_iter()
        .filter(|token| !token.kind.is_trivia())
        .map(|token| {
            let text = token.text.replace("\r\n", "\n").replace('\r', "\n");
            (token.kind, text)
        })
        .collect())
}

fn format_or_panic(source: &str, options: &FormatOptions) -> String {
    match format_str_with_options(source, options) {
        Ok(output) => output,
        Err(error) => panic!("formatting failed: {error}\n--- source ---\n{source}"),
    }
}

/// Assert that the formatted output keeps every significant token of `source`.
pub fn assert_preserves_tokens(source: &str) {
    assert_preserves_tokens_with(source, &FormatOptions::default());
}

pub fn assert_preserves_tokens_with(source: &str, options: &FormatOptions) {
    let output = format_or_panic(source, options);
    let before = match significant_tokens(source) {
        Ok(tokens) => tokens,
        Err(error) => panic!("source does not lex: {error}"),
    };
    let after = match significant_tokens(&output) {
        Ok(tokens) => tokens,
        Err(error) => panic!("formatted output does not lex: {error}\n--- output ---\n{output}"),
    };
    assert_eq!(
        before, after,
        "formatting changed the token stream\n--- output ---\n{output}"
    );
}

/// Assert that formatting the formatted output is a no-op.
pub fn assert_idempotent(source: &str) {
    assert_idempotent_with(source, &FormatOptions::default());
}

pub fn assert_idempotent_with(source: &str, options: &FormatOptions) {
    let once = format_or_panic(source, options);
    let twice = format_or_panic(&once, options);
    assert_eq!(once, twice, "formatting is not idempotent");
}

/// Assert the exact output for `source`, and that it is stable and meaning-preserving.
pub fn assert_formats_to(source: &str, expected: &str) {
    let options = FormatOptions::default();
    let output = format_or_panic(source, &options);
    assert_eq!(output, expected);
    assert_preserves_tokens_with(source, &options);
    assert_idempotent_with(source, &options);
}
