//! Formatting
//!
//! The emitting half of the pipeline: it consumes the lexer's token stream and writes
//! canonical source text.
//!
//!     - Spacing between adjacent tokens ./spacing.rs
//!     - Comment normalisation ./comments.rs
//!     - Line structure, indentation and blank lines ./emitter.rs
//!     - Layout options and their defaults ./options.rs
//!
//! Whitespace in the input is never copied. Every space, newline and indentation run in
//! the output is decided here from token kinds alone, which is what makes the output
//! independent of how the input was laid out.

pub mod comments;
pub mod emitter;
pub mod options;
pub mod spacing;

pub use emitter::{format_tokens, Emitter};
pub use options::{FormatOptions, DEFAULT_INDENT_WIDTH, DEFAULT_MAX_BLANK_LINES};
