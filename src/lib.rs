//! # pyfmt
//!
//! Very fast and consistent (if ugly) autoformatting for Python.
//!
//! The engine is a two stage pipeline without a parse tree:
//!
//!     source bytes -> Lexer -> tokens -> Emitter -> canonical bytes
//!
//! The [lexer](lexing) reconstructs Python's token stream (indentation, bracket nesting,
//! line continuations, strings and formatted strings) in a single forward pass. The
//! [emitter](formatting) re-synthesizes every piece of whitespace from token kinds alone.
//! The output lexes to the same significant tokens as the input, and formatting it again
//! is a no-op.
//!
//! ## Testing
//!
//! For the property assertions every formatter test should use, see the
//! [testing module](testing).

pub mod engine;
pub mod formatting;
pub mod lexing;
pub mod testing;
pub mod token;

pub use engine::{decode, format, format_str, format_str_with_options, tokenize, FormatError};
pub use formatting::FormatOptions;
pub use lexing::{LexError, LexErrorKind, Lexer};
pub use token::{Position, Token, TokenKind};
