//! Lexer
//!
//! This module turns Python source into the typed token stream the emitter consumes.
//!
//! Structure:
//!     Two layers. The context-free lexemes are recognised by the logos lexer library
//!     (./base_tokenization.rs). The stateful lexer (./lexer.rs) pulls them one at a time and
//!     applies everything that depends on context:
//!     - Indentation tracking ./indentation.rs
//!     - Bracket nesting, which turns newlines into whitespace
//!     - Explicit line continuations
//!     - Unary/binary operator classification
//!     - Formatted string literals, re-entering the lexer for each replacement field
//!       ./fstring.rs
//!
//! Indentation Handling
//!
//!     Indentation is turned into IndentIncrease and IndentDecrease tokens that map nicely
//!     to brace tokens in more c-style syntaxes. Only depth survives: the emitter
//!     re-indents with its own unit, so a file indented with tabs and one indented with
//!     ragged space runs come out the same.
//!
//!     Unlike a line-based lexer, indentation is measured lazily at the start of each
//!     physical line outside brackets, so the whole stream stays a single forward pass.

pub mod base_tokenization;
pub mod common;
pub mod fstring;
pub mod indentation;
pub mod lexer;

pub use common::{LexError, LexErrorKind};
pub use lexer::Lexer;
