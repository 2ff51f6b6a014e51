//! Core token types shared by the lexer and the emitter.
//!
//!     A token is an immutable value borrowed from the source buffer. Its `text` slices the
//!     original bytes and is never copied; synthesized tokens (indentation changes, the
//!     newline added at the end of an unterminated last line, end of input) carry an empty
//!     slice.
//!
//! Token Layers
//!
//!     Lexemes:
//!         Identifier, Keyword, NumericLiteral, StringLiteral, FStringSegment, Operator,
//!         Delimiter and Comment tokens. They cover a contiguous range of the source.
//!
//!     Line Tokens:
//!         NewlineLogical ends a statement. NewlinePhysical ends a line that carries no code
//!         (blank or comment-only). Newlines inside brackets are plain whitespace and never
//!         become tokens.
//!
//!     Structural Tokens:
//!         IndentIncrease and IndentDecrease, produced from the indentation stack at the start
//!         of each logical line. They behave like open/close braces in c-style languages.
//!
//! Trivia
//!
//!     Whatever lies between two tokens (spaces, tabs, escaped newlines, newlines inside
//!     brackets) is kept as the `leading` slice of the following token. The emitter discards
//!     it everywhere except inside formatted-string replacement fields, which are reproduced
//!     byte for byte.

use serde::Serialize;
use std::fmt;
use std::ops::Range;

/// Line and column of a token start, both 1-based. Columns count characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// The position of the first character of a buffer.
    pub fn start() -> Self {
        Self::new(1, 1)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Whether an operator applies to a single operand or sits between two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Fixity {
    Unary,
    Binary,
}

/// Which ends of a formatted string a segment carries.
///
/// A formatted string without replacement fields is a single segment that both opens and
/// closes the string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SegmentEdges {
    pub opens_string: bool,
    pub closes_string: bool,
}

/// Where a comment sits relative to the code around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CommentPlacement {
    /// Follows code on the same line, or sits inside brackets.
    Trailing,
    /// Alone on its line; `depth` is the block depth it belongs to.
    Standalone { depth: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Identifier,
    Keyword,
    NumericLiteral,
    StringLiteral,
    FStringSegment(SegmentEdges),
    Operator(Fixity),
    Delimiter,
    Comment(CommentPlacement),
    NewlineLogical,
    NewlinePhysical,
    IndentIncrease,
    IndentDecrease,
    EndOfInput,
}

impl TokenKind {
    /// Tokens that carry no meaning for the program: comments and non-logical newlines.
    pub fn is_trivia(&self) -> bool {
        matches!(self, TokenKind::Comment(_) | TokenKind::NewlinePhysical)
    }

    /// Whether the token's text is part of what the program means.
    pub fn has_significant_text(&self) -> bool {
        matches!(
            self,
            TokenKind::Identifier
                | TokenKind::Keyword
                | TokenKind::NumericLiteral
                | TokenKind::StringLiteral
                | TokenKind::FStringSegment(_)
                | TokenKind::Operator(_)
                | TokenKind::Delimiter
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Identifier => "identifier",
            TokenKind::Keyword => "keyword",
            TokenKind::NumericLiteral => "number",
            TokenKind::StringLiteral => "string",
            TokenKind::FStringSegment(_) => "fstring-segment",
            TokenKind::Operator(Fixity::Unary) => "unary-operator",
            TokenKind::Operator(Fixity::Binary) => "binary-operator",
            TokenKind::Delimiter => "delimiter",
            TokenKind::Comment(_) => "comment",
            TokenKind::NewlineLogical => "newline",
            TokenKind::NewlinePhysical => "nl",
            TokenKind::IndentIncrease => "indent",
            TokenKind::IndentDecrease => "dedent",
            TokenKind::EndOfInput => "end-of-input",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    #[serde(skip)]
    pub leading: &'src str,
    pub span: Range<usize>,
    pub position: Position,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.text.is_empty() || !self.kind.has_significant_text() {
            write!(f, "{}@{}", self.kind, self.position)
        } else {
            write!(f, "{}({:?})@{}", self.kind, self.text, self.position)
        }
    }
}

/// Hard keywords. `True`, `False` and `None` behave as values and lex as identifiers; soft
/// keywords (`match`, `case`, `type`, `_`) are identifiers too.
pub fn is_keyword(word: &str) -> bool {
    matches!(
        word,
        "and"
            | "as"
            | "assert"
            | "async"
            | "await"
            | "break"
            | "class"
            | "continue"
            | "def"
            | "del"
            | "elif"
            | "else"
            | "except"
            | "finally"
            | "for"
            | "from"
            | "global"
            | "if"
            | "import"
            | "in"
            | "is"
            | "lambda"
            | "nonlocal"
            | "not"
            | "or"
            | "pass"
            | "raise"
            | "return"
            | "try"
            | "while"
            | "with"
            | "yield"
    )
}
