//! Stateful Python lexer
//!
//!     The base tokenizer only knows lexemes. Python's token stream depends on context that
//!     a regular grammar cannot carry: whether a newline ends a statement (not inside
//!     brackets), how deep the current block is (the indentation stack), whether a `-`
//!     negates or subtracts (what came before it), and where a formatted string's literal
//!     text resumes after a replacement field. This lexer pulls lexemes from logos one at a
//!     time and layers that state on top, in a single forward pass with explicit stacks and
//!     no recursion.
//!
//! Line Handling
//!
//!     At the start of every physical line outside brackets the leading whitespace is
//!     measured without consuming it. Blank lines and comment-only lines leave the stack
//!     alone and end with a NewlinePhysical token; lines with code apply their width and
//!     emit IndentIncrease/IndentDecrease before the first token. A backslash right before
//!     a newline joins the next line to the current logical line and leaves no token.
//!
//! End of Input
//!
//!     A missing final newline is synthesized, open blocks are closed with dedents and
//!     EndOfInput is returned from then on. Any error is final: the lexer returns the same
//!     error on every later call.

use super::base_tokenization::{take_triple_quote, RawToken};
use super::common::{LexError, LexErrorKind};
use super::fstring::{FStringFrame, Field, LiteralError, LiteralStop, MAX_FSTRING_NESTING};
use super::indentation::{measure_indent, IndentChange, IndentStack};
use crate::token::{
    is_keyword, CommentPlacement, Fixity, Position, SegmentEdges, Token, TokenKind,
};
use logos::Logos;
use std::collections::VecDeque;
use std::ops::Range;

const BYTE_ORDER_MARK: &str = "\u{FEFF}";

/// An opening bracket waiting for its match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenBracket {
    ch: char,
    position: Position,
}

fn closer_of(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

/// Converts byte offsets to line/column positions by scanning forward.
///
/// Offsets are requested in increasing order, so the scan is linear over the whole input.
#[derive(Debug, Clone)]
struct LineTracker<'src> {
    source: &'src str,
    origin: usize,
    offset: usize,
    line: usize,
    line_start: usize,
}

impl<'src> LineTracker<'src> {
    fn new(source: &'src str, origin: usize) -> Self {
        LineTracker {
            source,
            origin,
            offset: origin,
            line: 1,
            line_start: origin,
        }
    }

    fn position(&mut self, target: usize) -> Position {
        if target < self.offset {
            *self = LineTracker::new(self.source, self.origin);
        }
        let bytes = self.source.as_bytes();
        while self.offset < target {
            match bytes[self.offset] {
                b'\n' => {
                    self.line += 1;
                    self.line_start = self.offset + 1;
                }
                b'\r' if bytes.get(self.offset + 1) != Some(&b'\n') => {
                    self.line += 1;
                    self.line_start = self.offset + 1;
                }
                _ => {}
            }
            self.offset += 1;
        }
        let column = self
            .source
            .get(self.line_start..target)
            .map_or(0, |text| text.chars().count());
        Position::new(self.line, column + 1)
    }
}

#[derive(Debug, Clone)]
enum State {
    Running,
    Finished,
    Failed(LexError),
}

pub struct Lexer<'src> {
    source: &'src str,
    raw: logos::Lexer<'src, RawToken>,
    lines: LineTracker<'src>,
    indents: IndentStack,
    brackets: Vec<OpenBracket>,
    fstrings: Vec<FStringFrame>,
    pending: VecDeque<Token<'src>>,
    state: State,
    /// Set once the iterator has yielded EndOfInput or an error.
    exhausted: bool,
    /// End of the last real token; everything after it up to the next token is trivia.
    trivia_start: usize,
    operand_expected: bool,
    at_line_start: bool,
    line_has_code: bool,
    line_has_comment: bool,
    last_was_colon: bool,
    /// The last logical line ended with `:`.
    opens_block: bool,
    comment_depth: Option<usize>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        let mut raw = RawToken::lexer(source);
        let origin = if source.starts_with(BYTE_ORDER_MARK) {
            raw.bump(BYTE_ORDER_MARK.len());
            BYTE_ORDER_MARK.len()
        } else {
            0
        };

        Lexer {
            source,
            raw,
            lines: LineTracker::new(source, origin),
            indents: IndentStack::new(),
            brackets: Vec::new(),
            fstrings: Vec::new(),
            pending: VecDeque::new(),
            state: State::Running,
            exhausted: false,
            trivia_start: origin,
            operand_expected: true,
            at_line_start: true,
            line_has_code: false,
            line_has_comment: false,
            last_was_colon: false,
            opens_block: false,
            comment_depth: None,
        }
    }

    /// Advance to the next token. After EndOfInput this keeps returning EndOfInput; after
    /// an error it keeps returning that error.
    pub fn next_token(&mut self) -> Result<Token<'src>, LexError> {
        if let State::Failed(error) = &self.state {
            return Err(*error);
        }
        let result = self.advance();
        match &result {
            Ok(token) => tracing::trace!(token = %token, "lexed"),
            Err(error) => {
                tracing::debug!(%error, "lexing failed");
                self.state = State::Failed(*error);
            }
        }
        result
    }

    fn advance(&mut self) -> Result<Token<'src>, LexError> {
        if let Some(token) = self.pending.pop_front() {
            return Ok(token);
        }
        if matches!(self.state, State::Finished) {
            return Ok(self.synthetic(TokenKind::EndOfInput, self.source.len()));
        }

        loop {
            if self.at_line_start && self.brackets.is_empty() {
                self.line_start()?;
                if let Some(token) = self.pending.pop_front() {
                    return Ok(token);
                }
            }

            if let Some(boundary) = self.field_boundary() {
                return self.close_field_expression(boundary);
            }

            let Some(result) = self.raw.next() else {
                return self.end_of_input();
            };
            let span = self.raw.span();
            let raw = result.map_err(|kind| self.raw_error(kind, span.start))?;

            match raw {
                RawToken::Whitespace => continue,
                RawToken::Backslash => {
                    self.line_continuation(span)?;
                    continue;
                }
                RawToken::Newline => {
                    if !self.brackets.is_empty() {
                        continue;
                    }
                    return Ok(self.end_line(span));
                }
                RawToken::Comment => {
                    let placement = match self.comment_depth.take() {
                        Some(depth) => CommentPlacement::Standalone { depth },
                        None => CommentPlacement::Trailing,
                    };
                    self.line_has_comment = true;
                    return Ok(self.token(TokenKind::Comment(placement), span));
                }
                RawToken::Name => {
                    let text = &self.source[span.clone()];
                    let kind = if is_keyword(text) {
                        TokenKind::Keyword
                    } else {
                        TokenKind::Identifier
                    };
                    self.code(kind == TokenKind::Keyword);
                    return Ok(self.token(kind, span));
                }
                RawToken::Number => {
                    self.code(false);
                    return Ok(self.token(TokenKind::NumericLiteral, span));
                }
                RawToken::String => {
                    self.code(false);
                    return Ok(self.token(TokenKind::StringLiteral, span));
                }
                RawToken::FStringStart => return self.fstring_start(span),
                RawToken::LParen | RawToken::LBracket | RawToken::LBrace => {
                    return Ok(self.open_bracket(span));
                }
                RawToken::RParen | RawToken::RBracket | RawToken::RBrace => {
                    return self.close_bracket(span);
                }
                RawToken::Comma | RawToken::Semicolon => {
                    self.code(true);
                    return Ok(self.token(TokenKind::Delimiter, span));
                }
                RawToken::Colon => {
                    self.code(true);
                    self.last_was_colon = true;
                    return Ok(self.token(TokenKind::Delimiter, span));
                }
                RawToken::Dot => {
                    let ellipsis = self.raw.remainder().starts_with("..");
                    if ellipsis {
                        self.raw.bump(2);
                    }
                    self.code(!ellipsis);
                    return Ok(self.token(TokenKind::Delimiter, span.start..self.offset()));
                }
                RawToken::Operator => {
                    let fixity = if self.operand_expected
                        && matches!(&self.source[span.clone()], "+" | "-" | "~" | "*" | "**" | "@")
                    {
                        Fixity::Unary
                    } else {
                        Fixity::Binary
                    };
                    self.code(true);
                    return Ok(self.token(TokenKind::Operator(fixity), span));
                }
            }
        }
    }

    /// Current byte offset into the source.
    fn offset(&self) -> usize {
        self.source.len() - self.raw.remainder().len()
    }

    /// Bookkeeping shared by every code token.
    fn code(&mut self, operand_expected: bool) {
        self.line_has_code = true;
        self.last_was_colon = false;
        self.operand_expected = operand_expected;
    }

    fn token(&mut self, kind: TokenKind, span: Range<usize>) -> Token<'src> {
        let position = self.lines.position(span.start);
        self.token_at(kind, span, position)
    }

    fn token_at(&mut self, kind: TokenKind, span: Range<usize>, position: Position) -> Token<'src> {
        let leading = &self.source[self.trivia_start..span.start];
        self.trivia_start = span.end;
        Token {
            kind,
            text: &self.source[span.clone()],
            leading,
            span,
            position,
        }
    }

    fn synthetic(&mut self, kind: TokenKind, offset: usize) -> Token<'src> {
        Token {
            kind,
            text: &self.source[offset..offset],
            leading: &self.source[offset..offset],
            span: offset..offset,
            position: self.lines.position(offset),
        }
    }

    fn error_at(&mut self, kind: LexErrorKind, offset: usize) -> LexError {
        LexError::new(kind, self.lines.position(offset))
    }

    fn raw_error(&mut self, kind: LexErrorKind, offset: usize) -> LexError {
        let kind = match kind {
            LexErrorKind::Unrecognized => self.source[offset..]
                .chars()
                .next()
                .map_or(LexErrorKind::Unrecognized, LexErrorKind::UnexpectedCharacter),
            other => other,
        };
        self.error_at(kind, offset)
    }

    /// Measure the indentation of a fresh physical line and queue indentation tokens.
    fn line_start(&mut self) -> Result<(), LexError> {
        self.at_line_start = false;
        let rest = self.raw.remainder();
        let (width, len) = measure_indent(rest);

        match rest.as_bytes().get(len) {
            None | Some(b'\n' | b'\r') => {}
            Some(b'#') => {
                self.comment_depth = Some(self.indents.comment_depth(width, self.opens_block));
            }
            Some(_) => {
                let offset = self.offset() + len;
                let change = self
                    .indents
                    .apply(width)
                    .map_err(|kind| self.error_at(kind, offset))?;
                match change {
                    IndentChange::Same => {}
                    IndentChange::Indent => {
                        let token = self.synthetic(TokenKind::IndentIncrease, offset);
                        self.pending.push_back(token);
                    }
                    IndentChange::Dedent(count) => {
                        for _ in 0..count {
                            let token = self.synthetic(TokenKind::IndentDecrease, offset);
                            self.pending.push_back(token);
                        }
                    }
                }
                self.opens_block = false;
            }
        }
        Ok(())
    }

    fn end_line(&mut self, span: Range<usize>) -> Token<'src> {
        let kind = if self.line_has_code {
            self.opens_block = self.last_was_colon;
            TokenKind::NewlineLogical
        } else {
            TokenKind::NewlinePhysical
        };
        self.at_line_start = true;
        self.line_has_code = false;
        self.line_has_comment = false;
        self.last_was_colon = false;
        self.operand_expected = true;
        self.comment_depth = None;
        self.token(kind, span)
    }

    fn line_continuation(&mut self, span: Range<usize>) -> Result<(), LexError> {
        let rest = self.raw.remainder();
        let newline = if rest.starts_with("\r\n") {
            2
        } else if rest.starts_with('\n') || rest.starts_with('\r') {
            1
        } else {
            return Err(self.error_at(LexErrorKind::StrayBackslash, span.start));
        };
        self.raw.bump(newline);
        tracing::trace!(offset = span.start, "explicit line continuation");
        Ok(())
    }

    fn open_bracket(&mut self, span: Range<usize>) -> Token<'src> {
        let position = self.lines.position(span.start);
        let ch = self.source[span.clone()].chars().next().unwrap_or('(');
        self.brackets.push(OpenBracket { ch, position });
        self.code(true);
        self.token_at(TokenKind::Delimiter, span, position)
    }

    fn close_bracket(&mut self, span: Range<usize>) -> Result<Token<'src>, LexError> {
        let close = self.source[span.clone()].chars().next().unwrap_or(')');
        match self.brackets.pop() {
            None => return Err(self.error_at(LexErrorKind::UnmatchedBracket(close), span.start)),
            Some(open) if closer_of(open.ch) != close => {
                let kind = LexErrorKind::MismatchedBracket {
                    open: open.ch,
                    close,
                };
                return Err(self.error_at(kind, span.start));
            }
            Some(_) => {}
        }
        self.code(false);
        Ok(self.token(TokenKind::Delimiter, span))
    }

    fn fstring_start(&mut self, span: Range<usize>) -> Result<Token<'src>, LexError> {
        let position = self.lines.position(span.start);
        if self.fstrings.len() >= MAX_FSTRING_NESTING {
            return Err(LexError::new(LexErrorKind::FStringTooDeep, position));
        }
        let prefix = &self.source[span.clone()];
        let quote = prefix.as_bytes()[prefix.len() - 1];
        let triple = take_triple_quote(&mut self.raw, quote);
        self.fstrings
            .push(FStringFrame::new(prefix, triple, position));
        self.fstring_segment(span.start, position, true)
    }

    /// `}` or `:` waiting at the bracket level of the innermost field's expression.
    fn field_boundary(&self) -> Option<u8> {
        let field = self.fstrings.last()?.expression_field()?;
        if field.depth != self.brackets.len() {
            return None;
        }
        match self.raw.remainder().as_bytes().first() {
            Some(&b) if b == b'}' || b == b':' => Some(b),
            _ => None,
        }
    }

    fn close_field_expression(&mut self, boundary: u8) -> Result<Token<'src>, LexError> {
        let start = self.offset();
        let position = self.lines.position(start);
        self.raw.bump(1);
        if let Some(frame) = self.fstrings.last_mut() {
            if boundary == b'}' {
                frame.fields.pop();
                self.brackets.pop();
            } else if let Some(field) = frame.fields.last_mut() {
                field.in_spec = true;
            }
        }
        self.fstring_segment(start, position, false)
    }

    /// Scan literal text up to the next replacement field or the closing quote.
    fn fstring_segment(
        &mut self,
        start: usize,
        position: Position,
        opens_string: bool,
    ) -> Result<Token<'src>, LexError> {
        let closes_string = loop {
            let Some(frame) = self.fstrings.last() else {
                break true;
            };
            let (len, stop) = match frame.scan_literal(self.raw.remainder()) {
                Ok(found) => found,
                Err(error) => return Err(self.literal_error(error)),
            };
            self.raw.bump(len);

            match stop {
                LiteralStop::Closed => {
                    self.fstrings.pop();
                    break true;
                }
                LiteralStop::FieldOpened => {
                    let brace = self.offset() - 1;
                    let position = self.lines.position(brace);
                    self.brackets.push(OpenBracket { ch: '{', position });
                    let depth = self.brackets.len();
                    if let Some(frame) = self.fstrings.last_mut() {
                        frame.fields.push(Field {
                            depth,
                            in_spec: false,
                        });
                    }
                    break false;
                }
                LiteralStop::FieldClosed => {
                    if let Some(frame) = self.fstrings.last_mut() {
                        frame.fields.pop();
                    }
                    self.brackets.pop();
                }
            }
        };

        self.code(!closes_string);
        let edges = SegmentEdges {
            opens_string,
            closes_string,
        };
        let end = self.offset();
        Ok(self.token_at(TokenKind::FStringSegment(edges), start..end, position))
    }

    fn literal_error(&mut self, error: LiteralError) -> LexError {
        let frame_position = self.fstrings.last().map(|frame| frame.position);
        match (error.kind, frame_position) {
            (
                LexErrorKind::UnterminatedString | LexErrorKind::UnterminatedTripleString,
                Some(position),
            ) => LexError::new(error.kind, position),
            (kind, _) => {
                let offset = self.offset() + error.offset;
                self.error_at(kind, offset)
            }
        }
    }

    fn end_of_input(&mut self) -> Result<Token<'src>, LexError> {
        if let Some(frame) = self.fstrings.last() {
            return Err(LexError::new(frame.unterminated(), frame.position));
        }
        if let Some(open) = self.brackets.last() {
            return Err(LexError::new(LexErrorKind::UnclosedBracket(open.ch), open.position));
        }

        let end = self.source.len();
        self.state = State::Finished;
        if self.line_has_code {
            self.opens_block = self.last_was_colon;
            let token = self.synthetic(TokenKind::NewlineLogical, end);
            self.pending.push_back(token);
        } else if self.line_has_comment {
            let token = self.synthetic(TokenKind::NewlinePhysical, end);
            self.pending.push_back(token);
        }
        self.line_has_code = false;
        self.line_has_comment = false;

        for _ in 0..self.indents.close_all() {
            let token = self.synthetic(TokenKind::IndentDecrease, end);
            self.pending.push_back(token);
        }

        match self.pending.pop_front() {
            Some(token) => Ok(token),
            None => Ok(self.synthetic(TokenKind::EndOfInput, end)),
        }
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Result<Token<'src>, LexError>;

    /// Yields every token up to and including EndOfInput, or up to the first error.
    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let result = self.next_token();
        self.exhausted = match &result {
            Ok(token) => token.kind == TokenKind::EndOfInput,
            Err(_) => true,
        };
        Some(result)
    }
}

impl std::iter::FusedIterator for Lexer<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token<'_>> {
        Lexer::new(source)
            .collect::<Result<Vec<_>, _>>()
            .expect("lexes")
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).into_iter().map(|token| token.kind).collect()
    }

    fn texts(source: &str) -> Vec<&str> {
        lex(source)
            .into_iter()
            .filter(|token| token.kind.has_significant_text())
            .map(|token| token.text)
            .collect()
    }

    fn error(source: &str) -> LexError {
        Lexer::new(source)
            .find_map(Result::err)
            .expect("lexing should fail")
    }

    use TokenKind::*;

    #[test]
    fn test_simple_statement() {
        assert_eq!(
            kinds("x = 1\n"),
            vec![
                Identifier,
                Operator(Fixity::Binary),
                NumericLiteral,
                NewlineLogical,
                EndOfInput
            ]
        );
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(kinds(""), vec![EndOfInput]);
    }

    #[test]
    fn test_end_of_input_repeats() {
        let mut lexer = Lexer::new("x");
        let mut last = Vec::new();
        for _ in 0..5 {
            last.push(lexer.next_token().unwrap().kind);
        }
        assert_eq!(
            last,
            vec![Identifier, NewlineLogical, EndOfInput, EndOfInput, EndOfInput]
        );
    }

    #[test]
    fn test_iterator_is_fused() {
        let mut lexer = Lexer::new("pass\n");
        assert_eq!(lexer.by_ref().count(), 3);
        assert!(lexer.next().is_none());
    }

    #[test]
    fn test_blocks() {
        let source = "if x:\n    y\n    if z:\n\tw\nv\n";
        assert_eq!(
            kinds(source),
            vec![
                Keyword,
                Identifier,
                Delimiter,
                NewlineLogical,
                IndentIncrease,
                Identifier,
                NewlineLogical,
                Keyword,
                Identifier,
                Delimiter,
                NewlineLogical,
                IndentIncrease,
                Identifier,
                NewlineLogical,
                IndentDecrease,
                IndentDecrease,
                Identifier,
                NewlineLogical,
                EndOfInput
            ]
        );
    }

    #[test]
    fn test_dedents_synthesized_at_end() {
        assert_eq!(
            kinds("def f():\n  return 1"),
            vec![
                Keyword,
                Identifier,
                Delimiter,
                Delimiter,
                Delimiter,
                NewlineLogical,
                IndentIncrease,
                Keyword,
                NumericLiteral,
                NewlineLogical,
                IndentDecrease,
                EndOfInput
            ]
        );
    }

    #[test]
    fn test_inconsistent_dedent() {
        let error = error("if x:\n    y\n  z\n");
        assert_eq!(error.kind, LexErrorKind::InconsistentDedent);
        assert_eq!(error.position, Position::new(3, 3));
    }

    #[test]
    fn test_blank_and_comment_lines() {
        let source = "x\n\n    # note\ny\n";
        let tokens = lex(source);
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                Identifier,
                NewlineLogical,
                NewlinePhysical,
                Comment(CommentPlacement::Standalone { depth: 0 }),
                NewlinePhysical,
                Identifier,
                NewlineLogical,
                EndOfInput
            ]
        );
        assert_eq!(tokens[3].text, "# note");
        assert_eq!(tokens[3].position, Position::new(3, 5));
    }

    #[test]
    fn test_comment_opening_a_block() {
        let tokens = lex("while x:\n        # first\n    y\n");
        assert_eq!(
            tokens[4].kind,
            Comment(CommentPlacement::Standalone { depth: 1 })
        );
    }

    #[test]
    fn test_trailing_comment() {
        let tokens = lex("x = 1  # one\n");
        assert_eq!(tokens[3].kind, Comment(CommentPlacement::Trailing));
        assert_eq!(tokens[4].kind, NewlineLogical);
    }

    #[test]
    fn test_brackets_suppress_newlines() {
        let source = "f(a,\n  b,  # why\n\n  c)\n";
        assert_eq!(
            kinds(source),
            vec![
                Identifier,
                Delimiter,
                Identifier,
                Delimiter,
                Identifier,
                Delimiter,
                Comment(CommentPlacement::Trailing),
                Identifier,
                Delimiter,
                NewlineLogical,
                EndOfInput
            ]
        );
    }

    #[test]
    fn test_line_continuation() {
        assert_eq!(texts("x = 1 + \\\n    2\n"), vec!["x", "=", "1", "+", "2"]);
        assert_eq!(
            kinds("x = \\\r\n1"),
            vec![
                Identifier,
                Operator(Fixity::Binary),
                NumericLiteral,
                NewlineLogical,
                EndOfInput
            ]
        );
    }

    #[test]
    fn test_stray_backslash() {
        let error = error("x = 1 \\ + 2\n");
        assert_eq!(error.kind, LexErrorKind::StrayBackslash);
        assert_eq!(error.position, Position::new(1, 7));
    }

    #[test]
    fn test_unary_and_binary() {
        let fixities: Vec<_> = lex("a = -b - (+c) * -1 ** ~d\n")
            .into_iter()
            .filter_map(|token| match token.kind {
                Operator(fixity) => Some((token.text, fixity)),
                _ => None,
            })
            .collect();
        assert_eq!(
            fixities,
            vec![
                ("=", Fixity::Binary),
                ("-", Fixity::Unary),
                ("-", Fixity::Binary),
                ("+", Fixity::Unary),
                ("*", Fixity::Binary),
                ("-", Fixity::Unary),
                ("**", Fixity::Binary),
                ("~", Fixity::Unary),
            ]
        );
    }

    #[test]
    fn test_star_arguments_and_decorators() {
        let fixities: Vec<_> = lex("@cache\ndef f(*args, **kw): return not -x\n")
            .into_iter()
            .filter_map(|token| match token.kind {
                Operator(fixity) => Some(fixity),
                _ => None,
            })
            .collect();
        assert_eq!(fixities, vec![Fixity::Unary; 4]);
    }

    #[test]
    fn test_keywords_and_values() {
        let tokens = lex("None if True else lambda: match\n");
        let kinds: Vec<_> = tokens.iter().take(6).map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![Identifier, Keyword, Identifier, Keyword, Keyword, Delimiter]
        );
        assert_eq!(tokens[6].kind, Identifier);
    }

    #[test]
    fn test_ellipsis_and_dots() {
        assert_eq!(
            texts("from .. import x; y = ...\n"),
            vec!["from", ".", ".", "import", "x", ";", "y", "=", "..."]
        );
    }

    #[test]
    fn test_bracket_errors() {
        assert_eq!(error("x)\n").kind, LexErrorKind::UnmatchedBracket(')'));
        let mismatch = error("f(x]\n");
        assert_eq!(
            mismatch.kind,
            LexErrorKind::MismatchedBracket {
                open: '(',
                close: ']'
            }
        );
        assert_eq!(mismatch.position, Position::new(1, 4));

        let unclosed = error("x = [1,\n 2\n");
        assert_eq!(unclosed.kind, LexErrorKind::UnclosedBracket('['));
        assert_eq!(unclosed.position, Position::new(1, 5));
    }

    #[test]
    fn test_unterminated_triple_string_points_at_opening() {
        let error = error("x = 1\ny = '''abc\n\nz\n");
        assert_eq!(error.kind, LexErrorKind::UnterminatedTripleString);
        assert_eq!(error.position, Position::new(2, 5));
    }

    #[test]
    fn test_error_is_sticky() {
        let mut lexer = Lexer::new("$");
        let first = lexer.next_token().unwrap_err();
        assert_eq!(first.kind, LexErrorKind::UnexpectedCharacter('$'));
        assert_eq!(lexer.next_token().unwrap_err(), first);
    }

    #[test]
    fn test_positions_count_characters() {
        let tokens = lex("é = 'ü'\r\nb\rc\n");
        let positions: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind.has_significant_text())
            .map(|t| t.position)
            .collect();
        assert_eq!(
            positions,
            vec![
                Position::new(1, 1),
                Position::new(1, 3),
                Position::new(1, 5),
                Position::new(2, 1),
                Position::new(3, 1),
            ]
        );
    }

    #[test]
    fn test_byte_order_mark_is_skipped() {
        let tokens = lex("\u{FEFF}x\n");
        assert_eq!(tokens[0].text, "x");
        assert_eq!(tokens[0].position, Position::new(1, 1));
        assert_eq!(tokens[0].leading, "");
    }

    #[test]
    fn test_leading_trivia() {
        let tokens = lex("f( a ,\n  b)\n");
        let leading: Vec<_> = tokens.iter().map(|t| t.leading).collect();
        assert_eq!(leading, vec!["", "", " ", " ", "\n  ", "", "", ""]);
    }

    #[test]
    fn test_fstring_segments() {
        let tokens = lex("f'a{x!r:>{w}}b{y}'\n");
        let parts: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind.has_significant_text())
            .map(|t| (t.kind, t.text))
            .collect();
        let segment = |opens_string, closes_string| {
            FStringSegment(SegmentEdges {
                opens_string,
                closes_string,
            })
        };
        assert_eq!(
            parts,
            vec![
                (segment(true, false), "f'a{"),
                (Identifier, "x"),
                (Operator(Fixity::Binary), "!"),
                (Identifier, "r"),
                (segment(false, false), ":>{"),
                (Identifier, "w"),
                (segment(false, false), "}}b{"),
                (Identifier, "y"),
                (segment(false, true), "}'"),
            ]
        );
    }

    #[test]
    fn test_fstring_without_fields() {
        let tokens = lex("x = rf\"\\d{{2}}\"\n");
        assert_eq!(
            tokens[2].kind,
            FStringSegment(SegmentEdges {
                opens_string: true,
                closes_string: true
            })
        );
        assert_eq!(tokens[2].text, "rf\"\\d{{2}}\"");
    }

    #[test]
    fn test_fstring_nested_quotes_and_brackets() {
        assert_eq!(
            texts("f\"{d['k']:{w}} {f'{1:{2}}'}\"\n"),
            vec![
                "f\"{", "d", "[", "'k'", "]", ":{", "w", "}} {", "f'{", "1", ":{", "2", "}}'",
                "}\""
            ]
        );
    }

    #[test]
    fn test_fstring_walrus_like_format_spec() {
        assert_eq!(texts("f'{x:=10}'\n"), vec!["f'{", "x", ":=10}'"]);
    }

    #[test]
    fn test_triple_fstring_spans_lines() {
        let tokens = lex("s = f'''\n{a +\n  b}\n'''\nt\n");
        assert_eq!(tokens[5].text, "b");
        assert_eq!(tokens[5].leading, "\n  ");
        assert_eq!(tokens[6].text, "}\n'''");
        assert_eq!(tokens[7].kind, NewlineLogical);
    }

    #[test]
    fn test_unterminated_fstring() {
        let err = error("x = f'{a}\n");
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
        assert_eq!(err.position, Position::new(1, 5));

        let err = error("x = f'{a\n");
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
        assert_eq!(err.position, Position::new(1, 5));
    }

    #[test]
    fn test_fstring_nesting_limit() {
        let mut source = String::new();
        for _ in 0..=MAX_FSTRING_NESTING {
            source.push_str("f'{");
        }
        source.push('x');
        for _ in 0..=MAX_FSTRING_NESTING {
            source.push_str("}'");
        }
        assert_eq!(error(&source).kind, LexErrorKind::FStringTooDeep);
    }
}
