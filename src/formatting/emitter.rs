//! Emitter: token stream to canonical source text
//!
//!     The emitter re-synthesizes all whitespace. It keeps a depth counter driven by the
//!     indentation tokens, the class of the previous token for spacing, and a small stack of
//!     the brackets opened on the current logical line. Output goes straight to the sink as
//!     tokens arrive; nothing is buffered beyond the current token.
//!
//! Line Structure
//!
//!     LineStart -> indentation -> tokens with spacing -> LineEnd
//!
//!     The first token of a line writes any pending blank lines and the indentation.
//!     NewlineLogical closes the line. NewlinePhysical closes a comment-only line, or counts
//!     as a blank line when nothing was written since the last line end. Blank lines are
//!     collapsed to `max_blank_lines` and never written before the first line of content or
//!     after the last one.
//!
//!     Inside brackets a logical line is joined onto one physical line, except after a
//!     comment, which has to end its line. The line after such a comment is a continuation
//!     and is indented one extra level.
//!
//! Formatted Strings
//!
//!     Everything between the opening and the closing segment of a formatted string,
//!     including the trivia inside replacement fields, is written as it appeared in the
//!     source. Spacing inside a field can change the result (`f"{x = }"`).

use super::comments::normalize_comment;
use super::options::{FormatOptions, INLINE_COMMENT_GAP};
use super::spacing::{classify, space_between, Class, Context};
use crate::token::{CommentPlacement, SegmentEdges, Token, TokenKind};
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Bracket {
    subscript: bool,
}

pub struct Emitter<W: Write> {
    sink: W,
    options: FormatOptions,
    depth: usize,
    brackets: Vec<Bracket>,
    prev: Option<Class>,
    line_open: bool,
    continuation: bool,
    pending_blank_lines: usize,
    wrote_content: bool,
    fstring_depth: usize,
    /// Single `.` tokens written back to back at the end of the line.
    dot_run: usize,
}

impl<W: Write> Emitter<W> {
    pub fn new(sink: W, options: FormatOptions) -> Self {
        Emitter {
            sink,
            options,
            depth: 0,
            brackets: Vec::new(),
            prev: None,
            line_open: false,
            continuation: false,
            pending_blank_lines: 0,
            wrote_content: false,
            fstring_depth: 0,
            dot_run: 0,
        }
    }

    pub fn emit(&mut self, token: &Token<'_>) -> io::Result<()> {
        if self.fstring_depth > 0 {
            self.write_source(token.leading)?;
            self.write_source(token.text)?;
            if let TokenKind::FStringSegment(edges) = token.kind {
                self.track_fstring(edges);
                if self.fstring_depth == 0 {
                    self.prev = Some(Class::Word);
                }
            }
            return Ok(());
        }

        match token.kind {
            TokenKind::IndentIncrease => self.depth += 1,
            TokenKind::IndentDecrease => self.depth = self.depth.saturating_sub(1),
            TokenKind::NewlineLogical => {
                if self.line_open {
                    self.end_line()?;
                }
                self.prev = None;
                self.continuation = false;
                self.brackets.clear();
            }
            TokenKind::NewlinePhysical => {
                if self.line_open {
                    self.end_line()?;
                    self.prev = None;
                } else if self.wrote_content {
                    self.pending_blank_lines += 1;
                }
            }
            TokenKind::Comment(placement) => self.comment(token.text, placement)?,
            TokenKind::EndOfInput => {}
            TokenKind::FStringSegment(edges) => {
                self.code(Class::Word, token.text)?;
                self.track_fstring(edges);
            }
            _ => {
                if let Some(class) = classify(token) {
                    self.code(class, token.text)?;
                }
            }
        }
        Ok(())
    }

    /// Close an unfinished line, flush and hand the sink back.
    pub fn finish(mut self) -> io::Result<W> {
        if self.line_open {
            self.end_line()?;
        }
        self.sink.flush()?;
        Ok(self.sink)
    }

    fn context(&self) -> Context {
        Context {
            in_subscript: self.brackets.last().is_some_and(|b| b.subscript),
            in_brackets: !self.brackets.is_empty(),
        }
    }

    fn code(&mut self, class: Class, text: &str) -> io::Result<()> {
        let mut spaced = false;
        if !self.line_open {
            self.open_line(self.depth + usize::from(self.continuation))?;
        } else if let Some(prev) = self.prev {
            spaced = space_between(prev, class, self.context()) || self.dots_would_merge(text);
            if spaced {
                self.sink.write_all(b" ")?;
            }
        }
        self.write_source(text)?;

        self.dot_run = match (class, text) {
            (Class::Dot, ".") if !spaced && self.prev == Some(Class::Dot) => self.dot_run + 1,
            (Class::Dot, ".") => 1,
            _ => 0,
        };

        match class {
            Class::Open => {
                let subscript = text == "["
                    && matches!(
                        self.prev,
                        Some(Class::Word | Class::DecimalInt | Class::Close)
                    );
                self.brackets.push(Bracket { subscript });
            }
            Class::Close => {
                self.brackets.pop();
            }
            _ => {}
        }
        self.prev = Some(class);
        Ok(())
    }

    /// Whether writing `text` right after the current run of single dots would re-lex as `...`.
    fn dots_would_merge(&self, text: &str) -> bool {
        match text {
            "." => self.dot_run >= 2,
            "..." => self.dot_run >= 1,
            _ => false,
        }
    }

    fn comment(&mut self, text: &str, placement: CommentPlacement) -> io::Result<()> {
        let text = normalize_comment(text);
        match placement {
            CommentPlacement::Standalone { depth } => {
                if self.line_open {
                    self.end_line()?;
                }
                self.open_line(depth)?;
                self.sink.write_all(text.as_bytes())?;
                self.prev = None;
            }
            CommentPlacement::Trailing => {
                if self.line_open {
                    self.sink.write_all(INLINE_COMMENT_GAP.as_bytes())?;
                } else {
                    self.open_line(self.depth + usize::from(self.continuation))?;
                }
                self.sink.write_all(text.as_bytes())?;
                if !self.brackets.is_empty() {
                    self.end_line()?;
                    self.continuation = true;
                }
            }
        }
        Ok(())
    }

    fn open_line(&mut self, depth: usize) -> io::Result<()> {
        if self.wrote_content {
            for _ in 0..self.pending_blank_lines.min(self.options.max_blank_lines) {
                self.sink.write_all(b"\n")?;
            }
        }
        self.pending_blank_lines = 0;

        let width = depth * self.options.indent_unit();
        write!(self.sink, "{:width$}", "")?;
        self.line_open = true;
        self.wrote_content = true;
        Ok(())
    }

    fn end_line(&mut self) -> io::Result<()> {
        self.sink.write_all(b"\n")?;
        self.line_open = false;
        Ok(())
    }

    fn track_fstring(&mut self, edges: SegmentEdges) {
        match (edges.opens_string, edges.closes_string) {
            (true, false) => self.fstring_depth += 1,
            (false, true) => self.fstring_depth = self.fstring_depth.saturating_sub(1),
            _ => {}
        }
    }

    /// Write source text with line endings normalised to `\n`.
    fn write_source(&mut self, text: &str) -> io::Result<()> {
        if !text.contains('\r') {
            return self.sink.write_all(text.as_bytes());
        }
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        self.sink.write_all(normalized.as_bytes())
    }
}

/// Emit a whole token stream into `sink`.
pub fn format_tokens<'src, I, W>(tokens: I, sink: W, options: FormatOptions) -> io::Result<W>
where
    I: IntoIterator<Item = Token<'src>>,
    W: Write,
{
    let mut emitter = Emitter::new(sink, options);
    for token in tokens {
        emitter.emit(&token)?;
    }
    emitter.finish()
}
