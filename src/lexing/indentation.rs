//! Indentation stack for logical lines
//!
//!     Python does not care how wide an indentation step is, only that a block is indented
//!     more than its parent and that a dedent lands exactly on an enclosing level. The stack
//!     keeps the column width of every open block; its length minus one is the block depth,
//!     which is all the emitter needs to re-indent with its own unit.
//!
//!     Widths are measured, never compared as strings, so tabs, spaces and mixed runs
//!     normalise to the same depths.
//!
//! Algorithm
//!
//!     1. Measure the leading whitespace of a line: space = 1, tab advances to the next
//!        multiple of 8, form feed resets the width to 0.
//!     2. Compare with the top of the stack:
//!        - If greater: push and report an indent
//!        - If equal: nothing
//!        - If less: pop until equal, reporting one dedent per pop; if no entry matches the
//!          line's width the dedent is inconsistent, which is fatal
//!     3. Blank and comment-only lines are measured but never applied.

use super::common::LexErrorKind;

/// Tab stops every 8 columns.
pub const TAB_WIDTH: usize = 8;

/// What applying a line's width did to the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndentChange {
    Same,
    Indent,
    Dedent(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentStack {
    widths: Vec<usize>,
}

impl IndentStack {
    pub fn new() -> Self {
        IndentStack { widths: vec![0] }
    }

    /// Number of open blocks.
    pub fn depth(&self) -> usize {
        self.widths.len() - 1
    }

    pub fn top(&self) -> usize {
        self.widths.last().copied().unwrap_or(0)
    }

    /// Apply the width of a line that starts with code.
    pub fn apply(&mut self, width: usize) -> Result<IndentChange, LexErrorKind> {
        let top = self.top();
        if width > top {
            self.widths.push(width);
            return Ok(IndentChange::Indent);
        }
        if width == top {
            return Ok(IndentChange::Same);
        }

        let Some(index) = self.widths.iter().rposition(|&w| w == width) else {
            return Err(LexErrorKind::InconsistentDedent);
        };
        let popped = self.widths.len() - 1 - index;
        self.widths.truncate(index + 1);
        Ok(IndentChange::Dedent(popped))
    }

    /// Depth a comment-only line at `width` belongs to.
    ///
    /// A comment indented past the current block right after a line ending in `:` belongs
    /// to the block about to open. Otherwise it goes with the deepest open block whose width
    /// does not exceed its own.
    pub fn comment_depth(&self, width: usize, opens_block: bool) -> usize {
        if opens_block && width > self.top() {
            return self.depth() + 1;
        }
        self.widths.iter().rposition(|&w| w <= width).unwrap_or(0)
    }

    /// Close every open block, returning how many dedents that takes.
    pub fn close_all(&mut self) -> usize {
        let open = self.depth();
        self.widths.truncate(1);
        open
    }
}

impl Default for IndentStack {
    fn default() -> Self {
        Self::new()
    }
}

/// Measure leading indentation: `(width in columns, length in bytes)`.
pub fn measure_indent(line: &str) -> (usize, usize) {
    let mut width = 0;
    let mut len = 0;
    for byte in line.bytes() {
        match byte {
            b' ' => width += 1,
            b'\t' => width = (width / TAB_WIDTH + 1) * TAB_WIDTH,
            b'\x0C' => width = 0,
            _ => break,
        }
        len += 1;
    }
    (width, len)
}
