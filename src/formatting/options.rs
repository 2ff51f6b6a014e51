//! Formatting options and the layout constants behind them.

/// Spaces per indentation level.
pub const DEFAULT_INDENT_WIDTH: usize = 4;

/// Longest run of blank lines kept between two lines of content.
pub const DEFAULT_MAX_BLANK_LINES: usize = 1;

/// Gap between code and a comment that follows it on the same line.
pub const INLINE_COMMENT_GAP: &str = "  ";

/// Layout knobs of the emitter. The spacing rules themselves are fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    pub indent_width: usize,
    pub max_blank_lines: usize,
}

impl FormatOptions {
    /// Width of one indentation level; never zero, so depth stays visible in the output.
    pub fn indent_unit(&self) -> usize {
        self.indent_width.max(1)
    }
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions {
            indent_width: DEFAULT_INDENT_WIDTH,
            max_blank_lines: DEFAULT_MAX_BLANK_LINES,
        }
    }
}
