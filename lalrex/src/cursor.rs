use crate::{Position, Span};

/// Tracks the current scan position over a string.
///
/// `LexerCursor` keeps the byte offset used for slicing the input in step
/// with the character-based line/column position reported to users.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LexerCursor {
    /// Byte offset into the input.
    pub offset: usize,
    pub position: Position,
}

impl LexerCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance over `text`, which must be the input slice starting at
    /// `self.offset`, and return the span it covers.
    pub fn advance(&mut self, text: &str) -> Span {
        let start = self.position;
        for c in text.chars() {
            if c == '\n' {
                self.position.line += 1;
                self.position.column = 0;
            } else {
                self.position.column += 1;
            }
        }
        self.offset += text.len();
        Span::new(start, self.position)
    }
}
