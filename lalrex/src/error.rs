//! Source locations and the errors reported while lexing, parsing and
//! compiling syntax trees.
//!
//! Every failure surfaces as a value: a lexical or syntax error aborts only
//! the parse that produced it, and a compile error aborts only that compile
//! pass. The table and lexer stay reusable, and a syntax tree that failed to
//! compile can still be inspected.
//!
//! # Examples
//!
//! ```rust
//! # use lalrex::{Position, Span, span};
//! let sp = Span::new(Position::new(0, 2), Position::new(0, 5));
//! assert!(!sp.is_empty());
//! assert_eq!(sp.line_range(), (0, 0));
//! assert_eq!(span!(0, 2, 0, 5), Some(sp));
//! ```

use crate::Token;
use regex_automata::meta::BuildError;
use smartstring::alias::String;
use std::fmt::{self, Debug, Display};
use thiserror::Error;

/// A 0-based line/column position in source text.
///
/// Columns count characters, not bytes. `Display` renders the position
/// 1-based, the way editors show it.
#[derive(Debug, Clone, Default, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// 0-based line number.
    pub line: usize,
    /// 0-based column number (character position in the line).
    pub column: usize,
}

impl Position {
    /// Creates a new `Position`.
    #[inline]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line + 1, self.column + 1)
    }
}

/// A half-open source range: `[start, end)`.
///
/// `Span` marks the region of source text that a token or syntax tree node
/// covers.
#[derive(Debug, Clone, Default, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    /// Creates a new `Span`.
    #[inline]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Merge with another span by covering both.
    pub fn merge(&self, other: &Span) -> Span {
        let start = if self.start <= other.start {
            self.start
        } else {
            other.start
        };
        let end = if self.end >= other.end {
            self.end
        } else {
            other.end
        };
        Span { start, end }
    }

    /// Is this span empty (start == end)?
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns the inclusive line range spanned by this `Span`.
    #[inline]
    pub fn line_range(&self) -> (usize, usize) {
        (self.start.line, self.end.line)
    }
}

/// A regex pattern handed to the lexer could not be compiled.
#[derive(Debug, Error)]
pub enum LexerError {
    #[error("invalid pattern {pattern:?} for lexeme {label}: {source}")]
    Pattern {
        /// Label of the rule, or `ignore` for an ignore pattern.
        label: String,
        pattern: String,
        #[source]
        source: BuildError,
    },
}

/// No lexical rule or ignore pattern matches at `position`.
///
/// Carries the unmatched remainder of the input so the caller can show what
/// the lexer choked on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized input {:?} at {position}", preview(.remaining))]
pub struct LexicalError {
    pub position: Position,
    /// Byte offset of `position` in the input.
    pub offset: usize,
    /// Input text from `offset` to the end.
    pub remaining: String,
}

/// The parsing table has no action for the current state and lookahead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unexpected {} at {position}{}", found_display(.found), expected_display(.expected))]
pub struct SyntaxError {
    /// The offending token; `None` when the input ended too early.
    pub found: Option<Token>,
    pub position: Position,
    /// Terminals the parser would have accepted in this state.
    pub expected: Vec<String>,
}

/// Failure of a single parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("lexical error: {0}")]
    Lexical(#[from] LexicalError),

    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    /// The table contradicts itself (stack underflow or a missing goto).
    /// Only hand-assembled tables can get here.
    #[error("inconsistent parsing table in state {state}: {message}")]
    Table { state: usize, message: String },
}

impl ParseError {
    /// Position the error refers to, when it has one.
    pub fn position(&self) -> Option<Position> {
        match self {
            ParseError::Lexical(err) => Some(err.position),
            ParseError::Syntax(err) => Some(err.position),
            ParseError::Table { .. } => None,
        }
    }
}

/// Failure of a tree-compile pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The parse that was meant to produce the tree had already failed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A handler received a child shape it does not recognize for its label.
    #[error("internal error compiling {label} -> {children}")]
    Internal { label: String, children: String },

    /// A handler rejected well-formed input (e.g. division by zero).
    #[error("cannot compile {label}: {message}")]
    Semantic { label: String, message: String },
}

impl CompileError {
    /// Builds an [`CompileError::Internal`] listing the received children.
    pub fn internal<V: Debug>(label: &str, children: &[V]) -> Self {
        let children = children
            .iter()
            .map(|child| format!("{:?}", child))
            .collect::<Vec<_>>()
            .join(" ");
        CompileError::Internal {
            label: label.into(),
            children: children.into(),
        }
    }

    /// Builds a [`CompileError::Semantic`] from any displayable error.
    pub fn semantic(label: &str, err: impl Display) -> Self {
        CompileError::Semantic {
            label: label.into(),
            message: format!("{:#}", err).into(),
        }
    }
}

fn preview(text: &str) -> std::string::String {
    const MAX: usize = 16;
    let mut out: std::string::String = text.chars().take(MAX).collect();
    if text.chars().nth(MAX).is_some() {
        out.push('…');
    }
    out
}

fn found_display(found: &Option<Token>) -> std::string::String {
    match found {
        Some(token) if token.label == token.value => format!("{:?}", token.value.as_str()),
        Some(token) => format!("{} {:?}", token.label, token.value.as_str()),
        None => "end of input".to_owned(),
    }
}

fn expected_display(expected: &[String]) -> std::string::String {
    if expected.is_empty() {
        return std::string::String::new();
    }
    let list = expected
        .iter()
        .map(|label| label.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!(", expected one of: {}", list)
}

/// Build an `Option<Span>` inline from 0-based line/column coordinates.
///
/// # Examples
///
/// ```rust
/// # use lalrex::span;
/// let s = span!(0, 0, 1, 4);
/// assert_eq!(s.unwrap().end.column, 4);
/// ```
#[macro_export]
macro_rules! span {
    ($line_start:expr, $col_start:expr, $line_end:expr, $col_end:expr) => {
        Some($crate::Span {
            start: $crate::Position {
                line: $line_start,
                column: $col_start,
            },
            end: $crate::Position {
                line: $line_end,
                column: $col_end,
            },
        })
    };
}
