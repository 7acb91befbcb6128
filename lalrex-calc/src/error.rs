//! # Calculator Error Type
//!
//! [`CalcError`] is the single error surface of the calculator. It wraps the
//! failures of each pipeline stage:
//!
//! - **Grammar construction** (lexer or table could not be built),
//! - **Fluent rule authoring** (arity mismatches),
//! - **Parsing** (lexical and syntax errors),
//! - **Evaluation** (handler errors such as division by zero).
//!
//! `#[from]` conversions let `?` propagate each of them.
use lalrex::{CompileError, ParseError};
use lalrex_gen::{GrammarError, RuleError};
use thiserror::Error;

/// Represents all possible errors that can occur within the calculator.
///
/// # Examples
/// Propagating a parse failure:
/// ```rust
/// # use lalrex_calc::{CalcError, Calculator};
/// let calc = Calculator::new().unwrap();
/// let err = calc.evaluate("2+").unwrap_err();
/// assert!(matches!(err, CalcError::Parse(_)));
/// ```
#[derive(Debug, Error)]
pub enum CalcError {
    #[error("grammar error: {0}")]
    Grammar(#[from] GrammarError),

    #[error("rule error: {0}")]
    Rule(#[from] RuleError),

    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("{0}")]
    Compile(#[from] CompileError),
}

impl CalcError {
    /// The parse error behind this error, whether it surfaced while parsing
    /// or while compiling a parse result.
    pub fn parse_error(&self) -> Option<&ParseError> {
        match self {
            CalcError::Parse(err) | CalcError::Compile(CompileError::Parse(err)) => Some(err),
            _ => None,
        }
    }
}
