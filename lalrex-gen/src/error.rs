use lalrex::LexerError;
use smartstring::alias::String;
use std::fmt::{self, Display};
use thiserror::Error;

/// Two actions competing for the same `(state, terminal)` table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    ShiftReduce {
        state: usize,
        terminal: String,
        /// Target of the shift.
        to: usize,
        rule: usize,
        production: String,
    },
    ReduceReduce {
        state: usize,
        terminal: String,
        rules: (usize, usize),
        productions: (String, String),
    },
}

impl Conflict {
    pub fn state(&self) -> usize {
        match self {
            Conflict::ShiftReduce { state, .. } | Conflict::ReduceReduce { state, .. } => *state,
        }
    }

    pub fn terminal(&self) -> &str {
        match self {
            Conflict::ShiftReduce { terminal, .. } | Conflict::ReduceReduce { terminal, .. } => {
                terminal
            }
        }
    }
}

impl Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conflict::ShiftReduce {
                state,
                terminal,
                to,
                rule,
                production,
            } => write!(
                f,
                "shift/reduce conflict in state {} on {}: shift to {} or reduce R{} ({})",
                state, terminal, to, rule, production
            ),
            Conflict::ReduceReduce {
                state,
                terminal,
                rules,
                productions,
            } => write!(
                f,
                "reduce/reduce conflict in state {} on {}: R{} ({}) or R{} ({})",
                state, terminal, rules.0, productions.0, rules.1, productions.1
            ),
        }
    }
}

/// Reasons a grammar cannot be turned into a lexer or parsing table.
#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("grammar has no rules")]
    Empty,

    #[error("non-terminal {name} has no rules")]
    UndefinedNonTerminal { name: String },

    #[error("terminal {name} has no lexeme")]
    UndefinedTerminal { name: String },

    #[error("lexeme {name} is defined as both {first:?} and {second:?}")]
    LexemeRedefined {
        name: String,
        first: String,
        second: String,
    },

    #[error("constant {name:?} has the same label as a lexeme")]
    ConstantShadowsLexeme { name: String },

    #[error("{name} is a reserved symbol name")]
    ReservedName { name: String },

    #[error("grammar is not LALR(1): {}", list(.0))]
    Conflicts(Vec<Conflict>),

    #[error(transparent)]
    Lexer(#[from] LexerError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn list(conflicts: &[Conflict]) -> std::string::String {
    conflicts
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
