//! Compiled LALR(1) parsing table.
//!
//! States and productions are plain integer indices assigned once by the
//! generator. The table has no references back into the automaton it was
//! built from, so it can be cloned, shared between threads and dumped as
//! text.

use indexmap::IndexMap;
use smartstring::alias::String;
use std::fmt::{self, Display};

/// Terminal label standing for end of input.
pub const END: &str = "$end";

/// What the engine does in a given state on a given terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Shift(usize),
    Reduce(usize),
    Accept,
}

impl Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Shift(state) => write!(f, "S{}", state),
            Action::Reduce(rule) => write!(f, "R{}", rule),
            Action::Accept => write!(f, "A"),
        }
    }
}

/// The parts of a production the engine needs for a reduction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Production {
    pub head: String,
    pub len: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Row {
    shift: IndexMap<String, usize>,
    goto: IndexMap<String, usize>,
    reduce: IndexMap<String, usize>,
}

/// Shift, goto and reduce maps keyed by integer state index.
///
/// State 0 is the start state. Production 0 is the augmented root
/// production; reducing it on [`END`] is the accept action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsingTable {
    rows: Vec<Row>,
    productions: Vec<Production>,
    accept: Option<usize>,
}

impl ParsingTable {
    pub fn shift(&self, state: usize, terminal: &str) -> Option<usize> {
        self.rows.get(state)?.shift.get(terminal).copied()
    }

    pub fn goto(&self, state: usize, non_terminal: &str) -> Option<usize> {
        self.rows.get(state)?.goto.get(non_terminal).copied()
    }

    pub fn reduce(&self, state: usize, terminal: &str) -> Option<usize> {
        self.rows.get(state)?.reduce.get(terminal).copied()
    }

    /// The single action for `(state, terminal)`, if any.
    pub fn action(&self, state: usize, terminal: &str) -> Option<Action> {
        if terminal == END && self.accept == Some(state) {
            return Some(Action::Accept);
        }
        self.shift(state, terminal)
            .map(Action::Shift)
            .or_else(|| self.reduce(state, terminal).map(Action::Reduce))
    }

    /// Terminals with an action in `state`, in table order.
    pub fn expected(&self, state: usize) -> Vec<String> {
        let mut expected: Vec<String> = Vec::new();
        if let Some(row) = self.rows.get(state) {
            for terminal in row.shift.keys().chain(row.reduce.keys()) {
                if !expected.contains(terminal) {
                    expected.push(terminal.clone());
                }
            }
        }
        if self.accept == Some(state) && !expected.iter().any(|t| t == END) {
            expected.push(END.into());
        }
        expected
    }

    pub fn states(&self) -> usize {
        self.rows.len()
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn production(&self, rule: usize) -> Option<&Production> {
        self.productions.get(rule)
    }

    pub fn accept_state(&self) -> Option<usize> {
        self.accept
    }

    /// Shift entries of `state` as `(terminal, target)`.
    pub fn shifts(&self, state: usize) -> impl Iterator<Item = (&str, usize)> {
        self.rows
            .get(state)
            .into_iter()
            .flat_map(|row| row.shift.iter().map(|(t, &to)| (t.as_str(), to)))
    }

    /// Goto entries of `state` as `(non-terminal, target)`.
    pub fn gotos(&self, state: usize) -> impl Iterator<Item = (&str, usize)> {
        self.rows
            .get(state)
            .into_iter()
            .flat_map(|row| row.goto.iter().map(|(nt, &to)| (nt.as_str(), to)))
    }

    /// Reduce entries of `state` as `(terminal, rule)`.
    pub fn reductions(&self, state: usize) -> impl Iterator<Item = (&str, usize)> {
        self.rows
            .get(state)
            .into_iter()
            .flat_map(|row| row.reduce.iter().map(|(t, &rule)| (t.as_str(), rule)))
    }
}

impl Display for ParsingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (state, row) in self.rows.iter().enumerate() {
            for (terminal, to) in &row.shift {
                writeln!(f, "{},{} -> S{}", state, terminal, to)?;
            }
            for (non_terminal, to) in &row.goto {
                writeln!(f, "{},{} -> G{}", state, non_terminal, to)?;
            }
            for (terminal, rule) in &row.reduce {
                writeln!(f, "{},{} -> R{}", state, terminal, rule)?;
            }
            if self.accept == Some(state) {
                writeln!(f, "{},{} -> A", state, END)?;
            }
        }
        Ok(())
    }
}

/// Assembles a [`ParsingTable`] entry by entry.
///
/// Each insertion returns the action already present for the same
/// `(state, terminal)` key when it differs from the new one; the caller
/// decides whether that is a conflict. The existing entry is kept.
#[derive(Debug, Clone)]
pub struct TableBuilder {
    table: ParsingTable,
}

impl TableBuilder {
    pub fn new(states: usize, productions: Vec<Production>) -> Self {
        Self {
            table: ParsingTable {
                rows: vec![Row::default(); states],
                productions,
                accept: None,
            },
        }
    }

    fn row(&mut self, state: usize) -> &mut Row {
        if state >= self.table.rows.len() {
            self.table.rows.resize_with(state + 1, Row::default);
        }
        &mut self.table.rows[state]
    }

    fn existing(&self, state: usize, terminal: &str) -> Option<Action> {
        self.table.action(state, terminal)
    }

    pub fn shift(&mut self, state: usize, terminal: &str, to: usize) -> Option<Action> {
        match self.existing(state, terminal) {
            Some(Action::Shift(prev)) if prev == to => None,
            Some(prev) => Some(prev),
            None => {
                self.row(state).shift.insert(terminal.into(), to);
                None
            }
        }
    }

    /// Gotos never conflict with actions; a second, different target for the
    /// same non-terminal is returned as a shift.
    pub fn goto(&mut self, state: usize, non_terminal: &str, to: usize) -> Option<Action> {
        let row = self.row(state);
        match row.goto.get(non_terminal) {
            Some(&prev) if prev != to => Some(Action::Shift(prev)),
            Some(_) => None,
            None => {
                row.goto.insert(non_terminal.into(), to);
                None
            }
        }
    }

    pub fn reduce(&mut self, state: usize, terminal: &str, rule: usize) -> Option<Action> {
        match self.existing(state, terminal) {
            Some(Action::Reduce(prev)) if prev == rule => None,
            Some(prev) => Some(prev),
            None => {
                self.row(state).reduce.insert(terminal.into(), rule);
                None
            }
        }
    }

    pub fn accept(&mut self, state: usize) -> Option<Action> {
        match self.existing(state, END) {
            Some(Action::Accept) => None,
            Some(prev) => Some(prev),
            None => {
                self.row(state);
                self.table.accept = Some(state);
                None
            }
        }
    }

    pub fn finish(self) -> ParsingTable {
        self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn productions() -> Vec<Production> {
        vec![
            Production {
                head: "$root".into(),
                len: 1,
            },
            Production {
                head: "S".into(),
                len: 1,
            },
        ]
    }

    #[test]
    fn builder_reports_conflicting_entries() {
        let mut builder = TableBuilder::new(2, productions());
        assert_eq!(builder.shift(0, "x", 1), None);
        assert_eq!(builder.shift(0, "x", 1), None);
        assert_eq!(builder.reduce(0, "x", 1), Some(Action::Shift(1)));
        assert_eq!(builder.reduce(1, "y", 1), None);
        assert_eq!(builder.reduce(1, "y", 0), Some(Action::Reduce(1)));
        let table = builder.finish();
        assert_eq!(table.action(0, "x"), Some(Action::Shift(1)));
        assert_eq!(table.action(1, "y"), Some(Action::Reduce(1)));
        assert_eq!(table.action(1, "x"), None);
    }

    #[test]
    fn accept_is_an_end_action() {
        let mut builder = TableBuilder::new(1, productions());
        builder.goto(0, "S", 2);
        assert_eq!(builder.accept(2), None);
        let table = builder.finish();
        assert_eq!(table.states(), 3);
        assert_eq!(table.action(2, END), Some(Action::Accept));
        assert_eq!(table.expected(2), vec![String::from(END)]);
        assert_eq!(table.goto(0, "S"), Some(2));
    }

    #[test]
    fn display_lists_every_entry() {
        let mut builder = TableBuilder::new(2, productions());
        builder.shift(0, "x", 1);
        builder.goto(0, "S", 1);
        builder.reduce(1, END, 1);
        let text = builder.finish().to_string();
        assert_eq!(text, "0,x -> S1\n0,S -> G1\n1,$end -> R1\n");
    }

    #[test]
    fn rows_can_be_listed() {
        let mut builder = TableBuilder::new(2, productions());
        builder.shift(0, "x", 1);
        builder.shift(0, "y", 1);
        builder.goto(0, "S", 1);
        builder.reduce(1, END, 1);
        let table = builder.finish();
        assert_eq!(table.shifts(0).collect::<Vec<_>>(), [("x", 1), ("y", 1)]);
        assert_eq!(table.gotos(0).collect::<Vec<_>>(), [("S", 1)]);
        assert_eq!(table.reductions(1).collect::<Vec<_>>(), [(END, 1)]);
        assert_eq!(table.shifts(7).count(), 0);
    }
}
