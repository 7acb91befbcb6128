use crate::{Automaton, Conflict, EncodedGrammar, GrammarError};
use lalrex::{Action, ParsingTable, Production, TableBuilder};

/// Lay the automaton out as a [`ParsingTable`].
///
/// Transitions on terminals become shifts and transitions on non-terminals
/// become gotos. Every reduction then claims its `(state, terminal)` entry;
/// reducing the root production on end of input is the accept action.
/// Any entry claimed twice is a conflict. All conflicts are collected and
/// returned together; no partial table is produced.
pub fn assemble(g: &EncodedGrammar, automaton: &Automaton) -> Result<ParsingTable, GrammarError> {
    let productions = (0..g.prods.len())
        .map(|rule| Production {
            head: g.name(g.head(rule)).into(),
            len: g.body(rule).len(),
        })
        .collect();
    let mut table = TableBuilder::new(automaton.states.len(), productions);

    for t in &automaton.transitions {
        let name = g.name(t.symbol);
        if g.is_nonterm(t.symbol) {
            table.goto(t.from, name, t.to);
        } else {
            table.shift(t.from, name, t.to);
        }
    }

    let mut conflicts = Vec::new();
    for r in automaton.reductions(g) {
        let terminal = g.name(r.terminal);
        let prev = if r.rule == 0 && r.terminal == g.end() {
            table.accept(r.state)
        } else {
            table.reduce(r.state, terminal, r.rule)
        };
        let Some(prev) = prev else {
            continue;
        };
        let conflict = match prev {
            Action::Shift(to) => Conflict::ShiftReduce {
                state: r.state,
                terminal: terminal.into(),
                to,
                rule: r.rule,
                production: g.production_string(r.rule).into(),
            },
            Action::Reduce(other) => Conflict::ReduceReduce {
                state: r.state,
                terminal: terminal.into(),
                rules: (other, r.rule),
                productions: (
                    g.production_string(other).into(),
                    g.production_string(r.rule).into(),
                ),
            },
            Action::Accept => Conflict::ReduceReduce {
                state: r.state,
                terminal: terminal.into(),
                rules: (0, r.rule),
                productions: (
                    g.production_string(0).into(),
                    g.production_string(r.rule).into(),
                ),
            },
        };
        log::debug!("{}", conflict);
        conflicts.push(conflict);
    }

    if !conflicts.is_empty() {
        return Err(GrammarError::Conflicts(conflicts));
    }
    let table = table.finish();
    log::debug!(
        "parsing table: {} states, {} productions",
        table.states(),
        table.productions().len()
    );
    Ok(table)
}
