//! Human-readable dumps of the generator's intermediate results.
//!
//! Used for debugging grammars: the report still prints productions,
//! FIRST/FOLLOW sets and states when the grammar has conflicts, followed by
//! the conflicts instead of the table.

use crate::{
    Automaton, EncodedGrammar, FirstSets, Grammar, GrammarError, assemble, first_sets, follow_sets,
};
use std::collections::BTreeSet;
use std::io::Write;

/// Writes the grammar productions.
///
/// # Output Format
/// ```text
/// PS,<number of productions>
///
/// P,<index>,<LHS> -> <RHS symbols>
/// ```
pub fn write_prods<W: Write>(out: &mut W, g: &EncodedGrammar) -> std::io::Result<()> {
    writeln!(out, "PS,{}\n", g.prods.len())?;
    for i in 0..g.prods.len() {
        writeln!(out, "P,{},{}", i, g.production_string(i))?;
    }
    Ok(())
}

/// Writes FIRST sets (with `` `empty' `` for nullable symbols) and FOLLOW
/// sets of every non-terminal.
pub fn write_first_follow<W: Write>(
    out: &mut W,
    g: &EncodedGrammar,
    fs: &FirstSets,
    follow: &[BTreeSet<usize>],
) -> std::io::Result<()> {
    let join = |set: &BTreeSet<usize>| {
        set.iter()
            .map(|&t| g.name(t))
            .collect::<Vec<_>>()
            .join(", ")
    };
    for nt in 0..g.n_nonterm() {
        let empty = if fs.nullable[nt] { "`empty', " } else { "" };
        writeln!(out, "FIRST,{},{{{}{}}}", g.name(nt), empty, join(&fs.first[nt]))?;
    }
    for (nt, set) in follow.iter().enumerate() {
        writeln!(out, "FOLLOW,{},{{{}}}", g.name(nt), join(set))?;
    }
    Ok(())
}

/// Writes every state with its dotted progressions and lookaheads.
pub fn write_states<W: Write>(
    out: &mut W,
    g: &EncodedGrammar,
    automaton: &Automaton,
) -> std::io::Result<()> {
    writeln!(out, "CS,{}\n", automaton.states.len())?;
    for (i, state) in automaton.states.iter().enumerate() {
        for element in state.elements() {
            let p = element.progression;
            write!(out, "C,{},{} ->", i, g.name(g.head(p.rule)))?;
            for (j, &sym) in g.body(p.rule).iter().enumerate() {
                if j == p.dot {
                    write!(out, " .")?;
                }
                write!(out, " {}", g.name(sym))?;
            }
            if p.is_complete(g) {
                write!(out, " .")?;
            }
            let lookahead: Vec<_> = element.lookahead.iter().map(|&t| g.name(t)).collect();
            writeln!(out, ", [{}]", lookahead.join(" "))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Builds everything for `grammar` and writes the full report.
///
/// Returns the grammar's own errors (undefined symbols, ...) and I/O errors;
/// conflicts are written to `out` instead.
pub fn write_report<W: Write>(out: &mut W, grammar: &Grammar) -> Result<(), GrammarError> {
    let g = EncodedGrammar::encode(grammar)?;
    let fs = first_sets(&g);
    let follow = follow_sets(&g, &fs);
    let automaton = Automaton::build(&g, &fs);

    write_prods(out, &g)?;
    writeln!(out)?;
    write_first_follow(out, &g, &fs, &follow)?;
    writeln!(out)?;
    write_states(out, &g, &automaton)?;
    match assemble(&g, &automaton) {
        Ok(table) => write!(out, "{}", table)?,
        Err(GrammarError::Conflicts(conflicts)) => {
            for conflict in conflicts {
                writeln!(out, "{}", conflict)?;
            }
        }
        Err(err) => return Err(err),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Rule, Symbol};

    fn report(grammar: &Grammar) -> String {
        let mut out = Vec::new();
        write_report(&mut out, grammar).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn reports_sections() {
        let rule = Rule::new("L", [Symbol::nt("L"), Symbol::lit(","), Symbol::t("x")]);
        let grammar = Grammar::new(rule)
            .add(Rule::new("L", [Symbol::t("x")]))
            .lexeme("x", "x");
        let text = report(&grammar);
        assert!(text.starts_with("PS,3\n\nP,0,$root -> L\nP,1,L -> L , x\nP,2,L -> x\n"));
        assert!(text.contains("FIRST,L,{x}\n"));
        assert!(text.contains("FOLLOW,L,{,, $end}\n"));
        assert!(text.contains("C,0,$root -> . L, [$end]\n"));
        assert!(text.contains("C,0,L -> . L , x, [, $end]\n"));
        assert!(text.contains("0,L -> G1\n"));
        assert!(text.contains("1,$end -> A\n"));
    }

    #[test]
    fn reports_conflicts_instead_of_table() {
        let rule = Rule::new("E", [Symbol::nt("E"), Symbol::nt("E")]);
        let grammar = Grammar::new(rule)
            .add(Rule::new("E", [Symbol::lit("a")]));
        let text = report(&grammar);
        assert!(text.contains("shift/reduce conflict"));
        assert!(!text.contains("-> G"));
    }

    #[test]
    fn nullable_first_is_marked() {
        let rule = Rule::new("S", [Symbol::lit("a"), Symbol::nt("S")]);
        let grammar = Grammar::new(rule)
            .add(Rule::new("S", []));
        let text = report(&grammar);
        assert!(text.contains("FIRST,S,{`empty', a}\n"));
        assert!(text.contains("P,2,S -> ε\n"));
    }
}
