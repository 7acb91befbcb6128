// FIRST/FOLLOW computation over an encoded grammar.

use crate::EncodedGrammar;
use std::collections::BTreeSet;

/// FIRST sets and nullability, indexed by symbol id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstSets {
    pub first: Vec<BTreeSet<usize>>,
    pub nullable: Vec<bool>,
}

impl FirstSets {
    /// FIRST of a symbol sequence and whether the whole sequence is nullable.
    pub fn of_sequence(&self, seq: &[usize]) -> (BTreeSet<usize>, bool) {
        let mut out = BTreeSet::new();
        for &sym in seq {
            out.extend(self.first[sym].iter().copied());
            if !self.nullable[sym] {
                return (out, false);
            }
        }
        (out, true)
    }
}

/// Computes FIRST sets and nullability for all grammar symbols.
///
/// FIRST(t) is `{t}` for a terminal. For non-terminals the sets grow in a
/// fixpoint loop until no production adds anything, which handles direct
/// and mutual recursion. An empty production makes its head nullable, and
/// a nullable prefix lets FIRST of the next body symbol through.
pub fn first_sets(g: &EncodedGrammar) -> FirstSets {
    let n_sym = g.n_sym();
    let mut first: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n_sym];
    let mut nullable = vec![false; n_sym];
    for t in g.n_nonterm()..n_sym {
        first[t].insert(t);
    }
    let mut changed = true;
    while changed {
        changed = false;
        for prod in &g.prods {
            let lhs = prod[0];
            let mut all_nullable = true;
            for &sym in &prod[1..] {
                if sym != lhs {
                    // Clone FIRST(sym) to avoid simultaneous borrow
                    let first_sym = first[sym].clone();
                    for f in first_sym {
                        if first[lhs].insert(f) {
                            changed = true;
                        }
                    }
                }
                if !nullable[sym] {
                    all_nullable = false;
                    break;
                }
            }
            if all_nullable && !nullable[lhs] {
                nullable[lhs] = true;
                changed = true;
            }
        }
    }
    FirstSets { first, nullable }
}

/// Computes FOLLOW sets for all non-terminals.
///
/// FOLLOW(`$root`) holds the end-of-input terminal. For every occurrence
/// `A -> α B β`, FIRST(β) flows into FOLLOW(B), and FOLLOW(A) does too when
/// β is nullable.
pub fn follow_sets(g: &EncodedGrammar, fs: &FirstSets) -> Vec<BTreeSet<usize>> {
    let n_nonterm = g.n_nonterm();
    let mut follow: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n_nonterm];
    follow[0].insert(g.end());
    let mut changed = true;
    while changed {
        changed = false;
        for prod in &g.prods {
            let lhs = prod[0];
            let rhs = &prod[1..];
            for (i, &b) in rhs.iter().enumerate() {
                if !g.is_nonterm(b) {
                    continue;
                }
                let (first_beta, beta_nullable) = fs.of_sequence(&rhs[i + 1..]);
                for f in first_beta {
                    if follow[b].insert(f) {
                        changed = true;
                    }
                }
                if beta_nullable && lhs != b {
                    let follow_lhs = follow[lhs].clone();
                    for f in follow_lhs {
                        if follow[b].insert(f) {
                            changed = true;
                        }
                    }
                }
            }
        }
    }
    follow
}
