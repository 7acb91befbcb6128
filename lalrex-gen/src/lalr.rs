// This module defines the LALR(1) item machinery: dotted productions with
// lookahead sets, closure, goto, and automaton construction with core
// merging.

use crate::{EncodedGrammar, FirstSets};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

/// A production with a dot marking how much of its body has been matched.
///
/// `dot` counts body symbols, so `dot == 0` is `A → • α` and
/// `dot == body.len()` is a completed production.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Progression {
    /// The index of the production in the grammar.
    pub rule: usize,
    pub dot: usize,
}

impl Progression {
    /// Symbol right after the dot, if any.
    pub fn next(&self, g: &EncodedGrammar) -> Option<usize> {
        g.body(self.rule).get(self.dot).copied()
    }

    pub fn is_complete(&self, g: &EncodedGrammar) -> bool {
        self.dot == g.body(self.rule).len()
    }

    fn advanced(&self) -> Self {
        Progression {
            rule: self.rule,
            dot: self.dot + 1,
        }
    }
}

/// Terminal ids that may follow a reduction.
pub type Lookahead = BTreeSet<usize>;

/// The progressions of a state, ignoring lookahead. States with equal cores
/// are one LALR state.
pub type Core = BTreeSet<Progression>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateElement {
    pub progression: Progression,
    pub lookahead: Lookahead,
}

/// A set of state elements; elements with the same progression are kept
/// as one with the union of their lookaheads.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct State {
    elements: BTreeMap<Progression, Lookahead>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `element`, returning `true` if the state grew (new progression or
    /// new lookahead terminal).
    pub fn insert(&mut self, element: StateElement) -> bool {
        let is_new = !self.elements.contains_key(&element.progression);
        let entry = self.elements.entry(element.progression).or_default();
        let before = entry.len();
        entry.extend(element.lookahead);
        is_new || entry.len() > before
    }

    /// Union `other` into this state, returning `true` if anything grew.
    pub fn union(&mut self, other: &State) -> bool {
        let mut grew = false;
        for (progression, lookahead) in &other.elements {
            grew |= self.insert(StateElement {
                progression: *progression,
                lookahead: lookahead.clone(),
            });
        }
        grew
    }

    pub fn core(&self) -> Core {
        self.elements.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn lookahead(&self, progression: &Progression) -> Option<&Lookahead> {
        self.elements.get(progression)
    }

    pub fn elements(&self) -> impl Iterator<Item = StateElement> + '_ {
        self.elements.iter().map(|(progression, lookahead)| StateElement {
            progression: *progression,
            lookahead: lookahead.clone(),
        })
    }

    /// Computes the LALR(1) closure of this state.
    ///
    /// For every element `A → α • B β, L` with non-terminal `B`, adds
    /// `B → • γ` for each production of `B`, with lookahead FIRST(β), plus
    /// `L` when β is nullable. An element whose lookahead grows is expanded
    /// again, so the result is a fixpoint.
    pub fn closure(&self, g: &EncodedGrammar, fs: &FirstSets) -> State {
        let mut c = self.clone();
        let mut work: Vec<Progression> = c.elements.keys().copied().collect();
        while let Some(item) = work.pop() {
            let Some(b) = item.next(g) else {
                continue;
            };
            if !g.is_nonterm(b) {
                continue;
            }
            let (mut lookahead, beta_nullable) = fs.of_sequence(&g.body(item.rule)[item.dot + 1..]);
            if beta_nullable {
                if let Some(own) = c.elements.get(&item) {
                    lookahead.extend(own.iter().copied());
                }
            }
            for &rule in g.rules_for(b) {
                let progression = Progression { rule, dot: 0 };
                if c.insert(StateElement {
                    progression,
                    lookahead: lookahead.clone(),
                }) {
                    work.push(progression);
                }
            }
        }
        c
    }

    /// Groups elements by the symbol after the dot and advances the dot
    /// past it. The returned kernels are not closed.
    pub fn advance(&self, g: &EncodedGrammar) -> BTreeMap<usize, State> {
        let mut kernels: BTreeMap<usize, State> = BTreeMap::new();
        for (item, lookahead) in &self.elements {
            if let Some(sym) = item.next(g) {
                kernels.entry(sym).or_default().insert(StateElement {
                    progression: item.advanced(),
                    lookahead: lookahead.clone(),
                });
            }
        }
        kernels
    }

    /// Computes the *goto* of this state on `sym`: the closure of the
    /// elements advanced past `sym`. Empty if no element expects `sym`.
    pub fn goto(&self, sym: usize, g: &EncodedGrammar, fs: &FirstSets) -> State {
        self.advance(g)
            .remove(&sym)
            .map(|kernel| kernel.closure(g, fs))
            .unwrap_or_default()
    }

    /// `(rule, lookahead)` for every completed element.
    pub fn reductions<'a>(
        &'a self,
        g: &'a EncodedGrammar,
    ) -> impl Iterator<Item = (usize, &'a Lookahead)> + 'a {
        self.elements
            .iter()
            .filter(move |(item, _)| item.is_complete(g))
            .map(|(item, lookahead)| (item.rule, lookahead))
    }
}

/// An edge of the automaton; a shift when `symbol` is a terminal, a goto
/// otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Transition {
    pub from: usize,
    pub symbol: usize,
    pub to: usize,
}

/// In `state`, on `terminal`, reduce by `rule`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CoreReduction {
    pub state: usize,
    pub terminal: usize,
    pub rule: usize,
}

/// The LALR(1) automaton: states indexed by discovery order and the
/// transitions between them.
#[derive(Clone, Debug)]
pub struct Automaton {
    pub states: Vec<State>,
    pub transitions: Vec<Transition>,
}

impl Automaton {
    /// Builds the automaton breadth-first from the closure of
    /// `$root → • S, {$end}`.
    ///
    /// A successor whose core is already known is merged into the existing
    /// state. If the merge adds lookaheads, that state is queued again so
    /// the new lookaheads reach its successors.
    pub fn build(g: &EncodedGrammar, fs: &FirstSets) -> Self {
        let mut start = State::new();
        start.insert(StateElement {
            progression: Progression { rule: 0, dot: 0 },
            lookahead: Lookahead::from([g.end()]),
        });
        let start = start.closure(g, fs);

        let mut index: HashMap<Core, usize> = HashMap::from([(start.core(), 0)]);
        let mut states = vec![start];
        let mut edges: BTreeMap<(usize, usize), usize> = BTreeMap::new();
        let mut queue = VecDeque::from([0]);
        let mut queued = vec![true];
        let mut merges = 0usize;

        while let Some(from) = queue.pop_front() {
            queued[from] = false;
            for (symbol, kernel) in states[from].advance(g) {
                let next = kernel.closure(g, fs);
                let core = next.core();
                let to = match index.get(&core) {
                    Some(&to) => {
                        if states[to].union(&next) {
                            merges += 1;
                            if !queued[to] {
                                queued[to] = true;
                                queue.push_back(to);
                            }
                        }
                        to
                    }
                    None => {
                        let to = states.len();
                        index.insert(core, to);
                        states.push(next);
                        queued.push(true);
                        queue.push_back(to);
                        to
                    }
                };
                edges.insert((from, symbol), to);
            }
        }

        let transitions: Vec<Transition> = edges
            .into_iter()
            .map(|((from, symbol), to)| Transition { from, symbol, to })
            .collect();
        log::debug!(
            "LALR automaton: {} states, {} transitions, {} lookahead merges",
            states.len(),
            transitions.len(),
            merges
        );
        Automaton {
            states,
            transitions,
        }
    }

    /// Every reduce instruction, ordered by state, terminal and rule.
    pub fn reductions(&self, g: &EncodedGrammar) -> Vec<CoreReduction> {
        let mut out: Vec<CoreReduction> = self
            .states
            .iter()
            .enumerate()
            .flat_map(|(state, s)| {
                s.reductions(g).flat_map(move |(rule, lookahead)| {
                    lookahead.iter().map(move |&terminal| CoreReduction {
                        state,
                        terminal,
                        rule,
                    })
                })
            })
            .collect();
        out.sort();
        out
    }

    /// Index of the state whose core equals `core`.
    pub fn find(&self, core: &Core) -> Option<usize> {
        self.states.iter().position(|s| s.core() == *core)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Grammar, Rule, Symbol, first_sets};

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn encode(grammar: &Grammar) -> (EncodedGrammar, FirstSets) {
        let g = EncodedGrammar::encode(grammar).unwrap();
        let fs = first_sets(&g);
        (g, fs)
    }

    // S -> C C ; C -> c C | d
    fn dragon() -> Grammar {
        Grammar::new(Rule::new("S", [Symbol::nt("C"), Symbol::nt("C")]))
            .add(Rule::new("C", [Symbol::lit("c"), Symbol::nt("C")]))
            .add(Rule::new("C", [Symbol::lit("d")]))
    }

    #[test]
    fn start_state_closure() {
        let (g, fs) = encode(&dragon());
        let mut kernel = State::new();
        kernel.insert(StateElement {
            progression: Progression { rule: 0, dot: 0 },
            lookahead: Lookahead::from([g.end()]),
        });
        let start = kernel.closure(&g, &fs);
        assert_eq!(start.len(), 4);
        let c = g.n_nonterm() + g.terms.idx("c").unwrap();
        let d = g.n_nonterm() + g.terms.idx("d").unwrap();
        let la = start.lookahead(&Progression { rule: 2, dot: 0 }).unwrap();
        assert_eq!(*la, Lookahead::from([c, d]));
        let la = start.lookahead(&Progression { rule: 1, dot: 0 }).unwrap();
        assert_eq!(*la, Lookahead::from([g.end()]));
    }

    #[test]
    fn closure_is_idempotent() {
        let (g, fs) = encode(&dragon());
        let automaton = Automaton::build(&g, &fs);
        for state in &automaton.states {
            assert_eq!(state.closure(&g, &fs), *state);
        }
    }

    #[test]
    fn equal_cores_merge() {
        init_logger();
        let (g, fs) = encode(&dragon());
        let automaton = Automaton::build(&g, &fs);
        // LR(1) has 10 states here; LALR merges the c/d pairs down to 7.
        assert_eq!(automaton.states.len(), 7);
        let cores: BTreeSet<Core> = automaton.states.iter().map(State::core).collect();
        assert_eq!(cores.len(), 7);

        let c = g.n_nonterm() + g.terms.idx("c").unwrap();
        let d = g.n_nonterm() + g.terms.idx("d").unwrap();
        let done = Core::from([Progression { rule: 3, dot: 1 }]);
        let state = automaton.find(&done).unwrap();
        let la = automaton.states[state]
            .lookahead(&Progression { rule: 3, dot: 1 })
            .unwrap();
        assert_eq!(*la, Lookahead::from([c, d, g.end()]));
    }

    #[test]
    fn goto_matches_transitions() {
        let (g, fs) = encode(&dragon());
        let automaton = Automaton::build(&g, &fs);
        for t in &automaton.transitions {
            let next = automaton.states[t.from].goto(t.symbol, &g, &fs);
            assert_eq!(automaton.find(&next.core()), Some(t.to));
        }
        assert!(automaton.states[0].goto(g.end(), &g, &fs).is_empty());
    }

    #[test]
    fn reductions_follow_lookaheads() {
        let (g, fs) = encode(&dragon());
        let automaton = Automaton::build(&g, &fs);
        let reductions = automaton.reductions(&g);
        let root = reductions.iter().filter(|r| r.rule == 0).collect::<Vec<_>>();
        assert_eq!(root.len(), 1);
        assert_eq!(root[0].terminal, g.end());
        // C -> d reduces on c, d and $end after merging.
        assert_eq!(reductions.iter().filter(|r| r.rule == 3).count(), 3);
    }

    #[test]
    fn empty_productions_complete_immediately() {
        // S -> A b ; A -> ε
        let grammar = Grammar::new(Rule::new("S", [Symbol::nt("A"), Symbol::lit("b")]))
            .add(Rule::new("A", []));
        let (g, fs) = encode(&grammar);
        let automaton = Automaton::build(&g, &fs);
        let b = g.n_nonterm() + g.terms.idx("b").unwrap();
        assert!(
            automaton
                .reductions(&g)
                .contains(&CoreReduction { state: 0, terminal: b, rule: 2 })
        );
    }
}
