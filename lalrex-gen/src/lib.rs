//! Copyright (c) 2005–2025 IKH Software, Inc.
//!
//! Released under the terms of the GNU Lesser General Public License, version 3.0
//! or (at your option) any later version (LGPL-3.0-or-later).
//!
//! LALR(1) parser generator.
//!
//! `lalrex-gen` turns a context-free [`Grammar`] into the lexer and parsing
//! table run by the `lalrex` runtime:
//!  * **`grammar`**: symbols, rules, lexemes and ignore patterns
//!  * **`first`**: FIRST/FOLLOW sets with nullability
//!  * **`lalr`**: closure, goto and the core-merging automaton
//!  * **`table`**: table assembly; conflicts are reported, never resolved
//!  * **`rules`**: fluent rule authoring with arity-checked transforms
//!  * **`report`**: text dumps of all of the above for debugging

mod error;
mod first;
mod grammar;
mod lalr;
pub mod report;
mod rules;
mod symtab;
mod table;

pub use crate::error::{Conflict, GrammarError};
pub use crate::first::{FirstSets, first_sets, follow_sets};
pub use crate::grammar::{Grammar, ROOT, Rule, Symbol};
pub use crate::lalr::{
    Automaton, Core, CoreReduction, Lookahead, Progression, State, StateElement, Transition,
};
pub use crate::rules::{Fragment, RuleBuilder, RuleCompiler, RuleError, RuleSet};
pub use crate::symtab::{EncodedGrammar, Symtab};
pub use crate::table::assemble;
