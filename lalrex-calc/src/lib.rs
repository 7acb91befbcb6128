//! # lalrex-calc
//!
//! An integer calculator built on **lalrex**, showing the whole pipeline from
//! grammar to value:
//!
//! - [`grammar`] declares the calculator grammar with [`lalrex_gen::Grammar`],
//!   from which the lexer and the LALR(1) table are generated.
//! - [`calc`] compiles parse trees twice over with label-dispatched
//!   [`lalrex::Handlers`]: once to a number and once to parenthesized text.
//! - [`fluent`] writes the same calculator with [`lalrex_gen::RuleSet`],
//!   attaching the arithmetic to each production.
//! - [`error`] gathers every failure into [`CalcError`].
//!
//! ## Example
//!
//! ```rust
//! use lalrex_calc::{Calculator, RuleCalculator};
//!
//! let calc = Calculator::shared().unwrap();
//! assert_eq!(calc.evaluate("1 + 2 * 3").unwrap(), 7);
//!
//! let fluent = RuleCalculator::new().unwrap();
//! assert_eq!(fluent.evaluate("(1 + 2) * 3").unwrap(), 9);
//! ```
pub mod calc;
pub mod error;
pub mod fluent;
pub mod grammar;

pub use calc::{CalcValue, Calculator, evaluator, printer};
pub use error::CalcError;
pub use fluent::{RuleCalculator, calculator_rules};
pub use grammar::{addition_grammar, calculator_grammar};
