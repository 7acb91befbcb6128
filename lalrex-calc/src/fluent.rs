//! The calculator written with [`RuleSet`]: each production carries its own
//! arithmetic, so no label dispatch is needed at compile time.

use crate::CalcError;
use anyhow::{Context, bail};
use lalrex::Parser;
use lalrex_gen::{RuleCompiler, RuleError, RuleSet};

fn checked(value: Option<i64>) -> anyhow::Result<i64> {
    value.context("integer overflow")
}

/// Calculator rules with the same shape as
/// [`calculator_grammar`](crate::calculator_grammar).
pub fn calculator_rules() -> Result<RuleSet<i64>, RuleError> {
    let mut rules = RuleSet::<i64>::new();
    rules
        .rule("A")
        .nt("A")
        .lit("+")
        .nt("M")
        .to2(|a, b| checked(a.checked_add(b)))?
        .rule("A")
        .nt("A")
        .lit("-")
        .nt("M")
        .to2(|a, b| checked(a.checked_sub(b)))?
        .rule("A")
        .nt("M")
        .to1(Ok)?
        .rule("M")
        .nt("M")
        .lit("*")
        .nt("U")
        .to2(|a, b| checked(a.checked_mul(b)))?
        .rule("M")
        .nt("M")
        .lit("/")
        .nt("U")
        .to2(|a, b| {
            if b == 0 {
                bail!("division by zero");
            }
            checked(a.checked_div(b))
        })?
        .rule("M")
        .nt("U")
        .to1(Ok)?
        .rule("U")
        .term("n")
        .to1(Ok)?
        .rule("U")
        .lit("(")
        .nt("A")
        .lit(")")
        .to1(Ok)?
        .lexeme("n", r"\d+", |text| Ok(text.parse()?))
        .ignore(r"\s+");
    Ok(rules)
}

/// Evaluator built from [`calculator_rules`].
#[derive(Debug)]
pub struct RuleCalculator {
    parser: Parser,
    compiler: RuleCompiler<i64>,
}

impl RuleCalculator {
    pub fn new() -> Result<Self, CalcError> {
        let (grammar, compiler) = calculator_rules()?.build()?;
        let parser = grammar.build_parser()?;
        log::debug!("rule calculator: {} states", parser.table().states());
        Ok(Self { parser, compiler })
    }

    pub fn evaluate(&self, text: &str) -> Result<i64, CalcError> {
        let tree = self.parser.parse(text)?;
        Ok(self.compiler.compile(&tree)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Calculator;
    use lalrex::CompileError;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn agrees_with_handler_calculator() {
        init_logger();
        let fluent = RuleCalculator::new().unwrap();
        let handlers = Calculator::new().unwrap();
        for text in ["1", "2+3*4", "(2+3)*4", "100 / 7 - 3", "((8)) - 2 * (1 + 1)"] {
            assert_eq!(
                fluent.evaluate(text).unwrap(),
                handlers.evaluate(text).unwrap(),
                "{}",
                text
            );
        }
    }

    #[test]
    fn division_by_zero_is_reported_by_the_production() {
        init_logger();
        let calc = RuleCalculator::new().unwrap();
        let err = calc.evaluate("4 / (1 - 1)").unwrap_err();
        let CalcError::Compile(CompileError::Semantic { label, message }) = err else {
            panic!("expected a semantic error");
        };
        assert_eq!(label, "M");
        assert_eq!(message, "division by zero");
    }

    #[test]
    fn token_constructor_errors_carry_the_lexeme() {
        init_logger();
        let calc = RuleCalculator::new().unwrap();
        let err = calc.evaluate("1 + 99999999999999999999").unwrap_err();
        assert!(matches!(
            err,
            CalcError::Compile(CompileError::Semantic { ref label, .. }) if label == "n"
        ));
    }

    #[test]
    fn syntax_errors_pass_through() {
        let calc = RuleCalculator::new().unwrap();
        assert!(matches!(calc.evaluate("1 +"), Err(CalcError::Parse(_))));
    }

    #[test]
    fn long_inputs_evaluate() {
        let calc = RuleCalculator::new().unwrap();
        let text = vec!["2"; 100_000].join(" * 1 + ");
        assert_eq!(calc.evaluate(&text).unwrap(), 200_000);
    }
}
