//! # calc
//!
//! Two interpretations of [`calculator_grammar`] over the same parser: an
//! evaluator producing integers and a printer producing fully parenthesized
//! text. Both are [`Handlers`] keyed by `(label, arity)`.
//!
//! ## Example
//! ```rust
//! # use lalrex_calc::Calculator;
//! let calc = Calculator::new().unwrap();
//! assert_eq!(calc.evaluate("2+3*4").unwrap(), 14);
//! assert_eq!(calc.print("2+3*4").unwrap(), "(2 + (3 * 4))");
//! ```

use crate::{CalcError, calculator_grammar};
use lalrex::{CompileError, Handlers, Node, Parser};
use once_cell::sync::OnceCell;

/// Value of a calculator tree node: a number, or the text of an operator or
/// parenthesis leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalcValue {
    Number(i64),
    Symbol(String),
}

fn number(label: &str, text: &str) -> Result<CalcValue, CompileError> {
    text.parse()
        .map(CalcValue::Number)
        .map_err(|err| CompileError::semantic(label, err))
}

fn binary(label: &str, children: Vec<CalcValue>) -> Result<CalcValue, CompileError> {
    let [CalcValue::Number(a), CalcValue::Symbol(op), CalcValue::Number(b)] = children.as_slice()
    else {
        return Err(CompileError::internal(label, &children));
    };
    let (a, b) = (*a, *b);
    let value = match op.as_str() {
        "+" => a.checked_add(b),
        "-" => a.checked_sub(b),
        "*" => a.checked_mul(b),
        "/" if b == 0 => return Err(CompileError::semantic(label, "division by zero")),
        "/" => a.checked_div(b),
        _ => return Err(CompileError::internal(label, &children)),
    };
    value
        .map(CalcValue::Number)
        .ok_or_else(|| CompileError::semantic(label, "integer overflow"))
}

fn single(children: Vec<CalcValue>) -> Result<CalcValue, CompileError> {
    match <[CalcValue; 1]>::try_from(children) {
        Ok([value]) => Ok(value),
        Err(children) => Err(CompileError::internal("unit", &children)),
    }
}

fn parenthesized(label: &str, children: Vec<CalcValue>) -> Result<CalcValue, CompileError> {
    match <[CalcValue; 3]>::try_from(children) {
        Ok([CalcValue::Symbol(_), value @ CalcValue::Number(_), CalcValue::Symbol(_)]) => Ok(value),
        Ok(children) => Err(CompileError::internal(label, children.as_slice())),
        Err(children) => Err(CompileError::internal(label, &children)),
    }
}

/// Handlers computing the integer value of a calculator tree.
///
/// Division truncates toward zero. Division by zero and overflow are
/// [`CompileError::Semantic`] errors.
pub fn evaluator() -> Handlers<CalcValue> {
    Handlers::new()
        .terminal("n", number)
        .any_terminal(|_, text| Ok(CalcValue::Symbol(text.into())))
        .non_terminal("A", 3, |children| binary("A", children))
        .non_terminal("A", 1, single)
        .non_terminal("M", 3, |children| binary("M", children))
        .non_terminal("M", 1, single)
        .non_terminal("U", 1, single)
        .non_terminal("U", 3, |children| parenthesized("U", children))
}

/// Handlers rendering a calculator tree with every operation in
/// parentheses, e.g. `1+2*3` as `(1 + (2 * 3))`.
pub fn printer() -> Handlers<String> {
    fn infix(children: Vec<String>) -> Result<String, CompileError> {
        match children.as_slice() {
            [a, op, b] => Ok(format!("({} {} {})", a, op, b)),
            _ => Err(CompileError::internal("infix", &children)),
        }
    }
    fn pass(mut children: Vec<String>) -> Result<String, CompileError> {
        match children.len() {
            1 => Ok(children.remove(0)),
            3 => Ok(children.remove(1)),
            _ => Err(CompileError::internal("pass", &children)),
        }
    }
    Handlers::new()
        .any_terminal(|_, text| Ok(text.to_owned()))
        .non_terminal("A", 3, infix)
        .non_terminal("A", 1, pass)
        .non_terminal("M", 3, infix)
        .non_terminal("M", 1, pass)
        .non_terminal("U", 1, pass)
        .non_terminal("U", 3, pass)
}

/// A calculator parser with its evaluator and printer.
#[derive(Debug)]
pub struct Calculator {
    parser: Parser,
    evaluator: Handlers<CalcValue>,
    printer: Handlers<String>,
}

static SHARED: OnceCell<Calculator> = OnceCell::new();

impl Calculator {
    pub fn new() -> Result<Self, CalcError> {
        Ok(Self {
            parser: calculator_grammar().build_parser()?,
            evaluator: evaluator(),
            printer: printer(),
        })
    }

    /// A process-wide calculator, built on first use.
    pub fn shared() -> Result<&'static Calculator, CalcError> {
        SHARED.get_or_try_init(Calculator::new)
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    pub fn parse(&self, text: &str) -> Result<Node, CalcError> {
        Ok(self.parser.parse(text)?)
    }

    pub fn evaluate(&self, text: &str) -> Result<i64, CalcError> {
        let tree = self.parse(text)?;
        match self.evaluator.compile(&tree)? {
            CalcValue::Number(n) => Ok(n),
            other => Err(CompileError::internal(tree.label(), std::slice::from_ref(&other)).into()),
        }
    }

    pub fn print(&self, text: &str) -> Result<String, CalcError> {
        let tree = self.parse(text)?;
        Ok(self.printer.compile(&tree)?)
    }
}
