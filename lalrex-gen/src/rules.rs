//! Fluent grammar authoring with typed semantic actions.
//!
//! A [`RuleSet`] collects productions together with the transform that
//! turns each production's values into a new value. Symbols are referred to
//! by name, so a rule may mention itself or rules defined later; names are
//! resolved when the set is built.
//!
//! Constants (`lit`) only shape the syntax and never reach a transform. Every
//! other symbol contributes one argument: non-terminals their compiled
//! value, terminals the value of their token constructor. A transform's
//! arity is checked against that count when it is bound.
//!
//! # Examples
//!
//! ```rust
//! # use lalrex_gen::RuleSet;
//! let mut rules = RuleSet::<i64>::new();
//! rules
//!     .rule("S").nt("S").lit("+").term("n").to2(|a, b| Ok(a + b)).unwrap()
//!     .rule("S").term("n").to1(Ok).unwrap()
//!     .lexeme("n", r"\d+", |text| Ok(text.parse()?))
//!     .ignore(r"\s+");
//! let (grammar, compiler) = rules.build().unwrap();
//! let parser = grammar.build_parser().unwrap();
//! let tree = parser.parse("1 + 2 + 39").unwrap();
//! assert_eq!(compiler.compile(&tree).unwrap(), 42);
//! ```

use crate::{Grammar, GrammarError, Rule, Symbol};
use indexmap::IndexMap;
use lalrex::{CompileError, Compiler, Node};
use smartstring::alias::String;
use std::fmt::{self, Debug};
use thiserror::Error;

type Transform<V> = Box<dyn Fn(Vec<V>) -> anyhow::Result<V> + Send + Sync>;
type Constructor<V> = Box<dyn Fn(&str) -> anyhow::Result<V> + Send + Sync>;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rule {rule} has {found} value symbol(s) but its transform takes {expected}")]
    Arity {
        rule: String,
        expected: usize,
        found: usize,
    },

    #[error("rule set has no rules")]
    Empty,

    #[error(transparent)]
    Grammar(#[from] GrammarError),
}

/// Productions with their transforms, plus lexemes and ignore patterns.
pub struct RuleSet<V> {
    rules: Vec<Rule>,
    transforms: Vec<Transform<V>>,
    lexemes: Vec<(String, String)>,
    constructors: IndexMap<String, Constructor<V>>,
    ignores: Vec<String>,
    start: Option<String>,
}

impl<V> Default for RuleSet<V> {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            transforms: Vec::new(),
            lexemes: Vec::new(),
            constructors: IndexMap::new(),
            ignores: Vec::new(),
            start: None,
        }
    }
}

impl<V> Debug for RuleSet<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("rules", &self.rules)
            .field("lexemes", &self.lexemes)
            .field("ignores", &self.ignores)
            .field("start", &self.start)
            .finish()
    }
}

impl<V: 'static> RuleSet<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a production headed by `head`.
    pub fn rule(&mut self, head: &str) -> RuleBuilder<'_, V> {
        RuleBuilder {
            set: self,
            head: head.into(),
            body: Vec::new(),
        }
    }

    /// Define a named lexeme and the constructor of its token values.
    pub fn lexeme<F>(&mut self, name: &str, pattern: &str, f: F) -> &mut Self
    where
        F: Fn(&str) -> anyhow::Result<V> + Send + Sync + 'static,
    {
        self.lexemes.push((name.into(), pattern.into()));
        self.constructors.insert(name.into(), Box::new(f));
        self
    }

    pub fn ignore(&mut self, pattern: &str) -> &mut Self {
        self.ignores.push(pattern.into());
        self
    }

    /// Start from `name` instead of the head of the first rule.
    pub fn start(&mut self, name: &str) -> &mut Self {
        self.start = Some(name.into());
        self
    }

    /// Resolve every symbol and produce the grammar with its compiler.
    pub fn build(self) -> Result<(Grammar, RuleCompiler<V>), RuleError> {
        let mut grammar = Grammar::from_rules(self.rules).map_err(|_| RuleError::Empty)?;
        for (name, pattern) in &self.lexemes {
            grammar = grammar.lexeme(name, pattern);
        }
        for pattern in &self.ignores {
            grammar = grammar.ignore(pattern);
        }
        if let Some(start) = &self.start {
            grammar = grammar.with_start(start);
        }
        grammar.validate()?;
        Ok((
            grammar,
            RuleCompiler {
                transforms: self.transforms,
                constructors: self.constructors,
            },
        ))
    }
}

/// A production under construction; finished by binding a transform.
pub struct RuleBuilder<'s, V> {
    set: &'s mut RuleSet<V>,
    head: String,
    body: Vec<Symbol>,
}

impl<'s, V: 'static> RuleBuilder<'s, V> {
    pub fn nt(mut self, name: &str) -> Self {
        self.body.push(Symbol::nt(name));
        self
    }

    pub fn lit(mut self, text: &str) -> Self {
        self.body.push(Symbol::lit(text));
        self
    }

    /// A terminal defined by [`RuleSet::lexeme`].
    pub fn term(mut self, name: &str) -> Self {
        self.body.push(Symbol::t(name));
        self
    }

    /// A terminal with its own pattern and token constructor. Later uses of
    /// the same name keep the first constructor.
    pub fn regex<F>(mut self, name: &str, pattern: &str, f: F) -> Self
    where
        F: Fn(&str) -> anyhow::Result<V> + Send + Sync + 'static,
    {
        self.body.push(Symbol::regex(name, pattern));
        let f: Constructor<V> = Box::new(f);
        self.set.constructors.entry(name.into()).or_insert(f);
        self
    }

    /// Number of symbols that produce a value.
    fn values(&self) -> usize {
        self.body
            .iter()
            .filter(|symbol| !matches!(symbol, Symbol::Constant(_)))
            .count()
    }

    /// Bind a transform taking the values as a vector of length `arity`.
    pub fn to_vec<F>(self, arity: usize, f: F) -> Result<&'s mut RuleSet<V>, RuleError>
    where
        F: Fn(Vec<V>) -> anyhow::Result<V> + Send + Sync + 'static,
    {
        let found = self.values();
        let rule = Rule {
            head: self.head,
            body: self.body,
        };
        if found != arity {
            return Err(RuleError::Arity {
                rule: rule.to_string().into(),
                expected: arity,
                found,
            });
        }
        self.set.rules.push(rule);
        self.set.transforms.push(Box::new(f));
        Ok(self.set)
    }

    pub fn to0<F>(self, f: F) -> Result<&'s mut RuleSet<V>, RuleError>
    where
        F: Fn() -> anyhow::Result<V> + Send + Sync + 'static,
    {
        self.to_vec(0, move |_| f())
    }

    pub fn to1<F>(self, f: F) -> Result<&'s mut RuleSet<V>, RuleError>
    where
        F: Fn(V) -> anyhow::Result<V> + Send + Sync + 'static,
    {
        self.to_vec(1, move |args| {
            let [a] = take::<V, 1>(args)?;
            f(a)
        })
    }

    pub fn to2<F>(self, f: F) -> Result<&'s mut RuleSet<V>, RuleError>
    where
        F: Fn(V, V) -> anyhow::Result<V> + Send + Sync + 'static,
    {
        self.to_vec(2, move |args| {
            let [a, b] = take::<V, 2>(args)?;
            f(a, b)
        })
    }

    pub fn to3<F>(self, f: F) -> Result<&'s mut RuleSet<V>, RuleError>
    where
        F: Fn(V, V, V) -> anyhow::Result<V> + Send + Sync + 'static,
    {
        self.to_vec(3, move |args| {
            let [a, b, c] = take::<V, 3>(args)?;
            f(a, b, c)
        })
    }

    pub fn to4<F>(self, f: F) -> Result<&'s mut RuleSet<V>, RuleError>
    where
        F: Fn(V, V, V, V) -> anyhow::Result<V> + Send + Sync + 'static,
    {
        self.to_vec(4, move |args| {
            let [a, b, c, d] = take::<V, 4>(args)?;
            f(a, b, c, d)
        })
    }
}

fn take<V, const N: usize>(args: Vec<V>) -> anyhow::Result<[V; N]> {
    let found = args.len();
    args.try_into()
        .map_err(|_| anyhow::anyhow!("expected {} values, got {}", N, found))
}

/// A compiled child: either the text of a constant or a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment<V> {
    Literal(String),
    Value(V),
}

/// Compiler produced by [`RuleSet::build`]; dispatches on the production
/// index recorded in each tree node.
pub struct RuleCompiler<V> {
    transforms: Vec<Transform<V>>,
    constructors: IndexMap<String, Constructor<V>>,
}

impl<V> Debug for RuleCompiler<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleCompiler")
            .field("transforms", &self.transforms.len())
            .field("constructors", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<V: Debug> RuleCompiler<V> {
    /// Compile a tree produced by a parser built from the same rule set.
    pub fn compile(&self, node: &Node) -> Result<V, CompileError> {
        let mut this = self;
        match lalrex::compile(node, &mut this)? {
            Fragment::Value(value) => Ok(value),
            Fragment::Literal(text) => Err(CompileError::Internal {
                label: node.label().into(),
                children: text,
            }),
        }
    }
}

impl<V: Debug> Compiler for &RuleCompiler<V> {
    type Value = Fragment<V>;

    fn compile_terminal(&mut self, label: &str, text: &str) -> Result<Fragment<V>, CompileError> {
        match self.constructors.get(label) {
            Some(f) => f(text)
                .map(Fragment::Value)
                .map_err(|err| CompileError::semantic(label, err)),
            None => Ok(Fragment::Literal(text.into())),
        }
    }

    fn compile_non_terminal(
        &mut self,
        label: &str,
        children: Vec<Fragment<V>>,
    ) -> Result<Fragment<V>, CompileError> {
        Err(CompileError::internal(label, &children))
    }

    fn compile_production(
        &mut self,
        label: &str,
        rule: usize,
        children: Vec<Fragment<V>>,
    ) -> Result<Fragment<V>, CompileError> {
        let Some(transform) = rule.checked_sub(1).and_then(|i| self.transforms.get(i)) else {
            return self.compile_non_terminal(label, children);
        };
        let args = children
            .into_iter()
            .filter_map(|child| match child {
                Fragment::Value(value) => Some(value),
                Fragment::Literal(_) => None,
            })
            .collect();
        transform(args)
            .map(Fragment::Value)
            .map_err(|err| CompileError::semantic(label, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn arity_mismatch_fails_fast() {
        let mut rules = RuleSet::<i64>::new();
        let err = rules
            .rule("S")
            .nt("S")
            .lit("+")
            .term("n")
            .to1(Ok)
            .unwrap_err();
        assert!(matches!(err, RuleError::Arity { expected: 1, found: 2, .. }));
        assert_eq!(
            err.to_string(),
            "rule S -> S '+' n has 2 value symbol(s) but its transform takes 1"
        );
    }

    #[test]
    fn undefined_references_fail_at_build() {
        let mut rules = RuleSet::<i64>::new();
        rules.rule("S").nt("T").to1(Ok).unwrap();
        assert!(matches!(
            rules.build(),
            Err(RuleError::Grammar(GrammarError::UndefinedNonTerminal { .. }))
        ));
        assert!(matches!(RuleSet::<i64>::new().build(), Err(RuleError::Empty)));
    }

    #[test]
    fn literals_do_not_reach_transforms() {
        init_logger();
        let mut rules = RuleSet::<std::string::String>::new();
        rules
            .rule("L")
            .lit("[")
            .nt("I")
            .lit("]")
            .to1(|items| Ok(format!("<{}>", items)))
            .unwrap()
            .rule("I")
            .nt("I")
            .lit(",")
            .regex("w", "[a-z]+", |text| Ok(text.to_uppercase()))
            .to2(|a, b| Ok(format!("{}|{}", a, b)))
            .unwrap()
            .rule("I")
            .regex("w", "[a-z]+", |text| Ok(text.to_owned()))
            .to1(Ok)
            .unwrap();
        let (grammar, compiler) = rules.build().unwrap();
        let parser = grammar.build_parser().unwrap();
        let tree = parser.parse("[ab,cd,ef]").unwrap();
        // The first constructor registered for `w` wins.
        assert_eq!(compiler.compile(&tree).unwrap(), "<AB|CD|EF>");
    }

    #[test]
    fn empty_productions_take_no_values() {
        let mut rules = RuleSet::<usize>::new();
        rules
            .rule("S")
            .lit("a")
            .nt("S")
            .to1(|n| Ok(n + 1))
            .unwrap()
            .rule("S")
            .to0(|| Ok(0))
            .unwrap();
        let (grammar, compiler) = rules.build().unwrap();
        let parser = grammar.build_parser().unwrap();
        assert_eq!(compiler.compile(&parser.parse("aaa").unwrap()).unwrap(), 3);
        assert_eq!(compiler.compile(&parser.parse("").unwrap()).unwrap(), 0);
    }

    #[test]
    fn transform_errors_are_semantic() {
        let mut rules = RuleSet::<i64>::new();
        rules
            .rule("S")
            .term("n")
            .to1(|n| if n == 0 { bail!("zero is not allowed") } else { Ok(n) })
            .unwrap()
            .lexeme("n", "[0-9]+", |text| Ok(text.parse()?));
        let (grammar, compiler) = rules.build().unwrap();
        let parser = grammar.build_parser().unwrap();
        assert_eq!(compiler.compile(&parser.parse("7").unwrap()).unwrap(), 7);
        let err = compiler.compile(&parser.parse("0").unwrap()).unwrap_err();
        assert_eq!(err.to_string(), "cannot compile S: zero is not allowed");
    }

    #[test]
    fn start_selects_another_rule() {
        let mut rules = RuleSet::<i64>::new();
        rules
            .rule("A")
            .term("n")
            .to1(|n| Ok(-n))
            .unwrap()
            .rule("B")
            .term("n")
            .lit("!")
            .to1(|n| Ok(n * 10))
            .unwrap()
            .lexeme("n", "[0-9]+", |text| Ok(text.parse()?))
            .start("B");
        let (grammar, compiler) = rules.build().unwrap();
        let parser = grammar.build_parser().unwrap();
        assert_eq!(compiler.compile(&parser.parse("4!").unwrap()).unwrap(), 40);
        assert!(parser.parse("4").is_err());
    }
}
