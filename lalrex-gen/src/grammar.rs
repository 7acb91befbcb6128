//! Grammar model: symbols, rules, lexemes and ignore patterns.
//!
//! A [`Grammar`] always starts with the augmented root rule
//! `$root -> <start>`; user rules follow in insertion order, so a rule's
//! index in [`Grammar::rules`] is the production index the parser reports.
//! Grammars are values: every update consumes the grammar and returns a new
//! one.

use crate::{Automaton, EncodedGrammar, GrammarError, assemble, first_sets};
use indexmap::IndexMap;
use lalrex::{END, Lexer, LexerBuilder, Parser, ParsingTable};
use smartstring::alias::String;
use std::fmt::{self, Display};

/// Name of the augmented root non-terminal.
pub const ROOT: &str = "$root";

/// A grammar symbol.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    /// Terminal whose pattern is a named lexeme of the grammar.
    Terminal(String),
    NonTerminal(String),
    /// Terminal matching its text verbatim.
    Constant(String),
    /// Terminal carrying its own pattern.
    RegexLexeme(String, String),
}

impl Symbol {
    pub fn nt(name: &str) -> Self {
        Symbol::NonTerminal(name.into())
    }

    pub fn t(name: &str) -> Self {
        Symbol::Terminal(name.into())
    }

    pub fn lit(text: &str) -> Self {
        Symbol::Constant(text.into())
    }

    pub fn regex(name: &str, pattern: &str) -> Self {
        Symbol::RegexLexeme(name.into(), pattern.into())
    }

    /// Label used in tokens, tree nodes and the parsing table.
    pub fn label(&self) -> &str {
        match self {
            Symbol::Terminal(name)
            | Symbol::NonTerminal(name)
            | Symbol::Constant(name)
            | Symbol::RegexLexeme(name, _) => name,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Symbol::NonTerminal(_))
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Constant(text) => write!(f, "'{}'", text),
            other => f.write_str(other.label()),
        }
    }
}

/// A production `head -> body`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule {
    pub head: String,
    pub body: Vec<Symbol>,
}

impl Rule {
    pub fn new(head: &str, body: impl IntoIterator<Item = Symbol>) -> Self {
        Self {
            head: head.into(),
            body: body.into_iter().collect(),
        }
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ->", self.head)?;
        if self.body.is_empty() {
            return write!(f, " ε");
        }
        for symbol in &self.body {
            write!(f, " {}", symbol)?;
        }
        Ok(())
    }
}

/// Rules, named lexemes and ignore patterns of a language.
///
/// # Examples
///
/// ```rust
/// # use lalrex_gen::{Grammar, Rule, Symbol};
/// let grammar = Grammar::new(Rule::new("S", [Symbol::nt("S"), Symbol::lit("+"), Symbol::t("n")]))
///     .add(Rule::new("S", [Symbol::t("n")]))
///     .lexeme("n", r"\d+")
///     .ignore(r"\s+");
/// let parser = grammar.build_parser().unwrap();
/// let tree = parser.parse("1 + 2").unwrap();
/// assert_eq!(tree.label(), "S");
/// assert_eq!(tree.text(), "1+2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    rules: Vec<Rule>,
    lexemes: IndexMap<String, String>,
    ignores: Vec<String>,
}

impl Grammar {
    /// A grammar whose start symbol is the head of `first`.
    pub fn new(first: Rule) -> Self {
        Self {
            rules: vec![Rule::new(ROOT, [Symbol::NonTerminal(first.head.clone())]), first],
            lexemes: IndexMap::new(),
            ignores: Vec::new(),
        }
    }

    pub fn from_rules(rules: impl IntoIterator<Item = Rule>) -> Result<Self, GrammarError> {
        let mut rules = rules.into_iter();
        let first = rules.next().ok_or(GrammarError::Empty)?;
        Ok(Self::new(first).add_range(rules))
    }

    pub fn add(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn add_range(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Define the pattern of `Terminal(name)` symbols.
    pub fn lexeme(mut self, name: &str, pattern: &str) -> Self {
        self.lexemes.insert(name.into(), pattern.into());
        self
    }

    pub fn ignore(mut self, pattern: &str) -> Self {
        self.ignores.push(pattern.into());
        self
    }

    /// Start from `name` instead of the head of the first rule.
    pub fn with_start(mut self, name: &str) -> Self {
        self.rules[0] = Rule::new(ROOT, [Symbol::nt(name)]);
        self
    }

    /// All rules; index 0 is the augmented root rule.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }

    pub fn start(&self) -> &str {
        self.rules[0].body.first().map_or("", Symbol::label)
    }

    pub fn lexemes(&self) -> &IndexMap<String, String> {
        &self.lexemes
    }

    pub fn ignores(&self) -> &[String] {
        &self.ignores
    }

    /// Non-terminals in first-seen order, starting with [`ROOT`].
    pub fn non_terminals(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for rule in &self.rules {
            let body = rule.body.iter().filter_map(|symbol| match symbol {
                Symbol::NonTerminal(name) => Some(name.as_str()),
                _ => None,
            });
            for name in std::iter::once(rule.head.as_str()).chain(body) {
                if !seen.contains(&name) {
                    seen.push(name);
                }
            }
        }
        seen
    }

    /// Position of `name` in [`Grammar::non_terminals`].
    pub fn sort_order_for(&self, name: &str) -> Option<usize> {
        self.non_terminals().iter().position(|nt| *nt == name)
    }

    /// Terminal labels with their patterns, in lexer priority order.
    ///
    /// Constants come first in order of appearance (escaped), then named
    /// lexemes in declaration order, then inline regex lexemes in order of
    /// appearance. A label bound to two different patterns is an error, and
    /// so is a constant whose text is also a lexeme name.
    pub fn terminals(&self) -> Result<Vec<(String, String)>, GrammarError> {
        let mut constants: Vec<&str> = Vec::new();
        let mut inline: IndexMap<&str, &str> = IndexMap::new();
        for symbol in self.rules.iter().flat_map(|rule| &rule.body) {
            match symbol {
                Symbol::Constant(text) => {
                    if !constants.contains(&text.as_str()) {
                        constants.push(text.as_str());
                    }
                }
                Symbol::RegexLexeme(name, pattern) => {
                    let prev = self
                        .lexemes
                        .get(name)
                        .map(|p| p.as_str())
                        .or_else(|| inline.get(name.as_str()).copied());
                    match prev {
                        Some(prev) if prev != pattern.as_str() => {
                            return Err(GrammarError::LexemeRedefined {
                                name: name.clone(),
                                first: prev.into(),
                                second: pattern.clone(),
                            });
                        }
                        Some(_) => {}
                        None => {
                            inline.insert(name.as_str(), pattern.as_str());
                        }
                    }
                }
                _ => {}
            }
        }
        for &text in &constants {
            if self.lexemes.contains_key(text) || inline.contains_key(&text) {
                return Err(GrammarError::ConstantShadowsLexeme { name: text.into() });
            }
        }
        let mut out: Vec<(String, String)> = constants
            .into_iter()
            .map(|text| (text.into(), regex::escape(text).into()))
            .collect();
        out.extend(
            self.lexemes
                .iter()
                .map(|(name, pattern)| (name.clone(), pattern.clone())),
        );
        out.extend(
            inline
                .into_iter()
                .map(|(name, pattern)| (name.into(), pattern.into())),
        );
        Ok(out)
    }

    /// Check symbol references and lexeme definitions.
    pub fn validate(&self) -> Result<(), GrammarError> {
        self.terminals()?;
        EncodedGrammar::encode(self)?;
        Ok(())
    }

    /// Derive the lexer: ignore patterns first, then [`Grammar::terminals`].
    pub fn lexer(&self) -> Result<Lexer, GrammarError> {
        let mut builder = self
            .ignores
            .iter()
            .fold(LexerBuilder::new(), |builder, pattern| builder.ignore(pattern.as_str()));
        for (label, pattern) in self.terminals()? {
            builder = builder.rule(label, pattern);
        }
        Ok(builder.build()?)
    }

    /// Build the LALR(1) parsing table, failing on any conflict.
    pub fn build_table(&self) -> Result<ParsingTable, GrammarError> {
        let encoded = EncodedGrammar::encode(self)?;
        let first = first_sets(&encoded);
        let automaton = Automaton::build(&encoded, &first);
        assemble(&encoded, &automaton)
    }

    pub fn build_parser(&self) -> Result<Parser, GrammarError> {
        let lexer = self.lexer()?;
        let table = self.build_table()?;
        Ok(Parser::new(lexer, table))
    }
}

impl Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in &self.rules[1..] {
            writeln!(f, "{}", rule)?;
        }
        for (name, pattern) in &self.lexemes {
            writeln!(f, "{}: /{}/", name, pattern)?;
        }
        for pattern in &self.ignores {
            writeln!(f, "ignore: /{}/", pattern)?;
        }
        if Some(self.start()) != self.rules.get(1).map(|rule| rule.head.as_str()) {
            writeln!(f, "start: {}", self.start())?;
        }
        Ok(())
    }
}

/// Names no user symbol may take.
pub(crate) fn is_reserved(name: &str) -> bool {
    name == ROOT || name == END
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sums() -> Grammar {
        Grammar::new(Rule::new("S", [Symbol::nt("S"), Symbol::lit("+"), Symbol::nt("T")]))
            .add(Rule::new("S", [Symbol::nt("T")]))
            .add(Rule::new("T", [Symbol::regex("n", r"\d+")]))
            .add(Rule::new("T", [Symbol::lit("("), Symbol::nt("S"), Symbol::lit(")")]))
    }

    #[test]
    fn root_rule_comes_first() {
        let grammar = sums();
        assert_eq!(grammar.rules().len(), 5);
        assert_eq!(grammar.rules()[0].to_string(), "$root -> S");
        assert_eq!(grammar.start(), "S");
        assert_eq!(grammar.rules()[1].to_string(), "S -> S '+' T");
    }

    #[test]
    fn updates_return_new_values() {
        let base = sums();
        let extended = base.clone().add(Rule::new("T", []));
        assert_eq!(base.rules().len(), 5);
        assert_eq!(extended.rules().len(), 6);
        assert_eq!(extended.rules()[5].to_string(), "T -> ε");
    }

    #[test]
    fn non_terminal_sort_order_is_first_seen() {
        let grammar = sums();
        assert_eq!(grammar.non_terminals(), [ROOT, "S", "T"]);
        assert_eq!(grammar.sort_order_for("T"), Some(2));
        assert_eq!(grammar.sort_order_for("X"), None);
    }

    #[test]
    fn terminals_in_priority_order() {
        let grammar = sums().lexeme("id", "[a-z]+");
        let labels: Vec<_> = grammar
            .terminals()
            .unwrap()
            .into_iter()
            .map(|(label, _)| label)
            .collect();
        assert_eq!(labels, ["+", "(", ")", "id", "n"]);
    }

    #[test]
    fn constants_are_escaped() {
        let grammar = Grammar::new(Rule::new("S", [Symbol::lit("(*)")]));
        let terminals = grammar.terminals().unwrap();
        assert_eq!(terminals[0].1, r"\(\*\)");
        let lexer = grammar.lexer().unwrap();
        let token = lexer.tokenize("(*)").next().unwrap().unwrap();
        assert_eq!(token.label, "(*)");
    }

    #[test]
    fn conflicting_lexeme_patterns_are_rejected() {
        let grammar = Grammar::new(Rule::new("S", [Symbol::regex("n", "[0-9]+")]))
            .add(Rule::new("S", [Symbol::regex("n", r"\d+")]));
        assert!(matches!(
            grammar.terminals(),
            Err(GrammarError::LexemeRedefined { ref name, .. }) if name == "n"
        ));
    }

    #[test]
    fn constants_may_not_reuse_lexeme_labels() {
        let named = Grammar::new(Rule::new("S", [Symbol::lit("n"), Symbol::t("n")]))
            .lexeme("n", "[0-9]+");
        assert!(matches!(
            named.terminals(),
            Err(GrammarError::ConstantShadowsLexeme { ref name }) if name == "n"
        ));

        let inline = Grammar::new(Rule::new("S", [Symbol::regex("id", "[a-z]+")]))
            .add(Rule::new("S", [Symbol::lit("id")]));
        assert!(matches!(
            inline.validate(),
            Err(GrammarError::ConstantShadowsLexeme { ref name }) if name == "id"
        ));
        assert!(inline.build_parser().is_err());

        let distinct = Grammar::new(Rule::new("S", [Symbol::lit("if"), Symbol::t("id")]))
            .lexeme("id", "[a-z]+");
        assert_eq!(distinct.terminals().unwrap().len(), 2);
    }

    #[test]
    fn with_start_replaces_root_body() {
        let grammar = sums().with_start("T");
        assert_eq!(grammar.start(), "T");
        assert!(grammar.to_string().ends_with("start: T\n"));
    }

    #[test]
    fn empty_rule_list_is_an_error() {
        assert!(matches!(Grammar::from_rules(Vec::new()), Err(GrammarError::Empty)));
    }
}
