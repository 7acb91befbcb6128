//! Regex lexer with first-match-wins rule priority.
//!
//! A [`Lexer`] holds an ordered list of compiled patterns. At every scan
//! position each pattern is tried, anchored at that position, in declaration
//! order; the first one that matches a non-empty prefix wins. Rules without
//! a label are ignore patterns: their match is skipped without producing a
//! token.

use crate::{LexerCursor, LexerError, LexicalError, Span};
use regex_automata::{Anchored, Input, meta::Regex};
use smartstring::alias::String;
use std::fmt::{self, Display};
use std::iter::FusedIterator;

/// A lexical unit: the rule label it matched, the matched text and where.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    /// Terminal label used to look up parser actions.
    pub label: String,
    /// Matched source text.
    pub value: String,
    pub span: Span,
    /// Byte offset of the first matched character.
    pub offset: usize,
}

impl Token {
    pub fn new(label: impl Into<String>, value: impl Into<String>, span: Span) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            span,
            offset: 0,
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.label == self.value {
            write!(f, "{:?}", self.value.as_str())
        } else {
            write!(f, "{}[{}]", self.label, self.value)
        }
    }
}

/// One compiled lexical rule.
#[derive(Debug, Clone)]
pub struct LexRule {
    /// Token label; `None` for ignore patterns.
    pub label: Option<String>,
    pub pattern: String,
    regex: Regex,
}

impl LexRule {
    pub fn is_ignore(&self) -> bool {
        self.label.is_none()
    }
}

/// Accumulates lexical rules in priority order.
///
/// # Examples
///
/// ```rust
/// # use lalrex::LexerBuilder;
/// let lexer = LexerBuilder::new()
///     .ignore(r"\s+")
///     .literal("+")
///     .rule("n", r"\d+")
///     .build()
///     .unwrap();
/// let labels: Vec<_> = lexer
///     .tokenize("1 + 2")
///     .map(|t| t.unwrap().label)
///     .collect();
/// assert_eq!(labels, ["n", "+", "n"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LexerBuilder {
    rules: Vec<(Option<String>, String)>,
}

impl LexerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule emitting `label` for text matching `pattern`.
    pub fn rule(mut self, label: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.rules.push((Some(label.into()), pattern.into()));
        self
    }

    /// Append a rule matching `text` verbatim and labelled by it.
    pub fn literal(self, text: &str) -> Self {
        let pattern = regex::escape(text);
        self.rule(text, pattern.as_str())
    }

    /// Append a pattern whose matches are skipped.
    pub fn ignore(mut self, pattern: impl Into<String>) -> Self {
        self.rules.push((None, pattern.into()));
        self
    }

    pub fn build(self) -> Result<Lexer, LexerError> {
        let rules = self
            .rules
            .into_iter()
            .map(|(label, pattern)| {
                let regex = Regex::new(&pattern).map_err(|source| LexerError::Pattern {
                    label: label.clone().unwrap_or_else(|| "ignore".into()),
                    pattern: pattern.clone(),
                    source,
                })?;
                Ok(LexRule {
                    label,
                    pattern,
                    regex,
                })
            })
            .collect::<Result<Vec<_>, LexerError>>()?;
        Ok(Lexer { rules })
    }
}

/// Compiled lexer. Read-only once built; share it freely between threads.
#[derive(Debug, Clone)]
pub struct Lexer {
    rules: Vec<LexRule>,
}

impl Lexer {
    pub fn rules(&self) -> &[LexRule] {
        &self.rules
    }

    /// Lazily tokenize `text`.
    ///
    /// The iterator yields tokens until the input is exhausted, or yields a
    /// single [`LexicalError`] at the first position no rule matches and
    /// then stops.
    pub fn tokenize<'a>(&'a self, text: &'a str) -> Tokens<'a> {
        Tokens {
            lexer: self,
            text,
            cursor: LexerCursor::new(),
            done: false,
            stats: LexerStats::default(),
        }
    }

    /// Index and end offset of the first rule matching at `offset`.
    fn first_match(
        &self,
        text: &str,
        offset: usize,
        stats: &mut LexerStats,
    ) -> Option<(usize, usize)> {
        for (i, rule) in self.rules.iter().enumerate() {
            stats.attempts += 1;
            let input = Input::new(text).range(offset..).anchored(Anchored::Yes);
            match rule.regex.search(&input) {
                Some(m) if m.end() > m.start() => return Some((i, m.end())),
                _ => {}
            }
        }
        None
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LexerStats {
    pub tokens: usize,
    pub ignored: usize,
    pub attempts: usize,
}

/// Token sequence produced by [`Lexer::tokenize`].
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    lexer: &'a Lexer,
    text: &'a str,
    cursor: LexerCursor,
    done: bool,
    stats: LexerStats,
}

impl Tokens<'_> {
    pub fn stats(&self) -> LexerStats {
        self.stats.clone()
    }
}

impl Iterator for Tokens<'_> {
    type Item = Result<Token, LexicalError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let offset = self.cursor.offset;
            if offset >= self.text.len() {
                self.done = true;
                break;
            }
            let Some((i, end)) = self.lexer.first_match(self.text, offset, &mut self.stats) else {
                self.done = true;
                log::trace!("NO MATCH at {}", self.cursor.position);
                return Some(Err(LexicalError {
                    position: self.cursor.position,
                    offset,
                    remaining: self.text[offset..].into(),
                }));
            };
            let value = &self.text[offset..end];
            let span = self.cursor.advance(value);
            let rule = &self.lexer.rules[i];
            match &rule.label {
                None => {
                    self.stats.ignored += 1;
                    log::trace!("IGNORE: {:?} {}..{}", value, span.start, span.end);
                }
                Some(label) => {
                    self.stats.tokens += 1;
                    log::trace!("MATCHED: {} {:?} {}..{}", label, value, span.start, span.end);
                    return Some(Ok(Token {
                        label: label.clone(),
                        value: value.into(),
                        span,
                        offset,
                    }));
                }
            }
        }
        None
    }
}

impl FusedIterator for Tokens<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Position;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn calc_lexer() -> Lexer {
        LexerBuilder::new()
            .ignore(r"\s+")
            .literal("+")
            .literal("*")
            .literal("(")
            .literal(")")
            .rule("n", r"\d+")
            .build()
            .unwrap()
    }

    #[test]
    fn skips_ignored_text() {
        init_logger();
        let lexer = calc_lexer();
        let tokens: Vec<_> = lexer
            .tokenize(" 12 +\n(3)")
            .collect::<Result<_, _>>()
            .unwrap();
        let shown: Vec<_> = tokens.iter().map(|t| t.to_string()).collect();
        assert_eq!(shown, ["n[12]", "\"+\"", "\"(\"", "n[3]", "\")\""]);
        assert_eq!(tokens[0].span.start, Position::new(0, 1));
        assert_eq!(tokens[0].offset, 1);
        assert_eq!(tokens[2].span.start, Position::new(1, 0));
    }

    #[test]
    fn first_declared_rule_wins() {
        let lexer = LexerBuilder::new()
            .rule("id", "[a-z]+")
            .rule("kw", "if")
            .build()
            .unwrap();
        let token = lexer.tokenize("if").next().unwrap().unwrap();
        assert_eq!(token.label, "id");

        let lexer = LexerBuilder::new()
            .rule("kw", "if")
            .rule("id", "[a-z]+")
            .build()
            .unwrap();
        let labels: Vec<_> = lexer.tokenize("ifx").map(|t| t.unwrap().label).collect();
        assert_eq!(labels, ["kw", "id"]);
    }

    #[test]
    fn reports_first_unmatched_position() {
        init_logger();
        let lexer = calc_lexer();
        let mut tokens = lexer.tokenize("2+?3");
        assert_eq!(tokens.next().unwrap().unwrap().value, "2");
        assert_eq!(tokens.next().unwrap().unwrap().value, "+");
        let err = tokens.next().unwrap().unwrap_err();
        assert_eq!(err.position, Position::new(0, 2));
        assert_eq!(err.offset, 2);
        assert_eq!(err.remaining, "?3");
        assert!(tokens.next().is_none());
    }

    #[test]
    fn empty_matches_are_not_tokens() {
        let lexer = LexerBuilder::new().rule("a", "a*").build().unwrap();
        let mut tokens = lexer.tokenize("aab");
        assert_eq!(tokens.next().unwrap().unwrap().value, "aa");
        assert!(tokens.next().unwrap().is_err());
    }

    #[test]
    fn tokenize_is_restartable() {
        let lexer = calc_lexer();
        let first: Vec<_> = lexer.tokenize("1+2").collect();
        let second: Vec<_> = lexer.tokenize("1+2").collect();
        assert_eq!(first, second);
    }

    #[test]
    fn counts_tokens_and_ignored_runs() {
        let lexer = calc_lexer();
        let mut tokens = lexer.tokenize("1 + 2");
        tokens.by_ref().for_each(drop);
        let stats = tokens.stats();
        assert_eq!(stats.tokens, 3);
        assert_eq!(stats.ignored, 2);
    }

    #[test]
    fn bad_pattern_is_reported() {
        let err = LexerBuilder::new().rule("x", "(").build().unwrap_err();
        assert!(matches!(err, LexerError::Pattern { ref label, .. } if label == "x"));
    }
}
