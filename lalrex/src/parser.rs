//! Table-driven shift-reduce engine and the [`Parser`] facade.

use crate::{
    Action, CompileError, Compiler, LexicalError, Lexer, Node, ParseError, ParsingTable, Position,
    SyntaxError, Token, Tokens, END, compile,
};
use smartstring::alias::String;
use std::iter::Fuse;

/// Outcome of one parse: the syntax tree or the error that stopped it.
pub type ParseResult = Result<Node, ParseError>;

/// Parse a token sequence with `table`.
///
/// The first lexical error in `tokens` ends the parse. No error recovery is
/// attempted.
pub fn parse<I>(table: &ParsingTable, tokens: I) -> ParseResult
where
    I: IntoIterator<Item = Result<Token, LexicalError>>,
{
    Engine::new(table).run(tokens)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserStats {
    pub tokens: usize,
    pub shifts: usize,
    pub reductions: usize,
}

/// One parse in progress: the state stack, the node stack and counters.
///
/// The node stack is always one shorter than the state stack; the bottom
/// state is the start state and has no node.
#[derive(Debug)]
pub struct Engine<'t> {
    table: &'t ParsingTable,
    states: Vec<usize>,
    nodes: Vec<Node>,
    stats: ParserStats,
}

impl<'t> Engine<'t> {
    pub fn new(table: &'t ParsingTable) -> Self {
        Self {
            table,
            states: Vec::new(),
            nodes: Vec::new(),
            stats: ParserStats::default(),
        }
    }

    pub fn stats(&self) -> ParserStats {
        self.stats.clone()
    }

    pub fn run<I>(&mut self, tokens: I) -> ParseResult
    where
        I: IntoIterator<Item = Result<Token, LexicalError>>,
    {
        self.states.clear();
        self.nodes.clear();
        self.states.push(0);

        let mut tokens = tokens.into_iter().fuse();
        let mut lookahead = self.next_token(&mut tokens)?;
        let mut end = Position::default();

        loop {
            if log::log_enabled!(log::Level::Trace) {
                self.dump_state(lookahead.as_ref());
            }
            let state = self.top()?;
            let terminal = lookahead.as_ref().map_or(END, |token| token.label.as_str());
            match self.table.action(state, terminal) {
                Some(Action::Shift(to)) => {
                    let Some(token) = lookahead.take() else {
                        return Err(self.inconsistent(state, "shift on end of input"));
                    };
                    log::trace!("Shift {} -> {}", token, to);
                    end = token.span.end;
                    self.states.push(to);
                    self.nodes.push(Node::Terminal(token));
                    self.stats.shifts += 1;
                    lookahead = self.next_token(&mut tokens)?;
                }

                Some(Action::Reduce(rule)) => {
                    self.reduce(rule)?;
                    self.stats.reductions += 1;
                }

                Some(Action::Accept) => {
                    log::trace!("Accept");
                    return match (self.nodes.pop(), self.nodes.is_empty()) {
                        (Some(node), true) => Ok(node),
                        _ => Err(self.inconsistent(state, "accept with unbalanced stack")),
                    };
                }

                None => {
                    let position = lookahead.as_ref().map_or(end, |token| token.span.start);
                    log::trace!("Error in state {} on {}", state, terminal);
                    return Err(SyntaxError {
                        found: lookahead,
                        position,
                        expected: self.table.expected(state),
                    }
                    .into());
                }
            }
        }
    }

    fn next_token<I>(&mut self, tokens: &mut Fuse<I>) -> Result<Option<Token>, ParseError>
    where
        I: Iterator<Item = Result<Token, LexicalError>>,
    {
        let token = tokens.next().transpose()?;
        if token.is_some() {
            self.stats.tokens += 1;
        }
        Ok(token)
    }

    fn top(&self) -> Result<usize, ParseError> {
        self.states.last().copied().ok_or_else(|| ParseError::Table {
            state: 0,
            message: "state stack underflow".into(),
        })
    }

    fn reduce(&mut self, rule: usize) -> Result<(), ParseError> {
        let state = self.top()?;
        let Some(production) = self.table.production(rule) else {
            return Err(self.inconsistent(state, &format!("unknown production {}", rule)));
        };
        let len = production.len;
        if self.nodes.len() < len {
            return Err(self.inconsistent(state, "node stack underflow"));
        }
        let children = self.nodes.split_off(self.nodes.len() - len);
        self.states.truncate(self.states.len() - len);

        let from = self.top()?;
        let Some(to) = self.table.goto(from, &production.head) else {
            return Err(self.inconsistent(from, &format!("no goto on {}", production.head)));
        };
        log::trace!("Reduce R{} {} ({}) -> {}", rule, production.head, len, to);
        self.nodes.push(Node::NonTerminal {
            label: production.head.clone(),
            rule,
            children,
        });
        self.states.push(to);
        Ok(())
    }

    fn inconsistent(&self, state: usize, message: &str) -> ParseError {
        ParseError::Table {
            state,
            message: message.into(),
        }
    }

    fn dump_state(&self, incoming: Option<&Token>) {
        let mut output = String::new();
        for (i, state) in self.states.iter().enumerate() {
            output.push_str(&format!("<{}>  ", state));
            if let Some(node) = self.nodes.get(i) {
                output.push_str(node.label());
                output.push_str("  ");
            }
        }
        match incoming {
            Some(token) => output.push_str(&format!("<-  {}", token)),
            None => output.push_str("<-  $end"),
        }
        log::trace!("{}", output);
    }
}

/// A lexer and the parsing table it feeds, ready to parse text.
///
/// Both parts are immutable; one `Parser` can serve any number of
/// concurrent parses.
#[derive(Debug, Clone)]
pub struct Parser {
    lexer: Lexer,
    table: ParsingTable,
}

impl Parser {
    pub fn new(lexer: Lexer, table: ParsingTable) -> Self {
        Self { lexer, table }
    }

    pub fn lexer(&self) -> &Lexer {
        &self.lexer
    }

    pub fn table(&self) -> &ParsingTable {
        &self.table
    }

    pub fn tokenize<'a>(&'a self, text: &'a str) -> Tokens<'a> {
        self.lexer.tokenize(text)
    }

    pub fn parse(&self, text: &str) -> ParseResult {
        parse(&self.table, self.lexer.tokenize(text))
    }

    /// Parse `lines` joined with `\n`.
    pub fn parse_lines<I, S>(&self, lines: I) -> ParseResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let text = lines
            .into_iter()
            .map(|line| line.as_ref().to_owned())
            .collect::<Vec<_>>()
            .join("\n");
        self.parse(&text)
    }

    /// Parse `text` and compile the resulting tree.
    pub fn compile<C: Compiler>(
        &self,
        text: &str,
        compiler: &mut C,
    ) -> Result<C::Value, CompileError> {
        let node = self.parse(text)?;
        compile(&node, compiler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LexerBuilder, Production, TableBuilder};

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    // $root -> E ; E -> E + n ; E -> n
    fn sum_parser() -> Parser {
        let productions = vec![
            Production {
                head: "$root".into(),
                len: 1,
            },
            Production {
                head: "E".into(),
                len: 3,
            },
            Production {
                head: "E".into(),
                len: 1,
            },
        ];
        let mut table = TableBuilder::new(5, productions);
        table.shift(0, "n", 2);
        table.goto(0, "E", 1);
        table.shift(1, "+", 3);
        table.accept(1);
        table.reduce(2, "+", 2);
        table.reduce(2, END, 2);
        table.shift(3, "n", 4);
        table.reduce(4, "+", 1);
        table.reduce(4, END, 1);
        let lexer = LexerBuilder::new()
            .ignore(r"\s+")
            .literal("+")
            .rule("n", r"\d+")
            .build()
            .unwrap();
        Parser::new(lexer, table.finish())
    }

    #[test]
    fn builds_left_recursive_tree() {
        init_logger();
        let parser = sum_parser();
        let tree = parser.parse("1 + 2 + 3").unwrap();
        assert_eq!(tree.label(), "E");
        assert_eq!(tree.children().len(), 3);
        assert_eq!(tree.children()[0].children().len(), 3);
        assert_eq!(tree.text(), "1+2+3");
        assert_eq!(
            tree.to_string(),
            "E\n  E\n    E\n      n[1]\n    \"+\"\n    n[2]\n  \"+\"\n  n[3]\n"
        );
    }

    #[test]
    fn counts_engine_steps() {
        let parser = sum_parser();
        let mut engine = Engine::new(parser.table());
        engine.run(parser.tokenize("1+2")).unwrap();
        assert_eq!(
            engine.stats(),
            ParserStats {
                tokens: 3,
                shifts: 3,
                reductions: 2,
            }
        );
    }

    #[test]
    fn premature_end_is_a_syntax_error() {
        init_logger();
        let parser = sum_parser();
        let Err(ParseError::Syntax(err)) = parser.parse("1+") else {
            panic!("expected a syntax error");
        };
        assert_eq!(err.found, None);
        assert_eq!(err.position, Position::new(0, 2));
        assert_eq!(err.expected, vec![String::from("n")]);
    }

    #[test]
    fn unexpected_token_is_a_syntax_error() {
        let parser = sum_parser();
        let Err(ParseError::Syntax(err)) = parser.parse("1 2") else {
            panic!("expected a syntax error");
        };
        assert_eq!(err.found.unwrap().value, "2");
        assert_eq!(err.position, Position::new(0, 2));
        assert_eq!(err.expected, vec![String::from("+"), String::from(END)]);
    }

    #[test]
    fn empty_input_is_a_syntax_error() {
        let parser = sum_parser();
        assert!(matches!(parser.parse(""), Err(ParseError::Syntax(_))));
    }

    #[test]
    fn lexical_errors_pass_through() {
        let parser = sum_parser();
        let Err(ParseError::Lexical(err)) = parser.parse("1+x") else {
            panic!("expected a lexical error");
        };
        assert_eq!(err.offset, 2);
    }

    #[test]
    fn parse_lines_joins_with_newlines() {
        let parser = sum_parser();
        let tree = parser.parse_lines(["1 +", "2"]).unwrap();
        let span = tree.span().unwrap();
        assert_eq!(span.line_range(), (0, 1));
    }

    #[test]
    fn broken_table_is_reported() {
        let productions = vec![Production {
            head: "E".into(),
            len: 2,
        }];
        let mut table = TableBuilder::new(1, productions);
        table.reduce(0, "n", 0);
        let tokens = [Ok(Token::new("n", "1", Default::default()))];
        let err = parse(&table.finish(), tokens).unwrap_err();
        assert!(matches!(err, ParseError::Table { state: 0, .. }));
    }
}
