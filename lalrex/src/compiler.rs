//! Post-order compilation of syntax trees into values.
//!
//! A [`Compiler`] turns leaves into values with `compile_terminal` and
//! interior nodes into values with `compile_non_terminal`, receiving the
//! children's values left to right. Swapping the compiler gives the same
//! grammar a different meaning (evaluation, pretty-printing, ...).

use crate::{CompileError, Node, ParseResult};
use indexmap::IndexMap;
use smartstring::alias::String;
use std::fmt::{self, Debug};

pub trait Compiler {
    type Value;

    fn compile_terminal(&mut self, label: &str, text: &str) -> Result<Self::Value, CompileError>;

    fn compile_non_terminal(
        &mut self,
        label: &str,
        children: Vec<Self::Value>,
    ) -> Result<Self::Value, CompileError>;

    /// Called for every interior node with the index of the production it
    /// was reduced by. Dispatches on the label alone unless overridden.
    fn compile_production(
        &mut self,
        label: &str,
        rule: usize,
        children: Vec<Self::Value>,
    ) -> Result<Self::Value, CompileError> {
        let _ = rule;
        self.compile_non_terminal(label, children)
    }
}

enum Frame<'n> {
    Visit(&'n Node),
    Build { label: &'n str, rule: usize, arity: usize },
}

/// Compile `root` bottom-up.
///
/// Uses an explicit work stack, so deep left- or right-recursive trees do
/// not exhaust the call stack. The first handler error aborts the pass.
pub fn compile<C: Compiler + ?Sized>(
    root: &Node,
    compiler: &mut C,
) -> Result<C::Value, CompileError> {
    let mut work = vec![Frame::Visit(root)];
    let mut values: Vec<C::Value> = Vec::new();
    while let Some(frame) = work.pop() {
        match frame {
            Frame::Visit(Node::Terminal(token)) => {
                values.push(compiler.compile_terminal(&token.label, &token.value)?);
            }
            Frame::Visit(Node::NonTerminal {
                label,
                rule,
                children,
            }) => {
                work.push(Frame::Build {
                    label: label.as_str(),
                    rule: *rule,
                    arity: children.len(),
                });
                work.extend(children.iter().rev().map(Frame::Visit));
            }
            Frame::Build { label, rule, arity } => {
                let args = values.split_off(values.len() - arity);
                values.push(compiler.compile_production(label, rule, args)?);
            }
        }
    }
    values.pop().ok_or_else(|| CompileError::Internal {
        label: root.label().into(),
        children: String::new(),
    })
}

/// Compile the tree of a parse, or pass its error on.
pub fn compile_result<C: Compiler + ?Sized>(
    result: &ParseResult,
    compiler: &mut C,
) -> Result<C::Value, CompileError> {
    match result {
        Ok(node) => compile(node, compiler),
        Err(err) => Err(err.clone().into()),
    }
}

type TerminalFn<V> = Box<dyn Fn(&str, &str) -> Result<V, CompileError> + Send + Sync>;
type NonTerminalFn<V> = Box<dyn Fn(Vec<V>) -> Result<V, CompileError> + Send + Sync>;

/// Label-dispatched compiler built from explicit handler maps.
///
/// Interior nodes are dispatched on `(label, arity)`, leaves on their label
/// with an optional catch-all. A node with no matching handler fails with
/// [`CompileError::Internal`].
///
/// # Examples
///
/// ```rust
/// # use lalrex::{Handlers, Node, Token};
/// let handlers = Handlers::new()
///     .terminal("n", |_, text| Ok(text.parse::<i64>().unwrap()))
///     .non_terminal("neg", 1, |args| Ok(-args[0]));
/// let tree = Node::NonTerminal {
///     label: "neg".into(),
///     rule: 1,
///     children: vec![Node::Terminal(Token::new("n", "7", Default::default()))],
/// };
/// assert_eq!(handlers.compile(&tree).unwrap(), -7);
/// ```
pub struct Handlers<V> {
    terminals: IndexMap<String, TerminalFn<V>>,
    any_terminal: Option<TerminalFn<V>>,
    non_terminals: IndexMap<(String, usize), NonTerminalFn<V>>,
}

impl<V> Default for Handlers<V> {
    fn default() -> Self {
        Self {
            terminals: IndexMap::new(),
            any_terminal: None,
            non_terminals: IndexMap::new(),
        }
    }
}

impl<V> Debug for Handlers<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers")
            .field("terminals", &self.terminals.keys().collect::<Vec<_>>())
            .field("any_terminal", &self.any_terminal.is_some())
            .field("non_terminals", &self.non_terminals.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<V> Handlers<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle leaves labelled `label`; the closure gets the label and text.
    pub fn terminal<F>(mut self, label: &str, f: F) -> Self
    where
        F: Fn(&str, &str) -> Result<V, CompileError> + Send + Sync + 'static,
    {
        self.terminals.insert(label.into(), Box::new(f));
        self
    }

    /// Handle leaves that have no label-specific handler.
    pub fn any_terminal<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &str) -> Result<V, CompileError> + Send + Sync + 'static,
    {
        self.any_terminal = Some(Box::new(f));
        self
    }

    /// Handle interior nodes labelled `label` with exactly `arity` children.
    pub fn non_terminal<F>(mut self, label: &str, arity: usize, f: F) -> Self
    where
        F: Fn(Vec<V>) -> Result<V, CompileError> + Send + Sync + 'static,
    {
        self.non_terminals.insert((label.into(), arity), Box::new(f));
        self
    }
}

impl<V: Debug> Handlers<V> {
    pub fn compile(&self, node: &Node) -> Result<V, CompileError> {
        let mut this = self;
        compile(node, &mut this)
    }
}

impl<V: Debug> Compiler for &Handlers<V> {
    type Value = V;

    fn compile_terminal(&mut self, label: &str, text: &str) -> Result<V, CompileError> {
        match self.terminals.get(label).or(self.any_terminal.as_ref()) {
            Some(f) => f(label, text),
            None => Err(CompileError::Internal {
                label: label.into(),
                children: text.into(),
            }),
        }
    }

    fn compile_non_terminal(&mut self, label: &str, children: Vec<V>) -> Result<V, CompileError> {
        match self.non_terminals.get(&(String::from(label), children.len())) {
            Some(f) => f(children),
            None => Err(CompileError::internal(label, &children)),
        }
    }
}
