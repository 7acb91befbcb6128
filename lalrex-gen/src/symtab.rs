use crate::grammar::is_reserved;
use crate::{Grammar, GrammarError, ROOT, Symbol};
use indexmap::IndexSet;
use lalrex::END;
use smartstring::alias::String;

/// Interned symbol names, indexed in insertion order.
#[derive(Default, Debug, Clone)]
pub struct Symtab {
    names: IndexSet<String>,
}

impl Symtab {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, sym: &str) -> usize {
        match self.names.get_index_of(sym) {
            Some(idx) => idx,
            None => self.names.insert_full(sym.into()).0,
        }
    }

    pub fn idx(&self, sym: &str) -> Option<usize> {
        self.names.get_index_of(sym)
    }

    pub fn sym(&self, idx: usize) -> Option<&str> {
        self.names.get_index(idx).map(|x| x.as_str())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|x| x.as_str())
    }
}

/// A grammar with every symbol replaced by an integer id.
///
/// Non-terminals take ids `0..n_nonterm` in first-seen order (`$root` is 0);
/// terminals follow in order of appearance, with [`END`] last. Each
/// production is stored head first: `prods[r][0]` is the head id and
/// `prods[r][1..]` the body.
#[derive(Debug, Clone)]
pub struct EncodedGrammar {
    pub prods: Vec<Vec<usize>>,
    pub nonterms: Symtab,
    pub terms: Symtab,
    by_head: Vec<Vec<usize>>,
}

impl EncodedGrammar {
    /// Encode `grammar`, checking that every non-terminal has rules, every
    /// named terminal has a lexeme and no reserved name is used.
    pub fn encode(grammar: &Grammar) -> Result<Self, GrammarError> {
        let mut nonterms = Symtab::new();
        let mut terms = Symtab::new();

        for (r, rule) in grammar.rules().iter().enumerate() {
            if r > 0 && is_reserved(&rule.head) {
                return Err(GrammarError::ReservedName {
                    name: rule.head.clone(),
                });
            }
            nonterms.add(&rule.head);
            for symbol in &rule.body {
                let name = symbol.label();
                if r > 0 && is_reserved(name) {
                    return Err(GrammarError::ReservedName { name: name.into() });
                }
                match symbol {
                    Symbol::NonTerminal(_) => {
                        nonterms.add(name);
                    }
                    Symbol::Terminal(_) if !grammar.lexemes().contains_key(name) => {
                        return Err(GrammarError::UndefinedTerminal { name: name.into() });
                    }
                    _ => {
                        terms.add(name);
                    }
                }
            }
        }
        terms.add(END);

        let n_nonterm = nonterms.len();
        let mut by_head = vec![Vec::new(); n_nonterm];
        let mut prods = Vec::with_capacity(grammar.rules().len());
        for (r, rule) in grammar.rules().iter().enumerate() {
            let mut prod = Vec::with_capacity(rule.body.len() + 1);
            let head = nonterms.add(&rule.head);
            prod.push(head);
            for symbol in &rule.body {
                let id = match symbol {
                    Symbol::NonTerminal(name) => nonterms.add(name),
                    other => n_nonterm + terms.add(other.label()),
                };
                prod.push(id);
            }
            by_head[head].push(r);
            prods.push(prod);
        }

        if let Some(nt) = by_head.iter().position(|rules| rules.is_empty()) {
            return Err(GrammarError::UndefinedNonTerminal {
                name: nonterms.sym(nt).unwrap_or_default().into(),
            });
        }

        Ok(Self {
            prods,
            nonterms,
            terms,
            by_head,
        })
    }

    pub fn n_nonterm(&self) -> usize {
        self.nonterms.len()
    }

    pub fn n_term(&self) -> usize {
        self.terms.len()
    }

    pub fn n_sym(&self) -> usize {
        self.n_nonterm() + self.n_term()
    }

    pub fn is_nonterm(&self, sym: usize) -> bool {
        sym < self.n_nonterm()
    }

    /// Id of the end-of-input terminal.
    pub fn end(&self) -> usize {
        self.n_sym() - 1
    }

    pub fn head(&self, prod: usize) -> usize {
        self.prods[prod][0]
    }

    pub fn body(&self, prod: usize) -> &[usize] {
        &self.prods[prod][1..]
    }

    /// Productions headed by non-terminal `nt`, in grammar order.
    pub fn rules_for(&self, nt: usize) -> &[usize] {
        &self.by_head[nt]
    }

    pub fn name(&self, sym: usize) -> &str {
        if self.is_nonterm(sym) {
            self.nonterms.sym(sym).unwrap_or(ROOT)
        } else {
            self.terms.sym(sym - self.n_nonterm()).unwrap_or(END)
        }
    }

    /// Names of all symbols indexed by id.
    pub fn names(&self) -> Vec<&str> {
        self.nonterms.iter().chain(self.terms.iter()).collect()
    }

    /// `head -> body` of production `prod`, by symbol name.
    pub fn production_string(&self, prod: usize) -> std::string::String {
        let mut out = format!("{} ->", self.name(self.head(prod)));
        if self.body(prod).is_empty() {
            out.push_str(" ε");
        }
        for &sym in self.body(prod) {
            out.push(' ');
            out.push_str(self.name(sym));
        }
        out
    }
}
