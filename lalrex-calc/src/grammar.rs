use lalrex_gen::{Grammar, Rule, Symbol};

fn nt(name: &str) -> Symbol {
    Symbol::nt(name)
}

fn lit(text: &str) -> Symbol {
    Symbol::lit(text)
}

/// Arithmetic over non-negative integers with the usual precedence:
///
/// ```text
/// A -> A + M | A - M | M
/// M -> M * U | M / U | U
/// U -> n | ( A )
/// ```
///
/// `n` matches `\d+`; whitespace is ignored.
pub fn calculator_grammar() -> Grammar {
    Grammar::new(Rule::new("A", [nt("A"), lit("+"), nt("M")]))
        .add_range([
            Rule::new("A", [nt("A"), lit("-"), nt("M")]),
            Rule::new("A", [nt("M")]),
            Rule::new("M", [nt("M"), lit("*"), nt("U")]),
            Rule::new("M", [nt("M"), lit("/"), nt("U")]),
            Rule::new("M", [nt("U")]),
            Rule::new("U", [Symbol::t("n")]),
            Rule::new("U", [lit("("), nt("A"), lit(")")]),
        ])
        .lexeme("n", r"\d+")
        .ignore(r"\s+")
}

/// Sums only: `S -> S + n | n`, with `n` an inline lexeme.
pub fn addition_grammar() -> Grammar {
    Grammar::new(Rule::new("S", [nt("S"), lit("+"), Symbol::regex("n", "[0-9]+")]))
        .add(Rule::new("S", [Symbol::regex("n", "[0-9]+")]))
        .ignore(r"\s+")
}
