//! Copyright (c) 2005–2025 IKH Software, Inc.
//!
//! Released under the terms of the GNU Lesser General Public License, version 3.0
//! or (at your option) any later version (LGPL-3.0-or-later).
//!
//! Runtime for LALR(1) parsers.
//!
//! `lalrex` contains everything needed to run a parser once its table has
//! been generated (see the `lalrex-gen` crate):
//!  * **`lexer`**: a regex lexer with first-match-wins priority and ignore
//!    patterns
//!  * **`table`**: the compiled shift/goto/reduce table
//!  * **`parser`**: the shift-reduce engine producing a syntax [`Node`] tree
//!  * **`compiler`**: post-order compilation of trees into values
//!
//! Tables, lexers and parsers are immutable once built and can be shared
//! between threads; each parse keeps its stacks to itself.

mod compiler;
mod cursor;
mod error;
mod lexer;
mod node;
mod parser;
mod table;

pub use crate::compiler::{Compiler, Handlers, compile, compile_result};
pub use crate::cursor::LexerCursor;
pub use crate::error::{
    CompileError, LexerError, LexicalError, ParseError, Position, Span, SyntaxError,
};
pub use crate::lexer::{LexRule, Lexer, LexerBuilder, LexerStats, Token, Tokens};
pub use crate::node::Node;
pub use crate::parser::{Engine, ParseResult, Parser, ParserStats, parse};
pub use crate::table::{Action, END, ParsingTable, Production, TableBuilder};
