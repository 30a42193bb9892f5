//! Lexing and parsing: source text to the coordinate-carrying AST.

pub mod ast;
mod dump;
mod grammar;
mod lexer;

#[cfg(test)]
mod grammar_tests;
#[cfg(test)]
mod lexer_tests;

pub use dump::dump_program;
pub use grammar::parse_program;
pub use lexer::{Span, Token, TokenKind, lex, token_text};
