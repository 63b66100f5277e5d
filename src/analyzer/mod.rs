//! # Analyzer
//!
//! Builds the evaluator tree from the token stream.
//!
//! ## Grammar
//!
//! ```text
//! content    := (text | expression)*
//! expression := "$<" identifier (":" parameter ("," parameter)*)? ">"
//! identifier := (text | "," | expression)*
//! parameter  := (text | ":" | expression)*
//! ```
//!
//! Outside any expression `>`, `:` and `,` are ordinary text. Adjacent text
//! runs are merged into a single node.

pub mod core;
pub mod parser;

pub use self::core::ParseError;
pub use parser::ExpressionParser;

use crate::{ast::EvaluatorNode, tokenizer::Token};

pub fn parse(tokens: &[Token<'_>], max_depth: usize) -> Vec<EvaluatorNode> {
    ExpressionParser::new(tokens, max_depth).parse()
}
