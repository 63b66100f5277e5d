//! # Tokenizer
//!
//! Turns a property string into a flat stream of [`Token`]s. The lexer knows
//! nothing about nesting: it only recognizes the four pieces of syntax
//! (`$<`, `>`, `:`, `,`) and folds everything else into text runs.
//!
//! ```text
//! "a$<1:b>"  ──►  Text("a") Begin Text("1") Colon Text("b") End
//! ```
//!
//! Malformed input (an unmatched `>` or an unterminated `$<`) still produces
//! tokens; deciding what they mean is the parser's job.

pub mod symbol;
pub mod text;
pub mod token;

pub use token::{ParserResult, Token, TokenKind, Tokenizer, Tokens};

/// Convenience wrapper around a fresh [`Tokenizer`].
pub fn tokenize(input: &str) -> Tokens<'_> {
    Tokenizer::new().tokenize(input)
}
