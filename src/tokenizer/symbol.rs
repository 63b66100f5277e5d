//! # Structural Symbols
//!
//! The four pieces of generator-expression syntax:
//!
//! * `$<` opens an expression ([`TokenKind::BeginExpression`])
//! * `>` closes it ([`TokenKind::EndExpression`])
//! * `:` separates the identifier from its parameters
//!   ([`TokenKind::ColonSeparator`])
//! * `,` separates parameters ([`TokenKind::CommaSeparator`])
//!
//! The lexer emits them wherever they appear. Whether a `>` or `,` really is
//! syntax depends on the nesting level, which only the parser knows.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::value,
    error::context,
};

use super::token::{ParserResult, TokenKind};

#[tracing::instrument(level = "trace", skip(input))]
pub fn parse_begin_expression(input: &str) -> ParserResult<TokenKind> {
    context(
        "begin expression",
        value(TokenKind::BeginExpression, tag("$<")),
    )(input)
}

#[tracing::instrument(level = "trace", skip(input))]
pub fn parse_separator(input: &str) -> ParserResult<TokenKind> {
    context(
        "separator",
        alt((
            value(TokenKind::EndExpression, char('>')),
            value(TokenKind::ColonSeparator, char(':')),
            value(TokenKind::CommaSeparator, char(',')),
        )),
    )(input)
}
