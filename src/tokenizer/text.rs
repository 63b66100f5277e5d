use nom::{
    branch::alt,
    bytes::complete::is_not,
    character::complete::char,
    combinator::{not, recognize, value},
    error::context,
    multi::many1,
    sequence::terminated,
};

use super::token::{ParserResult, TokenKind};

/// Longest run of literal text. A `$` is literal unless it starts `$<`.
#[tracing::instrument(level = "trace", skip(input))]
pub fn parse_text(input: &str) -> ParserResult<TokenKind> {
    context(
        "text",
        value(
            TokenKind::Text,
            recognize(many1(alt((
                is_not("$>:,"),
                recognize(terminated(char('$'), not(char('<')))),
            )))),
        ),
    )(input)
}
