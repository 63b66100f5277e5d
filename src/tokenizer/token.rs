use nom::{branch::alt, error::VerboseError, IResult};
use strum_macros::Display;
use tracing::{debug, warn};

use super::{
    symbol::{parse_begin_expression, parse_separator},
    text::parse_text,
};
use crate::ast::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum TokenKind {
    Text,
    BeginExpression,
    EndExpression,
    ColonSeparator,
    CommaSeparator,
}

/// A lexeme borrowing its text from the source string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    /// Byte offset of `text` in the source.
    pub offset: usize,
}

impl Token<'_> {
    pub fn span(&self) -> Span {
        Span::new(self.offset, self.offset + self.text.len())
    }

    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }
}

/// Lexer output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokens<'src> {
    tokens: Vec<Token<'src>>,
    saw_generator_expression: bool,
}

impl<'src> Tokens<'src> {
    /// True when at least one `$<` was found. Plain strings can skip parsing.
    pub fn saw_generator_expression(&self) -> bool {
        self.saw_generator_expression
    }

    pub fn as_slice(&self) -> &[Token<'src>] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token<'src>> {
        self.tokens.iter()
    }

    pub fn into_vec(self) -> Vec<Token<'src>> {
        self.tokens
    }
}

#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    current_position: usize,
}

impl Tokenizer {
    pub fn new() -> Self {
        Self {
            current_position: 0,
        }
    }

    /// Splits `input` into tokens in one left-to-right pass. Every byte ends
    /// up in exactly one token, so concatenating the token texts gives back
    /// the input.
    #[tracing::instrument(level = "debug", skip(self, input))]
    pub fn tokenize<'src>(&mut self, input: &'src str) -> Tokens<'src> {
        self.current_position = 0;
        let mut tokens = Vec::new();
        let mut saw_generator_expression = false;
        let mut remaining = input;

        while !remaining.is_empty() {
            let result = alt((parse_begin_expression, parse_separator, parse_text))(remaining);

            match result {
                Ok((new_remaining, kind)) => {
                    let consumed = &remaining[..(remaining.len() - new_remaining.len())];
                    saw_generator_expression |= kind == TokenKind::BeginExpression;
                    tokens.push(Token {
                        kind,
                        text: consumed,
                        offset: self.current_position,
                    });
                    self.current_position += consumed.len();
                    remaining = new_remaining;
                }
                Err(e) => {
                    // The alternatives cover every input; keep the rest as text.
                    warn!("lexer stopped at offset {}: {:?}", self.current_position, e);
                    tokens.push(Token {
                        kind: TokenKind::Text,
                        text: remaining,
                        offset: self.current_position,
                    });
                    self.current_position += remaining.len();
                    break;
                }
            }
        }

        debug!(
            "tokenized {} bytes into {} tokens",
            input.len(),
            tokens.len()
        );
        Tokens {
            tokens,
            saw_generator_expression,
        }
    }
}

pub type ParserResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;
