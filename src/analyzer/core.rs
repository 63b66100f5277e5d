use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unterminated generator expression starting at offset {position}.")]
    Unterminated { position: usize },
    #[error("Generator expression at offset {position} nests deeper than {limit} levels.")]
    NestingTooDeep { limit: usize, position: usize },
}

impl ParseError {
    pub fn position(&self) -> usize {
        match self {
            ParseError::Unterminated { position } | ParseError::NestingTooDeep { position, .. } => {
                *position
            }
        }
    }
}
