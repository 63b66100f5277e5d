use thiserror::Error;

use crate::{analyzer::ParseError, config::ConfigError, eval::GenexError, model::ModelError};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Evaluation error: {0}")]
    Evaluation(#[from] GenexError),
    #[error("Target \"{0}\" not found")]
    UnknownTarget(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type GenexResult<T> = Result<T, Error>;
