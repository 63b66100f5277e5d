use thiserror::Error;

use crate::analyzer::ParseError;

/// Failure of a single generator expression. Every variant is delivered
/// through [`crate::eval::EvaluationContext::report_error`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenexError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("$<{identifier}> expression {requirement}")]
    Arity {
        identifier: String,
        requirement: String,
    },

    #[error("{0}")]
    Semantic(String),

    /// A target property that (indirectly) reads itself.
    #[error("{0}")]
    Cycle(String),

    #[error("Evaluation exceeds the maximum generator expression depth of {limit}.")]
    DepthExceeded { limit: usize },
}

impl GenexError {
    pub fn semantic<S: Into<String>>(message: S) -> Self {
        GenexError::Semantic(message.into())
    }

    pub fn arity<S: Into<String>>(identifier: &str, requirement: S) -> Self {
        GenexError::Arity {
            identifier: identifier.to_string(),
            requirement: requirement.into(),
        }
    }
}

/// Marker returned once a failure has been reported to the context. The
/// diagnostic itself lives in the context; callers only unwind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reported;

pub type EvalResult<T> = Result<T, Reported>;
