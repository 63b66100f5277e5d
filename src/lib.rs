//! # genex: build-system generator expressions
//!
//! Evaluates `$<...>` generator expressions embedded in target property
//! strings, once per build configuration and consuming ("head") target.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Property string → Tokenizer → Analyzer → Evaluator tree → Evaluation
//! ```
//!
//! ### Stage 1: Tokenization
//!
//! The [`tokenizer`] module splits the input into text runs, `$<`, `>`,
//! `:` and `,` tokens. Separators only count inside an expression.
//!
//! ### Stage 2: Parsing
//!
//! The [`analyzer`] module builds the evaluator tree ([`ast`]): text nodes
//! and expression nodes with an identifier and parameter lists, each of
//! which may nest further expressions. Unterminated input becomes a
//! malformed node reported at evaluation time.
//!
//! ### Stage 3: Evaluation
//!
//! The [`eval`] module walks the tree against a [`model::BuildModel`] for
//! one [`eval::EvaluationRequest`], dispatching to the node registry and
//! recording what the result depends on in the [`eval::EvaluationContext`].
//!
//! ## Entry Points
//!
//! - [`engine::Engine`]: compile (cached) and evaluate strings or target
//!   properties
//! - [`expression`]: compiled expressions plus export preprocessing and
//!   genex-aware list splitting
//! - [`model::InMemoryModel`]: a JSON-loadable project description
//! - [`config::EngineConfig`]: depth limits and defaults

pub mod analyzer;
pub mod ast;
pub mod config;
pub mod engine;
pub mod error;
pub mod eval;
pub mod expression;
pub mod list;
pub mod model;
pub mod policy;
pub mod tokenizer;

// Re-exports
pub use config::EngineConfig;
pub use engine::{Engine, Evaluation};
pub use error::*;
pub use eval::{EvaluationContext, EvaluationRequest, GenexError};
pub use expression::{CompiledExpression, PreprocessMode};
pub use model::{BuildModel, InMemoryModel, ProjectSpec, TargetId, TargetSpec, TargetType};

#[cfg(test)]
mod tests {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    #[ctor::ctor]
    fn init_tests() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
    }
}
