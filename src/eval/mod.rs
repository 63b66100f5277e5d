//! # Evaluation
//!
//! Turns an evaluator tree into a string for one configuration and one head
//! target, recording on the way what the result depends on.
//!
//! # Core Components
//!
//! ## Evaluator
//! Walks the tree, evaluates identifiers and parameters, enforces arity and
//! dispatches to the operators ([`evaluator`]).
//!
//! ## Node Registry
//! The closed set of expressions and their parameter contracts
//! ([`registry`]). Operators live in [`operators`], [`target_property`],
//! [`artifact`], [`features`] and [`compatible`].
//!
//! ## Evaluation Context
//! Mutable session threaded through every node: configuration, head and
//! current target, sensitivity flags, collected target sets and diagnostics
//! ([`context`]).
//!
//! ## DAG Checker
//! Frames pushed by target property reads, used to detect self references
//! and cycles ([`dag`]).
//!
//! # Evaluation Pipeline
//!
//! ```text
//! $<identifier:p1,p2>
//!   1. evaluate identifier nodes  -> "identifier"
//!   2. look up NodeKind           -> arity, content flags
//!   3. evaluate parameters        -> ["p1", "p2"]
//!   4. registry::evaluate         -> result
//! ```
//!
//! Any failure is reported once to the context and unwinds as
//! [`error::Reported`] up to the top-level node.

pub mod artifact;
pub mod compatible;
pub mod context;
pub mod dag;
pub mod error;
pub mod evaluator;
pub mod features;
pub mod operators;
pub mod registry;
pub mod target_property;

pub use context::{
    Diagnostic, EvaluationContext, EvaluationRequest, ExternalObject, Severity,
};
pub use dag::{DagCheckResult, DagChecker, TransitiveProperty};
pub use error::{EvalResult, GenexError, Reported};
pub use evaluator::Evaluator;
pub use registry::{Arity, NodeKind};
