use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use serde::Serialize;
use strum_macros::Display;
use tracing::{error, warn};

use super::error::{GenexError, Reported};
use crate::model::TargetId;

/// Inputs of one evaluation: which configuration, for which consumer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationRequest {
    pub config: String,
    /// The target consuming the evaluated string.
    pub head_target: Option<TargetId>,
    /// The target owning the string being evaluated.
    pub current_target: Option<TargetId>,
    /// Compile language, for `$<COMPILE_LANGUAGE>`.
    pub language: String,
    /// Record diagnostics without logging them.
    pub quiet: bool,
    pub evaluate_for_buildsystem: bool,
}

impl EvaluationRequest {
    pub fn new(config: &str) -> Self {
        Self {
            config: config.to_string(),
            ..Self::default()
        }
    }

    /// Sets the head target, and the current target too unless one was set.
    pub fn with_head_target(mut self, target: TargetId) -> Self {
        self.head_target = Some(target);
        if self.current_target.is_none() {
            self.current_target = Some(target);
        }
        self
    }

    pub fn with_current_target(mut self, target: TargetId) -> Self {
        self.current_target = Some(target);
        self
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn for_buildsystem(mut self, enabled: bool) -> Self {
        self.evaluate_for_buildsystem = enabled;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Text of the expression that raised it.
    pub expression: String,
    pub message: String,
    /// Structured form of errors; `None` for warnings.
    pub error: Option<GenexError>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Error => write!(
                f,
                "Error evaluating generator expression:\n  {}\n{}",
                self.expression, self.message
            ),
            Severity::Warning => write!(f, "{}\n  {}", self.message, self.expression),
        }
    }
}

/// An object file contributed by `$<TARGET_OBJECTS>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalObject {
    pub path: String,
    pub library: String,
}

/// Mutable session shared by every node of one evaluation (one
/// configuration, one head target). Operators record what they read here so
/// the caller can tell afterwards what the result depends on.
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    pub config: String,
    pub language: String,
    pub quiet: bool,
    pub evaluate_for_buildsystem: bool,
    pub head_target: Option<TargetId>,
    pub current_target: Option<TargetId>,

    /// Targets whose artifacts the result refers to.
    pub depend_targets: BTreeSet<TargetId>,
    /// Every target named by the evaluated expressions.
    pub all_targets: BTreeSet<TargetId>,
    /// Targets whose `SOURCES` were read.
    pub source_sensitive_targets: BTreeSet<TargetId>,
    /// Properties read from the head target.
    pub seen_target_properties: BTreeSet<String>,
    /// target → language → standard required by `$<COMPILE_FEATURES>` while
    /// evaluating link libraries.
    pub max_language_standard: BTreeMap<TargetId, BTreeMap<String, String>>,
    pub external_objects: Vec<ExternalObject>,

    had_error: bool,
    had_context_sensitive_condition: bool,
    had_head_sensitive_condition: bool,
    diagnostics: Vec<Diagnostic>,
    depth: usize,
}

impl EvaluationContext {
    pub fn new(request: &EvaluationRequest) -> Self {
        Self {
            config: request.config.clone(),
            language: request.language.clone(),
            quiet: request.quiet,
            evaluate_for_buildsystem: request.evaluate_for_buildsystem,
            head_target: request.head_target,
            current_target: request.current_target.or(request.head_target),
            depend_targets: BTreeSet::new(),
            all_targets: BTreeSet::new(),
            source_sensitive_targets: BTreeSet::new(),
            seen_target_properties: BTreeSet::new(),
            max_language_standard: BTreeMap::new(),
            external_objects: Vec::new(),
            had_error: false,
            had_context_sensitive_condition: false,
            had_head_sensitive_condition: false,
            diagnostics: Vec::new(),
            depth: 0,
        }
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    /// The result depends on the configuration or on target policies.
    pub fn had_context_sensitive_condition(&self) -> bool {
        self.had_context_sensitive_condition
    }

    /// The result depends on which head target consumes it.
    pub fn had_head_sensitive_condition(&self) -> bool {
        self.had_head_sensitive_condition
    }

    pub fn mark_context_sensitive(&mut self) {
        self.had_context_sensitive_condition = true;
    }

    pub fn mark_head_sensitive(&mut self) {
        self.had_head_sensitive_condition = true;
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    /// Records a fatal diagnostic for `expression`.
    pub fn report_error(&mut self, expression: &str, error: GenexError) -> Reported {
        self.had_error = true;
        let diagnostic = Diagnostic {
            severity: Severity::Error,
            expression: expression.to_string(),
            message: error.to_string(),
            error: Some(error),
        };
        if !self.quiet {
            error!("{}", diagnostic);
        }
        self.diagnostics.push(diagnostic);
        Reported
    }

    pub fn report_warning(&mut self, expression: &str, message: String) {
        let diagnostic = Diagnostic {
            severity: Severity::Warning,
            expression: expression.to_string(),
            message,
            error: None,
        };
        if !self.quiet {
            warn!("{}", diagnostic);
        }
        self.diagnostics.push(diagnostic);
    }

    /// Enters one level of expression nesting.
    pub(crate) fn enter(&mut self, limit: usize, expression: &str) -> Result<(), Reported> {
        if self.depth >= limit {
            return Err(self.report_error(expression, GenexError::DepthExceeded { limit }));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Runs `f` with the head and current targets rebound, restoring them
    /// afterwards. Everything else `f` records stays in this context.
    pub(crate) fn with_targets<R>(
        &mut self,
        head: Option<TargetId>,
        current: Option<TargetId>,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let saved_head = std::mem::replace(&mut self.head_target, head);
        let saved_current = std::mem::replace(&mut self.current_target, current);
        let result = f(self);
        self.head_target = saved_head;
        self.current_target = saved_current;
        result
    }
}
