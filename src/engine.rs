//! # Engine
//!
//! Entry point tying the pipeline together:
//!
//! ```text
//! input ─ tokenizer ─ analyzer ─ CompiledExpression (cached per input)
//!                                        │
//!              EvaluationRequest ─ EvaluationContext ─ evaluate ─ Evaluation
//! ```
//!
//! One engine serves one [`BuildModel`]. Parsed expressions are cached by
//! their input string; every evaluation gets a fresh context.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use tracing::{debug, instrument, trace};

use crate::{
    config::EngineConfig,
    eval::{DagChecker, EvalResult, EvaluationContext, EvaluationRequest, Reported, TransitiveProperty},
    expression::CompiledExpression,
    list::{expand_list, strip_empty_list_elements},
    model::{BuildModel, LinkItems, TargetId},
};

/// Result of one top-level evaluation.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub output: String,
    pub context: EvaluationContext,
}

impl Evaluation {
    pub fn had_error(&self) -> bool {
        self.context.had_error()
    }
}

pub struct Engine<'m> {
    model: &'m dyn BuildModel,
    config: EngineConfig,
    cache: RefCell<HashMap<String, Rc<CompiledExpression>>>,
}

impl<'m> Engine<'m> {
    pub fn new(model: &'m dyn BuildModel) -> Self {
        Self::with_config(model, EngineConfig::default())
    }

    pub fn with_config(model: &'m dyn BuildModel, config: EngineConfig) -> Self {
        Self {
            model,
            config,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn model(&self) -> &'m dyn BuildModel {
        self.model
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn compile(&self, input: &str) -> Rc<CompiledExpression> {
        if !self.config.cache_expressions {
            return Rc::new(CompiledExpression::parse(input, self.config.max_parse_depth));
        }
        if let Some(cached) = self.cache.borrow().get(input) {
            return Rc::clone(cached);
        }
        let compiled = Rc::new(CompiledExpression::parse(input, self.config.max_parse_depth));
        self.cache
            .borrow_mut()
            .insert(input.to_string(), Rc::clone(&compiled));
        compiled
    }

    pub fn cached_expressions(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
    }

    /// A request for `config` carrying the engine-wide defaults.
    pub fn request(&self, config: &str) -> EvaluationRequest {
        EvaluationRequest::new(config)
            .quiet(self.config.quiet)
            .for_buildsystem(self.config.evaluate_for_buildsystem)
    }

    #[instrument(level = "debug", skip(self, request), fields(config = %request.config))]
    pub fn evaluate(&self, input: &str, request: &EvaluationRequest) -> Evaluation {
        let mut context = EvaluationContext::new(request);
        let output = self.evaluate_with(input, &mut context, None);
        Evaluation { output, context }
    }

    /// Evaluates `input` inside an existing context, e.g. while a caller is
    /// already walking a target property.
    pub fn evaluate_with(
        &self,
        input: &str,
        context: &mut EvaluationContext,
        dag: Option<&DagChecker<'_>>,
    ) -> String {
        self.compile(input).evaluate(self, context, dag)
    }

    /// Evaluates the value of `property` on `target` the way the target
    /// itself consumes it: `target` is head and current target, a root DAG
    /// frame (target, property) is in place, and for transitive properties
    /// the `INTERFACE_` values of the link implementation are appended.
    #[instrument(level = "debug", skip(self, request))]
    pub fn evaluate_target_property(
        &self,
        target: TargetId,
        property: &str,
        request: &EvaluationRequest,
    ) -> Evaluation {
        let mut context = EvaluationContext::new(request);
        context.head_target = Some(target);
        context.current_target = Some(target);

        let target_name = self.model.target_name(target);
        let root = DagChecker::root(&target_name, property);
        let mut input = self.model.get_property(target, property).unwrap_or_default();

        if let Some((transitive, false)) = TransitiveProperty::from_property(property) {
            let interface_property = transitive.interface_name();
            let dependencies = self
                .link_implementation_libraries(target, &mut context)
                .unwrap_or_default()
                .into_iter()
                .filter(|library| *library != target)
                .map(|library| {
                    format!(
                        "$<TARGET_PROPERTY:{},{}>",
                        self.model.target_name(library),
                        interface_property
                    )
                });
            for dependency in dependencies {
                input.push(';');
                input.push_str(&dependency);
            }
        }

        let output = self.evaluate_with(&input, &mut context, Some(&root));
        debug!("{} of {} = {:?}", property, target_name, output);
        Evaluation {
            output: strip_empty_list_elements(&output),
            context,
        }
    }

    /// Targets named by the link interface of `target` as seen from `head`.
    /// With `usage_requirements_only` the walk collects usage requirements,
    /// so `$<LINK_ONLY:...>` items are left out.
    pub fn link_interface_libraries(
        &self,
        target: TargetId,
        head: TargetId,
        usage_requirements_only: bool,
        context: &mut EvaluationContext,
    ) -> Option<Vec<TargetId>> {
        let items = self.model.link_interface_items(target, &context.config)?;
        Some(self.expand_link_items(target, head, &items, usage_requirements_only, context))
    }

    /// Targets `target` links against itself.
    pub fn link_implementation_libraries(
        &self,
        target: TargetId,
        context: &mut EvaluationContext,
    ) -> Option<Vec<TargetId>> {
        let items = self.model.link_implementation_items(target, &context.config)?;
        Some(self.expand_link_items(target, target, &items, false, context))
    }

    /// Evaluates link items under their own root frame (target, property),
    /// then keeps the items that name targets. Errors are recorded in
    /// `context`; what did evaluate is still used.
    fn expand_link_items(
        &self,
        target: TargetId,
        head: TargetId,
        items: &LinkItems,
        usage_requirements_only: bool,
        context: &mut EvaluationContext,
    ) -> Vec<TargetId> {
        let target_name = self.model.target_name(target);
        let root = DagChecker::root(&target_name, &items.property);
        if usage_requirements_only {
            root.set_transitive_properties_only();
        }
        let evaluated = context.with_targets(Some(head), Some(target), |context| {
            self.evaluate_with(&items.value, context, Some(&root))
        });
        trace!("{} of {} = {:?}", items.property, target_name, evaluated);
        expand_list(&evaluated)
            .iter()
            .filter_map(|item| self.model.find_target(item))
            .collect()
    }

    /// Evaluates text produced while evaluating another expression (a
    /// property value, gathered dependency content) with the head and
    /// current target rebound. Everything recorded lands in `context`.
    pub(crate) fn evaluate_dependent(
        &self,
        input: &str,
        context: &mut EvaluationContext,
        head: Option<TargetId>,
        current: Option<TargetId>,
        dag: Option<&DagChecker<'_>>,
    ) -> EvalResult<String> {
        let errors_before = context.errors().count();
        let output = context.with_targets(head, current, |context| {
            self.evaluate_with(input, context, dag)
        });
        if context.errors().count() > errors_before {
            return Err(Reported);
        }
        Ok(output)
    }
}
