use tracing::trace;

use super::{
    context::EvaluationContext,
    dag::DagChecker,
    error::{EvalResult, GenexError},
    operators::Call,
    registry::{self, Arity, NodeKind},
};
use crate::{
    ast::{EvaluatorNode, ExpressionContent},
    engine::Engine,
};

/// Walks an evaluator tree parsed from `source`.
pub struct Evaluator<'a, 'm> {
    engine: &'a Engine<'m>,
    source: &'a str,
    dag: Option<&'a DagChecker<'a>>,
}

impl<'a, 'm> Evaluator<'a, 'm> {
    pub fn new(engine: &'a Engine<'m>, source: &'a str, dag: Option<&'a DagChecker<'a>>) -> Self {
        Self {
            engine,
            source,
            dag,
        }
    }

    /// Concatenated results of `nodes`; the first failure fails the whole
    /// sequence.
    pub fn evaluate_sequence(
        &self,
        nodes: &[EvaluatorNode],
        context: &mut EvaluationContext,
    ) -> EvalResult<String> {
        let mut result = String::new();
        for node in nodes {
            result.push_str(&self.evaluate_node(node, context)?);
        }
        Ok(result)
    }

    pub fn evaluate_node(
        &self,
        node: &EvaluatorNode,
        context: &mut EvaluationContext,
    ) -> EvalResult<String> {
        match node {
            EvaluatorNode::Text(span) => Ok(span.slice(self.source).to_string()),
            EvaluatorNode::Content(content) => self.evaluate_content(content, context),
            EvaluatorNode::Malformed(malformed) => Err(context.report_error(
                malformed.span.slice(self.source),
                GenexError::Parse(malformed.error.clone()),
            )),
        }
    }

    fn evaluate_content(
        &self,
        content: &ExpressionContent,
        context: &mut EvaluationContext,
    ) -> EvalResult<String> {
        let expression = content.span.slice(self.source);
        context.enter(self.engine.config().max_evaluation_depth, expression)?;
        let result = self.evaluate_content_inner(content, expression, context);
        context.leave();
        result
    }

    fn evaluate_content_inner(
        &self,
        content: &ExpressionContent,
        expression: &str,
        context: &mut EvaluationContext,
    ) -> EvalResult<String> {
        let identifier = self.evaluate_sequence(&content.identifier, context)?;
        let call = Call {
            engine: self.engine,
            expression,
            dag: self.dag,
        };
        let Ok(kind) = identifier.parse::<NodeKind>() else {
            return Err(call.fail_with(
                context,
                "Expression did not evaluate to a known generator expression",
            ));
        };
        trace!("evaluating $<{}> at depth {}", kind, context.depth());

        if !kind.generates_content() {
            if kind.arity() == Arity::Exact(1) && kind.accepts_arbitrary_content() {
                if content.parameters.is_empty() {
                    return Err(call.fail(
                        context,
                        GenexError::arity(&identifier, "requires a parameter."),
                    ));
                }
            } else {
                self.evaluate_parameters(kind, &identifier, content, &call, context)?;
            }
            return Ok(String::new());
        }

        let parameters = self.evaluate_parameters(kind, &identifier, content, &call, context)?;
        registry::evaluate(kind, &parameters, &call, context)
    }

    fn evaluate_parameters(
        &self,
        kind: NodeKind,
        identifier: &str,
        content: &ExpressionContent,
        call: &Call<'_, '_>,
        context: &mut EvaluationContext,
    ) -> EvalResult<Vec<String>> {
        let arity = kind.arity();
        let mut parameters = Vec::with_capacity(content.parameters.len());
        for (index, parameter) in content.parameters.iter().enumerate() {
            if kind.accepts_arbitrary_content() && arity == Arity::Exact(index + 1) {
                // the last expected parameter takes the rest, arity is satisfied
                parameters.push(self.process_arbitrary_content(
                    kind,
                    identifier,
                    &content.parameters[index..],
                    call,
                    context,
                )?);
                return Ok(parameters);
            }
            parameters.push(self.evaluate_sequence(parameter, context)?);
        }

        let requirement = match arity {
            Arity::Exact(expected) if expected != parameters.len() => Some(match expected {
                0 => "requires no parameters.".to_string(),
                1 => "requires exactly one parameter.".to_string(),
                _ => format!(
                    "requires {} comma separated parameters, but got {} instead.",
                    expected,
                    parameters.len()
                ),
            }),
            Arity::OneOrMore if parameters.is_empty() => {
                Some("requires at least one parameter.".to_string())
            }
            Arity::OneOrZero if parameters.len() > 1 => {
                Some("requires one or zero parameters.".to_string())
            }
            _ => None,
        };
        match requirement {
            Some(requirement) => Err(call.fail(context, GenexError::arity(identifier, requirement))),
            None => Ok(parameters),
        }
    }

    /// Joins the remaining parameters back together with `,`.
    fn process_arbitrary_content(
        &self,
        kind: NodeKind,
        identifier: &str,
        parameters: &[Vec<EvaluatorNode>],
        call: &Call<'_, '_>,
        context: &mut EvaluationContext,
    ) -> EvalResult<String> {
        let mut result = String::new();
        for (index, parameter) in parameters.iter().enumerate() {
            if index > 0 {
                result.push(',');
            }
            for node in parameter {
                if kind.requires_literal_input() && !node.is_text() {
                    return Err(call.fail(
                        context,
                        GenexError::arity(identifier, "requires literal input."),
                    ));
                }
                result.push_str(&self.evaluate_node(node, context)?);
            }
        }
        Ok(result)
    }
}
