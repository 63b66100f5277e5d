//! `$<TARGET_PROPERTY:...>`
//!
//! Reads a property of the head target (`$<TARGET_PROPERTY:prop>`) or of a
//! named target (`$<TARGET_PROPERTY:tgt,prop>`). Transitive usage
//! requirements are gathered from the link dependencies on the way:
//!
//! ```text
//! INCLUDE_DIRECTORIES of app
//!   = own value ; $<TARGET_PROPERTY:lib,INTERFACE_INCLUDE_DIRECTORIES> ...
//!                      (over the link implementation of app)
//! INTERFACE_INCLUDE_DIRECTORIES of lib
//!   = own value ; $<TARGET_PROPERTY:base,INTERFACE_INCLUDE_DIRECTORIES> ...
//!                      (over the link interface of lib)
//! ```
//!
//! Every read pushes a [`DagChecker`] frame, so a property that reaches
//! itself again is caught instead of recursing forever.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, instrument};

use super::{
    compatible::{self, CompatibleKind},
    context::EvaluationContext,
    dag::{DagCheckResult, DagChecker, TransitiveProperty},
    error::EvalResult,
    operators::{binary_targets_only, Call},
};
use crate::{
    list::{is_valid_target_name, strip_empty_list_elements},
    model::{TargetId, TargetType},
    policy::{Policy, PolicyStatus},
};

lazy_static! {
    static ref PROPERTY_NAME: Regex =
        Regex::new(r"^[A-Za-z0-9_]+$").expect("property name pattern");
}

#[instrument(level = "debug", skip(call, context))]
pub fn evaluate(
    parameters: &[String],
    call: &Call<'_, '_>,
    context: &mut EvaluationContext,
) -> EvalResult<String> {
    let model = call.model();
    let (target, property) = match parameters {
        [property] => {
            context.mark_head_sensitive();
            let Some(head) = context.head_target else {
                return Err(call.fail_with(
                    context,
                    format!(
                        "{}  Specify the target to read a property from using the \
                         $<TARGET_PROPERTY:tgt,prop> signature instead.",
                        binary_targets_only("TARGET_PROPERTY:prop")
                    ),
                ));
            };
            (head, property.as_str())
        }
        [target_name, property] => {
            if target_name.is_empty() && property.is_empty() {
                return Err(call.fail_with(
                    context,
                    "$<TARGET_PROPERTY:tgt,prop> expression requires a non-empty target \
                     name and property name.",
                ));
            }
            if target_name.is_empty() {
                return Err(call.fail_with(
                    context,
                    "$<TARGET_PROPERTY:tgt,prop> expression requires a non-empty target name.",
                ));
            }
            if !is_valid_target_name(target_name) {
                let message = if PROPERTY_NAME.is_match(property) {
                    "Target name not supported."
                } else {
                    "Target name and property name not supported."
                };
                return Err(call.fail_with(context, message));
            }
            if property == "ALIASED_TARGET" {
                return Ok(model
                    .alias_target(target_name)
                    .map(|real| model.target_name(real))
                    .unwrap_or_default());
            }
            let Some(target) = model.find_target(target_name) else {
                return Err(call.fail_with(
                    context,
                    format!("Target \"{}\" not found.", target_name),
                ));
            };
            context.all_targets.insert(target);
            (target, property.as_str())
        }
        _ => {
            return Err(call.fail_with(
                context,
                "$<TARGET_PROPERTY:...> expression requires one or two parameters",
            ))
        }
    };

    if context.head_target == Some(target) {
        context.seen_target_properties.insert(property.to_string());
    }
    if property == "SOURCES" {
        context.source_sensitive_targets.insert(target);
    }
    if property.is_empty() {
        return Err(call.fail_with(
            context,
            "$<TARGET_PROPERTY:...> expression requires a non-empty property name.",
        ));
    }
    if !PROPERTY_NAME.is_match(property) {
        return Err(call.fail_with(context, "Property name not supported."));
    }

    if property == "LINKER_LANGUAGE" {
        let propagates = model.target_type(target) == TargetType::StaticLibrary;
        if propagates
            && call
                .dag
                .is_some_and(|p| p.evaluating_link_libraries(None) || p.evaluating_sources())
        {
            return Err(call.fail_with(
                context,
                "LINKER_LANGUAGE target property can not be used while evaluating link \
                 libraries for a static library",
            ));
        }
        return Ok(model.linker_language(target, &context.config));
    }

    read_property(target, property, call, context)
}

fn read_property(
    target: TargetId,
    property: &str,
    call: &Call<'_, '_>,
    context: &mut EvaluationContext,
) -> EvalResult<String> {
    let model = call.model();
    let target_name = model.target_name(target);
    let frame = DagChecker::new(&target_name, property, Some(call.expression), call.dag);

    match frame.check() {
        DagCheckResult::SelfReference => {
            let head_name = context.head_target.map(|head| model.target_name(head));
            return Err(frame.report_error(context, call.expression, head_name.as_deref()));
        }
        // Cycles further up resolve to nothing.
        // TODO: report cycles over non-transitive properties as errors.
        DagCheckResult::CyclicReference => return Ok(String::new()),
        DagCheckResult::AlreadySeen if TransitiveProperty::is_interface_property(property) => {
            return Ok(String::new());
        }
        DagCheckResult::AlreadySeen | DagCheckResult::Dag => {}
    }

    let value = model.get_property(target, property);
    let transitive = TransitiveProperty::from_property(property);

    if call.dag.is_some_and(|p| p.evaluating_link_libraries(None)) {
        if transitive.is_some() {
            return Err(call.fail_with(
                context,
                "$<TARGET_PROPERTY:...> expression in link libraries evaluation depends on \
                 target property which is transitive over the link libraries, creating a \
                 recursion.",
            ));
        }
        if value.is_none() {
            return Ok(String::new());
        }
    }

    let (interface_property, is_interface_property) = match transitive {
        Some((kind, is_interface)) => (Some(kind.interface_name()), is_interface),
        None if property.starts_with("COMPILE_DEFINITIONS_")
            && matches!(
                model.policy_status(Policy::Cmp0043),
                PolicyStatus::Warn | PolicyStatus::Old
            ) =>
        {
            (
                Some(TransitiveProperty::CompileDefinitions.interface_name()),
                false,
            )
        }
        None => (None, false),
    };

    let head = match context.head_target {
        Some(head) if is_interface_property => head,
        _ => target,
    };

    let mut linked_content = String::new();
    if let Some(interface_property) = interface_property.as_deref() {
        let libraries = if is_interface_property {
            call.engine
                .link_interface_libraries(target, head, true, context)
        } else {
            call.engine.link_implementation_libraries(target, context)
        };
        if let Some(libraries) = libraries {
            linked_content = linked_targets_content(
                &libraries,
                target,
                head,
                interface_property,
                call,
                context,
                &frame,
            )?;
        }
    }

    let Some(value) = value else {
        if model.is_imported(target) || model.target_type(target) == TargetType::InterfaceLibrary {
            return Ok(linked_content);
        }
        return Ok(
            compatible::resolve(&CompatibleKind::ALL, target, property, call, context)?
                .unwrap_or(linked_content),
        );
    };

    if !model.is_imported(target) && call.dag.is_some_and(|p| !p.evaluating_link_libraries(None))
    {
        if let Some(resolved) =
            compatible::resolve(&CompatibleKind::NUMBERS, target, property, call, context)?
        {
            return Ok(resolved);
        }
    }

    if interface_property.is_none() {
        return Ok(value);
    }
    let mut result =
        call.engine
            .evaluate_dependent(&value, context, Some(head), Some(target), Some(&frame))?;
    if !linked_content.is_empty() {
        if !result.is_empty() {
            result.push(';');
        }
        result.push_str(&linked_content);
    }
    debug!("{} of {} = {:?}", property, target_name, result);
    Ok(result)
}

/// Evaluates `$<TARGET_PROPERTY:dep,prop>` for every linked target except
/// `target` itself.
fn linked_targets_content(
    libraries: &[TargetId],
    target: TargetId,
    head: TargetId,
    interface_property: &str,
    call: &Call<'_, '_>,
    context: &mut EvaluationContext,
    frame: &DagChecker<'_>,
) -> EvalResult<String> {
    let model = call.model();
    let dependencies = libraries
        .iter()
        .filter(|library| **library != target)
        .map(|library| {
            format!(
                "$<TARGET_PROPERTY:{},{}>",
                model.target_name(*library),
                interface_property
            )
        })
        .collect::<Vec<_>>()
        .join(";");
    if dependencies.is_empty() {
        return Ok(String::new());
    }
    let content =
        call.engine
            .evaluate_dependent(&dependencies, context, Some(head), Some(target), Some(frame))?;
    Ok(strip_empty_list_elements(&content))
}
