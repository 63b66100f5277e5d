//! Link-interface-dependent ("compatible") properties.
//!
//! A dependency can declare, through `COMPATIBLE_INTERFACE_BOOL`,
//! `_STRING`, `_NUMBER_MIN` or `_NUMBER_MAX`, that a property must be
//! consistent between a consumer and everything it links. Reading such a
//! property on the consumer combines its own value with the `INTERFACE_`
//! values of its link-implementation closure.

use std::collections::HashSet;

use strum_macros::{AsRefStr, Display, EnumIter};
use tracing::debug;

use super::{
    context::EvaluationContext,
    error::EvalResult,
    operators::{flag, Call},
};
use crate::{
    engine::Engine,
    list::{expand_list, is_on, parse_long},
    model::{BuildModel, TargetId, TargetType},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, AsRefStr)]
pub enum CompatibleKind {
    #[strum(serialize = "COMPATIBLE_INTERFACE_BOOL")]
    Bool,
    #[strum(serialize = "COMPATIBLE_INTERFACE_STRING")]
    String,
    #[strum(serialize = "COMPATIBLE_INTERFACE_NUMBER_MIN")]
    NumberMin,
    #[strum(serialize = "COMPATIBLE_INTERFACE_NUMBER_MAX")]
    NumberMax,
}

impl CompatibleKind {
    pub const ALL: [CompatibleKind; 4] = [
        CompatibleKind::Bool,
        CompatibleKind::String,
        CompatibleKind::NumberMin,
        CompatibleKind::NumberMax,
    ];

    pub const NUMBERS: [CompatibleKind; 2] = [CompatibleKind::NumberMin, CompatibleKind::NumberMax];

    /// Properties that are compatible without being declared.
    fn implicit(self, property: &str) -> bool {
        match self {
            CompatibleKind::Bool => property == "POSITION_INDEPENDENT_CODE",
            CompatibleKind::String => property == "AUTOUIC_OPTIONS",
            _ => false,
        }
    }
}

/// Link implementation of `target`, followed by the link interfaces of
/// those dependencies, depth first, each target once. Interfaces are read
/// for usage requirements, so `$<LINK_ONLY:...>` items are not followed.
pub fn link_implementation_closure(
    engine: &Engine<'_>,
    target: TargetId,
    context: &mut EvaluationContext,
) -> Vec<TargetId> {
    let mut closure = Vec::new();
    let mut emitted = HashSet::new();
    for library in engine
        .link_implementation_libraries(target, context)
        .unwrap_or_default()
    {
        visit_interface(engine, target, library, context, &mut emitted, &mut closure);
    }
    closure
}

fn visit_interface(
    engine: &Engine<'_>,
    head: TargetId,
    target: TargetId,
    context: &mut EvaluationContext,
    emitted: &mut HashSet<TargetId>,
    closure: &mut Vec<TargetId>,
) {
    if !emitted.insert(target) {
        return;
    }
    closure.push(target);
    for library in engine
        .link_interface_libraries(target, head, true, context)
        .unwrap_or_default()
    {
        visit_interface(engine, head, library, context, emitted, closure);
    }
}

fn takes_part(model: &dyn BuildModel, target: TargetId) -> bool {
    !matches!(
        model.target_type(target),
        TargetType::ObjectLibrary | TargetType::InterfaceLibrary
    )
}

/// Whether `property` of a target whose link closure is `closure` is
/// declared compatible (or implicitly is) for `kind`.
pub fn is_link_interface_dependent(
    model: &dyn BuildModel,
    closure: &[TargetId],
    property: &str,
    kind: CompatibleKind,
) -> bool {
    kind.implicit(property)
        || closure.iter().any(|dependency| {
            model
                .get_property(*dependency, kind.as_ref())
                .is_some_and(|declared| expand_list(&declared).iter().any(|p| p == property))
        })
}

/// Value of `property` on `target` if it is link-interface-dependent for one
/// of `kinds` (checked in order), `None` otherwise.
pub(crate) fn resolve(
    kinds: &[CompatibleKind],
    target: TargetId,
    property: &str,
    call: &Call<'_, '_>,
    context: &mut EvaluationContext,
) -> EvalResult<Option<String>> {
    let model = call.model();
    if !takes_part(model, target) {
        return Ok(None);
    }
    let closure = link_implementation_closure(call.engine, target, context);
    for &kind in kinds {
        if is_link_interface_dependent(model, &closure, property, kind) {
            context.mark_context_sensitive();
            debug!("{} is {} for {}", property, kind, model.target_name(target));
            return consistent_value(kind, target, property, &closure, call, context).map(Some);
        }
    }
    Ok(None)
}

fn consistent_value(
    kind: CompatibleKind,
    target: TargetId,
    property: &str,
    closure: &[TargetId],
    call: &Call<'_, '_>,
    context: &mut EvaluationContext,
) -> EvalResult<String> {
    let model = call.model();
    let own = model.get_property(target, property);
    let explicitly_set = own.is_some();
    let interface_property = format!("INTERFACE_{}", property);

    let mut value = match kind {
        CompatibleKind::Bool => own.map(|v| flag(is_on(&v))),
        _ => own,
    };
    for &dependency in closure {
        let Some(raw) = model.get_property(dependency, &interface_property) else {
            continue;
        };
        let incoming = match kind {
            CompatibleKind::Bool => flag(is_on(&raw)),
            _ => raw,
        };
        let merged = match value.as_deref() {
            None => Some(incoming),
            Some(current) => combine(kind, current, &incoming),
        };
        match merged {
            Some(next) => value = Some(next),
            None => {
                let target_name = model.target_name(target);
                let dependency_name = model.target_name(dependency);
                let message = if explicitly_set {
                    format!(
                        "Property {} on target \"{}\" does\nnot match the INTERFACE_{} \
                         property requirement\nof dependency \"{}\".",
                        property, target_name, property, dependency_name
                    )
                } else {
                    format!(
                        "The INTERFACE_{} property of \"{}\" does\nnot agree with the value \
                         of {} already determined\nfor \"{}\".",
                        property, dependency_name, property, target_name
                    )
                };
                return Err(call.fail_with(context, message));
            }
        }
    }

    Ok(match kind {
        CompatibleKind::Bool => value.unwrap_or_else(|| flag(false)),
        _ => value.unwrap_or_default(),
    })
}

/// Merges two values, `None` when they are incompatible.
fn combine(kind: CompatibleKind, lhs: &str, rhs: &str) -> Option<String> {
    match kind {
        CompatibleKind::Bool | CompatibleKind::String => (lhs == rhs).then(|| lhs.to_string()),
        CompatibleKind::NumberMin | CompatibleKind::NumberMax => {
            let (left, right) = (parse_long(lhs)?, parse_long(rhs)?);
            let keep_left = if kind == CompatibleKind::NumberMax {
                left >= right
            } else {
                left <= right
            };
            Some(if keep_left { lhs } else { rhs }.to_string())
        }
    }
}
