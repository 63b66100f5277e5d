//! Operators that need no more than their parameters, the context and a
//! few model facts. Target properties, artifacts and compile features live
//! in their own modules.

use std::cmp::Ordering;

use lazy_static::lazy_static;
use regex::Regex;

use super::{
    context::EvaluationContext,
    dag::DagChecker,
    error::{EvalResult, GenexError, Reported},
};
use crate::{
    engine::Engine,
    list::{expand_list, is_off, parse_integer, version_compare},
    model::BuildModel,
    policy::{Policy, PolicyStatus},
};

lazy_static! {
    static ref COMPILER_ID: Regex = Regex::new(r"^[A-Za-z0-9_]*$").expect("compiler id pattern");
    static ref COMPILER_VERSION: Regex =
        Regex::new(r"^[0-9\.]*$").expect("compiler version pattern");
    static ref CONFIG_NAME: Regex = Regex::new(r"^[A-Za-z0-9_]*$").expect("config name pattern");
}

/// What an operator sees of its surroundings besides the context.
pub struct Call<'a, 'm> {
    pub engine: &'a Engine<'m>,
    /// Text of the expression being evaluated, for diagnostics.
    pub expression: &'a str,
    /// Frame of the target property currently being evaluated, if any.
    pub dag: Option<&'a DagChecker<'a>>,
}

impl<'a, 'm> Call<'a, 'm> {
    pub fn model(&self) -> &'m dyn BuildModel {
        self.engine.model()
    }

    pub fn fail(&self, context: &mut EvaluationContext, error: GenexError) -> Reported {
        context.report_error(self.expression, error)
    }

    pub fn fail_with(&self, context: &mut EvaluationContext, message: impl Into<String>) -> Reported {
        self.fail(context, GenexError::semantic(message))
    }
}

pub fn flag(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}

/// `AND` / `OR`: every parameter must be `0` or `1`; the first `failure`
/// value decides the result.
pub fn logical(
    parameters: &[String],
    name: &str,
    success: &str,
    failure: &str,
    call: &Call<'_, '_>,
    context: &mut EvaluationContext,
) -> EvalResult<String> {
    for parameter in parameters {
        if parameter == failure {
            return Ok(failure.to_string());
        }
        if parameter != success {
            return Err(call.fail_with(
                context,
                format!("Parameters to $<{}> must resolve to either '0' or '1'.", name),
            ));
        }
    }
    Ok(success.to_string())
}

pub fn not(
    parameters: &[String],
    call: &Call<'_, '_>,
    context: &mut EvaluationContext,
) -> EvalResult<String> {
    match parameters.first().map(String::as_str) {
        Some("0") => Ok("1".to_string()),
        Some("1") => Ok("0".to_string()),
        _ => Err(call.fail_with(
            context,
            "$<NOT> parameter must resolve to exactly one '0' or '1' value.",
        )),
    }
}

pub fn bool_value(value: &str) -> String {
    flag(!is_off(value))
}

pub fn equal(
    parameters: &[String],
    call: &Call<'_, '_>,
    context: &mut EvaluationContext,
) -> EvalResult<String> {
    let mut numbers = [0i64; 2];
    for (slot, parameter) in numbers.iter_mut().zip(parameters) {
        *slot = parse_integer(parameter).ok_or_else(|| {
            call.fail_with(
                context,
                format!("$<EQUAL> parameter {} is not a valid integer.", parameter),
            )
        })?;
    }
    Ok(flag(numbers[0] == numbers[1]))
}

pub fn version(parameters: &[String], expected: Ordering) -> String {
    flag(version_compare(&parameters[0], &parameters[1]) == expected)
}

pub fn compiler_id(
    language: &str,
    parameters: &[String],
    call: &Call<'_, '_>,
    context: &mut EvaluationContext,
) -> EvalResult<String> {
    if context.head_target.is_none() {
        return Err(call.fail_with(context, binary_targets_only(&format!("{}_COMPILER_ID", language))));
    }
    let id = call
        .model()
        .definition(&format!("CMAKE_{}_COMPILER_ID", language))
        .unwrap_or_default();
    let Some(wanted) = parameters.first() else {
        return Ok(id);
    };
    if !COMPILER_ID.is_match(wanted) {
        return Err(call.fail_with(context, "Expression syntax not recognized."));
    }
    if id.is_empty() {
        return Ok(flag(wanted.is_empty()));
    }
    if *wanted == id {
        return Ok(flag(true));
    }
    if !wanted.eq_ignore_ascii_case(&id) {
        return Ok(flag(false));
    }
    match call.model().policy_status(Policy::Cmp0044) {
        PolicyStatus::Warn => {
            context.report_warning(call.expression, Policy::Cmp0044.warning());
            Ok(flag(true))
        }
        PolicyStatus::Old => Ok(flag(true)),
        PolicyStatus::New | PolicyStatus::RequiredIfUsed | PolicyStatus::RequiredAlways => {
            Ok(flag(false))
        }
    }
}

pub fn compiler_version(
    language: &str,
    parameters: &[String],
    call: &Call<'_, '_>,
    context: &mut EvaluationContext,
) -> EvalResult<String> {
    if context.head_target.is_none() {
        return Err(call.fail_with(
            context,
            binary_targets_only(&format!("{}_COMPILER_VERSION", language)),
        ));
    }
    let version = call
        .model()
        .definition(&format!("CMAKE_{}_COMPILER_VERSION", language))
        .unwrap_or_default();
    let Some(wanted) = parameters.first() else {
        return Ok(version);
    };
    if !COMPILER_VERSION.is_match(wanted) {
        return Err(call.fail_with(context, "Expression syntax not recognized."));
    }
    if version.is_empty() {
        return Ok(flag(wanted.is_empty()));
    }
    Ok(flag(version_compare(wanted, &version) == Ordering::Equal))
}

pub fn platform_id(
    parameters: &[String],
    call: &Call<'_, '_>,
    _context: &mut EvaluationContext,
) -> EvalResult<String> {
    let platform = call
        .model()
        .definition("CMAKE_SYSTEM_NAME")
        .unwrap_or_default();
    match parameters.first() {
        None => Ok(platform),
        Some(wanted) if platform.is_empty() => Ok(flag(wanted.is_empty())),
        Some(wanted) => Ok(flag(*wanted == platform)),
    }
}

pub fn config(
    parameters: &[String],
    call: &Call<'_, '_>,
    context: &mut EvaluationContext,
) -> EvalResult<String> {
    let Some(wanted) = parameters.first() else {
        context.mark_context_sensitive();
        return Ok(context.config.clone());
    };
    if !CONFIG_NAME.is_match(wanted) {
        return Err(call.fail_with(context, "Expression syntax not recognized."));
    }
    context.mark_context_sensitive();
    if context.config.is_empty() {
        return Ok(flag(wanted.is_empty()));
    }
    if wanted.eq_ignore_ascii_case(&context.config) {
        return Ok(flag(true));
    }

    let model = call.model();
    if let Some(current) = context.current_target.filter(|t| model.is_imported(*t)) {
        let key = format!(
            "MAP_IMPORTED_CONFIG_{}",
            context.config.to_ascii_uppercase()
        );
        if let Some(mapped) = model.get_property(current, &key) {
            let upper = wanted.to_ascii_uppercase();
            if expand_list(&mapped)
                .iter()
                .any(|m| m.to_ascii_uppercase() == upper)
            {
                return Ok(flag(true));
            }
        }
    }
    Ok(flag(false))
}

pub fn target_policy(
    parameters: &[String],
    call: &Call<'_, '_>,
    context: &mut EvaluationContext,
) -> EvalResult<String> {
    let Some(head) = context.head_target else {
        return Err(call.fail_with(context, binary_targets_only("TARGET_POLICY:prop")));
    };
    context.mark_context_sensitive();
    context.mark_head_sensitive();

    let requested = parameters.first().map(String::as_str).unwrap_or_default();
    let policy = match requested.parse::<Policy>() {
        Ok(policy) if policy.is_target_policy() => policy,
        _ => {
            let listed: String = Policy::target_policies()
                .map(|p| format!(" * {}\n", p))
                .collect();
            return Err(call.fail_with(
                context,
                format!(
                    "$<TARGET_POLICY:prop> may only be used with a limited number of \
                     policies.  Currently it may be used with the following policies:\n{}",
                    listed
                ),
            ));
        }
    };

    match call.model().target_policy_status(head, policy) {
        PolicyStatus::Warn => {
            context.report_warning(call.expression, policy.warning());
            Ok(flag(false))
        }
        PolicyStatus::Old | PolicyStatus::RequiredIfUsed | PolicyStatus::RequiredAlways => {
            Ok(flag(false))
        }
        PolicyStatus::New => Ok(flag(true)),
    }
}

pub fn install_prefix(call: &Call<'_, '_>, context: &mut EvaluationContext) -> EvalResult<String> {
    Err(call.fail_with(
        context,
        "INSTALL_PREFIX is a marker for install(EXPORT) only.  It should never be evaluated.",
    ))
}

pub fn compile_language(
    parameters: &[String],
    call: &Call<'_, '_>,
    context: &mut EvaluationContext,
) -> EvalResult<String> {
    if context.language.is_empty() {
        return Err(call.fail_with(
            context,
            "$<COMPILE_LANGUAGE:...> may only be used to specify include directories \
             compile definitions, compile options and to evaluate components of the \
             file(GENERATE) command.",
        ));
    }

    let model = call.model();
    if let Some(wanted) = parameters.first() {
        if !model.enabled_languages().iter().any(|l| l == wanted) {
            return Err(call.fail_with(context, "$<COMPILE_LANGUAGE:...> Unknown language."));
        }
    }

    let generator = model.generator_name();
    if generator.contains("Visual Studio") {
        return Err(call.fail_with(
            context,
            "$<COMPILE_LANGUAGE:...> may not be used with Visual Studio generators.",
        ));
    } else if generator.contains("Xcode") {
        if call.dag.is_some_and(|d| {
            d.evaluating_compile_definitions() || d.evaluating_include_directories()
        }) {
            return Err(call.fail_with(
                context,
                "$<COMPILE_LANGUAGE:...> may only be used with COMPILE_OPTIONS with the \
                 Xcode generator.",
            ));
        }
    } else if !["Makefiles", "Ninja", "Watcom WMake"]
        .iter()
        .any(|g| generator.contains(g))
    {
        return Err(call.fail_with(
            context,
            "$<COMPILE_LANGUAGE:...> not supported for this generator.",
        ));
    }

    match parameters.first() {
        None => Ok(context.language.clone()),
        Some(wanted) => Ok(flag(*wanted == context.language)),
    }
}

/// Content is dropped when the walk only collects transitive usage
/// requirements.
pub fn link_only(parameters: &[String], call: &Call<'_, '_>) -> String {
    if call.dag.is_some_and(|d| d.transitive_properties_only()) {
        String::new()
    } else {
        parameters.first().cloned().unwrap_or_default()
    }
}

pub(crate) fn binary_targets_only(expression: &str) -> String {
    format!(
        "$<{}> may only be used with binary targets.  It may not be used with \
         add_custom_command or add_custom_target.",
        expression
    )
}
