//! `$<COMPILE_FEATURES:...>`: whether the head target's compiler and
//! language standard provide every listed feature.

use std::collections::BTreeMap;

use strum_macros::{AsRefStr, Display};

use super::{context::EvaluationContext, error::EvalResult, operators::Call};
use crate::{list::expand_list, model::TargetId};

pub const C_FEATURES: &[&str] = &[
    "c_function_prototypes",
    "c_restrict",
    "c_static_assert",
    "c_variadic_macros",
];

pub const CXX_FEATURES: &[&str] = &[
    "cxx_aggregate_default_initializers",
    "cxx_alias_templates",
    "cxx_alignas",
    "cxx_alignof",
    "cxx_attributes",
    "cxx_attribute_deprecated",
    "cxx_auto_type",
    "cxx_binary_literals",
    "cxx_constexpr",
    "cxx_contextual_conversions",
    "cxx_decltype_incomplete_return_types",
    "cxx_decltype",
    "cxx_decltype_auto",
    "cxx_default_function_template_args",
    "cxx_defaulted_functions",
    "cxx_defaulted_move_initializers",
    "cxx_delegating_constructors",
    "cxx_deleted_functions",
    "cxx_digit_separators",
    "cxx_enum_forward_declarations",
    "cxx_explicit_conversions",
    "cxx_extended_friend_declarations",
    "cxx_extern_templates",
    "cxx_final",
    "cxx_func_identifier",
    "cxx_generalized_initializers",
    "cxx_generic_lambdas",
    "cxx_inheriting_constructors",
    "cxx_inline_namespaces",
    "cxx_lambdas",
    "cxx_lambda_init_captures",
    "cxx_local_type_template_args",
    "cxx_long_long_type",
    "cxx_noexcept",
    "cxx_nonstatic_member_init",
    "cxx_nullptr",
    "cxx_override",
    "cxx_range_for",
    "cxx_raw_string_literals",
    "cxx_reference_qualified_functions",
    "cxx_relaxed_constexpr",
    "cxx_return_type_deduction",
    "cxx_right_angle_brackets",
    "cxx_rvalue_references",
    "cxx_sizeof_member",
    "cxx_static_assert",
    "cxx_strong_enums",
    "cxx_template_template_parameters",
    "cxx_thread_local",
    "cxx_trailing_return_types",
    "cxx_unicode_literals",
    "cxx_uniform_initialization",
    "cxx_unrestricted_unions",
    "cxx_user_literals",
    "cxx_variable_templates",
    "cxx_variadic_macros",
    "cxx_variadic_templates",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, AsRefStr)]
pub enum FeatureLanguage {
    #[strum(serialize = "C")]
    C,
    #[strum(serialize = "CXX")]
    Cxx,
}

impl FeatureLanguage {
    pub fn of_feature(feature: &str) -> Option<Self> {
        if C_FEATURES.contains(&feature) {
            Some(FeatureLanguage::C)
        } else if CXX_FEATURES.contains(&feature) {
            Some(FeatureLanguage::Cxx)
        } else {
            None
        }
    }

    /// Standards from oldest to newest.
    pub fn standards(self) -> &'static [&'static str] {
        match self {
            FeatureLanguage::C => &["90", "99", "11"],
            FeatureLanguage::Cxx => &["98", "11", "14"],
        }
    }

    fn standard_rank(self, standard: &str) -> Option<usize> {
        self.standards().iter().position(|s| *s == standard)
    }
}

pub fn evaluate(
    parameters: &[String],
    call: &Call<'_, '_>,
    context: &mut EvaluationContext,
) -> EvalResult<String> {
    let Some(head) = context.head_target else {
        return Err(call.fail_with(
            context,
            super::operators::binary_targets_only("COMPILE_FEATURE"),
        ));
    };
    context.mark_head_sensitive();
    let model = call.model();

    let mut tested: BTreeMap<FeatureLanguage, Vec<&str>> = BTreeMap::new();
    let mut available: BTreeMap<FeatureLanguage, Vec<String>> = BTreeMap::new();
    for feature in parameters {
        let Some(language) = FeatureLanguage::of_feature(feature) else {
            return Err(call.fail_with(
                context,
                format!(
                    "specified unknown feature \"{}\" for target \"{}\".",
                    feature,
                    model.target_name(head)
                ),
            ));
        };
        tested.entry(language).or_default().push(feature);
        if available.contains_key(&language) {
            continue;
        }
        match model
            .definition(&format!("CMAKE_{}_COMPILE_FEATURES", language))
            .filter(|known| !known.is_empty())
        {
            Some(known) => {
                available.insert(language, expand_list(&known));
            }
            None => {
                return Err(call.fail_with(
                    context,
                    format!(
                        "no known features for {} compiler\n\"{}\"\nversion {}.",
                        language,
                        model
                            .definition(&format!("CMAKE_{}_COMPILER_ID", language))
                            .unwrap_or_default(),
                        model
                            .definition(&format!("CMAKE_{}_COMPILER_VERSION", language))
                            .unwrap_or_default()
                    ),
                ));
            }
        }
    }

    let evaluating_link_libraries = call.dag.is_some_and(|d| d.evaluating_link_libraries(None));
    for (language, features) in &tested {
        let language_available = available.get(language).cloned().unwrap_or_default();
        let standard_default =
            model.definition(&format!("CMAKE_{}_STANDARD_DEFAULT", language));
        for feature in features {
            if !language_available.iter().any(|f| f == feature) {
                return Ok("0".to_string());
            }
            // compiler without standard levels: every known feature is available
            if standard_default.as_deref() == Some("") {
                continue;
            }
            if !have_standard_available(*language, head, feature, call, context)? {
                if !evaluating_link_libraries {
                    return Ok("0".to_string());
                }
                let level = model
                    .get_property(head, &format!("{}_STANDARD", language))
                    .or_else(|| standard_default.clone());
                if let Some(level) = level {
                    context
                        .max_language_standard
                        .entry(head)
                        .or_default()
                        .insert(language.to_string(), level);
                }
            }
        }
    }
    Ok("1".to_string())
}

/// Whether the standard `head` compiles with already covers `feature`.
fn have_standard_available(
    language: FeatureLanguage,
    head: TargetId,
    feature: &str,
    call: &Call<'_, '_>,
    context: &mut EvaluationContext,
) -> EvalResult<bool> {
    let model = call.model();
    let Some(default) = model.definition(&format!("CMAKE_{}_STANDARD_DEFAULT", language)) else {
        context.report_warning(
            call.expression,
            format!(
                "CMAKE_{}_STANDARD_DEFAULT is not set.  COMPILE_FEATURES support not fully \
                 configured for this compiler.",
                language
            ),
        );
        return Ok(true);
    };
    if language.standard_rank(&default).is_none() {
        context.report_warning(
            call.expression,
            format!(
                "The CMAKE_{}_STANDARD_DEFAULT variable contains an invalid value: \"{}\".",
                language, default
            ),
        );
        return Ok(false);
    }

    let existing = model
        .get_property(head, &format!("{}_STANDARD", language))
        .unwrap_or(default);
    let Some(existing_rank) = language.standard_rank(&existing) else {
        return Err(call.fail_with(
            context,
            format!(
                "The {}_STANDARD property on target \"{}\" contained an invalid value: \"{}\".",
                language,
                model.target_name(head),
                existing
            ),
        ));
    };

    let needed = language
        .standards()
        .iter()
        .enumerate()
        .filter(|(_, standard)| {
            model
                .definition(&format!("CMAKE_{}{}_COMPILE_FEATURES", language, standard))
                .is_some_and(|listed| expand_list(&listed).iter().any(|f| f == feature))
        })
        .map(|(rank, _)| rank)
        .max();
    Ok(needed.map_or(true, |rank| existing_rank >= rank))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_tables() {
        assert_eq!(C_FEATURES.len(), 4);
        assert_eq!(CXX_FEATURES.len(), 57);
        assert_eq!(FeatureLanguage::of_feature("c_restrict"), Some(FeatureLanguage::C));
        assert_eq!(FeatureLanguage::of_feature("cxx_constexpr"), Some(FeatureLanguage::Cxx));
        assert_eq!(FeatureLanguage::of_feature("rust_borrowck"), None);
    }

    #[test]
    fn test_standard_ordering() {
        assert_eq!(FeatureLanguage::C.standard_rank("99"), Some(1));
        assert_eq!(FeatureLanguage::Cxx.standard_rank("14"), Some(2));
        assert_eq!(FeatureLanguage::Cxx.standard_rank("17"), None);
        assert_eq!(FeatureLanguage::Cxx.to_string(), "CXX");
    }
}
