mod common;

use common::{eval, eval_with, first_error, request, target};
use genex::{
    config::EngineConfig,
    engine::{Engine, Evaluation},
    eval::{EvaluationContext, GenexError},
    model::{InMemoryModel, ProjectSpec, TargetSpec, TargetType},
    policy::{Policy, PolicyStatus},
};
use pretty_assertions::assert_eq;

fn chain_model() -> InMemoryModel {
    let spec = ProjectSpec::new()
        .with_target(
            TargetSpec::new("base", TargetType::StaticLibrary)
                .with_property("INTERFACE_INCLUDE_DIRECTORIES", "/base"),
        )
        .with_target(
            TargetSpec::new("mid", TargetType::StaticLibrary)
                .with_property("INTERFACE_INCLUDE_DIRECTORIES", "/mid")
                .links_publicly("base"),
        )
        .with_target(
            TargetSpec::new("app", TargetType::Executable)
                .with_property("INCLUDE_DIRECTORIES", "/app")
                .links_publicly("mid"),
        );
    InMemoryModel::from_spec(spec).unwrap()
}

fn property_of(model: &InMemoryModel, name: &str, property: &str) -> Evaluation {
    let engine = Engine::new(model);
    engine.evaluate_target_property(target(model, name), property, &request(""))
}

#[test]
fn test_interface_property_follows_link_interface() {
    let model = chain_model();
    let evaluation = eval_with(
        &model,
        "$<TARGET_PROPERTY:mid,INTERFACE_INCLUDE_DIRECTORIES>",
        "",
        Some("app"),
    );
    assert_eq!(evaluation.output, "/mid;/base");
    assert!(!evaluation.had_error());
    assert!(evaluation.context.all_targets.contains(&target(&model, "mid")));
}

#[test]
fn test_head_target_form() {
    let model = chain_model();
    let evaluation = eval_with(&model, "$<TARGET_PROPERTY:INCLUDE_DIRECTORIES>", "", Some("app"));
    assert_eq!(evaluation.output, "/app;/mid;/base");
    assert!(evaluation.context.had_head_sensitive_condition());
    assert!(evaluation
        .context
        .seen_target_properties
        .contains("INCLUDE_DIRECTORIES"));

    let without_head = eval_with(&model, "$<TARGET_PROPERTY:INCLUDE_DIRECTORIES>", "", None);
    assert!(without_head.had_error());
    assert!(first_error(&without_head).starts_with("$<TARGET_PROPERTY:prop> may only be used"));
}

#[test]
fn test_plain_properties_are_read_raw() {
    assert_eq!(eval("$<TARGET_PROPERTY:core,VERSION>").output, "1.2.3");
    let missing = eval("$<TARGET_PROPERTY:core,NOT_SET>");
    assert_eq!(missing.output, "");
    assert!(!missing.had_error());
}

#[test]
fn test_aliased_target() {
    assert_eq!(eval("$<TARGET_PROPERTY:Core::core,ALIASED_TARGET>").output, "core");
    assert_eq!(eval("$<TARGET_PROPERTY:core,ALIASED_TARGET>").output, "");
}

#[test]
fn test_parameter_validation() {
    let cases = [
        (
            "$<TARGET_PROPERTY:,FOO>",
            "$<TARGET_PROPERTY:tgt,prop> expression requires a non-empty target name.",
        ),
        (
            "$<TARGET_PROPERTY:,>",
            "$<TARGET_PROPERTY:tgt,prop> expression requires a non-empty target name and \
             property name.",
        ),
        ("$<TARGET_PROPERTY:bad name,FOO>", "Target name not supported."),
        ("$<TARGET_PROPERTY:bad name,F-O>", "Target name and property name not supported."),
        ("$<TARGET_PROPERTY:missing,FOO>", "Target \"missing\" not found."),
        ("$<TARGET_PROPERTY:app,FOO-BAR>", "Property name not supported."),
        (
            "$<TARGET_PROPERTY:app,>",
            "$<TARGET_PROPERTY:...> expression requires a non-empty property name.",
        ),
        (
            "$<TARGET_PROPERTY>",
            "$<TARGET_PROPERTY:...> expression requires one or two parameters",
        ),
        (
            "$<TARGET_PROPERTY:a,b,c>",
            "$<TARGET_PROPERTY:...> expression requires one or two parameters",
        ),
    ];
    for (input, message) in cases {
        let evaluation = eval(input);
        assert!(evaluation.had_error(), "{input}");
        assert_eq!(first_error(&evaluation), message, "{input}");
    }
}

#[test]
fn test_self_reference() {
    let spec = ProjectSpec::new().with_target(
        TargetSpec::new("app", TargetType::Executable).with_property(
            "INCLUDE_DIRECTORIES",
            "/own;$<TARGET_PROPERTY:app,INCLUDE_DIRECTORIES>",
        ),
    );
    let model = InMemoryModel::from_spec(spec).unwrap();
    let evaluation = property_of(&model, "app", "INCLUDE_DIRECTORIES");
    assert_eq!(evaluation.output, "/own");
    assert_eq!(first_error(&evaluation), "Self reference on target \"app\".");
    let diagnostic = evaluation.context.errors().next().unwrap();
    assert!(matches!(diagnostic.error, Some(GenexError::Cycle(_))));
}

#[test]
fn test_dependency_loop() {
    let spec = ProjectSpec::new()
        .with_target(TargetSpec::new("a", TargetType::StaticLibrary).with_property(
            "INTERFACE_COMPILE_OPTIONS",
            "$<TARGET_PROPERTY:a,INTERFACE_COMPILE_OPTIONS>",
        ))
        .with_target(TargetSpec::new("app", TargetType::Executable).with_property(
            "COMPILE_OPTIONS",
            "$<TARGET_PROPERTY:a,INTERFACE_COMPILE_OPTIONS>",
        ));
    let model = InMemoryModel::from_spec(spec).unwrap();
    let evaluation = property_of(&model, "app", "COMPILE_OPTIONS");
    assert!(evaluation.had_error());
    assert!(first_error(&evaluation).starts_with(
        "Dependency loop found.\nLoop step 1\n  $<TARGET_PROPERTY:a,INTERFACE_COMPILE_OPTIONS>"
    ));
}

#[test]
fn test_cycle_between_targets_resolves_to_nothing() {
    let spec = ProjectSpec::new()
        .with_target(TargetSpec::new("a", TargetType::StaticLibrary).with_property(
            "INTERFACE_COMPILE_OPTIONS",
            "-a;$<TARGET_PROPERTY:b,INTERFACE_COMPILE_OPTIONS>",
        ))
        .with_target(TargetSpec::new("b", TargetType::StaticLibrary).with_property(
            "INTERFACE_COMPILE_OPTIONS",
            "-b;$<TARGET_PROPERTY:a,INTERFACE_COMPILE_OPTIONS>",
        ));
    let model = InMemoryModel::from_spec(spec).unwrap();
    let evaluation = property_of(&model, "a", "INTERFACE_COMPILE_OPTIONS");
    assert_eq!(evaluation.output, "-a;-b");
    assert!(!evaluation.had_error());
}

#[test]
fn test_diamond_dependency_is_visited_once() {
    let spec = ProjectSpec::new()
        .with_target(
            TargetSpec::new("base", TargetType::StaticLibrary)
                .with_property("INTERFACE_INCLUDE_DIRECTORIES", "/base"),
        )
        .with_target(
            TargetSpec::new("l1", TargetType::StaticLibrary)
                .with_property("INTERFACE_INCLUDE_DIRECTORIES", "/l1")
                .links_publicly("base"),
        )
        .with_target(
            TargetSpec::new("l2", TargetType::StaticLibrary)
                .with_property("INTERFACE_INCLUDE_DIRECTORIES", "/l2")
                .links_publicly("base"),
        )
        .with_target(
            TargetSpec::new("app", TargetType::Executable)
                .with_property("INCLUDE_DIRECTORIES", "/app")
                .links_publicly("l1;l2"),
        );
    let model = InMemoryModel::from_spec(spec).unwrap();
    let evaluation = property_of(&model, "app", "INCLUDE_DIRECTORIES");
    assert_eq!(evaluation.output, "/app;/l1;/base;/l2");
    assert!(!evaluation.had_error());
}

#[test]
fn test_transitive_read_while_evaluating_link_libraries() {
    let spec = ProjectSpec::new()
        .with_target(
            TargetSpec::new("dep", TargetType::StaticLibrary)
                .with_property("INTERFACE_INCLUDE_DIRECTORIES", "/dep"),
        )
        .with_target(
            TargetSpec::new("util", TargetType::StaticLibrary).with_property("LINKER_LANGUAGE", "C"),
        )
        .with_target(TargetSpec::new("app", TargetType::Executable).with_property(
            "LINK_LIBRARIES",
            "$<TARGET_PROPERTY:dep,INTERFACE_INCLUDE_DIRECTORIES>",
        ))
        .with_target(TargetSpec::new("tool", TargetType::Executable).with_property(
            "LINK_LIBRARIES",
            "$<TARGET_PROPERTY:util,LINKER_LANGUAGE>;$<TARGET_PROPERTY:dep,UNSET>",
        ));
    let model = InMemoryModel::from_spec(spec).unwrap();

    let evaluation = property_of(&model, "app", "LINK_LIBRARIES");
    assert_eq!(
        first_error(&evaluation),
        "$<TARGET_PROPERTY:...> expression in link libraries evaluation depends on target \
         property which is transitive over the link libraries, creating a recursion."
    );

    let evaluation = property_of(&model, "tool", "LINK_LIBRARIES");
    assert_eq!(
        first_error(&evaluation),
        "LINKER_LANGUAGE target property can not be used while evaluating link libraries for \
         a static library"
    );
    assert_eq!(evaluation.context.errors().count(), 1);
}

#[test]
fn test_conditional_link_dependency() {
    let spec = ProjectSpec::new()
        .with_target(
            TargetSpec::new("dbg", TargetType::StaticLibrary)
                .with_property("INTERFACE_INCLUDE_DIRECTORIES", "/dbg"),
        )
        .with_target(
            TargetSpec::new("lib", TargetType::StaticLibrary)
                .with_property("INCLUDE_DIRECTORIES", "/lib")
                .links_publicly("$<$<CONFIG:Debug>:dbg>"),
        );
    let model = InMemoryModel::from_spec(spec).unwrap();
    let engine = Engine::new(&model);
    let lib = target(&model, "lib");

    let debug = engine.evaluate_target_property(lib, "INCLUDE_DIRECTORIES", &request("Debug"));
    assert_eq!(debug.output, "/lib;/dbg");
    assert!(!debug.had_error());
    assert!(debug.context.had_context_sensitive_condition());

    let release = engine.evaluate_target_property(lib, "INCLUDE_DIRECTORIES", &request("Release"));
    assert_eq!(release.output, "/lib");
    assert!(!release.had_error());

    let input = "$<TARGET_PROPERTY:lib,INTERFACE_INCLUDE_DIRECTORIES>";
    assert_eq!(eval_with(&model, input, "Debug", None).output, "/dbg");
    assert_eq!(eval_with(&model, input, "Release", None).output, "");
}

#[test]
fn test_link_only_dependency_has_no_usage_requirements() {
    let spec = ProjectSpec::new()
        .with_target(
            TargetSpec::new("private", TargetType::StaticLibrary)
                .with_property("INTERFACE_INCLUDE_DIRECTORIES", "/private"),
        )
        .with_target(
            TargetSpec::new("lib", TargetType::StaticLibrary)
                .with_property("INTERFACE_INCLUDE_DIRECTORIES", "/lib")
                .with_property("LINK_LIBRARIES", "private")
                .with_property("INTERFACE_LINK_LIBRARIES", "$<LINK_ONLY:private>"),
        )
        .with_target(
            TargetSpec::new("app", TargetType::Executable)
                .with_property("INCLUDE_DIRECTORIES", "/app")
                .links_publicly("lib"),
        );
    let model = InMemoryModel::from_spec(spec).unwrap();
    let engine = Engine::new(&model);
    let (app, lib, private) = (
        target(&model, "app"),
        target(&model, "lib"),
        target(&model, "private"),
    );

    let evaluation = engine.evaluate_target_property(app, "INCLUDE_DIRECTORIES", &request(""));
    assert_eq!(evaluation.output, "/app;/lib");
    assert!(!evaluation.had_error());

    let mut context = EvaluationContext::new(&request(""));
    assert_eq!(
        engine.link_interface_libraries(lib, app, false, &mut context),
        Some(vec![private])
    );
    assert_eq!(
        engine.link_interface_libraries(lib, app, true, &mut context),
        Some(vec![])
    );
    assert_eq!(engine.link_implementation_libraries(lib, &mut context), Some(vec![private]));
    assert!(!context.had_error());
}

fn deferred_features_model() -> InMemoryModel {
    let spec = ProjectSpec::new()
        .with_definition("CMAKE_CXX_COMPILE_FEATURES", "cxx_auto_type;cxx_generic_lambdas")
        .with_definition("CMAKE_CXX_STANDARD_DEFAULT", "98")
        .with_definition("CMAKE_CXX11_COMPILE_FEATURES", "cxx_auto_type")
        .with_definition("CMAKE_CXX14_COMPILE_FEATURES", "cxx_generic_lambdas")
        .with_target(
            TargetSpec::new("app", TargetType::Executable)
                .with_property("INCLUDE_DIRECTORIES", "/app")
                .with_property("LINK_LIBRARIES", "$<$<COMPILE_FEATURES:cxx_generic_lambdas>:foo>"),
        )
        .with_target(
            TargetSpec::new("pinned", TargetType::Executable)
                .with_property("CXX_STANDARD", "11")
                .with_property("LINK_LIBRARIES", "$<$<COMPILE_FEATURES:cxx_generic_lambdas>:foo>"),
        );
    InMemoryModel::from_spec(spec).unwrap()
}

#[test]
fn test_compile_features_deferred_while_evaluating_link_libraries() {
    let model = deferred_features_model();
    let app = target(&model, "app");
    let pinned = target(&model, "pinned");

    let evaluation = property_of(&model, "app", "LINK_LIBRARIES");
    assert_eq!(evaluation.output, "foo");
    assert!(!evaluation.had_error());
    let recorded = &evaluation.context.max_language_standard;
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[&app].get("CXX").map(String::as_str), Some("98"));

    let evaluation = property_of(&model, "pinned", "LINK_LIBRARIES");
    assert_eq!(evaluation.output, "foo");
    assert_eq!(
        evaluation.context.max_language_standard[&pinned].get("CXX").map(String::as_str),
        Some("11")
    );

    // the same query outside link libraries is answered directly
    let evaluation = eval_with(&model, "$<COMPILE_FEATURES:cxx_generic_lambdas>", "", Some("app"));
    assert_eq!(evaluation.output, "0");
    assert!(evaluation.context.max_language_standard.is_empty());
}

#[test]
fn test_link_walk_records_deferred_standard() {
    let model = deferred_features_model();
    let app = target(&model, "app");
    let evaluation = property_of(&model, "app", "INCLUDE_DIRECTORIES");
    assert_eq!(evaluation.output, "/app");
    assert!(!evaluation.had_error());
    assert_eq!(
        evaluation.context.max_language_standard[&app].get("CXX").map(String::as_str),
        Some("98")
    );
}

#[test]
fn test_self_reference_names_head_target() {
    let spec = ProjectSpec::new()
        .with_target(TargetSpec::new("lib", TargetType::StaticLibrary).with_property(
            "INTERFACE_COMPILE_OPTIONS",
            "-l;$<TARGET_PROPERTY:lib,INTERFACE_COMPILE_OPTIONS>",
        ))
        .with_target(TargetSpec::new("app", TargetType::Executable));
    let model = InMemoryModel::from_spec(spec).unwrap();
    let input = "$<TARGET_PROPERTY:lib,INTERFACE_COMPILE_OPTIONS>";

    let evaluation = eval_with(&model, input, "", Some("app"));
    assert!(evaluation.had_error());
    assert_eq!(first_error(&evaluation), "Self reference on target \"app\".");

    let evaluation = eval_with(&model, input, "", None);
    assert_eq!(first_error(&evaluation), "Self reference on target \"lib\".");
}

#[test]
fn test_linker_language_and_sources() {
    let model = common::model();
    assert_eq!(eval_with(&model, "$<TARGET_PROPERTY:app,LINKER_LANGUAGE>", "", None).output, "CXX");

    let evaluation = eval_with(&model, "$<TARGET_PROPERTY:objs,SOURCES>", "", None);
    assert_eq!(evaluation.output, "a.c;b.c");
    assert!(evaluation
        .context
        .source_sensitive_targets
        .contains(&target(&model, "objs")));
}

fn compatible_model(second_flavor: &str) -> InMemoryModel {
    let spec = ProjectSpec::new()
        .with_target(
            TargetSpec::new("dep1", TargetType::SharedLibrary)
                .with_property("COMPATIBLE_INTERFACE_STRING", "FLAVOR")
                .with_property("COMPATIBLE_INTERFACE_NUMBER_MIN", "ALIGN")
                .with_property("COMPATIBLE_INTERFACE_NUMBER_MAX", "OPT_LEVEL")
                .with_property("INTERFACE_FLAVOR", "vanilla")
                .with_property("INTERFACE_ALIGN", "0x10")
                .with_property("INTERFACE_OPT_LEVEL", "2")
                .with_property("INTERFACE_POSITION_INDEPENDENT_CODE", "ON"),
        )
        .with_target(
            TargetSpec::new("dep2", TargetType::SharedLibrary)
                .with_property("INTERFACE_FLAVOR", second_flavor)
                .with_property("INTERFACE_ALIGN", "0x2")
                .with_property("INTERFACE_OPT_LEVEL", "3"),
        )
        .with_target(
            TargetSpec::new("app", TargetType::Executable)
                .with_property("OPT_LEVEL", "1")
                .with_property("COMPILE_OPTIONS", "-O$<TARGET_PROPERTY:OPT_LEVEL>")
                .links_publicly("dep1;dep2"),
        )
        .with_target(TargetSpec::new("lonely", TargetType::Executable));
    InMemoryModel::from_spec(spec).unwrap()
}

#[test]
fn test_compatible_string_property() {
    let model = compatible_model("vanilla");
    let evaluation = eval_with(&model, "$<TARGET_PROPERTY:app,FLAVOR>", "", None);
    assert_eq!(evaluation.output, "vanilla");
    assert!(!evaluation.had_error());
    assert!(evaluation.context.had_context_sensitive_condition());

    let model = compatible_model("chocolate");
    let evaluation = eval_with(&model, "$<TARGET_PROPERTY:app,FLAVOR>", "", None);
    assert!(evaluation.had_error());
    assert_eq!(
        first_error(&evaluation),
        "The INTERFACE_FLAVOR property of \"dep2\" does\nnot agree with the value of FLAVOR \
         already determined\nfor \"app\"."
    );
}

#[test]
fn test_compatible_numbers_and_bools() {
    let model = compatible_model("vanilla");
    assert_eq!(eval_with(&model, "$<TARGET_PROPERTY:app,ALIGN>", "", None).output, "0x2");
    assert_eq!(
        eval_with(&model, "$<TARGET_PROPERTY:app,POSITION_INDEPENDENT_CODE>", "", None).output,
        "1"
    );
    assert_eq!(
        eval_with(&model, "$<TARGET_PROPERTY:lonely,POSITION_INDEPENDENT_CODE>", "", None).output,
        "0"
    );

    // the target's own value takes part once a property walk is underway
    let evaluation = property_of(&model, "app", "COMPILE_OPTIONS");
    assert_eq!(evaluation.output, "-O3");
    assert!(!evaluation.had_error());
}

#[test]
fn test_configuration_specific_definitions_follow_cmp0043() {
    let project = |status: PolicyStatus| {
        ProjectSpec::new()
            .with_policy(Policy::Cmp0043, status)
            .with_target(
                TargetSpec::new("dep", TargetType::StaticLibrary)
                    .with_property("INTERFACE_COMPILE_DEFINITIONS", "B"),
            )
            .with_target(
                TargetSpec::new("app", TargetType::Executable)
                    .with_property("COMPILE_DEFINITIONS_DEBUG", "A")
                    .links_publicly("dep"),
            )
    };
    let input = "$<TARGET_PROPERTY:app,COMPILE_DEFINITIONS_DEBUG>";

    let old = InMemoryModel::from_spec(project(PolicyStatus::Warn)).unwrap();
    assert_eq!(eval_with(&old, input, "Debug", None).output, "A;B");

    let new = InMemoryModel::from_spec(project(PolicyStatus::New)).unwrap();
    assert_eq!(eval_with(&new, input, "Debug", None).output, "A");
}

#[test]
fn test_deep_property_chain_hits_depth_limit() {
    let mut spec = ProjectSpec::new();
    for i in 0..10 {
        spec = spec.with_target(TargetSpec::new(&format!("t{i}"), TargetType::StaticLibrary).with_property(
            "INTERFACE_COMPILE_OPTIONS",
            &format!("$<TARGET_PROPERTY:t{},INTERFACE_COMPILE_OPTIONS>", i + 1),
        ));
    }
    spec = spec.with_target(
        TargetSpec::new("t10", TargetType::StaticLibrary)
            .with_property("INTERFACE_COMPILE_OPTIONS", "end"),
    );
    let model = InMemoryModel::from_spec(spec).unwrap();
    let input = "$<TARGET_PROPERTY:t0,INTERFACE_COMPILE_OPTIONS>";

    let engine = Engine::new(&model);
    assert_eq!(engine.evaluate(input, &request("")).output, "end");

    let config = EngineConfig {
        max_evaluation_depth: 5,
        ..EngineConfig::default()
    };
    let engine = Engine::with_config(&model, config);
    let evaluation = engine.evaluate(input, &request(""));
    assert_eq!(evaluation.output, "");
    assert_eq!(
        first_error(&evaluation),
        "Evaluation exceeds the maximum generator expression depth of 5."
    );
    assert_eq!(evaluation.context.errors().count(), 1);
}
