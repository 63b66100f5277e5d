#![allow(dead_code)]

use genex::{
    engine::{Engine, Evaluation},
    eval::EvaluationRequest,
    model::{BuildModel, InMemoryModel, ProjectSpec, TargetId, TargetSpec, TargetType},
};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[ctor::ctor]
fn init_tests() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// A small Unix project: `app` links `core` (shared) and `util` (static),
/// `objs` is an object library.
pub fn sample_project() -> ProjectSpec {
    ProjectSpec::new()
        .with_definition("CMAKE_C_COMPILER_ID", "GNU")
        .with_definition("CMAKE_CXX_COMPILER_ID", "Clang")
        .with_definition("CMAKE_C_COMPILER_VERSION", "4.9.2")
        .with_definition("CMAKE_CXX_COMPILER_VERSION", "3.6.0")
        .with_definition("CMAKE_SYSTEM_NAME", "Linux")
        .with_target(
            TargetSpec::new("core", TargetType::SharedLibrary)
                .with_property("VERSION", "1.2.3")
                .with_property("SOVERSION", "1")
                .with_property("INTERFACE_INCLUDE_DIRECTORIES", "/src/core/include"),
        )
        .with_target(
            TargetSpec::new("util", TargetType::StaticLibrary)
                .with_property("INTERFACE_COMPILE_DEFINITIONS", "USE_UTIL"),
        )
        .with_target(
            TargetSpec::new("objs", TargetType::ObjectLibrary).with_property("SOURCES", "a.c;b.c"),
        )
        .with_target(
            TargetSpec::new("app", TargetType::Executable)
                .with_property("INCLUDE_DIRECTORIES", "/src/app")
                .links_publicly("core;util"),
        )
        .with_alias("Core::core", "core")
}

pub fn model() -> InMemoryModel {
    InMemoryModel::from_spec(sample_project()).expect("sample project")
}

pub fn request(config: &str) -> EvaluationRequest {
    EvaluationRequest::new(config).quiet(true)
}

/// Evaluates `input` for `config` with `head` (if any) as head target.
pub fn eval_with(model: &InMemoryModel, input: &str, config: &str, head: Option<&str>) -> Evaluation {
    let engine = Engine::new(model);
    let mut request = request(config);
    if let Some(head) = head {
        request = request.with_head_target(target(model, head));
    }
    engine.evaluate(input, &request)
}

pub fn eval(input: &str) -> Evaluation {
    eval_with(&model(), input, "Debug", None)
}

pub fn first_error(evaluation: &Evaluation) -> String {
    evaluation
        .context
        .errors()
        .next()
        .map(|d| d.message.clone())
        .unwrap_or_default()
}

pub fn target(model: &InMemoryModel, name: &str) -> TargetId {
    model.find_target(name).expect("target exists")
}
