//! `$<TARGET_FILE...>`, `$<TARGET_LINKER_FILE...>`, `$<TARGET_SONAME_FILE...>`,
//! `$<TARGET_PDB_FILE...>` and `$<TARGET_OBJECTS>`.

use strum_macros::Display;
use tracing::debug;

use super::{
    context::{EvaluationContext, ExternalObject},
    error::EvalResult,
    operators::Call,
};
use crate::{
    list::{directory, file_name, is_on, is_valid_target_name},
    model::{is_linkable, TargetId, TargetType},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Artifact {
    #[strum(serialize = "TARGET_FILE")]
    File,
    #[strum(serialize = "TARGET_LINKER_FILE")]
    Linker,
    #[strum(serialize = "TARGET_SONAME_FILE")]
    Soname,
    #[strum(serialize = "TARGET_PDB_FILE")]
    Pdb,
}

/// Which part of the artifact path to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactComponent {
    Path,
    Name,
    Dir,
}

pub fn evaluate(
    artifact: Artifact,
    component: ArtifactComponent,
    parameters: &[String],
    call: &Call<'_, '_>,
    context: &mut EvaluationContext,
) -> EvalResult<String> {
    let model = call.model();
    let name = parameters.first().map(String::as_str).unwrap_or_default();

    if !is_valid_target_name(name) {
        return Err(call.fail_with(context, "Expression syntax not recognized."));
    }
    let Some(target) = model.find_target(name) else {
        return Err(call.fail_with(context, format!("No target \"{}\"", name)));
    };
    if !model.target_type(target).is_executable_or_library() {
        return Err(call.fail_with(
            context,
            format!("Target \"{}\" is not an executable or library.", name),
        ));
    }
    if call.dag.is_some_and(|d| {
        d.evaluating_link_libraries(Some(name)) || (d.evaluating_sources() && name == d.top_target())
    }) {
        return Err(call.fail_with(
            context,
            "Expressions which require the linker language may not be used while \
             evaluating link libraries",
        ));
    }
    context.depend_targets.insert(target);
    context.all_targets.insert(target);

    let path = artifact_path(artifact, target, call, context)?;
    debug!("{} of {} resolved to {}", artifact, name, path);
    Ok(match component {
        ArtifactComponent::Path => path,
        ArtifactComponent::Name => file_name(&path).to_string(),
        ArtifactComponent::Dir => directory(&path).to_string(),
    })
}

fn artifact_path(
    artifact: Artifact,
    target: TargetId,
    call: &Call<'_, '_>,
    context: &mut EvaluationContext,
) -> EvalResult<String> {
    let model = call.model();
    let config = context.config.clone();
    let target_type = model.target_type(target);

    match artifact {
        Artifact::File => Ok(model.full_path(target, &config, false, true)),
        Artifact::Linker => {
            if !is_linkable(model, target) {
                return Err(call.fail_with(
                    context,
                    "TARGET_LINKER_FILE is allowed only for libraries and executables with \
                     ENABLE_EXPORTS.",
                ));
            }
            Ok(model.full_path(target, &config, model.has_import_library(target), false))
        }
        Artifact::Soname => {
            if model.is_dll_platform() {
                return Err(call.fail_with(
                    context,
                    "TARGET_SONAME_FILE is not allowed for DLL target platforms.",
                ));
            }
            if target_type != TargetType::SharedLibrary {
                return Err(call.fail_with(
                    context,
                    "TARGET_SONAME_FILE is allowed only for SHARED libraries.",
                ));
            }
            Ok(format!(
                "{}/{}",
                model.target_directory(target, &config),
                model.soname(target, &config)
            ))
        }
        Artifact::Pdb => {
            let language = model.linker_language(target, &config);
            let supports_pdb = model
                .definition(&format!("CMAKE_{}_LINKER_SUPPORTS_PDB", language))
                .is_some_and(|v| is_on(&v));
            if !supports_pdb {
                return Err(call.fail_with(
                    context,
                    "TARGET_PDB_FILE is not supported by the target linker.",
                ));
            }
            if !matches!(
                target_type,
                TargetType::SharedLibrary | TargetType::ModuleLibrary | TargetType::Executable
            ) {
                return Err(call.fail_with(
                    context,
                    "TARGET_PDB_FILE is allowed only for targets with linker created artifacts.",
                ));
            }
            Ok(format!(
                "{}/{}",
                model.pdb_directory(target, &config),
                model.pdb_name(target, &config)
            ))
        }
    }
}

pub fn target_objects(
    parameters: &[String],
    call: &Call<'_, '_>,
    context: &mut EvaluationContext,
) -> EvalResult<String> {
    if !context.evaluate_for_buildsystem {
        return Err(call.fail_with(
            context,
            "The evaluation of the TARGET_OBJECTS generator expression is only suitable for \
             consumption by CMake.  It is not suitable for writing out elsewhere.",
        ));
    }
    let model = call.model();
    let name = parameters.first().map(String::as_str).unwrap_or_default();
    let Some(target) = model.find_target(name) else {
        return Err(call.fail_with(
            context,
            format!(
                "Objects of target \"{}\" referenced but no such target exists.",
                name
            ),
        ));
    };
    if model.target_type(target) != TargetType::ObjectLibrary {
        return Err(call.fail_with(
            context,
            format!(
                "Objects of target \"{}\" referenced but is not an OBJECT library.",
                name
            ),
        ));
    }

    let objects = model.object_files(target, &context.config);
    context
        .external_objects
        .extend(objects.iter().map(|path| ExternalObject {
            path: path.clone(),
            library: name.to_string(),
        }));
    Ok(objects.join(";"))
}
