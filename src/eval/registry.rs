//! # Node registry
//!
//! The closed set of generator expressions. An identifier evaluates to a
//! [`NodeKind`]; the kind declares how its parameters are collected and
//! [`evaluate`] dispatches to the operator implementation.

use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use super::{
    artifact::{self, Artifact, ArtifactComponent},
    context::EvaluationContext,
    error::EvalResult,
    features,
    operators::{self, Call},
    target_property,
};

/// Accepted parameter counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    OneOrMore,
    OneOrZero,
    /// The node validates its own count.
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr)]
pub enum NodeKind {
    #[strum(serialize = "0")]
    Zero,
    #[strum(serialize = "1")]
    One,
    #[strum(serialize = "AND")]
    And,
    #[strum(serialize = "OR")]
    Or,
    #[strum(serialize = "NOT")]
    Not,
    #[strum(serialize = "BOOL")]
    Bool,
    #[strum(serialize = "STREQUAL")]
    StrEqual,
    #[strum(serialize = "EQUAL")]
    Equal,
    #[strum(serialize = "VERSION_GREATER")]
    VersionGreater,
    #[strum(serialize = "VERSION_LESS")]
    VersionLess,
    #[strum(serialize = "VERSION_EQUAL")]
    VersionEqual,
    #[strum(serialize = "LOWER_CASE")]
    LowerCase,
    #[strum(serialize = "UPPER_CASE")]
    UpperCase,
    #[strum(serialize = "MAKE_C_IDENTIFIER")]
    MakeCIdentifier,
    #[strum(serialize = "ANGLE-R")]
    AngleR,
    #[strum(serialize = "COMMA")]
    Comma,
    #[strum(serialize = "SEMICOLON")]
    Semicolon,
    #[strum(serialize = "C_COMPILER_ID")]
    CCompilerId,
    #[strum(serialize = "CXX_COMPILER_ID")]
    CxxCompilerId,
    #[strum(serialize = "C_COMPILER_VERSION")]
    CCompilerVersion,
    #[strum(serialize = "CXX_COMPILER_VERSION")]
    CxxCompilerVersion,
    #[strum(serialize = "PLATFORM_ID")]
    PlatformId,
    #[strum(serialize = "COMPILE_FEATURES")]
    CompileFeatures,
    #[strum(serialize = "CONFIGURATION")]
    Configuration,
    #[strum(serialize = "CONFIG")]
    Config,
    #[strum(serialize = "TARGET_PROPERTY")]
    TargetProperty,
    #[strum(serialize = "TARGET_NAME")]
    TargetName,
    #[strum(serialize = "TARGET_OBJECTS")]
    TargetObjects,
    #[strum(serialize = "TARGET_POLICY")]
    TargetPolicy,
    #[strum(serialize = "BUILD_INTERFACE")]
    BuildInterface,
    #[strum(serialize = "INSTALL_INTERFACE")]
    InstallInterface,
    #[strum(serialize = "INSTALL_PREFIX")]
    InstallPrefix,
    #[strum(serialize = "TARGET_FILE")]
    TargetFile,
    #[strum(serialize = "TARGET_FILE_NAME")]
    TargetFileName,
    #[strum(serialize = "TARGET_FILE_DIR")]
    TargetFileDir,
    #[strum(serialize = "TARGET_LINKER_FILE")]
    TargetLinkerFile,
    #[strum(serialize = "TARGET_LINKER_FILE_NAME")]
    TargetLinkerFileName,
    #[strum(serialize = "TARGET_LINKER_FILE_DIR")]
    TargetLinkerFileDir,
    #[strum(serialize = "TARGET_SONAME_FILE")]
    TargetSonameFile,
    #[strum(serialize = "TARGET_SONAME_FILE_NAME")]
    TargetSonameFileName,
    #[strum(serialize = "TARGET_SONAME_FILE_DIR")]
    TargetSonameFileDir,
    #[strum(serialize = "TARGET_PDB_FILE")]
    TargetPdbFile,
    #[strum(serialize = "TARGET_PDB_FILE_NAME")]
    TargetPdbFileName,
    #[strum(serialize = "TARGET_PDB_FILE_DIR")]
    TargetPdbFileDir,
    #[strum(serialize = "JOIN")]
    Join,
    #[strum(serialize = "COMPILE_LANGUAGE")]
    CompileLanguage,
    #[strum(serialize = "LINK_ONLY")]
    LinkOnly,
}

impl NodeKind {
    pub fn arity(self) -> Arity {
        use NodeKind::*;
        match self {
            And | Or | CompileFeatures => Arity::OneOrMore,
            StrEqual | Equal | VersionGreater | VersionLess | VersionEqual | Join => Arity::Exact(2),
            AngleR | Comma | Semicolon | Configuration | InstallPrefix => Arity::Exact(0),
            CCompilerId | CxxCompilerId | CCompilerVersion | CxxCompilerVersion | PlatformId
            | Config | CompileLanguage => Arity::OneOrZero,
            TargetProperty => Arity::Dynamic,
            _ => Arity::Exact(1),
        }
    }

    /// `false` for nodes whose result is always empty.
    pub fn generates_content(self) -> bool {
        !matches!(self, NodeKind::Zero | NodeKind::InstallInterface)
    }

    /// The last expected parameter swallows any further comma-separated
    /// parameters, joined back with `,`.
    pub fn accepts_arbitrary_content(self) -> bool {
        use NodeKind::*;
        matches!(
            self,
            Zero | One
                | LowerCase
                | UpperCase
                | MakeCIdentifier
                | Join
                | TargetName
                | BuildInterface
                | InstallInterface
        )
    }

    /// Parameters must be plain text; nested expressions are rejected.
    pub fn requires_literal_input(self) -> bool {
        self == NodeKind::TargetName
    }

    pub fn artifact(self) -> Option<(Artifact, ArtifactComponent)> {
        use ArtifactComponent::{Dir, Name, Path};
        use NodeKind::*;
        let pair = match self {
            TargetFile => (Artifact::File, Path),
            TargetFileName => (Artifact::File, Name),
            TargetFileDir => (Artifact::File, Dir),
            TargetLinkerFile => (Artifact::Linker, Path),
            TargetLinkerFileName => (Artifact::Linker, Name),
            TargetLinkerFileDir => (Artifact::Linker, Dir),
            TargetSonameFile => (Artifact::Soname, Path),
            TargetSonameFileName => (Artifact::Soname, Name),
            TargetSonameFileDir => (Artifact::Soname, Dir),
            TargetPdbFile => (Artifact::Pdb, Path),
            TargetPdbFileName => (Artifact::Pdb, Name),
            TargetPdbFileDir => (Artifact::Pdb, Dir),
            _ => return None,
        };
        Some(pair)
    }
}

/// Runs the operator for `kind` over already-evaluated parameters.
pub(crate) fn evaluate(
    kind: NodeKind,
    parameters: &[String],
    call: &Call<'_, '_>,
    context: &mut EvaluationContext,
) -> EvalResult<String> {
    use NodeKind::*;
    match kind {
        Zero | InstallInterface => Ok(String::new()),
        One | BuildInterface | TargetName => Ok(first(parameters)),
        And => operators::logical(parameters, "AND", "1", "0", call, context),
        Or => operators::logical(parameters, "OR", "0", "1", call, context),
        Not => operators::not(parameters, call, context),
        Bool => Ok(operators::bool_value(&first(parameters))),
        StrEqual => Ok(operators::flag(parameters[0] == parameters[1])),
        Equal => operators::equal(parameters, call, context),
        VersionGreater => Ok(operators::version(parameters, std::cmp::Ordering::Greater)),
        VersionLess => Ok(operators::version(parameters, std::cmp::Ordering::Less)),
        VersionEqual => Ok(operators::version(parameters, std::cmp::Ordering::Equal)),
        LowerCase => Ok(first(parameters).to_ascii_lowercase()),
        UpperCase => Ok(first(parameters).to_ascii_uppercase()),
        MakeCIdentifier => Ok(crate::list::make_c_identifier(&first(parameters))),
        AngleR => Ok(">".to_string()),
        Comma => Ok(",".to_string()),
        Semicolon => Ok(";".to_string()),
        CCompilerId => operators::compiler_id("C", parameters, call, context),
        CxxCompilerId => operators::compiler_id("CXX", parameters, call, context),
        CCompilerVersion => operators::compiler_version("C", parameters, call, context),
        CxxCompilerVersion => operators::compiler_version("CXX", parameters, call, context),
        PlatformId => operators::platform_id(parameters, call, context),
        CompileFeatures => features::evaluate(parameters, call, context),
        Configuration => {
            context.mark_context_sensitive();
            Ok(context.config.clone())
        }
        Config => operators::config(parameters, call, context),
        TargetProperty => target_property::evaluate(parameters, call, context),
        TargetObjects => artifact::target_objects(parameters, call, context),
        TargetPolicy => operators::target_policy(parameters, call, context),
        InstallPrefix => operators::install_prefix(call, context),
        Join => Ok(crate::list::expand_list(&parameters[0]).join(&parameters[1])),
        CompileLanguage => operators::compile_language(parameters, call, context),
        LinkOnly => Ok(operators::link_only(parameters, call)),
        TargetFile | TargetFileName | TargetFileDir | TargetLinkerFile | TargetLinkerFileName
        | TargetLinkerFileDir | TargetSonameFile | TargetSonameFileName | TargetSonameFileDir
        | TargetPdbFile | TargetPdbFileName | TargetPdbFileDir => match kind.artifact() {
            Some((artifact, component)) => {
                artifact::evaluate(artifact, component, parameters, call, context)
            }
            None => Ok(String::new()),
        },
    }
}

fn first(parameters: &[String]) -> String {
    parameters.first().cloned().unwrap_or_default()
}
