//! # Build model
//!
//! The engine never owns targets or properties. Everything it needs to know
//! about the project (targets, their properties and link relations, global
//! definitions, policy settings, artifact naming) is read through the
//! [`BuildModel`] trait.
//!
//! ## Core Components
//!
//! * [`BuildModel`] - read-only collaborator queried during evaluation
//! * [`InMemoryModel`] - a serde-loadable implementation backed by a
//!   [`ProjectSpec`], used by the CLI and the test suites
//!
//! ```text
//! project.json ──► ProjectSpec ──► InMemoryModel ──► &dyn BuildModel ──► Engine
//! ```

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    fs::File,
    io::BufReader,
    path::Path,
};

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;
use tracing::debug;

use crate::{
    list::{expand_list, is_on},
    policy::{Policy, PolicyStatus},
};

/// Opaque handle of a target inside a [`BuildModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(pub usize);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetType {
    #[default]
    Executable,
    StaticLibrary,
    SharedLibrary,
    ModuleLibrary,
    ObjectLibrary,
    Utility,
    GlobalTarget,
    InterfaceLibrary,
    UnknownLibrary,
}

impl TargetType {
    /// Targets that produce a binary artifact on disk.
    pub fn is_executable_or_library(self) -> bool {
        matches!(
            self,
            TargetType::Executable
                | TargetType::StaticLibrary
                | TargetType::SharedLibrary
                | TargetType::ModuleLibrary
                | TargetType::UnknownLibrary
        )
    }

    pub fn is_library(self) -> bool {
        matches!(
            self,
            TargetType::StaticLibrary
                | TargetType::SharedLibrary
                | TargetType::ModuleLibrary
                | TargetType::UnknownLibrary
        )
    }
}

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to read project file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse project file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Target \"{0}\" is defined more than once")]
    DuplicateTarget(String),
    #[error("Alias \"{alias}\" refers to unknown target \"{target}\"")]
    UnknownAliasTarget { alias: String, target: String },
}

/// Read-only view of the project the engine evaluates against.
#[cfg_attr(test, mockall::automock)]
pub trait BuildModel {
    /// Resolves a target name, following aliases.
    fn find_target(&self, name: &str) -> Option<TargetId>;
    /// Resolves an alias name to the target it stands for.
    fn alias_target(&self, name: &str) -> Option<TargetId>;
    fn target_name(&self, target: TargetId) -> String;
    fn target_type(&self, target: TargetId) -> TargetType;
    fn is_imported(&self, target: TargetId) -> bool;
    fn get_property(&self, target: TargetId, name: &str) -> Option<String>;

    /// Unevaluated items `target` exposes to consumers. `None` when the
    /// target has no link interface.
    fn link_interface_items(&self, target: TargetId, config: &str) -> Option<LinkItems>;
    /// Unevaluated items `target` links against itself.
    fn link_implementation_items(&self, target: TargetId, config: &str) -> Option<LinkItems>;

    /// Value of a project-wide variable such as `CMAKE_CXX_COMPILER_ID`.
    fn definition(&self, name: &str) -> Option<String>;
    fn policy_status(&self, policy: Policy) -> PolicyStatus;
    fn target_policy_status(&self, target: TargetId, policy: Policy) -> PolicyStatus;
    fn enabled_languages(&self) -> Vec<String>;
    fn generator_name(&self) -> String;
    fn is_dll_platform(&self) -> bool;
    fn linker_language(&self, target: TargetId, config: &str) -> String;

    fn full_path(&self, target: TargetId, config: &str, import_library: bool, real_name: bool)
        -> String;
    fn has_import_library(&self, target: TargetId) -> bool;
    fn target_directory(&self, target: TargetId, config: &str) -> String;
    fn soname(&self, target: TargetId, config: &str) -> String;
    fn pdb_directory(&self, target: TargetId, config: &str) -> String;
    fn pdb_name(&self, target: TargetId, config: &str) -> String;
    fn object_files(&self, target: TargetId, config: &str) -> Vec<String>;
}

/// A raw link-library list and the property it was read from. The value
/// may hold generator expressions; the engine evaluates it before looking
/// the items up as targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkItems {
    pub property: String,
    pub value: String,
}

impl LinkItems {
    pub fn new(property: &str, value: &str) -> Self {
        Self {
            property: property.to_string(),
            value: value.to_string(),
        }
    }
}

/// A target that can also be linked against, including executables that
/// export symbols.
pub fn is_linkable(model: &dyn BuildModel, target: TargetId) -> bool {
    match model.target_type(target) {
        TargetType::Executable => model
            .get_property(target, "ENABLE_EXPORTS")
            .is_some_and(|v| is_on(&v)),
        TargetType::InterfaceLibrary => true,
        other => other.is_library(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSpec {
    #[serde(default = "default_generator")]
    pub generator: String,

    #[serde(default)]
    pub dll_platform: bool,

    #[serde(default = "default_binary_dir")]
    pub binary_dir: String,

    #[serde(default = "default_languages")]
    pub enabled_languages: Vec<String>,

    #[serde(default)]
    pub definitions: BTreeMap<String, String>,

    #[serde(default)]
    pub policies: BTreeMap<String, PolicyStatus>,

    #[serde(default)]
    pub targets: Vec<TargetSpec>,

    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

impl Default for ProjectSpec {
    fn default() -> Self {
        Self {
            generator: default_generator(),
            dll_platform: false,
            binary_dir: default_binary_dir(),
            enabled_languages: default_languages(),
            definitions: BTreeMap::new(),
            policies: BTreeMap::new(),
            targets: Vec::new(),
            aliases: BTreeMap::new(),
        }
    }
}

impl ProjectSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target(mut self, target: TargetSpec) -> Self {
        self.targets.push(target);
        self
    }

    pub fn with_definition(mut self, name: &str, value: &str) -> Self {
        self.definitions.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_policy(mut self, policy: Policy, status: PolicyStatus) -> Self {
        self.policies.insert(policy.to_string(), status);
        self
    }

    pub fn with_alias(mut self, alias: &str, target: &str) -> Self {
        self.aliases.insert(alias.to_string(), target.to_string());
        self
    }

    pub fn with_generator(mut self, generator: &str) -> Self {
        self.generator = generator.to_string();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSpec {
    pub name: String,

    #[serde(rename = "type", default)]
    pub target_type: TargetType,

    #[serde(default)]
    pub imported: bool,

    #[serde(default)]
    pub properties: BTreeMap<String, String>,

    #[serde(default)]
    pub policies: BTreeMap<String, PolicyStatus>,
}

impl TargetSpec {
    pub fn new(name: &str, target_type: TargetType) -> Self {
        Self {
            name: name.to_string(),
            target_type,
            imported: false,
            properties: BTreeMap::new(),
            policies: BTreeMap::new(),
        }
    }

    pub fn imported(mut self) -> Self {
        self.imported = true;
        self
    }

    pub fn with_property(mut self, name: &str, value: &str) -> Self {
        self.properties.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_policy(mut self, policy: Policy, status: PolicyStatus) -> Self {
        self.policies.insert(policy.to_string(), status);
        self
    }

    /// Shorthand for a `LINK_LIBRARIES` + `INTERFACE_LINK_LIBRARIES` pair,
    /// i.e. a public dependency.
    pub fn links_publicly(self, libraries: &str) -> Self {
        self.with_property("LINK_LIBRARIES", libraries)
            .with_property("INTERFACE_LINK_LIBRARIES", libraries)
    }
}

/// [`BuildModel`] backed by plain data. Link relations come from the
/// `LINK_LIBRARIES` and `INTERFACE_LINK_LIBRARIES` properties; artifact
/// names follow Unix conventions unless `dll_platform` is set.
#[derive(Debug, Clone)]
pub struct InMemoryModel {
    spec: ProjectSpec,
    index: HashMap<String, TargetId>,
}

impl InMemoryModel {
    pub fn from_spec(spec: ProjectSpec) -> Result<Self, ModelError> {
        let mut index = HashMap::new();
        for (position, target) in spec.targets.iter().enumerate() {
            if index.insert(target.name.clone(), TargetId(position)).is_some() {
                return Err(ModelError::DuplicateTarget(target.name.clone()));
            }
        }
        for (alias, target) in &spec.aliases {
            if !index.contains_key(target) {
                return Err(ModelError::UnknownAliasTarget {
                    alias: alias.clone(),
                    target: target.clone(),
                });
            }
        }
        debug!("model loaded with {} targets", spec.targets.len());
        Ok(Self { spec, index })
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Self::from_spec(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let reader = BufReader::new(File::open(path)?);
        Self::from_spec(serde_json::from_reader(reader)?)
    }

    pub fn spec(&self) -> &ProjectSpec {
        &self.spec
    }

    fn target(&self, target: TargetId) -> Option<&TargetSpec> {
        self.spec.targets.get(target.0)
    }

    fn property(&self, target: TargetId, name: &str) -> Option<&str> {
        self.target(target)
            .and_then(|t| t.properties.get(name))
            .map(String::as_str)
    }

    fn link_items(&self, target: TargetId, property: &str) -> Option<LinkItems> {
        self.property(target, property)
            .map(|value| LinkItems::new(property, value))
    }

    fn output_name(&self, target: TargetId) -> String {
        self.property(target, "OUTPUT_NAME")
            .map(str::to_string)
            .unwrap_or_else(|| self.target_name(target))
    }

    fn is_multi_config(&self) -> bool {
        ["Visual Studio", "Xcode", "Multi-Config"]
            .iter()
            .any(|g| self.spec.generator.contains(g))
    }

    fn imported_location(&self, target: TargetId, config: &str, base: &str) -> Option<String> {
        let upper = config.to_ascii_uppercase();
        if !upper.is_empty() {
            if let Some(value) = self.property(target, &format!("{}_{}", base, upper)) {
                return Some(value.to_string());
            }
        }
        self.property(target, base).map(str::to_string)
    }

    fn file_name(&self, target: TargetId, import_library: bool, real_name: bool) -> String {
        let name = self.output_name(target);
        let version = self.property(target, "VERSION");
        match (self.target_type(target), self.spec.dll_platform) {
            (TargetType::StaticLibrary, false) => format!("lib{}.a", name),
            (TargetType::StaticLibrary, true) => format!("{}.lib", name),
            (TargetType::SharedLibrary, false) => match version {
                Some(version) if real_name => format!("lib{}.so.{}", name, version),
                _ => format!("lib{}.so", name),
            },
            (TargetType::SharedLibrary | TargetType::ModuleLibrary, true) if import_library => {
                format!("{}.lib", name)
            }
            (TargetType::SharedLibrary | TargetType::ModuleLibrary, true) => format!("{}.dll", name),
            (TargetType::ModuleLibrary, false) => format!("lib{}.so", name),
            (TargetType::Executable, true) if import_library => format!("{}.lib", name),
            (TargetType::Executable, true) => format!("{}.exe", name),
            _ => name,
        }
    }
}

impl BuildModel for InMemoryModel {
    fn find_target(&self, name: &str) -> Option<TargetId> {
        self.index
            .get(name)
            .copied()
            .or_else(|| self.alias_target(name))
    }

    fn alias_target(&self, name: &str) -> Option<TargetId> {
        self.spec
            .aliases
            .get(name)
            .and_then(|real| self.index.get(real).copied())
    }

    fn target_name(&self, target: TargetId) -> String {
        self.target(target)
            .map(|t| t.name.clone())
            .unwrap_or_default()
    }

    fn target_type(&self, target: TargetId) -> TargetType {
        self.target(target)
            .map(|t| t.target_type)
            .unwrap_or(TargetType::UnknownLibrary)
    }

    fn is_imported(&self, target: TargetId) -> bool {
        self.target(target).is_some_and(|t| t.imported)
    }

    fn get_property(&self, target: TargetId, name: &str) -> Option<String> {
        self.property(target, name).map(str::to_string)
    }

    fn link_interface_items(&self, target: TargetId, config: &str) -> Option<LinkItems> {
        if let Some(items) = self.link_items(target, "INTERFACE_LINK_LIBRARIES") {
            return Some(items);
        }
        if !self.is_imported(target) {
            return None;
        }
        let upper = config.to_ascii_uppercase();
        let per_config = format!("IMPORTED_LINK_INTERFACE_LIBRARIES_{}", upper);
        (!upper.is_empty())
            .then(|| self.link_items(target, &per_config))
            .flatten()
            .or_else(|| self.link_items(target, "IMPORTED_LINK_INTERFACE_LIBRARIES"))
    }

    fn link_implementation_items(&self, target: TargetId, _config: &str) -> Option<LinkItems> {
        self.link_items(target, "LINK_LIBRARIES")
    }

    fn definition(&self, name: &str) -> Option<String> {
        self.spec.definitions.get(name).cloned()
    }

    fn policy_status(&self, policy: Policy) -> PolicyStatus {
        self.spec
            .policies
            .get(policy.as_ref())
            .copied()
            .unwrap_or_default()
    }

    fn target_policy_status(&self, target: TargetId, policy: Policy) -> PolicyStatus {
        self.target(target)
            .and_then(|t| t.policies.get(policy.as_ref()).copied())
            .unwrap_or_else(|| self.policy_status(policy))
    }

    fn enabled_languages(&self) -> Vec<String> {
        self.spec.enabled_languages.clone()
    }

    fn generator_name(&self) -> String {
        self.spec.generator.clone()
    }

    fn is_dll_platform(&self) -> bool {
        self.spec.dll_platform
    }

    fn linker_language(&self, target: TargetId, _config: &str) -> String {
        if let Some(language) = self.property(target, "LINKER_LANGUAGE") {
            return language.to_string();
        }
        let languages = &self.spec.enabled_languages;
        if languages.iter().any(|l| l == "CXX") {
            "CXX".to_string()
        } else {
            languages.first().cloned().unwrap_or_default()
        }
    }

    fn full_path(
        &self,
        target: TargetId,
        config: &str,
        import_library: bool,
        real_name: bool,
    ) -> String {
        if self.is_imported(target) {
            let base = if import_library {
                "IMPORTED_IMPLIB"
            } else {
                "IMPORTED_LOCATION"
            };
            return self
                .imported_location(target, config, base)
                .unwrap_or_else(|| format!("{}-NOTFOUND", self.target_name(target)));
        }
        format!(
            "{}/{}",
            self.target_directory(target, config),
            self.file_name(target, import_library, real_name)
        )
    }

    fn has_import_library(&self, target: TargetId) -> bool {
        self.spec.dll_platform
            && match self.target_type(target) {
                TargetType::SharedLibrary => true,
                TargetType::Executable => self
                    .property(target, "ENABLE_EXPORTS")
                    .is_some_and(is_on),
                _ => false,
            }
    }

    fn target_directory(&self, target: TargetId, config: &str) -> String {
        if self.is_imported(target) {
            return self
                .imported_location(target, config, "IMPORTED_LOCATION")
                .map(|path| crate::list::directory(&path).to_string())
                .unwrap_or_default();
        }
        let base = self
            .property(target, "OUTPUT_DIRECTORY")
            .map(str::to_string)
            .unwrap_or_else(|| self.spec.binary_dir.clone());
        if self.is_multi_config() && !config.is_empty() {
            format!("{}/{}", base, config)
        } else {
            base
        }
    }

    fn soname(&self, target: TargetId, config: &str) -> String {
        if self.is_imported(target) {
            return self
                .imported_location(target, config, "IMPORTED_SONAME")
                .unwrap_or_default();
        }
        let name = self.output_name(target);
        match self.property(target, "SOVERSION") {
            Some(soversion) => format!("lib{}.so.{}", name, soversion),
            None => format!("lib{}.so", name),
        }
    }

    fn pdb_directory(&self, target: TargetId, config: &str) -> String {
        self.property(target, "PDB_OUTPUT_DIRECTORY")
            .map(str::to_string)
            .unwrap_or_else(|| self.target_directory(target, config))
    }

    fn pdb_name(&self, target: TargetId, _config: &str) -> String {
        let name = self
            .property(target, "PDB_NAME")
            .map(str::to_string)
            .unwrap_or_else(|| self.output_name(target));
        format!("{}.pdb", name)
    }

    fn object_files(&self, target: TargetId, _config: &str) -> Vec<String> {
        let extension = if self.spec.dll_platform { ".obj" } else { ".o" };
        let name = self.target_name(target);
        self.property(target, "SOURCES")
            .map(expand_list)
            .unwrap_or_default()
            .iter()
            .map(|source| {
                format!(
                    "{}/CMakeFiles/{}.dir/{}{}",
                    self.spec.binary_dir, name, source, extension
                )
            })
            .collect()
    }
}

fn default_generator() -> String {
    "Unix Makefiles".to_string()
}

fn default_binary_dir() -> String {
    "/build".to_string()
}

fn default_languages() -> Vec<String> {
    vec!["C".to_string(), "CXX".to_string()]
}
