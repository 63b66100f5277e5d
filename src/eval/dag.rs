//! # Dependency DAG checker
//!
//! Evaluating a target property can evaluate other target properties, which
//! can evaluate more. Each of those reads pushes a [`DagChecker`] frame that
//! borrows its parent, so the chain of frames mirrors the evaluation stack:
//!
//! ```text
//! root (app, INCLUDE_DIRECTORIES)
//!   └─ (lib, INTERFACE_INCLUDE_DIRECTORIES)
//!        └─ (base, INTERFACE_INCLUDE_DIRECTORIES)
//! ```
//!
//! A new frame is classified when it is created:
//!
//! * [`DagCheckResult::SelfReference`] - same (target, property) as its parent
//! * [`DagCheckResult::CyclicReference`] - same as an ancestor further up
//! * [`DagCheckResult::AlreadySeen`] - already visited in another branch of a
//!   transitive-property walk rooted at the top frame
//! * [`DagCheckResult::Dag`] - anything else

use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, HashSet},
};

use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use tracing::trace;

use super::{
    context::EvaluationContext,
    error::{GenexError, Reported},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DagCheckResult {
    Dag,
    SelfReference,
    CyclicReference,
    AlreadySeen,
}

/// Properties whose `INTERFACE_` variants propagate along link dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TransitiveProperty {
    IncludeDirectories,
    SystemIncludeDirectories,
    CompileDefinitions,
    CompileOptions,
    AutouicOptions,
    Sources,
    CompileFeatures,
}

impl TransitiveProperty {
    pub fn interface_name(self) -> String {
        format!("INTERFACE_{}", self)
    }

    /// Exact match on `X` or `INTERFACE_X`; the flag tells which.
    pub fn from_property(property: &str) -> Option<(Self, bool)> {
        if let Some(base) = property.strip_prefix("INTERFACE_") {
            if let Some(found) = Self::iter().find(|p| p.as_ref() == base) {
                return Some((found, true));
            }
        }
        Self::iter()
            .find(|p| p.as_ref() == property)
            .map(|p| (p, false))
    }

    /// `INTERFACE_X` properties that may be skipped when reached twice in
    /// one transitive walk.
    pub fn is_interface_property(property: &str) -> bool {
        matches!(Self::from_property(property), Some((_, true)))
    }

    /// Whether a frame evaluating `property` counts as evaluating `self`.
    fn covers(self, property: &str) -> bool {
        property == self.as_ref()
            || property.strip_prefix("INTERFACE_") == Some(self.as_ref())
            || (self == TransitiveProperty::CompileDefinitions
                && property.starts_with("COMPILE_DEFINITIONS_"))
    }
}

const LINK_LIBRARY_PROPERTIES: &[&str] = &[
    "LINK_LIBRARIES",
    "LINK_INTERFACE_LIBRARIES",
    "IMPORTED_LINK_INTERFACE_LIBRARIES",
    "INTERFACE_LINK_LIBRARIES",
];

const LINK_LIBRARY_PREFIXES: &[&str] = &[
    "LINK_INTERFACE_LIBRARIES_",
    "IMPORTED_LINK_INTERFACE_LIBRARIES_",
];

pub struct DagChecker<'p> {
    target: String,
    property: String,
    expression: Option<String>,
    parent: Option<&'p DagChecker<'p>>,
    /// Used on the top frame only.
    seen: RefCell<HashMap<String, HashSet<String>>>,
    /// Used on the top frame only.
    transitive_properties_only: Cell<bool>,
    result: DagCheckResult,
}

impl<'p> DagChecker<'p> {
    pub fn new(
        target: &str,
        property: &str,
        expression: Option<&str>,
        parent: Option<&'p DagChecker<'p>>,
    ) -> Self {
        let mut checker = Self {
            target: target.to_string(),
            property: property.to_string(),
            expression: expression.map(str::to_string),
            parent,
            seen: RefCell::new(HashMap::new()),
            transitive_properties_only: Cell::new(false),
            result: DagCheckResult::Dag,
        };
        checker.result = checker.classify();
        trace!(
            "dag frame ({}, {}) -> {}",
            checker.target,
            checker.property,
            checker.result
        );
        checker
    }

    /// A frame with no parent.
    pub fn root(target: &str, property: &str) -> Self {
        Self::new(target, property, None, None)
    }

    fn classify(&self) -> DagCheckResult {
        let result = self.check_graph();
        if result != DagCheckResult::Dag {
            return result;
        }
        let top = self.top();
        if top.evaluating_transitive_property() {
            let mut seen = top.seen.borrow_mut();
            let properties = seen.entry(self.target.clone()).or_default();
            if !properties.insert(self.property.clone()) {
                return DagCheckResult::AlreadySeen;
            }
        }
        DagCheckResult::Dag
    }

    fn check_graph(&self) -> DagCheckResult {
        let mut ancestor = self.parent;
        let mut immediate = true;
        while let Some(frame) = ancestor {
            if frame.target == self.target && frame.property == self.property {
                return if immediate {
                    DagCheckResult::SelfReference
                } else {
                    DagCheckResult::CyclicReference
                };
            }
            immediate = false;
            ancestor = frame.parent;
        }
        DagCheckResult::Dag
    }

    pub fn check(&self) -> DagCheckResult {
        self.result
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn parent(&self) -> Option<&'p DagChecker<'p>> {
        self.parent
    }

    fn top(&self) -> &DagChecker<'p> {
        let mut top: &DagChecker<'p> = self;
        while let Some(parent) = top.parent {
            top = parent;
        }
        top
    }

    pub fn top_target(&self) -> &str {
        &self.top().target
    }

    /// Reports the reference problem of this frame. No-op for DAG frames.
    /// A self reference names `head`, or this frame's target without one.
    pub fn report_error(
        &self,
        context: &mut EvaluationContext,
        expression: &str,
        head: Option<&str>,
    ) -> Reported {
        if self.result == DagCheckResult::Dag {
            return Reported;
        }
        let root_parent = self.parent.is_some_and(|p| p.parent.is_none());
        let message = if root_parent {
            format!(
                "Self reference on target \"{}\".",
                head.unwrap_or(self.target.as_str())
            )
        } else {
            let mut message = String::from("Dependency loop found.");
            let mut step = 1;
            let mut frame = self.parent;
            while let Some(current) = frame {
                let text = current.expression.as_deref().unwrap_or(expression);
                message.push_str(&format!("\nLoop step {}\n  {}", step, text));
                step += 1;
                frame = current.parent;
            }
            message
        };
        context.report_error(expression, GenexError::Cycle(message))
    }

    /// Whether the walk rooted at the top frame only collects transitive
    /// properties (link-only dependencies are then skipped).
    pub fn transitive_properties_only(&self) -> bool {
        self.top().transitive_properties_only.get()
    }

    pub fn set_transitive_properties_only(&self) {
        self.transitive_properties_only.set(true);
    }

    /// Whether the walk rooted at the top frame computes link libraries. With
    /// a target name, only link libraries of that very target count.
    pub fn evaluating_link_libraries(&self, target: Option<&str>) -> bool {
        let top = self.top();
        let property = top.property.as_str();
        match target {
            Some(target) => top.target == target && property == "LINK_LIBRARIES",
            None => {
                LINK_LIBRARY_PROPERTIES.contains(&property)
                    || LINK_LIBRARY_PREFIXES.iter().any(|p| property.starts_with(p))
            }
        }
    }

    pub fn evaluating(&self, property: TransitiveProperty) -> bool {
        property.covers(&self.property)
    }

    pub fn evaluating_sources(&self) -> bool {
        self.evaluating(TransitiveProperty::Sources)
    }

    pub fn evaluating_include_directories(&self) -> bool {
        self.evaluating(TransitiveProperty::IncludeDirectories)
    }

    pub fn evaluating_compile_definitions(&self) -> bool {
        self.evaluating(TransitiveProperty::CompileDefinitions)
    }

    pub fn evaluating_transitive_property(&self) -> bool {
        TransitiveProperty::iter().any(|p| self.evaluating(p))
    }
}

impl std::fmt::Debug for DagChecker<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DagChecker")
            .field("target", &self.target)
            .field("property", &self.property)
            .field("result", &self.result)
            .field("depth", &std::iter::successors(self.parent, |p| p.parent).count())
            .finish()
    }
}
