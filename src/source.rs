//! Contracts between the resolver and the decoders that feed it.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{SootField, SootMethod};
use crate::modifier::Modifiers;
use crate::position::Position;
use crate::signature::{AnnotationType, ClassType, IdentifierFactory, PackageName};

/// Already-decoded unit handed to the resolver. Implementations do the
/// decoding; the resolver only reads the structured result.
pub trait ClassSource: Send + Sync + fmt::Debug {
    /// Name of the input location this unit came from.
    fn input_location(&self) -> &str;
    fn source_path(&self) -> &Path;
    fn class_type(&self) -> &ClassType;
    fn resolve_modifiers(&self) -> Modifiers;
    fn resolve_position(&self) -> Option<Position>;

    fn resolve_superclass(&self) -> Option<ClassType> {
        None
    }

    fn resolve_interfaces(&self) -> Vec<ClassType> {
        Vec::new()
    }

    fn resolve_fields(&self) -> Vec<SootField> {
        Vec::new()
    }

    fn resolve_methods(&self) -> Vec<SootMethod> {
        Vec::new()
    }

    fn resolve_annotations(&self) -> Vec<AnnotationType> {
        Vec::new()
    }

    /// Module relations, present only for module descriptor units.
    fn module_facet(&self) -> Option<&dyn ModuleClassSource> {
        None
    }
}

/// `requires` directive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleReference {
    pub module: ClassType,
    pub modifiers: Modifiers,
}

/// `exports` or `opens` directive; `targets` is empty when unqualified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageReference {
    pub package: PackageName,
    pub modifiers: Modifiers,
    pub targets: Vec<ClassType>,
}

/// `provides` directive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceProvision {
    pub service: ClassType,
    pub providers: Vec<ClassType>,
}

/// Relations of a module descriptor. Every collection only holds references
/// that point at resolvable units; an empty collection is a valid answer.
pub trait ModuleClassSource {
    fn module_name(&self) -> &str;
    fn requires(&self) -> Vec<ModuleReference>;
    fn exports(&self) -> Vec<PackageReference>;
    fn opens(&self) -> Vec<PackageReference>;
    fn provides(&self) -> Vec<ServiceProvision>;
    fn uses(&self) -> Vec<ClassType>;
}

/// Whether a location's classes are analyzed or only referenced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Application,
    Library,
}

/// Decoder toggles applied per input location.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClassLoadingOptions {
    /// Decode fields and methods.
    pub resolve_members: bool,
    /// Keep compiler-generated members.
    pub include_synthetic: bool,
}

impl Default for ClassLoadingOptions {
    fn default() -> Self {
        Self {
            resolve_members: true,
            include_synthetic: true,
        }
    }
}

/// A place classes are loaded from: a directory, an archive, memory.
pub trait AnalysisInputLocation: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Source for `class_type`, or `None` if this location has none.
    fn class_source(
        &self,
        class_type: &ClassType,
        options: &ClassLoadingOptions,
    ) -> Result<Option<Arc<dyn ClassSource>>>;

    /// Every source this location offers, in the location's own order.
    fn class_sources(
        &self,
        factory: &IdentifierFactory,
        options: &ClassLoadingOptions,
    ) -> Result<Vec<Arc<dyn ClassSource>>>;
}
