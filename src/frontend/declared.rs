use std::path::{Path, PathBuf};

use crate::model::{SootField, SootMethod};
use crate::modifier::{Modifier, Modifiers};
use crate::position::Position;
use crate::signature::{AnnotationType, ClassType};
use crate::source::ClassSource;

/// Class source holding already-structured data. Used by embedders that
/// produce classes themselves and by tests.
#[derive(Clone, Debug)]
pub struct DeclaredClassSource {
    input_location: String,
    source_path: PathBuf,
    class_type: ClassType,
    modifiers: Modifiers,
    position: Option<Position>,
    superclass: Option<ClassType>,
    interfaces: Vec<ClassType>,
    fields: Vec<SootField>,
    methods: Vec<SootMethod>,
    annotations: Vec<AnnotationType>,
}

impl DeclaredClassSource {
    pub fn new(input_location: impl Into<String>, class_type: ClassType) -> Self {
        let source_path = PathBuf::from(format!("{}.class", class_type.internal_name()));
        Self {
            input_location: input_location.into(),
            source_path,
            class_type,
            modifiers: Modifiers::from([Modifier::Public]),
            position: None,
            superclass: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn with_source_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = path.into();
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_superclass(mut self, superclass: ClassType) -> Self {
        self.superclass = Some(superclass);
        self
    }

    pub fn with_interface(mut self, interface: ClassType) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn with_field(mut self, field: SootField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_method(mut self, method: SootMethod) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_annotation(mut self, annotation: AnnotationType) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Same declaration attributed to another location.
    pub fn relocated(&self, input_location: impl Into<String>) -> Self {
        Self {
            input_location: input_location.into(),
            ..self.clone()
        }
    }
}

impl ClassSource for DeclaredClassSource {
    fn input_location(&self) -> &str {
        &self.input_location
    }

    fn source_path(&self) -> &Path {
        &self.source_path
    }

    fn class_type(&self) -> &ClassType {
        &self.class_type
    }

    fn resolve_modifiers(&self) -> Modifiers {
        self.modifiers.clone()
    }

    fn resolve_position(&self) -> Option<Position> {
        self.position
    }

    fn resolve_superclass(&self) -> Option<ClassType> {
        self.superclass.clone()
    }

    fn resolve_interfaces(&self) -> Vec<ClassType> {
        self.interfaces.clone()
    }

    fn resolve_fields(&self) -> Vec<SootField> {
        self.fields.clone()
    }

    fn resolve_methods(&self) -> Vec<SootMethod> {
        self.methods.clone()
    }

    fn resolve_annotations(&self) -> Vec<AnnotationType> {
        self.annotations.clone()
    }
}
