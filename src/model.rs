//! Resolved program units. Built once per identity by the view and shared
//! through `Arc` afterwards.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::modifier::{Modifier, Modifiers};
use crate::position::Position;
use crate::source::{
    ClassSource, ModuleReference, PackageReference, ServiceProvision, SourceType,
};
use crate::signature::{AnnotationType, ClassType, MethodRef};
use crate::types::Type;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SootField {
    pub name: String,
    pub ty: Type,
    pub modifiers: Modifiers,
}

impl SootField {
    pub fn is_static(&self) -> bool {
        self.modifiers.contains(&Modifier::Static)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SootMethod {
    pub name: String,
    pub parameter_types: Vec<Type>,
    pub return_type: Type,
    pub modifiers: Modifiers,
}

impl SootMethod {
    pub fn is_static(&self) -> bool {
        self.modifiers.contains(&Modifier::Static)
    }

    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }

    /// Reference usable by invoke expressions.
    pub fn method_ref(&self, declaring_class: &ClassType) -> MethodRef {
        MethodRef {
            declaring_class: declaring_class.clone(),
            name: self.name.clone(),
            parameter_types: self.parameter_types.clone(),
            return_type: self.return_type.clone(),
        }
    }
}

/// A resolved class, interface, enum or annotation type.
#[derive(Clone, Debug)]
pub struct SootClass {
    class_type: ClassType,
    source_type: SourceType,
    input_location: String,
    source_path: PathBuf,
    modifiers: Modifiers,
    position: Option<Position>,
    superclass: Option<ClassType>,
    interfaces: Vec<ClassType>,
    fields: Vec<SootField>,
    methods: Vec<SootMethod>,
    annotations: Vec<AnnotationType>,
}

impl SootClass {
    pub fn class_type(&self) -> &ClassType {
        &self.class_type
    }

    /// Role of the location the class was built from.
    pub fn source_type(&self) -> SourceType {
        self.source_type
    }

    pub fn is_application_class(&self) -> bool {
        self.source_type == SourceType::Application
    }

    pub fn is_library_class(&self) -> bool {
        self.source_type == SourceType::Library
    }

    pub fn input_location(&self) -> &str {
        &self.input_location
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn modifiers(&self) -> &Modifiers {
        &self.modifiers
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    pub fn superclass(&self) -> Option<&ClassType> {
        self.superclass.as_ref()
    }

    pub fn interfaces(&self) -> &[ClassType] {
        &self.interfaces
    }

    pub fn fields(&self) -> &[SootField] {
        &self.fields
    }

    pub fn methods(&self) -> &[SootMethod] {
        &self.methods
    }

    pub fn annotations(&self) -> &[AnnotationType] {
        &self.annotations
    }

    pub fn is_interface(&self) -> bool {
        self.modifiers.contains(&Modifier::Interface)
    }

    pub fn field(&self, name: &str) -> Option<&SootField> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a SootMethod> + 'a {
        self.methods.iter().filter(move |method| method.name == name)
    }

    /// Superclass followed by interfaces, in declaration order.
    pub fn direct_supertypes(&self) -> Vec<ClassType> {
        self.superclass
            .iter()
            .chain(self.interfaces.iter())
            .cloned()
            .collect()
    }
}

/// A resolved module descriptor.
#[derive(Clone, Debug)]
pub struct SootModuleInfo {
    class_type: ClassType,
    source_type: SourceType,
    module_name: String,
    input_location: String,
    source_path: PathBuf,
    modifiers: Modifiers,
    requires: Vec<ModuleReference>,
    exports: Vec<PackageReference>,
    opens: Vec<PackageReference>,
    provides: Vec<ServiceProvision>,
    uses: Vec<ClassType>,
}

impl SootModuleInfo {
    pub fn class_type(&self) -> &ClassType {
        &self.class_type
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn source_type(&self) -> SourceType {
        self.source_type
    }

    pub fn input_location(&self) -> &str {
        &self.input_location
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn modifiers(&self) -> &Modifiers {
        &self.modifiers
    }

    pub fn is_open(&self) -> bool {
        self.modifiers.contains(&Modifier::Open)
    }

    pub fn requires(&self) -> &[ModuleReference] {
        &self.requires
    }

    pub fn exports(&self) -> &[PackageReference] {
        &self.exports
    }

    pub fn opens(&self) -> &[PackageReference] {
        &self.opens
    }

    pub fn provides(&self) -> &[ServiceProvision] {
        &self.provides
    }

    pub fn uses(&self) -> &[ClassType] {
        &self.uses
    }
}

/// What the view memoizes for one identity.
#[derive(Clone, Debug)]
pub enum AbstractClass {
    Class(Arc<SootClass>),
    Module(Arc<SootModuleInfo>),
}

impl AbstractClass {
    pub fn class_type(&self) -> &ClassType {
        match self {
            AbstractClass::Class(class) => class.class_type(),
            AbstractClass::Module(module) => module.class_type(),
        }
    }

    /// Kind name used in type mismatch errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            AbstractClass::Class(_) => "class",
            AbstractClass::Module(_) => "module descriptor",
        }
    }

    pub fn as_class(&self) -> Option<&Arc<SootClass>> {
        match self {
            AbstractClass::Class(class) => Some(class),
            AbstractClass::Module(_) => None,
        }
    }

    pub fn as_module(&self) -> Option<&Arc<SootModuleInfo>> {
        match self {
            AbstractClass::Class(_) => None,
            AbstractClass::Module(module) => Some(module),
        }
    }
}

/// Materializes a source into its resolved form. The source is read once.
pub fn build_class(source: &dyn ClassSource, source_type: SourceType) -> AbstractClass {
    let class_type = source.class_type().clone();
    let input_location = source.input_location().to_string();
    let source_path = source.source_path().to_path_buf();
    let modifiers = source.resolve_modifiers();

    if let Some(module) = source.module_facet() {
        return AbstractClass::Module(Arc::new(SootModuleInfo {
            class_type,
            source_type,
            module_name: module.module_name().to_string(),
            input_location,
            source_path,
            modifiers,
            requires: module.requires(),
            exports: module.exports(),
            opens: module.opens(),
            provides: module.provides(),
            uses: module.uses(),
        }));
    }

    AbstractClass::Class(Arc::new(SootClass {
        class_type,
        source_type,
        input_location,
        source_path,
        modifiers,
        position: source.resolve_position(),
        superclass: source.resolve_superclass(),
        interfaces: source.resolve_interfaces(),
        fields: source.resolve_fields(),
        methods: source.resolve_methods(),
        annotations: source.resolve_annotations(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::{DeclaredClassSource, DescriptorModuleSource, ModuleDescriptor};
    use crate::signature::IdentifierFactory;
    use crate::types::PrimitiveType;

    #[test]
    fn builds_class_with_members() {
        let factory = IdentifierFactory;
        let class_type = factory.class_type_from_fqn("com.example.Point");
        let source = DeclaredClassSource::new("memory", class_type.clone())
            .with_superclass(factory.class_type_from_fqn("java.lang.Object"))
            .with_interface(factory.class_type_from_fqn("java.io.Serializable"))
            .with_field(SootField {
                name: "x".to_string(),
                ty: Type::Primitive(PrimitiveType::Int),
                modifiers: Modifiers::from([Modifier::Private]),
            })
            .with_method(SootMethod {
                name: "<init>".to_string(),
                parameter_types: Vec::new(),
                return_type: Type::Void,
                modifiers: Modifiers::from([Modifier::Public]),
            });

        let AbstractClass::Class(class) = build_class(&source, SourceType::Library) else {
            panic!("expected a class");
        };

        assert_eq!(&class_type, class.class_type());
        assert_eq!("memory", class.input_location());
        assert!(class.is_library_class());
        assert!(!class.is_application_class());
        assert_eq!(2, class.direct_supertypes().len());
        assert!(class.field("x").is_some());
        assert!(class.methods_named("<init>").all(SootMethod::is_constructor));
        let method_ref = class.methods()[0].method_ref(class.class_type());
        assert_eq!("<com.example.Point: void <init>()>", method_ref.to_string());
    }

    #[test]
    fn builds_module_info_from_module_facet() {
        let descriptor = ModuleDescriptor::new("com.example.app")
            .with_requires("java.base", 0x8000)
            .with_uses("com/example/spi/Plugin");
        let source = DescriptorModuleSource::new("memory", descriptor);

        let built = build_class(&source, SourceType::Application);

        assert_eq!("module descriptor", built.kind_name());
        let module = built.as_module().expect("module");
        assert_eq!("com.example.app", module.module_name());
        assert_eq!(SourceType::Application, module.source_type());
        assert_eq!(1, module.requires().len());
        assert!(module.requires()[0].modifiers.contains(&Modifier::Mandated));
        assert_eq!(1, module.uses().len());
        assert!(built.as_class().is_none());
    }
}
