//! Identity value types and the factory that builds them from JVM names.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use jdescriptor::{MethodDescriptor, TypeDescriptor};

use crate::error::{Error, Result};
use crate::types::{ArrayType, PrimitiveType, Type};

/// Simple class name used by module descriptor units.
pub const MODULE_INFO: &str = "module-info";
/// Simple class name used by package annotation units.
pub const PACKAGE_INFO: &str = "package-info";

/// Dotted package name; empty for the default package.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PackageName {
    name: String,
}

impl PackageName {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn is_default(&self) -> bool {
        self.name.is_empty()
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Identity of a compiled unit. Equality, hashing and ordering are structural
/// on the fully-qualified name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassType {
    package: PackageName,
    class_name: String,
}

impl ClassType {
    pub fn package_name(&self) -> &PackageName {
        &self.package
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn fully_qualified_name(&self) -> String {
        if self.package.is_default() {
            self.class_name.clone()
        } else {
            format!("{}.{}", self.package, self.class_name)
        }
    }

    /// Slash-separated form used inside class files.
    pub fn internal_name(&self) -> String {
        self.fully_qualified_name().replace('.', "/")
    }

    pub fn is_module_info(&self) -> bool {
        self.class_name == MODULE_INFO
    }

    pub fn is_package_info(&self) -> bool {
        self.class_name == PACKAGE_INFO
    }

    pub fn is_inner_class(&self) -> bool {
        self.class_name.contains('$')
    }
}

impl fmt::Display for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.package.is_default() {
            f.write_str(&self.class_name)
        } else {
            write!(f, "{}.{}", self.package, self.class_name)
        }
    }
}

/// Type of an annotation attached to a declaration.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnnotationType(ClassType);

impl AnnotationType {
    pub fn new(class_type: ClassType) -> Self {
        Self(class_type)
    }

    pub fn class_type(&self) -> &ClassType {
        &self.0
    }
}

impl fmt::Display for AnnotationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Reference to a method by declaring class, name and descriptor types.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodRef {
    pub declaring_class: ClassType,
    pub name: String,
    pub parameter_types: Vec<Type>,
    pub return_type: Type,
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}: {} {}(", self.declaring_class, self.return_type, self.name)?;
        for (index, param) in self.parameter_types.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{param}")?;
        }
        f.write_str(")>")
    }
}

/// Well-known class identities.
pub struct CommonClassSignatures;

impl CommonClassSignatures {
    pub fn java_lang_object() -> ClassType {
        IdentifierFactory.class_type("Object", "java.lang")
    }

    pub fn java_lang_cloneable() -> ClassType {
        IdentifierFactory.class_type("Cloneable", "java.lang")
    }

    pub fn java_io_serializable() -> ClassType {
        IdentifierFactory.class_type("Serializable", "java.io")
    }
}

/// Builds identities and types from the spellings found in class files,
/// archives and source code.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentifierFactory;

impl IdentifierFactory {
    pub fn package_name(&self, name: &str) -> PackageName {
        PackageName::new(name)
    }

    /// Identity of `class_name` in `package`. A dotted `class_name` is folded
    /// into the package, so every spelling of one qualified name yields the
    /// same key.
    pub fn class_type(&self, class_name: &str, package: &str) -> ClassType {
        if package.is_empty() {
            self.class_type_from_fqn(class_name)
        } else {
            self.class_type_from_fqn(&format!("{package}.{class_name}"))
        }
    }

    /// `java.lang.String` style names.
    pub fn class_type_from_fqn(&self, fqn: &str) -> ClassType {
        let (package, class_name) = fqn.rsplit_once('.').unwrap_or(("", fqn));
        ClassType {
            package: self.package_name(package),
            class_name: class_name.to_string(),
        }
    }

    /// `java/lang/String` style names.
    pub fn class_type_from_internal(&self, internal: &str) -> ClassType {
        self.class_type_from_fqn(&internal.replace('/', "."))
    }

    /// Maps a relative `a/b/C.class` path (or archive entry) to its identity.
    pub fn class_type_from_path(&self, path: &Path) -> Option<ClassType> {
        if path.extension().and_then(|ext| ext.to_str()) != Some("class") {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        let mut segments = Vec::new();
        if let Some(parent) = path.parent() {
            for component in parent.components() {
                segments.push(component.as_os_str().to_str()?.to_string());
            }
        }
        Some(self.class_type(stem, &segments.join(".")))
    }

    pub fn module_info_type(&self, module_name: &str) -> ClassType {
        self.class_type(MODULE_INFO, module_name)
    }

    pub fn is_valid_module_name(&self, name: &str) -> bool {
        is_dotted_identifier(name)
    }

    pub fn is_valid_package_name(&self, name: &str) -> bool {
        is_dotted_identifier(name)
    }

    /// Parses a field descriptor such as `I`, `[[J` or `Ljava/lang/String;`.
    pub fn parse_field_descriptor(&self, descriptor: &str) -> Result<Type> {
        let parsed =
            TypeDescriptor::from_str(descriptor).map_err(|_| invalid_descriptor(descriptor))?;
        match self.descriptor_type(&parsed, descriptor)? {
            Type::Void => Err(invalid_descriptor(descriptor)),
            ty => Ok(ty),
        }
    }

    /// Parses a method descriptor such as `(ILjava/lang/String;)V` into its
    /// parameter types and return type.
    pub fn parse_method_descriptor(&self, descriptor: &str) -> Result<(Vec<Type>, Type)> {
        let parsed =
            MethodDescriptor::from_str(descriptor).map_err(|_| invalid_descriptor(descriptor))?;
        let mut parameters = Vec::new();
        for parameter in parsed.parameter_types() {
            match self.descriptor_type(parameter, descriptor)? {
                Type::Void => return Err(invalid_descriptor(descriptor)),
                ty => parameters.push(ty),
            }
        }
        let return_type = self.descriptor_type(parsed.return_type(), descriptor)?;
        Ok((parameters, return_type))
    }

    fn descriptor_type(&self, parsed: &TypeDescriptor, descriptor: &str) -> Result<Type> {
        let ty = match parsed {
            TypeDescriptor::Boolean => Type::Primitive(PrimitiveType::Boolean),
            TypeDescriptor::Byte => Type::Primitive(PrimitiveType::Byte),
            TypeDescriptor::Char => Type::Primitive(PrimitiveType::Char),
            TypeDescriptor::Short => Type::Primitive(PrimitiveType::Short),
            TypeDescriptor::Integer => Type::Primitive(PrimitiveType::Int),
            TypeDescriptor::Long => Type::Primitive(PrimitiveType::Long),
            TypeDescriptor::Float => Type::Primitive(PrimitiveType::Float),
            TypeDescriptor::Double => Type::Primitive(PrimitiveType::Double),
            TypeDescriptor::Void => Type::Void,
            TypeDescriptor::Object(internal) if internal.is_empty() => {
                return Err(invalid_descriptor(descriptor));
            }
            TypeDescriptor::Object(internal) => {
                Type::Class(self.class_type_from_internal(internal))
            }
            TypeDescriptor::Array(element, dimensions) => {
                let element = self.descriptor_type(element, descriptor)?;
                let array = ArrayType::new(element, *dimensions as u32)
                    .map_err(|_| invalid_descriptor(descriptor))?;
                Type::Array(array)
            }
        };
        Ok(ty)
    }
}

fn invalid_descriptor(descriptor: &str) -> Error {
    Error::decode("descriptor", format!("invalid descriptor `{descriptor}`"))
}

fn is_dotted_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) if first.is_alphabetic() || first == '_' || first == '$' => {
                    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
                }
                _ => false,
            }
        })
}
