use std::fmt;

use crate::signature::AnnotationType;
use crate::types::Type;

/// Named, typed storage slot of a method body.
///
/// Equality and hashing cover name, type and annotations. The `with_*`
/// methods derive a new local and leave the receiver untouched.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Local {
    name: String,
    ty: Type,
    annotations: Vec<AnnotationType>,
}

impl Local {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self::with_declared_annotations(name, ty, Vec::new())
    }

    pub fn with_declared_annotations(
        name: impl Into<String>,
        ty: Type,
        annotations: Vec<AnnotationType>,
    ) -> Self {
        Self {
            name: name.into(),
            ty,
            annotations,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn annotations(&self) -> &[AnnotationType] {
        &self.annotations
    }

    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    pub fn with_type(&self, ty: Type) -> Self {
        Self {
            ty,
            ..self.clone()
        }
    }

    pub fn with_annotations(&self, annotations: Vec<AnnotationType>) -> Self {
        Self {
            annotations,
            ..self.clone()
        }
    }
}

impl fmt::Display for Local {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::IdentifierFactory;
    use crate::types::PrimitiveType;

    fn nullable() -> AnnotationType {
        let factory = IdentifierFactory;
        AnnotationType::new(factory.class_type_from_fqn("org.jspecify.annotations.Nullable"))
    }

    #[test]
    fn with_methods_change_one_component() {
        let local = Local::with_declared_annotations(
            "l0",
            Type::Primitive(PrimitiveType::Int),
            vec![nullable()],
        );

        let renamed = local.with_name("l1");
        let retyped = local.with_type(Type::Primitive(PrimitiveType::Long));
        let plain = local.with_annotations(Vec::new());

        assert_eq!("l1", renamed.name());
        assert_eq!(local.ty(), renamed.ty());
        assert_eq!(local.annotations(), renamed.annotations());
        assert_eq!("long", retyped.ty().to_string());
        assert_eq!("l0", retyped.name());
        assert!(plain.annotations().is_empty());
        assert_eq!("l0", local.name());
    }

    #[test]
    fn equality_covers_name_type_and_annotations() {
        let int = Type::Primitive(PrimitiveType::Int);
        let local = Local::with_declared_annotations("l0", int.clone(), vec![nullable()]);

        assert_eq!(
            local,
            Local::with_declared_annotations("l0", int.clone(), vec![nullable()])
        );
        assert_ne!(local, Local::new("l0", int.clone()));
        assert_ne!(local, local.with_name("l1"));
        assert_ne!(local, local.with_type(Type::Primitive(PrimitiveType::Long)));
    }
}
