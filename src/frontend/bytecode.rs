use std::path::{Path, PathBuf};

use jclassfile::attributes::{Annotation, Attribute};
use jclassfile::class_file::{self, ClassFlags};
use jclassfile::constant_pool::ConstantPool;
use jclassfile::fields::FieldFlags;
use jclassfile::methods::MethodFlags;
use tracing::trace;

use crate::error::{Error, Result};
use crate::model::{SootField, SootMethod};
use crate::modifier::{Modifier, Modifiers};
use crate::position::Position;
use crate::signature::{AnnotationType, ClassType, IdentifierFactory};
use crate::types::Type;
use crate::source::{ClassLoadingOptions, ClassSource};

/// Class source decoded from class-file bytes.
#[derive(Debug)]
pub struct BytecodeClassSource {
    input_location: String,
    source_path: PathBuf,
    class_type: ClassType,
    modifiers: Modifiers,
    superclass: Option<ClassType>,
    interfaces: Vec<ClassType>,
    fields: Vec<SootField>,
    methods: Vec<SootMethod>,
    annotations: Vec<AnnotationType>,
}

impl BytecodeClassSource {
    /// Decodes class-file bytes read from `source_path`.
    pub fn decode(
        input_location: &str,
        source_path: &Path,
        data: &[u8],
        options: &ClassLoadingOptions,
    ) -> Result<Self> {
        let origin = source_path.display().to_string();
        let factory = IdentifierFactory;
        let class_file = class_file::parse(data)
            .map_err(|err| Error::decode(&origin, err.to_string()))?;
        let constant_pool = class_file.constant_pool();

        let class_name = resolve_class_name(constant_pool, class_file.this_class(), &origin)?;
        let superclass = match class_file.super_class() {
            0 => None,
            index => Some(factory.class_type_from_internal(&resolve_class_name(
                constant_pool,
                index,
                &origin,
            )?)),
        };
        let interfaces = class_file
            .interfaces()
            .iter()
            .map(|index| {
                resolve_class_name(constant_pool, *index, &origin)
                    .map(|name| factory.class_type_from_internal(&name))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut fields = Vec::new();
        let mut methods = Vec::new();
        if options.resolve_members {
            for field in class_file.fields() {
                let name = resolve_utf8(constant_pool, field.name_index(), &origin)?;
                let descriptor = resolve_utf8(constant_pool, field.descriptor_index(), &origin)?;
                fields.push(SootField {
                    name,
                    ty: factory.parse_field_descriptor(&descriptor)?,
                    modifiers: field_flag_modifiers(field.access_flags()),
                });
            }
            for method in class_file.methods() {
                let name = resolve_utf8(constant_pool, method.name_index(), &origin)?;
                let descriptor = resolve_utf8(constant_pool, method.descriptor_index(), &origin)?;
                let (parameter_types, return_type) = factory.parse_method_descriptor(&descriptor)?;
                methods.push(SootMethod {
                    name,
                    parameter_types,
                    return_type,
                    modifiers: method_flag_modifiers(method.access_flags()),
                });
            }
            if !options.include_synthetic {
                fields.retain(|field| !field.modifiers.contains(&Modifier::Synthetic));
                methods.retain(|method| !method.modifiers.contains(&Modifier::Synthetic));
            }
        }

        let mut annotations = Vec::new();
        for attribute in class_file.attributes() {
            if let Attribute::RuntimeVisibleAnnotations { annotations: found, .. }
            | Attribute::RuntimeInvisibleAnnotations { annotations: found } = attribute
            {
                for annotation in found {
                    annotations.push(resolve_annotation(constant_pool, annotation, &origin)?);
                }
            }
        }

        trace!(
            class = %class_name,
            fields = fields.len(),
            methods = methods.len(),
            annotations = annotations.len(),
            "decoded class file"
        );

        Ok(Self {
            input_location: input_location.to_string(),
            source_path: source_path.to_path_buf(),
            class_type: factory.class_type_from_internal(&class_name),
            modifiers: class_flag_modifiers(class_file.access_flags()),
            superclass,
            interfaces,
            fields,
            methods,
            annotations,
        })
    }
}

impl ClassSource for BytecodeClassSource {
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
        None
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

fn resolve_utf8(constant_pool: &[ConstantPool], index: u16, origin: &str) -> Result<String> {
    match constant_pool.get(index as usize) {
        Some(ConstantPool::Utf8 { value }) => Ok(value.clone()),
        _ => Err(Error::decode(
            origin,
            format!("expected UTF8 constant at index {index}"),
        )),
    }
}

fn resolve_class_name(
    constant_pool: &[ConstantPool],
    index: u16,
    origin: &str,
) -> Result<String> {
    match constant_pool.get(index as usize) {
        Some(ConstantPool::Class { name_index }) => {
            resolve_utf8(constant_pool, *name_index, origin)
        }
        _ => Err(Error::decode(
            origin,
            format!("expected class constant at index {index}"),
        )),
    }
}

/// Annotation type from its `Lpkg/Name;` descriptor.
fn resolve_annotation(
    constant_pool: &[ConstantPool],
    annotation: &Annotation,
    origin: &str,
) -> Result<AnnotationType> {
    let descriptor = resolve_utf8(constant_pool, annotation.type_index(), origin)?;
    match IdentifierFactory.parse_field_descriptor(&descriptor)? {
        Type::Class(class_type) => Ok(AnnotationType::new(class_type)),
        other => Err(Error::decode(
            origin,
            format!("annotation type {other} is not a class"),
        )),
    }
}

fn class_flag_modifiers(flags: &ClassFlags) -> Modifiers {
    [
        (ClassFlags::ACC_PUBLIC, Modifier::Public),
        (ClassFlags::ACC_FINAL, Modifier::Final),
        (ClassFlags::ACC_INTERFACE, Modifier::Interface),
        (ClassFlags::ACC_ABSTRACT, Modifier::Abstract),
        (ClassFlags::ACC_SYNTHETIC, Modifier::Synthetic),
        (ClassFlags::ACC_ANNOTATION, Modifier::Annotation),
        (ClassFlags::ACC_ENUM, Modifier::Enum),
    ]
    .into_iter()
    .filter_map(|(flag, modifier)| flags.contains(flag).then_some(modifier))
    .collect()
}

fn field_flag_modifiers(flags: &FieldFlags) -> Modifiers {
    [
        (FieldFlags::ACC_PUBLIC, Modifier::Public),
        (FieldFlags::ACC_PRIVATE, Modifier::Private),
        (FieldFlags::ACC_PROTECTED, Modifier::Protected),
        (FieldFlags::ACC_STATIC, Modifier::Static),
        (FieldFlags::ACC_FINAL, Modifier::Final),
        (FieldFlags::ACC_VOLATILE, Modifier::Volatile),
        (FieldFlags::ACC_TRANSIENT, Modifier::Transient),
        (FieldFlags::ACC_SYNTHETIC, Modifier::Synthetic),
        (FieldFlags::ACC_ENUM, Modifier::Enum),
    ]
    .into_iter()
    .filter_map(|(flag, modifier)| flags.contains(flag).then_some(modifier))
    .collect()
}

fn method_flag_modifiers(flags: &MethodFlags) -> Modifiers {
    [
        (MethodFlags::ACC_PUBLIC, Modifier::Public),
        (MethodFlags::ACC_PRIVATE, Modifier::Private),
        (MethodFlags::ACC_PROTECTED, Modifier::Protected),
        (MethodFlags::ACC_STATIC, Modifier::Static),
        (MethodFlags::ACC_FINAL, Modifier::Final),
        (MethodFlags::ACC_SYNCHRONIZED, Modifier::Synchronized),
        (MethodFlags::ACC_BRIDGE, Modifier::Bridge),
        (MethodFlags::ACC_VARARGS, Modifier::Varargs),
        (MethodFlags::ACC_NATIVE, Modifier::Native),
        (MethodFlags::ACC_ABSTRACT, Modifier::Abstract),
        (MethodFlags::ACC_STRICT, Modifier::Strict),
        (MethodFlags::ACC_SYNTHETIC, Modifier::Synthetic),
    ]
    .into_iter()
    .filter_map(|(flag, modifier)| flags.contains(flag).then_some(modifier))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::fixtures::ClassFixture;
    use crate::types::{PrimitiveType, Type};

    fn sample() -> Vec<u8> {
        ClassFixture::new("com/example/Service")
            .flags(0x0601)
            .interface("java/lang/Runnable")
            .field("count", "I", 0x0002)
            .field("this$0", "Lcom/example/Outer;", 0x1010)
            .method("run", "()V", 0x0401)
            .method("lambda$0", "([Ljava/lang/String;J)Z", 0x1108)
            .build()
    }

    #[test]
    fn decodes_header_and_members() {
        let source = BytecodeClassSource::decode(
            "classes",
            Path::new("com/example/Service.class"),
            &sample(),
            &ClassLoadingOptions::default(),
        )
        .expect("decode class");

        assert_eq!("com.example.Service", source.class_type().to_string());
        assert_eq!(
            Some("java.lang.Object".to_string()),
            source.resolve_superclass().map(|ty| ty.to_string())
        );
        assert_eq!(1, source.resolve_interfaces().len());
        assert!(source.resolve_modifiers().contains(&Modifier::Interface));
        assert!(source.resolve_modifiers().contains(&Modifier::Abstract));

        let fields = source.resolve_fields();
        assert_eq!(2, fields.len());
        assert_eq!(Type::Primitive(PrimitiveType::Int), fields[0].ty);
        assert!(fields[0].modifiers.contains(&Modifier::Private));

        let methods = source.resolve_methods();
        assert_eq!(2, methods.len());
        assert_eq!(2, methods[1].parameter_types.len());
        assert_eq!(Type::Primitive(PrimitiveType::Boolean), methods[1].return_type);
        assert!(methods[1].modifiers.contains(&Modifier::Static));
    }

    #[test]
    fn options_skip_members_or_synthetic_ones() {
        let data = sample();
        let without_members = BytecodeClassSource::decode(
            "classes",
            Path::new("Service.class"),
            &data,
            &ClassLoadingOptions {
                resolve_members: false,
                include_synthetic: true,
            },
        )
        .expect("decode class");
        assert!(without_members.resolve_fields().is_empty());
        assert!(without_members.resolve_methods().is_empty());

        let without_synthetic = BytecodeClassSource::decode(
            "classes",
            Path::new("Service.class"),
            &data,
            &ClassLoadingOptions {
                resolve_members: true,
                include_synthetic: false,
            },
        )
        .expect("decode class");
        assert_eq!(1, without_synthetic.resolve_fields().len());
        assert_eq!(1, without_synthetic.resolve_methods().len());
        assert_eq!("run", without_synthetic.resolve_methods()[0].name);
    }

    #[test]
    fn decodes_class_annotations() {
        let data = ClassFixture::new("com/example/package-info")
            .flags(0x1600)
            .annotation("Ljava/lang/Deprecated;")
            .annotation("Lcom/example/Marker;")
            .build();

        let source = BytecodeClassSource::decode(
            "classes",
            Path::new("com/example/package-info.class"),
            &data,
            &ClassLoadingOptions::default(),
        )
        .expect("decode class");

        let names: Vec<String> = source
            .resolve_annotations()
            .iter()
            .map(|annotation| annotation.class_type().to_string())
            .collect();
        assert_eq!(vec!["java.lang.Deprecated", "com.example.Marker"], names);
    }

    #[test]
    fn rejects_invalid_bytes() {
        let result = BytecodeClassSource::decode(
            "classes",
            Path::new("bad.class"),
            b"nope",
            &ClassLoadingOptions::default(),
        );

        assert!(matches!(result, Err(Error::Decode { .. })));
    }
}
