//! The closed type lattice used by the IR.

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use crate::error::{Error, Result};
use crate::signature::{ClassType, CommonClassSignatures};

/// Fixed hash code of the null type.
pub const NULL_TYPE_HASH: u32 = 0x9891_DFE1;

static NULL_TYPE: OnceLock<NullType> = OnceLock::new();

/// Type of the `null` literal. Exactly one instance exists per process.
#[derive(Debug)]
pub struct NullType {
    _private: (),
}

impl NullType {
    pub fn instance() -> &'static NullType {
        NULL_TYPE.get_or_init(|| NullType { _private: () })
    }

    pub fn hash_code(&self) -> u32 {
        NULL_TYPE_HASH
    }
}

impl PartialEq for NullType {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for NullType {}

impl Hash for NullType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        NULL_TYPE_HASH.hash(state);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Char => "char",
            PrimitiveType::Short => "short",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }

    /// JLS widening primitive conversion, including identity.
    pub fn widens_to(self, target: PrimitiveType) -> bool {
        use PrimitiveType::*;
        if self == target {
            return true;
        }
        match self {
            Byte => matches!(target, Short | Int | Long | Float | Double),
            Short | Char => matches!(target, Int | Long | Float | Double),
            Int => matches!(target, Long | Float | Double),
            Long => matches!(target, Float | Double),
            Float => matches!(target, Double),
            Double | Boolean => false,
        }
    }
}

/// Array of a non-array base type with one or more dimensions.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ArrayType {
    base_type: Box<Type>,
    dimensions: u32,
}

impl ArrayType {
    /// Nested array bases are flattened into the dimension count.
    pub fn new(base_type: Type, dimensions: u32) -> Result<Self> {
        if dimensions == 0 {
            return Err(Error::InvalidTypeOperation(format!(
                "array of {base_type} needs at least one dimension"
            )));
        }
        match base_type {
            Type::Array(inner) => Ok(Self {
                base_type: inner.base_type,
                dimensions: inner.dimensions + dimensions,
            }),
            Type::Void | Type::Unknown | Type::Null(_) => Err(Error::InvalidTypeOperation(
                format!("cannot build an array of {base_type}"),
            )),
            base_type => Ok(Self {
                base_type: Box::new(base_type),
                dimensions,
            }),
        }
    }

    pub fn base_type(&self) -> &Type {
        &self.base_type
    }

    pub fn dimensions(&self) -> u32 {
        self.dimensions
    }

    /// Type obtained by indexing the array once.
    pub fn element_type(&self) -> Type {
        if self.dimensions == 1 {
            (*self.base_type).clone()
        } else {
            Type::Array(ArrayType {
                base_type: self.base_type.clone(),
                dimensions: self.dimensions - 1,
            })
        }
    }

    /// Strips exactly `count` array layers.
    pub fn base_type_under(&self, count: u32) -> Result<Type> {
        if count > self.dimensions {
            return Err(Error::InvalidTypeOperation(format!(
                "cannot strip {count} dimensions from {self}"
            )));
        }
        if count == self.dimensions {
            return Ok((*self.base_type).clone());
        }
        Ok(Type::Array(ArrayType {
            base_type: self.base_type.clone(),
            dimensions: self.dimensions - count,
        }))
    }
}

impl fmt::Display for ArrayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_type)?;
        for _ in 0..self.dimensions {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Primitive(PrimitiveType),
    Class(ClassType),
    Array(ArrayType),
    Null(&'static NullType),
    Void,
    Unknown,
}

/// Supplies the declared supertypes of class types for subtyping queries.
pub trait TypeHierarchy {
    /// Direct superclass and interfaces of `class_type`; empty when unknown.
    fn direct_supertypes(&self, class_type: &ClassType) -> Vec<ClassType>;
}

impl Type {
    pub fn null() -> Type {
        Type::Null(NullType::instance())
    }

    pub fn make_array(self) -> Result<Type> {
        ArrayType::new(self, 1).map(Type::Array)
    }

    pub fn is_reference_like(&self) -> bool {
        matches!(self, Type::Class(_) | Type::Array(_) | Type::Null(_))
    }

    /// Element type of an array; fails for every other variant.
    pub fn array_element_type(&self) -> Result<Type> {
        match self {
            Type::Array(array) => Ok(array.element_type()),
            other => Err(Error::InvalidTypeOperation(format!(
                "attempt to get array element type of non-array type {other}"
            ))),
        }
    }

    pub fn is_assignable_to(&self, target: &Type, hierarchy: &dyn TypeHierarchy) -> bool {
        match (self, target) {
            (Type::Unknown, _) | (_, Type::Unknown) => false,
            (Type::Void, _) | (_, Type::Void) => false,
            (_, Type::Null(_)) => matches!(self, Type::Null(_)),
            (Type::Primitive(from), Type::Primitive(to)) => from.widens_to(*to),
            (Type::Primitive(_), _) | (_, Type::Primitive(_)) => false,
            (Type::Null(_), _) => true,
            (Type::Class(from), Type::Class(to)) => is_subclass(from, to, hierarchy),
            (Type::Class(_), Type::Array(_)) => false,
            (Type::Array(_), Type::Class(to)) => is_array_supertype(to),
            (Type::Array(from), Type::Array(to)) => array_assignable(from, to, hierarchy),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(primitive) => f.write_str(primitive.name()),
            Type::Class(class_type) => write!(f, "{class_type}"),
            Type::Array(array) => write!(f, "{array}"),
            Type::Null(_) => f.write_str("null_type"),
            Type::Void => f.write_str("void"),
            Type::Unknown => f.write_str("unknown"),
        }
    }
}

fn is_array_supertype(class_type: &ClassType) -> bool {
    *class_type == CommonClassSignatures::java_lang_object()
        || *class_type == CommonClassSignatures::java_lang_cloneable()
        || *class_type == CommonClassSignatures::java_io_serializable()
}

fn array_assignable(from: &ArrayType, to: &ArrayType, hierarchy: &dyn TypeHierarchy) -> bool {
    if from.dimensions == to.dimensions {
        return match (from.base_type(), to.base_type()) {
            (Type::Primitive(a), Type::Primitive(b)) => a == b,
            (Type::Primitive(_), _) | (_, Type::Primitive(_)) => false,
            (a, b) => a.is_assignable_to(b, hierarchy),
        };
    }
    // `String[][]` is an `Object[]`: the surplus dimensions form an array
    // element, which only the array supertypes can hold.
    if from.dimensions > to.dimensions {
        if let Type::Class(base) = to.base_type() {
            return is_array_supertype(base);
        }
    }
    false
}

fn is_subclass(from: &ClassType, to: &ClassType, hierarchy: &dyn TypeHierarchy) -> bool {
    if from == to || *to == CommonClassSignatures::java_lang_object() {
        return true;
    }
    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(from.clone());
    while let Some(current) = queue.pop_front() {
        for parent in hierarchy.direct_supertypes(&current) {
            if parent == *to {
                return true;
            }
            if seen.insert(parent.clone()) {
                queue.push_back(parent);
            }
        }
    }
    false
}
