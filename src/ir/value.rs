use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{Error, Result};
use crate::ir::expr::{BinaryOp, Expr, ExprVisitor, InvokeKind, UnaryOp};
use crate::ir::local::Local;
use crate::signature::{ClassType, IdentifierFactory, MethodRef};
use crate::types::{ArrayType, PrimitiveType, Type};

/// Literal operand. Floating point constants compare and hash by bit pattern.
#[derive(Clone, Debug)]
pub enum Constant {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    /// `Foo.class`; holds a class or array type.
    Class(Type),
    Null,
}

impl Constant {
    pub fn ty(&self) -> Type {
        match self {
            Constant::Int(_) => Type::Primitive(PrimitiveType::Int),
            Constant::Long(_) => Type::Primitive(PrimitiveType::Long),
            Constant::Float(_) => Type::Primitive(PrimitiveType::Float),
            Constant::Double(_) => Type::Primitive(PrimitiveType::Double),
            Constant::String(_) => {
                Type::Class(IdentifierFactory.class_type("String", "java.lang"))
            }
            Constant::Class(_) => Type::Class(IdentifierFactory.class_type("Class", "java.lang")),
            Constant::Null => Type::null(),
        }
    }
}

impl PartialEq for Constant {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Constant::Int(a), Constant::Int(b)) => a == b,
            (Constant::Long(a), Constant::Long(b)) => a == b,
            (Constant::Float(a), Constant::Float(b)) => a.to_bits() == b.to_bits(),
            (Constant::Double(a), Constant::Double(b)) => a.to_bits() == b.to_bits(),
            (Constant::String(a), Constant::String(b)) => a == b,
            (Constant::Class(a), Constant::Class(b)) => a == b,
            (Constant::Null, Constant::Null) => true,
            _ => false,
        }
    }
}

impl Eq for Constant {}

impl Hash for Constant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Constant::Int(value) => value.hash(state),
            Constant::Long(value) => value.hash(state),
            Constant::Float(value) => value.to_bits().hash(state),
            Constant::Double(value) => value.to_bits().hash(state),
            Constant::String(value) => value.hash(state),
            Constant::Class(value) => value.hash(state),
            Constant::Null => {}
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(value) => write!(f, "{value}"),
            Constant::Long(value) => write!(f, "{value}L"),
            Constant::Float(value) => write!(f, "{value:?}F"),
            Constant::Double(value) => write!(f, "{value:?}"),
            Constant::String(value) => write!(f, "{value:?}"),
            Constant::Class(ty) => write!(f, "class \"{ty}\""),
            Constant::Null => f.write_str("null"),
        }
    }
}

/// A node of an IR expression tree.
///
/// Ordinary equality and hashing are identity-based for expressions: two
/// expressions are equal only when they own the very same operand boxes.
/// Use [`ValueArena::equiv_to`] for structural comparison.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    Local(Local),
    Constant(Constant),
    Expr(Expr),
}

impl From<Local> for Value {
    fn from(local: Local) -> Self {
        Value::Local(local)
    }
}

impl From<Constant> for Value {
    fn from(constant: Constant) -> Self {
        Value::Constant(constant)
    }
}

impl From<Expr> for Value {
    fn from(expr: Expr) -> Self {
        Value::Expr(expr)
    }
}

/// Handle to a use slot in a [`ValueArena`]. The handle is the slot's
/// identity: it stays the same when the slot's value is replaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueBox(u32);

impl ValueBox {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ValueBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "box#{}", self.0)
    }
}

/// Owns the use slots of one IR body. Slots are never removed, so a
/// [`ValueBox`] stays valid for the arena's lifetime.
#[derive(Debug, Default)]
pub struct ValueArena {
    slots: Vec<Value>,
}

impl ValueArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Wraps `value` in a fresh slot.
    pub fn new_box(&mut self, value: impl Into<Value>) -> ValueBox {
        let handle = ValueBox(self.slots.len() as u32);
        self.slots.push(value.into());
        handle
    }

    pub fn value(&self, slot: ValueBox) -> &Value {
        &self.slots[slot.index()]
    }

    /// Replaces the value held by `slot` and returns the previous one.
    ///
    /// Fails when the new value would contain `slot` itself.
    pub fn set_value(&mut self, slot: ValueBox, value: impl Into<Value>) -> Result<Value> {
        let value = value.into();
        if slot.index() >= self.slots.len() {
            return Err(Error::MalformedExpression(format!(
                "{slot} does not belong to this arena"
            )));
        }
        if self.use_boxes(&value).contains(&slot) {
            return Err(Error::MalformedExpression(format!(
                "{slot} cannot contain itself"
            )));
        }
        Ok(std::mem::replace(&mut self.slots[slot.index()], value))
    }

    /// Every box read under `value`: its direct operand boxes in operand
    /// order, then the use boxes of each operand, recursively.
    pub fn use_boxes(&self, value: &Value) -> Vec<ValueBox> {
        let mut boxes = Vec::new();
        self.collect_use_boxes(value, &mut boxes);
        boxes
    }

    fn collect_use_boxes(&self, value: &Value, boxes: &mut Vec<ValueBox>) {
        let Value::Expr(expr) = value else {
            return;
        };
        let direct = expr.operand_boxes();
        boxes.extend(direct.iter().copied());
        for slot in direct {
            self.collect_use_boxes(self.value(slot), boxes);
        }
    }

    /// Copies `value` with fresh boxes for every nested operand slot. Locals
    /// and constants are leaves and are copied by value.
    pub fn clone_value(&mut self, value: &Value) -> Value {
        match value {
            Value::Local(_) | Value::Constant(_) => value.clone(),
            Value::Expr(expr) => {
                let mut copy = expr.clone();
                for slot in copy.operand_boxes_mut() {
                    let operand = self.value(*slot).clone();
                    let cloned = self.clone_value(&operand);
                    *slot = self.new_box(cloned);
                }
                Value::Expr(copy)
            }
        }
    }

    pub fn type_of(&self, value: &Value) -> Type {
        match value {
            Value::Local(local) => local.ty().clone(),
            Value::Constant(constant) => constant.ty(),
            Value::Expr(expr) => expr.accept(&mut TypeOf { arena: self }),
        }
    }
}

/// Computes expression result types.
struct TypeOf<'a> {
    arena: &'a ValueArena,
}

impl TypeOf<'_> {
    fn operand_primitive(&self, slot: ValueBox) -> Option<PrimitiveType> {
        match self.arena.type_of(self.arena.value(slot)) {
            Type::Primitive(primitive) => Some(primitive),
            _ => None,
        }
    }

    /// Binary numeric promotion over the operand types.
    fn promote(&self, slots: &[ValueBox]) -> Type {
        let mut result = PrimitiveType::Int;
        for slot in slots {
            match self.operand_primitive(*slot) {
                Some(PrimitiveType::Double) => result = PrimitiveType::Double,
                Some(PrimitiveType::Float) if result != PrimitiveType::Double => {
                    result = PrimitiveType::Float
                }
                Some(PrimitiveType::Long) if result == PrimitiveType::Int => {
                    result = PrimitiveType::Long
                }
                Some(PrimitiveType::Boolean) | None => return Type::Unknown,
                Some(_) => {}
            }
        }
        Type::Primitive(result)
    }
}

impl ExprVisitor for TypeOf<'_> {
    type Output = Type;

    fn visit_binary(&mut self, op: BinaryOp, left: ValueBox, right: ValueBox) -> Type {
        use BinaryOp::*;
        match op {
            Cmp | Cmpg | Cmpl => Type::Primitive(PrimitiveType::Int),
            Eq | Ne | Lt | Le | Gt | Ge => Type::Primitive(PrimitiveType::Boolean),
            Shl | Shr | Ushr => self.promote(&[left]),
            And | Or | Xor
                if self.operand_primitive(left) == Some(PrimitiveType::Boolean)
                    && self.operand_primitive(right) == Some(PrimitiveType::Boolean) =>
            {
                Type::Primitive(PrimitiveType::Boolean)
            }
            Add | Sub | Mul | Div | Rem | And | Or | Xor => self.promote(&[left, right]),
        }
    }

    fn visit_unary(&mut self, op: UnaryOp, operand: ValueBox) -> Type {
        match op {
            UnaryOp::Neg => self.promote(&[operand]),
            UnaryOp::Length => Type::Primitive(PrimitiveType::Int),
        }
    }

    fn visit_cast(&mut self, _operand: ValueBox, cast_type: &Type) -> Type {
        cast_type.clone()
    }

    fn visit_instance_of(&mut self, _operand: ValueBox, _check_type: &Type) -> Type {
        Type::Primitive(PrimitiveType::Boolean)
    }

    fn visit_new(&mut self, class_type: &ClassType) -> Type {
        Type::Class(class_type.clone())
    }

    fn visit_new_array(&mut self, base_type: &Type, _size: ValueBox) -> Type {
        base_type.clone().make_array().unwrap_or(Type::Unknown)
    }

    fn visit_new_multi_array(&mut self, array_type: &ArrayType, _sizes: &[ValueBox]) -> Type {
        Type::Array(array_type.clone())
    }

    fn visit_invoke(
        &mut self,
        _kind: InvokeKind,
        method: &MethodRef,
        _base: Option<ValueBox>,
        _args: &[ValueBox],
    ) -> Type {
        method.return_type.clone()
    }
}
