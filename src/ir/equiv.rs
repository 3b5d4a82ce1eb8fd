//! Structural equivalence of IR values.
//!
//! Equivalence is separate from `==`: ordinary equality of expressions
//! compares operand box identities, while equivalence compares shape.
//! Both [`ValueArena::equiv_to`] and [`ValueArena::equiv_hash`] are derived
//! from the same [`EquivKey`], which keeps them consistent.
//!
//! Per variant:
//! - locals and constants: equal values (floats by bit pattern);
//! - binary, unary: same operator and equivalent operands, in order;
//! - cast, instanceof: same target type and equivalent operand;
//! - new: same class type;
//! - newarray: same base type and equivalent size;
//! - newmultiarray: same array type and the same number of sizes. The size
//!   values are ignored, so `new int[a][]` and `new int[b][]` are equivalent;
//! - invoke: same kind and method, equivalent base and arguments.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::ir::expr::{BinaryOp, Expr, InvokeKind, UnaryOp};
use crate::ir::local::Local;
use crate::ir::value::{Constant, Value, ValueArena, ValueBox};
use crate::signature::{ClassType, MethodRef};
use crate::types::{ArrayType, Type};

/// Canonical structural form of a value. Keys built from different arenas
/// can be compared directly.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EquivKey {
    Local(Local),
    Constant(Constant),
    Binary(BinaryOp, Box<EquivKey>, Box<EquivKey>),
    Unary(UnaryOp, Box<EquivKey>),
    Cast(Type, Box<EquivKey>),
    InstanceOf(Type, Box<EquivKey>),
    New(ClassType),
    NewArray(Type, Box<EquivKey>),
    NewMultiArray {
        array_type: ArrayType,
        size_count: usize,
    },
    Invoke {
        kind: InvokeKind,
        method: MethodRef,
        base: Option<Box<EquivKey>>,
        args: Vec<EquivKey>,
    },
}

impl ValueArena {
    pub fn equiv_key(&self, value: &Value) -> EquivKey {
        match value {
            Value::Local(local) => EquivKey::Local(local.clone()),
            Value::Constant(constant) => EquivKey::Constant(constant.clone()),
            Value::Expr(expr) => self.expr_key(expr),
        }
    }

    fn boxed_key(&self, slot: ValueBox) -> Box<EquivKey> {
        Box::new(self.equiv_key(self.value(slot)))
    }

    fn expr_key(&self, expr: &Expr) -> EquivKey {
        match expr {
            Expr::Binary { op, left, right } => {
                EquivKey::Binary(*op, self.boxed_key(*left), self.boxed_key(*right))
            }
            Expr::Unary { op, operand } => EquivKey::Unary(*op, self.boxed_key(*operand)),
            Expr::Cast { operand, cast_type } => {
                EquivKey::Cast(cast_type.clone(), self.boxed_key(*operand))
            }
            Expr::InstanceOf {
                operand,
                check_type,
            } => EquivKey::InstanceOf(check_type.clone(), self.boxed_key(*operand)),
            Expr::New { class_type } => EquivKey::New(class_type.clone()),
            Expr::NewArray { base_type, size } => {
                EquivKey::NewArray(base_type.clone(), self.boxed_key(*size))
            }
            Expr::NewMultiArray { array_type, sizes } => EquivKey::NewMultiArray {
                array_type: array_type.clone(),
                size_count: sizes.len(),
            },
            Expr::Invoke {
                kind,
                method,
                base,
                args,
            } => EquivKey::Invoke {
                kind: *kind,
                method: method.clone(),
                base: base.map(|slot| self.boxed_key(slot)),
                args: args
                    .iter()
                    .map(|slot| self.equiv_key(self.value(*slot)))
                    .collect(),
            },
        }
    }

    pub fn equiv_to(&self, a: &Value, b: &Value) -> bool {
        self.equiv_key(a) == self.equiv_key(b)
    }

    pub fn equiv_hash(&self, value: &Value) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.equiv_key(value).hash(&mut hasher);
        hasher.finish()
    }
}
