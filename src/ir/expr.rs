//! Expression variants and their construction.
//!
//! Every operand of an expression lives in its own [`ValueBox`], created
//! fresh at construction time. Construction validates the node's shape and
//! fails with [`Error::MalformedExpression`] instead of deferring the check.

use std::fmt;

use crate::error::{Error, Result};
use crate::ir::value::{Value, ValueArena, ValueBox};
use crate::signature::{ClassType, MethodRef};
use crate::types::{ArrayType, Type};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Ushr,
    Cmp,
    Cmpg,
    Cmpl,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => " + ",
            BinaryOp::Sub => " - ",
            BinaryOp::Mul => " * ",
            BinaryOp::Div => " / ",
            BinaryOp::Rem => " % ",
            BinaryOp::And => " & ",
            BinaryOp::Or => " | ",
            BinaryOp::Xor => " ^ ",
            BinaryOp::Shl => " << ",
            BinaryOp::Shr => " >> ",
            BinaryOp::Ushr => " >>> ",
            BinaryOp::Cmp => " cmp ",
            BinaryOp::Cmpg => " cmpg ",
            BinaryOp::Cmpl => " cmpl ",
            BinaryOp::Eq => " == ",
            BinaryOp::Ne => " != ",
            BinaryOp::Lt => " < ",
            BinaryOp::Le => " <= ",
            BinaryOp::Gt => " > ",
            BinaryOp::Ge => " >= ",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Length,
}

impl UnaryOp {
    pub fn keyword(self) -> &'static str {
        match self {
            UnaryOp::Neg => "neg",
            UnaryOp::Length => "lengthof",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InvokeKind {
    Virtual,
    Special,
    Interface,
    Static,
}

impl InvokeKind {
    pub fn keyword(self) -> &'static str {
        match self {
            InvokeKind::Virtual => "virtualinvoke",
            InvokeKind::Special => "specialinvoke",
            InvokeKind::Interface => "interfaceinvoke",
            InvokeKind::Static => "staticinvoke",
        }
    }

    pub fn has_base(self) -> bool {
        self != InvokeKind::Static
    }
}

impl fmt::Display for InvokeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// The closed set of expression variants.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Expr {
    Binary {
        op: BinaryOp,
        left: ValueBox,
        right: ValueBox,
    },
    Unary {
        op: UnaryOp,
        operand: ValueBox,
    },
    Cast {
        operand: ValueBox,
        cast_type: Type,
    },
    InstanceOf {
        operand: ValueBox,
        check_type: Type,
    },
    New {
        class_type: ClassType,
    },
    NewArray {
        base_type: Type,
        size: ValueBox,
    },
    NewMultiArray {
        array_type: ArrayType,
        sizes: Vec<ValueBox>,
    },
    Invoke {
        kind: InvokeKind,
        method: MethodRef,
        base: Option<ValueBox>,
        args: Vec<ValueBox>,
    },
}

/// One operation over the expression variants. Adding a variant adds a
/// required method here, so every operation has to handle it.
pub trait ExprVisitor {
    type Output;

    fn visit_binary(&mut self, op: BinaryOp, left: ValueBox, right: ValueBox) -> Self::Output;
    fn visit_unary(&mut self, op: UnaryOp, operand: ValueBox) -> Self::Output;
    fn visit_cast(&mut self, operand: ValueBox, cast_type: &Type) -> Self::Output;
    fn visit_instance_of(&mut self, operand: ValueBox, check_type: &Type) -> Self::Output;
    fn visit_new(&mut self, class_type: &ClassType) -> Self::Output;
    fn visit_new_array(&mut self, base_type: &Type, size: ValueBox) -> Self::Output;
    fn visit_new_multi_array(&mut self, array_type: &ArrayType, sizes: &[ValueBox])
    -> Self::Output;
    fn visit_invoke(
        &mut self,
        kind: InvokeKind,
        method: &MethodRef,
        base: Option<ValueBox>,
        args: &[ValueBox],
    ) -> Self::Output;
}

impl Expr {
    pub fn accept<V: ExprVisitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Expr::Binary { op, left, right } => visitor.visit_binary(*op, *left, *right),
            Expr::Unary { op, operand } => visitor.visit_unary(*op, *operand),
            Expr::Cast { operand, cast_type } => visitor.visit_cast(*operand, cast_type),
            Expr::InstanceOf {
                operand,
                check_type,
            } => visitor.visit_instance_of(*operand, check_type),
            Expr::New { class_type } => visitor.visit_new(class_type),
            Expr::NewArray { base_type, size } => visitor.visit_new_array(base_type, *size),
            Expr::NewMultiArray { array_type, sizes } => {
                visitor.visit_new_multi_array(array_type, sizes)
            }
            Expr::Invoke {
                kind,
                method,
                base,
                args,
            } => visitor.visit_invoke(*kind, method, *base, args),
        }
    }

    /// Direct operand boxes in operand order.
    pub fn operand_boxes(&self) -> Vec<ValueBox> {
        match self {
            Expr::Binary { left, right, .. } => vec![*left, *right],
            Expr::Unary { operand, .. }
            | Expr::Cast { operand, .. }
            | Expr::InstanceOf { operand, .. } => vec![*operand],
            Expr::New { .. } => Vec::new(),
            Expr::NewArray { size, .. } => vec![*size],
            Expr::NewMultiArray { sizes, .. } => sizes.clone(),
            Expr::Invoke { base, args, .. } => base.iter().chain(args.iter()).copied().collect(),
        }
    }

    pub(crate) fn operand_boxes_mut(&mut self) -> Vec<&mut ValueBox> {
        match self {
            Expr::Binary { left, right, .. } => vec![left, right],
            Expr::Unary { operand, .. }
            | Expr::Cast { operand, .. }
            | Expr::InstanceOf { operand, .. } => vec![operand],
            Expr::New { .. } => Vec::new(),
            Expr::NewArray { size, .. } => vec![size],
            Expr::NewMultiArray { sizes, .. } => sizes.iter_mut().collect(),
            Expr::Invoke { base, args, .. } => base.iter_mut().chain(args.iter_mut()).collect(),
        }
    }

    pub fn operand_box(&self, index: usize) -> Result<ValueBox> {
        self.operand_boxes().get(index).copied().ok_or_else(|| {
            Error::MalformedExpression(format!(
                "operand index {index} out of range for {}",
                self.kind_name()
            ))
        })
    }

    pub fn operand_count(&self) -> usize {
        self.operand_boxes().len()
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Binary { .. } => "binary expression",
            Expr::Unary { .. } => "unary expression",
            Expr::Cast { .. } => "cast expression",
            Expr::InstanceOf { .. } => "instanceof expression",
            Expr::New { .. } => "new expression",
            Expr::NewArray { .. } => "newarray expression",
            Expr::NewMultiArray { .. } => "newmultiarray expression",
            Expr::Invoke { .. } => "invoke expression",
        }
    }
}

/// Expression constructors. Each operand gets a fresh box in this arena.
impl ValueArena {
    /// `left op right`.
    pub fn binary(
        &mut self,
        op: BinaryOp,
        left: impl Into<Value>,
        right: impl Into<Value>,
    ) -> Expr {
        Expr::Binary {
            op,
            left: self.new_box(left),
            right: self.new_box(right),
        }
    }

    /// `op operand`, such as `neg x` or `lengthof a`.
    pub fn unary(&mut self, op: UnaryOp, operand: impl Into<Value>) -> Expr {
        Expr::Unary {
            op,
            operand: self.new_box(operand),
        }
    }

    /// `(cast_type) operand`. Fails for void, unknown and null targets.
    pub fn cast(&mut self, operand: impl Into<Value>, cast_type: Type) -> Result<Expr> {
        if matches!(cast_type, Type::Void | Type::Unknown | Type::Null(_)) {
            return Err(Error::MalformedExpression(format!(
                "cannot cast to {cast_type}"
            )));
        }
        Ok(Expr::Cast {
            operand: self.new_box(operand),
            cast_type,
        })
    }

    /// `operand instanceof check_type`; the checked type must be a reference type.
    pub fn instance_of(&mut self, operand: impl Into<Value>, check_type: Type) -> Result<Expr> {
        if !matches!(check_type, Type::Class(_) | Type::Array(_)) {
            return Err(Error::MalformedExpression(format!(
                "instanceof needs a reference type, got {check_type}"
            )));
        }
        Ok(Expr::InstanceOf {
            operand: self.new_box(operand),
            check_type,
        })
    }

    /// `new class_type`, without operands.
    pub fn new_object(&mut self, class_type: ClassType) -> Expr {
        Expr::New { class_type }
    }

    /// One-dimensional `newarray (base_type)[size]`.
    pub fn new_array(&mut self, base_type: Type, size: impl Into<Value>) -> Result<Expr> {
        if matches!(base_type, Type::Void | Type::Unknown | Type::Null(_)) {
            return Err(Error::MalformedExpression(format!(
                "cannot allocate an array of {base_type}"
            )));
        }
        Ok(Expr::NewArray {
            base_type,
            size: self.new_box(size),
        })
    }

    /// `newmultiarray` with sizes for the leading dimensions; the remaining
    /// dimensions stay unsized.
    pub fn new_multi_array(&mut self, array_type: ArrayType, sizes: Vec<Value>) -> Result<Expr> {
        if sizes.len() > array_type.dimensions() as usize {
            return Err(Error::MalformedExpression(format!(
                "{} sizes given for {}-dimensional array type {array_type}",
                sizes.len(),
                array_type.dimensions()
            )));
        }
        let sizes = sizes.into_iter().map(|size| self.new_box(size)).collect();
        Ok(Expr::NewMultiArray { array_type, sizes })
    }

    /// Method call. `base` must be present exactly when `kind` dispatches on a
    /// receiver, and `args` must match the method's parameter count.
    pub fn invoke(
        &mut self,
        kind: InvokeKind,
        method: MethodRef,
        base: Option<Value>,
        args: Vec<Value>,
    ) -> Result<Expr> {
        if kind.has_base() != base.is_some() {
            return Err(Error::MalformedExpression(format!(
                "{kind} of {method} {} a base",
                if kind.has_base() { "requires" } else { "must not have" }
            )));
        }
        if args.len() != method.parameter_types.len() {
            return Err(Error::MalformedExpression(format!(
                "{method} takes {} arguments, {} given",
                method.parameter_types.len(),
                args.len()
            )));
        }
        let base = base.map(|value| self.new_box(value));
        let args = args.into_iter().map(|arg| self.new_box(arg)).collect();
        Ok(Expr::Invoke {
            kind,
            method,
            base,
            args,
        })
    }

    /// Replaces operand `index` of `expr` in place and returns the previous
    /// value. The operand box and the expression keep their identity.
    pub fn set_operand(
        &mut self,
        expr: &Expr,
        index: usize,
        value: impl Into<Value>,
    ) -> Result<Value> {
        let slot = expr.operand_box(index)?;
        self.set_value(slot, value)
    }
}
