//! Typed intermediate representation: values, use boxes and expressions.
//!
//! Expressions refer to their operands through [`ValueBox`] handles into a
//! [`ValueArena`]. A rewrite replaces the content of a slot, so every holder
//! of the handle observes the new value while the handle itself, and the
//! expression that owns it, stay unchanged. The arena is not synchronized;
//! one pass owns it at a time.

mod equiv;
mod expr;
mod local;
mod printer;
mod value;

pub use equiv::EquivKey;
pub use expr::{BinaryOp, Expr, ExprVisitor, InvokeKind, UnaryOp};
pub use local::Local;
pub use printer::{StmtPrinter, TextPrinter};
pub use value::{Constant, Value, ValueArena, ValueBox};
