use crate::ir::expr::Expr;
use crate::ir::local::Local;
use crate::ir::value::{Constant, Value, ValueArena};
use crate::language::quoted_name_of;
use crate::signature::MethodRef;
use crate::types::Type;

/// Output sink for IR rendering. Nodes describe themselves through these
/// calls and never pick an output format.
pub trait StmtPrinter {
    fn literal(&mut self, text: &str);
    fn type_name(&mut self, ty: &Type);
    fn local(&mut self, local: &Local);
    fn constant(&mut self, constant: &Constant);
    fn method_ref(&mut self, method: &MethodRef);
}

/// Renders IR as plain Jimple-like text.
#[derive(Debug, Default)]
pub struct TextPrinter {
    out: String,
    quote_names: bool,
}

impl TextPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Printer that quotes name segments colliding with reserved words.
    pub fn quoting() -> Self {
        Self {
            out: String::new(),
            quote_names: true,
        }
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn name(&self, name: &str) -> String {
        if self.quote_names {
            quoted_name_of(name)
        } else {
            name.to_string()
        }
    }
}

impl StmtPrinter for TextPrinter {
    fn literal(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn type_name(&mut self, ty: &Type) {
        let rendered = match ty {
            Type::Class(class_type) => self.name(&class_type.to_string()),
            Type::Array(array) => {
                let mut rendered = match array.base_type() {
                    Type::Class(class_type) => self.name(&class_type.to_string()),
                    other => other.to_string(),
                };
                for _ in 0..array.dimensions() {
                    rendered.push_str("[]");
                }
                rendered
            }
            other => other.to_string(),
        };
        self.out.push_str(&rendered);
    }

    fn local(&mut self, local: &Local) {
        let name = self.name(local.name());
        self.out.push_str(&name);
    }

    fn constant(&mut self, constant: &Constant) {
        self.out.push_str(&constant.to_string());
    }

    fn method_ref(&mut self, method: &MethodRef) {
        self.literal("<");
        self.type_name(&Type::Class(method.declaring_class.clone()));
        self.literal(": ");
        self.type_name(&method.return_type);
        self.literal(" ");
        let name = self.name(&method.name);
        self.literal(&name);
        self.literal("(");
        for (index, param) in method.parameter_types.iter().enumerate() {
            if index > 0 {
                self.literal(",");
            }
            self.type_name(param);
        }
        self.literal(")>");
    }
}

impl ValueArena {
    pub fn print(&self, value: &Value, printer: &mut dyn StmtPrinter) {
        match value {
            Value::Local(local) => printer.local(local),
            Value::Constant(constant) => printer.constant(constant),
            Value::Expr(expr) => self.print_expr(expr, printer),
        }
    }

    fn print_expr(&self, expr: &Expr, printer: &mut dyn StmtPrinter) {
        match expr {
            Expr::Binary { op, left, right } => {
                self.print(self.value(*left), printer);
                printer.literal(op.symbol());
                self.print(self.value(*right), printer);
            }
            Expr::Unary { op, operand } => {
                printer.literal(op.keyword());
                printer.literal(" ");
                self.print(self.value(*operand), printer);
            }
            Expr::Cast { operand, cast_type } => {
                printer.literal("(");
                printer.type_name(cast_type);
                printer.literal(") ");
                self.print(self.value(*operand), printer);
            }
            Expr::InstanceOf {
                operand,
                check_type,
            } => {
                self.print(self.value(*operand), printer);
                printer.literal(" instanceof ");
                printer.type_name(check_type);
            }
            Expr::New { class_type } => {
                printer.literal("new ");
                printer.type_name(&Type::Class(class_type.clone()));
            }
            Expr::NewArray { base_type, size } => {
                printer.literal("newarray (");
                printer.type_name(base_type);
                printer.literal(")[");
                self.print(self.value(*size), printer);
                printer.literal("]");
            }
            Expr::NewMultiArray { array_type, sizes } => {
                printer.literal("newmultiarray (");
                printer.type_name(array_type.base_type());
                printer.literal(")");
                for size in sizes {
                    printer.literal("[");
                    self.print(self.value(*size), printer);
                    printer.literal("]");
                }
                for _ in sizes.len()..array_type.dimensions() as usize {
                    printer.literal("[]");
                }
            }
            Expr::Invoke {
                kind,
                method,
                base,
                args,
            } => {
                printer.literal(kind.keyword());
                printer.literal(" ");
                if let Some(base) = base {
                    self.print(self.value(*base), printer);
                    printer.literal(".");
                }
                printer.method_ref(method);
                printer.literal("(");
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        printer.literal(", ");
                    }
                    self.print(self.value(*arg), printer);
                }
                printer.literal(")");
            }
        }
    }

    pub fn render(&self, value: &Value) -> String {
        let mut printer = TextPrinter::new();
        self.print(value, &mut printer);
        printer.finish()
    }
}
