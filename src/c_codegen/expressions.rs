use super::{escape_c_string, CCodeGenError, CCodeGenerator};
use crate::ast::{BinaryOperator, BoolOperator, Expr, Literal, UnaryOperator};
use crate::schema::{Primitive, VarType};
use log::debug;

impl<'s> CCodeGenerator<'s> {
    pub(super) fn emit_expr(&mut self, e: &Expr) -> Result<String, CCodeGenError> {
        Ok(match e {
            Expr::Name(name) => name.clone(),
            Expr::Literal(l) => self.emit_lit(l)?,
            Expr::Binary { left, operator, right } => {
                let l = self.emit_expr(left)?;
                let r = self.emit_expr(right)?;
                let floating = self.infer_type(left) == VarType::Float
                    || self.infer_type(right) == VarType::Float;
                match operator {
                    BinaryOperator::Pow => {
                        self.features.math = true;
                        format!("pow({l}, {r})")
                    }
                    BinaryOperator::Mod if floating => {
                        self.features.math = true;
                        format!("fmod({l}, {r})")
                    }
                    // True division of two ints still yields a double.
                    BinaryOperator::Div if !floating => format!("((double){l} / {r})"),
                    _ => format!("({l} {} {r})", binop(operator)),
                }
            }
            Expr::Unary { operator, operand } => {
                let inner = self.emit_expr(operand)?;
                format!("({}{})", unop(operator), inner)
            }
            Expr::Compare { left, operators, comparators } => {
                let (Some(operator), Some(right)) = (operators.first(), comparators.first()) else {
                    return self.unsupported_expr("empty comparison");
                };
                if operators.len() > 1 {
                    debug!("chained comparison reduced to its first pair");
                }
                let l = self.emit_expr(left)?;
                let r = self.emit_expr(right)?;
                format!("({l} {operator} {r})")
            }
            Expr::BoolOp { operator, values } => {
                let joiner = match operator {
                    BoolOperator::And => " && ",
                    BoolOperator::Or => " || ",
                };
                let parts = values
                    .iter()
                    .map(|v| self.emit_expr(v))
                    .collect::<Result<Vec<_>, _>>()?;
                format!("({})", parts.join(joiner))
            }
            Expr::Subscript { value, index } => match value.as_ref() {
                Expr::Name(name) => {
                    let idx = self.emit_expr(index)?;
                    format!("({})", self.element_ref(name, &idx))
                }
                _ => return self.unsupported_expr("subscript of a computed value"),
            },
            Expr::Call { callee, arguments } => match (callee.as_ref(), arguments.as_slice()) {
                (Expr::Name(f), [arg]) if f == "len" => self.emit_len(arg)?,
                (Expr::Name(f), _) => return self.unsupported_expr(&format!("call to '{f}'")),
                _ => return self.unsupported_expr("call of a computed value"),
            },
            Expr::MethodCall { method, .. } => {
                return self.unsupported_expr(&format!("method call '.{method}()' in an expression"))
            }
            Expr::List { .. } => return self.unsupported_expr("list literal outside an assignment"),
        })
    }

    fn emit_len(&mut self, arg: &Expr) -> Result<String, CCodeGenError> {
        match arg {
            Expr::Name(name) if self.var_type(name) == VarType::Text => {
                self.features.text = true;
                Ok(format!("strlen({name})"))
            }
            Expr::Name(name) => Ok(format!("{name}.size")),
            other => Ok(format!("{}.size", self.emit_expr(other)?)),
        }
    }

    pub(super) fn emit_lit(&mut self, l: &Literal) -> Result<String, CCodeGenError> {
        Ok(match l {
            Literal::Integer(i) => i.to_string(),
            Literal::Float(f) if f.is_finite() => format_float(*f),
            Literal::Float(_) => return self.unsupported_expr("non-finite float literal"),
            Literal::String(s) => {
                self.features.text = true;
                format!("\"{}\"", escape_c_string(s))
            }
            Literal::Boolean(b) => (if *b { "1" } else { "0" }).to_string(),
            Literal::None => return self.unsupported_expr("None"),
        })
    }

    /// C classification of an expression's value, used to pick printf formats.
    pub(super) fn infer_type(&self, e: &Expr) -> VarType {
        match e {
            Expr::Name(name) => self.var_type(name),
            Expr::Literal(Literal::String(_)) => VarType::Text,
            Expr::Literal(Literal::Float(_)) => VarType::Float,
            Expr::Literal(_) => VarType::Integer,
            Expr::Binary { operator: BinaryOperator::Pow | BinaryOperator::Div, .. } => VarType::Float,
            Expr::Binary { left, right, .. } => {
                if self.infer_type(left) == VarType::Float || self.infer_type(right) == VarType::Float {
                    VarType::Float
                } else {
                    VarType::Integer
                }
            }
            Expr::Unary { operator: UnaryOperator::Not, .. } => VarType::Integer,
            Expr::Unary { operand, .. } => self.infer_type(operand),
            Expr::Subscript { value, .. } => match value.as_ref() {
                Expr::Name(name) => match self.element_type(name) {
                    Primitive::Double => VarType::Float,
                    Primitive::Int => VarType::Integer,
                },
                _ => VarType::Integer,
            },
            Expr::Compare { .. }
            | Expr::BoolOp { .. }
            | Expr::Call { .. }
            | Expr::MethodCall { .. }
            | Expr::List { .. } => VarType::Integer,
        }
    }

    pub(super) fn print_fmt(&self, e: &Expr) -> &'static str {
        match self.infer_type(e) {
            VarType::Text => "%s",
            VarType::Float => "%.2f",
            VarType::Integer | VarType::Sequence(_) => "%d",
        }
    }
}

/// Renders a float so that C reads it as a double.
pub(super) fn format_float(f: f64) -> String {
    let text = format!("{:?}", f);
    if text.contains(['.', 'e', 'E']) {
        text
    } else {
        format!("{text}.0")
    }
}

pub(super) fn binop(op: &BinaryOperator) -> &'static str {
    match op {
        BinaryOperator::Add => "+",
        BinaryOperator::Sub => "-",
        BinaryOperator::Mul => "*",
        BinaryOperator::Div | BinaryOperator::FloorDiv => "/",
        BinaryOperator::Mod => "%",
        BinaryOperator::Pow => "**",
    }
}

fn unop(op: &UnaryOperator) -> &'static str {
    match op {
        UnaryOperator::Negate => "-",
        UnaryOperator::Plus => "+",
        UnaryOperator::Not => "!",
    }
}
