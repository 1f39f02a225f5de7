use super::error::InterpreterError;
use crate::tracer::TypeTag;
use std::fmt;

/// A runtime value of the sampled function.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    List(Vec<Value>),
    None,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", format_float(*fl)),
            Value::Boolean(true) => write!(f, "True"),
            Value::Boolean(false) => write!(f, "False"),
            Value::String(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match item {
                        Value::String(s) => write!(f, "'{}'", s)?,
                        other => write!(f, "{}", other)?,
                    }
                }
                write!(f, "]")
            }
            Value::None => write!(f, "None"),
        }
    }
}

/// Formats a float the way the sampled program prints it: integral
/// values keep a trailing `.0`.
fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "inf" } else { "-inf" }.to_string()
    } else {
        format!("{}", value)
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "int",
            Value::Float(_) => "float",
            Value::Boolean(_) => "bool",
            Value::String(_) => "str",
            Value::List(_) => "list",
            Value::None => "NoneType",
        }
    }

    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Integer(_) => TypeTag::Int,
            Value::Float(_) => TypeTag::Float,
            Value::Boolean(_) => TypeTag::Bool,
            Value::String(_) => TypeTag::Str,
            Value::List(_) => TypeTag::List,
            Value::None => TypeTag::NoneType,
        }
    }

    /// Length of a sized value, `None` for scalars.
    pub fn length(&self) -> Option<usize> {
        match self {
            Value::List(items) => Some(items.len()),
            Value::String(s) => Some(s.chars().count()),
            _ => None,
        }
    }

    pub fn to_int(&self) -> Result<i64, InterpreterError> {
        match self {
            Value::Integer(i) => Ok(*i),
            Value::Boolean(b) => Ok(if *b { 1 } else { 0 }),
            _ => Err(InterpreterError::TypeMismatch {
                expected: "int".to_string(),
                actual: self.type_name().to_string(),
            }),
        }
    }

    pub fn to_float(&self) -> Result<f64, InterpreterError> {
        match self {
            Value::Integer(i) => Ok(*i as f64),
            Value::Float(f) => Ok(*f),
            Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            _ => Err(InterpreterError::TypeMismatch {
                expected: "float".to_string(),
                actual: self.type_name().to_string(),
            }),
        }
    }

    /// Python truthiness; every value has one.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Boolean(b) => *b,
            Value::String(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::None => false,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_) | Value::Boolean(_))
    }

    /// The numeric magnitude of a scalar, used as a size hint by the tracer.
    pub fn scalar(&self) -> Option<f64> {
        match self {
            Value::Integer(_) | Value::Float(_) => self.to_float().ok(),
            _ => None,
        }
    }
}
