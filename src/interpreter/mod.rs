use crate::ast::{
    BinaryOperator, BoolOperator, CompareOperator, Expr, FunctionDef, Literal, Statement,
    UnaryOperator,
};
use crate::tracer::LineHook;
use log::{debug, trace};
use std::cmp::Ordering;
pub use self::environment::Environment;
pub use self::error::InterpreterError;
pub use self::value::Value;

pub mod environment;
pub mod error;
pub mod value;

#[cfg(test)]
mod tests;

/// Tree-walking interpreter that runs one function body and reports the
/// local bindings to a [`LineHook`] before every statement it executes.
pub struct Interpreter<'h> {
    hook: &'h mut dyn LineHook,
    steps: u64,
    step_limit: Option<u64>,
    output: Vec<String>,
}

impl<'h> Interpreter<'h> {
    pub fn new(hook: &'h mut dyn LineHook) -> Self {
        Interpreter {
            hook,
            steps: 0,
            step_limit: None,
            output: Vec::new(),
        }
    }

    pub fn with_step_limit(mut self, limit: Option<u64>) -> Self {
        self.step_limit = limit;
        self
    }

    /// Number of statements executed so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Lines written by `print` during the run.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// Runs the body of `function`. On normal completion, or on `return`,
    /// the hook sees the final bindings once more.
    pub fn execute_function(
        &mut self,
        function: &FunctionDef,
        env: &mut Environment,
    ) -> Result<Value, InterpreterError> {
        debug!("sampling function '{}'", function.name);
        let result = match self.execute_block(&function.body, env) {
            Ok(()) => Value::None,
            Err(InterpreterError::ReturnValue(value)) => value,
            Err(InterpreterError::Break) | Err(InterpreterError::Continue) => {
                return Err(InterpreterError::InvalidOperation {
                    message: "'break' or 'continue' outside loop".to_string(),
                })
            }
            Err(e) => return Err(e),
        };
        self.hook.on_return(&env.variables);
        debug!("function '{}' finished after {} statements", function.name, self.steps);
        Ok(result)
    }

    fn observe(&mut self, env: &Environment) -> Result<(), InterpreterError> {
        if let Some(limit) = self.step_limit {
            if self.steps >= limit {
                return Err(InterpreterError::StepLimitExceeded { limit });
            }
        }
        self.steps += 1;
        self.hook.on_statement(&env.variables);
        Ok(())
    }

    fn execute_block(&mut self, block: &[Statement], env: &mut Environment) -> Result<(), InterpreterError> {
        for stmt in block {
            self.execute_statement(stmt, env)?;
        }
        Ok(())
    }

    /// Runs one loop iteration; `Ok(false)` means the loop was broken out of.
    fn execute_loop_body(&mut self, body: &[Statement], env: &mut Environment) -> Result<bool, InterpreterError> {
        match self.execute_block(body, env) {
            Ok(()) | Err(InterpreterError::Continue) => Ok(true),
            Err(InterpreterError::Break) => Ok(false),
            Err(other) => Err(other),
        }
    }

    fn execute_statement(&mut self, stmt: &Statement, env: &mut Environment) -> Result<(), InterpreterError> {
        self.observe(env)?;
        match stmt {
            Statement::Assign { target, value } => {
                let val = self.evaluate_expression(value, env)?;
                self.assign(target, val, env)
            }
            Statement::AugAssign { target, operator, value } => {
                let current = self.evaluate_expression(target, env)?;
                let rhs = self.evaluate_expression(value, env)?;
                let val = self.evaluate_binary_op(&current, operator, &rhs)?;
                self.assign(target, val, env)
            }
            Statement::If { test, body, orelse } => {
                if self.evaluate_expression(test, env)?.truthy() {
                    self.execute_block(body, env)
                } else {
                    self.execute_block(orelse, env)
                }
            }
            Statement::While { test, body } => {
                while self.evaluate_expression(test, env)?.truthy() {
                    if !self.execute_loop_body(body, env)? {
                        break;
                    }
                }
                Ok(())
            }
            Statement::For { target, iter, body } => self.execute_for(target, iter, body, env),
            Statement::Break => Err(InterpreterError::Break),
            Statement::Continue => Err(InterpreterError::Continue),
            Statement::Pass => Ok(()),
            Statement::Return { value } => {
                let val = match value {
                    Some(expr) => self.evaluate_expression(expr, env)?,
                    None => Value::None,
                };
                Err(InterpreterError::ReturnValue(val))
            }
            Statement::Expression(expr) => {
                self.evaluate_expression(expr, env)?;
                Ok(())
            }
        }
    }

    fn execute_for(
        &mut self,
        target: &str,
        iter: &Expr,
        body: &[Statement],
        env: &mut Environment,
    ) -> Result<(), InterpreterError> {
        // `range` is stepped lazily so large counts do not materialize a list.
        if let (Some("range"), Expr::Call { arguments, .. }) = (iter.call_name(), iter) {
            let (start, stop, step) = self.range_bounds(arguments, env)?;
            let mut i = start;
            while (step > 0 && i < stop) || (step < 0 && i > stop) {
                env.define_variable(target.to_string(), Value::Integer(i));
                if !self.execute_loop_body(body, env)? {
                    break;
                }
                i = i.checked_add(step).ok_or(InterpreterError::Overflow)?;
            }
            return Ok(());
        }

        let items = match self.evaluate_expression(iter, env)? {
            Value::List(items) => items,
            Value::String(s) => s.chars().map(|c| Value::String(c.to_string())).collect(),
            other => {
                return Err(InterpreterError::TypeMismatch {
                    expected: "iterable".to_string(),
                    actual: other.type_name().to_string(),
                })
            }
        };
        for item in items {
            env.define_variable(target.to_string(), item);
            if !self.execute_loop_body(body, env)? {
                break;
            }
        }
        Ok(())
    }

    fn assign(&mut self, target: &Expr, val: Value, env: &mut Environment) -> Result<(), InterpreterError> {
        match target {
            Expr::Name(name) => {
                trace!("{} = {}", name, val);
                env.define_variable(name.clone(), val);
                Ok(())
            }
            Expr::Subscript { value, index } => {
                let Expr::Name(name) = value.as_ref() else {
                    return Err(InterpreterError::InvalidOperation {
                        message: "assignment to a nested subscript".to_string(),
                    });
                };
                let index = self.evaluate_expression(index, env)?.to_int()?;
                match env.get_variable_mut(name)? {
                    Value::List(items) => {
                        let slot = normalize_index(index, items.len())?;
                        items[slot] = val;
                        Ok(())
                    }
                    other => Err(InterpreterError::TypeMismatch {
                        expected: "list".to_string(),
                        actual: other.type_name().to_string(),
                    }),
                }
            }
            _ => Err(InterpreterError::InvalidOperation {
                message: "invalid assignment target".to_string(),
            }),
        }
    }

    fn range_bounds(&mut self, arguments: &[Expr], env: &mut Environment) -> Result<(i64, i64, i64), InterpreterError> {
        let mut bounds = Vec::with_capacity(arguments.len());
        for arg in arguments {
            bounds.push(self.evaluate_expression(arg, env)?.to_int()?);
        }
        let (start, stop, step) = match bounds.as_slice() {
            [stop] => (0, *stop, 1),
            [start, stop] => (*start, *stop, 1),
            [start, stop, step] => (*start, *stop, *step),
            _ => {
                return Err(InterpreterError::InvalidOperation {
                    message: format!("range expected 1 to 3 arguments, got {}", bounds.len()),
                })
            }
        };
        if step == 0 {
            return Err(InterpreterError::InvalidOperation {
                message: "range() arg 3 must not be zero".to_string(),
            });
        }
        Ok((start, stop, step))
    }

    fn evaluate_expression(&mut self, expr: &Expr, env: &mut Environment) -> Result<Value, InterpreterError> {
        match expr {
            Expr::Name(name) => env.get_variable(name),
            Expr::Literal(literal) => Ok(match literal {
                Literal::Integer(i) => Value::Integer(*i),
                Literal::Float(f) => Value::Float(*f),
                Literal::Boolean(b) => Value::Boolean(*b),
                Literal::String(s) => Value::String(s.clone()),
                Literal::None => Value::None,
            }),
            Expr::Binary { left, operator, right } => {
                let left = self.evaluate_expression(left, env)?;
                let right = self.evaluate_expression(right, env)?;
                self.evaluate_binary_op(&left, operator, &right)
            }
            Expr::Unary { operator, operand } => {
                let operand = self.evaluate_expression(operand, env)?;
                self.evaluate_unary_op(operator, &operand)
            }
            Expr::Compare { left, operators, comparators } => {
                let mut current = self.evaluate_expression(left, env)?;
                for (operator, comparator) in operators.iter().zip(comparators) {
                    let next = self.evaluate_expression(comparator, env)?;
                    if !compare(&current, *operator, &next)? {
                        return Ok(Value::Boolean(false));
                    }
                    current = next;
                }
                Ok(Value::Boolean(true))
            }
            Expr::BoolOp { operator, values } => {
                let mut last = Value::None;
                for value in values {
                    last = self.evaluate_expression(value, env)?;
                    let decided = match operator {
                        BoolOperator::And => !last.truthy(),
                        BoolOperator::Or => last.truthy(),
                    };
                    if decided {
                        break;
                    }
                }
                Ok(last)
            }
            Expr::Subscript { value, index } => {
                let container = self.evaluate_expression(value, env)?;
                let index = self.evaluate_expression(index, env)?.to_int()?;
                match container {
                    Value::List(mut items) => {
                        let slot = normalize_index(index, items.len())?;
                        Ok(items.swap_remove(slot))
                    }
                    Value::String(s) => {
                        let chars: Vec<char> = s.chars().collect();
                        let slot = normalize_index(index, chars.len())?;
                        Ok(Value::String(chars[slot].to_string()))
                    }
                    other => Err(InterpreterError::TypeMismatch {
                        expected: "list or str".to_string(),
                        actual: other.type_name().to_string(),
                    }),
                }
            }
            Expr::Call { callee, arguments } => {
                let Expr::Name(name) = callee.as_ref() else {
                    return Err(InterpreterError::InvalidOperation {
                        message: "call of a non-name value".to_string(),
                    });
                };
                let mut args = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    args.push(self.evaluate_expression(arg, env)?);
                }
                self.call_builtin(name, args)
            }
            Expr::MethodCall { receiver, method, arguments } => {
                let mut args = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    args.push(self.evaluate_expression(arg, env)?);
                }
                let Expr::Name(name) = receiver.as_ref() else {
                    return Err(InterpreterError::InvalidOperation {
                        message: format!("method '{}' on a temporary value", method),
                    });
                };
                call_method(env.get_variable_mut(name)?, method, args)
            }
            Expr::List { elements } => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    items.push(self.evaluate_expression(element, env)?);
                }
                Ok(Value::List(items))
            }
        }
    }

    fn call_builtin(&mut self, name: &str, args: Vec<Value>) -> Result<Value, InterpreterError> {
        match name {
            "print" => {
                let line = args.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(" ");
                self.output.push(line);
                Ok(Value::None)
            }
            "len" => {
                let arg = single_argument(name, args)?;
                match arg.length() {
                    Some(len) => Ok(Value::Integer(len as i64)),
                    None => Err(InterpreterError::TypeMismatch {
                        expected: "sized value".to_string(),
                        actual: arg.type_name().to_string(),
                    }),
                }
            }
            "range" => {
                let bounds = args.iter().map(Value::to_int).collect::<Result<Vec<_>, _>>()?;
                let (start, stop, step) = match bounds.as_slice() {
                    [stop] => (0, *stop, 1),
                    [start, stop] => (*start, *stop, 1),
                    [start, stop, step] if *step != 0 => (*start, *stop, *step),
                    _ => {
                        return Err(InterpreterError::InvalidOperation {
                            message: "invalid range() arguments".to_string(),
                        })
                    }
                };
                let mut items = Vec::new();
                let mut i = start;
                while (step > 0 && i < stop) || (step < 0 && i > stop) {
                    items.push(Value::Integer(i));
                    i = i.checked_add(step).ok_or(InterpreterError::Overflow)?;
                }
                Ok(Value::List(items))
            }
            "abs" => match single_argument(name, args)? {
                Value::Integer(i) => i.checked_abs().map(Value::Integer).ok_or(InterpreterError::Overflow),
                Value::Boolean(b) => Ok(Value::Integer(b as i64)),
                Value::Float(f) => Ok(Value::Float(f.abs())),
                other => Err(InterpreterError::TypeMismatch {
                    expected: "number".to_string(),
                    actual: other.type_name().to_string(),
                }),
            },
            "min" | "max" => {
                let candidates = match args.len() {
                    1 => match args.into_iter().next() {
                        Some(Value::List(items)) => items,
                        Some(other) => {
                            return Err(InterpreterError::TypeMismatch {
                                expected: "list".to_string(),
                                actual: other.type_name().to_string(),
                            })
                        }
                        None => Vec::new(),
                    },
                    _ => args,
                };
                let wanted = if name == "min" { Ordering::Less } else { Ordering::Greater };
                let mut best: Option<Value> = None;
                for candidate in candidates {
                    best = match best {
                        Some(current) if order(&candidate, &current)? != wanted => Some(current),
                        _ => Some(candidate),
                    };
                }
                best.ok_or_else(|| InterpreterError::InvalidOperation {
                    message: format!("{}() arg is an empty sequence", name),
                })
            }
            "int" => match single_argument(name, args)? {
                Value::Float(f) if f.is_finite() => Ok(Value::Integer(f.trunc() as i64)),
                Value::String(s) => s.trim().parse::<i64>().map(Value::Integer).map_err(|_| {
                    InterpreterError::InvalidOperation {
                        message: format!("invalid literal for int(): '{}'", s),
                    }
                }),
                other => other.to_int().map(Value::Integer),
            },
            "float" => match single_argument(name, args)? {
                Value::String(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
                    InterpreterError::InvalidOperation {
                        message: format!("could not convert string to float: '{}'", s),
                    }
                }),
                other => other.to_float().map(Value::Float),
            },
            "str" => Ok(Value::String(single_argument(name, args)?.to_string())),
            _ => Err(InterpreterError::FunctionNotFound { name: name.to_string() }),
        }
    }

    fn evaluate_binary_op(&self, left: &Value, op: &BinaryOperator, right: &Value) -> Result<Value, InterpreterError> {
        match (left, right) {
            (Value::String(a), Value::String(b)) if *op == BinaryOperator::Add => {
                return Ok(Value::String(format!("{}{}", a, b)))
            }
            (Value::List(a), Value::List(b)) if *op == BinaryOperator::Add => {
                return Ok(Value::List(a.iter().chain(b).cloned().collect()))
            }
            (Value::String(s), n) | (n, Value::String(s)) if *op == BinaryOperator::Mul && n.is_numeric() => {
                return Ok(Value::String(s.repeat(repeat_count(n)?)))
            }
            (Value::List(items), n) | (n, Value::List(items)) if *op == BinaryOperator::Mul && n.is_numeric() => {
                let count = repeat_count(n)?;
                let mut repeated = Vec::with_capacity(items.len() * count);
                for _ in 0..count {
                    repeated.extend(items.iter().cloned());
                }
                return Ok(Value::List(repeated));
            }
            _ => {}
        }

        if !left.is_numeric() || !right.is_numeric() {
            return Err(InterpreterError::TypeMismatch {
                expected: "numeric".to_string(),
                actual: format!("{} and {}", left.type_name(), right.type_name()),
            });
        }

        if matches!(left, Value::Float(_)) || matches!(right, Value::Float(_)) {
            return float_op(left.to_float()?, op, right.to_float()?);
        }

        let (a, b) = (left.to_int()?, right.to_int()?);
        match op {
            BinaryOperator::Add => a.checked_add(b).map(Value::Integer).ok_or(InterpreterError::Overflow),
            BinaryOperator::Sub => a.checked_sub(b).map(Value::Integer).ok_or(InterpreterError::Overflow),
            BinaryOperator::Mul => a.checked_mul(b).map(Value::Integer).ok_or(InterpreterError::Overflow),
            BinaryOperator::Div => {
                if b == 0 {
                    return Err(InterpreterError::DivisionByZero);
                }
                Ok(Value::Float(a as f64 / b as f64))
            }
            BinaryOperator::FloorDiv => {
                if b == 0 {
                    return Err(InterpreterError::DivisionByZero);
                }
                let quotient = a.checked_div(b).ok_or(InterpreterError::Overflow)?;
                let adjust = a % b != 0 && ((a < 0) != (b < 0));
                Ok(Value::Integer(if adjust { quotient - 1 } else { quotient }))
            }
            BinaryOperator::Mod => {
                if b == 0 {
                    return Err(InterpreterError::DivisionByZero);
                }
                let remainder = a.checked_rem(b).ok_or(InterpreterError::Overflow)?;
                let adjust = remainder != 0 && ((remainder < 0) != (b < 0));
                Ok(Value::Integer(if adjust { remainder + b } else { remainder }))
            }
            BinaryOperator::Pow => {
                if b < 0 {
                    return Ok(Value::Float((a as f64).powf(b as f64)));
                }
                let exponent = u32::try_from(b).map_err(|_| InterpreterError::Overflow)?;
                a.checked_pow(exponent).map(Value::Integer).ok_or(InterpreterError::Overflow)
            }
        }
    }

    fn evaluate_unary_op(&self, op: &UnaryOperator, operand: &Value) -> Result<Value, InterpreterError> {
        match op {
            UnaryOperator::Not => Ok(Value::Boolean(!operand.truthy())),
            UnaryOperator::Negate => match operand {
                Value::Float(f) => Ok(Value::Float(-f)),
                other => other
                    .to_int()?
                    .checked_neg()
                    .map(Value::Integer)
                    .ok_or(InterpreterError::Overflow),
            },
            UnaryOperator::Plus => match operand {
                Value::Float(f) => Ok(Value::Float(*f)),
                other => Ok(Value::Integer(other.to_int()?)),
            },
        }
    }
}

fn float_op(a: f64, op: &BinaryOperator, b: f64) -> Result<Value, InterpreterError> {
    let result = match op {
        BinaryOperator::Add => a + b,
        BinaryOperator::Sub => a - b,
        BinaryOperator::Mul => a * b,
        BinaryOperator::Div | BinaryOperator::FloorDiv | BinaryOperator::Mod if b == 0.0 => {
            return Err(InterpreterError::DivisionByZero)
        }
        BinaryOperator::Div => a / b,
        BinaryOperator::FloorDiv => (a / b).floor(),
        BinaryOperator::Mod => a - b * (a / b).floor(),
        BinaryOperator::Pow => a.powf(b),
    };
    Ok(Value::Float(result))
}

fn call_method(receiver: &mut Value, method: &str, args: Vec<Value>) -> Result<Value, InterpreterError> {
    match (receiver, method) {
        (Value::List(items), "append") => {
            items.push(single_argument(method, args)?);
            Ok(Value::None)
        }
        (Value::List(items), "pop") => {
            let index = match args.as_slice() {
                [] => -1,
                [index] => index.to_int()?,
                _ => {
                    return Err(InterpreterError::InvalidOperation {
                        message: "pop expected at most 1 argument".to_string(),
                    })
                }
            };
            let slot = normalize_index(index, items.len())?;
            Ok(items.remove(slot))
        }
        (receiver, _) => Err(InterpreterError::InvalidOperation {
            message: format!("'{}' object has no method '{}'", receiver.type_name(), method),
        }),
    }
}

fn single_argument(name: &str, args: Vec<Value>) -> Result<Value, InterpreterError> {
    let count = args.len();
    let mut args = args.into_iter();
    match (args.next(), args.next()) {
        (Some(arg), None) => Ok(arg),
        _ => Err(InterpreterError::InvalidOperation {
            message: format!("{}() takes exactly one argument ({} given)", name, count),
        }),
    }
}

fn repeat_count(n: &Value) -> Result<usize, InterpreterError> {
    match n {
        Value::Float(_) => Err(InterpreterError::TypeMismatch {
            expected: "int".to_string(),
            actual: "float".to_string(),
        }),
        other => Ok(other.to_int()?.max(0) as usize),
    }
}

/// Maps a possibly negative index onto `0..len`.
fn normalize_index(index: i64, len: usize) -> Result<usize, InterpreterError> {
    let resolved = if index < 0 { index + len as i64 } else { index };
    if resolved < 0 || resolved >= len as i64 {
        return Err(InterpreterError::IndexOutOfBounds { index, length: len });
    }
    Ok(resolved as usize)
}

fn order(left: &Value, right: &Value) -> Result<Ordering, InterpreterError> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
        (a, b) if a.is_numeric() && b.is_numeric() => {
            if let (Ok(x), Ok(y)) = (a.to_int(), b.to_int()) {
                return Ok(x.cmp(&y));
            }
            let (x, y) = (a.to_float()?, b.to_float()?);
            x.partial_cmp(&y).ok_or_else(|| InterpreterError::InvalidOperation {
                message: "comparison with nan".to_string(),
            })
        }
        (Value::List(a), Value::List(b)) => {
            for (x, y) in a.iter().zip(b) {
                let ordering = order(x, y)?;
                if ordering != Ordering::Equal {
                    return Ok(ordering);
                }
            }
            Ok(a.len().cmp(&b.len()))
        }
        _ => Err(InterpreterError::TypeMismatch {
            expected: "comparable values".to_string(),
            actual: format!("{} and {}", left.type_name(), right.type_name()),
        }),
    }
}

fn equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (a, b) if a.is_numeric() && b.is_numeric() => matches!(order(a, b), Ok(Ordering::Equal)),
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| equals(x, y))
        }
        _ => left == right,
    }
}

fn compare(left: &Value, op: CompareOperator, right: &Value) -> Result<bool, InterpreterError> {
    Ok(match op {
        CompareOperator::Equal => equals(left, right),
        CompareOperator::NotEqual => !equals(left, right),
        CompareOperator::Less => order(left, right)? == Ordering::Less,
        CompareOperator::LessEqual => order(left, right)? != Ordering::Greater,
        CompareOperator::Greater => order(left, right)? == Ordering::Greater,
        CompareOperator::GreaterEqual => order(left, right)? != Ordering::Less,
    })
}
