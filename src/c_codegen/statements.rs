use super::expressions::binop;
use super::{CCodeGenError, CCodeGenerator, DEFAULT_CAPACITY};
use crate::ast::{BinaryOperator, Expr, Literal, Statement};
use crate::schema::{Primitive, VarType};
use log::{debug, warn};
use std::collections::HashSet;

impl<'s> CCodeGenerator<'s> {
    pub(super) fn emit_stmt(&mut self, stmt: &Statement) -> Result<(), CCodeGenError> {
        match stmt {
            Statement::Assign { target, value } => self.emit_assign(target, value)?,
            Statement::AugAssign { target, operator, value } => {
                self.emit_aug_assign(target, operator, value)?
            }
            Statement::If { test, body, orelse } => self.emit_if(test, body, orelse, "")?,
            Statement::For { target, iter, body } => self.emit_for(target, iter, body)?,
            Statement::While { test, body } => {
                let cond = self.emit_expr(test)?;
                self.line(&format!("while ({cond}) {{"));
                self.emit_block(body)?;
                self.line("}");
            }
            Statement::Break => self.line("break;"),
            Statement::Continue => self.line("continue;"),
            Statement::Pass => {}
            // The value is dropped; main always exits with status 0.
            Statement::Return { .. } => self.line("return 0;"),
            Statement::Expression(e) => self.emit_expression_stmt(e)?,
        }
        Ok(())
    }

    /// Declares up front every name whose first binding sits inside a nested
    /// block, and every loop counter read after its loop, so the C
    /// declaration is visible wherever Python can see it.
    pub(super) fn emit_hoisted_declarations(&mut self, body: &[Statement]) -> Result<(), CCodeGenError> {
        let mut read_after_loop = HashSet::new();
        loop_targets_read_outside(body, &mut Vec::new(), &mut read_after_loop);
        let mut seen = HashSet::new();
        let mut nested = Vec::new();
        collect_nested_bindings(body, 0, &read_after_loop, &mut seen, &mut nested);

        for (name, value) in nested {
            debug!("hoisting declaration of '{name}'");
            match value.and_then(|value| self.sequence_element(name, value)) {
                Some(element) => {
                    let literal_len = match value {
                        Some(Expr::List { elements }) => elements.len(),
                        _ => 0,
                    };
                    self.declare_sequence(name, element, literal_len);
                }
                None => {
                    let var_type = self.var_type(name);
                    self.declared.insert(name.to_string());
                    self.line(&format!("{};", declaration(var_type, name)));
                }
            }
        }
        Ok(())
    }

    // --------------------------------------------------------------------- //
    // Assignments
    // --------------------------------------------------------------------- //
    fn emit_assign(&mut self, target: &Expr, value: &Expr) -> Result<(), CCodeGenError> {
        match target {
            Expr::Name(name) => self.emit_name_assign(name, value),
            Expr::Subscript { value: seq, index } => match seq.as_ref() {
                Expr::Name(seq) => {
                    let idx = self.emit_expr(index)?;
                    let v = self.emit_expr(value)?;
                    let slot = self.element_ref(seq, &idx);
                    self.line(&format!("{slot} = {v};"));
                    Ok(())
                }
                _ => self.unsupported_stmt("assignment into a computed value"),
            },
            _ => self.unsupported_stmt("assignment target"),
        }
    }

    fn emit_name_assign(&mut self, name: &str, value: &Expr) -> Result<(), CCodeGenError> {
        if self.declared.contains(name) {
            if let (VarType::Sequence(_), Expr::List { elements }) = (self.var_type(name), value) {
                return self.emit_sequence_fill(name, elements);
            }
            let v = self.emit_expr(value)?;
            self.line(&format!("{name} = {v};"));
            return Ok(());
        }

        if let Some(element) = self.sequence_element(name, value) {
            return match value {
                Expr::List { elements } => {
                    self.declare_sequence(name, element, elements.len());
                    self.emit_sequence_fill(name, elements)
                }
                _ => {
                    let capacity = self.declare_sequence(name, element, 0);
                    warn!("initializer of sequence '{name}' is not a list literal; sizing it to {capacity}");
                    self.line(&format!("{name}.size = {capacity};"));
                    Ok(())
                }
            };
        }

        let var_type = self.var_type(name);
        let v = self.emit_expr(value)?;
        self.declared.insert(name.to_string());
        self.line(&format!("{} = {v};", declaration(var_type, name)));
        Ok(())
    }

    fn emit_aug_assign(&mut self, target: &Expr, operator: &BinaryOperator, value: &Expr) -> Result<(), CCodeGenError> {
        let lhs = match target {
            Expr::Name(name) => name.clone(),
            Expr::Subscript { value: seq, index } => match seq.as_ref() {
                Expr::Name(seq) => {
                    let idx = self.emit_expr(index)?;
                    self.element_ref(seq, &idx)
                }
                _ => return self.unsupported_stmt("augmented assignment into a computed value"),
            },
            _ => return self.unsupported_stmt("augmented assignment target"),
        };
        let v = self.emit_expr(value)?;
        let floating = self.infer_type(target) == VarType::Float || self.infer_type(value) == VarType::Float;
        let code = match operator {
            BinaryOperator::Pow => {
                self.features.math = true;
                format!("{lhs} = pow({lhs}, {v});")
            }
            BinaryOperator::Mod if floating => {
                self.features.math = true;
                format!("{lhs} = fmod({lhs}, {v});")
            }
            op => format!("{lhs} {}= {v};", binop(op)),
        };
        self.line(&code);
        Ok(())
    }

    // --------------------------------------------------------------------- //
    // Sequences
    // --------------------------------------------------------------------- //
    /// Element type if binding `value` to `name` makes it a sequence.
    fn sequence_element(&self, name: &str, value: &Expr) -> Option<Primitive> {
        match (self.schema.resolve(name), value) {
            (VarType::Sequence(element), _) => Some(element),
            (_, Expr::List { elements }) => {
                let floating = elements.iter().any(|e| self.infer_type(e) == VarType::Float);
                Some(if floating { Primitive::Double } else { Primitive::Int })
            }
            _ => None,
        }
    }

    /// Emits the `List` declaration and returns the capacity it was given.
    fn declare_sequence(&mut self, name: &str, element: Primitive, literal_len: usize) -> usize {
        self.features.alloc = true;
        self.features.text = true;
        self.declared.insert(name.to_string());
        self.sequences.insert(name.to_string(), element);

        let observed = self.schema.capacity_hint(name).unwrap_or(DEFAULT_CAPACITY);
        let capacity = observed.max(literal_len).max(1);
        let t = element.c_type();
        self.line(&format!("List {name}; list_init(&{name}, sizeof({t}), {capacity});"));
        capacity
    }

    fn emit_sequence_fill(&mut self, name: &str, elements: &[Expr]) -> Result<(), CCodeGenError> {
        if !elements.is_empty() {
            let t = self.element_type(name).c_type();
            let values = elements
                .iter()
                .map(|e| self.emit_expr(e))
                .collect::<Result<Vec<_>, _>>()?;
            self.line(&format!(
                "{{ {t} _tmp[] = {{{}}}; memcpy({name}.data, _tmp, sizeof(_tmp)); }}",
                values.join(", ")
            ));
        }
        self.line(&format!("{name}.size = {};", elements.len()));
        Ok(())
    }

    fn emit_append(&mut self, name: &str, value: &Expr) -> Result<(), CCodeGenError> {
        let v = self.emit_expr(value)?;
        let slot = self.element_ref(name, &format!("{name}.size"));
        self.line(&format!("{slot} = {v};"));
        self.line(&format!("{name}.size++;"));
        Ok(())
    }

    // --------------------------------------------------------------------- //
    // Control flow
    // --------------------------------------------------------------------- //
    fn emit_if(&mut self, test: &Expr, body: &[Statement], orelse: &[Statement], lead: &str) -> Result<(), CCodeGenError> {
        let cond = self.emit_expr(test)?;
        self.line(&format!("{lead}if ({cond}) {{"));
        self.emit_block(body)?;
        match orelse {
            [] => self.line("}"),
            [Statement::If { test, body, orelse }] => return self.emit_if(test, body, orelse, "} else "),
            _ => {
                self.line("} else {");
                self.emit_block(orelse)?;
                self.line("}");
            }
        }
        Ok(())
    }

    fn emit_for(&mut self, target: &str, iter: &Expr, body: &[Statement]) -> Result<(), CCodeGenError> {
        let arguments = match iter {
            Expr::Call { arguments, .. } if iter.call_name() == Some("range") => arguments,
            _ => return self.unsupported_stmt("for loop over a non-range iterable"),
        };
        let bounds = arguments
            .iter()
            .map(|a| self.emit_expr(a))
            .collect::<Result<Vec<_>, _>>()?;
        let (start, end, step) = match bounds.as_slice() {
            [end] => ("0", end, None),
            [start, end] => (start.as_str(), end, None),
            [start, end, step] => (start.as_str(), end, Some(step)),
            _ => return self.unsupported_stmt("range() with this many arguments"),
        };
        // A counter declared outside the loop must end on the last value the
        // loop produced, so the loop runs on a shadow and copies it over.
        let fresh = !self.declared.contains(target);
        let counter = if fresh { target.to_string() } else { format!("_{target}") };
        let (condition, increment) = match step {
            None => (format!("{counter} < {end}"), format!("{counter}++")),
            Some(step) => {
                let condition = match arguments.get(2).and_then(|s| self.step_is_negative(s)) {
                    Some(true) => format!("{counter} > {end}"),
                    Some(false) => format!("{counter} < {end}"),
                    // Direction unknown until the loop runs.
                    None => format!("({step} > 0 ? {counter} < {end} : {counter} > {end})"),
                };
                (condition, format!("{counter} += {step}"))
            }
        };

        self.line(&format!(
            "for (int {counter} = {start}; {condition}; {increment}) {{"
        ));
        self.push();
        if fresh {
            // A header declaration is only in scope for the loop body.
            self.declared.insert(target.to_string());
        } else {
            self.line(&format!("{target} = {counter};"));
        }
        for stmt in body {
            self.emit_stmt(stmt)?;
        }
        if fresh {
            self.declared.remove(target);
        }
        self.pop();
        self.line("}");
        Ok(())
    }

    /// Sign of a `range` step: literals directly, names from the value
    /// they last held in the trace.
    fn step_is_negative(&self, step: &Expr) -> Option<bool> {
        match step {
            Expr::Literal(Literal::Integer(s)) => Some(*s < 0),
            Expr::Name(name) => self.schema.last_value(name).map(|v| v < 0.0),
            _ => None,
        }
    }

    // --------------------------------------------------------------------- //
    // Calls
    // --------------------------------------------------------------------- //
    fn emit_expression_stmt(&mut self, e: &Expr) -> Result<(), CCodeGenError> {
        match e {
            Expr::Call { arguments, .. } if e.call_name() == Some("print") => self.emit_print(arguments),
            Expr::MethodCall { receiver, method, arguments } if method == "append" => {
                match (receiver.as_ref(), arguments.as_slice()) {
                    (Expr::Name(name), [value]) => self.emit_append(name, value),
                    _ => self.unsupported_stmt("append on a computed value"),
                }
            }
            // Docstrings and other bare constants.
            Expr::Literal(_) => Ok(()),
            _ => self.unsupported_stmt("expression statement"),
        }
    }

    fn emit_print(&mut self, arguments: &[Expr]) -> Result<(), CCodeGenError> {
        self.features.io = true;
        if arguments.is_empty() {
            self.line("printf(\"\\n\");");
            return Ok(());
        }
        let mut specs = Vec::with_capacity(arguments.len());
        let mut values = Vec::with_capacity(arguments.len());
        for arg in arguments {
            specs.push(self.print_fmt(arg));
            values.push(self.emit_expr(arg)?);
        }
        self.line(&format!(
            "printf(\"{}\\n\", {});",
            specs.join(" "),
            values.join(", ")
        ));
        Ok(())
    }
}

/// `T name` with pointer types written as `const char *name`.
fn declaration(var_type: VarType, name: &str) -> String {
    let ty = var_type.c_scalar_type();
    if ty.ends_with('*') {
        format!("{ty}{name}")
    } else {
        format!("{ty} {name}")
    }
}

/// First bindings that need a declaration ahead of the body. A `None`
/// initializer marks a loop counter.
fn collect_nested_bindings<'a>(
    body: &'a [Statement],
    depth: usize,
    read_after_loop: &HashSet<&'a str>,
    seen: &mut HashSet<&'a str>,
    nested: &mut Vec<(&'a str, Option<&'a Expr>)>,
) {
    for stmt in body {
        match stmt {
            Statement::Assign { target: Expr::Name(name), value } => {
                if seen.insert(name.as_str()) && depth > 0 {
                    nested.push((name.as_str(), Some(value)));
                }
            }
            Statement::If { body, orelse, .. } => {
                collect_nested_bindings(body, depth + 1, read_after_loop, seen, nested);
                collect_nested_bindings(orelse, depth + 1, read_after_loop, seen, nested);
            }
            Statement::For { target, body, .. } => {
                if seen.insert(target.as_str()) && read_after_loop.contains(target.as_str()) {
                    nested.push((target.as_str(), None));
                }
                collect_nested_bindings(body, depth + 1, read_after_loop, seen, nested);
            }
            Statement::While { body, .. } => {
                collect_nested_bindings(body, depth + 1, read_after_loop, seen, nested)
            }
            Statement::Assign { .. }
            | Statement::AugAssign { .. }
            | Statement::Break
            | Statement::Continue
            | Statement::Pass
            | Statement::Return { .. }
            | Statement::Expression(_) => {}
        }
    }
}

/// Loop counters mentioned anywhere outside a loop that binds them.
fn loop_targets_read_outside<'a>(
    body: &'a [Statement],
    active: &mut Vec<&'a str>,
    out: &mut HashSet<&'a str>,
) {
    for stmt in body {
        match stmt {
            Statement::Assign { target, value } | Statement::AugAssign { target, value, .. } => {
                names_outside(target, active, out);
                names_outside(value, active, out);
            }
            Statement::If { test, body, orelse } => {
                names_outside(test, active, out);
                loop_targets_read_outside(body, active, out);
                loop_targets_read_outside(orelse, active, out);
            }
            Statement::While { test, body } => {
                names_outside(test, active, out);
                loop_targets_read_outside(body, active, out);
            }
            Statement::For { target, iter, body } => {
                names_outside(iter, active, out);
                active.push(target.as_str());
                loop_targets_read_outside(body, active, out);
                active.pop();
            }
            Statement::Return { value: Some(value) } | Statement::Expression(value) => {
                names_outside(value, active, out);
            }
            Statement::Return { value: None } | Statement::Break | Statement::Continue | Statement::Pass => {}
        }
    }
}

fn names_outside<'a>(e: &'a Expr, active: &[&'a str], out: &mut HashSet<&'a str>) {
    match e {
        Expr::Name(name) => {
            if !active.contains(&name.as_str()) {
                out.insert(name.as_str());
            }
        }
        Expr::Literal(_) => {}
        Expr::Binary { left, right, .. } => {
            names_outside(left, active, out);
            names_outside(right, active, out);
        }
        Expr::Unary { operand, .. } => names_outside(operand, active, out),
        Expr::Compare { left, comparators, .. } => {
            names_outside(left, active, out);
            comparators.iter().for_each(|c| names_outside(c, active, out));
        }
        Expr::BoolOp { values, .. } => values.iter().for_each(|v| names_outside(v, active, out)),
        Expr::Subscript { value, index } => {
            names_outside(value, active, out);
            names_outside(index, active, out);
        }
        Expr::Call { callee, arguments } => {
            names_outside(callee, active, out);
            arguments.iter().for_each(|a| names_outside(a, active, out));
        }
        Expr::MethodCall { receiver, arguments, .. } => {
            names_outside(receiver, active, out);
            arguments.iter().for_each(|a| names_outside(a, active, out));
        }
        Expr::List { elements } => elements.iter().for_each(|e| names_outside(e, active, out)),
    }
}
