use crate::ast::FunctionDef;
use crate::interpreter::{Environment, Interpreter, InterpreterError, Value};
use log::{debug, trace, warn};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;

#[cfg(test)]
mod tests;

/// Snapshot of a function's local bindings.
pub type Bindings = HashMap<String, Value>;

/// Runtime type of an observed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum TypeTag {
    Int,
    Float,
    Bool,
    Str,
    List,
    NoneType,
}

/// Callback invoked by a running function.
pub trait LineHook {
    /// Called before each executed statement.
    fn on_statement(&mut self, locals: &Bindings);

    /// Called once when the function finishes without a fault.
    fn on_return(&mut self, locals: &Bindings) {
        self.on_statement(locals);
    }
}

#[derive(Error, Debug)]
pub enum TraceFault {
    #[error("step limit of {limit} statements exceeded")]
    StepLimit { limit: u64 },
    #[error("runtime error: {0}")]
    Runtime(InterpreterError),
    #[error("execution aborted: {0}")]
    Aborted(String),
}

impl From<InterpreterError> for TraceFault {
    fn from(error: InterpreterError) -> Self {
        match error {
            InterpreterError::StepLimitExceeded { limit } => TraceFault::StepLimit { limit },
            other => TraceFault::Runtime(other),
        }
    }
}

/// Something that can be run once under a [`LineHook`].
pub trait Traceable {
    fn invoke(&self, hook: &mut dyn LineHook) -> Result<(), TraceFault>;
}

impl<F> Traceable for F
where
    F: Fn(&mut dyn LineHook) -> Result<(), TraceFault>,
{
    fn invoke(&self, hook: &mut dyn LineHook) -> Result<(), TraceFault> {
        self(hook)
    }
}

/// A parsed zero-argument function, run by the sampling interpreter.
pub struct SampledFunction<'a> {
    function: &'a FunctionDef,
    step_limit: Option<u64>,
}

impl<'a> SampledFunction<'a> {
    pub fn new(function: &'a FunctionDef) -> Self {
        SampledFunction {
            function,
            step_limit: None,
        }
    }

    pub fn with_step_limit(mut self, limit: Option<u64>) -> Self {
        self.step_limit = limit;
        self
    }
}

impl Traceable for SampledFunction<'_> {
    fn invoke(&self, hook: &mut dyn LineHook) -> Result<(), TraceFault> {
        let mut interpreter = Interpreter::new(hook).with_step_limit(self.step_limit);
        let mut env = Environment::new();
        interpreter.execute_function(self.function, &mut env)?;
        for line in interpreter.output() {
            trace!("sampled output: {}", line);
        }
        Ok(())
    }
}

/// Everything seen about one name during the sampled run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VariableObservation {
    pub types: BTreeSet<TypeTag>,
    pub element_types: BTreeSet<TypeTag>,
    pub max_len: Option<usize>,
    pub last_scalar: Option<f64>,
}

impl VariableObservation {
    fn record(&mut self, value: &Value) {
        self.types.insert(value.type_tag());
        match value {
            Value::List(items) => {
                self.max_len = Some(self.max_len.map_or(items.len(), |m| m.max(items.len())));
                self.element_types.extend(items.iter().map(Value::type_tag));
            }
            other => {
                if let Some(scalar) = other.scalar() {
                    self.last_scalar = Some(scalar);
                }
            }
        }
    }

    pub fn saw(&self, tag: TypeTag) -> bool {
        self.types.contains(&tag)
    }
}

/// Raw per-variable observations collected from one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Observations {
    pub variables: BTreeMap<String, VariableObservation>,
    pub statements: u64,
    pub fault: Option<String>,
}

impl Observations {
    pub fn get(&self, name: &str) -> Option<&VariableObservation> {
        self.variables.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    pub fn is_complete(&self) -> bool {
        self.fault.is_none()
    }
}

impl LineHook for Observations {
    fn on_statement(&mut self, locals: &Bindings) {
        self.statements += 1;
        for (name, value) in locals {
            self.variables.entry(name.clone()).or_default().record(value);
        }
    }

    fn on_return(&mut self, locals: &Bindings) {
        for (name, value) in locals {
            self.variables.entry(name.clone()).or_default().record(value);
        }
    }
}

/// Runs `target` once and collects what its locals looked like. A fault
/// stops the run but keeps everything observed before it.
pub fn trace(target: &dyn Traceable) -> Observations {
    let mut observations = Observations::default();
    match target.invoke(&mut observations) {
        Ok(()) => debug!(
            "trace finished: {} statements, {} variables",
            observations.statements,
            observations.variables.len()
        ),
        Err(fault) => {
            warn!(
                "sampled run stopped after {} statements: {}; keeping partial observations",
                observations.statements, fault
            );
            observations.fault = Some(fault.to_string());
        }
    }
    observations
}
