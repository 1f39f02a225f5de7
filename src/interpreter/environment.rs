use super::error::InterpreterError;
use super::value::Value;
use crate::tracer::Bindings;

/// Local bindings of the sampled function. The namespace is flat: loop
/// variables and names bound inside branches stay visible afterwards.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    pub variables: Bindings,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define_variable(&mut self, name: String, value: Value) {
        self.variables.insert(name, value);
    }

    pub fn get_variable(&self, name: &str) -> Result<Value, InterpreterError> {
        self.variables
            .get(name)
            .cloned()
            .ok_or_else(|| InterpreterError::VariableNotFound { name: name.to_string() })
    }

    pub fn get_variable_mut(&mut self, name: &str) -> Result<&mut Value, InterpreterError> {
        self.variables
            .get_mut(name)
            .ok_or_else(|| InterpreterError::VariableNotFound { name: name.to_string() })
    }
}
