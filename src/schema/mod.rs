use crate::tracer::{Observations, TypeTag, VariableObservation};
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;

#[cfg(test)]
mod tests;

/// Element type of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Primitive {
    Int,
    Double,
}

impl Primitive {
    pub fn c_type(self) -> &'static str {
        match self {
            Primitive::Int => "int",
            Primitive::Double => "double",
        }
    }
}

/// The single classification a variable gets in the generated program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VarType {
    Integer,
    Float,
    Text,
    Sequence(Primitive),
}

impl VarType {
    /// Resolves one variable's observations. Float beats everything, a
    /// sequence beats scalars, text beats integers.
    pub fn from_observation(observation: &VariableObservation) -> VarType {
        if observation.saw(TypeTag::Float) {
            VarType::Float
        } else if observation.saw(TypeTag::List) {
            let element = if observation.element_types.contains(&TypeTag::Float) {
                Primitive::Double
            } else {
                Primitive::Int
            };
            VarType::Sequence(element)
        } else if observation.saw(TypeTag::Str) {
            VarType::Text
        } else {
            VarType::Integer
        }
    }

    /// C type used to declare a scalar of this classification.
    pub fn c_scalar_type(self) -> &'static str {
        match self {
            VarType::Integer => "int",
            VarType::Float => "double",
            VarType::Text => "const char *",
            VarType::Sequence(_) => "List",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaEntry {
    pub var_type: VarType,
    pub max_len: Option<usize>,
    /// Last numeric value the name held.
    pub last_value: Option<f64>,
}

/// Resolved name to type mapping, built once from a trace.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TypeSchema {
    entries: BTreeMap<String, SchemaEntry>,
}

impl TypeSchema {
    pub fn from_observations(observations: &Observations) -> TypeSchema {
        let entries: BTreeMap<String, SchemaEntry> = observations
            .variables
            .iter()
            .map(|(name, observation)| {
                let entry = SchemaEntry {
                    var_type: VarType::from_observation(observation),
                    max_len: observation.max_len,
                    last_value: observation.last_scalar,
                };
                debug!("schema: {} -> {:?}", name, entry.var_type);
                (name.clone(), entry)
            })
            .collect();
        TypeSchema { entries }
    }

    /// Type of `name`; names the trace never saw are integers.
    pub fn resolve(&self, name: &str) -> VarType {
        self.entries
            .get(name)
            .map_or(VarType::Integer, |entry| entry.var_type)
    }

    /// Largest length observed for a sequence-valued name.
    pub fn capacity_hint(&self, name: &str) -> Option<usize> {
        self.entries.get(name).and_then(|entry| entry.max_len)
    }

    /// Last numeric value seen for `name`, if it ever held a number.
    pub fn last_value(&self, name: &str) -> Option<f64> {
        self.entries.get(name).and_then(|entry| entry.last_value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
