// src/c_codegen/mod.rs
use crate::ast::Statement;
use crate::schema::{Primitive, TypeSchema, VarType};
use log::{debug, warn};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt::Write;
use thiserror::Error;

mod expressions;
mod statements;


/// Capacity given to a sequence the trace never saw.
pub const DEFAULT_CAPACITY: usize = 8;

const LIST_TYPEDEF: &str = "typedef struct { void *data; int size; int cap; } List;";
const LIST_INIT: &str =
    "void list_init(List *l, int sz, int cap) { l->size = 0; l->cap = cap; l->data = malloc(sz * l->cap); }";

#[derive(Error, Debug)]
pub enum CCodeGenError {
    #[error("Unsupported: {0}")]
    Unsupported(String),
    #[error("Fmt error")]
    Fmt(#[from] std::fmt::Error),
}

/// What to do with a construct that has no C translation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum FallbackPolicy {
    /// Emit `0` for expressions and nothing for statements.
    #[default]
    Placeholder,
    /// Fail with [`CCodeGenError::Unsupported`].
    Reject,
}

/// Support facilities the emitted body relies on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Features {
    pub io: bool,
    pub alloc: bool,
    pub text: bool,
    pub math: bool,
}

#[derive(Debug, Clone)]
pub struct GeneratedProgram {
    pub code: String,
    pub features: Features,
}

pub struct CCodeGenerator<'s> {
    schema: &'s TypeSchema,
    policy: FallbackPolicy,
    buf: String,
    indent: usize,
    declared: HashSet<String>,
    sequences: HashMap<String, Primitive>,
    features: Features,
}

impl<'s> CCodeGenerator<'s> {
    pub fn new(schema: &'s TypeSchema) -> Self {
        Self {
            schema,
            policy: FallbackPolicy::default(),
            buf: String::new(),
            indent: 1,
            declared: HashSet::new(),
            sequences: HashMap::new(),
            features: Features::default(),
        }
    }

    pub fn with_policy(mut self, policy: FallbackPolicy) -> Self {
        self.policy = policy;
        self
    }

    // --------------------------------------------------------------------- //
    // Public API
    // --------------------------------------------------------------------- //
    pub fn generate_program(mut self, body: &[Statement]) -> Result<GeneratedProgram, CCodeGenError> {
        self.emit_hoisted_declarations(body)?;
        for stmt in body {
            self.emit_stmt(stmt)?;
        }
        debug!(
            "emitted {} declarations, features {:?}",
            self.declared.len(),
            self.features
        );
        let code = self.assemble()?;
        Ok(GeneratedProgram {
            code,
            features: self.features,
        })
    }

    // --------------------------------------------------------------------- //
    // Program assembly
    // --------------------------------------------------------------------- //
    fn assemble(&self) -> Result<String, CCodeGenError> {
        let features = self.features;
        let mut out = String::new();
        let includes = [
            (features.io, "stdio.h"),
            (features.alloc, "stdlib.h"),
            (features.text || features.alloc, "string.h"),
            (features.math, "math.h"),
        ];
        let mut any_include = false;
        for (_, header) in includes.iter().filter(|(needed, _)| *needed) {
            writeln!(out, "#include <{header}>")?;
            any_include = true;
        }
        if any_include {
            out.push('\n');
        }
        if features.alloc {
            writeln!(out, "{LIST_TYPEDEF}")?;
            writeln!(out, "{LIST_INIT}")?;
            out.push('\n');
        }
        writeln!(out, "int main() {{")?;
        out.push_str(&self.buf);
        writeln!(out, "    return 0;")?;
        writeln!(out, "}}")?;
        Ok(out)
    }

    // --------------------------------------------------------------------- //
    // Tiny helpers
    // --------------------------------------------------------------------- //
    fn line(&mut self, s: &str) {
        for _ in 0..self.indent {
            self.buf.push_str("    ");
        }
        self.buf.push_str(s);
        self.buf.push('\n');
    }
    fn push(&mut self) { self.indent += 1; }
    fn pop(&mut self) { self.indent = self.indent.saturating_sub(1); }

    fn emit_block(&mut self, body: &[Statement]) -> Result<(), CCodeGenError> {
        self.push();
        for stmt in body {
            self.emit_stmt(stmt)?;
        }
        self.pop();
        Ok(())
    }

    /// Placeholder for an expression with no translation.
    fn unsupported_expr(&self, what: &str) -> Result<String, CCodeGenError> {
        match self.policy {
            FallbackPolicy::Placeholder => {
                warn!("no C translation for {what}; emitting 0");
                Ok("0".to_string())
            }
            FallbackPolicy::Reject => Err(CCodeGenError::Unsupported(what.to_string())),
        }
    }

    /// Placeholder for a statement with no translation.
    fn unsupported_stmt(&self, what: &str) -> Result<(), CCodeGenError> {
        match self.policy {
            FallbackPolicy::Placeholder => {
                warn!("no C translation for {what}; skipping");
                Ok(())
            }
            FallbackPolicy::Reject => Err(CCodeGenError::Unsupported(what.to_string())),
        }
    }

    // --------------------------------------------------------------------- //
    // Types
    // --------------------------------------------------------------------- //
    fn var_type(&self, name: &str) -> VarType {
        match self.sequences.get(name) {
            Some(element) => VarType::Sequence(*element),
            None => self.schema.resolve(name),
        }
    }

    /// Primitive stored in the sequence `name`.
    fn element_type(&self, name: &str) -> Primitive {
        match self.var_type(name) {
            VarType::Sequence(element) => element,
            VarType::Float => Primitive::Double,
            VarType::Integer | VarType::Text => Primitive::Int,
        }
    }

    /// Lvalue for slot `index` of the sequence `name`.
    fn element_ref(&mut self, name: &str, index: &str) -> String {
        self.features.alloc = true;
        let t = self.element_type(name).c_type();
        format!("*({t}*)((char*){name}.data + ({index}) * sizeof({t}))")
    }
}

/// Escapes `s` for use inside a C string literal.
fn escape_c_string(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            '\0' => escaped.push_str("\\0"),
            c => escaped.push(c),
        }
    }
    escaped
}
