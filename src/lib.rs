//! Trace-driven translation of a Python function to C.
//!
//! The function is run once by a sampling interpreter, the types its locals
//! took on are resolved into a [`schema::TypeSchema`], and the body is then
//! emitted as a C `main` under that schema.

pub mod ast;
pub mod c_codegen;
pub mod cli;
pub mod diagnostics;
pub mod execution_engine;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod schema;
pub mod tracer;

pub use execution_engine::{transpile, ExecutionEngine, ExecutionError, TranspileOptions, Transpilation};
