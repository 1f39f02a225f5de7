use crate::ast::{FunctionDef, Module, Statement};
use crate::c_codegen::{CCodeGenError, CCodeGenerator, FallbackPolicy, Features};
use crate::lexer::tokenize;
use crate::parser::parse;
use crate::schema::TypeSchema;
use crate::tracer::{trace, Observations, SampledFunction, Traceable};
use log::{debug, info};
use serde::Serialize;
use std::path::Path;
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Lexer error: {0}")]
    LexerError(#[from] crate::lexer::LexerError),
    #[error("Parser error: {0}")]
    ParserError(#[from] crate::parser::ParseError),
    #[error("Function '{name}' not found")]
    FunctionNotFound { name: String, available: Vec<String> },
    #[error("Function '{name}' takes {count} parameter(s); only zero-argument functions can be sampled")]
    FunctionTakesArguments { name: String, count: usize, line: usize },
    #[error("C CodeGen error: {0}")]
    CCodeGenError(#[from] CCodeGenError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("C compilation failed: {message}")]
    CompilationFailed { message: String },
}

/// Knobs for one transpilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranspileOptions {
    /// Name of the top-level function to sample and translate.
    pub function: String,
    pub policy: FallbackPolicy,
    /// Statement budget for the sampled run; `None` is unbounded.
    pub step_limit: Option<u64>,
}

impl Default for TranspileOptions {
    fn default() -> Self {
        TranspileOptions {
            function: "main".to_string(),
            policy: FallbackPolicy::Placeholder,
            step_limit: None,
        }
    }
}

/// Everything one run of the pipeline produced.
#[derive(Debug, Clone, Serialize)]
pub struct Transpilation {
    pub c_code: String,
    pub features: Features,
    pub observations: Observations,
    pub schema: TypeSchema,
}

/// Traces `target`, resolves its schema and translates `body` under it.
pub fn transpile(
    target: &dyn Traceable,
    body: &[Statement],
    policy: FallbackPolicy,
) -> Result<Transpilation, CCodeGenError> {
    let observations = trace(target);
    let schema = TypeSchema::from_observations(&observations);
    debug!("resolved schema for {} names", schema.len());
    let program = CCodeGenerator::new(&schema)
        .with_policy(policy)
        .generate_program(body)?;
    Ok(Transpilation {
        c_code: program.code,
        features: program.features,
        observations,
        schema,
    })
}

#[derive(Default)]
pub struct ExecutionEngine {
    options: TranspileOptions,
}

impl ExecutionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: TranspileOptions) -> Self {
        ExecutionEngine { options }
    }

    pub fn options(&self) -> &TranspileOptions {
        &self.options
    }

    /// Lex and parse `source`.
    pub fn parse_source(&self, source: &str) -> Result<Module, ExecutionError> {
        let tokens = tokenize(source)?;
        Ok(parse(&tokens)?)
    }

    /// Finds the function to sample and checks that it can be called bare.
    pub fn designated_function<'m>(&self, module: &'m Module) -> Result<&'m FunctionDef, ExecutionError> {
        let name = &self.options.function;
        let function = module.function(name).ok_or_else(|| ExecutionError::FunctionNotFound {
            name: name.clone(),
            available: module.function_names().into_iter().map(String::from).collect(),
        })?;
        if !function.parameters.is_empty() {
            return Err(ExecutionError::FunctionTakesArguments {
                name: name.clone(),
                count: function.parameters.len(),
                line: function.line,
            });
        }
        Ok(function)
    }

    /// Translate Python source to a C program.
    pub fn transpile_source(&self, source: &str) -> Result<Transpilation, ExecutionError> {
        let module = self.parse_source(source)?;
        self.transpile_module(&module)
    }

    pub fn transpile_module(&self, module: &Module) -> Result<Transpilation, ExecutionError> {
        let function = self.designated_function(module)?;
        info!("transpiling function '{}'", function.name);
        let sampled = SampledFunction::new(function).with_step_limit(self.options.step_limit);
        Ok(transpile(&sampled, &function.body, self.options.policy)?)
    }

    /// Run only the sampling phase and resolve the schema.
    pub fn trace_source(&self, source: &str) -> Result<(Observations, TypeSchema), ExecutionError> {
        let module = self.parse_source(source)?;
        let function = self.designated_function(&module)?;
        let observations =
            trace(&SampledFunction::new(function).with_step_limit(self.options.step_limit));
        let schema = TypeSchema::from_observations(&observations);
        Ok((observations, schema))
    }

    /// Transpile `source` and compile the result with gcc.
    pub fn compile_to_executable(
        &self,
        source: &str,
        module_name: &str,
        output_path: &Path,
    ) -> Result<Transpilation, ExecutionError> {
        let transpilation = self.transpile_source(source)?;

        let temp_dir = std::env::temp_dir();
        let c_file = temp_dir.join(format!("{}.c", module_name));
        std::fs::write(&c_file, &transpilation.c_code)?;
        debug!("wrote intermediate C to {}", c_file.display());

        let gcc_output = Command::new("gcc")
            .arg("-o")
            .arg(output_path)
            .arg(&c_file)
            .arg("-lm")
            .output()
            .map_err(|e| ExecutionError::CompilationFailed {
                message: format!("could not run gcc: {}", e),
            })?;

        let _ = std::fs::remove_file(&c_file);
        if !gcc_output.status.success() {
            let stderr = String::from_utf8_lossy(&gcc_output.stderr);
            return Err(ExecutionError::CompilationFailed {
                message: stderr.into_owned(),
            });
        }
        Ok(transpilation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transpile_source() {
        let engine = ExecutionEngine::new();
        let source = "def main():\n    x = 5\n    print(x)\n";

        let result = engine.transpile_source(source).unwrap();
        assert!(result.c_code.contains("int x = 5;"));
        assert!(result.observations.is_complete());
    }

    #[test]
    fn test_missing_function_lists_candidates() {
        let engine = ExecutionEngine::with_options(TranspileOptions {
            function: "mian".to_string(),
            ..TranspileOptions::default()
        });

        match engine.transpile_source("def main():\n    pass\n") {
            Err(ExecutionError::FunctionNotFound { name, available }) => {
                assert_eq!(name, "mian");
                assert_eq!(available, vec!["main".to_string()]);
            }
            other => panic!("Expected FunctionNotFound, got {:?}", other.map(|t| t.c_code)),
        }
    }

    #[test]
    fn test_function_with_parameters_is_rejected() {
        let engine = ExecutionEngine::new();
        let result = engine.transpile_source("def main(a):\n    pass\n");
        assert!(matches!(
            result,
            Err(ExecutionError::FunctionTakesArguments { count: 1, line: 1, .. })
        ));
    }

    #[test]
    fn test_step_limit_keeps_partial_schema() {
        let engine = ExecutionEngine::with_options(TranspileOptions {
            step_limit: Some(10),
            ..TranspileOptions::default()
        });
        let source = "def main():\n    n = 0\n    while n >= 0:\n        n += 1\n";

        let result = engine.transpile_source(source).unwrap();
        assert!(!result.observations.is_complete());
        assert!(result.c_code.contains("while ((n >= 0)) {"));
    }
}
