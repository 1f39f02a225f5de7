use std::path::{Path, PathBuf};
use crate::c_codegen::FallbackPolicy;
use crate::diagnostics;
use crate::execution_engine::{ExecutionEngine, ExecutionError, TranspileOptions};
use crate::lexer::tokenize;
use crate::parser::parse;
use anyhow::{anyhow, bail};
use log::info;

/// Flags shared by every command that samples a function.
#[derive(clap::Args, Debug, Clone)]
pub struct PipelineArgs {
    /// Top-level function to sample and translate
    #[arg(long, default_value = "main")]
    pub function: String,

    /// Fail on constructs without a C translation instead of emitting placeholders
    #[arg(long)]
    pub strict: bool,

    /// Maximum number of statements executed while sampling
    #[arg(long, default_value_t = 1_000_000)]
    pub step_limit: u64,
}

impl From<&PipelineArgs> for TranspileOptions {
    fn from(args: &PipelineArgs) -> Self {
        TranspileOptions {
            function: args.function.clone(),
            policy: if args.strict { FallbackPolicy::Reject } else { FallbackPolicy::Placeholder },
            step_limit: Some(args.step_limit),
        }
    }
}

/// Validates that the input file has a .py extension.
fn validate_python_file(input: &Path) -> anyhow::Result<()> {
    if input.extension().is_some_and(|ext| ext == "py") {
        Ok(())
    } else {
        bail!("Input file must have a .py extension, but got: {}", input.display());
    }
}

/// Prints the rendered diagnostic and turns the error into a short one.
fn report(input: &Path, source: &str, err: ExecutionError) -> anyhow::Error {
    eprintln!("{}", diagnostics::from_execution_error(input, source, &err));
    anyhow!(err)
}

fn with_extension(input: &Path, extension: &str) -> PathBuf {
    let mut path = input.to_path_buf();
    path.set_extension(extension);
    path
}

pub fn transpile(input: PathBuf, output: Option<PathBuf>, args: &PipelineArgs, dump_schema: bool) -> anyhow::Result<()> {
    validate_python_file(&input)?;
    println!("Transpiling {}...", input.display());

    let source = std::fs::read_to_string(&input)?;
    let engine = ExecutionEngine::with_options(args.into());
    let transpilation = engine
        .transpile_source(&source)
        .map_err(|e| report(&input, &source, e))?;

    let output_path = output.unwrap_or_else(|| with_extension(&input, "c"));
    std::fs::write(&output_path, &transpilation.c_code)?;

    if dump_schema {
        let schema_path = with_extension(&output_path, "schema.json");
        let json = serde_json::to_string_pretty(&transpilation.schema)?;
        std::fs::write(&schema_path, json)?;
        info!("schema written to {}", schema_path.display());
    }

    println!("C code generated successfully: {}", output_path.display());
    Ok(())
}

pub fn build(input: PathBuf, output: Option<PathBuf>, args: &PipelineArgs) -> anyhow::Result<()> {
    validate_python_file(&input)?;
    println!("Building {}...", input.display());

    let source = std::fs::read_to_string(&input)?;
    let engine = ExecutionEngine::with_options(args.into());

    let module_name = input.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("main");

    let output_path = output.unwrap_or_else(|| with_extension(&input, "exe"));

    engine
        .compile_to_executable(&source, module_name, &output_path)
        .map_err(|e| report(&input, &source, e))?;

    println!("Compiled successfully to: {}", output_path.display());
    Ok(())
}

pub fn trace(input: PathBuf, output: Option<PathBuf>, args: &PipelineArgs) -> anyhow::Result<()> {
    validate_python_file(&input)?;
    println!("Tracing {}...", input.display());

    let source = std::fs::read_to_string(&input)?;
    let engine = ExecutionEngine::with_options(args.into());
    let (observations, schema) = engine
        .trace_source(&source)
        .map_err(|e| report(&input, &source, e))?;

    if let Some(fault) = &observations.fault {
        println!("Sampled run stopped early: {}", fault);
    }

    let json = serde_json::to_string_pretty(&serde_json::json!({
        "function": args.function,
        "observations": observations,
        "schema": schema,
    }))?;

    let output_path = output.unwrap_or_else(|| with_extension(&input, "trace.json"));
    std::fs::write(&output_path, json)?;

    println!("Trace generated successfully: {}", output_path.display());
    Ok(())
}

pub fn lex(input: PathBuf, output: Option<PathBuf>) -> anyhow::Result<()> {
    validate_python_file(&input)?;
    println!("Generating lexer tokens for {}...", input.display());

    let source = std::fs::read_to_string(&input)?;
    let tokens = tokenize(&source)?;

    let token_data: Vec<serde_json::Value> = tokens.iter().map(|token| {
        serde_json::json!({
            "type": format!("{:?}", token.token_type),
            "lexeme": token.lexeme,
            "line": token.line
        })
    }).collect();

    let output_path = output.unwrap_or_else(|| with_extension(&input, "lex.json"));
    let json = serde_json::to_string_pretty(&token_data)?;
    std::fs::write(&output_path, json)?;

    println!("Lexer tokens generated successfully: {}", output_path.display());
    Ok(())
}

pub fn gen_ast(input: PathBuf, output: Option<PathBuf>) -> anyhow::Result<()> {
    validate_python_file(&input)?;
    println!("Generating AST for {}...", input.display());

    let source = std::fs::read_to_string(&input)?;
    let tokens = tokenize(&source)?;
    let module = parse(&tokens)?;

    let json = serde_json::to_string_pretty(&module)?;

    let output_path = output.unwrap_or_else(|| with_extension(&input, "ast.json"));
    std::fs::write(&output_path, json)?;

    println!("AST generated successfully: {}", output_path.display());
    Ok(())
}
