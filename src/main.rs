use clap::Parser;
use std::path::PathBuf;
use tracec::cli::{self, PipelineArgs};

#[derive(Parser)]
#[command(name = "tracec")]
#[command(about = "Translate a Python function to C using the types observed in a sample run")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Sample a function and write the equivalent C program
    #[command(alias = "t")]
    Transpile {
        /// Input Python file
        input: PathBuf,

        /// Output C file name (optional)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the resolved type schema as JSON
        #[arg(long)]
        schema: bool,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Transpile and compile the result with gcc
    #[command(alias = "b")]
    Build {
        /// Input Python file
        input: PathBuf,

        /// Output executable name (optional)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Dump the observations and resolved schema of a sample run
    Trace {
        /// Input Python file
        input: PathBuf,

        /// Output JSON file name (optional)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Generate lexer tokens from a Python file
    #[command(alias = "l")]
    Lex {
        /// Input file to generate tokens from
        input: PathBuf,

        /// Output JSON file name (optional)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate AST JSON from a Python file
    #[command(alias = "ast")]
    GenAst {
        /// Input file to generate AST from
        input: PathBuf,

        /// Output JSON file name (optional)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    if cfg!(debug_assertions) {
        colog::default_builder()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        colog::default_builder().init();
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Transpile { input, output, schema, pipeline } => {
            cli::transpile(input, output, &pipeline, schema)?;
        }
        Commands::Build { input, output, pipeline } => {
            cli::build(input, output, &pipeline)?;
        }
        Commands::Trace { input, output, pipeline } => {
            cli::trace(input, output, &pipeline)?;
        }
        Commands::Lex { input, output } => {
            cli::lex(input, output)?;
        }
        Commands::GenAst { input, output } => {
            cli::gen_ast(input, output)?;
        }
    }

    Ok(())
}
