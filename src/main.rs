//! basicc - BASIC to C translator
//!
//! Reads a line-numbered BASIC program and writes the equivalent C file.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};

use basic2c::backend::{
    CCodeGen, CodeGen, CodegenOptions, ResumeStrategy, DEFAULT_RETURN_STACK_CAPACITY,
};
use basic2c::feedback::{CompilationFeedback, ErrorReport};
use basic2c::frontend::lexer::Lexer;
use basic2c::frontend::parser::Parser as BasicParser;
use basic2c::utils::Error;

/// BASIC to C translator
#[derive(Parser, Debug)]
#[command(name = "basicc")]
#[command(version)]
#[command(about = "Translate line-numbered BASIC programs into C")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input source file (.bas)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file (defaults to FILE with a .c extension)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print a JSON report instead of human-readable messages
    #[arg(long, global = true)]
    json: bool,

    /// How RETURN finds its way back to the calling GOSUB
    #[arg(long, value_enum, default_value_t = ResumeArg::CallSite, global = true)]
    resume: ResumeArg,

    /// Capacity of the generated return-address stack
    #[arg(long, value_name = "N", default_value_t = DEFAULT_RETURN_STACK_CAPACITY,
          value_parser = parse_stack_size, global = true)]
    stack_size: usize,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a source file to C
    Build {
        /// Input source file
        input: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check a source file for errors and warnings without writing output
    Check {
        /// Input source file
        input: PathBuf,
    },
    /// Dump the token stream
    Tokens {
        /// Input source file
        input: PathBuf,
    },
    /// Dump the syntax tree as JSON
    Ast {
        /// Input source file
        input: PathBuf,
    },
    /// Print version information
    Version,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ResumeArg {
    /// One resume label per GOSUB call site
    CallSite,
    /// Resume at the GOSUB's line number plus 10
    LineOffset,
}

impl From<ResumeArg> for ResumeStrategy {
    fn from(arg: ResumeArg) -> Self {
        match arg {
            ResumeArg::CallSite => ResumeStrategy::CallSite,
            ResumeArg::LineOffset => ResumeStrategy::LineOffset,
        }
    }
}

fn parse_stack_size(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("stack size must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("error: {:#}", e);
            process::exit(1);
        }
    }
}

fn init_logging(cli: &Cli) {
    let default_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

/// Returns `Ok(false)` when the source had errors that were already reported
fn run(cli: &Cli) -> anyhow::Result<bool> {
    match &cli.command {
        Some(Commands::Build { input, output }) => {
            compile_file(input, output.as_deref(), true, cli)
        }
        Some(Commands::Check { input }) => compile_file(input, None, false, cli),
        Some(Commands::Tokens { input }) => dump_tokens(input, cli),
        Some(Commands::Ast { input }) => dump_ast(input, cli),
        Some(Commands::Version) => {
            println!("basicc {}", env!("CARGO_PKG_VERSION"));
            println!("BASIC to C translator");
            Ok(true)
        }
        None => match &cli.input {
            Some(input) => compile_file(input, cli.output.as_deref(), true, cli),
            None => {
                bail!("no input file specified\nUsage: basicc <FILE> or basicc build <FILE>")
            }
        },
    }
}

fn codegen_options(cli: &Cli) -> CodegenOptions {
    CodegenOptions {
        resume: cli.resume.into(),
        return_stack_capacity: cli.stack_size,
    }
}

fn read_source(input: &Path) -> anyhow::Result<String> {
    fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))
}

fn file_name(input: &Path) -> String {
    input.to_string_lossy().to_string()
}

/// Print one compiler error, as JSON or as `file:line:col: message`
fn report_error(error: &Error, input: &Path, source: &str, cli: &Cli) {
    let name = file_name(input);
    if cli.json {
        let report = ErrorReport::from_error(error, &name, source);
        println!("{}", CompilationFeedback::failure(name, vec![report]).to_json());
    } else {
        match error.span() {
            Some(span) => {
                let (line, col) = span.line_col(source);
                eprintln!("error: {}:{}:{}: {}", name, line, col, error);
            }
            None => eprintln!("error: {}: {}", name, error),
        }
    }
}

/// Translate one file. With `write_output` unset this is a dry run.
fn compile_file(
    input: &Path,
    output: Option<&Path>,
    write_output: bool,
    cli: &Cli,
) -> anyhow::Result<bool> {
    log::info!("compiling {}", input.display());
    let source = read_source(input)?;

    let compilation = match basic2c::compile_with(&source, &codegen_options(cli)) {
        Ok(compilation) => compilation,
        Err(e) => {
            report_error(&e, input, &source, cli);
            return Ok(false);
        }
    };

    let output_path = if write_output {
        let backend = CCodeGen::new(codegen_options(cli));
        let path = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| input.with_extension(backend.file_extension()));
        if path == input {
            bail!("refusing to overwrite the input file {}", input.display());
        }
        fs::write(&path, &compilation.code)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Some(path)
    } else {
        None
    };

    let name = file_name(input);
    if cli.json {
        let diagnostics = compilation
            .warnings
            .iter()
            .map(|w| ErrorReport::from_warning(w, &name, &source))
            .collect();
        let feedback = CompilationFeedback::success(
            name,
            output_path.as_deref().map(file_name),
            diagnostics,
            compilation.stats,
        );
        println!("{}", feedback.to_json());
    } else if let Some(path) = output_path {
        println!("Generated C code: {}", path.display());
    } else {
        println!(
            "No errors found ({} warnings, {} statements)",
            compilation.warnings.len(),
            compilation.stats.statements
        );
    }
    Ok(true)
}

fn dump_tokens(input: &Path, cli: &Cli) -> anyhow::Result<bool> {
    let source = read_source(input)?;
    let tokens = match Lexer::new(&source).tokenize() {
        Ok(tokens) => tokens,
        Err(e) => {
            report_error(&e, input, &source, cli);
            return Ok(false);
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&tokens)?);
    } else {
        for token in &tokens {
            let (line, col) = token.span.line_col(&source);
            println!("{:>4}:{:<3} {}", line, col, token.kind);
        }
    }
    Ok(true)
}

fn dump_ast(input: &Path, cli: &Cli) -> anyhow::Result<bool> {
    let source = read_source(input)?;
    let program = match BasicParser::from_source(&source).and_then(|mut p| p.parse_program()) {
        Ok(program) => program,
        Err(e) => {
            report_error(&e, input, &source, cli);
            return Ok(false);
        }
    };
    println!("{}", serde_json::to_string_pretty(&program)?);
    Ok(true)
}
