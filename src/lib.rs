//! basic2c - translate line-numbered BASIC into a single C `main`
//!
//! The pipeline is lexer, parser, lint pass, then the C backend. Everything
//! runs synchronously on one thread and is fully materialized in memory.

pub mod backend;
pub mod feedback;
pub mod frontend;
pub mod utils;

use std::time::Instant;

use backend::{CCodeGen, CodeGen};
use feedback::CompilationStats;
use frontend::lexer::Lexer;
use frontend::parser::Parser;
use frontend::semantic::{SemanticAnalyzer, Warning};

pub use backend::{CodegenOptions, ResumeStrategy};
pub use utils::{Error, ErrorKind, Result, Span};

/// Result of a successful compilation
#[derive(Debug, Clone)]
pub struct Compilation {
    /// Complete C translation unit
    pub code: String,
    pub warnings: Vec<Warning>,
    pub stats: CompilationStats,
}

/// Translate BASIC source to C with default options
pub fn compile(source: &str) -> Result<String> {
    compile_with(source, &CodegenOptions::default()).map(|compilation| compilation.code)
}

/// Translate BASIC source to C, collecting lint warnings and statistics
pub fn compile_with(source: &str, options: &CodegenOptions) -> Result<Compilation> {
    let start = Instant::now();

    let tokens = Lexer::new(source).tokenize()?;
    let program = Parser::new(tokens).parse_program()?;
    log::info!("parsed {} lines", program.lines.len());

    let warnings = SemanticAnalyzer::new()
        .with_line_offset_resume(options.resume == ResumeStrategy::LineOffset)
        .analyze(&program);
    for warning in &warnings {
        log::warn!("line {}: {}", warning.line, warning.message);
    }

    let codegen = CCodeGen::new(options.clone());
    log::debug!("generating {} code", codegen.name());
    let generated = codegen.generate(&program)?;

    let mut statements = 0;
    program.walk(&mut |_, _| statements += 1);

    let stats = CompilationStats {
        source_lines: source.lines().count(),
        statements,
        variables: generated.variables,
        labels: generated.labels,
        elapsed_ms: start.elapsed().as_millis() as u64,
    };

    Ok(Compilation {
        code: generated.code,
        warnings,
        stats,
    })
}
