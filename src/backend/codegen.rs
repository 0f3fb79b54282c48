//! Code Generation trait - Backend abstraction
//!
//! A backend turns a parsed `Program` into target source text.

use serde::Serialize;

use crate::frontend::ast::Program;
use crate::utils::Result;

/// Distance between a GOSUB line and its resume line under `ResumeStrategy::LineOffset`
pub const RESUME_LINE_OFFSET: u32 = 10;

/// Default number of slots in the emitted return-address stack
pub const DEFAULT_RETURN_STACK_CAPACITY: usize = 100;

/// How a RETURN finds its way back to the statement after the GOSUB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ResumeStrategy {
    /// Every GOSUB call site gets its own resume marker right after the jump.
    #[default]
    CallSite,
    /// A GOSUB on line `L` resumes at line `L + 10`. Only correct when the
    /// source numbers its lines in steps of ten.
    LineOffset,
}

/// Options shared by all backends
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodegenOptions {
    pub resume: ResumeStrategy,
    pub return_stack_capacity: usize,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            resume: ResumeStrategy::default(),
            return_stack_capacity: DEFAULT_RETURN_STACK_CAPACITY,
        }
    }
}

/// Output of one backend run
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedCode {
    /// Complete target source
    pub code: String,
    /// Distinct variables declared
    pub variables: usize,
    /// Line labels emitted
    pub labels: usize,
}

/// Code generation backend trait
pub trait CodeGen {
    /// Generate target source for a whole program. A generator accumulates
    /// state while it runs, so it is consumed by a single call.
    fn generate(self, program: &Program) -> Result<GeneratedCode>
    where
        Self: Sized;

    /// Get the backend name
    fn name(&self) -> &str;

    /// Conventional file extension of the generated source, without the dot
    fn file_extension(&self) -> &str;
}
