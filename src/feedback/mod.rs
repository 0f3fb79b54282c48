//! Structured Feedback Module
//!
//! Machine-readable compilation reports for front ends that drive the
//! translator: JSON diagnostics with locations, plus a few statistics.

use serde::Serialize;

use crate::frontend::semantic::Warning;
use crate::utils::{Error, ErrorKind};

// ==================== Structured Error Report ====================

/// One diagnostic
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    /// Error code (e.g., "E0100")
    pub code: String,

    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    pub location: Option<Location>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error,
    Warning,
}

/// 1-based position in the source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

impl ErrorReport {
    /// Create an error report from a compiler error
    pub fn from_error(error: &Error, file_name: &str, source: &str) -> Self {
        let code = match error.kind() {
            ErrorKind::Lexical => "E0001",
            ErrorKind::Syntax => "E0100",
            ErrorKind::CodeGen => "E0200",
            ErrorKind::Io => "E0300",
        };
        Self {
            code: code.to_string(),
            severity: Severity::Error,
            message: error.to_string(),
            location: error.span().map(|span| {
                let (line, column) = span.line_col(source);
                Location {
                    file: file_name.to_string(),
                    line,
                    column,
                }
            }),
        }
    }

    pub fn from_warning(warning: &Warning, file_name: &str, source: &str) -> Self {
        let (line, column) = warning.span.line_col(source);
        Self {
            code: warning.kind.code().to_string(),
            severity: Severity::Warning,
            message: format!("line {}: {}", warning.line, warning.message),
            location: Some(Location {
                file: file_name.to_string(),
                line,
                column,
            }),
        }
    }
}

// ==================== Compilation Feedback ====================

/// Complete report for one compilation
#[derive(Debug, Clone, Serialize)]
pub struct CompilationFeedback {
    pub success: bool,

    pub source_file: String,

    /// Where the generated C went, if anywhere
    pub output_file: Option<String>,

    /// All errors and warnings
    pub diagnostics: Vec<ErrorReport>,

    pub stats: CompilationStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompilationStats {
    /// Lines of source text
    pub source_lines: usize,
    /// Statements, nested ones included
    pub statements: usize,
    /// Distinct integer variables declared
    pub variables: usize,
    /// Label markers required by jumps
    pub labels: usize,
    /// Wall-clock time of the whole pipeline
    pub elapsed_ms: u64,
}

impl CompilationFeedback {
    pub fn success(
        source_file: String,
        output_file: Option<String>,
        diagnostics: Vec<ErrorReport>,
        stats: CompilationStats,
    ) -> Self {
        Self {
            success: true,
            source_file,
            output_file,
            diagnostics,
            stats,
        }
    }

    /// Create a failed feedback
    pub fn failure(source_file: String, errors: Vec<ErrorReport>) -> Self {
        Self {
            success: false,
            source_file,
            output_file: None,
            diagnostics: errors,
            stats: CompilationStats::default(),
        }
    }

    /// Output as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}
