//! Semantic checks for BASIC programs
//!
//! The parser accepts a few shapes that translate to broken or surprising C:
//! - duplicate or out-of-order line labels
//! - jumps to lines that do not exist
//! - RETURN with no GOSUB, NEXT with no FOR
//!
//! None of these stop compilation; they are reported as warnings.

use std::collections::HashSet;

use serde::Serialize;

use crate::backend::RESUME_LINE_OFFSET;
use crate::frontend::ast::*;
use crate::utils::Span;

/// Kind of warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WarningKind {
    DuplicateLine,
    UnorderedLine,
    UnresolvedTarget,
    MissingResumeLine,
    ReturnWithoutGosub,
    StrayNext,
}

impl WarningKind {
    /// Stable code used in machine-readable reports
    pub fn code(&self) -> &'static str {
        match self {
            WarningKind::DuplicateLine => "W0001",
            WarningKind::UnorderedLine => "W0002",
            WarningKind::UnresolvedTarget => "W0003",
            WarningKind::MissingResumeLine => "W0004",
            WarningKind::ReturnWithoutGosub => "W0005",
            WarningKind::StrayNext => "W0006",
        }
    }
}

/// A non-fatal finding
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub line: u32,
    pub message: String,
    #[serde(skip)]
    pub span: Span,
}

/// Lint pass over a parsed program
pub struct SemanticAnalyzer {
    line_offset_resume: bool,
    warnings: Vec<Warning>,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self {
            line_offset_resume: false,
            warnings: Vec::new(),
        }
    }

    /// Also check that every GOSUB has a line at `L + 10` to come back to
    pub fn with_line_offset_resume(mut self, enabled: bool) -> Self {
        self.line_offset_resume = enabled;
        self
    }

    fn warn(&mut self, kind: WarningKind, labeled: &LabeledStatement, message: String) {
        self.warnings.push(Warning {
            kind,
            line: labeled.line,
            message,
            span: labeled.span,
        });
    }

    pub fn analyze(mut self, program: &Program) -> Vec<Warning> {
        self.check_line_order(program);

        let known: HashSet<u32> = program.line_labels().into_iter().collect();
        let mut statements = Vec::new();
        program.walk(&mut |labeled, stmt| statements.push((labeled, stmt)));

        let has_gosub = statements
            .iter()
            .any(|(_, stmt)| matches!(stmt, Statement::Gosub { .. }));

        for (labeled, stmt) in statements {
            match stmt {
                Statement::Goto { target } | Statement::Gosub { target }
                    if !known.contains(target) =>
                {
                    self.warn(
                        WarningKind::UnresolvedTarget,
                        labeled,
                        format!("jump target {} does not exist", target),
                    );
                }
                _ => {}
            }

            match stmt {
                Statement::Gosub { .. } if self.line_offset_resume => {
                    let resume = labeled.line.saturating_add(RESUME_LINE_OFFSET);
                    if !known.contains(&resume) {
                        self.warn(
                            WarningKind::MissingResumeLine,
                            labeled,
                            format!("GOSUB resumes at line {}, which does not exist", resume),
                        );
                    }
                }
                Statement::Return if !has_gosub => {
                    self.warn(
                        WarningKind::ReturnWithoutGosub,
                        labeled,
                        "RETURN without any GOSUB".to_string(),
                    );
                }
                Statement::Next { var } => {
                    self.warn(
                        WarningKind::StrayNext,
                        labeled,
                        format!("NEXT {} does not close an open FOR {}", var, var),
                    );
                }
                _ => {}
            }
        }

        self.warnings
    }

    /// Walk labels in source order; equal means duplicate, smaller means out of order
    fn check_line_order(&mut self, program: &Program) {
        let mut seen = HashSet::new();
        let mut previous: Option<u32> = None;
        let mut findings = Vec::new();

        program.walk(&mut |labeled, stmt| {
            // IF branches share their line; only count each line once
            if !std::ptr::eq(&labeled.stmt, stmt) {
                return;
            }
            if !seen.insert(labeled.line) {
                findings.push((
                    WarningKind::DuplicateLine,
                    labeled,
                    format!("line {} is defined more than once", labeled.line),
                ));
            } else if previous.map_or(false, |p| labeled.line < p) {
                findings.push((
                    WarningKind::UnorderedLine,
                    labeled,
                    format!("line {} follows line {}", labeled.line, previous.unwrap_or_default()),
                ));
            }
            previous = Some(labeled.line);
        });

        for (kind, labeled, message) in findings {
            self.warn(kind, labeled, message);
        }
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
