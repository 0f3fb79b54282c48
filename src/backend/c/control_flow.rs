//! Discovery pre-pass
//!
//! Runs before any C is emitted and answers two questions: which lines need a
//! label, and where each RETURN may dispatch to.

use std::collections::BTreeSet;

use crate::backend::codegen::{ResumeStrategy, RESUME_LINE_OFFSET};
use crate::frontend::ast::{Program, Statement};

/// A place a RETURN can jump back to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResumeLabel {
    /// The n-th GOSUB call site in source order, starting at 1
    CallSite(usize),
    /// A source line, under the `L + 10` convention
    Line(u32),
}

impl ResumeLabel {
    /// Resume label for the `site`-th GOSUB (1-based), sitting on `line`
    pub fn for_call(strategy: ResumeStrategy, line: u32, site: usize) -> Self {
        match strategy {
            ResumeStrategy::CallSite => ResumeLabel::CallSite(site),
            ResumeStrategy::LineOffset => {
                ResumeLabel::Line(line.saturating_add(RESUME_LINE_OFFSET))
            }
        }
    }

    /// Value pushed on the return-address stack
    pub fn value(&self) -> String {
        match self {
            ResumeLabel::CallSite(id) => id.to_string(),
            ResumeLabel::Line(line) => line.to_string(),
        }
    }

    /// C label the RETURN dispatch jumps to
    pub fn target(&self) -> String {
        match self {
            ResumeLabel::CallSite(id) => format!("resume_{}", id),
            ResumeLabel::Line(line) => line_label(*line),
        }
    }
}

/// C label name for a source line
pub fn line_label(line: u32) -> String {
    format!("label_{}", line)
}

/// Control-flow facts gathered from the whole program
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlFlow {
    pub goto_targets: BTreeSet<u32>,
    pub gosub_targets: BTreeSet<u32>,
    pub resume_labels: BTreeSet<ResumeLabel>,
    /// Lines that receive a label marker
    pub labels: BTreeSet<u32>,
    /// Number of GOSUB statements anywhere in the program
    pub gosub_sites: usize,
    /// Any GOSUB or RETURN present
    pub uses_return_stack: bool,
}

impl ControlFlow {
    /// Walk every statement, nested IF branches and FOR bodies included
    pub fn discover(program: &Program, strategy: ResumeStrategy) -> Self {
        let mut flow = ControlFlow::default();

        program.walk(&mut |labeled, stmt| match stmt {
            Statement::Goto { target } => {
                flow.goto_targets.insert(*target);
            }
            Statement::Gosub { target } => {
                flow.uses_return_stack = true;
                flow.gosub_targets.insert(*target);
                flow.gosub_sites += 1;
                flow.resume_labels
                    .insert(ResumeLabel::for_call(strategy, labeled.line, flow.gosub_sites));
            }
            Statement::Return => {
                flow.uses_return_stack = true;
            }
            _ => {}
        });

        flow.labels.extend(flow.goto_targets.iter().copied());
        flow.labels.extend(flow.gosub_targets.iter().copied());
        flow.labels.extend(flow.resume_labels.iter().filter_map(|r| match r {
            ResumeLabel::Line(line) => Some(*line),
            ResumeLabel::CallSite(_) => None,
        }));

        log::debug!(
            "discovered {} goto targets, {} gosub targets, {} resume labels",
            flow.goto_targets.len(),
            flow.gosub_targets.len(),
            flow.resume_labels.len()
        );
        flow
    }

    pub fn needs_label(&self, line: u32) -> bool {
        self.labels.contains(&line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser::Parser;

    fn discover(source: &str, strategy: ResumeStrategy) -> ControlFlow {
        let program = Parser::from_source(source).unwrap().parse_program().unwrap();
        ControlFlow::discover(&program, strategy)
    }

    #[test]
    fn test_line_offset_resume() {
        let flow = discover(
            "10 GOSUB 30\n20 END\n30 PRINT \"X\"\n40 RETURN",
            ResumeStrategy::LineOffset,
        );
        assert_eq!(flow.gosub_targets, BTreeSet::from([30]));
        assert_eq!(flow.resume_labels, BTreeSet::from([ResumeLabel::Line(20)]));
        assert_eq!(flow.labels, BTreeSet::from([20, 30]));
        assert!(flow.uses_return_stack);
    }

    #[test]
    fn test_call_site_resume() {
        let flow = discover(
            "10 GOSUB 100\n15 GOSUB 100\n17 END\n100 RETURN",
            ResumeStrategy::CallSite,
        );
        assert_eq!(flow.gosub_sites, 2);
        assert_eq!(
            flow.resume_labels,
            BTreeSet::from([ResumeLabel::CallSite(1), ResumeLabel::CallSite(2)])
        );
        assert_eq!(flow.labels, BTreeSet::from([100]));
    }

    #[test]
    fn test_nested_jumps_are_found() {
        let flow = discover(
            "10 FOR I = 1 TO 3\n20 IF I = 2 THEN GOTO 50\n30 NEXT I\n40 END\n50 IF 1 THEN GOSUB 70 ELSE GOTO 40\n70 RETURN",
            ResumeStrategy::CallSite,
        );
        assert_eq!(flow.goto_targets, BTreeSet::from([40, 50]));
        assert_eq!(flow.gosub_targets, BTreeSet::from([70]));
        assert_eq!(flow.labels, BTreeSet::from([40, 50, 70]));
    }

    #[test]
    fn test_no_subroutines() {
        let flow = discover("10 GOTO 10", ResumeStrategy::CallSite);
        assert!(!flow.uses_return_stack);
        assert!(flow.needs_label(10));
        assert!(!flow.needs_label(20));
    }

    #[test]
    fn test_return_alone_needs_stack() {
        let flow = discover("10 RETURN", ResumeStrategy::CallSite);
        assert!(flow.uses_return_stack);
        assert!(flow.resume_labels.is_empty());
    }

    #[test]
    fn test_resume_label_rendering() {
        assert_eq!(ResumeLabel::CallSite(3).value(), "3");
        assert_eq!(ResumeLabel::CallSite(3).target(), "resume_3");
        assert_eq!(ResumeLabel::Line(20).value(), "20");
        assert_eq!(ResumeLabel::Line(20).target(), "label_20");
    }
}
