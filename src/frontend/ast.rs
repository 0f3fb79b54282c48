//! Abstract Syntax Tree definitions for the BASIC dialect

use serde::Serialize;

use crate::utils::Span;

/// A complete program: source lines in their original order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    pub lines: Vec<LabeledStatement>,
}

impl Program {
    /// Visit every statement in emission order: a statement before its IF
    /// branches and FOR body. Each call gets the line the statement sits on.
    pub fn walk<'a>(&'a self, f: &mut dyn FnMut(&'a LabeledStatement, &'a Statement)) {
        walk_lines(&self.lines, f);
    }

    /// Every line label in source order, FOR bodies and closing NEXT lines included
    pub fn line_labels(&self) -> Vec<u32> {
        let mut labels = Vec::new();
        collect_labels(&self.lines, &mut labels);
        labels
    }
}

fn walk_lines<'a>(
    lines: &'a [LabeledStatement],
    f: &mut dyn FnMut(&'a LabeledStatement, &'a Statement),
) {
    for labeled in lines {
        walk_statement(labeled, &labeled.stmt, f);
    }
}

fn walk_statement<'a>(
    labeled: &'a LabeledStatement,
    stmt: &'a Statement,
    f: &mut dyn FnMut(&'a LabeledStatement, &'a Statement),
) {
    f(labeled, stmt);
    match stmt {
        Statement::If {
            then_branch,
            else_branch,
            ..
        } => {
            walk_statement(labeled, then_branch, f);
            if let Some(else_branch) = else_branch {
                walk_statement(labeled, else_branch, f);
            }
        }
        Statement::For(for_loop) => walk_lines(&for_loop.body, f),
        _ => {}
    }
}

fn collect_labels(lines: &[LabeledStatement], out: &mut Vec<u32>) {
    for labeled in lines {
        out.push(labeled.line);
        collect_for_labels(&labeled.stmt, out);
    }
}

fn collect_for_labels(stmt: &Statement, out: &mut Vec<u32>) {
    match stmt {
        Statement::For(for_loop) => {
            collect_labels(&for_loop.body, out);
            out.push(for_loop.next_line);
        }
        Statement::If {
            then_branch,
            else_branch,
            ..
        } => {
            collect_for_labels(then_branch, out);
            if let Some(else_branch) = else_branch {
                collect_for_labels(else_branch, out);
            }
        }
        _ => {}
    }
}

/// One source line: its integer label and the statement on it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledStatement {
    pub line: u32,
    pub stmt: Statement,
    #[serde(skip)]
    pub span: Span,
}

/// Statements
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Statement {
    /// LET A = expr
    Let { var: String, expr: Expr },
    /// PRINT expr | PRINT "text"
    Print { expr: Expr },
    /// INPUT A
    Input { var: String },
    /// IF cond THEN stmt [ELSE stmt]
    If {
        cond: Expr,
        then_branch: Box<Statement>,
        else_branch: Option<Box<Statement>>,
    },
    /// FOR ... NEXT, with its body already collected
    For(ForLoop),
    /// NEXT A
    Next { var: String },
    /// GOTO line
    Goto { target: u32 },
    /// GOSUB line
    Gosub { target: u32 },
    /// RETURN
    Return,
    /// END
    End,
    /// REM text
    Rem { comment: String },
}

/// A counted loop. `body` holds the lines between the FOR and its NEXT.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForLoop {
    pub var: String,
    pub start: Expr,
    pub end: Expr,
    pub step: Expr,
    pub body: Vec<LabeledStatement>,
    /// Line label of the closing NEXT
    pub next_line: u32,
}

/// Expressions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    Int(u32),
    Str(String),
    Var(String),
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
}

impl Expr {
    pub fn binary(left: Expr, op: BinOp, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn var(name: &str) -> Self {
        Expr::Var(name.to_string())
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinOp {
    Add, // +
    Sub, // -
    Mul, // *
    Div, // /
    Eq,  // =
    Ne,  // <>
    Lt,  // <
    Le,  // <=
    Gt,  // >
    Ge,  // >=
}
