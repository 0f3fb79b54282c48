//! Parser for the BASIC dialect
//!
//! Recursive descent with one token of lookahead. Expressions are parsed by
//! precedence climbing over three binary levels, each folded left.

use crate::frontend::ast::*;
use crate::frontend::lexer::Lexer;
use crate::frontend::token::{Token, TokenKind};
use crate::utils::{Error, Result, Span};

/// Deepest allowed nesting of FOR/IF statements and parenthesized expressions
pub const MAX_NESTING_DEPTH: usize = 64;

/// Longest chain of binary operators in one expression, `1+1+...` included
pub const MAX_EXPR_DEPTH: usize = 256;

/// The parser
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    /// Create a parser from pre-tokenized input
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map_or(true, |t| t.kind != TokenKind::Eof) {
            let end = tokens.last().map_or(0, |t| t.span.end);
            tokens.push(Token::eof(Span::new(end, end)));
        }
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Tokenize `source` and create a parser over the result
    pub fn from_source(source: &str) -> Result<Self> {
        let tokens = Lexer::new(source).tokenize()?;
        Ok(Self::new(tokens))
    }

    // ==================== Helper Methods ====================

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn previous_span(&self) -> Span {
        self.tokens[self.pos.saturating_sub(1)].span
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    fn expect(&mut self, expected: TokenKind) -> Result<Token> {
        if self.check(&expected) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&expected.to_string()))
        }
    }

    fn consume(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: &str) -> Error {
        Error::UnexpectedToken {
            expected: expected.to_string(),
            got: self.current_kind().to_string(),
            span: self.current().span,
        }
    }

    fn skip_newlines(&mut self) {
        while self.consume(&TokenKind::Newline) {}
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(Error::NestingTooDeep {
                limit: MAX_NESTING_DEPTH,
                span: self.current().span,
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // ==================== Parsing Methods ====================

    /// Parse a complete program
    pub fn parse_program(&mut self) -> Result<Program> {
        let mut lines = Vec::new();

        loop {
            self.skip_newlines();
            if self.is_at_end() {
                break;
            }
            lines.push(self.parse_labeled()?);
        }

        log::debug!("parsed {} top-level lines", lines.len());
        Ok(Program { lines })
    }

    /// Parse `<line number> <statement>`
    fn parse_labeled(&mut self) -> Result<LabeledStatement> {
        let start = self.current().span;
        let line = match self.current_kind() {
            TokenKind::IntLit(n) => *n,
            other => {
                return Err(Error::ExpectedLineNumber {
                    got: other.to_string(),
                    span: start,
                })
            }
        };
        self.advance();

        let stmt = self.parse_statement(line)?;

        Ok(LabeledStatement {
            line,
            stmt,
            span: start.merge(&self.previous_span()),
        })
    }

    /// Parse one statement; `line` is the label of the line it sits on
    fn parse_statement(&mut self, line: u32) -> Result<Statement> {
        match self.current_kind().clone() {
            TokenKind::Let => self.parse_let(),
            TokenKind::Print => self.parse_print(),
            TokenKind::Input => self.parse_input(),
            TokenKind::If => {
                self.enter()?;
                let stmt = self.parse_if(line)?;
                self.leave();
                Ok(stmt)
            }
            TokenKind::For => {
                self.enter()?;
                let stmt = self.parse_for(line)?;
                self.leave();
                Ok(stmt)
            }
            TokenKind::Next => {
                self.advance();
                let var = self.parse_ident()?;
                Ok(Statement::Next { var })
            }
            TokenKind::Goto => {
                self.advance();
                let target = self.parse_target()?;
                Ok(Statement::Goto { target })
            }
            TokenKind::Gosub => {
                self.advance();
                let target = self.parse_target()?;
                Ok(Statement::Gosub { target })
            }
            TokenKind::Return => {
                self.advance();
                Ok(Statement::Return)
            }
            TokenKind::End => {
                self.advance();
                Ok(Statement::End)
            }
            TokenKind::Rem(comment) => {
                self.advance();
                Ok(Statement::Rem { comment })
            }
            other => Err(Error::UnknownStatement {
                got: other.to_string(),
                span: self.current().span,
            }),
        }
    }

    fn parse_ident(&mut self) -> Result<String> {
        match self.current_kind() {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// GOTO/GOSUB operand: a bare integer, never an expression
    fn parse_target(&mut self) -> Result<u32> {
        match self.current_kind() {
            TokenKind::IntLit(n) => {
                let n = *n;
                self.advance();
                Ok(n)
            }
            _ => Err(self.unexpected("line number")),
        }
    }

    fn parse_let(&mut self) -> Result<Statement> {
        self.expect(TokenKind::Let)?;
        let var = self.parse_ident()?;
        self.expect(TokenKind::Eq)?;
        let expr = self.parse_expr()?;
        Ok(Statement::Let { var, expr })
    }

    fn parse_print(&mut self) -> Result<Statement> {
        self.expect(TokenKind::Print)?;
        if let TokenKind::StringLit(text) = self.current_kind() {
            let expr = Expr::Str(text.clone());
            self.advance();
            return Ok(Statement::Print { expr });
        }
        let expr = self.parse_expr()?;
        Ok(Statement::Print { expr })
    }

    fn parse_input(&mut self) -> Result<Statement> {
        self.expect(TokenKind::Input)?;
        let var = self.parse_ident()?;
        Ok(Statement::Input { var })
    }

    fn parse_if(&mut self, line: u32) -> Result<Statement> {
        self.expect(TokenKind::If)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::Then)?;
        let then_branch = Box::new(self.parse_statement(line)?);

        let else_branch = if self.consume(&TokenKind::Else) {
            Some(Box::new(self.parse_statement(line)?))
        } else {
            None
        };

        Ok(Statement::If {
            cond,
            then_branch,
            else_branch,
        })
    }

    /// Parse the FOR header, then collect lines until the NEXT naming the
    /// same variable. Nested FORs consume their own NEXT recursively.
    fn parse_for(&mut self, line: u32) -> Result<Statement> {
        let for_span = self.current().span;
        self.expect(TokenKind::For)?;
        let var = self.parse_ident()?;
        self.expect(TokenKind::Eq)?;
        let start = self.parse_expr()?;
        self.expect(TokenKind::To)?;
        let end = self.parse_expr()?;
        let step = if self.consume(&TokenKind::Step) {
            self.parse_expr()?
        } else {
            Expr::Int(1)
        };

        let mut body = Vec::new();
        let next_line = loop {
            self.skip_newlines();
            if self.is_at_end() {
                return Err(Error::UnterminatedFor {
                    var,
                    line,
                    span: for_span,
                });
            }

            let labeled = self.parse_labeled()?;
            match &labeled.stmt {
                Statement::Next { var: closing } if *closing == var => break labeled.line,
                _ => body.push(labeled),
            }
        };

        Ok(Statement::For(ForLoop {
            var,
            start,
            end,
            step,
            body,
            next_line,
        }))
    }

    // ==================== Expressions ====================
    //
    // Each level returns the expression with its operator depth: the longest
    // chain of binary operations from the root to a leaf.

    pub fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_comparison().map(|(expr, _)| expr)
    }

    /// Combine two operands, refusing trees deeper than `MAX_EXPR_DEPTH`
    fn fold(
        &self,
        left: (Expr, usize),
        op: BinOp,
        right: (Expr, usize),
    ) -> Result<(Expr, usize)> {
        let depth = left.1.max(right.1) + 1;
        if depth > MAX_EXPR_DEPTH {
            return Err(Error::NestingTooDeep {
                limit: MAX_EXPR_DEPTH,
                span: self.previous_span(),
            });
        }
        Ok((Expr::binary(left.0, op, right.0), depth))
    }

    fn parse_comparison(&mut self) -> Result<(Expr, usize)> {
        let mut left = self.parse_additive()?;
        while let Some(op) = comparison_op(self.current_kind()) {
            self.advance();
            let right = self.parse_additive()?;
            left = self.fold(left, op, right)?;
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<(Expr, usize)> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = self.fold(left, op, right)?;
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<(Expr, usize)> {
        let mut left = self.parse_atom()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_atom()?;
            left = self.fold(left, op, right)?;
        }
        Ok(left)
    }

    fn parse_atom(&mut self) -> Result<(Expr, usize)> {
        let expr = match self.current_kind() {
            TokenKind::IntLit(n) => Expr::Int(*n),
            TokenKind::StringLit(s) => Expr::Str(s.clone()),
            TokenKind::Ident(name) => Expr::Var(name.clone()),
            TokenKind::LParen => {
                self.advance();
                self.enter()?;
                let inner = self.parse_comparison()?;
                self.leave();
                self.expect(TokenKind::RParen)?;
                return Ok(inner);
            }
            _ => return Err(self.unexpected("expression")),
        };
        self.advance();
        Ok((expr, 0))
    }
}

fn comparison_op(kind: &TokenKind) -> Option<BinOp> {
    match kind {
        TokenKind::Eq => Some(BinOp::Eq),
        TokenKind::Ne => Some(BinOp::Ne),
        TokenKind::Lt => Some(BinOp::Lt),
        TokenKind::Le => Some(BinOp::Le),
        TokenKind::Gt => Some(BinOp::Gt),
        TokenKind::Ge => Some(BinOp::Ge),
        _ => None,
    }
}
