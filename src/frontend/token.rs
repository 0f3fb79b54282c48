//! Token definitions for the BASIC dialect

use std::fmt;

use serde::Serialize;

use crate::utils::Span;

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn eof(span: Span) -> Self {
        Self { kind: TokenKind::Eof, span }
    }
}

/// Token kinds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TokenKind {
    // ============ Keywords ============
    /// LET
    Let,
    /// PRINT
    Print,
    /// INPUT
    Input,
    /// IF
    If,
    /// THEN
    Then,
    /// ELSE
    Else,
    /// FOR
    For,
    /// TO
    To,
    /// STEP
    Step,
    /// NEXT
    Next,
    /// GOTO
    Goto,
    /// GOSUB
    Gosub,
    /// RETURN
    Return,
    /// END
    End,
    /// REM, carrying the rest of the line
    Rem(String),

    // ============ Identifiers and Literals ============
    /// Variable name
    Ident(String),
    /// Unsigned integer literal
    IntLit(u32),
    /// String literal, quotes stripped
    StringLit(String),

    // ============ Operators ============
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// /
    Slash,
    /// =
    Eq,
    /// <>
    Ne,
    /// <
    Lt,
    /// <=
    Le,
    /// >
    Gt,
    /// >=
    Ge,

    // ============ Delimiters ============
    /// (
    LParen,
    /// )
    RParen,
    /// :
    Colon,
    /// ,
    Comma,

    // ============ Special ============
    /// Line terminator
    Newline,
    /// End of file
    Eof,
}

impl TokenKind {
    /// Try to convert a full identifier span to a keyword.
    /// `REM` is handled by the lexer since it swallows the rest of the line.
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        match s {
            "LET" => Some(TokenKind::Let),
            "PRINT" => Some(TokenKind::Print),
            "INPUT" => Some(TokenKind::Input),
            "IF" => Some(TokenKind::If),
            "THEN" => Some(TokenKind::Then),
            "ELSE" => Some(TokenKind::Else),
            "FOR" => Some(TokenKind::For),
            "TO" => Some(TokenKind::To),
            "STEP" => Some(TokenKind::Step),
            "NEXT" => Some(TokenKind::Next),
            "GOTO" => Some(TokenKind::Goto),
            "GOSUB" => Some(TokenKind::Gosub),
            "RETURN" => Some(TokenKind::Return),
            "END" => Some(TokenKind::End),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Let => write!(f, "LET"),
            TokenKind::Print => write!(f, "PRINT"),
            TokenKind::Input => write!(f, "INPUT"),
            TokenKind::If => write!(f, "IF"),
            TokenKind::Then => write!(f, "THEN"),
            TokenKind::Else => write!(f, "ELSE"),
            TokenKind::For => write!(f, "FOR"),
            TokenKind::To => write!(f, "TO"),
            TokenKind::Step => write!(f, "STEP"),
            TokenKind::Next => write!(f, "NEXT"),
            TokenKind::Goto => write!(f, "GOTO"),
            TokenKind::Gosub => write!(f, "GOSUB"),
            TokenKind::Return => write!(f, "RETURN"),
            TokenKind::End => write!(f, "END"),
            TokenKind::Rem(_) => write!(f, "REM"),
            TokenKind::Ident(name) => write!(f, "identifier `{}`", name),
            TokenKind::IntLit(n) => write!(f, "number {}", n),
            TokenKind::StringLit(s) => write!(f, "string \"{}\"", s),
            TokenKind::Plus => write!(f, "`+`"),
            TokenKind::Minus => write!(f, "`-`"),
            TokenKind::Star => write!(f, "`*`"),
            TokenKind::Slash => write!(f, "`/`"),
            TokenKind::Eq => write!(f, "`=`"),
            TokenKind::Ne => write!(f, "`<>`"),
            TokenKind::Lt => write!(f, "`<`"),
            TokenKind::Le => write!(f, "`<=`"),
            TokenKind::Gt => write!(f, "`>`"),
            TokenKind::Ge => write!(f, "`>=`"),
            TokenKind::LParen => write!(f, "`(`"),
            TokenKind::RParen => write!(f, "`)`"),
            TokenKind::Colon => write!(f, "`:`"),
            TokenKind::Comma => write!(f, "`,`"),
            TokenKind::Newline => write!(f, "end of line"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}
